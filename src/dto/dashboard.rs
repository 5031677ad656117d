use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::session::{ScoreEntryDto, score_entries},
    standings::{Champion, MemberStanding, Standings, WEEKLY_TARGET},
};

/// Dashboard of a session as seen on a given day.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub session_code: String,
    /// Store-local date the totals refer to (`YYYY-MM-DD`).
    pub date: String,
    /// Weekly score matching a 100% progress bar.
    pub weekly_target: u32,
    /// Banner shown when someone scored above zero today.
    pub champion: Option<ChampionDto>,
    /// One card per member, in join order.
    pub members: Vec<MemberCardDto>,
}

impl DashboardResponse {
    /// Project computed standings into the dashboard payload.
    pub fn new(session_code: String, date: String, standings: Standings) -> Self {
        Self {
            session_code,
            date,
            weekly_target: WEEKLY_TARGET,
            champion: standings.champion.map(Into::into),
            members: standings.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Member with the highest total today.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ChampionDto {
    pub member_id: String,
    pub nickname: String,
    pub score: u32,
}

impl From<Champion> for ChampionDto {
    fn from(champion: Champion) -> Self {
        Self {
            member_id: champion.member_id,
            nickname: champion.nickname,
            score: champion.score,
        }
    }
}

/// Per-member card.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MemberCardDto {
    pub member_id: String,
    pub nickname: String,
    pub streak: u32,
    pub weekly_score: u32,
    /// Percentage of the weekly target, capped at 100.
    pub weekly_progress: u8,
    pub today_score: u32,
    pub today_logs: IndexMap<String, ScoreEntryDto>,
    pub is_champion: bool,
}

impl From<MemberStanding> for MemberCardDto {
    fn from(standing: MemberStanding) -> Self {
        Self {
            member_id: standing.member_id,
            nickname: standing.nickname,
            streak: standing.streak,
            weekly_score: standing.weekly_score,
            weekly_progress: standing.weekly_progress,
            today_score: standing.today_score,
            today_logs: score_entries(standing.today_logs),
            is_champion: standing.is_champion,
        }
    }
}
