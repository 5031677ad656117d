//! Streaks, weekly/daily totals and the daily champion, computed from a session tree.

use time::{Date, Duration};

use crate::{
    clock::{date_key, parse_date_key},
    dao::models::{
        DayScores, MAX_SCORE, SUBJECTS, ScoreHistory, SessionEntity, day_total, has_positive_score,
    },
};

/// Score a member would reach by maxing every subject every day of a week.
pub const WEEKLY_TARGET: u32 = SUBJECTS.len() as u32 * MAX_SCORE as u32 * 7;

/// Member with the best total today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Champion {
    /// Id of the winning member.
    pub member_id: String,
    /// Nickname shown on the banner.
    pub nickname: String,
    /// Today's total of the winner.
    pub score: u32,
}

/// Everything the dashboard shows for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStanding {
    /// Member id.
    pub member_id: String,
    /// Nickname chosen on join.
    pub nickname: String,
    /// Streak as persisted on the member record.
    pub streak: u32,
    /// Sum of this week's scores.
    pub weekly_score: u32,
    /// `weekly_score` against [`WEEKLY_TARGET`], in percent capped at 100.
    pub weekly_progress: u8,
    /// Sum of today's scores.
    pub today_score: u32,
    /// Entries logged today.
    pub today_logs: DayScores,
    /// Whether this member is today's champion.
    pub is_champion: bool,
}

/// Dashboard projection of a whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// Champion banner, absent when nobody scored today.
    pub champion: Option<Champion>,
    /// One entry per member, in member order.
    pub members: Vec<MemberStanding>,
}

/// Consecutive days ending today with at least one positive score.
///
/// Records are walked newest first; the i-th one must be dated exactly `i` days
/// before `today`. A gap, a future date, or an all-zero day stops the walk.
/// Keys that are not `YYYY-MM-DD` are ignored.
pub fn streak(history: &ScoreHistory, today: Date) -> u32 {
    let mut days: Vec<(Date, &DayScores)> = history
        .iter()
        .filter_map(|(key, day)| parse_date_key(key).map(|date| (date, day)))
        .collect();
    days.sort_by(|left, right| right.0.cmp(&left.0));

    let mut streak = 0;
    for (offset, (date, day)) in days.into_iter().enumerate() {
        let expected = today.checked_sub(Duration::days(offset as i64));
        if expected != Some(date) || !has_positive_score(day) {
            break;
        }
        streak += 1;
    }
    streak
}

/// First day (Sunday) of the week containing `today`.
pub fn week_start(today: Date) -> Date {
    let offset = i64::from(today.weekday().number_days_from_sunday());
    today
        .checked_sub(Duration::days(offset))
        .unwrap_or(Date::MIN)
}

/// Sum of all scores logged during the Sunday-to-Saturday week containing `today`.
pub fn weekly_total(history: &ScoreHistory, today: Date) -> u32 {
    let start = week_start(today);
    let end = start.checked_add(Duration::days(6)).unwrap_or(Date::MAX);

    history
        .iter()
        .filter_map(|(key, day)| parse_date_key(key).map(|date| (date, day)))
        .filter(|(date, _)| (start..=end).contains(date))
        .map(|(_, day)| day_total(day))
        .sum()
}

/// Sum of today's scores; 0 when nothing was logged.
pub fn today_total(history: &ScoreHistory, today: Date) -> u32 {
    history.get(&date_key(today)).map(day_total).unwrap_or(0)
}

/// Today's logs of a member, empty when nothing was logged.
pub fn today_logs(history: &ScoreHistory, today: Date) -> DayScores {
    history.get(&date_key(today)).cloned().unwrap_or_default()
}

/// Weekly score as a percentage of [`WEEKLY_TARGET`], rounded and capped at 100.
pub fn weekly_progress(weekly_score: u32) -> u8 {
    let percent = (f64::from(weekly_score) * 100.0 / f64::from(WEEKLY_TARGET)).round();
    percent.min(100.0) as u8
}

/// Member with the strictly highest positive total today.
///
/// Ties keep the member met first in the session's member order.
pub fn daily_champion(session: &SessionEntity, today: Date) -> Option<Champion> {
    let mut champion: Option<Champion> = None;
    let mut best = 0;

    for (member_id, member) in &session.members {
        let score = session
            .history(member_id)
            .map(|history| today_total(history, today))
            .unwrap_or(0);
        if score > best {
            best = score;
            champion = Some(Champion {
                member_id: member_id.clone(),
                nickname: member.nickname.clone(),
                score,
            });
        }
    }

    champion
}

/// Per-member standings plus the champion banner.
pub fn standings(session: &SessionEntity, today: Date) -> Standings {
    let champion = daily_champion(session, today);
    let empty = ScoreHistory::new();

    let members = session
        .members
        .iter()
        .map(|(member_id, member)| {
            let history = session.history(member_id).unwrap_or(&empty);
            let weekly_score = weekly_total(history, today);
            MemberStanding {
                member_id: member_id.clone(),
                nickname: member.nickname.clone(),
                streak: member.streak,
                weekly_score,
                weekly_progress: weekly_progress(weekly_score),
                today_score: today_total(history, today),
                today_logs: today_logs(history, today),
                is_champion: champion
                    .as_ref()
                    .is_some_and(|champion| &champion.member_id == member_id),
            }
        })
        .collect();

    Standings { champion, members }
}
