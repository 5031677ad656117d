use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Subjects a member can log, in display order.
pub const SUBJECTS: [&str; 4] = ["math", "english", "bangla", "science"];
/// Highest score a subject can receive on a given day.
pub const MAX_SCORE: u8 = 10;
/// Longest note accepted for a subject, in characters.
pub const MAX_NOTE_CHARS: usize = 200;

/// Whether `subject` belongs to [`SUBJECTS`].
pub fn is_known_subject(subject: &str) -> bool {
    SUBJECTS.contains(&subject)
}

/// Clamp a raw score into `0..=MAX_SCORE`.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, i64::from(MAX_SCORE)) as u8
}

/// Score entries logged by one member for one calendar date, keyed by subject.
pub type DayScores = IndexMap<String, ScoreEntryEntity>;

/// Every day a member logged, keyed by `YYYY-MM-DD` so iteration is chronological.
pub type ScoreHistory = BTreeMap<String, DayScores>;

/// Aggregate session record stored at `sessions/{code}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Members keyed by member id, in store iteration order.
    #[serde(default)]
    pub members: IndexMap<String, MemberEntity>,
    /// Score histories keyed by member id.
    #[serde(default)]
    pub scores: IndexMap<String, ScoreHistory>,
    /// Creation timestamp (RFC 3339). Older records may not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl SessionEntity {
    /// Fresh session with no members nor scores.
    pub fn empty(created_at: String) -> Self {
        Self {
            members: IndexMap::new(),
            scores: IndexMap::new(),
            created_at: Some(created_at),
        }
    }

    /// Score history of `member_id`, empty when the member never logged anything.
    pub fn history(&self, member_id: &str) -> Option<&ScoreHistory> {
        self.scores.get(member_id)
    }
}

/// Participant of a session stored at `sessions/{code}/members/{memberId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberEntity {
    /// Display name chosen on join.
    pub nickname: String,
    /// Consecutive days (ending today) with at least one positive score.
    #[serde(default)]
    pub streak: u32,
}

impl MemberEntity {
    /// Member record written on join, always starting with a zero streak.
    pub fn joined(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            streak: 0,
        }
    }
}

/// Score and note logged for a single subject on a single day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntryEntity {
    /// Self-assessed score in `0..=10`.
    pub score: u8,
    /// Free-form note, empty when none was given.
    #[serde(default)]
    pub note: String,
}

/// Sum of every subject score of a day.
pub fn day_total(day: &DayScores) -> u32 {
    day.values().map(|entry| u32::from(entry.score)).sum()
}

/// Whether the day holds at least one positive score.
pub fn has_positive_score(day: &DayScores) -> bool {
    day.values().any(|entry| entry.score > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_score_bounds_values() {
        assert_eq!(clamp_score(-3), 0);
        assert_eq!(clamp_score(7), 7);
        assert_eq!(clamp_score(11), 10);
        assert_eq!(clamp_score(i64::MAX), 10);
    }

    #[test]
    fn session_tolerates_missing_maps() {
        let session: SessionEntity = serde_json::from_value(json!({})).unwrap();
        assert!(session.members.is_empty());
        assert!(session.scores.is_empty());
        assert_eq!(session.created_at, None);
    }

    #[test]
    fn score_entry_note_defaults_to_empty() {
        let entry: ScoreEntryEntity = serde_json::from_value(json!({ "score": 4 })).unwrap();
        assert_eq!(entry.note, "");
    }

    #[test]
    fn members_keep_store_order() {
        let session: SessionEntity = serde_json::from_value(json!({
            "members": {
                "zed": { "nickname": "Zed", "streak": 1 },
                "amy": { "nickname": "Amy", "streak": 0 }
            }
        }))
        .unwrap();
        let ids: Vec<_> = session.members.keys().map(String::as_str).collect();
        assert_eq!(ids, ["zed", "amy"]);
    }
}
