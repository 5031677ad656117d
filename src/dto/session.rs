//! Request and response bodies of the session, membership and score routes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{DayScores, MemberEntity, ScoreEntryEntity, day_total},
    dto::validation::{validate_member_id, validate_nickname, validate_notes, validate_subject},
};

/// Payload used to open a new session; the caller joins it right away.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Display name, 1 to 20 characters once trimmed.
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

/// Payload used to join an existing session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinSessionRequest {
    pub nickname: String,
    /// Identity persisted by the client. A fresh id is generated when omitted.
    #[serde(default)]
    pub member_id: Option<String>,
}

impl Validate for JoinSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_nickname(&self.nickname) {
            errors.add("nickname", e);
        }

        if let Some(ref id) = self.member_id {
            if let Err(e) = validate_member_id(id) {
                errors.add("member_id", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Raw score as typed in the log form.
///
/// Numbers and numeric strings are accepted; anything else reads as `0`.
/// Clamping to `0..=10` happens when the day is stored.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawScore(#[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")] pub f64);

impl RawScore {
    /// Whole part of the score, truncated toward zero and saturated to the `i64` range.
    /// `NaN` reads as `0`.
    pub fn whole(self) -> i64 {
        self.0.trunc() as i64
    }
}

/// Today's log for a member: one raw score and an optional note per subject.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitScoresRequest {
    /// Subject to raw score (number or numeric string).
    #[schema(value_type = Object)]
    pub scores: IndexMap<String, RawScore>,
    /// Subject to note, at most 200 characters each.
    #[serde(default)]
    pub notes: IndexMap<String, String>,
}

impl SubmitScoresRequest {
    /// Raw scores keyed by subject, in submission order.
    pub fn raw_scores(&self) -> IndexMap<String, i64> {
        self.scores
            .iter()
            .map(|(subject, raw)| (subject.clone(), raw.whole()))
            .collect()
    }
}

impl Validate for SubmitScoresRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(e) = self
            .scores
            .keys()
            .find_map(|subject| validate_subject(subject).err())
        {
            errors.add("scores", e);
        }

        if let Err(e) = validate_notes(&self.notes) {
            errors.add("notes", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Identity a client persists locally to resume its membership later.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionIdentity {
    pub session_code: String,
    pub member_id: String,
    pub nickname: String,
}

/// Member record returned when a client resumes a persisted identity.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub session_code: String,
    pub member_id: String,
    pub nickname: String,
    pub streak: u32,
}

impl MemberResponse {
    /// Combine the identity parts with the stored member record.
    pub fn new(session_code: String, member_id: String, member: MemberEntity) -> Self {
        Self {
            session_code,
            member_id,
            nickname: member.nickname,
            streak: member.streak,
        }
    }
}

/// Score and note for one subject.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ScoreEntryDto {
    pub score: u8,
    pub note: String,
}

impl From<ScoreEntryEntity> for ScoreEntryDto {
    fn from(entry: ScoreEntryEntity) -> Self {
        Self {
            score: entry.score,
            note: entry.note,
        }
    }
}

/// Convert a stored day into its public projection, keeping subject order.
pub fn score_entries(day: DayScores) -> IndexMap<String, ScoreEntryDto> {
    day.into_iter()
        .map(|(subject, entry)| (subject, entry.into()))
        .collect()
}

/// Record logged by a member for the current day.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodayScoresResponse {
    /// Store-local date (`YYYY-MM-DD`).
    pub date: String,
    pub scores: IndexMap<String, ScoreEntryDto>,
    /// Sum of every subject score.
    pub total: u32,
}

impl TodayScoresResponse {
    /// Build the response for `day`, computing its total.
    pub fn new(date: String, day: DayScores) -> Self {
        let total = day_total(&day);
        Self {
            date,
            scores: score_entries(day),
            total,
        }
    }
}

/// Stored record and refreshed streak after a submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitScoresResponse {
    pub date: String,
    pub scores: IndexMap<String, ScoreEntryDto>,
    pub total: u32,
    pub streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::clamp_score;
    use serde_json::json;

    #[test]
    fn raw_scores_accept_numbers_and_numeric_strings() {
        let request: SubmitScoresRequest = serde_json::from_value(json!({
            "scores": { "math": 7, "english": "9", "bangla": "abc", "science": null }
        }))
        .unwrap();

        let raw = request.raw_scores();
        assert_eq!(raw["math"], 7);
        assert_eq!(raw["english"], 9);
        assert_eq!(raw["bangla"], 0);
        assert_eq!(raw["science"], 0);
        assert!(request.notes.is_empty());
    }

    #[test]
    fn raw_scores_keep_out_of_range_values_for_clamping() {
        let request: SubmitScoresRequest =
            serde_json::from_value(json!({ "scores": { "math": 15, "english": "-2" } })).unwrap();
        let raw = request.raw_scores();
        assert_eq!(raw["math"], 15);
        assert_eq!(raw["english"], -2);
    }

    #[test]
    fn fractional_and_huge_scores_are_truncated_then_clamped() {
        let request: SubmitScoresRequest = serde_json::from_value(json!({
            "scores": {
                "math": 1e3,
                "english": 7.5,
                "bangla": "99999999999999999999",
                "science": "8.9"
            }
        }))
        .unwrap();

        let stored: Vec<u8> = request
            .raw_scores()
            .values()
            .map(|raw| clamp_score(*raw))
            .collect();
        assert_eq!(stored, [10, 7, 10, 8]);
    }

    #[test]
    fn negative_fractions_truncate_toward_zero() {
        let request: SubmitScoresRequest =
            serde_json::from_value(json!({ "scores": { "math": -0.5, "english": "-3.7" } }))
                .unwrap();
        let raw = request.raw_scores();
        assert_eq!(raw["math"], 0);
        assert_eq!(raw["english"], -3);
    }

    #[test]
    fn submit_validation_rejects_unknown_subjects_and_long_notes() {
        let request: SubmitScoresRequest = serde_json::from_value(json!({
            "scores": { "art": 3 },
            "notes": { "math": "x".repeat(201) }
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("scores"));
        assert!(fields.contains_key("notes"));
    }

    #[test]
    fn join_validation_checks_optional_member_id() {
        let ok: JoinSessionRequest =
            serde_json::from_value(json!({ "nickname": "Rafi" })).unwrap();
        assert!(ok.validate().is_ok());

        let bad: JoinSessionRequest =
            serde_json::from_value(json!({ "nickname": " ", "member_id": "a/b" })).unwrap();
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("nickname"));
        assert!(fields.contains_key("member_id"));
    }

    #[test]
    fn today_response_totals_the_day() {
        let mut day = DayScores::new();
        day.insert(
            "math".into(),
            ScoreEntryEntity {
                score: 6,
                note: String::new(),
            },
        );
        day.insert(
            "science".into(),
            ScoreEntryEntity {
                score: 3,
                note: "cells".into(),
            },
        );

        let response = TodayScoresResponse::new("2024-05-15".into(), day);
        assert_eq!(response.total, 9);
        assert_eq!(response.scores["science"].note, "cells");
    }
}
