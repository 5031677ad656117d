use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, date_key},
    dao::{
        codes::generate_session_code,
        models::{
            DayScores, MAX_NOTE_CHARS, MemberEntity, SUBJECTS, ScoreEntryEntity, ScoreHistory,
            SessionEntity, clamp_score, is_known_subject,
        },
        storage::StorageError,
        store::{DataStore, InvalidPath, StorePath, Subscription},
    },
    standings,
};

/// Root key holding every session.
const SESSIONS_ROOT: &str = "sessions";
const MEMBERS_KEY: &str = "members";
const SCORES_KEY: &str = "scores";
const STREAK_KEY: &str = "streak";

/// Failures surfaced by [`SessionRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No session is stored under the code.
    #[error("session `{code}` not found")]
    SessionNotFound { code: String },
    /// The session exists but has no such member.
    #[error("member `{member_id}` not found in session `{code}`")]
    MemberNotFound { code: String, member_id: String },
    /// A submitted subject is not one of the tracked subjects.
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
    /// A code or member id cannot be used as a path segment.
    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),
    /// The store failed or returned malformed data.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenient result alias returning [`RepositoryError`] failures.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of a score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedScores {
    /// Date key the record was stored under.
    pub date: String,
    /// Record as persisted.
    pub scores: DayScores,
    /// Streak recomputed right after the write.
    pub streak: u32,
}

/// Session and score operations expressed as key-path reads and writes.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn DataStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRepository {
    /// Repository over `store`, dating records with `clock`.
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store-local calendar date.
    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// Create an empty session under a fresh code and return the code.
    pub async fn create_session(&self) -> RepositoryResult<String> {
        let code = generate_session_code();
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "invalid-timestamp".into());

        let path = session_path(&code)?;
        self.put(path, &SessionEntity::empty(created_at)).await?;
        info!(%code, "session created");
        Ok(code)
    }

    /// Add (or overwrite) a member with a zero streak.
    ///
    /// Rejoining with an existing member id replaces the record and resets the streak.
    pub async fn join_session(
        &self,
        code: &str,
        member_id: &str,
        nickname: &str,
    ) -> RepositoryResult<MemberEntity> {
        if self.store.read(session_path(code)?).await?.is_none() {
            return Err(RepositoryError::SessionNotFound {
                code: code.to_owned(),
            });
        }

        let member = MemberEntity::joined(nickname);
        self.put(member_path(code, member_id)?, &member).await?;
        info!(%code, %member_id, "member joined session");
        Ok(member)
    }

    /// Member record, or `None` when the session or the member does not exist.
    pub async fn find_member(
        &self,
        code: &str,
        member_id: &str,
    ) -> RepositoryResult<Option<MemberEntity>> {
        self.get(member_path(code, member_id)?).await
    }

    /// Whole session tree, or `None` when no session uses this code.
    pub async fn find_session(&self, code: &str) -> RepositoryResult<Option<SessionEntity>> {
        self.get(session_path(code)?).await
    }

    /// Replace today's record of a member, then recompute and persist the streak.
    ///
    /// Scores are clamped to `0..=10`, missing notes default to empty and notes are
    /// cut to [`MAX_NOTE_CHARS`]. Subjects outside [`SUBJECTS`] are rejected.
    pub async fn submit_scores(
        &self,
        code: &str,
        member_id: &str,
        scores: &IndexMap<String, i64>,
        notes: &IndexMap<String, String>,
    ) -> RepositoryResult<SubmittedScores> {
        let day = build_day_scores(scores, notes)?;

        if self.find_member(code, member_id).await?.is_none() {
            return Err(RepositoryError::MemberNotFound {
                code: code.to_owned(),
                member_id: member_id.to_owned(),
            });
        }

        let today = self.today();
        let date = date_key(today);
        self.put(day_path(code, member_id, &date)?, &day).await?;
        let streak = self.recompute_streak(code, member_id, today).await?;

        debug!(%code, %member_id, %date, streak, "scores submitted");
        Ok(SubmittedScores {
            date,
            scores: day,
            streak,
        })
    }

    /// Today's record of a member, empty when nothing was logged yet.
    pub async fn get_today_scores(&self, code: &str, member_id: &str) -> RepositoryResult<DayScores> {
        let date = date_key(self.today());
        Ok(self
            .get::<DayScores>(day_path(code, member_id, &date)?)
            .await?
            .unwrap_or_default())
    }

    /// Follow the whole session subtree.
    pub async fn listen_to_session(&self, code: &str) -> RepositoryResult<SessionFeed> {
        let path = session_path(code)?;
        let subscription = self.store.subscribe(path.clone()).await?;
        Ok(SessionFeed { path, subscription })
    }

    async fn recompute_streak(
        &self,
        code: &str,
        member_id: &str,
        today: Date,
    ) -> RepositoryResult<u32> {
        let history = self
            .get::<ScoreHistory>(history_path(code, member_id)?)
            .await?
            .unwrap_or_default();
        let streak = standings::streak(&history, today);

        let path = member_path(code, member_id)?.join(STREAK_KEY)?;
        self.store.write(path, Value::from(streak)).await?;
        Ok(streak)
    }

    async fn get<T>(&self, path: StorePath) -> RepositoryResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.store.read(path.clone()).await? else {
            return Ok(None);
        };
        decode(&path, value).map(Some).map_err(Into::into)
    }

    async fn put<T>(&self, path: StorePath, value: &T) -> RepositoryResult<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)
            .map_err(|source| StorageError::malformed(path.to_string(), source))?;
        self.store.write(path, value).await.map_err(Into::into)
    }
}

/// Stream of session snapshots backed by a store subscription.
pub struct SessionFeed {
    path: StorePath,
    subscription: Subscription,
}

impl SessionFeed {
    /// Next session state; `Some(None)` when the session does not exist (anymore).
    ///
    /// Snapshots that do not decode as a session are logged and skipped.
    /// Returns `None` once the store ended the subscription.
    pub async fn next(&mut self) -> Option<Option<SessionEntity>> {
        loop {
            let snapshot = self.subscription.next().await?;
            let Some(value) = snapshot else {
                return Some(None);
            };
            match decode::<SessionEntity>(&self.path, value) {
                Ok(session) => return Some(Some(session)),
                Err(err) => warn!(path = %self.path, error = %err, "skipping malformed session snapshot"),
            }
        }
    }

    /// Stop following the session.
    pub fn unsubscribe(self) {
        self.subscription.unsubscribe();
    }
}

fn decode<T: DeserializeOwned>(path: &StorePath, value: Value) -> Result<T, StorageError> {
    serde_json::from_value(value).map_err(|source| StorageError::malformed(path.to_string(), source))
}

fn build_day_scores(
    scores: &IndexMap<String, i64>,
    notes: &IndexMap<String, String>,
) -> RepositoryResult<DayScores> {
    if let Some(unknown) = scores.keys().find(|subject| !is_known_subject(subject)) {
        return Err(RepositoryError::UnknownSubject(unknown.clone()));
    }

    Ok(SUBJECTS
        .iter()
        .filter_map(|subject| {
            let raw = scores.get(*subject)?;
            let note = notes
                .get(*subject)
                .map(|note| note.chars().take(MAX_NOTE_CHARS).collect())
                .unwrap_or_default();
            let entry = ScoreEntryEntity {
                score: clamp_score(*raw),
                note,
            };
            Some((subject.to_string(), entry))
        })
        .collect())
}

fn session_path(code: &str) -> Result<StorePath, InvalidPath> {
    StorePath::parse(SESSIONS_ROOT)?.join(code)
}

fn member_path(code: &str, member_id: &str) -> Result<StorePath, InvalidPath> {
    session_path(code)?.join(MEMBERS_KEY)?.join(member_id)
}

fn history_path(code: &str, member_id: &str) -> Result<StorePath, InvalidPath> {
    session_path(code)?.join(SCORES_KEY)?.join(member_id)
}

fn day_path(code: &str, member_id: &str, date: &str) -> Result<StorePath, InvalidPath> {
    history_path(code, member_id)?.join(date)
}
