use tracing::info;

use crate::{
    clock::date_key,
    dao::{
        codes::{generate_member_id, normalize_session_code},
        models::day_total,
        session::SessionRepository,
    },
    dto::{
        dashboard::DashboardResponse,
        session::{
            CreateSessionRequest, JoinSessionRequest, MemberResponse, SessionIdentity,
            SubmitScoresRequest, SubmitScoresResponse, TodayScoresResponse, score_entries,
        },
        validation::{validate_member_id, validate_session_code},
    },
    error::ServiceError,
    standings,
    state::SharedState,
};

/// Open a new session and join it as its first member.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionIdentity, ServiceError> {
    let repository = state.repository().await?;
    let code = repository.create_session().await?;
    join(&repository, code, generate_member_id(), &request.nickname).await
}

/// Join the session typed by the user, reusing the client's member id when given.
pub async fn join_session(
    state: &SharedState,
    raw_code: &str,
    request: JoinSessionRequest,
) -> Result<SessionIdentity, ServiceError> {
    let code = parse_session_code(raw_code)?;
    let member_id = request.member_id.unwrap_or_else(generate_member_id);
    let repository = state.repository().await?;
    join(&repository, code, member_id, &request.nickname).await
}

/// Look up a persisted identity so a returning client can skip the join form.
pub async fn resume(
    state: &SharedState,
    raw_code: &str,
    member_id: &str,
) -> Result<MemberResponse, ServiceError> {
    let code = parse_session_code(raw_code)?;
    parse_member_id(member_id)?;

    let repository = state.repository().await?;
    let Some(member) = repository.find_member(&code, member_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "member `{member_id}` not found in session `{code}`"
        )));
    };
    Ok(MemberResponse::new(code, member_id.to_owned(), member))
}

/// Today's record of a member.
pub async fn today_scores(
    state: &SharedState,
    raw_code: &str,
    member_id: &str,
) -> Result<TodayScoresResponse, ServiceError> {
    let code = parse_session_code(raw_code)?;
    parse_member_id(member_id)?;

    let repository = state.repository().await?;
    let day = repository.get_today_scores(&code, member_id).await?;
    Ok(TodayScoresResponse::new(date_key(repository.today()), day))
}

/// Replace today's record of a member and return it with the refreshed streak.
pub async fn submit_scores(
    state: &SharedState,
    raw_code: &str,
    member_id: &str,
    request: SubmitScoresRequest,
) -> Result<SubmitScoresResponse, ServiceError> {
    let code = parse_session_code(raw_code)?;
    parse_member_id(member_id)?;

    let repository = state.repository().await?;
    let submitted = repository
        .submit_scores(&code, member_id, &request.raw_scores(), &request.notes)
        .await?;

    let total = day_total(&submitted.scores);
    Ok(SubmitScoresResponse {
        date: submitted.date,
        scores: score_entries(submitted.scores),
        total,
        streak: submitted.streak,
    })
}

/// Dashboard of a session for the current day.
pub async fn dashboard(
    state: &SharedState,
    raw_code: &str,
) -> Result<DashboardResponse, ServiceError> {
    let code = parse_session_code(raw_code)?;
    let repository = state.repository().await?;
    let Some(session) = repository.find_session(&code).await? else {
        return Err(ServiceError::NotFound(format!("session `{code}` not found")));
    };

    let today = repository.today();
    let standings = standings::standings(&session, today);
    Ok(DashboardResponse::new(code, date_key(today), standings))
}

/// Trim, upper-case and check a session code coming from a URL or a form.
pub fn parse_session_code(raw: &str) -> Result<String, ServiceError> {
    let code = normalize_session_code(raw);
    validate_session_code(&code).map_err(|err| invalid_input("session code", err))?;
    Ok(code)
}

fn parse_member_id(member_id: &str) -> Result<(), ServiceError> {
    validate_member_id(member_id).map_err(|err| invalid_input("member id", err))
}

fn invalid_input(what: &str, err: validator::ValidationError) -> ServiceError {
    match err.message {
        Some(message) => ServiceError::InvalidInput(message.into_owned()),
        None => ServiceError::InvalidInput(format!("invalid {what}")),
    }
}

async fn join(
    repository: &SessionRepository,
    code: String,
    member_id: String,
    nickname: &str,
) -> Result<SessionIdentity, ServiceError> {
    let nickname = nickname.trim();
    let member = repository.join_session(&code, &member_id, nickname).await?;
    info!(%code, %member_id, "identity issued");
    Ok(SessionIdentity {
        session_code: code,
        member_id,
        nickname: member.nickname,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use serde_json::json;
    use time::macros::date;

    use super::*;
    use crate::{clock::FixedClock, dao::store::MemoryStore, state::AppState};

    async fn ready_state() -> SharedState {
        let state = AppState::new(Arc::new(FixedClock(date!(2024 - 05 - 15))), None);
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn nickname(value: &str) -> CreateSessionRequest {
        CreateSessionRequest {
            nickname: value.into(),
        }
    }

    fn join_request(value: &str, member_id: Option<&str>) -> JoinSessionRequest {
        JoinSessionRequest {
            nickname: value.into(),
            member_id: member_id.map(Into::into),
        }
    }

    #[tokio::test]
    async fn create_session_joins_the_creator() {
        let state = ready_state().await;
        let identity = create_session(&state, nickname("  Rafi ")).await.unwrap();

        assert_eq!(identity.nickname, "Rafi");
        assert_eq!(identity.member_id.len(), 9);
        let member = resume(&state, &identity.session_code, &identity.member_id)
            .await
            .unwrap();
        assert_eq!(member.streak, 0);
    }

    #[tokio::test]
    async fn join_normalises_the_code_and_keeps_the_client_id() {
        let state = ready_state().await;
        let creator = create_session(&state, nickname("Rafi")).await.unwrap();
        let typed = format!(" {} ", creator.session_code.to_lowercase());

        let joined = join_session(&state, &typed, join_request("Mina", Some("mina-1")))
            .await
            .unwrap();

        assert_eq!(joined.session_code, creator.session_code);
        assert_eq!(joined.member_id, "mina-1");
    }

    #[tokio::test]
    async fn join_unknown_session_is_not_found() {
        let state = ready_state().await;
        let err = join_session(&state, "ZZZZZZ", join_request("Mina", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_code_is_invalid_input() {
        let state = ready_state().await;
        let err = dashboard(&state, "AB-12").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn submit_then_dashboard() {
        let state = ready_state().await;
        let identity = create_session(&state, nickname("Rafi")).await.unwrap();
        let request: SubmitScoresRequest = serde_json::from_value(json!({
            "scores": { "math": "8", "science": 12 },
            "notes": { "math": "fractions" }
        }))
        .unwrap();

        let submitted = submit_scores(
            &state,
            &identity.session_code,
            &identity.member_id,
            request,
        )
        .await
        .unwrap();
        assert_eq!(submitted.date, "2024-05-15");
        assert_eq!(submitted.total, 18);
        assert_eq!(submitted.streak, 1);

        let today = today_scores(&state, &identity.session_code, &identity.member_id)
            .await
            .unwrap();
        assert_eq!(today.scores["math"].note, "fractions");
        assert_eq!(today.scores["science"].score, 10);

        let board = dashboard(&state, &identity.session_code).await.unwrap();
        assert_eq!(board.members.len(), 1);
        assert_eq!(board.members[0].today_score, 18);
        assert_eq!(board.champion.unwrap().member_id, identity.member_id);
    }

    #[tokio::test]
    async fn degraded_state_rejects_requests() {
        let state = AppState::new(Arc::new(FixedClock(date!(2024 - 05 - 15))), None);
        let err = create_session(&state, nickname("Rafi")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn submit_for_unknown_member_is_not_found() {
        let state = ready_state().await;
        let identity = create_session(&state, nickname("Rafi")).await.unwrap();
        let request = SubmitScoresRequest {
            scores: IndexMap::new(),
            notes: IndexMap::new(),
        };
        let err = submit_scores(&state, &identity.session_code, "ghost", request)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
