//! The JSON API for goal settings.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    ApiError, AppState, Error,
    database_id::{GoalId, UserId},
    db::lock_connection,
    dates::parse_date,
    goal::{GoalBuilder, GoalKind, GoalSetting, GoalStatus, delete_goal, get_goals, save_goal},
    snapshot::Snapshot,
};

/// The state needed to manage goal settings.
#[derive(Debug, Clone)]
pub struct GoalState {
    db_connection: Arc<Mutex<Connection>>,
    user_id: UserId,
    goals: Snapshot<GoalSetting>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
            goals: state.goals.clone(),
        }
    }
}

/// The JSON body for saving a goal. Leave out `id` to create a new goal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalForm {
    #[serde(default)]
    pub id: Option<GoalId>,
    pub name: String,
    pub category: String,
    pub goal_amount: f64,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(rename = "type")]
    pub kind: GoalKind,
}

impl GoalForm {
    /// # Errors
    /// Returns [Error::InvalidDate] for an unreadable target date or any error
    /// from [GoalBuilder::validate].
    pub fn into_builder(self) -> Result<GoalBuilder, Error> {
        let target_date = match self.target_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse_date(text).ok_or_else(|| Error::InvalidDate(text.to_owned()))?),
        };

        let builder = GoalSetting::build(&self.name, &self.category, self.goal_amount, self.kind)
            .id(self.id)
            .target_date(target_date)
            .status(self.status);
        builder.validate()?;

        Ok(builder)
    }
}

pub async fn get_goals_endpoint(
    State(state): State<GoalState>,
) -> Result<Json<Vec<GoalSetting>>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    let goals = match state.goals.refresh(|| get_goals(state.user_id, &connection)) {
        Ok(goals) => goals,
        Err(Error::StaleResponse(_)) => state.goals.current(),
        Err(error) => return Err(error.into()),
    };

    Ok(Json(goals.as_ref().clone()))
}

/// Save a goal, responds with `201 Created` for new goals and `200 OK` for updates.
pub async fn save_goal_endpoint(
    State(state): State<GoalState>,
    payload: Result<Json<GoalForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(form) =
        payload.map_err(|rejection| Error::JSONSerializationError(rejection.body_text()))?;
    let builder = form.into_builder()?;
    let status = match builder.id {
        Some(_) => StatusCode::OK,
        None => StatusCode::CREATED,
    };

    let connection = lock_connection(&state.db_connection)?;
    let goal = save_goal(builder, state.user_id, &connection)?;

    state
        .goals
        .refresh_or_current(|| get_goals(state.user_id, &connection));

    Ok((status, Json(goal)).into_response())
}

pub async fn delete_goal_endpoint(
    State(state): State<GoalState>,
    Path(goal_id): Path<GoalId>,
) -> Result<StatusCode, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    delete_goal(goal_id, state.user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not delete goal {goal_id}: {error}"))?;

    state
        .goals
        .refresh_or_current(|| get_goals(state.user_id, &connection));

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::StatusCode,
        routing::{delete, get},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, CurrencyCode, Settings, endpoints,
        goal::{
            GoalKind, GoalSetting, GoalStatus, delete_goal_endpoint, get_goals_endpoint,
            save_goal_endpoint,
        },
    };

    fn get_test_state() -> AppState {
        AppState::new(
            Connection::open_in_memory().unwrap(),
            1,
            "Etc/UTC",
            CurrencyCode::USD,
            Settings::default(),
        )
        .unwrap()
    }

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::GOALS_API, get(get_goals_endpoint).post(save_goal_endpoint))
            .route(endpoints::GOAL_API, delete(delete_goal_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn saving_goal_updates_snapshot() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let mut receiver = state.goals.subscribe();

        let response = server
            .post(endpoints::GOALS_API)
            .json(&json!({
                "name": "Side hustle",
                "category": "Business",
                "goalAmount": 5000,
                "targetDate": "2026-01-01",
                "type": "Income"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let goal: GoalSetting = response.json();
        assert_eq!(goal.kind, GoalKind::Income);
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update().as_ref(), vec![goal.clone()]);

        server
            .delete(&endpoints::format_endpoint(endpoints::GOAL_API, goal.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(state.goals.current().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_is_bad_request() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::GOALS_API)
            .json(&json!({
                "name": "Luck",
                "category": "Lottery",
                "goalAmount": 10,
                "type": "Income"
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn status_is_read_from_display_name() {
        let server = get_test_server(get_test_state());

        let goal: GoalSetting = server
            .post(endpoints::GOALS_API)
            .json(&json!({
                "name": "Car",
                "category": "Buying Car",
                "goalAmount": 8000,
                "status": "On Hold",
                "type": "Expense"
            }))
            .await
            .json();

        assert_eq!(goal.status, GoalStatus::OnHold);

        let listed: Vec<GoalSetting> = server.get(endpoints::GOALS_API).await.json();
        assert_eq!(listed, vec![goal]);
    }
}
