use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        error::UserResult,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", put(update_user))
        .route("/users/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> UserResult<Json<Vec<PublicUser>>> {
    let users = state.users.get_all().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> UserResult<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = state.users.create(payload.into()).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> UserResult<Json<PublicUser>> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> UserResult<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = state.users.update(payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> UserResult<Json<bool>> {
    let deleted = state.users.delete(id).await?;
    Ok(Json(deleted))
}
