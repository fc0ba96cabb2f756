use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{Envelope, PageQuery, UserPayload},
        pagination::{Page, PageRequest},
        password::hash_password,
        repo::UserStore,
        repo_types::{NewUser, User, UserChanges},
        validation::{validate, Mode},
    },
};

pub const USERS_PATH: &str = "/api/users";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(show_user).put(update_user).delete(delete_user),
        )
}

/// Lookup step shared by every handler addressing a single user.
pub async fn resolve_user(
    store: &dyn UserStore,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<User, AppError> {
    let Path(id) = id?;
    store.find(id).await?.ok_or(AppError::NotFound)
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Envelope>, AppError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let req = PageRequest::new(query.page());

    let total = state.users.count().await?;
    let data = state.users.list(req.limit(), req.offset()).await?;
    info!(page = req.page, total, returned = data.len(), "users listed");

    Ok(Json(Envelope::users(Page::new(data, total, req, USERS_PATH))))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<Envelope>, AppError> {
    let Json(payload) = payload?;
    let valid = validate(state.users.as_ref(), &payload, Mode::Create).await?;

    let password = valid
        .password
        .as_deref()
        .context("validated create payload without password")?;
    let password_hash = hash_password(password)?;

    let user = state
        .users
        .insert(NewUser {
            id: Uuid::new_v4(),
            name: valid.name,
            email: valid.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(Json(Envelope::ok("User has been created successfully")))
}

#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope>, AppError> {
    let user = resolve_user(state.users.as_ref(), id).await?;
    Ok(Json(Envelope::user(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<Json<Envelope>, AppError> {
    let user = resolve_user(state.users.as_ref(), id).await?;
    let Json(payload) = payload?;
    let valid = validate(state.users.as_ref(), &payload, Mode::Update { id: user.id }).await?;

    let password_hash = valid.password.as_deref().map(hash_password).transpose()?;
    let password_changed = password_hash.is_some();

    let updated = state
        .users
        .update(
            user.id,
            UserChanges {
                name: valid.name,
                email: valid.email,
                password_hash,
            },
        )
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %updated.id, email = %updated.email, password_changed, "user updated");
    Ok(Json(Envelope::ok("User has been updated successfully")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope>, AppError> {
    let user = resolve_user(state.users.as_ref(), id).await?;
    if !state.users.delete(user.id).await? {
        return Err(AppError::NotFound);
    }

    info!(user_id = %user.id, "user deleted");
    Ok(Json(Envelope::ok("User has been deleted successfully")))
}
