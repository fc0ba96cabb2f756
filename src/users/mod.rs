pub mod dto;
pub mod handlers;
pub mod memory;
pub mod pagination;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
