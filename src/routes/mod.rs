use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod plans;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/plans", plans::router())
        .nest("/auth", auth::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest("/favorites", favorites::router())
        .nest("/profile", profile::router())
        .nest("/admin", admin::router())
}
