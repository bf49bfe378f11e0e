use axum::Router;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::oauth::GoogleClient;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub google: GoogleClient,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

impl FromRef<AppState> for GoogleClient {
    fn from_ref(state: &AppState) -> GoogleClient {
        state.google.clone()
    }
}

pub fn build_routes() -> Router<AppState> {
    Router::new()
        .merge(routes::pages::page_routes())
        .merge(routes::auth::auth_routes())
        .merge(routes::api::api_routes())
}
