use axum::Router;
use axum::routing::get;

use crate::app::AppState;
use crate::handlers::auth::{logout, oauth_callback, show_login};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemon/login", get(show_login))
        .route("/oauth2/callback", get(oauth_callback))
        .route("/pokemon/logout", get(logout))
}
