use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use pokemon_types::app::{AppState, build_routes};
use pokemon_types::db::init_db;
use pokemon_types::oauth::GoogleClient;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = init_db(&database_url).await;

    let state = AppState {
        pool,
        google: GoogleClient::from_env(),
    };

    // The JSON endpoints are read-only; let any origin GET them.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    let app = build_routes().with_state(state).layer(cors);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = TcpListener::bind(&addr).await.expect("bind failed");
    info!("server running on http://{addr}");

    axum::serve(listener, app).await.expect("server error");
}
