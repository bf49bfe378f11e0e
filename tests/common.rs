use std::sync::Once;
use std::time::Duration;

use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use pokemon_types::app::{AppState, build_routes};
use pokemon_types::auth::generate_session_token;
use pokemon_types::db::{find_or_create_user, init_db};
use pokemon_types::models::user::User;
use pokemon_types::oauth::GoogleClient;

static INIT_LOCK: Mutex<()> = Mutex::const_new(());
static ENV: Once = Once::new();

fn test_env() {
    ENV.call_once(|| {
        let _ = dotenvy::dotenv();
        if std::env::var("SESSION_SECRET").is_err() {
            unsafe { std::env::set_var("SESSION_SECRET", "integration-test-secret") };
        }
    });
}

fn test_google_client() -> GoogleClient {
    GoogleClient::new(
        "test-client.apps.googleusercontent.com".into(),
        "test-secret".into(),
        "http://localhost:8000/oauth2/callback".into(),
    )
}

/// Pool against TEST_DATABASE_URL. Each call builds its own pool because
/// every `#[tokio::test]` runs on its own runtime and sqlx connections are
/// bound to the runtime that created them; a pool cached across tests hangs
/// once the first runtime shuts down. The lock serializes `init_db` so the
/// one-time seed cannot race between parallel tests.
pub async fn test_pool() -> &'static PgPool {
    test_env();

    let url = std::env::var("TEST_DATABASE_URL").expect("Set TEST_DATABASE_URL for tests");
    let _guard = INIT_LOCK.lock().await;
    Box::leak(Box::new(init_db(&url).await))
}

#[allow(dead_code)]
pub async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    let pool = test_pool().await.clone();
    let state = AppState {
        pool,
        google: test_google_client(),
    };
    let app = build_routes().with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("serve error: {e}");
        }
    });

    for _ in 0..30 {
        if let Ok(resp) = reqwest::get(format!("{url}/pokemon/json")).await {
            if resp.status().is_success() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    (url, handle)
}

#[allow(dead_code)]
pub async fn create_test_user(name: &str, email: &str) -> User {
    let pool = test_pool().await;
    find_or_create_user(pool, name, email)
        .await
        .expect("insert test user failed")
}

#[allow(dead_code)]
pub async fn delete_test_user(email: &str) {
    let pool = test_pool().await;
    let _ = sqlx::query("DELETE FROM pokemon WHERE user_id IN (SELECT id FROM users WHERE email = $1)")
        .bind(email)
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

/// Cookie header value carrying a signed session for the given user.
#[allow(dead_code)]
pub fn session_cookie_for(user: &User) -> String {
    test_env();
    let token = generate_session_token(user, None).expect("session token");
    format!("session={token}")
}

/// A client that surfaces redirects instead of following them.
#[allow(dead_code)]
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
