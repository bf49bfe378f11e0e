use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const REVOKE_URL: &str = "https://accounts.google.com/o/oauth2/revoke";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("failed to upgrade the authorization code: {0}")]
    Exchange(String),
    #[error("token rejected: {0}")]
    TokenRejected(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the tokeninfo response we validate against.
#[derive(Deserialize)]
struct TokenInfo {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    issued_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

/// Google authorization-code client. The handshake is: exchange the code for
/// an access token, check the token info against our client id, then fetch
/// the signed-in user's profile.
#[derive(Clone)]
pub struct GoogleClient {
    pub client_id: String,
    client_secret: String,
    redirect_url: String,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set"),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
                .expect("GOOGLE_CLIENT_SECRET must be set"),
            redirect_url: std::env::var("OAUTH_REDIRECT_URL")
                .expect("OAUTH_REDIRECT_URL must be set"),
            http: reqwest::Client::new(),
        }
    }

    /// Sign-in link for the login page, carrying the anti-forgery state.
    pub fn authorize_url(&self, state: &str) -> String {
        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .expect("static auth URL is valid");
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let res = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(OAuthError::Exchange(body));
        }

        let token: TokenResponse = res.json().await?;
        Ok(token.access_token)
    }

    /// Validate the access token: no error field, and issued to this app.
    async fn verify_token(&self, access_token: &str) -> Result<(), OAuthError> {
        let info: TokenInfo = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("access_token", access_token)])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = info.error {
            return Err(OAuthError::TokenRejected(error));
        }
        if info.issued_to.as_deref() != Some(self.client_id.as_str()) {
            return Err(OAuthError::TokenRejected(
                "token's client ID does not match app's".into(),
            ));
        }
        Ok(())
    }

    async fn user_info(&self, access_token: &str) -> Result<GoogleUser, OAuthError> {
        let user = self
            .http
            .get(USERINFO_URL)
            .query(&[("access_token", access_token), ("alt", "json")])
            .send()
            .await?
            .json()
            .await?;
        Ok(user)
    }

    /// Full callback-side flow; returns the profile and the access token
    /// kept for later revocation.
    pub async fn sign_in(&self, code: &str) -> Result<(GoogleUser, String), OAuthError> {
        let access_token = self.exchange_code(code).await?;
        self.verify_token(&access_token).await?;
        let user = self.user_info(&access_token).await?;
        Ok((user, access_token))
    }

    /// Best-effort revocation on logout; a failure only means the token
    /// expires on its own.
    pub async fn revoke(&self, access_token: &str) {
        let res = self
            .http
            .get(REVOKE_URL)
            .query(&[("token", access_token)])
            .send()
            .await;
        match res {
            Ok(res) if res.status().is_success() => {}
            Ok(res) => warn!("token revocation returned {}", res.status()),
            Err(e) => warn!("token revocation failed: {e}"),
        }
    }
}
