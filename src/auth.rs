use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use axum::response::Redirect;

use crate::models::user::User;

/// Signed session cookie payload. The Google access token rides along so
/// logout can revoke it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i32,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

fn session_secret() -> String {
    std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set")
}

fn session_ttl_secs() -> i64 {
    std::env::var("SESSION_EXP_SECONDS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(86_400)
}

fn secure_flag() -> &'static str {
    let prod = std::env::var("PRODUCTION_MODE")
        .ok()
        .is_some_and(|v| v == "true");
    if prod { "; Secure" } else { "" }
}

pub fn generate_session_token(
    user: &User,
    access_token: Option<String>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let claims = SessionClaims {
        sub: user.id,
        name: user.display_name().to_string(),
        email: user.email.clone(),
        access_token,
        iat: now,
        exp: now + session_ttl_secs(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(session_secret().as_bytes()),
    )
}

pub fn verify_session(token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let validation = Validation::default();
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(session_secret().as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

pub fn session_cookie(token: &str) -> String {
    let max_age = session_ttl_secs();
    format!("session={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax{}", secure_flag())
}

pub fn clear_session_cookie() -> String {
    format!("session=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}", secure_flag())
}

// Anti-forgery state for the OAuth handshake, parked in a short-lived cookie
// and echoed back by the provider in the callback query.

pub fn generate_state() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn state_cookie(state: &str) -> String {
    format!("oauth_state={state}; Path=/; Max-Age=600; HttpOnly; SameSite=Lax{}", secure_flag())
}

pub fn clear_state_cookie() -> String {
    format!("oauth_state=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}", secure_flag())
}

pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let p = part.trim();
        if let Some(v) = p.strip_prefix(&format!("{name}=")) {
            return Some(v.to_string());
        }
    }
    None
}

/// Extractor for pages that require sign-in; anonymous visitors land on the
/// login page instead.
#[derive(Clone, Debug)]
pub struct SessionUser(pub SessionClaims);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = get_cookie(&parts.headers, "session")
            .ok_or_else(|| Redirect::to("/pokemon/login"))?;
        let claims = verify_session(&token).map_err(|_| Redirect::to("/pokemon/login"))?;
        Ok(SessionUser(claims))
    }
}

/// Pages rendered for everyone but with extra controls when signed in.
#[derive(Clone, Debug, Default)]
pub struct MaybeUser(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = get_cookie(&parts.headers, "session")
            .and_then(|token| verify_session(&token).ok());
        Ok(MaybeUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn test_user() -> User {
        User {
            id: 7,
            name: "KantoAdmin".into(),
            email: "admin@example.com".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn session_token_roundtrip() {
        unsafe { std::env::set_var("SESSION_SECRET", "test-secret") };
        let token = generate_session_token(&test_user(), Some("ya29.token".into())).unwrap();
        let claims = verify_session(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.name, "KantoAdmin");
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.access_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn tampered_token_is_rejected() {
        unsafe { std::env::set_var("SESSION_SECRET", "test-secret") };
        let token = generate_session_token(&test_user(), None).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_session(&tampered).is_err());
    }

    #[test]
    fn state_tokens_are_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn cookie_extraction_handles_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "oauth_state=abc123; session=tok".parse().unwrap(),
        );
        assert_eq!(get_cookie(&headers, "oauth_state").as_deref(), Some("abc123"));
        assert_eq!(get_cookie(&headers, "session").as_deref(), Some("tok"));
        assert_eq!(get_cookie(&headers, "flash"), None);
    }
}
