use askama::Template;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::auth::{
    clear_session_cookie, clear_state_cookie, generate_session_token, generate_state, get_cookie,
    session_cookie, state_cookie, verify_session,
};
use crate::db::find_or_create_user;
use crate::helpers::{ApiResult, flash_cookie, get_flash, render, to_500, unauthorized};
use crate::oauth::{GoogleClient, OAuthError};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    signed_in: bool,
    flash: String,
    auth_url: String,
}

pub async fn show_login(
    headers: HeaderMap,
    State(google): State<GoogleClient>,
) -> ApiResult<Response> {
    let state = generate_state();
    let incoming = get_flash(&headers);
    let tpl = LoginTemplate {
        signed_in: false,
        flash: incoming.clone().unwrap_or_default(),
        auth_url: google.authorize_url(&state),
    };

    let mut res = render(&tpl, incoming.is_some())?;
    let cookie = HeaderValue::from_str(&state_cookie(&state)).map_err(to_500)?;
    res.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(res)
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub async fn oauth_callback(
    headers: HeaderMap,
    State(google): State<GoogleClient>,
    State(pool): State<PgPool>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    let expected = get_cookie(&headers, "oauth_state");
    if expected.is_none() || params.state != expected {
        return Err(unauthorized("Invalid state parameter."));
    }

    if let Some(error) = params.error {
        return Err(unauthorized(format!("Sign-in was refused: {error}")));
    }
    let code = params
        .code
        .ok_or_else(|| unauthorized("Missing authorization code."))?;

    let (profile, access_token) = google.sign_in(&code).await.map_err(|e| match e {
        OAuthError::Exchange(_) | OAuthError::TokenRejected(_) => {
            (StatusCode::UNAUTHORIZED, e.to_string())
        }
        OAuthError::Http(_) => to_500(e),
    })?;

    // The name is optional in the provider's profile; the email stands in.
    let username = profile.name.clone().unwrap_or_else(|| profile.email.clone());
    let user = find_or_create_user(&pool, &username, &profile.email)
        .await
        .map_err(to_500)?;
    info!("user {} signed in", user.id);

    let token = generate_session_token(&user, Some(access_token)).map_err(to_500)?;

    let mut res = Redirect::to("/pokemon").into_response();
    let set = |v: &str| HeaderValue::from_str(v).map_err(to_500);
    res.headers_mut()
        .append(header::SET_COOKIE, set(&session_cookie(&token))?);
    res.headers_mut()
        .append(header::SET_COOKIE, set(&clear_state_cookie())?);
    let flash = flash_cookie(&format!("You are now logged in as {}", user.display_name()));
    res.headers_mut().append(header::SET_COOKIE, set(&flash)?);
    Ok(res)
}

pub async fn logout(
    headers: HeaderMap,
    State(google): State<GoogleClient>,
) -> ApiResult<Response> {
    let Some(token) = get_cookie(&headers, "session") else {
        return Err(unauthorized("Current user not connected."));
    };

    if let Ok(claims) = verify_session(&token)
        && let Some(access_token) = claims.access_token
    {
        google.revoke(&access_token).await;
    }

    let mut res = Redirect::to("/pokemon").into_response();
    let cookie = HeaderValue::from_str(&clear_session_cookie()).map_err(to_500)?;
    res.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(res)
}
