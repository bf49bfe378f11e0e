use askama::Template;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::auth::get_cookie;

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn to_500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub fn not_found(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, msg.into())
}

pub fn unauthorized(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, msg.into())
}

/// Capitalize each whitespace-separated word; reference-table names are
/// stored in this form ("tiny turtle" -> "Tiny Turtle").
pub fn capwords(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// One-shot notices carried across a redirect in a short-lived cookie,
// cleared by the page render that displays them.

pub fn get_flash(headers: &HeaderMap) -> Option<String> {
    let raw = get_cookie(headers, "flash")?;
    let msg = percent_decode_str(&raw).decode_utf8_lossy().into_owned();
    (!msg.is_empty()).then_some(msg)
}

/// Percent-encoded so spaces and punctuation stay inside the cookie-value
/// charset.
pub fn flash_cookie(msg: &str) -> String {
    format!(
        "flash={}; Path=/; Max-Age=60",
        utf8_percent_encode(msg, NON_ALPHANUMERIC)
    )
}

pub fn flash_redirect(to: &str, msg: &str) -> Response {
    let mut res = Redirect::to(to).into_response();
    if let Ok(v) = HeaderValue::from_str(&flash_cookie(msg)) {
        res.headers_mut().append(header::SET_COOKIE, v);
    }
    res
}

/// Render a template to an HTML response, clearing the flash cookie when
/// this render consumed one.
pub fn render<T: Template>(tpl: &T, clear_flash: bool) -> ApiResult<Response> {
    let html = tpl.render().map_err(to_500)?;
    let mut res = Html(html).into_response();
    if clear_flash {
        res.headers_mut().append(
            header::SET_COOKIE,
            HeaderValue::from_static("flash=; Path=/; Max-Age=0"),
        );
    }
    Ok(res)
}
