//! Short-lived, category-tagged notices.
//!
//! Validation hands back a [`Notices`] value; handlers either render it straight
//! into a page or carry it across a redirect in the `flash` cookie, which the
//! next rendered page reads and clears.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "curso_error")]
    CourseField,
    #[serde(rename = "estudiante_error")]
    StudentField,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Success => "success",
            Category::Error => "error",
            Category::CourseField => "curso_error",
            Category::StudentField => "estudiante_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub category: Category,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one(category: Category, message: impl Into<String>) -> Self {
        let mut notices = Self::new();
        notices.push(category, message);
        notices
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::one(Category::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::one(Category::Error, message)
    }

    pub fn push(&mut self, category: Category, message: impl Into<String>) {
        self.0.push(Notice {
            category,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notice> {
        self.0.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|n| n.message.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<Notice> {
        self.0
    }

    pub fn encode(&self) -> String {
        // a Vec of plain structs always serializes
        let json = serde_json::to_vec(&self.0).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// 303 redirect carrying these notices to the next page.
    pub fn redirect(self, to: &str) -> Response {
        if self.is_empty() {
            return Redirect::to(to).into_response();
        }
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            self.encode()
        );
        (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(to)).into_response()
    }
}

/// `Set-Cookie` value that expires the flash cookie.
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", FLASH_COOKIE)
}

/// Notices left by the previous request, read from the `flash` cookie.
#[derive(Debug, Clone, Default)]
pub struct Flashed(pub Notices);

impl<S> FromRequestParts<S> for Flashed
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let notices = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, raw)| {
                let decoded = Notices::decode(raw);
                if decoded.is_none() && !raw.is_empty() {
                    debug!("discarding unreadable flash cookie");
                }
                decoded
            })
            .unwrap_or_default();

        Ok(Flashed(notices))
    }
}
