//! Shared types for the API layer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use serde::Serialize;

use crate::core_state::CoreState;
use crate::models::User;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "heartwise_session";

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        let limiter = RateLimiter::with_limits(
            core.config.rate_limit_per_minute,
            core.config.rate_limit_per_hour,
        );
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(limiter)),
        }
    }

    /// Run blocking work (SQLite, file I/O, OCR) off the async runtime.
    pub async fn blocking<T, E, F>(&self, f: F) -> Result<T, crate::api::error::ApiError>
    where
        F: FnOnce(&CoreState) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<crate::api::error::ApiError> + Send + 'static,
    {
        let core = self.core.clone();
        tokio::task::spawn_blocking(move || f(&core))
            .await?
            .map_err(Into::into)
    }
}

// ═══════════════════════════════════════════════════════════
// Current user — injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated account, injected into request extensions
/// by the auth middleware after the session was validated.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token_hash: String,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Session token from `Authorization: Bearer` or the session cookie.
/// The header wins when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

// ═══════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════

/// Flash-style outcome: a message, its category and where to go next.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub redirect: String,
}

impl MessageResponse {
    pub fn redirect(to: &str) -> Self {
        Self {
            message: None,
            category: None,
            redirect: to.to_string(),
        }
    }

    pub fn flash(message: &str, category: &'static str, redirect: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            category: Some(category),
            redirect: redirect.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter — per-client sliding window
// ═══════════════════════════════════════════════════════════

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Sliding-window request counter keyed by client.
pub struct RateLimiter {
    hits: HashMap<String, VecDeque<Instant>>,
    per_minute: usize,
    per_hour: usize,
}

impl RateLimiter {
    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            hits: HashMap::new(),
            per_minute: per_minute as usize,
            per_hour: per_hour as usize,
        }
    }

    /// Count a request from `key`. On rejection returns the seconds until
    /// the oldest hit in the exceeded window expires.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> Result<(), u64> {
        // Keys with no hit in the last hour are dropped
        self.hits
            .retain(|_, hits| hits.back().is_some_and(|t| now.duration_since(*t) < HOUR));

        let hits = self.hits.entry(key.to_string()).or_default();
        while hits.front().is_some_and(|t| now.duration_since(*t) >= HOUR) {
            hits.pop_front();
        }

        if hits.len() >= self.per_hour {
            return Err(retry_after(hits[hits.len() - self.per_hour], HOUR, now));
        }
        let in_minute = hits
            .iter()
            .rev()
            .take_while(|t| now.duration_since(**t) < MINUTE)
            .count();
        if in_minute >= self.per_minute {
            return Err(retry_after(hits[hits.len() - self.per_minute], MINUTE, now));
        }

        hits.push_back(now);
        Ok(())
    }
}

/// Whole seconds, rounded up, until `oldest` leaves a window of `width`.
fn retry_after(oldest: Instant, width: Duration, now: Instant) -> u64 {
    let left = width.saturating_sub(now.duration_since(oldest));
    left.as_secs() + u64::from(left.subsec_nanos() > 0)
}
