//! API middleware stack.
//!
//! Execution order for protected routes (outermost → innermost):
//! 1. Audit logger — records every request with its outcome
//! 2. Auth validator — session lookup, injects `CurrentUser`
//! 3. Rate limiter — keyed by the authenticated user
//!
//! Public routes get the audit logger and an IP-keyed rate limiter.

pub mod audit;
pub mod auth;
pub mod rate;
