//! HTTP API.
//!
//! JSON endpoints under `/api/` plus read-only profile pictures under
//! `/static/profile_pics/`. Protected routes run behind the middleware
//! stack: Audit → Auth → Rate Limit → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
