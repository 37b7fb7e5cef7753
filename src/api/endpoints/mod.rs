//! API endpoint handlers.
//!
//! Each module corresponds to a page of the web client. Handlers are thin:
//! blocking work goes through `ApiContext::blocking` into the domain modules.

pub mod assessments;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod ocr;
pub mod profile;
