//! Upload → text → clinical fields.
//!
//! `import` stages an uploaded file on disk and decides how to read it,
//! `extraction` turns it into text and pulls labeled values out of that text.

pub mod import;
pub mod extraction;
