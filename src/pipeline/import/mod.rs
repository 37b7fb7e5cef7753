pub mod format;
pub mod staging;

pub use format::*;
pub use staging::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large: {size} bytes exceeds {max} byte limit")]
    FileTooLarge { size: usize, max: usize },

    #[error("Empty file name")]
    EmptyFileName,
}
