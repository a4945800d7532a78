//! Error type shared by the stores, the engine and the generation gateway.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by ultan-core.
///
/// Validation rejections are deliberately absent: validators return a
/// [`Verdict`](crate::validators::Verdict) and the engine reports retries and
/// quarantines through its outcome types.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid world identifier {0:?}: it normalizes to an empty name")]
    InvalidIdentifier(String),

    #[error("world '{0}' not found")]
    WorldNotFound(String),

    #[error("session not found: {}", .0.display())]
    SessionNotFound(PathBuf),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
