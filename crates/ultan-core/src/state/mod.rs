//! Persistent state for ultan.
//!
//! Everything lives under one repository root:
//!
//! ```text
//! <root>/worlds/<slug>/codex.md
//! <root>/worlds/<slug>/sessions/<YYYY-MM-DD>_<NN>.md
//! ```
//!
//! [`Archive`] carries that root explicitly. Choosing a default root is the
//! caller's job (see [`discover_root`]).

mod codex;
mod paths;
mod sessions;
mod world_ops;

#[cfg(test)]
mod tests;

pub use codex::{REQUIRED_HEADINGS, codex_title, default_codex};
pub use paths::{ArchivePaths, WorldPaths, discover_root};
pub use sessions::{
    AI_SPEAKER, HUMAN_SPEAKER, append_transcript, is_turn_line, read_recent_transcript,
    read_transcript, tail_lines,
};

use std::path::{Path, PathBuf};

/// Handle on a world tree rooted at a fixed directory.
///
/// Cheap to construct; holds no open files. Each store operation resolves
/// its paths from the root on every call.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Archive { root: root.into() }
    }
}

impl ArchivePaths for Archive {
    fn root(&self) -> &Path {
        &self.root
    }
}
