//! Path computation for the world tree.
//!
//! All methods here are pure computations with no I/O, except
//! [`discover_root`] which only checks for directory existence while walking
//! upward.

use crate::slug::WorldId;
use std::path::{Path, PathBuf};

/// Name of the top-level directory holding every world.
pub const WORLDS_DIR: &str = "worlds";
/// Codex file name inside a world directory.
pub const CODEX_FILE: &str = "codex.md";
/// Sessions subdirectory inside a world directory.
pub const SESSIONS_DIR: &str = "sessions";
/// Advisory lock guarding session-number allocation.
pub const SESSION_LOCK_FILE: &str = ".lock";

/// Resolved on-disk layout of one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPaths {
    pub root: PathBuf,
    pub world_id: WorldId,
    pub world_dir: PathBuf,
    pub codex_path: PathBuf,
    pub sessions_dir: PathBuf,
}

impl WorldPaths {
    /// Compute the layout for `world_id` under `root`.
    ///
    /// Same inputs, same paths; nothing is touched on disk.
    pub fn resolve(root: &Path, world_id: &WorldId) -> Self {
        let world_dir = root.join(WORLDS_DIR).join(world_id.as_str());
        WorldPaths {
            root: root.to_path_buf(),
            world_id: world_id.clone(),
            codex_path: world_dir.join(CODEX_FILE),
            sessions_dir: world_dir.join(SESSIONS_DIR),
            world_dir,
        }
    }

    /// Lock file serializing session creation for this world.
    pub fn session_lock_file(&self) -> PathBuf {
        self.sessions_dir.join(SESSION_LOCK_FILE)
    }
}

/// Trait providing path computation for anything that knows the repository root.
pub trait ArchivePaths {
    /// Repository root (the directory containing `worlds/`)
    fn root(&self) -> &Path;

    /// Directory holding all worlds
    fn worlds_dir(&self) -> PathBuf {
        self.root().join(WORLDS_DIR)
    }

    /// Full layout for one world
    fn world_paths(&self, world_id: &WorldId) -> WorldPaths {
        WorldPaths::resolve(self.root(), world_id)
    }
}

/// Find the repository root for `start`.
///
/// Returns the nearest ancestor of `start` (itself included) that contains a
/// `worlds` directory, or `start` when there is none up to the filesystem
/// root.
pub fn discover_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(WORLDS_DIR).is_dir())
        .unwrap_or(start)
        .to_path_buf()
}
