//! World lifecycle operations for Archive.
//!
//! Creating (ensuring), listing and deleting world directories.

use crate::error::{Error, Result};
use crate::safe_io::atomic_write_text;
use crate::slug::WorldId;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;

use super::{Archive, ArchivePaths, WorldPaths, default_codex};

impl Archive {
    /// Make sure the world's directories and codex exist.
    ///
    /// Idempotent: safe to call every time a world is referenced. The codex
    /// template is only written when no codex exists yet; an existing codex
    /// is never touched.
    pub fn ensure_world(&self, world_id: &WorldId) -> Result<WorldPaths> {
        let paths = self.world_paths(world_id);

        // sessions/ lives inside the world dir, so this creates both
        fs::create_dir_all(&paths.sessions_dir)?;

        if !paths.codex_path.exists() {
            atomic_write_text(&paths.codex_path, &default_codex(world_id))?;
            info!("created world '{}' at {}", world_id, paths.world_dir.display());
        } else {
            debug!("world '{}' already present", world_id);
        }

        Ok(paths)
    }

    /// Remove a world directory and everything in it.
    ///
    /// Irreversible. Fails with [`Error::WorldNotFound`] if the world does not
    /// exist.
    pub fn delete_world(&self, world_id: &WorldId) -> Result<()> {
        let paths = self.world_paths(world_id);
        if !paths.world_dir.is_dir() {
            return Err(Error::WorldNotFound(world_id.to_string()));
        }

        fs::remove_dir_all(&paths.world_dir)?;
        info!("deleted world '{}'", world_id);
        Ok(())
    }

    /// Names of all world directories, sorted.
    ///
    /// Returns an empty list when `worlds/` does not exist yet.
    pub fn list_worlds(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.worlds_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut worlds: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_dir()))
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        worlds.sort();
        Ok(worlds)
    }
}
