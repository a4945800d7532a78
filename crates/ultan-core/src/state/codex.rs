//! Codex document: template, read and atomic replace.

use crate::error::Result;
use crate::safe_io::atomic_write_text;
use crate::slug::WorldId;
use log::info;
use std::fs;

use super::Archive;

/// Section headings every codex carries, in order, each exactly once.
pub const REQUIRED_HEADINGS: [&str; 10] = [
    "## Places",
    "## People",
    "## Factions / Institutions",
    "## Practices / Rites",
    "## Material Culture (Artifacts, Tech, Craft)",
    "## Theology / Metaphysics",
    "## History / Timeline",
    "## Politics / Law",
    "## Language / Names",
    "## Open questions",
];

/// Title line a codex for `world_id` must start with.
pub fn codex_title(world_id: &WorldId) -> String {
    format!("# Codex — {}", world_id)
}

/// Empty-bodied codex written when a world is first created.
pub fn default_codex(world_id: &WorldId) -> String {
    let mut doc = codex_title(world_id);
    doc.push('\n');
    for heading in REQUIRED_HEADINGS {
        doc.push('\n');
        doc.push_str(heading);
        doc.push('\n');
    }
    doc
}

impl Archive {
    /// Raw codex text, creating the world (and its template) first if needed.
    pub fn read_codex(&self, world_id: &WorldId) -> Result<String> {
        let paths = self.ensure_world(world_id)?;
        Ok(fs::read_to_string(&paths.codex_path)?)
    }

    /// Replace the codex wholesale.
    ///
    /// The new text goes to a temporary sibling first and is renamed into
    /// place, so readers never observe a partial codex.
    pub fn write_codex(&self, world_id: &WorldId, text: &str) -> Result<()> {
        let paths = self.ensure_world(world_id)?;
        atomic_write_text(&paths.codex_path, text)?;
        info!("codex for '{}' updated ({} bytes)", world_id, text.len());
        Ok(())
    }
}
