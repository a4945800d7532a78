//! Session transcripts.
//!
//! A session is a Markdown file named `<YYYY-MM-DD>_<NN>.md` in the world's
//! `sessions/` directory. After the header is written the file only ever
//! grows: [`append_transcript`] is the sole mutation path.

use crate::error::{Error, Result};
use crate::safe_io::{FileLock, append_line, atomic_write_text};
use crate::slug::WorldId;
use chrono::{Local, NaiveDate};
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{Archive, ArchivePaths};

/// Speaker tag for the human answering questions.
pub const HUMAN_SPEAKER: &str = "Sage";
/// Speaker tag for generated questions.
pub const AI_SPEAKER: &str = "AI";
/// Speaker tag used when the caller passes a blank one.
const ANONYMOUS_SPEAKER: &str = "Anonymous";

/// `<date>_<seq>.md`; quarantine and temp files never match.
static SESSION_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})_(\d{2,})\.md$").expect("session file pattern is valid")
});

fn session_header(session_id: &str, world_id: &WorldId) -> String {
    format!(
        "# Session: {}\nWorld: {}\n\n## Transcript\n",
        session_id, world_id
    )
}

/// Parse a session file name into its date prefix and sequence number.
fn parse_session_name(name: &str) -> Option<(&str, u32)> {
    let caps = SESSION_FILE.captures(name)?;
    let date = caps.get(1)?.as_str();
    let seq = caps.get(2)?.as_str().parse().ok()?;
    Some((date, seq))
}

/// Session files in `dir` as `(date, seq, path)`, ordered by date then sequence.
fn scan_sessions(dir: &Path) -> Result<Vec<(String, u32, PathBuf)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut sessions = Vec::new();
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|ft| ft.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some((date, seq)) = parse_session_name(&name) {
            sessions.push((date.to_string(), seq, entry.path()));
        }
    }
    // Numeric sequence order, so _100 sorts after _99
    sessions.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
    Ok(sessions)
}

impl Archive {
    /// Start a new session for today (local time).
    pub fn create_session(&self, world_id: &WorldId) -> Result<PathBuf> {
        self.create_session_on(world_id, Local::now().date_naive())
    }

    /// Start a new session dated `date`.
    ///
    /// Picks the next free same-day sequence number (01 when none exist) and
    /// writes the header atomically. Allocation runs under an advisory lock on
    /// `sessions/.lock`, so cooperating processes never pick the same number.
    pub fn create_session_on(&self, world_id: &WorldId, date: NaiveDate) -> Result<PathBuf> {
        let paths = self.ensure_world(world_id)?;
        let _lock = FileLock::acquire(&paths.session_lock_file())?;

        let prefix = date.format("%Y-%m-%d").to_string();
        let last = scan_sessions(&paths.sessions_dir)?
            .into_iter()
            .filter(|(date, _, _)| *date == prefix)
            .map(|(_, seq, _)| seq)
            .max()
            .unwrap_or(0);

        let session_id = format!("{}_{:02}", prefix, last + 1);
        let path = paths.sessions_dir.join(format!("{}.md", session_id));
        debug!("allocating session {} (previous max {})", session_id, last);

        atomic_write_text(&path, &session_header(&session_id, world_id))?;
        info!("created session {}", path.display());
        Ok(path)
    }

    /// All session files of a world, oldest first. Empty if the world has none.
    pub fn list_sessions(&self, world_id: &WorldId) -> Result<Vec<PathBuf>> {
        let paths = self.world_paths(world_id);
        Ok(scan_sessions(&paths.sessions_dir)?
            .into_iter()
            .map(|(_, _, path)| path)
            .collect())
    }

    /// Most recent session of a world, if any.
    pub fn latest_session(&self, world_id: &WorldId) -> Result<Option<PathBuf>> {
        Ok(self.list_sessions(world_id)?.pop())
    }
}

fn require_session(session_path: &Path) -> Result<()> {
    if session_path.is_file() {
        Ok(())
    } else {
        Err(Error::SessionNotFound(session_path.to_path_buf()))
    }
}

/// Whether a transcript line is a speaker-tagged turn (`**Speaker:** text`).
pub fn is_turn_line(line: &str) -> bool {
    line.starts_with("**") && line.contains(":** ")
}

/// Fold `text` onto one line: each line is trimmed, blank lines are dropped
/// and the rest are joined with a space.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append one turn line to an existing session.
///
/// A blank speaker becomes `Anonymous`. Multi-line `text` is folded onto a
/// single line so the whole turn stays readable as one `**Speaker:** text`
/// line. The line is written with a single buffered write and flushed.
pub fn append_transcript(session_path: &Path, speaker: &str, text: &str) -> Result<()> {
    require_session(session_path)?;

    let speaker = match speaker.trim() {
        "" => ANONYMOUS_SPEAKER,
        s => s,
    };
    let line = format!("**{}:** {}\n", speaker, single_line(text));

    append_line(session_path, &line).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::SessionNotFound(session_path.to_path_buf()),
        _ => Error::Io(e),
    })
}

/// The last `n_turns` turn lines of a session, joined with `\n`.
///
/// Header and other non-turn lines are skipped.
pub fn read_recent_transcript(session_path: &Path, n_turns: usize) -> Result<String> {
    let text = read_transcript(session_path)?;
    let turns: Vec<&str> = text.lines().filter(|line| is_turn_line(line)).collect();
    let start = turns.len().saturating_sub(n_turns);
    Ok(turns[start..].join("\n"))
}

/// Full session text.
pub fn read_transcript(session_path: &Path) -> Result<String> {
    fs::read_to_string(session_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::SessionNotFound(session_path.to_path_buf()),
        _ => Error::Io(e),
    })
}

/// The last `n` raw lines of a session, header included.
pub fn tail_lines(session_path: &Path, n: usize) -> Result<Vec<String>> {
    let text = read_transcript(session_path)?;
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}
