//! Turn engine: one question per user answer, one codex rewrite per session.
//!
//! A turn goes `AwaitingUserInput -> UserTurnRecorded -> QuestionGenerated`,
//! then loops through validation and regeneration until a question is
//! accepted or the retry budget runs out, and ends with the question appended
//! to the transcript.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::gateway::Generator;
use crate::prompts::{codex_write_prompt, question_prompt, question_retry_prompt};
use crate::safe_io::atomic_write_text;
use crate::slug::WorldId;
use crate::state::{
    AI_SPEAKER, Archive, HUMAN_SPEAKER, REQUIRED_HEADINGS, append_transcript,
    read_recent_transcript, read_transcript,
};
use crate::validators::{Verdict, validate_codex, validate_question};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Marker appended to a codex excerpt that was cut short.
pub const TRUNCATION_MARKER: &str = "\n…";

/// Suffix of the file a rejected codex rewrite is diverted to.
const QUARANTINE_SUFFIX: &str = "codex_write_failed";

/// The question appended to the transcript at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    /// The question passed validation.
    Accepted(String),
    /// Every attempt failed validation; `text` is the last candidate.
    ExhaustedRetries { text: String, reason: String },
}

impl QuestionOutcome {
    pub fn text(&self) -> &str {
        match self {
            QuestionOutcome::Accepted(text) => text,
            QuestionOutcome::ExhaustedRetries { text, .. } => text,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, QuestionOutcome::Accepted(_))
    }
}

/// Where a codex rewrite ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The rewrite replaced the live codex at this path.
    Accepted(PathBuf),
    /// The rewrite failed validation and was written here instead.
    Quarantined { path: PathBuf, reason: String },
}

/// Trim `codex` and cut it to `max_chars` characters, marking the cut.
pub fn codex_excerpt(codex: &str, max_chars: usize) -> String {
    let t = codex.trim();
    match t.char_indices().nth(max_chars) {
        None => t.to_string(),
        Some((cut, _)) => format!("{}{}", &t[..cut], TRUNCATION_MARKER),
    }
}

/// `<dir>/<stem>.codex_write_failed.md`, numbered if that already exists.
fn quarantine_path(session_path: &Path) -> PathBuf {
    let stem = session_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "session".to_string());
    let dir = session_path.parent().unwrap_or_else(|| Path::new("."));

    let first = dir.join(format!("{}.{}.md", stem, QUARANTINE_SUFFIX));
    if !first.exists() {
        return first;
    }
    (2u32..)
        .map(|n| dir.join(format!("{}.{}-{}.md", stem, QUARANTINE_SUFFIX, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Composes the stores, the validators and a generator.
pub struct Engine<'a> {
    archive: &'a Archive,
    generator: &'a dyn Generator,
    config: EngineConfig,
    model: Option<String>,
}

impl<'a> Engine<'a> {
    pub fn new(archive: &'a Archive, generator: &'a dyn Generator, config: EngineConfig) -> Self {
        Engine {
            archive,
            generator,
            config,
            model: None,
        }
    }

    /// Use `model` for question generation instead of the generator default.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Record the user's answer and append the next question.
    ///
    /// The returned outcome says whether the appended question passed
    /// validation. Generation failures are returned as errors straight away;
    /// by then the user's turn is already on disk.
    pub async fn process_turn(
        &self,
        world_id: &WorldId,
        session_path: &Path,
        user_text: &str,
    ) -> Result<QuestionOutcome> {
        append_transcript(session_path, HUMAN_SPEAKER, user_text)?;

        let codex = self.archive.read_codex(world_id)?;
        let excerpt = codex_excerpt(&codex, self.config.codex_excerpt_chars);
        let recent = read_recent_transcript(session_path, self.config.transcript_turn_window)?;
        let prompt = question_prompt(world_id, &excerpt, &recent);

        let outcome = self.elicit_question(&prompt).await?;
        append_transcript(session_path, AI_SPEAKER, outcome.text())?;
        Ok(outcome)
    }

    async fn elicit_question(&self, prompt: &str) -> Result<QuestionOutcome> {
        let max_retries = self.config.max_question_retries;
        let retry_prompt = question_retry_prompt(prompt);
        let model = self.model.as_deref();

        let mut candidate = self.generator.generate(prompt, model).await?;
        let mut attempt = 0;
        loop {
            let text = candidate.trim().to_string();
            match validate_question(&text) {
                Verdict::Accepted => {
                    debug!("question accepted after {} retries", attempt);
                    return Ok(QuestionOutcome::Accepted(text));
                }
                Verdict::Rejected { reason } if attempt >= max_retries => {
                    warn!(
                        "question still invalid after {} retries ({}); keeping last candidate",
                        attempt, reason
                    );
                    return Ok(QuestionOutcome::ExhaustedRetries { text, reason });
                }
                Verdict::Rejected { reason } => {
                    attempt += 1;
                    debug!(
                        "question rejected ({}), retry {}/{}",
                        reason, attempt, max_retries
                    );
                    candidate = self.generator.generate(&retry_prompt, model).await?;
                }
            }
        }
    }

    /// Rewrite the codex from a session transcript.
    ///
    /// Generates once. A rewrite that passes [`validate_codex`] replaces the
    /// codex; anything else goes to a quarantine file next to the session and
    /// the live codex stays byte-for-byte as it was.
    pub async fn finalize_codex(
        &self,
        world_id: &WorldId,
        session_path: &Path,
        model: Option<&str>,
    ) -> Result<FinalizeOutcome> {
        let paths = self.archive.ensure_world(world_id)?;
        let codex = self.archive.read_codex(world_id)?;
        let transcript = read_transcript(session_path)?;
        let prompt = codex_write_prompt(world_id, &codex, &transcript);

        let model = model.or(self.model.as_deref());
        let updated = self.generator.generate(&prompt, model).await?;
        let updated = updated.trim();

        match validate_codex(updated, world_id, &REQUIRED_HEADINGS) {
            Verdict::Accepted => {
                self.archive
                    .write_codex(world_id, &format!("{}\n", updated))?;
                info!("codex for '{}' rewritten from {}", world_id, session_path.display());
                Ok(FinalizeOutcome::Accepted(paths.codex_path))
            }
            Verdict::Rejected { reason } => {
                let path = quarantine_path(session_path);
                atomic_write_text(&path, updated)?;
                warn!(
                    "codex rewrite for '{}' rejected ({}); saved to {}",
                    world_id,
                    reason,
                    path.display()
                );
                Ok(FinalizeOutcome::Quarantined { path, reason })
            }
        }
    }
}
