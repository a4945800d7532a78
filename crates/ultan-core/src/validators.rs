//! Structural checks applied to generated text before it is accepted.
//!
//! Both validators are pure: they look at the text and nothing else.

use crate::slug::WorldId;
use crate::state::codex_title;

/// Words that give away the machinery behind the in-world questioner.
pub const META_BANNED: [&str; 7] = [
    "worldbuilding",
    "codex",
    "prompt",
    "model",
    "token",
    "api",
    "openai",
];

/// Markers that show up when the generator parrots its instructions.
const ECHO_MARKERS: [&str; 2] = ["STRICT FORMAT REQUIREMENTS", "You are a meticulous archivist"];

/// Outcome of a validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
}

impl Verdict {
    fn reject(reason: impl Into<String>) -> Self {
        Verdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// `"ok"` for accepted text, otherwise why it was rejected.
    pub fn reason(&self) -> &str {
        match self {
            Verdict::Accepted => "ok",
            Verdict::Rejected { reason } => reason,
        }
    }
}

/// Check that `text` is a single, plain, in-world question.
///
/// Checks run in order and the first failure wins: blank text, list
/// formatting, meta vocabulary, question-mark count, trailing `?`.
pub fn validate_question(text: &str) -> Verdict {
    let t = text.trim();

    if t.is_empty() {
        return Verdict::reject("empty");
    }

    if t.lines()
        .any(|line| line.trim_start().starts_with(['-', '*']))
    {
        return Verdict::reject("list formatting");
    }

    let lower = t.to_lowercase();
    if let Some(word) = META_BANNED.iter().find(|w| lower.contains(*w)) {
        return Verdict::reject(format!("meta word: {}", word));
    }

    if t.matches('?').count() != 1 {
        return Verdict::reject("must contain exactly one '?'");
    }
    if !t.ends_with('?') {
        return Verdict::reject("must end with '?'");
    }

    Verdict::Accepted
}

/// Check that `text` is a complete codex for `world_id`.
///
/// The trimmed text must open with the codex title, contain every heading of
/// `required_headings` exactly once, and must not contain echoed instruction
/// markers. Occurrences are counted anywhere in the text, so a `### Places of
/// worship` subsection also counts as `## Places`.
pub fn validate_codex(text: &str, world_id: &WorldId, required_headings: &[&str]) -> Verdict {
    let t = text.trim();

    if !t.starts_with(&codex_title(world_id)) {
        return Verdict::reject("missing title");
    }

    for heading in required_headings {
        let count = t.matches(heading).count();
        if count != 1 {
            let problem = if count == 0 { "missing" } else { "duplicated" };
            return Verdict::reject(format!("heading {}: {}", problem, heading));
        }
    }

    if ECHO_MARKERS.iter().any(|marker| t.contains(marker)) {
        return Verdict::reject("looks like echoed instructions");
    }

    Verdict::Accepted
}
