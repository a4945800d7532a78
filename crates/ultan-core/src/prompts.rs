//! Prompt text sent to the generator.
//!
//! Two prompts exist: one asks an in-world visitor for a single follow-up
//! question, the other asks an archivist to rewrite the codex from a session
//! transcript.

use crate::slug::WorldId;
use crate::state::{REQUIRED_HEADINGS, codex_title};

/// Appended to the question prompt when a candidate fails validation.
pub const QUESTION_RETRY_REMINDER: &str =
    "STRICT REMINDER: Output only one single question ending with '?'. No other text.";

/// Prompt asking for exactly one diegetic question.
pub fn question_prompt(world_id: &WorldId, codex_excerpt: &str, recent_transcript: &str) -> String {
    format!(
        r#"You are an in-world visitor trying to understand the world "{world_id}" by speaking to a sage.
You are curious, observant, and respectful. You ask natural questions prompted by what the sage just said.

RULES (must follow)
- Ask EXACTLY ONE question.
- Do NOT use lists or multiple questions.
- Do NOT mention "worldbuilding", "lore", "codex", "prompt", "system", "model", "token", "api", or anything meta.
- Ask as if you were an in-world character.
- Ground your question in a specific detail from the most recent Sage message.
- Keep it under 40 words unless absolutely necessary.

CONTEXT (for you only)
[CODEX_EXCERPT]
{codex_excerpt}

[RECENT_TRANSCRIPT]
{recent_transcript}

Now ask one single, diegetic question only.
"#
    )
}

/// The question prompt with the strict reminder appended.
pub fn question_retry_prompt(base_prompt: &str) -> String {
    format!("{}\n\n{}", base_prompt, QUESTION_RETRY_REMINDER)
}

/// Prompt asking for the full rewritten codex.
pub fn codex_write_prompt(world_id: &WorldId, codex_md: &str, session_transcript: &str) -> String {
    let title = codex_title(world_id);
    let headings = REQUIRED_HEADINGS.join("\n");
    format!(
        r#"You are a meticulous archivist. You are NOT a storyteller. Your job is to update a world codex.

TASK
- Update and return the FULL codex Markdown for world_id="{world_id}".
- Integrate information from the session transcript below.
- Preserve existing codex entries; merge when the same entity is clearly referenced.
- Do not invent facts not supported by the transcript.
- If uncertain, mark "(uncertain)".
- If the session contradicts the existing codex, do not resolve it; keep both and mark "(conflict)" near the relevant bullets.

STRICT FORMAT REQUIREMENTS (must follow)
- Output ONLY Markdown for the codex. No preamble.
- The codex MUST start with: "{title}"
- It MUST include these headings exactly once each, in this order:
{headings}

STYLE
- Use atomic bullets.
- Use bold for entity names: **Name** — description
- Keep bullets concise (1–2 sentences).

[CURRENT_CODEX]
{codex_md}

[SESSION_TRANSCRIPT]
{session_transcript}

Now output the updated FULL codex Markdown only.
"#
    )
}
