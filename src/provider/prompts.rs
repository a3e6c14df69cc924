use super::protocol::EXTRACTION_SCHEMA;
use crate::conversation::Message;
use crate::prd::PrdDocument;

/// System prompt that tells the provider how to shape every reply
pub const SYSTEM_PROMPT: &str = r#"You are a PRD assistant that turns a product conversation into a structured product requirements document.

## Your Response Format

Return ONLY one JSON object and nothing else. No markdown, no code fences, no extra text.

{
  "assistant_text": string,
  "questions": string[],
  "prd": {
    "problem": string,
    "users": string[],
    "goals": string[],
    "metrics": string[],
    "requirements": string[],
    "open_questions": string[]
  }
}

## Field Definitions

- prd.problem: a short user pain statement (6-12 words), not a product description like "an app for ...".
- prd.users/goals/metrics/requirements/open_questions: arrays of short strings.

## Conversation Policy

1. Ask at most ONE question per turn.
2. assistant_text contains exactly that question, with no filler.
3. questions[] contains the same single question, or is empty if you ask none.
4. prd.open_questions[] lists the question you are asking this turn, identical to questions[].
5. Do not ask definition questions like "What do you mean by X?".

## Question Priority

Ask about the next missing piece, in this order:
1. goals (primary goal or outcome)
2. metrics (1-3 ways to measure success)
3. requirements (must-have features or constraints)

Only ask about pain points or workflows once those are filled.

## Extraction Rules

- Always include every prd key, even when empty.
- If the user's statement clearly implies a user group, fill prd.users right away.
- Extract any goals, metrics, requirements or users the user provides.
- Never drop existing prd items unless the user explicitly changes them.
- Always set prd.problem; if the user only names a product, infer a plausible pain statement.

## Style

- Keep strings short. No paragraphs.
- The question must be direct (max 12 words), e.g. "What is the primary goal you want?",
  "How will you measure success (1-3 metrics)?", "What are the must-have features?"
"#;

/// System prompt for the single reformatting pass
pub const REPAIR_SYSTEM_PROMPT: &str =
    "You convert text into valid JSON. Return ONLY the JSON object, no markdown or explanation.";

/// Cumulative context for one extraction: the current document plus the
/// whole conversation so far
pub fn build_user_context(history: &[Message], document: &PrdDocument) -> String {
    let prd_json = serde_json::to_string(document).unwrap_or_else(|_| "{}".to_string());

    let conversation = history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Current PRD (may be empty):\n{prd_json}\n\nConversation so far:\n{conversation}\n")
}

/// Ask the provider to reformat its own unparseable reply
pub fn build_repair_prompt(raw_output: &str) -> String {
    format!(
        r#"Given this raw output from a PRD assistant:
---
{raw_output}
---

Extract the structured data and return it as valid JSON matching this schema:
{EXTRACTION_SCHEMA}

Rules:
1. Return ONLY valid JSON, no markdown or explanation
2. If fields are missing, use sensible defaults (empty string, empty array)
3. Preserve the question and every PRD item as accurately as possible"#
    )
}
