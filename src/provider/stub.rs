use async_trait::async_trait;

use super::{AdapterError, CompletionAdapter, ExtractionResult};
use crate::conversation::{Message, Role};
use crate::merge::merge;
use crate::prd::{ListField, PrdDocument, PrdFragment};
use crate::questions::AskedQuestions;

pub const USERS_QUESTION: &str = "Who is the target user for this product?";
pub const GOALS_QUESTION: &str = "What is the primary goal or outcome you want?";
pub const METRICS_QUESTION: &str = "How will you measure success (1–3 metrics)?";

const QUESTIONS_PREFACE: &str =
    "Got it. I can start drafting a PRD. Answer these questions so I can refine it:";
const UPDATED_TEXT: &str = "Thanks. I updated the PRD based on your latest input.";

/// Labels the stub recognizes in the user's message, e.g. "goal: faster review"
const LABELS: [&str; 4] = ["goal:", "success metrics:", "metrics:", "target users:"];

/// Offline adapter: derives an extraction from the last user message with a
/// few fixed rules. Same input, same output; no network.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubAdapter;

impl StubAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_now(&self, history: &[Message], current: &PrdDocument) -> ExtractionResult {
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .unwrap_or("");

        let mut fragment = PrdFragment::default();

        if current.problem.trim().is_empty() && !last_user.is_empty() {
            fragment.problem = Some(last_user.to_string());
        }

        let users = grab(last_user, "target users:");
        if !users.is_empty() {
            fragment.users = Some(vec![users]);
        }

        let goal = grab(last_user, "goal:");
        if !goal.is_empty() {
            fragment.goals = Some(vec![goal]);
        }

        let mut metrics = grab(last_user, "success metrics:");
        if metrics.is_empty() {
            metrics = grab(last_user, "metrics:");
        }
        if !metrics.is_empty() {
            let parts: Vec<String> = metrics
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            fragment.metrics = Some(if parts.is_empty() { vec![metrics] } else { parts });
        }

        // Ask about whatever is still missing once this turn's fragment lands
        let projected = merge(&fragment, current);
        let missing: Vec<(&str, &str)> = [
            (ListField::Users, USERS_QUESTION, "target users"),
            (ListField::Goals, GOALS_QUESTION, "goals"),
            (ListField::Metrics, METRICS_QUESTION, "success metrics"),
        ]
        .into_iter()
        .filter(|(field, _, _)| projected.list(*field).is_empty())
        .map(|(_, question, topic)| (question, topic))
        .collect();

        let questions: Vec<String> = missing.iter().map(|(q, _)| q.to_string()).collect();
        if !questions.is_empty() {
            fragment.open_questions = Some(questions.clone());
        }

        // Questions already in the history are summarised, not bulleted again
        let asked = AskedQuestions::seed_from_history(history);
        let (repeated, fresh): (Vec<_>, Vec<_>) =
            missing.iter().partition(|(q, _)| asked.contains(q));

        let mut assistant_text = if fresh.is_empty() {
            UPDATED_TEXT.to_string()
        } else {
            let bullets: Vec<String> = fresh.iter().map(|(q, _)| format!("- {}", q)).collect();
            format!("{}\n{}", QUESTIONS_PREFACE, bullets.join("\n"))
        };
        if !repeated.is_empty() {
            let topics: Vec<&str> = repeated.iter().map(|(_, topic)| *topic).collect();
            assistant_text.push_str(&format!("\nStill open: {}.", topics.join(", ")));
        }

        ExtractionResult {
            assistant_text,
            questions,
            prd_fragment: fragment,
        }
    }
}

#[async_trait]
impl CompletionAdapter for StubAdapter {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn extract(
        &self,
        history: &[Message],
        current: &PrdDocument,
    ) -> Result<ExtractionResult, AdapterError> {
        Ok(self.extract_now(history, current))
    }
}

/// Text following `label` (case-insensitive) up to the next known label
fn grab(text: &str, label: &str) -> String {
    // ASCII folding keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let Some(idx) = lower.find(label) else {
        return String::new();
    };
    let start = idx + label.len();

    let end = LABELS
        .iter()
        .filter_map(|l| lower[start..].find(l).map(|j| start + j))
        .min()
        .unwrap_or(text.len());

    text[start..end]
        .trim_matches(|c: char| matches!(c, ' ' | '.' | ';' | '\n' | '\t'))
        .to_string()
}
