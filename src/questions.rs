use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

/// Most follow-up questions surfaced to the user in a single turn
pub const MAX_QUESTIONS_PER_TURN: usize = 3;

/// Lowercased, trimmed, internal whitespace collapsed to single spaces
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized forms of every question already put in front of the user.
/// Only grows until the conversation is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AskedQuestions {
    normalized: BTreeSet<String>,
}

impl AskedQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the set from assistant turns when only the message log was
    /// persisted. Each assistant message counts whole and line by line, with
    /// list bullets stripped.
    pub fn seed_from_history(history: &[Message]) -> Self {
        let mut asked = Self::new();
        for message in history.iter().filter(|m| m.role == Role::Assistant) {
            asked.insert(&message.content);
            for line in message.content.lines() {
                let line = line
                    .trim_start()
                    .trim_start_matches(['-', '*', '•'])
                    .trim();
                asked.insert(line);
            }
        }
        asked
    }

    pub fn contains(&self, question: &str) -> bool {
        self.normalized.contains(&normalize_question(question))
    }

    /// Returns false for blank questions and ones already recorded
    pub fn insert(&mut self, question: &str) -> bool {
        let normalized = normalize_question(question);
        if normalized.is_empty() {
            return false;
        }
        self.normalized.insert(normalized)
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn clear(&mut self) {
        self.normalized.clear();
    }
}

/// Keep only questions the user has not seen, capped at
/// [`MAX_QUESTIONS_PER_TURN`]. Returns the survivors and the asked set with
/// them recorded.
pub fn filter(candidates: &[String], asked: &AskedQuestions) -> (Vec<String>, AskedQuestions) {
    filter_with_cap(candidates, asked, MAX_QUESTIONS_PER_TURN)
}

pub fn filter_with_cap(
    candidates: &[String],
    asked: &AskedQuestions,
    cap: usize,
) -> (Vec<String>, AskedQuestions) {
    let mut updated = asked.clone();
    let mut fresh = Vec::new();

    for candidate in candidates {
        if fresh.len() >= cap {
            break;
        }
        let candidate = candidate.trim();
        // insert() rejects blanks and anything already asked, including
        // earlier candidates from this same list
        if updated.insert(candidate) {
            fresh.push(candidate.to_string());
        }
    }

    (fresh, updated)
}
