use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::merge::merge;

/// The ordered-set fields of a PRD, in serialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Users,
    Goals,
    Metrics,
    Requirements,
    OpenQuestions,
}

impl ListField {
    pub const ALL: [ListField; 5] = [
        ListField::Users,
        ListField::Goals,
        ListField::Metrics,
        ListField::Requirements,
        ListField::OpenQuestions,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ListField::Users => "users",
            ListField::Goals => "goals",
            ListField::Metrics => "metrics",
            ListField::Requirements => "requirements",
            ListField::OpenQuestions => "open_questions",
        }
    }
}

pub const PROBLEM_KEY: &str = "problem";

/// True for any key the document models explicitly
pub fn is_known_key(key: &str) -> bool {
    key == PROBLEM_KEY || ListField::ALL.iter().any(|f| f.key() == key)
}

/// Comparison form for list entries: trimmed and case-folded
pub fn normalize_entry(entry: &str) -> String {
    entry.trim().to_lowercase()
}

/// The product-requirements document built up over a conversation.
///
/// Known fields are always serialized; anything else the provider returned
/// lives in `extra` and is flattened back alongside them. Deserialization goes
/// through [`PrdDocument::from`] so mistyped fields are dropped instead of
/// failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PrdDocument {
    pub problem: String,
    pub users: Vec<String>,
    pub goals: Vec<String>,
    pub metrics: Vec<String>,
    pub requirements: Vec<String>,
    pub open_questions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PrdDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Users => &self.users,
            ListField::Goals => &self.goals,
            ListField::Metrics => &self.metrics,
            ListField::Requirements => &self.requirements,
            ListField::OpenQuestions => &self.open_questions,
        }
    }

    pub fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::Users => &mut self.users,
            ListField::Goals => &mut self.goals,
            ListField::Metrics => &mut self.metrics,
            ListField::Requirements => &mut self.requirements,
            ListField::OpenQuestions => &mut self.open_questions,
        }
    }

    /// Goals, metrics and requirements each hold at least one non-blank entry
    pub fn is_complete(&self) -> bool {
        [ListField::Goals, ListField::Metrics, ListField::Requirements]
            .into_iter()
            .all(|field| self.list(field).iter().any(|e| !e.trim().is_empty()))
    }
}

impl From<Value> for PrdDocument {
    fn from(value: Value) -> Self {
        merge(&PrdFragment::from_value(&value), &PrdDocument::default())
    }
}

/// A partial document as extracted for a single turn.
///
/// `None` means the provider did not supply the field (or supplied it with the
/// wrong JSON type); the merger leaves the current value alone in that case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrdFragment {
    pub problem: Option<String>,
    pub users: Option<Vec<String>>,
    pub goals: Option<Vec<String>>,
    pub metrics: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub open_questions: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

impl PrdFragment {
    /// Read a fragment out of arbitrary provider JSON. Never fails: a non-object
    /// yields an empty fragment, list items that are not strings are skipped.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let mut fragment = Self {
            problem: object
                .get(PROBLEM_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        };

        for field in ListField::ALL {
            *fragment.list_slot(field) = object.get(field.key()).and_then(string_list);
        }

        fragment.extra = object
            .iter()
            .filter(|(key, _)| !is_known_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        fragment
    }

    pub fn list(&self, field: ListField) -> Option<&[String]> {
        match field {
            ListField::Users => self.users.as_deref(),
            ListField::Goals => self.goals.as_deref(),
            ListField::Metrics => self.metrics.as_deref(),
            ListField::Requirements => self.requirements.as_deref(),
            ListField::OpenQuestions => self.open_questions.as_deref(),
        }
    }

    pub fn list_slot(&mut self, field: ListField) -> &mut Option<Vec<String>> {
        match field {
            ListField::Users => &mut self.users,
            ListField::Goals => &mut self.goals,
            ListField::Metrics => &mut self.metrics,
            ListField::Requirements => &mut self.requirements,
            ListField::OpenQuestions => &mut self.open_questions,
        }
    }

    /// Builder-style setter used by adapters and tests
    pub fn with_list(mut self, field: ListField, entries: &[&str]) -> Self {
        *self.list_slot(field) = Some(entries.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn with_problem(mut self, problem: &str) -> Self {
        self.problem = Some(problem.to_string());
        self
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}
