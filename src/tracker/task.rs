use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Bytes reserved for a description in a persisted record, terminator included.
pub const DESCRIPTION_SLOT: usize = 100;

/// Longest description that fits its slot with room for the zero terminator.
pub const MAX_DESCRIPTION_LEN: usize = DESCRIPTION_SLOT - 1;

/// Declared urgency of a task. Decides which dispatch structure receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Served first, in arrival order.
    High,
    /// Served only when no high-priority work is waiting, newest first.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "low" | "l" => Ok(Priority::Low),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown priority '{other}' (expected high or low)"
            ))),
        }
    }
}

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => write!(f, "pending"),
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// What to do with a description longer than [`MAX_DESCRIPTION_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionPolicy {
    #[default]
    Reject,
    Truncate,
}

/// Task description that always fits the persisted slot.
///
/// Holds at most [`MAX_DESCRIPTION_LEN`] bytes of UTF-8 with no interior NUL,
/// so it can be zero-padded on disk and read back unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    /// Validates `text`, rejecting anything that would not fit its slot.
    pub fn new(text: &str) -> Result<Self> {
        let text = Self::validate(text)?;
        if text.len() > MAX_DESCRIPTION_LEN {
            return Err(TrackerError::InvalidInput(format!(
                "description is {} bytes, limit is {MAX_DESCRIPTION_LEN}",
                text.len()
            )));
        }
        Ok(Self(text.to_string()))
    }

    /// Like [`Description::new`] but cuts over-long text at the last char
    /// boundary that fits instead of rejecting it.
    pub fn truncated(text: &str) -> Result<Self> {
        let text = Self::validate(text)?;
        if text.len() <= MAX_DESCRIPTION_LEN {
            return Ok(Self(text.to_string()));
        }
        let mut end = MAX_DESCRIPTION_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        tracing::warn!(
            original_len = text.len(),
            kept = end,
            "description truncated to fit storage"
        );
        Ok(Self(text[..end].to_string()))
    }

    /// Applies the given policy.
    pub fn with_policy(text: &str, policy: DescriptionPolicy) -> Result<Self> {
        match policy {
            DescriptionPolicy::Reject => Self::new(text),
            DescriptionPolicy::Truncate => Self::truncated(text),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text is kept exactly as given; only blank input is refused.
    fn validate(text: &str) -> Result<&str> {
        if text.trim().is_empty() {
            return Err(TrackerError::InvalidInput(
                "description must not be empty".into(),
            ));
        }
        if text.contains('\0') {
            return Err(TrackerError::InvalidInput(
                "description must not contain NUL bytes".into(),
            ));
        }
        Ok(text)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Description {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

/// A single unit of tracked work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub description: Description,
    pub priority: Priority,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Outcome,
}

impl Task {
    /// Creates a pending task registered now.
    pub fn new(id: u32, description: Description, priority: Priority) -> Self {
        Self {
            id,
            description,
            priority,
            registered_at: Utc::now(),
            completed_at: None,
            outcome: Outcome::Pending,
        }
    }

    /// Records a terminal outcome. Only the execution engine calls this.
    pub(crate) fn complete(&mut self, outcome: Outcome, at: DateTime<Utc>) {
        self.outcome = outcome;
        self.completed_at = Some(at);
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Pending
    }

    /// True when both values come from the same intake, whatever their outcome.
    pub fn same_intake(&self, other: &Task) -> bool {
        self.id == other.id
            && self.priority == other.priority
            && self.registered_at == other.registered_at
            && self.description == other.description
    }
}

/// Validates the description under `policy` and builds a pending task.
pub fn create_task(
    id: u32,
    description: &str,
    priority: Priority,
    policy: DescriptionPolicy,
) -> Result<Task> {
    let description = Description::with_policy(description, policy)?;
    Ok(Task::new(id, description, priority))
}
