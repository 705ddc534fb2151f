//! Remark domain model.
//!
//! # Responsibility
//! - Define the single annotation record attached to a commit.
//! - Validate kind and body at construction time.
//!
//! # Invariants
//! - `id` is unique within one collection at creation time.
//! - `created_at` is UTC, whole seconds, and never mutated after creation.
//! - A persisted remark always has a non-blank `body`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Number of hex characters kept from the random UUID.
pub const REMARK_ID_LEN: usize = 8;

/// Short opaque remark identifier.
pub type RemarkId = String;

/// Closed set of remark categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkKind {
    /// Loose observation, the default.
    Thought,
    /// Something that looks wrong or needs a second look.
    Doubt,
    /// Follow-up work.
    Todo,
    /// Record of a choice that was made.
    Decision,
}

impl RemarkKind {
    pub const ALL: [RemarkKind; 4] = [
        RemarkKind::Thought,
        RemarkKind::Doubt,
        RemarkKind::Todo,
        RemarkKind::Decision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thought => "thought",
            Self::Doubt => "doubt",
            Self::Todo => "todo",
            Self::Decision => "decision",
        }
    }
}

impl Display for RemarkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemarkKind {
    type Err = RemarkValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "thought" => Ok(Self::Thought),
            "doubt" => Ok(Self::Doubt),
            "todo" => Ok(Self::Todo),
            "decision" => Ok(Self::Decision),
            other => Err(RemarkValidationError::InvalidKind(other.to_string())),
        }
    }
}

/// Returns whether `value` names a known remark kind. Never fails.
pub fn validate_kind(value: &str) -> bool {
    value.parse::<RemarkKind>().is_ok()
}

/// Remark lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkState {
    Active,
    /// Retained for audit, hidden from active views.
    Resolved,
}

impl RemarkState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

impl Display for RemarkState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for remark construction and write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemarkValidationError {
    /// Kind is not one of thought, doubt, todo, decision.
    InvalidKind(String),
    /// Body is empty after trimming whitespace.
    EmptyBody,
}

impl Display for RemarkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKind(value) => write!(
                f,
                "invalid type: {value} (must be thought, doubt, todo, or decision)"
            ),
            Self::EmptyBody => write!(f, "remark body cannot be empty"),
        }
    }
}

impl Error for RemarkValidationError {}

/// One annotation attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub id: RemarkId,
    /// Serialized as `type` to match the notes document schema.
    #[serde(rename = "type")]
    pub kind: RemarkKind,
    /// Branch scope label.
    pub branch: String,
    pub state: RemarkState,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

impl Remark {
    /// Creates an active remark with a fresh id and the current UTC time.
    ///
    /// # Errors
    /// - `EmptyBody` when `body` is blank.
    pub fn new(
        kind: RemarkKind,
        branch: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, RemarkValidationError> {
        Self::with_id(
            generate_remark_id(),
            kind,
            branch,
            body,
            Utc::now().trunc_subsecs(0),
        )
    }

    /// Creates a remark with caller-provided identity and timestamp.
    ///
    /// Used by fixtures and by import paths where the record already exists.
    pub fn with_id(
        id: impl Into<RemarkId>,
        kind: RemarkKind,
        branch: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RemarkValidationError> {
        let remark = Self {
            id: id.into(),
            kind,
            branch: branch.into(),
            state: RemarkState::Active,
            created_at,
            body: body.into(),
        };
        remark.validate()?;
        Ok(remark)
    }

    /// Re-checks write-path invariants.
    pub fn validate(&self) -> Result<(), RemarkValidationError> {
        if self.body.trim().is_empty() {
            return Err(RemarkValidationError::EmptyBody);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state == RemarkState::Active
    }

    pub fn resolve(&mut self) {
        self.state = RemarkState::Resolved;
    }

    /// Replaces the id with a freshly generated one.
    pub fn regenerate_id(&mut self) {
        self.id = generate_remark_id();
    }
}

/// Generates a short id from a random 128-bit value.
pub fn generate_remark_id() -> RemarkId {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(REMARK_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::{generate_remark_id, validate_kind, Remark, RemarkKind, REMARK_ID_LEN};
    use chrono::Timelike;

    #[test]
    fn generated_ids_are_short_hex() {
        let id = generate_remark_id();
        assert_eq!(id.len(), REMARK_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn validate_kind_predicates_without_failing() {
        for kind in RemarkKind::ALL {
            assert!(validate_kind(kind.as_str()));
        }
        assert!(!validate_kind("Todo"));
        assert!(!validate_kind(""));
    }

    #[test]
    fn new_truncates_timestamp_to_seconds() {
        let remark = Remark::new(RemarkKind::Thought, "main", "body").unwrap();
        assert_eq!(remark.created_at.nanosecond(), 0);
    }
}
