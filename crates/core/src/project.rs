//! Project identity and lifecycle rules.
//!
//! Slug derivation, `TF-<n>` key handling, the status / priority vocabularies
//! and the overdue predicate. The repository layer persists what these
//! functions produce; it never re-derives any of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Date;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Prefix shared by every project key.
pub const KEY_PREFIX: &str = "TF-";

/// Maximum length of a project name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a project key, prefix included.
pub const MAX_KEY_LEN: usize = 32;

/// How many generated keys `create` tries before giving up on a collision.
pub const MAX_KEY_ATTEMPTS: u32 = 10;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PAUSED: &str = "paused";
pub const STATUS_COMPLETED: &str = "completed";

/// All valid project statuses.
pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_PAUSED, STATUS_COMPLETED];

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";

/// All valid project priorities.
pub const VALID_PRIORITIES: &[&str] = &[PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_HIGH];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Project status, stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => STATUS_ACTIVE,
            Self::Paused => STATUS_PAUSED,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    /// Human-readable label used for grouping headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_ACTIVE => Ok(Self::Active),
            STATUS_PAUSED => Ok(Self::Paused),
            STATUS_COMPLETED => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project priority, stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl ProjectPriority {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => PRIORITY_LOW,
            Self::Medium => PRIORITY_MEDIUM,
            Self::High => PRIORITY_HIGH,
        }
    }

    /// Human-readable label used for grouping headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for ProjectPriority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PRIORITY_LOW => Ok(Self::Low),
            PRIORITY_MEDIUM => Ok(Self::Medium),
            PRIORITY_HIGH => Ok(Self::High),
            other => Err(CoreError::Validation(format!(
                "Invalid priority '{other}'. Valid priorities: {}",
                VALID_PRIORITIES.join(", ")
            ))),
        }
    }
}

impl TryFrom<String> for ProjectPriority {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ProjectPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Creation defaults
// ---------------------------------------------------------------------------

/// Status every new project starts with.
///
/// Whatever the caller supplied is discarded at creation time; edits after
/// creation may set any status.
pub const fn initial_status() -> ProjectStatus {
    ProjectStatus::Active
}

/// Priority every new project starts with. Same overwrite rule as
/// [`initial_status`].
pub const fn initial_priority() -> ProjectPriority {
    ProjectPriority::Medium
}

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Derive a URL-safe slug from a project name.
///
/// Transliterates to ASCII (`"Café"` becomes `"cafe"`), lowercases, turns
/// every run of non-alphanumeric characters into a single hyphen and trims
/// hyphens from both ends. Idempotent.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode::deunicode(name);
    let mut result = String::with_capacity(ascii.len());
    let mut prev_hyphen = false;
    for c in ascii.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a project name (non-blank, <= 255 chars, yields a usable slug).
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if slugify(name).is_empty() {
        return Err(CoreError::Validation(
            "Name must contain at least one letter or digit".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Normalize a caller-supplied key to the `TF-` form.
///
/// `"7"`, `"tf-7"` and `" TF-7 "` all become `"TF-7"`. The part after the
/// prefix must be non-empty ASCII alphanumerics and inner hyphens.
pub fn normalize_key(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let body = match trimmed.get(..KEY_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(KEY_PREFIX) => &trimmed[KEY_PREFIX.len()..],
        _ => trimmed,
    };

    if body.is_empty() {
        return Err(CoreError::Validation("Key must not be empty".into()));
    }
    if body.starts_with('-')
        || body.ends_with('-')
        || !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(CoreError::Validation(format!(
            "Invalid key '{raw}': only letters, digits and inner hyphens are allowed"
        )));
    }

    let key = format!("{KEY_PREFIX}{}", body.to_ascii_uppercase());
    if key.len() > MAX_KEY_LEN {
        return Err(CoreError::Validation(format!(
            "Key must be at most {MAX_KEY_LEN} characters"
        )));
    }
    Ok(key)
}

/// Format the generated key for sequence number `n`.
pub fn format_key(n: i64) -> String {
    format!("{KEY_PREFIX}{n}")
}

/// Extract `n` from a generated `TF-<n>` key.
pub fn parse_key_number(key: &str) -> Option<i64> {
    key.strip_prefix(KEY_PREFIX)?.parse().ok()
}

/// Next sequence number to try for a generated key.
///
/// Starts from `record_count + 1`; after a collision it never goes back to a
/// number already tried, even if the count has not moved.
pub fn next_key_number(record_count: i64, previous: Option<i64>) -> i64 {
    let from_count = record_count.saturating_add(1);
    match previous {
        Some(prev) => from_count.max(prev.saturating_add(1)),
        None => from_count,
    }
}

// ---------------------------------------------------------------------------
// Derived facts
// ---------------------------------------------------------------------------

/// A project is overdue when its due date is before `today` and it is not
/// completed. Projects without a due date are never overdue.
pub fn is_overdue(due_date: Option<Date>, status: ProjectStatus, today: Date) -> bool {
    match due_date {
        Some(due) => due < today && status != ProjectStatus::Completed,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
