//! Sorting, pagination and grouping vocabulary for project listings.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Maximum page size a caller may request.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Page size used when streaming a listing.
pub const STREAM_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`, falling back to `max`.
pub fn clamp_limit(limit: Option<i64>, max: i64) -> i64 {
    limit.unwrap_or(max).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Columns a project listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Key,
    Status,
    Priority,
    StartDate,
    DueDate,
}

impl SortColumn {
    /// Column name as it appears in SQL. Only ever a fixed identifier.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Key => "key",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::StartDate => "start_date",
            Self::DueDate => "due_date",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Comparison that selects rows ordered after a given one.
    fn after_op(&self) -> &'static str {
        match self {
            Self::Asc => ">",
            Self::Desc => "<",
        }
    }
}

/// Ordering for a listing. Defaults to newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default)]
    pub column: SortColumn,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// `ORDER BY` clause body. Rows with a NULL sort value go last and `id`
    /// breaks ties so paging is stable.
    pub fn order_by_sql(&self) -> String {
        let dir = self.direction.as_sql();
        format!("{} {dir} NULLS LAST, id {dir}", self.column.as_sql())
    }

    /// Keyset predicate matching rows that come after a cursor row in
    /// [`Sort::order_by_sql`] order. `$value_param` holds the cursor's sort
    /// value (possibly NULL) and `$id_param` its id.
    pub fn after_sql(&self, value_param: usize, id_param: usize) -> String {
        let col = self.column.as_sql();
        let op = self.direction.after_op();
        let v = format!("${value_param}");
        let id = format!("${id_param}");
        format!(
            "(({v} IS NULL AND {col} IS NULL AND id {op} {id}) \
             OR ({v} IS NOT NULL AND ({col} {op} {v} OR ({col} = {v} AND id {op} {id}) \
             OR {col} IS NULL)))"
        )
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Presentation-level grouping of an already ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Status,
    Priority,
    Owner,
    DueDate,
}
