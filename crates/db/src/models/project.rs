//! Project entity model and DTOs.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use taskforge_core::listing::{GroupBy, Sort};
use taskforge_core::project::{self, ProjectPriority, ProjectStatus};
use taskforge_core::types::{Date, DbId, Timestamp};
use validator::Validate;

/// A project row from the `projects` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub key: String,
    pub slug: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    #[sqlx(try_from = "String")]
    pub priority: ProjectPriority,
    pub start_date: Option<Date>,
    pub due_date: Option<Date>,
    pub owner_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Project {
    /// Due date in the past and not completed. Computed, never stored.
    pub fn is_overdue(&self, today: Date) -> bool {
        project::is_overdue(self.due_date, self.status, today)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Grouping key for presentation. `"none"` stands in for a missing
    /// owner or due date.
    pub fn group_key(&self, by: GroupBy) -> String {
        match by {
            GroupBy::Status => self.status.as_str().to_string(),
            GroupBy::Priority => self.priority.as_str().to_string(),
            GroupBy::Owner => self
                .owner_id
                .map_or_else(|| "none".to_string(), |id| id.to_string()),
            GroupBy::DueDate => self
                .due_date
                .map_or_else(|| "none".to_string(), |d| d.to_string()),
        }
    }

    /// Header text for the group this project falls in.
    pub fn group_label(&self, by: GroupBy) -> String {
        match by {
            GroupBy::Status => self.status.label().to_string(),
            GroupBy::Priority => self.priority.label().to_string(),
            GroupBy::Owner => self
                .owner_id
                .map_or_else(|| "Unassigned".to_string(), |id| format!("User {id}")),
            GroupBy::DueDate => self
                .due_date
                .map_or_else(|| "No due date".to_string(), |d| d.to_string()),
        }
    }
}

/// DTO for creating a new project.
///
/// `status` and `priority` are accepted so form payloads deserialize, but
/// creation always overwrites them with `active` / `medium`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Optional explicit key; `"7"` is stored as `"TF-7"`. Generated when omitted.
    #[validate(length(min = 1, max = 32))]
    pub key: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub start_date: Option<Date>,
    pub due_date: Option<Date>,
    pub owner_id: Option<DbId>,
    pub lead_id: Option<DbId>,
}

/// DTO for updating an existing project. All fields are optional.
///
/// There is no `key` or `slug` field: both are fixed at creation, and a
/// payload carrying them deserializes with those entries dropped.
///
/// Nullable columns use a double `Option`: `None` leaves the column alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub start_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub owner_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub lead_id: Option<Option<DbId>>,
}

/// Distinguish an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Predicates, ordering and paging for project listings.
///
/// Every predicate that is set must hold. Soft-deleted rows are left out
/// unless `include_deleted` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    /// Any of these statuses. Empty means no restriction.
    #[serde(default)]
    pub statuses: Vec<ProjectStatus>,
    /// Any of these priorities. Empty means no restriction.
    #[serde(default)]
    pub priorities: Vec<ProjectPriority>,
    /// Only projects due before today that are not completed.
    #[serde(default)]
    pub overdue: bool,
    /// Case-insensitive substring match on name or key.
    pub search: Option<String>,
    pub owner_id: Option<DbId>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub sort: Sort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Headline numbers for dashboards and operator tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub active: i64,
    pub overdue: i64,
    pub trashed: i64,
}

/// One bucket of a grouped listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectGroup {
    pub key: String,
    pub label: String,
    pub projects: Vec<Project>,
}

/// Group an ordered listing, keeping both the group order (first
/// appearance) and the order within each group.
pub fn group_projects(projects: Vec<Project>, by: GroupBy) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for project in projects {
        let key = project.group_key(by);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.projects.push(project),
            None => groups.push(ProjectGroup {
                key,
                label: project.group_label(by),
                projects: vec![project],
            }),
        }
    }
    groups
}
