//! Project identity and lifecycle policy on top of [`ProjectRepo`].
//!
//! Everything that must hold no matter which UI or API drives it lives here:
//! the slug is derived once from the name, new projects always start
//! `active` / `medium`, keys are `TF-<n>`, owner and lead must exist, and
//! uniqueness is enforced by the database constraints rather than by locks.

use chrono::Utc;
use futures::Stream;
use taskforge_core::error::CoreError;
use taskforge_core::project::{self, MAX_KEY_ATTEMPTS};
use taskforge_core::types::{Date, DbId};
use validator::Validate;

use crate::error::{classify, is_unique_violation, Attempted, StoreError, StoreResult};
use crate::models::project::{
    CreateProject, Project, ProjectFilter, ProjectSummary, UpdateProject,
};
use crate::repositories::project_repo::KEY_CONSTRAINT;
use crate::repositories::{ProjectRepo, UserRepo};
use crate::DbPool;

const ENTITY: &str = "project";

/// Entry point for creating, editing, deleting and listing projects.
///
/// Cheap to clone; it only holds the pool.
#[derive(Clone)]
pub struct ProjectStore {
    pool: DbPool,
}

impl ProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // ── Create ────────────────────────────────────────────────────────

    /// Create a project.
    ///
    /// The slug comes from the name and the status / priority are forced to
    /// `active` / `medium`, even when the input carries other values. A
    /// missing key is generated as `TF-<count + 1>`; if that key is taken the
    /// insert is retried above the highest `TF-<n>` key in storage, up to
    /// [`MAX_KEY_ATTEMPTS`] times. A collision on a caller-supplied key or on
    /// the slug is reported straight away.
    pub async fn create(&self, input: &CreateProject) -> StoreResult<Project> {
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        project::validate_name(&input.name)?;
        self.check_references(input.owner_id, input.lead_id).await?;

        if input.status.is_some_and(|s| s != project::initial_status())
            || input.priority.is_some_and(|p| p != project::initial_priority())
        {
            tracing::debug!(
                status = ?input.status,
                priority = ?input.priority,
                "Discarding caller-supplied status/priority on create"
            );
        }

        let slug = project::slugify(&input.name);
        let created = match input.key.as_deref() {
            Some(raw) => {
                let key = project::normalize_key(raw)?;
                ProjectRepo::create(&self.pool, input, &key, &slug)
                    .await
                    .map_err(|e| classify_create(e, input, &key, &slug))?
            }
            None => self.create_with_generated_key(input, &slug).await?,
        };

        tracing::info!(
            project_id = created.id,
            key = %created.key,
            slug = %created.slug,
            "Project created"
        );
        Ok(created)
    }

    async fn create_with_generated_key(
        &self,
        input: &CreateProject,
        slug: &str,
    ) -> StoreResult<Project> {
        let mut previous = None;
        let mut key = String::new();

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let count = ProjectRepo::count_all(&self.pool).await?;
            let number = project::next_key_number(count, previous);
            key = project::format_key(number);
            tracing::debug!(attempt, key = %key, "Trying generated project key");

            match ProjectRepo::create(&self.pool, input, &key, slug).await {
                Ok(created) => return Ok(created),
                Err(err) if is_unique_violation(&err, KEY_CONSTRAINT) => {
                    tracing::warn!(attempt, key = %key, "Generated project key already taken");
                    // Purged rows leave the count below the highest key.
                    let highest = ProjectRepo::max_key_number(&self.pool).await?;
                    previous = Some(highest.map_or(number, |h| h.max(number)));
                }
                Err(err) => return Err(classify_create(err, input, &key, slug)),
            }
        }

        Err(CoreError::Uniqueness {
            entity: ENTITY,
            field: "key",
            value: key,
        }
        .into())
    }

    // ── Read ──────────────────────────────────────────────────────────

    /// Live project by ID, or `None`.
    pub async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_id(&self.pool, id).await?)
    }

    /// Live project by ID, or [`CoreError::NotFound`].
    pub async fn get(&self, id: DbId) -> StoreResult<Project> {
        self.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// Project by ID whether trashed or not, or `None` once purged.
    pub async fn find_by_id_include_deleted(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_id_include_deleted(&self.pool, id).await?)
    }

    /// Live project by slug, or `None`.
    pub async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_slug(&self.pool, slug).await?)
    }

    /// Projects matching `filter`, judged overdue against today's UTC date.
    pub async fn list(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        self.list_as_of(filter, today()).await
    }

    /// Like [`ProjectStore::list`] with an explicit reference date.
    pub async fn list_as_of(
        &self,
        filter: &ProjectFilter,
        today: Date,
    ) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list(&self.pool, filter, today).await?)
    }

    /// Lazy, restartable walk over every project matching `filter`.
    pub fn stream<'a>(
        &'a self,
        filter: &'a ProjectFilter,
    ) -> impl Stream<Item = Result<Project, sqlx::Error>> + 'a {
        ProjectRepo::stream(&self.pool, filter, today())
    }

    /// Live `active` projects.
    pub async fn active(&self) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list_active(&self.pool, today()).await?)
    }

    /// Live `high` priority projects.
    pub async fn high_priority(&self) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list_high_priority(&self.pool, today()).await?)
    }

    /// Number of live `active` projects (the navigation badge).
    pub async fn count_active(&self) -> StoreResult<i64> {
        Ok(ProjectRepo::count_active(&self.pool).await?)
    }

    /// Active, overdue and trashed counts as of `today`.
    pub async fn summary_as_of(&self, today: Date) -> StoreResult<ProjectSummary> {
        Ok(ProjectSummary {
            active: ProjectRepo::count_active(&self.pool).await?,
            overdue: ProjectRepo::count_overdue(&self.pool, today).await?,
            trashed: ProjectRepo::count_trashed(&self.pool).await?,
        })
    }

    // ── Update ────────────────────────────────────────────────────────

    /// Apply a patch. Key and slug never change.
    ///
    /// Soft-deleted projects can still be edited; only purged ones are
    /// [`CoreError::NotFound`].
    pub async fn update(&self, id: DbId, patch: &UpdateProject) -> StoreResult<Project> {
        patch
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if let Some(name) = patch.name.as_deref() {
            project::validate_name(name)?;
        }
        self.check_references(patch.owner_id.flatten(), patch.lead_id.flatten())
            .await?;

        let references = [
            ("owner_id", patch.owner_id.flatten()),
            ("lead_id", patch.lead_id.flatten()),
        ];
        let updated = ProjectRepo::update(&self.pool, id, patch)
            .await
            .map_err(|e| {
                classify(
                    e,
                    Attempted {
                        values: &[],
                        references: &references,
                    },
                )
            })?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(project_id = id, "Project updated");
        Ok(updated)
    }

    // ── Soft delete / restore / purge ─────────────────────────────────

    /// Mark a project deleted. Deleting an already deleted project returns
    /// it unchanged.
    pub async fn soft_delete(&self, id: DbId) -> StoreResult<Project> {
        if ProjectRepo::soft_delete(&self.pool, id).await? {
            tracing::info!(project_id = id, "Project soft-deleted");
        }
        self.find_by_id_include_deleted(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Bring back a soft-deleted project. Fails with
    /// [`CoreError::NotFound`] if it is not in the trash.
    pub async fn restore(&self, id: DbId) -> StoreResult<Project> {
        if !ProjectRepo::restore(&self.pool, id).await? {
            return Err(not_found(id));
        }
        tracing::info!(project_id = id, "Project restored");
        self.get(id).await
    }

    /// Permanently remove a project, trashed or not.
    pub async fn force_delete(&self, id: DbId) -> StoreResult<()> {
        if !ProjectRepo::hard_delete(&self.pool, id).await? {
            return Err(not_found(id));
        }
        tracing::info!(project_id = id, "Project permanently deleted");
        Ok(())
    }

    /// Bulk soft-delete. Ids that are missing or already trashed are skipped.
    pub async fn soft_delete_many(&self, ids: &[DbId]) -> StoreResult<u64> {
        let affected = ProjectRepo::soft_delete_many(&self.pool, ids).await?;
        tracing::info!(requested = ids.len(), affected, "Projects soft-deleted");
        Ok(affected)
    }

    /// Bulk restore. Ids that are not in the trash are skipped.
    pub async fn restore_many(&self, ids: &[DbId]) -> StoreResult<u64> {
        let affected = ProjectRepo::restore_many(&self.pool, ids).await?;
        tracing::info!(requested = ids.len(), affected, "Projects restored");
        Ok(affected)
    }

    /// Bulk permanent delete. Missing ids are skipped.
    pub async fn force_delete_many(&self, ids: &[DbId]) -> StoreResult<u64> {
        let affected = ProjectRepo::hard_delete_many(&self.pool, ids).await?;
        tracing::info!(requested = ids.len(), affected, "Projects permanently deleted");
        Ok(affected)
    }

    // ── Helpers ───────────────────────────────────────────────────────

    async fn check_references(
        &self,
        owner_id: Option<DbId>,
        lead_id: Option<DbId>,
    ) -> StoreResult<()> {
        for (field, id) in [("owner_id", owner_id), ("lead_id", lead_id)] {
            if let Some(id) = id {
                if !UserRepo::exists(&self.pool, id).await? {
                    return Err(CoreError::Reference { field, id }.into());
                }
            }
        }
        Ok(())
    }
}

fn classify_create(err: sqlx::Error, input: &CreateProject, key: &str, slug: &str) -> StoreError {
    let values = [("key", key), ("slug", slug)];
    let references = [("owner_id", input.owner_id), ("lead_id", input.lead_id)];
    classify(
        err,
        Attempted {
            values: &values,
            references: &references,
        },
    )
}

fn not_found(id: DbId) -> StoreError {
    CoreError::NotFound { entity: ENTITY, id }.into()
}

fn today() -> Date {
    Utc::now().date_naive()
}
