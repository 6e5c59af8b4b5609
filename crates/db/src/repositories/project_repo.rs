//! Repository for the `projects` table.
//!
//! Plain SQL only. Key / slug derivation, the creation defaults and error
//! classification live in [`crate::ProjectStore`].

use futures::stream::{self, Stream, TryStreamExt};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use taskforge_core::listing::{
    clamp_limit, clamp_offset, SortColumn, MAX_LIST_LIMIT, STREAM_PAGE_SIZE,
};
use taskforge_core::project::{
    self, ProjectPriority, ProjectStatus, STATUS_ACTIVE, STATUS_COMPLETED,
};
use taskforge_core::types::{Date, DbId};

use crate::models::project::{CreateProject, Project, ProjectFilter, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, key, slug, description, status, priority, start_date, \
    due_date, owner_id, lead_id, created_at, updated_at, deleted_at";

/// Name of the unique constraint on `projects.key`.
pub const KEY_CONSTRAINT: &str = "uq_projects_key";

/// Name of the unique constraint on `projects.slug`.
pub const SLUG_CONSTRAINT: &str = "uq_projects_slug";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    // ── Create ────────────────────────────────────────────────────────

    /// Insert a new project with an already derived `key` and `slug`.
    ///
    /// Status and priority are always written as the creation defaults;
    /// `input.status` / `input.priority` are never read.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
        key: &str,
        slug: &str,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (name, key, slug, description, status, priority,
                 start_date, due_date, owner_id, lead_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.name.trim())
            .bind(key)
            .bind(slug)
            .bind(&input.description)
            .bind(project::initial_status().as_str())
            .bind(project::initial_priority().as_str())
            .bind(input.start_date)
            .bind(input.due_date)
            .bind(input.owner_id)
            .bind(input.lead_id)
            .fetch_one(pool)
            .await
    }

    // ── Lookups ───────────────────────────────────────────────────────

    /// Find a project by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by ID, including soft-deleted rows.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by slug, the external route key. Excludes soft-deleted rows.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM projects WHERE slug = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    // ── Counts ────────────────────────────────────────────────────────

    /// Count every row, soft-deleted ones included (they still hold keys).
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await
    }

    /// Highest `<n>` among generated-style `TF-<n>` keys, trashed rows included.
    pub async fn max_key_number(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(substring(key FROM 4)::BIGINT) FROM projects
             WHERE key ~ '^TF-[0-9]{1,18}$'",
        )
        .fetch_one(pool)
        .await
    }

    /// Count live projects with status `active`.
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects WHERE status = $1 AND deleted_at IS NULL",
        )
        .bind(STATUS_ACTIVE)
        .fetch_one(pool)
        .await
    }

    /// Count soft-deleted projects.
    pub async fn count_trashed(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE deleted_at IS NOT NULL")
            .fetch_one(pool)
            .await
    }

    /// Count live projects that are overdue as of `today`.
    pub async fn count_overdue(pool: &PgPool, today: Date) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects
             WHERE deleted_at IS NULL AND due_date < $1 AND status <> $2",
        )
        .bind(today)
        .bind(STATUS_COMPLETED)
        .fetch_one(pool)
        .await
    }

    // ── Listing ───────────────────────────────────────────────────────

    /// List projects matching `filter`.
    ///
    /// `today` anchors the overdue predicate. Without a `limit` every
    /// matching row is returned.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
        today: Date,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let limit = filter
            .limit
            .map(|limit| clamp_limit(Some(limit), MAX_LIST_LIMIT));
        Self::fetch_page(pool, filter, today, limit, clamp_offset(filter.offset), None).await
    }

    /// Lazily walk every project matching `filter`, one page at a time.
    ///
    /// The filter's own `limit` / `offset` are ignored. Pages are keyed on
    /// the last row seen (sort value, then id), so rows inserted or removed
    /// mid-walk do not shift later pages. Nothing is fetched until the
    /// stream is polled, and calling this again starts over.
    pub fn stream<'a>(
        pool: &'a PgPool,
        filter: &'a ProjectFilter,
        today: Date,
    ) -> impl Stream<Item = Result<Project, sqlx::Error>> + 'a {
        stream::try_unfold(Some(None::<Project>), move |cursor| async move {
            let Some(after) = cursor else {
                return Ok::<_, sqlx::Error>(None);
            };
            let page =
                Self::fetch_page(pool, filter, today, Some(STREAM_PAGE_SIZE), 0, after.as_ref())
                    .await?;
            let next = if page.len() as i64 == STREAM_PAGE_SIZE {
                page.last().cloned().map(Some)
            } else {
                None
            };
            let items = stream::iter(page.into_iter().map(Ok::<Project, sqlx::Error>));
            Ok(Some((items, next)))
        })
        .try_flatten()
    }

    /// Live projects with status `active`, newest first.
    pub async fn list_active(pool: &PgPool, today: Date) -> Result<Vec<Project>, sqlx::Error> {
        let filter = ProjectFilter {
            statuses: vec![ProjectStatus::Active],
            ..Default::default()
        };
        Self::list(pool, &filter, today).await
    }

    /// Live projects with priority `high`, newest first.
    pub async fn list_high_priority(
        pool: &PgPool,
        today: Date,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let filter = ProjectFilter {
            priorities: vec![ProjectPriority::High],
            ..Default::default()
        };
        Self::list(pool, &filter, today).await
    }

    async fn fetch_page(
        pool: &PgPool,
        filter: &ProjectFilter,
        today: Date,
        limit: Option<i64>,
        offset: i64,
        after: Option<&Project>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        let priorities: Vec<&str> = filter.priorities.iter().map(|p| p.as_str()).collect();
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{}%", escape_like(term)));
        let keyset = match after {
            Some(_) => format!("AND {}", filter.sort.after_sql(11, 12)),
            None => String::new(),
        };

        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1 OR deleted_at IS NULL)
               AND (cardinality($2::TEXT[]) = 0 OR status = ANY($2))
               AND (cardinality($3::TEXT[]) = 0 OR priority = ANY($3))
               AND (NOT $4 OR (due_date < $5 AND status <> $10))
               AND ($6::TEXT IS NULL OR name ILIKE $6 OR key ILIKE $6)
               AND ($7::BIGINT IS NULL OR owner_id = $7)
               {keyset}
             ORDER BY {}
             LIMIT $8 OFFSET $9",
            filter.sort.order_by_sql()
        );
        let mut q = sqlx::query_as::<_, Project>(&query)
            .bind(filter.include_deleted)
            .bind(&statuses)
            .bind(&priorities)
            .bind(filter.overdue)
            .bind(today)
            .bind(search)
            .bind(filter.owner_id)
            .bind(limit)
            .bind(offset)
            .bind(STATUS_COMPLETED);
        if let Some(last) = after {
            q = bind_sort_value(q, filter.sort.column, last).bind(last.id);
        }
        q.fetch_all(pool).await
    }

    // ── Update ────────────────────────────────────────────────────────

    /// Update a project. Only fields present in `input` are applied.
    ///
    /// Soft-deleted rows can be edited too. Returns `None` if no row with
    /// the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                start_date = CASE WHEN $7 THEN $8 ELSE start_date END,
                due_date = CASE WHEN $9 THEN $10 ELSE due_date END,
                owner_id = CASE WHEN $11 THEN $12 ELSE owner_id END,
                lead_id = CASE WHEN $13 THEN $14 ELSE lead_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.description.is_some())
            .bind(input.description.clone().flatten())
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.start_date.is_some())
            .bind(input.start_date.flatten())
            .bind(input.due_date.is_some())
            .bind(input.due_date.flatten())
            .bind(input.owner_id.is_some())
            .bind(input.owner_id.flatten())
            .bind(input.lead_id.is_some())
            .bind(input.lead_id.flatten())
            .fetch_optional(pool)
            .await
    }

    // ── Soft delete / restore / purge ─────────────────────────────────

    /// Soft-delete a project by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted project. Returns `true` if a row was restored.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a project by ID. Returns `true` if a row was removed.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Bulk actions ──────────────────────────────────────────────────

    /// Soft-delete every live project in `ids`. Returns the number marked.
    pub async fn soft_delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Restore every soft-deleted project in `ids`. Returns the number restored.
    pub async fn restore_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NULL WHERE id = ANY($1) AND deleted_at IS NOT NULL",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete every project in `ids`. Returns the number removed.
    pub async fn hard_delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Bind `last`'s value for the sort column as a keyset cursor.
fn bind_sort_value<'q>(
    query: QueryAs<'q, Postgres, Project, PgArguments>,
    column: SortColumn,
    last: &Project,
) -> QueryAs<'q, Postgres, Project, PgArguments> {
    match column {
        SortColumn::CreatedAt => query.bind(last.created_at),
        SortColumn::UpdatedAt => query.bind(last.updated_at),
        SortColumn::Name => query.bind(last.name.clone()),
        SortColumn::Key => query.bind(last.key.clone()),
        SortColumn::Status => query.bind(last.status.as_str()),
        SortColumn::Priority => query.bind(last.priority.as_str()),
        SortColumn::StartDate => query.bind(last.start_date),
        SortColumn::DueDate => query.bind(last.due_date),
    }
}

/// Escape `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
