//! Integration tests for generated keys under concurrent creation.
//!
//! Keys are derived from the record count, so parallel writers routinely
//! pick the same candidate. The unique constraint decides the winner and
//! the losers retry with a higher number.

use std::collections::HashSet;

use futures::future::join_all;
use sqlx::PgPool;
use taskforge_core::error::CoreError;
use taskforge_core::project::parse_key_number;
use taskforge_db::models::project::{CreateProject, ProjectFilter};
use taskforge_db::repositories::project_repo::{KEY_CONSTRAINT, SLUG_CONSTRAINT};
use taskforge_db::ProjectStore;

const WRITERS: usize = 8;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_get_distinct_keys(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let tasks = (0..WRITERS).map(|n| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create(&CreateProject {
                    name: format!("Parallel {n}"),
                    ..Default::default()
                })
                .await
        })
    });
    let created: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let keys: HashSet<_> = created.iter().map(|p| p.key.clone()).collect();
    assert_eq!(keys.len(), WRITERS);
    assert!(keys.iter().all(|k| parse_key_number(k).is_some()));

    let stored = store.list(&ProjectFilter::default()).await.unwrap();
    assert_eq!(stored.len(), WRITERS);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_same_name_yields_one_project(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let tasks = (0..4).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create(&CreateProject {
                    name: "Contested".to_string(),
                    ..Default::default()
                })
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(
            e.as_core(),
            Some(CoreError::Uniqueness { field: "slug", .. })
        )));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_constraint_names_match_schema(pool: PgPool) {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT conname::TEXT FROM pg_constraint
         WHERE conrelid = 'projects'::regclass AND contype = 'u'
         ORDER BY conname",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(names, [KEY_CONSTRAINT, SLUG_CONSTRAINT]);
}
