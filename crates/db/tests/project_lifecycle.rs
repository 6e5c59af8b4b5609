//! Integration tests for project creation and editing.
//!
//! Exercises `ProjectStore` against a real database to verify that:
//! - New projects get a slug, a `TF-<n>` key and the `active` / `medium` defaults
//! - Key and slug collisions surface as uniqueness errors
//! - Owner / lead references are checked
//! - Updates touch only the supplied fields and never the key or slug

use assert_matches::assert_matches;
use sqlx::PgPool;
use taskforge_core::error::CoreError;
use taskforge_core::project::{ProjectPriority, ProjectStatus};
use taskforge_core::types::Date;
use taskforge_db::models::project::{CreateProject, UpdateProject};
use taskforge_db::models::user::CreateUser;
use taskforge_db::repositories::UserRepo;
use taskforge_db::{ProjectStore, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        ..Default::default()
    }
}

async fn new_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// Test: creation applies slug, key and defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_derives_identity_and_defaults(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let project = store.create(&new_project("Website Relaunch")).await.unwrap();

    assert_eq!(project.slug, "website-relaunch");
    assert_eq!(project.key, "TF-1");
    assert_eq!(project.status, ProjectStatus::Active);
    assert_eq!(project.priority, ProjectPriority::Medium);
    assert!(project.deleted_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_slug_transliterates_accented_name(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let project = store.create(&new_project("Café Überarbeitung")).await.unwrap();

    assert_eq!(project.slug, "cafe-uberarbeitung");
    assert_eq!(project.name, "Café Überarbeitung");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_generated_keys_follow_record_count(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let first = store.create(&new_project("Alpha")).await.unwrap();
    let second = store.create(&new_project("Beta")).await.unwrap();
    let third = store.create(&new_project("Gamma")).await.unwrap();

    assert_eq!(first.key, "TF-1");
    assert_eq!(second.key, "TF-2");
    assert_eq!(third.key, "TF-3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_overwrites_supplied_status_and_priority(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let input = CreateProject {
        status: Some(ProjectStatus::Completed),
        priority: Some(ProjectPriority::High),
        ..new_project("Forced Defaults")
    };
    let project = store.create(&input).await.unwrap();

    assert_eq!(project.status, ProjectStatus::Active);
    assert_eq!(project.priority, ProjectPriority::Medium);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_keeps_optional_fields(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let lead = new_user(&pool, "lead@example.com").await;
    let store = ProjectStore::new(pool);

    let input = CreateProject {
        description: Some("<p>Rebuild the marketing site</p>".to_string()),
        start_date: Some(date(2026, 1, 5)),
        due_date: Some(date(2026, 3, 31)),
        owner_id: Some(owner),
        lead_id: Some(lead),
        ..new_project("Full Project")
    };
    let project = store.create(&input).await.unwrap();

    assert_eq!(
        project.description.as_deref(),
        Some("<p>Rebuild the marketing site</p>")
    );
    assert_eq!(project.start_date, Some(date(2026, 1, 5)));
    assert_eq!(project.due_date, Some(date(2026, 3, 31)));
    assert_eq!(project.owner_id, Some(owner));
    assert_eq!(project.lead_id, Some(lead));
}

// ---------------------------------------------------------------------------
// Test: explicit keys
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_explicit_key_is_normalized(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let bare = CreateProject {
        key: Some("42".to_string()),
        ..new_project("Bare Key")
    };
    let lower = CreateProject {
        key: Some("tf-43".to_string()),
        ..new_project("Lowercase Key")
    };

    assert_eq!(store.create(&bare).await.unwrap().key, "TF-42");
    assert_eq!(store.create(&lower).await.unwrap().key, "TF-43");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_explicit_key_is_rejected(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let first = CreateProject {
        key: Some("TF-7".to_string()),
        ..new_project("First")
    };
    let second = CreateProject {
        key: Some("7".to_string()),
        ..new_project("Second")
    };

    store.create(&first).await.unwrap();
    let err = store.create(&second).await.unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Uniqueness { field: "key", ref value, .. }) if value == "TF-7"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_key_is_validation_error(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let input = CreateProject {
        key: Some("TF-".to_string()),
        ..new_project("Bad Key")
    };
    let err = store.create(&input).await.unwrap_err();

    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_generated_key_skips_taken_explicit_key(pool: PgPool) {
    let store = ProjectStore::new(pool);

    // Occupy the key the counter would produce next.
    let squatter = CreateProject {
        key: Some("2".to_string()),
        ..new_project("Squatter")
    };
    store.create(&squatter).await.unwrap();

    let generated = store.create(&new_project("Generated")).await.unwrap();

    assert_eq!(generated.key, "TF-3");
}

// ---------------------------------------------------------------------------
// Test: slug uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_name_collides_on_slug(pool: PgPool) {
    let store = ProjectStore::new(pool);

    store.create(&new_project("Website Relaunch")).await.unwrap();
    let err = store
        .create(&new_project("Website Relaunch"))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Uniqueness { field: "slug", ref value, .. })
            if value == "website-relaunch"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_names_with_same_slug_collide(pool: PgPool) {
    let store = ProjectStore::new(pool);

    store.create(&new_project("Website Relaunch")).await.unwrap();
    let err = store
        .create(&new_project("  website -- RELAUNCH!"))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Uniqueness { field: "slug", .. })
    );
}

// ---------------------------------------------------------------------------
// Test: input validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_name_is_rejected(pool: PgPool) {
    let store = ProjectStore::new(pool);

    for name in ["", "   ", "???"] {
        let err = store.create(&new_project(name)).await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Validation(_)), "name {name:?}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_owner_is_reference_error(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let input = CreateProject {
        owner_id: Some(9_999),
        ..new_project("Orphan")
    };
    let err = store.create(&input).await.unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Reference {
            field: "owner_id",
            id: 9_999
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_lead_is_reference_error(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let store = ProjectStore::new(pool);

    let input = CreateProject {
        owner_id: Some(owner),
        lead_id: Some(12_345),
        ..new_project("Leaderless")
    };
    let err = store.create(&input).await.unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Reference {
            field: "lead_id",
            id: 12_345
        })
    );
}

// ---------------------------------------------------------------------------
// Test: update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_applies_only_supplied_fields(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store
        .create(&CreateProject {
            description: Some("keep me".to_string()),
            due_date: Some(date(2026, 6, 30)),
            ..new_project("Partial Update")
        })
        .await
        .unwrap();

    let patch = UpdateProject {
        status: Some(ProjectStatus::Paused),
        priority: Some(ProjectPriority::High),
        ..Default::default()
    };
    let updated = store.update(project.id, &patch).await.unwrap();

    assert_eq!(updated.status, ProjectStatus::Paused);
    assert_eq!(updated.priority, ProjectPriority::High);
    assert_eq!(updated.name, "Partial Update");
    assert_eq!(updated.description.as_deref(), Some("keep me"));
    assert_eq!(updated.due_date, Some(date(2026, 6, 30)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_accepts_every_status(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Status Cycle")).await.unwrap();

    for status in [
        ProjectStatus::Completed,
        ProjectStatus::Paused,
        ProjectStatus::Active,
    ] {
        let patch = UpdateProject {
            status: Some(status),
            ..Default::default()
        };
        assert_eq!(store.update(project.id, &patch).await.unwrap().status, status);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rename_keeps_slug_and_key(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Original Name")).await.unwrap();

    let patch = UpdateProject {
        name: Some("Completely Different".to_string()),
        ..Default::default()
    };
    let updated = store.update(project.id, &patch).await.unwrap();

    assert_eq!(updated.name, "Completely Different");
    assert_eq!(updated.slug, "original-name");
    assert_eq!(updated.key, project.key);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_key_and_slug_in_patch_payload_are_ignored(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Immutable")).await.unwrap();

    let patch: UpdateProject = serde_json::from_value(serde_json::json!({
        "key": "TF-500",
        "slug": "something-else",
        "priority": "low",
    }))
    .unwrap();
    let updated = store.update(project.id, &patch).await.unwrap();

    assert_eq!(updated.key, project.key);
    assert_eq!(updated.slug, project.slug);
    assert_eq!(updated.priority, ProjectPriority::Low);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_can_clear_nullable_fields(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let store = ProjectStore::new(pool);
    let project = store
        .create(&CreateProject {
            description: Some("temporary".to_string()),
            owner_id: Some(owner),
            due_date: Some(date(2026, 2, 1)),
            ..new_project("Clearable")
        })
        .await
        .unwrap();

    let patch: UpdateProject = serde_json::from_value(serde_json::json!({
        "description": null,
        "owner_id": null,
        "due_date": null,
    }))
    .unwrap();
    let updated = store.update(project.id, &patch).await.unwrap();

    assert!(updated.description.is_none());
    assert!(updated.owner_id.is_none());
    assert!(updated.due_date.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_project_is_not_found(pool: PgPool) {
    let store = ProjectStore::new(pool);

    let patch = UpdateProject {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    let err = store.update(424_242, &patch).await.unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::NotFound {
            entity: "project",
            id: 424_242
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_rejects_blank_name(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Named")).await.unwrap();

    let patch = UpdateProject {
        name: Some("   ".to_string()),
        ..Default::default()
    };
    let err = store.update(project.id, &patch).await.unwrap_err();

    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_rejects_dangling_lead(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Needs Lead")).await.unwrap();

    let patch = UpdateProject {
        lead_id: Some(Some(777)),
        ..Default::default()
    };
    let err = store.update(project.id, &patch).await.unwrap_err();

    assert_matches!(
        err,
        StoreError::Core(CoreError::Reference {
            field: "lead_id",
            id: 777
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_by_slug(pool: PgPool) {
    let store = ProjectStore::new(pool);
    let project = store.create(&new_project("Route Key")).await.unwrap();

    let found = store.find_by_slug("route-key").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(project.id));
    assert!(store.find_by_slug("nope").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: removing a user detaches their projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_user_clears_owner_and_lead(pool: PgPool) {
    let user = new_user(&pool, "leaver@example.com").await;
    let store = ProjectStore::new(pool.clone());
    let project = store
        .create(&CreateProject {
            owner_id: Some(user),
            lead_id: Some(user),
            ..new_project("Orphaned Later")
        })
        .await
        .unwrap();

    assert!(UserRepo::delete(&pool, user).await.unwrap());
    assert!(UserRepo::find_by_id(&pool, user).await.unwrap().is_none());

    let reloaded = store.get(project.id).await.unwrap();
    assert!(reloaded.owner_id.is_none());
    assert!(reloaded.lead_id.is_none());
}
