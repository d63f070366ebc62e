use quillbox_core::db::open_db_in_memory;
use quillbox_core::{
    FailureKind, Priority, Repeating, SqliteTodoRepository, SqliteUserRepository, TodoDraft,
    TodoPatch, TodoService, TodoServiceError, UserId, UserProfile, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let service = TodoService::new(repo);

    let created = service
        .create_todo(
            owner,
            TodoDraft {
                title: "water plants".to_string(),
                emoji: Some("🌱".to_string()),
                due_date: 1_700_000_000_000,
                priority: Priority::Low,
                notification: true,
                repeating: Some(Repeating::Needed),
            },
        )
        .unwrap();

    let loaded = service.get_todo(owner, created.uuid).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.priority, Priority::Low);
    assert_eq!(loaded.repeating, Some(Repeating::Needed));
    assert!(!loaded.done);
}

#[test]
fn todos_are_owner_gated() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let other = seed_user(&conn, "b@example.com", "B");
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let service = TodoService::new(repo);

    let created = service
        .create_todo(
            owner,
            TodoDraft {
                title: "private errand".to_string(),
                emoji: None,
                due_date: 1_700_000_000_000,
                priority: Priority::Highest,
                notification: false,
                repeating: None,
            },
        )
        .unwrap();

    let err = service.get_todo(other, created.uuid).unwrap_err();
    assert!(matches!(err, TodoServiceError::NotOwner { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);

    let err = service
        .update_todo(
            other,
            created.uuid,
            TodoPatch {
                done: Some(true),
                ..TodoPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, TodoServiceError::NotOwner { .. }));

    let err = service.delete_todo(other, created.uuid).unwrap_err();
    assert!(matches!(err, TodoServiceError::NotOwner { .. }));
}

#[test]
fn list_returns_only_own_todos() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let other = seed_user(&conn, "b@example.com", "B");
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let service = TodoService::new(repo);

    for title in ["one", "two"] {
        service
            .create_todo(
                owner,
                TodoDraft {
                    title: title.to_string(),
                    emoji: None,
                    due_date: 1_700_000_000_000,
                    priority: Priority::Medium,
                    notification: false,
                    repeating: None,
                },
            )
            .unwrap();
    }
    service
        .create_todo(
            other,
            TodoDraft {
                title: "not yours".to_string(),
                emoji: None,
                due_date: 1_700_000_000_000,
                priority: Priority::Medium,
                notification: false,
                repeating: None,
            },
        )
        .unwrap();

    let listed = service.list_todos(owner).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|todo| todo.created_by == owner));
}

#[test]
fn update_patch_toggles_done_and_delete_marker() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let service = TodoService::new(repo);

    let created = service
        .create_todo(
            owner,
            TodoDraft {
                title: "file taxes".to_string(),
                emoji: None,
                due_date: 1_700_000_000_000,
                priority: Priority::Highest,
                notification: true,
                repeating: None,
            },
        )
        .unwrap();

    let done = service
        .update_todo(
            owner,
            created.uuid,
            TodoPatch {
                done: Some(true),
                priority: Some(Priority::Lowest),
                ..TodoPatch::default()
            },
        )
        .unwrap();
    assert!(done.done);
    assert_eq!(done.priority, Priority::Lowest);

    let tombstoned = service
        .update_todo(
            owner,
            created.uuid,
            TodoPatch {
                deleted: Some(true),
                ..TodoPatch::default()
            },
        )
        .unwrap();
    assert!(tombstoned.is_deleted);
    assert!(tombstoned.deleted_at.is_some());
}

#[test]
fn delete_then_get_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    let service = TodoService::new(repo);

    let created = service
        .create_todo(
            owner,
            TodoDraft {
                title: "ephemeral".to_string(),
                emoji: None,
                due_date: 1_700_000_000_000,
                priority: Priority::Medium,
                notification: false,
                repeating: None,
            },
        )
        .unwrap();
    service.delete_todo(owner, created.uuid).unwrap();

    let err = service.get_todo(owner, created.uuid).unwrap_err();
    assert!(matches!(err, TodoServiceError::TodoNotFound(_)));
    assert_eq!(err.kind(), FailureKind::NotFound);

    let err = service.get_todo(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, TodoServiceError::TodoNotFound(_)));
}

fn seed_user(conn: &Connection, email: &str, name: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(&UserProfile::new(email, name)).unwrap()
}
