use quillbox_core::db::open_db_in_memory;
use quillbox_core::repo::access;
use quillbox_core::{
    FailureKind, InviteService, ModelValidationError, NotebookDraft, NotebookId, NotebookPatch,
    NotebookRepository, NotebookService, NotebookServiceError, NoteDraft, NoteRepository,
    NoteService, SqliteInviteRepository, SqliteNotebookRepository, SqliteNoteRepository,
    SqliteUserRepository, UserId, UserProfile, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_seeds_owner_access() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let mut service = NotebookService::new(repo);
    let details = service
        .create_notebook(
            owner,
            NotebookDraft {
                title: "travel".to_string(),
                emoji: Some("🧭".to_string()),
                color: "#00FF00".to_string(),
            },
        )
        .unwrap();

    assert_eq!(details.notebook.created_by, owner);
    assert_eq!(details.members.len(), 1);
    assert_eq!(details.members[0].uuid, owner);
    assert!(details.notes.is_empty());
    assert!(!details.notebook.is_deleted);
}

#[test]
fn create_rejects_malformed_color() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let mut service = NotebookService::new(repo);
    let err = service
        .create_notebook(
            owner,
            NotebookDraft {
                title: "travel".to_string(),
                emoji: None,
                color: "turquoise".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        NotebookServiceError::Validation(ModelValidationError::InvalidColor(_))
    ));
    assert_eq!(err.kind(), FailureKind::Invalid);
}

#[test]
fn get_distinguishes_missing_from_forbidden() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let stranger = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "travel");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let service = NotebookService::new(repo);

    let err = service.get_notebook(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, NotebookServiceError::NotebookNotFound(_)));
    assert_eq!(err.kind(), FailureKind::NotFound);

    let err = service.get_notebook(stranger, notebook).unwrap_err();
    assert!(matches!(err, NotebookServiceError::NoAccess { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);

    let details = service.get_notebook(owner, notebook).unwrap();
    assert_eq!(details.notebook.uuid, notebook);
}

#[test]
fn update_patch_toggles_soft_delete_marker_consistently() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let notebook = create_notebook(&mut conn, owner, "travel");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let service = NotebookService::new(repo);

    let deleted = service
        .update_notebook(
            owner,
            notebook,
            NotebookPatch {
                deleted: Some(true),
                ..NotebookPatch::default()
            },
        )
        .unwrap();
    assert!(deleted.notebook.is_deleted);
    assert!(deleted.notebook.deleted_at.is_some());

    let restored = service
        .update_notebook(
            owner,
            notebook,
            NotebookPatch {
                deleted: Some(false),
                ..NotebookPatch::default()
            },
        )
        .unwrap();
    assert!(!restored.notebook.is_deleted);
    assert!(restored.notebook.deleted_at.is_none());
}

#[test]
fn update_is_membership_gated_and_revalidates_color() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let stranger = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "travel");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let service = NotebookService::new(repo);

    let err = service
        .update_notebook(
            stranger,
            notebook,
            NotebookPatch {
                title: Some("hijacked".to_string()),
                ..NotebookPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, NotebookServiceError::NoAccess { .. }));

    let err = service
        .update_notebook(
            owner,
            notebook,
            NotebookPatch {
                color: Some("nope".to_string()),
                ..NotebookPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Invalid);

    let renamed = service
        .update_notebook(
            owner,
            notebook,
            NotebookPatch {
                title: Some("travel 2026".to_string()),
                color: Some("0x112233".to_string()),
                ..NotebookPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.notebook.title, "travel 2026");
    assert_eq!(renamed.notebook.color, "0x112233");
}

#[test]
fn child_note_listing_keeps_creation_order() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let notebook = create_notebook(&mut conn, owner, "travel");

    let mut created = Vec::new();
    for title in ["itinerary", "packing", "budget"] {
        created.push(create_note(&mut conn, owner, notebook, title));
    }

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let service = NotebookService::new(repo);
    let details = service.get_notebook(owner, notebook).unwrap();
    let listed: Vec<_> = details.notes.iter().map(|note| note.uuid).collect();
    assert_eq!(listed, created);
}

#[test]
fn delete_is_owner_gated_and_cascades() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let member = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "travel");
    let note = create_note(&mut conn, owner, notebook, "itinerary");
    access::grant_access(&conn, notebook, member).unwrap();
    // A pending invite to a third user rides on the notebook.
    let third = seed_user(&conn, "c@example.com", "C");
    {
        let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
        let service = InviteService::new(repo);
        service.create_invite(owner, notebook, third).unwrap();
    }

    {
        let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
        let mut service = NotebookService::new(repo);
        let err = service.delete_notebook(member, notebook).unwrap_err();
        assert!(matches!(err, NotebookServiceError::NotOwner { .. }));
        assert_eq!(err.kind(), FailureKind::Forbidden);

        service.delete_notebook(owner, notebook).unwrap();
    }

    {
        let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
        assert!(repo.get_notebook(notebook).unwrap().is_none());
    }
    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        assert!(repo.get_note(note).unwrap().is_none());
    }
    assert!(access::load_notebook_access(&conn, notebook)
        .unwrap()
        .is_empty());

    let invite_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM notebook_invites WHERE notebook_uuid = ?1;",
            [notebook.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(invite_count, 0);
}

fn seed_user(conn: &Connection, email: &str, name: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(&UserProfile::new(email, name)).unwrap()
}

fn create_notebook(conn: &mut Connection, owner: UserId, title: &str) -> NotebookId {
    let repo = SqliteNotebookRepository::try_new(conn).unwrap();
    let mut service = NotebookService::new(repo);
    let details = service
        .create_notebook(
            owner,
            NotebookDraft {
                title: title.to_string(),
                emoji: None,
                color: "#AABBCC".to_string(),
            },
        )
        .unwrap();
    details.notebook.uuid
}

fn create_note(
    conn: &mut Connection,
    member: UserId,
    notebook: NotebookId,
    title: &str,
) -> quillbox_core::NoteId {
    let repo = SqliteNoteRepository::try_new(conn).unwrap();
    let mut service = NoteService::new(repo);
    service
        .create_note(
            member,
            notebook,
            NoteDraft {
                title: title.to_string(),
                emoji: None,
                content: String::new(),
            },
        )
        .unwrap()
        .uuid
}
