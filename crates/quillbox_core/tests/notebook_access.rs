use quillbox_core::db::open_db_in_memory;
use quillbox_core::repo::access;
use quillbox_core::{
    FailureKind, GrantOutcome, NotebookDraft, NotebookId, NotebookService, NotebookServiceError,
    NoteDraft, NoteId, NotePatch, NoteRepository, NoteService, SqliteNotebookRepository,
    SqliteNoteRepository, SqliteUserRepository, UserId, UserProfile, UserRepository,
};
use rusqlite::Connection;

#[test]
fn second_grant_for_same_user_reports_already_granted() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");

    assert_eq!(
        access::grant_access(&conn, notebook, member).unwrap(),
        GrantOutcome::Granted
    );
    assert_eq!(
        access::grant_access(&conn, notebook, member).unwrap(),
        GrantOutcome::AlreadyGranted
    );

    let members = access::load_notebook_access(&conn, notebook).unwrap();
    assert_eq!(members.iter().filter(|id| **id == member).count(), 1);
}

#[test]
fn mirror_overwrites_every_child_note_access_set() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");
    let note_a = create_note(&mut conn, owner, notebook, "first");
    let note_b = create_note(&mut conn, owner, notebook, "second");

    // Notes created before the grant only know the owner.
    assert_eq!(
        access::load_note_access(&conn, note_a).unwrap(),
        sorted(vec![owner])
    );

    access::grant_access(&conn, notebook, member).unwrap();
    access::mirror_notebook_access(&mut conn, notebook).unwrap();

    let expected = sorted(vec![owner, member]);
    assert_eq!(access::load_note_access(&conn, note_a).unwrap(), expected);
    assert_eq!(access::load_note_access(&conn, note_b).unwrap(), expected);
}

#[test]
fn mirror_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");
    let note = create_note(&mut conn, owner, notebook, "only");

    access::grant_access(&conn, notebook, member).unwrap();
    let first = access::mirror_notebook_access(&mut conn, notebook).unwrap();
    let snapshot = access::load_note_access(&conn, note).unwrap();

    let second = access::mirror_notebook_access(&mut conn, notebook).unwrap();
    assert_eq!(first, second);
    assert_eq!(access::load_note_access(&conn, note).unwrap(), snapshot);
}

#[test]
fn mirror_updates_access_of_soft_deleted_notes_without_reviving_them() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");
    let note = create_note(&mut conn, owner, notebook, "tombstoned");

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let service = NoteService::new(repo);
        let patch = NotePatch {
            deleted: Some(true),
            ..NotePatch::default()
        };
        let updated = service.update_note(owner, note, patch).unwrap();
        assert!(updated.is_deleted);
    }

    access::grant_access(&conn, notebook, member).unwrap();
    access::mirror_notebook_access(&mut conn, notebook).unwrap();

    assert_eq!(
        access::load_note_access(&conn, note).unwrap(),
        sorted(vec![owner, member])
    );
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let stored = repo.get_note(note).unwrap().unwrap();
    assert!(stored.is_deleted);
    assert!(stored.deleted_at.is_some());
}

#[test]
fn revoke_removes_user_from_notebook_and_all_child_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");
    let note = create_note(&mut conn, owner, notebook, "only");

    access::grant_access(&conn, notebook, member).unwrap();
    access::mirror_notebook_access(&mut conn, notebook).unwrap();

    {
        let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
        let mut service = NotebookService::new(repo);
        let details = service.revoke_access(owner, notebook, member).unwrap();
        assert!(details.members.iter().all(|summary| summary.uuid != member));
    }

    assert_eq!(
        access::load_notebook_access(&conn, notebook).unwrap(),
        sorted(vec![owner])
    );
    assert_eq!(
        access::load_note_access(&conn, note).unwrap(),
        sorted(vec![owner])
    );

    // A second revoke of the same user is a state-invariant violation.
    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let mut service = NotebookService::new(repo);
    let err = service.revoke_access(owner, notebook, member).unwrap_err();
    assert!(matches!(err, NotebookServiceError::TargetNotGranted { .. }));
    assert_eq!(err.kind(), FailureKind::Conflict);
}

#[test]
fn revoke_requires_owner() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let member = seed_user(&conn, "member@example.com", "Member");
    let notebook = create_notebook(&mut conn, owner, "shared plans");
    access::grant_access(&conn, notebook, member).unwrap();

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let mut service = NotebookService::new(repo);
    let err = service.revoke_access(member, notebook, owner).unwrap_err();
    assert!(matches!(err, NotebookServiceError::NotOwner { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);
}

#[test]
fn owner_cannot_be_revoked() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com", "Owner");
    let notebook = create_notebook(&mut conn, owner, "shared plans");

    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let mut service = NotebookService::new(repo);
    let err = service.revoke_access(owner, notebook, owner).unwrap_err();
    assert!(matches!(err, NotebookServiceError::OwnerAlwaysMember(_)));
    assert_eq!(err.kind(), FailureKind::Conflict);
}

fn sorted(mut ids: Vec<UserId>) -> Vec<UserId> {
    ids.sort();
    ids
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

fn create_note(conn: &mut Connection, member: UserId, notebook: NotebookId, title: &str) -> NoteId {
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
