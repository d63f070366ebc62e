use quillbox_core::db::open_db_in_memory;
use quillbox_core::repo::access;
use quillbox_core::{
    FailureKind, InviteId, InviteService, InviteServiceError, NotebookDraft, NotebookId,
    NotebookService, NoteDraft, NoteId, NoteService, SqliteInviteRepository,
    SqliteNotebookRepository, SqliteNoteRepository, SqliteUserRepository, UserId, UserProfile,
    UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn accept_grants_access_mirrors_notes_and_consumes_invite() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "project x");
    let note = create_note(&mut conn, owner, notebook, "kickoff");

    let invite = create_invite(&mut conn, owner, notebook, receiver);

    {
        let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
        let mut service = InviteService::new(repo);
        let details = service.accept_invite(receiver, invite).unwrap();
        assert_eq!(details.inviter.uuid, owner);
        assert_eq!(details.receiver.uuid, receiver);
        assert_eq!(details.notebook_uuid, notebook);
    }

    let expected = sorted(vec![owner, receiver]);
    assert_eq!(
        access::load_notebook_access(&conn, notebook).unwrap(),
        expected
    );
    assert_eq!(access::load_note_access(&conn, note).unwrap(), expected);

    // The consumed invite is gone: a second accept reports not-found.
    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let mut service = InviteService::new(repo);
    let err = service.accept_invite(receiver, invite).unwrap_err();
    assert!(matches!(err, InviteServiceError::InviteNotFound(_)));
    assert_eq!(err.kind(), FailureKind::NotFound);
}

#[test]
fn self_invite_is_always_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let notebook = create_notebook(&mut conn, owner, "project x");

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service.create_invite(owner, notebook, owner).unwrap_err();
    assert!(matches!(err, InviteServiceError::SelfInvite(_)));
    assert_eq!(err.kind(), FailureKind::Conflict);

    // Rejected even for a notebook that does not exist: the check comes
    // before any lookup.
    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service
        .create_invite(owner, Uuid::new_v4(), owner)
        .unwrap_err();
    assert!(matches!(err, InviteServiceError::SelfInvite(_)));
}

#[test]
fn only_the_owner_can_invite() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let member = seed_user(&conn, "b@example.com", "B");
    let third = seed_user(&conn, "c@example.com", "C");
    let notebook = create_notebook(&mut conn, owner, "project x");
    access::grant_access(&conn, notebook, member).unwrap();

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service.create_invite(member, notebook, third).unwrap_err();
    assert!(matches!(err, InviteServiceError::NotOwner { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);
}

#[test]
fn inviting_an_existing_member_reports_already_member_before_duplicate() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "project x");

    // A pending invite exists, then access arrives out of band.
    create_invite(&mut conn, owner, notebook, receiver);
    access::grant_access(&conn, notebook, receiver).unwrap();

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service.create_invite(owner, notebook, receiver).unwrap_err();
    assert!(matches!(err, InviteServiceError::AlreadyMember { .. }));
    assert_eq!(err.kind(), FailureKind::Conflict);
}

#[test]
fn duplicate_pending_invite_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "project x");
    create_invite(&mut conn, owner, notebook, receiver);

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service.create_invite(owner, notebook, receiver).unwrap_err();
    assert!(matches!(err, InviteServiceError::DuplicateInvite { .. }));
    assert_eq!(err.kind(), FailureKind::Conflict);
}

#[test]
fn invite_requires_existing_receiver_profile() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let notebook = create_notebook(&mut conn, owner, "project x");

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service
        .create_invite(owner, notebook, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, InviteServiceError::ReceiverNotFound(_)));
    assert_eq!(err.kind(), FailureKind::NotFound);
}

#[test]
fn withdraw_works_for_both_participants_and_nobody_else() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let stranger = seed_user(&conn, "c@example.com", "C");
    let notebook = create_notebook(&mut conn, owner, "project x");

    // Decline by the receiver.
    let declined = create_invite(&mut conn, owner, notebook, receiver);
    {
        let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
        let service = InviteService::new(repo);
        let details = service.withdraw_invite(receiver, declined).unwrap();
        assert_eq!(details.uuid, declined);
        assert!(service.list_received_invites(receiver).unwrap().is_empty());
    }

    // Cancel by the inviter.
    let cancelled = create_invite(&mut conn, owner, notebook, receiver);
    {
        let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
        let service = InviteService::new(repo);
        service.withdraw_invite(owner, cancelled).unwrap();
    }

    // A third party cannot withdraw.
    let pending = create_invite(&mut conn, owner, notebook, receiver);
    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);
    let err = service.withdraw_invite(stranger, pending).unwrap_err();
    assert!(matches!(err, InviteServiceError::NotParticipant { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);

    let err = service.withdraw_invite(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, InviteServiceError::InviteNotFound(_)));

    // No access was ever granted along the way.
    assert_eq!(
        access::load_notebook_access(&conn, notebook).unwrap(),
        vec![owner]
    );
}

#[test]
fn only_the_receiver_can_accept() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "project x");
    let invite = create_invite(&mut conn, owner, notebook, receiver);

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let mut service = InviteService::new(repo);
    let err = service.accept_invite(owner, invite).unwrap_err();
    assert!(matches!(err, InviteServiceError::NotReceiver { .. }));
    assert_eq!(err.kind(), FailureKind::Forbidden);
}

#[test]
fn accept_after_out_of_band_grant_reports_conflict_and_cleans_up() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let notebook = create_notebook(&mut conn, owner, "project x");
    create_note(&mut conn, owner, notebook, "kickoff");
    let invite = create_invite(&mut conn, owner, notebook, receiver);

    // Access arrives through another path between creation and acceptance.
    access::grant_access(&conn, notebook, receiver).unwrap();
    access::mirror_notebook_access(&mut conn, notebook).unwrap();

    {
        let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
        let mut service = InviteService::new(repo);
        let err = service.accept_invite(receiver, invite).unwrap_err();
        assert!(matches!(err, InviteServiceError::AlreadyMember { .. }));
        assert_eq!(err.kind(), FailureKind::Conflict);

        // The stale invite was consumed as cleanup.
        assert!(service.list_received_invites(receiver).unwrap().is_empty());
    }

    // The losing path must not duplicate the membership.
    let members = access::load_notebook_access(&conn, notebook).unwrap();
    assert_eq!(members.iter().filter(|id| **id == receiver).count(), 1);
}

#[test]
fn notebook_invite_listing_is_membership_gated() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "a@example.com", "A");
    let receiver = seed_user(&conn, "b@example.com", "B");
    let stranger = seed_user(&conn, "c@example.com", "C");
    let notebook = create_notebook(&mut conn, owner, "project x");
    create_invite(&mut conn, owner, notebook, receiver);

    let repo = SqliteInviteRepository::try_new(&mut conn).unwrap();
    let service = InviteService::new(repo);

    let listed = service.list_notebook_invites(owner, notebook).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].receiver.uuid, receiver);
    assert_eq!(listed[0].inviter.email, "a@example.com");

    let err = service
        .list_notebook_invites(stranger, notebook)
        .unwrap_err();
    assert!(matches!(err, InviteServiceError::NoAccess { .. }));

    let inbox = service.list_received_invites(receiver).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notebook_uuid, notebook);
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
                color: "#336699".to_string(),
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

fn create_invite(
    conn: &mut Connection,
    inviter: UserId,
    notebook: NotebookId,
    receiver: UserId,
) -> InviteId {
    let repo = SqliteInviteRepository::try_new(conn).unwrap();
    let service = InviteService::new(repo);
    service
        .create_invite(inviter, notebook, receiver)
        .unwrap()
        .uuid
}
