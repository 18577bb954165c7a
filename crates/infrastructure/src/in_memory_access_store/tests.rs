use chrono::{Duration, Utc};
use ventra_application::{
    AccessRepository, AuthorizationRepository, CompanyRepository, CreateRoleInput,
    InviteRepository, UpdateRoleInput,
};
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::{InviteStatus, Permission};

use super::InMemoryAccessStore;

fn must<T>(result: AppResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("unexpected error: {error}"),
    }
}

fn must_some<T>(option: Option<T>) -> T {
    match option {
        Some(value) => value,
        None => panic!("expected a value, got none"),
    }
}

fn alice() -> UserIdentity {
    UserIdentity::new("alice", "Alice", "alice@example.com")
}

fn dana() -> UserIdentity {
    UserIdentity::new("dana", "Dana", "dana@example.com")
}

async fn bootstrap_company(store: &InMemoryAccessStore) -> CompanyId {
    let company_id = CompanyId::new();
    must(
        store
            .create_company_with_owner(company_id, "Acme Supplies", "wholesale", &alice())
            .await,
    );
    company_id
}

#[tokio::test]
async fn bootstrap_grants_creator_every_catalog_permission() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let membership = must_some(must(
        store.find_active_membership(company_id, "alice").await,
    ));
    let permissions = must(
        store
            .list_permissions_for_membership(company_id, membership.membership_id)
            .await,
    );

    for permission in Permission::all() {
        assert!(
            permissions.contains(permission),
            "owner is missing '{}'",
            permission.as_str()
        );
    }
}

#[tokio::test]
async fn bootstrap_creates_system_owner_role() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let roles = must(store.list_roles(company_id).await);
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "Owner");
    assert!(roles[0].is_system);
}

#[tokio::test]
async fn duplicate_company_name_conflicts() {
    let store = InMemoryAccessStore::new();
    bootstrap_company(&store).await;

    let result = store
        .create_company_with_owner(CompanyId::new(), "Acme Supplies", "", &dana())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn clerk_role_grants_view_but_not_create() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView],
                },
            )
            .await,
    );
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );
    must(store.accept_invite(invite.invite_id, &dana(), Utc::now()).await);

    let membership = must_some(must(
        store.find_active_membership(company_id, "dana").await,
    ));
    let permissions = must(
        store
            .list_permissions_for_membership(company_id, membership.membership_id)
            .await,
    );

    assert!(permissions.contains(&Permission::ItemView));
    assert!(!permissions.contains(&Permission::ItemCreate));
}

#[tokio::test]
async fn replacing_grants_with_empty_set_revokes_everything() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView, Permission::ItemEdit],
                },
            )
            .await,
    );

    let updated = must(
        store
            .update_role(
                company_id,
                clerk.role_id,
                UpdateRoleInput {
                    permissions: Some(vec![]),
                    ..UpdateRoleInput::default()
                },
            )
            .await,
    );

    assert!(updated.permissions.is_empty());
}

#[tokio::test]
async fn duplicate_role_name_conflicts_on_create_and_rename() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![],
                },
            )
            .await,
    );

    let duplicate = store
        .create_role(
            company_id,
            CreateRoleInput {
                name: "Clerk".to_owned(),
                description: String::new(),
                permissions: vec![],
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let rename = store
        .update_role(
            company_id,
            clerk.role_id,
            UpdateRoleInput {
                name: Some("Owner".to_owned()),
                ..UpdateRoleInput::default()
            },
        )
        .await;
    assert!(matches!(rename, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn second_pending_invite_for_same_email_conflicts() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let role = must(store.list_roles(company_id).await)[0].clone();
    let expires = Utc::now() + Duration::days(7);

    must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                role.role_id,
                "",
                expires,
            )
            .await,
    );
    let second = store
        .create_invite(
            company_id,
            "alice",
            "dana@example.com",
            role.role_id,
            "",
            expires,
        )
        .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn accept_returns_company_and_only_succeeds_once() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView],
                },
            )
            .await,
    );
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );

    let accepted = must(store.accept_invite(invite.invite_id, &dana(), Utc::now()).await);
    assert_eq!(accepted.company_id, company_id);
    assert_eq!(accepted.company_name, "Acme Supplies");

    let second = store.accept_invite(invite.invite_id, &dana(), Utc::now()).await;
    assert!(matches!(second, Err(AppError::InvalidOperation(_))));
}

#[tokio::test]
async fn accepting_expired_invite_persists_expired_status() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let role = must(store.list_roles(company_id).await)[0].clone();
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                role.role_id,
                "",
                Utc::now() + Duration::days(1),
            )
            .await,
    );

    let late = Utc::now() + Duration::days(2);
    let result = store.accept_invite(invite.invite_id, &dana(), late).await;
    assert!(matches!(result, Err(AppError::InvalidOperation(_))));

    let stored = must_some(must(store.find_invite(invite.invite_id).await));
    assert_eq!(stored.status, InviteStatus::Expired);
}

#[tokio::test]
async fn declining_expired_invite_still_records_decline() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let role = must(store.list_roles(company_id).await)[0].clone();
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                role.role_id,
                "",
                Utc::now() + Duration::days(1),
            )
            .await,
    );

    let late = Utc::now() + Duration::days(2);
    let declined = must(store.decline_invite(invite.invite_id, &dana(), late).await);
    assert_eq!(declined.status, InviteStatus::Declined);
    assert_eq!(declined.responded_at, Some(late));

    let stored = must_some(must(store.find_invite(invite.invite_id).await));
    assert_eq!(stored.status, InviteStatus::Declined);
}

#[tokio::test]
async fn repeated_grant_keys_collapse_to_one_grant() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;

    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![
                        Permission::ItemView,
                        Permission::ItemView,
                        Permission::RoleView,
                    ],
                },
            )
            .await,
    );
    assert_eq!(
        clerk.permissions,
        vec![Permission::ItemView, Permission::RoleView]
    );

    let reread = must_some(must(store.find_role(company_id, clerk.role_id).await));
    assert_eq!(reread.permissions, clerk.permissions);
}

#[tokio::test]
async fn accept_requires_matching_invitee_email() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let role = must(store.list_roles(company_id).await)[0].clone();
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                role.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );

    let stranger = UserIdentity::new("mallory", "Mallory", "mallory@example.com");
    let result = store.accept_invite(invite.invite_id, &stranger, Utc::now()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn removed_member_is_reactivated_by_accepting_a_new_invite() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView],
                },
            )
            .await,
    );
    let first = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );
    let joined = must(store.accept_invite(first.invite_id, &dana(), Utc::now()).await);

    must(
        store
            .deactivate_membership(company_id, joined.membership_id)
            .await,
    );
    assert!(must(store.find_active_membership(company_id, "dana").await).is_none());

    let second = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );
    let rejoined = must(store.accept_invite(second.invite_id, &dana(), Utc::now()).await);

    // Same membership row flips back to active rather than duplicating.
    assert_eq!(rejoined.membership_id, joined.membership_id);
    assert!(must(store.find_active_membership(company_id, "dana").await).is_some());
}

#[tokio::test]
async fn decline_and_cancel_are_terminal() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let role = must(store.list_roles(company_id).await)[0].clone();
    let expires = Utc::now() + Duration::days(7);

    let declined = must(
        store
            .create_invite(company_id, "alice", "dana@example.com", role.role_id, "", expires)
            .await,
    );
    let record = must(
        store
            .decline_invite(declined.invite_id, &dana(), Utc::now())
            .await,
    );
    assert_eq!(record.status, InviteStatus::Declined);

    let cancel_after_decline = store.cancel_invite(declined.invite_id).await;
    assert!(matches!(
        cancel_after_decline,
        Err(AppError::InvalidOperation(_))
    ));

    let cancelled = must(
        store
            .create_invite(company_id, "alice", "erin@example.com", role.role_id, "", expires)
            .await,
    );
    let record = must(store.cancel_invite(cancelled.invite_id).await);
    assert_eq!(record.status, InviteStatus::Cancelled);

    let accept_after_cancel = store
        .accept_invite(
            cancelled.invite_id,
            &UserIdentity::new("erin", "Erin", "erin@example.com"),
            Utc::now(),
        )
        .await;
    assert!(matches!(
        accept_after_cancel,
        Err(AppError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn assign_role_replaces_previous_assignment() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView],
                },
            )
            .await,
    );
    let manager = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Manager".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView, Permission::ItemEdit],
                },
            )
            .await,
    );
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );
    let joined = must(store.accept_invite(invite.invite_id, &dana(), Utc::now()).await);

    must(
        store
            .assign_role_to_membership(company_id, joined.membership_id, manager.role_id)
            .await,
    );

    let member = must_some(must(
        store.find_team_member(company_id, joined.membership_id).await,
    ));
    let role = must_some(member.role);
    assert_eq!(role.role_id, manager.role_id);

    let permissions = must(
        store
            .list_permissions_for_membership(company_id, joined.membership_id)
            .await,
    );
    assert!(permissions.contains(&Permission::ItemEdit));
}

#[tokio::test]
async fn deleting_a_role_revokes_permissions_but_keeps_membership() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let clerk = must(
        store
            .create_role(
                company_id,
                CreateRoleInput {
                    name: "Clerk".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ItemView],
                },
            )
            .await,
    );
    let invite = must(
        store
            .create_invite(
                company_id,
                "alice",
                "dana@example.com",
                clerk.role_id,
                "",
                Utc::now() + Duration::days(7),
            )
            .await,
    );
    let joined = must(store.accept_invite(invite.invite_id, &dana(), Utc::now()).await);

    must(store.delete_role(company_id, clerk.role_id).await);

    let member = must_some(must(
        store.find_team_member(company_id, joined.membership_id).await,
    ));
    assert!(member.role.is_none());

    let permissions = must(
        store
            .list_permissions_for_membership(company_id, joined.membership_id)
            .await,
    );
    assert!(permissions.is_empty());
}

#[tokio::test]
async fn inactive_membership_resolves_no_permissions() {
    let store = InMemoryAccessStore::new();
    let company_id = bootstrap_company(&store).await;
    let membership = must_some(must(
        store.find_active_membership(company_id, "alice").await,
    ));

    must(
        store
            .deactivate_membership(company_id, membership.membership_id)
            .await,
    );

    let permissions = must(
        store
            .list_permissions_for_membership(company_id, membership.membership_id)
            .await,
    );
    assert!(permissions.is_empty());
}
