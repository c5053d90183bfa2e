use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::*;
use crate::state::test_helpers::{MemoryUserStore, TEST_BCRYPT_COST, seed_user};

fn directory(store: &Arc<MemoryUserStore>) -> UserDirectory {
    UserDirectory::new(store.clone(), PasswordHasher::new(TEST_BCRYPT_COST))
}

// =============================================================================
// normalize_email
// =============================================================================

#[test]
fn normalize_email_canonicalizes() {
    assert_eq!(
        normalize_email("  USER@Example.com "),
        Some("user@example.com".to_owned())
    );
}

#[test]
fn normalize_email_rejects_invalid_shapes() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("user"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("user@"), None);
    assert_eq!(normalize_email("a@b@c"), None);
}

// =============================================================================
// validate_credentials
// =============================================================================

#[tokio::test]
async fn malformed_email_short_circuits_before_store() {
    let store = Arc::new(MemoryUserStore::new());
    let dir = directory(&store);

    let check = dir.validate_credentials("not-an-email", "whatever").await;
    assert!(matches!(
        check,
        CredentialCheck::Rejected(RejectReason::MalformedEmail)
    ));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_user_and_wrong_password_share_a_reason() {
    let store = Arc::new(MemoryUserStore::new());
    seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    let missing = dir.validate_credentials("nobody@example.com", "secret").await;
    let wrong = dir.validate_credentials("alice@example.com", "not-secret").await;

    let CredentialCheck::Rejected(missing_reason) = missing else {
        panic!("missing user should be rejected");
    };
    let CredentialCheck::Rejected(wrong_reason) = wrong else {
        panic!("wrong password should be rejected");
    };
    assert_eq!(missing_reason, wrong_reason);
    assert_eq!(missing_reason.to_string(), wrong_reason.to_string());
}

#[tokio::test]
async fn correct_credentials_are_accepted() {
    let store = Arc::new(MemoryUserStore::new());
    let id = seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    let check = dir.validate_credentials("alice@example.com", "secret").await;
    let CredentialCheck::Accepted(user) = check else {
        panic!("valid login should be accepted");
    };
    assert_eq!(user.id, id);
    assert_eq!(user.email, "alice@example.com");
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let store = Arc::new(MemoryUserStore::new());
    seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    let check = dir.validate_credentials("  ALICE@Example.COM ", "secret").await;
    assert!(matches!(check, CredentialCheck::Accepted(_)));
}

#[tokio::test]
async fn store_failure_collapses_to_internal() {
    let store = Arc::new(MemoryUserStore::new());
    store.fail.store(true, Ordering::SeqCst);
    let dir = directory(&store);

    let check = dir.validate_credentials("alice@example.com", "secret").await;
    assert!(matches!(
        check,
        CredentialCheck::Rejected(RejectReason::Internal)
    ));
}

#[tokio::test]
async fn corrupt_stored_hash_collapses_to_internal() {
    let store = Arc::new(MemoryUserStore::new());
    store.insert(User {
        id: uuid::Uuid::new_v4(),
        email: "alice@example.com".to_owned(),
        password_hash: "not-a-bcrypt-hash".to_owned(),
    });
    let dir = directory(&store);

    let check = dir.validate_credentials("alice@example.com", "secret").await;
    assert!(matches!(
        check,
        CredentialCheck::Rejected(RejectReason::Internal)
    ));
}

#[test]
fn reject_reasons_render_terse_messages() {
    assert_eq!(RejectReason::MalformedEmail.to_string(), "malformed email");
    assert_eq!(RejectReason::InvalidCredentials.to_string(), "invalid credentials");
    assert_eq!(RejectReason::Internal.to_string(), "internal error");
}

// =============================================================================
// find_by_email
// =============================================================================

#[tokio::test]
async fn find_by_email_normalizes_before_querying() {
    let store = Arc::new(MemoryUserStore::new());
    let id = seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    let found = dir.find_by_email("ALICE@EXAMPLE.COM").await.expect("lookup");
    assert_eq!(found.map(|u| u.id), Some(id));
}

#[tokio::test]
async fn find_by_email_malformed_is_none_without_query() {
    let store = Arc::new(MemoryUserStore::new());
    let dir = directory(&store);

    let found = dir.find_by_email("no-at-sign").await.expect("lookup");
    assert!(found.is_none());
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

// =============================================================================
// change_password
// =============================================================================

#[tokio::test]
async fn change_password_rejects_wrong_current() {
    let store = Arc::new(MemoryUserStore::new());
    let id = seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    let err = dir
        .change_password(id, "not-secret", "brand-new")
        .await
        .expect_err("wrong current password should fail");
    assert!(matches!(err, PasswordChangeError::WrongPassword));
}

#[tokio::test]
async fn change_password_rejects_unknown_user() {
    let store = Arc::new(MemoryUserStore::new());
    let dir = directory(&store);

    let err = dir
        .change_password(uuid::Uuid::new_v4(), "secret", "brand-new")
        .await
        .expect_err("unknown user should fail");
    assert!(matches!(err, PasswordChangeError::WrongPassword));
}

#[tokio::test]
async fn change_password_rehashes_and_overwrites() {
    let store = Arc::new(MemoryUserStore::new());
    let id = seed_user(&store, "alice@example.com", "secret").await;
    let dir = directory(&store);

    dir.change_password(id, "secret", "brand-new")
        .await
        .expect("change should succeed");

    let old = dir.validate_credentials("alice@example.com", "secret").await;
    assert!(matches!(
        old,
        CredentialCheck::Rejected(RejectReason::InvalidCredentials)
    ));

    let new = dir.validate_credentials("alice@example.com", "brand-new").await;
    assert!(matches!(new, CredentialCheck::Accepted(_)));
}
