use super::*;

#[test]
fn cost_is_clamped_to_bcrypt_range() {
    assert_eq!(PasswordHasher::new(0).cost(), 4);
    assert_eq!(PasswordHasher::new(10).cost(), 10);
    assert_eq!(PasswordHasher::new(99).cost(), 31);
}

#[tokio::test]
async fn hash_then_verify_round_trip() {
    let hasher = PasswordHasher::new(4);
    let hash = hasher.hash("hunter2").await.expect("hash");
    assert!(hasher.verify("hunter2", &hash).await.expect("verify"));
}

#[tokio::test]
async fn hash_salts_each_call() {
    let hasher = PasswordHasher::new(4);
    let first = hasher.hash("hunter2").await.expect("hash");
    let second = hasher.hash("hunter2").await.expect("hash");
    assert_ne!(first, second);
    assert!(hasher.verify("hunter2", &first).await.expect("verify"));
    assert!(hasher.verify("hunter2", &second).await.expect("verify"));
}

#[tokio::test]
async fn verify_mismatch_is_false_not_error() {
    let hasher = PasswordHasher::new(4);
    let hash = hasher.hash("hunter2").await.expect("hash");
    assert!(!hasher.verify("*******", &hash).await.expect("verify"));
}

#[tokio::test]
async fn verify_malformed_stored_hash_is_error() {
    let hasher = PasswordHasher::new(4);
    let err = hasher
        .verify("hunter2", "not-a-bcrypt-hash")
        .await
        .expect_err("should reject malformed hash");
    assert!(matches!(err, HashError::MalformedHash));
}

#[tokio::test]
async fn hash_output_embeds_prefix_and_cost() {
    let hasher = PasswordHasher::new(4);
    let hash = hasher.hash("hunter2").await.expect("hash");
    assert!(hash.starts_with("$2"));
    assert!(hash.contains("$04$"));
}

#[tokio::test]
async fn empty_plaintext_hashes_fine() {
    let hasher = PasswordHasher::new(4);
    let hash = hasher.hash("").await.expect("hash");
    assert!(hasher.verify("", &hash).await.expect("verify"));
    assert!(!hasher.verify("x", &hash).await.expect("verify"));
}
