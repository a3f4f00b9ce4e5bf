//! End-to-end token lifecycle through the public API.

use std::sync::Arc;
use std::time::Duration;

use sealtoken::{
    ClaimValue, Claims, EncryptionKey, InMemoryRevocationStore, KeyVersion, ManualClock,
    ParseOptions, TokenConfig, TokenError, TokenService, VersionTable,
};

const HOUR: Duration = Duration::from_secs(3600);

fn version(claims: &[&str]) -> KeyVersion {
    KeyVersion::new(
        EncryptionKey::generate(),
        claims.iter().map(|c| c.to_string()).collect(),
    )
    .unwrap()
}

fn session_claims(user_id: i64) -> Claims {
    let mut claims = Claims::new();
    claims.insert("user_id".to_string(), ClaimValue::from(user_id));
    claims.insert("role".to_string(), ClaimValue::from("editor"));
    claims
}

#[tokio::test]
async fn test_rotation_keeps_old_tokens_valid() {
    let store = Arc::new(InMemoryRevocationStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let v1 = version(&["user_id", "role"]);

    let before = TokenService::builder("sessions")
        .versions(VersionTable::new(vec![v1.clone()]))
        .store(store.clone())
        .clock(clock.clone())
        .build()
        .unwrap();
    let old_token = before.create(&session_claims(1), HOUR).unwrap();

    // New active version with a different schema, old one retired
    let after = TokenService::builder("sessions")
        .versions(VersionTable::new(vec![v1]).rotate(version(&["user_id"])))
        .store(store)
        .clock(clock)
        .build()
        .unwrap();

    let parsed = after.parse(&old_token, ParseOptions::default()).await.unwrap();
    assert_eq!(parsed.claims, session_claims(1));

    let mut claims = Claims::new();
    claims.insert("user_id".to_string(), ClaimValue::from(2));
    let new_token = after.create(&claims, HOUR).unwrap();
    let parsed = after.parse(&new_token, ParseOptions::default()).await.unwrap();
    assert_eq!(parsed.get("user_id").and_then(ClaimValue::as_i64), Some(2));
    assert!(parsed.get("role").is_none());

    // The pre-rotation service knows nothing of the new key
    let err = before
        .parse(&new_token, ParseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidVersion));
}

#[tokio::test]
async fn test_revocation_is_shared_through_the_store() {
    let store = Arc::new(InMemoryRevocationStore::new());
    let versions = VersionTable::new(vec![version(&["user_id", "role"])]);

    let a = TokenService::builder("sessions")
        .versions(versions.clone())
        .store(store.clone())
        .build()
        .unwrap();
    let b = TokenService::builder("sessions")
        .versions(versions)
        .store(store)
        .build()
        .unwrap();

    let token = a.create(&session_claims(7), HOUR).unwrap();
    a.revoke(&token).await.unwrap();

    let err = b.parse(&token, ParseOptions::default()).await.unwrap_err();
    assert!(matches!(err, TokenError::Revoked));

    // Revoking twice is harmless
    a.revoke(&token).await.unwrap();
    b.revoke(&token).await.unwrap();
}

#[tokio::test]
async fn test_namespaces_do_not_share_revocations() {
    let store = Arc::new(InMemoryRevocationStore::new());
    let versions = VersionTable::new(vec![version(&["user_id", "role"])]);

    let sessions = TokenService::builder("sessions")
        .versions(versions.clone())
        .store(store.clone())
        .build()
        .unwrap();
    let invites = TokenService::builder("invites")
        .versions(versions)
        .store(store)
        .build()
        .unwrap();

    let token = sessions.create(&session_claims(3), HOUR).unwrap();
    sessions.revoke(&token).await.unwrap();

    assert!(invites.parse(&token, ParseOptions::default()).await.is_ok());
}

#[tokio::test]
async fn test_revocation_records_are_pruned_after_expiry() {
    let store = Arc::new(InMemoryRevocationStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let service = TokenService::builder("sessions")
        .versions(VersionTable::new(vec![version(&["user_id", "role"])]))
        .store(store.clone())
        .clock(clock.clone())
        .build()
        .unwrap();

    let short = service
        .create(&session_claims(1), Duration::from_secs(10))
        .unwrap();
    let long = service.create(&session_claims(2), HOUR).unwrap();
    service.revoke(&short).await.unwrap();
    assert_eq!(store.len(service.revocation_key()).await, 1);

    clock.advance(11);

    // Any revocation check prunes records past their expiry
    service.parse(&long, ParseOptions::default()).await.unwrap();
    assert_eq!(store.len(service.revocation_key()).await, 0);

    let err = service
        .parse(&short, ParseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TokenError::Expired { .. }));
}

/// Replaces the character at `index` with a different alphabet character.
fn flip(token: &str, index: usize) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    chars[index] = if chars[index] == 'a' { 'b' } else { 'a' };
    chars.into_iter().collect()
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let service = TokenService::builder("sessions")
        .versions(VersionTable::new(vec![version(&["user_id", "role"])]))
        .store(Arc::new(InMemoryRevocationStore::new()))
        .build()
        .unwrap();
    let token = service.create(&session_claims(1), HOUR).unwrap();

    // Leading characters carry the nonce, the middle the ciphertext, the end the tag
    for index in [0, 1, token.len() / 2, token.len() - 1] {
        let tampered = flip(&token, index);
        assert_ne!(tampered, token);

        let err = service
            .parse(&tampered, ParseOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                TokenError::MalformedToken { .. } | TokenError::InvalidVersion
            ),
            "index {index}: {err}"
        );
    }

    let err = service
        .parse(&format!("{token}!"), ParseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TokenError::MalformedToken { .. }));
}

#[tokio::test]
async fn test_service_from_toml() {
    let source = format!(
        r#"
namespace = "api"
default_ttl = "15m"

[[versions]]
key = "{}"
claims = ["user_id", "role"]

[cache]
max_capacity = 100
time_to_live = "5s"
"#,
        "0f".repeat(32)
    );

    let config = TokenConfig::from_toml_str(&source).unwrap();
    let service =
        TokenService::from_config(&config, Arc::new(InMemoryRevocationStore::new())).unwrap();

    let token = service.create_default(&session_claims(9)).unwrap();
    let parsed = service.parse(&token, ParseOptions::default()).await.unwrap();
    // created_at comes from the identifier and may trail the clock by a second
    assert!((900..=901).contains(&(parsed.expires_at - parsed.created_at)));
}
