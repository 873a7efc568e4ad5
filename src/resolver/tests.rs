use super::*;
use crate::credentials::sample_record;
use chrono::Duration;

fn store_with(records: &[(&str, &str)]) -> Arc<TokenStore> {
    let store = Arc::new(TokenStore::new());
    for (user_id, token) in records {
        store.put(sample_record(user_id, token));
    }
    store
}

#[test]
fn test_stored_token_preferred() {
    let store = store_with(&[("42", "gho_user")]);
    let resolver = FallbackResolver::new(store, Some("ghp_static".to_string()));

    let resolution = resolver.resolve_credential(Some("42"));
    assert_eq!(resolution.token(), Some("gho_user"));
    assert_eq!(resolution.source(), Some("oauth"));
}

#[test]
fn test_static_fallback_for_unknown_user() {
    let store = store_with(&[("42", "gho_user")]);
    let resolver = FallbackResolver::new(store, Some("ghp_static".to_string()));

    let resolution = resolver.resolve_credential(Some("7"));
    assert_eq!(resolution.token(), Some("ghp_static"));
    assert_eq!(resolution.source(), Some("static"));
}

#[test]
fn test_static_fallback_without_user() {
    let resolver = FallbackResolver::new(store_with(&[]), Some("T".to_string()));

    assert_eq!(resolver.resolve_credential(None).token(), Some("T"));
}

#[test]
fn test_unauthenticated_when_nothing_configured() {
    let resolver = FallbackResolver::new(store_with(&[("42", "gho_user")]), None);

    assert_eq!(resolver.resolve_credential(Some("7")), Resolution::Unauthenticated);
    assert_eq!(resolver.resolve_credential(None), Resolution::Unauthenticated);
}

#[test]
fn test_empty_static_token_is_absent() {
    let resolver = FallbackResolver::new(store_with(&[]), Some(String::new()));
    assert_eq!(resolver.resolve_credential(None), Resolution::Unauthenticated);
}

#[test]
fn test_expired_record_falls_through() {
    let store = Arc::new(TokenStore::new());
    let mut record = sample_record("42", "gho_expired");
    record.expires_at = Some(Utc::now() - Duration::minutes(5));
    store.put(record);

    let resolver = FallbackResolver::new(Arc::clone(&store), Some("ghp_static".to_string()));
    assert_eq!(resolver.resolve_credential(Some("42")).source(), Some("static"));

    let resolver = FallbackResolver::new(store, None);
    assert_eq!(resolver.resolve_credential(Some("42")), Resolution::Unauthenticated);
}

#[test]
fn test_custom_chain_order() {
    struct Fixed(&'static str, &'static str);
    impl CredentialSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn lookup(&self, _user_id: Option<&str>) -> Lookup {
            Lookup::Found(self.1.to_string())
        }
    }

    let resolver = FallbackResolver::with_sources(vec![
        Box::new(StaticTokenSource::new(None)),
        Box::new(Fixed("first", "a")),
        Box::new(Fixed("second", "b")),
    ]);

    assert_eq!(resolver.resolve_credential(None).source(), Some("first"));
}

#[test]
fn test_debug_hides_token() {
    let resolution = Resolution::Authenticated {
        token: "gho_secret_value".to_string(),
        source: "oauth",
    };
    let rendered = format!("{:?}", resolution);
    assert!(!rendered.contains("gho_secret_value"));
    assert!(rendered.contains("oauth"));
}
