//! JWT strategy resolved through the loader

use std::sync::Arc;

use chrono::Utc;
use oauthmux_gateway::oauth::{Manager, StrategyKind};
use oauthmux_gateway::{DefaultManagerFactory, LoaderConfig, OAuthLoader};
use oauthmux_storage::InMemoryOAuthServerRepository;
use serde_json::json;
use tests::{fixtures, jwt, RecordingRouteTable};

const KEY: &[u8] = b"test_secret_key_that_is_32_bytes";

fn jwt_server(name: &str) -> oauthmux_core::OAuthServerConfig {
    let mut config = fixtures::default_server(name);
    config.token_strategy.name = "JWT".to_string();
    config.token_strategy.settings = json!({
        "signing_methods": [{"alg": "HS256", "key": std::str::from_utf8(KEY).unwrap()}],
        "leeway": 5
    });
    config
}

#[tokio::test]
async fn test_loaded_spec_carries_jwt_manager() {
    let table = Arc::new(RecordingRouteTable::new());
    let repo = InMemoryOAuthServerRepository::with_servers(vec![jwt_server("jwt")]);
    let loader = OAuthLoader::new(
        table.clone(),
        Arc::new(DefaultManagerFactory::new()),
        &LoaderConfig::default(),
    );

    let summary = loader.load(&repo).await.unwrap();
    assert_eq!(table.len(), 2);

    let manager = summary.specs[0].manager();
    assert_eq!(manager.kind(), StrategyKind::Jwt);

    let valid = jwt::sign_hs256(&json!({"sub": "user", "exp": Utc::now().timestamp() + 300}), KEY);
    assert!(manager.is_key_authorised(&valid).await);

    let expired = jwt::sign_hs256(&json!({"sub": "user", "exp": Utc::now().timestamp() - 300}), KEY);
    assert!(!manager.is_key_authorised(&expired).await);

    let forged = jwt::sign_hs256(&json!({"sub": "admin"}), b"another_key");
    assert!(!manager.is_key_authorised(&forged).await);
}

#[tokio::test]
async fn test_unsupported_algorithm_skips_server() {
    let table = Arc::new(RecordingRouteTable::new());
    let mut config = jwt_server("jwt");
    config.token_strategy.settings = json!({"signing_methods": [{"alg": "RS256", "key": "pem"}]});
    let repo = InMemoryOAuthServerRepository::with_servers(vec![config, fixtures::default_server("basic")]);
    let loader = OAuthLoader::new(
        table.clone(),
        Arc::new(DefaultManagerFactory::new()),
        &LoaderConfig::default(),
    );

    let summary = loader.load(&repo).await.unwrap();

    assert_eq!(summary.skipped_servers.len(), 1);
    assert!(summary.skipped_servers[0].reason.contains("RS256"));
    assert!(table.routes_for("jwt").is_empty());
    assert_eq!(table.routes_for("basic").len(), 2);
}
