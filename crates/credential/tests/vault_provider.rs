//! Vault provider against a mock KV v2 server.
//!
//! The provider uses a blocking client, so every resolution runs on the
//! blocking pool while the mock server lives on the async runtime.

use pretty_assertions::assert_eq;
use runlet_credential::{
    CredentialDescriptor, CredentialError, CredentialProvider, SecretPayload, VaultProvider,
    VaultSettings,
};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "s.valid";

async fn resolve(
    settings: VaultSettings,
    descriptor: CredentialDescriptor,
) -> Result<SecretPayload, CredentialError> {
    tokio::task::spawn_blocking(move || {
        let provider = VaultProvider::new(settings).expect("valid settings");
        provider.resolve(&descriptor)
    })
    .await
    .expect("resolution task panicked")
}

async fn mount_token_check(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .and(header("X-Vault-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ttl": 3600}})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn resolves_nested_data_payload() {
    // GIVEN a store holding secret/data/github/42
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/github/42"))
        .and(header("X-Vault-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"data": {"token": "ghp_x", "org": "acme"}, "metadata": {"version": 2}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN the connection is resolved
    let descriptor = CredentialDescriptor::new("github", "42", TOKEN, server.uri());
    let payload = resolve(VaultSettings::default(), descriptor).await.unwrap();

    // THEN only the innermost mapping is returned
    assert_eq!(Value::Object(payload), json!({"token": "ghp_x", "org": "acme"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_mount_changes_the_read_path() {
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/data/db/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"data": {"user": "app"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = VaultSettings {
        mount: "kv".into(),
        ..VaultSettings::default()
    };
    let descriptor = CredentialDescriptor::new("db", "7", TOKEN, server.uri());

    let payload = resolve(settings, descriptor).await.unwrap();
    assert_eq!(payload["user"], json!("app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_is_an_authentication_failure() {
    // GIVEN a store that rejects the token
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/github/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // WHEN resolving with a bad token
    let descriptor = CredentialDescriptor::new("github", "42", "s.expired", server.uri());
    let err = resolve(VaultSettings::default(), descriptor).await.unwrap_err();

    // THEN the secret is never read
    assert_eq!(err.code(), "CREDENTIAL:AUTH");
    assert_eq!(err.kind(), "CredentialResolutionError");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_store_is_an_authentication_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let descriptor = CredentialDescriptor::new("github", "42", TOKEN, uri);
    let err = resolve(VaultSettings { timeout_secs: 2, ..VaultSettings::default() }, descriptor)
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::Authentication { .. }), "{err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_secret_is_not_found() {
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/github/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let descriptor = CredentialDescriptor::new("github", "42", TOKEN, server.uri());
    let err = resolve(VaultSettings::default(), descriptor).await.unwrap_err();

    assert_eq!(
        err,
        CredentialError::SecretNotFound {
            connection: "github".into(),
            path: "secret/data/github/42".into(),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn response_without_inner_data_is_malformed() {
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/github/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"metadata": {}}})))
        .mount(&server)
        .await;

    let descriptor = CredentialDescriptor::new("github", "42", TOKEN, server.uri());
    let err = resolve(VaultSettings::default(), descriptor).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid secret structure, failed resolving 'github'"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_on_read_is_a_transport_failure() {
    let server = MockServer::start().await;
    mount_token_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/github/42"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let descriptor = CredentialDescriptor::new("github", "42", TOKEN, server.uri());
    let err = resolve(VaultSettings::default(), descriptor).await.unwrap_err();

    assert_eq!(err.code(), "CREDENTIAL:TRANSPORT");
}
