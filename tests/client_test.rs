//! Integration tests for O365Client.

use async_trait::async_trait;
use o365_mail::*;
use std::sync::Arc;
use std::time::Duration;

const PLAIN_BUNDLE: &[u8] = include_bytes!("fixtures/app-plain.pem");
const ENCRYPTED_BUNDLE: &[u8] = include_bytes!("fixtures/app-encrypted.pem");
const THUMBPRINT: &str = "DC222883B1A93330595B62E182A77B930DFF33DD";

struct TestClient {
    client: O365Client<MockIdentityProvider, MockHttpTransport>,
    identity: Arc<MockIdentityProvider>,
    transport: Arc<MockHttpTransport>,
    logger: Arc<InMemoryLogger>,
}

fn test_options() -> O365AuthenticationOptions {
    o365_options()
        .client_id("configured-client")
        .client_secret("configured-secret")
        .tenant_name("contoso.onmicrosoft.com")
        .from_address("noreply@contoso.com")
        .build()
        .unwrap()
}

fn create_test_client(options: O365AuthenticationOptions) -> TestClient {
    create_test_client_with_store(options, InMemoryCertificateStore::new())
}

fn create_test_client_with_store(
    options: O365AuthenticationOptions,
    store: InMemoryCertificateStore,
) -> TestClient {
    let identity = Arc::new(MockIdentityProvider::new());
    let transport = Arc::new(MockHttpTransport::with_status(202));
    let logger = Arc::new(InMemoryLogger::new());
    let client = O365Client::with_components(
        options,
        identity.clone(),
        transport.clone(),
        Arc::new(store),
        logger.clone(),
    );

    TestClient {
        client,
        identity,
        transport,
        logger,
    }
}

fn valid_message() -> Message {
    MessageBuilder::new()
        .subject("Build finished")
        .html("<p>All green.</p>")
        .to("dev@contoso.com")
        .build()
}

fn missing_argument(err: &O365Error) -> Option<&str> {
    match err {
        O365Error::Validation(ValidationError::MissingArgument { name }) => Some(name.as_str()),
        _ => None,
    }
}

#[tokio::test]
async fn test_login_rejects_empty_arguments_without_identity_call() {
    let t = create_test_client(test_options());

    for (resource, client_id, secret, expected) in [
        ("", "c", "s", "resource"),
        ("r", "", "s", "client_id"),
        ("r", "c", "", "client_secret"),
    ] {
        let err = t.client.login(resource, client_id, secret).await.unwrap_err();
        assert_eq!(missing_argument(&err), Some(expected));
        assert!(err.is_caller_error());
    }

    assert_eq!(t.identity.request_count(), 0);
}

#[tokio::test]
async fn test_login_success_returns_token() {
    let t = create_test_client(test_options());
    t.identity.queue_token("T");

    let result = t
        .client
        .login(MAIL_RESOURCE, "login-client", "login-secret")
        .await
        .unwrap();

    assert_eq!(result.access_token(), "T");
    assert!(result.success());
    assert_eq!(result.status_code(), 200);

    let requests = t.identity.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authority,
        "https://login.microsoftonline.com/contoso.onmicrosoft.com"
    );
    assert_eq!(requests[0].resource, "https://outlook.office.com");
    // Arguments win over the configured client id.
    assert_eq!(requests[0].client_id, "login-client");
    assert_eq!(requests[0].credential_kind, "client_secret");
}

#[tokio::test]
async fn test_login_identity_failure_logs_once() {
    let t = create_test_client(test_options());
    t.identity.queue_error(O365Error::Provider(ProviderError::InvalidClient {
        error_description: Some("AADSTS7000215: Invalid client secret is provided.".to_string()),
    }));

    let result = t.client.login(MAIL_RESOURCE, "c", "wrong").await.unwrap();

    assert_eq!(result.access_token(), "");
    assert!(!result.success());
    assert_eq!(result.status_code(), -1);

    let errors = t.logger.get_entries_by_level(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context.operation.as_deref(), Some("login"));
    assert!(errors[0]
        .context
        .error
        .as_deref()
        .unwrap()
        .contains("AADSTS7000215"));
    assert!(!t.client.is_authenticated().await);
}

#[tokio::test]
async fn test_send_before_login_is_rejected() {
    let t = create_test_client(test_options());

    let err = t
        .client
        .send_email(&valid_message(), true, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O365Error::Validation(ValidationError::NotAuthenticated)
    ));
    assert_eq!(err.to_string(), "Validation error: You must login before sending email");
    assert_eq!(t.transport.request_count(), 0);
}

#[tokio::test]
async fn test_send_success() {
    let t = create_test_client(test_options());
    t.transport.queue_response(HttpResponse::with_status(200));
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let result = t
        .client
        .send_email(&valid_message(), true, None)
        .await
        .unwrap();

    assert_eq!(result, ApiResult::new(200));
    assert_eq!(result.status_code(), 200);
    assert!(result.success());
    assert!(t.logger.get_entries_by_level(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn test_send_wire_request() {
    let t = create_test_client(test_options());
    t.identity.queue_token("token-abc");
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let message = MessageBuilder::new()
        .subject("Hello")
        .html("<b>Hi</b>")
        .to("a@contoso.com")
        .to("b@contoso.com")
        .build();
    t.client.send_email(&message, false, None).await.unwrap();

    let request = t.transport.get_last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(
        request.url,
        "https://outlook.office.com/api/v2.0/users/noreply@contoso.com/sendmail"
    );
    assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    assert_eq!(request.get_header("Authorization"), Some("Bearer token-abc"));
    assert_eq!(
        request.get_header("Content-Type"),
        Some("application/json; charset=utf-8")
    );
    assert!(request
        .get_header("User-Agent")
        .unwrap()
        .starts_with("o365-mail/"));
    assert!(request.get_header("Date").unwrap().ends_with(" GMT"));

    let request_id = request.get_header("client-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());

    let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "Message": {
                "Subject": "Hello",
                "Body": {"ContentType": "Html", "Content": "<b>Hi</b>"},
                "ToRecipients": [
                    {"EmailAddress": {"Address": "a@contoso.com"}},
                    {"EmailAddress": {"Address": "b@contoso.com"}}
                ]
            },
            "SaveToSentItems": false
        })
    );
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let t = create_test_client(test_options());
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    t.client.send_email(&valid_message(), true, None).await.unwrap();
    t.client.send_email(&valid_message(), true, None).await.unwrap();

    let requests = t.transport.get_requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(
        requests[0].get_header("client-request-id"),
        requests[1].get_header("client-request-id")
    );
}

#[tokio::test]
async fn test_send_transport_failure_logs_once() {
    let t = create_test_client(test_options());
    t.transport
        .queue_error(O365Error::Network(NetworkError::ConnectionFailed {
            message: "connection reset".to_string(),
        }));
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let result = t
        .client
        .send_email(&valid_message(), true, None)
        .await
        .unwrap();

    assert_eq!(result.status_code(), -1);
    assert!(!result.success());

    let errors = t.logger.get_entries_by_level(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.to_lowercase().contains("failed to send the message"));
    assert!(errors[0]
        .context
        .error
        .as_deref()
        .unwrap()
        .contains("connection reset"));
}

#[tokio::test]
async fn test_send_rejected_status_is_not_success() {
    let t = create_test_client(test_options());
    t.transport.queue_response(HttpResponse::with_status(403));
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let result = t
        .client
        .send_email(&valid_message(), true, None)
        .await
        .unwrap();

    assert_eq!(result.status_code(), 403);
    assert!(!result.success());
}

#[tokio::test]
async fn test_send_rejects_invalid_messages() {
    let t = create_test_client(test_options());
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let no_recipients = MessageBuilder::new().subject("s").html("b").build();
    let err = t
        .client
        .send_email(&no_recipients, true, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        O365Error::Validation(ValidationError::InvalidRecipients { ref message }) if message == "no recipients"
    ));

    let empty_address = MessageBuilder::new()
        .subject("s")
        .html("b")
        .to("ok@contoso.com")
        .to("")
        .build();
    let err = t
        .client
        .send_email(&empty_address, true, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        O365Error::Validation(ValidationError::InvalidRecipients { ref message }) if message.contains("invalid recipient address")
    ));

    let no_subject = MessageBuilder::new().html("b").to("ok@contoso.com").build();
    let err = t
        .client
        .send_email(&no_subject, true, None)
        .await
        .unwrap_err();
    assert_eq!(missing_argument(&err), Some("subject"));

    let no_body = MessageBuilder::new().subject("s").to("ok@contoso.com").build();
    let err = t.client.send_email(&no_body, true, None).await.unwrap_err();
    assert_eq!(missing_argument(&err), Some("body"));

    assert_eq!(t.transport.request_count(), 0);
}

#[tokio::test]
async fn test_second_login_overwrites_token() {
    let t = create_test_client(test_options());
    t.identity.queue_token("first").queue_token("second");

    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();
    t.client.send_email(&valid_message(), true, None).await.unwrap();

    let request = t.transport.get_last_request().unwrap();
    assert_eq!(request.get_header("authorization"), Some("Bearer second"));
}

#[tokio::test]
async fn test_failed_login_keeps_previous_token() {
    let t = create_test_client(test_options());
    t.identity
        .queue_token("good")
        .queue_error(O365Error::Provider(ProviderError::ServerError {
            message: "AADSTS90033".to_string(),
        }));

    assert!(t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap().success());
    assert!(!t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap().success());
    t.client.send_email(&valid_message(), true, None).await.unwrap();

    let request = t.transport.get_last_request().unwrap();
    assert_eq!(request.get_header("authorization"), Some("Bearer good"));
}

#[tokio::test]
async fn test_send_cancelled_before_start() {
    let t = create_test_client(test_options());
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = t
        .client
        .send_email(&valid_message(), true, Some(&cancel))
        .await
        .unwrap();

    assert_eq!(result, ApiResult::failed());
    assert_eq!(t.transport.request_count(), 0);
    assert_eq!(t.logger.get_entries_by_level(LogLevel::Warn).len(), 1);
    assert!(t.logger.get_entries_by_level(LogLevel::Error).is_empty());
}

/// Transport that never answers.
struct StalledTransport;

#[async_trait]
impl HttpTransport for StalledTransport {
    async fn send(&self, _request: HttpRequest) -> O365Result<HttpResponse> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_send_cancelled_in_flight() {
    let identity = Arc::new(MockIdentityProvider::new());
    let logger = Arc::new(InMemoryLogger::new());
    let client = O365Client::with_components(
        test_options(),
        identity,
        Arc::new(StalledTransport),
        Arc::new(InMemoryCertificateStore::new()),
        logger.clone(),
    );
    client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = client
        .send_email(&valid_message(), true, Some(&cancel))
        .await
        .unwrap();

    assert_eq!(result.status_code(), -1);
    assert_eq!(logger.get_entries_by_level(LogLevel::Warn).len(), 1);
}

#[tokio::test]
async fn test_login_with_certificate_bytes() {
    let t = create_test_client(test_options());

    let result = t
        .client
        .login_with_certificate_bytes(MAIL_RESOURCE, ENCRYPTED_BUNDLE, "fixture-password", "cert-app")
        .await
        .unwrap();

    assert!(result.success());
    let requests = t.identity.get_requests();
    assert_eq!(requests[0].client_id, "cert-app");
    assert_eq!(requests[0].credential_kind, "certificate");
}

#[tokio::test]
async fn test_login_with_certificate_bytes_wrong_password() {
    let t = create_test_client(test_options());

    let err = t
        .client
        .login_with_certificate_bytes(MAIL_RESOURCE, ENCRYPTED_BUNDLE, "nope", "cert-app")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O365Error::Credential(CredentialError::DecryptionFailed { .. })
    ));
    assert_eq!(t.identity.request_count(), 0);
}

#[tokio::test]
async fn test_login_with_thumbprint() {
    let store = InMemoryCertificateStore::new();
    store.add(CertificateBundle::from_pem(PLAIN_BUNDLE).unwrap());
    let t = create_test_client_with_store(test_options(), store);

    let result = t
        .client
        .login_with_thumbprint(MAIL_RESOURCE, "thumb-app", &THUMBPRINT.to_lowercase())
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(t.identity.get_requests()[0].credential_kind, "certificate");
}

#[tokio::test]
async fn test_login_with_unknown_thumbprint_is_fatal() {
    let t = create_test_client(test_options());

    let err = t
        .client
        .login_with_thumbprint(MAIL_RESOURCE, "thumb-app", THUMBPRINT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O365Error::Configuration(ConfigurationError::CertificateNotFound { .. })
    ));
    assert_eq!(t.identity.request_count(), 0);
}

#[tokio::test]
async fn test_initialize_for_app_mail_prefers_thumbprint() {
    let store = InMemoryCertificateStore::new();
    store.add(CertificateBundle::from_pem(PLAIN_BUNDLE).unwrap());
    let options = o365_options()
        .client_id("app")
        .tenant_name("contoso.onmicrosoft.com")
        .from_address("noreply@contoso.com")
        .cert_bytes(ENCRYPTED_BUNDLE.to_vec())
        .cert_thumbprint(THUMBPRINT)
        .build()
        .unwrap();
    let t = create_test_client_with_store(options, store);

    let result = t.client.initialize_for_app_mail().await.unwrap();

    assert!(result.success());
    let requests = t.identity.get_requests();
    assert_eq!(requests[0].resource, MAIL_RESOURCE);
    assert_eq!(requests[0].client_id, "app");
}

#[tokio::test]
async fn test_initialize_for_app_mail_with_certificate_bytes() {
    let options = o365_options()
        .client_id("app")
        .tenant_name("contoso.onmicrosoft.com")
        .from_address("noreply@contoso.com")
        .cert_bytes(ENCRYPTED_BUNDLE.to_vec())
        .cert_private_key("fixture-password")
        .build()
        .unwrap();
    let t = create_test_client(options);

    let result = t.client.initialize_for_app_mail().await.unwrap();

    assert!(result.success());
    assert_eq!(t.identity.get_requests()[0].credential_kind, "certificate");
}

#[tokio::test]
async fn test_initialize_for_app_mail_without_certificate() {
    let t = create_test_client(test_options());

    let err = t.client.initialize_for_app_mail().await.unwrap_err();

    assert_eq!(missing_argument(&err), Some("cert_bytes"));
}

#[tokio::test]
async fn test_end_to_end_with_azure_ad_provider() {
    let transport = Arc::new(MockHttpTransport::new());
    transport
        .queue_json_response(
            200,
            &serde_json::json!({"token_type": "Bearer", "access_token": "aad-token"}),
        )
        .queue_response(HttpResponse::with_status(202));

    let identity = Arc::new(AzureAdIdentityProvider::with_transport(transport.clone()));
    let client = O365Client::with_components(
        test_options(),
        identity,
        transport.clone(),
        Arc::new(InMemoryCertificateStore::new()),
        Arc::new(NoOpLogger),
    );

    let login = client.login(MAIL_RESOURCE, "c", "s").await.unwrap();
    assert_eq!(login.access_token(), "aad-token");

    let result = client.send_email(&valid_message(), true, None).await.unwrap();
    assert_eq!(result.status_code(), 202);

    let requests = transport.get_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].url.ends_with("/contoso.onmicrosoft.com/oauth2/token"));
    assert_eq!(
        requests[1].get_header("authorization"),
        Some("Bearer aad-token")
    );
}

#[tokio::test]
async fn test_whitespace_recipient_reaches_transport() {
    let t = create_test_client(test_options());
    t.client.login(MAIL_RESOURCE, "c", "s").await.unwrap();

    let message = MessageBuilder::new()
        .subject("s")
        .html("b")
        .to(" ")
        .build();
    let result = t.client.send_email(&message, true, None).await.unwrap();

    assert_eq!(result.status_code(), 202);
    assert_eq!(t.transport.request_count(), 1);
}

#[tokio::test]
async fn test_thumbprint_login_validation_order() {
    let t = create_test_client(test_options());

    for (resource, client_id, thumbprint, expected) in [
        ("", "c", THUMBPRINT, "resource"),
        ("r", "", THUMBPRINT, "client_id"),
        ("r", "c", "", "thumbprint"),
    ] {
        let err = t
            .client
            .login_with_thumbprint(resource, client_id, thumbprint)
            .await
            .unwrap_err();
        assert_eq!(missing_argument(&err), Some(expected));
    }

    assert_eq!(t.identity.request_count(), 0);
}

#[tokio::test]
async fn test_certificate_bytes_login_requires_resource() {
    let t = create_test_client(test_options());

    let err = t
        .client
        .login_with_certificate_bytes("", ENCRYPTED_BUNDLE, "fixture-password", "cert-app")
        .await
        .unwrap_err();

    assert_eq!(missing_argument(&err), Some("resource"));
    assert_eq!(t.identity.request_count(), 0);
}

#[tokio::test]
async fn test_thumbprint_login_unlocks_encrypted_store_key() {
    let store = InMemoryCertificateStore::new();
    store.add(CertificateBundle::from_pem(ENCRYPTED_BUNDLE).unwrap());
    let options = o365_options()
        .client_id("app")
        .tenant_name("contoso.onmicrosoft.com")
        .from_address("noreply@contoso.com")
        .cert_thumbprint(THUMBPRINT)
        .cert_private_key("fixture-password")
        .build()
        .unwrap();
    let t = create_test_client_with_store(options, store);

    let result = t.client.initialize_for_app_mail().await.unwrap();

    assert!(result.success());
    assert_eq!(t.identity.get_requests()[0].credential_kind, "certificate");
}

#[tokio::test]
async fn test_thumbprint_login_encrypted_store_key_without_password() {
    let store = InMemoryCertificateStore::new();
    store.add(CertificateBundle::from_pem(ENCRYPTED_BUNDLE).unwrap());
    let t = create_test_client_with_store(test_options(), store);

    let err = t
        .client
        .login_with_thumbprint(MAIL_RESOURCE, "app", THUMBPRINT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O365Error::Credential(CredentialError::DecryptionFailed { .. })
    ));
    assert_eq!(t.identity.request_count(), 0);
}
