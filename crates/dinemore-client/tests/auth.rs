//! Integration tests for the sign-in flows using wiremock HTTP mocks.

use std::sync::Arc;

use dinemore_client::{ApiClient, ClientError, DinerLogin, MemoryStore, SessionStore};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ApiClient {
    let session = SessionStore::new(Arc::new(MemoryStore::new()));
    ApiClient::with_base_url(base_url, 30, "dinemore-test", session)
        .expect("client construction should not fail")
}

fn diner_json() -> serde_json::Value {
    serde_json::json!({
        "id": "d-1",
        "name": "Esi",
        "phone": "+233201234567",
        "userType": "diner"
    })
}

#[tokio::test]
async fn diner_flow_requests_and_verifies_otp() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/check-token"))
        .and(body_json(serde_json::json!({ "phone": "+233201234567" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hasValidToken": false })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/request-otp"))
        .and(body_json(serde_json::json!({ "phone": "+233201234567" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "smsSent": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .and(body_json(
            serde_json::json!({ "phone": "+233201234567", "otp": "123456" }),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "user": diner_json() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut flow = DinerLogin::new();

    flow.submit_phone(&client, " +233201234567 ").await.unwrap();
    assert!(matches!(
        flow,
        DinerLogin::OtpSent { ref phone, sms_sent: true } if phone == "+233201234567"
    ));
    assert!(client.session().get_stored_auth().is_none());

    let user = flow.submit_otp(&client, "123456").await.unwrap();
    assert_eq!(user.id, "d-1");
    assert_eq!(flow.user().map(|u| u.id.as_str()), Some("d-1"));

    let stored = client.session().get_stored_auth().unwrap();
    assert_eq!(stored.user_id, "d-1");
    assert_eq!(stored.user_type, "diner");
}

#[tokio::test]
async fn valid_token_skips_otp() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/check-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hasValidToken": true,
            "user": diner_json()
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/request-otp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut flow = DinerLogin::new();
    flow.submit_phone(&client, "+233201234567").await.unwrap();

    assert!(matches!(flow, DinerLogin::Authenticated { .. }));
    assert_eq!(client.session().get_stored_auth().unwrap().user_id, "d-1");
}

#[tokio::test]
async fn blank_phone_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());
    let mut flow = DinerLogin::new();

    let err = flow.submit_phone(&client, "   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(matches!(flow, DinerLogin::PhoneEntry));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn verifying_without_requested_otp_sends_nothing() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());
    let mut flow = DinerLogin::new();

    let err = flow.submit_otp(&client, "123456").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_otp_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());
    let mut flow = DinerLogin::awaiting_otp("+233201234567");

    let err = flow.submit_otp(&client, "").await.unwrap_err();
    assert_eq!(err.to_string(), "OTP is required");
    assert!(matches!(flow, DinerLogin::OtpSent { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_otp_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid or expired OTP"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut flow = DinerLogin::awaiting_otp("+233201234567");
    let err = flow.submit_otp(&client, "000000").await.unwrap_err();

    assert_eq!(err.to_string(), "400: Invalid or expired OTP");
    assert!(matches!(flow, DinerLogin::OtpSent { .. }));
    assert!(client.session().get_stored_auth().is_none());
}

#[tokio::test]
async fn admin_login_persists_admin_identity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(
            serde_json::json!({ "email": "owner@dinemore.test", "password": "s3cret" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": {
                "id": 7,
                "name": "Owner",
                "email": "owner@dinemore.test",
                "userType": "restaurant_admin",
                "restaurantId": "r-1"
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let user = client
        .sign_in_admin("owner@dinemore.test", "s3cret")
        .await
        .unwrap();

    assert_eq!(user.restaurant_id.as_deref(), Some("r-1"));
    let stored = client.session().get_stored_auth().unwrap();
    assert_eq!(stored.user_id, "7");
    assert_eq!(stored.user_type, "restaurant_admin");
}

#[tokio::test]
async fn admin_login_with_diner_account_is_role_mismatch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "user": diner_json() })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .sign_in_admin("esi@dinemore.test", "pw")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RoleMismatch { ref user_type } if user_type == "diner"));
    assert!(client.session().get_stored_auth().is_none());
}

#[tokio::test]
async fn admin_login_with_bad_credentials_is_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .sign_in_admin("owner@dinemore.test", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "401: Invalid credentials");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn admin_login_requires_credentials() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());

    let err = client.sign_in_admin("", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "email is required");
    let err = client
        .sign_in_admin("owner@dinemore.test", "")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "password is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_login_with_blank_user_id_is_not_reported_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "id": "", "userType": "restaurant_admin", "restaurantId": "r-1" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .sign_in_admin("owner@dinemore.test", "s3cret")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Storage(_)));
    assert!(client.session().get_stored_auth().is_none());
}
