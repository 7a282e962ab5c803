//! Router tests for the lead endpoint, driven through `tower::ServiceExt::oneshot`.

mod mocks;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use brevo_lead_server::client::AsyncBrevoClient;
use brevo_lead_server::config::Config;
use brevo_lead_server::metrics::Metrics;
use brevo_lead_server::server::{build_router, AppState};
use brevo_lead_server::services::{LeadService, LeadServiceImpl};
use http_body_util::BodyExt;
use mocks::MockBrevoClient;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        brevo_api_key: Some("test-api-key".to_string()),
        static_dir: "does-not-exist".to_string(),
        ..Config::default()
    }
}

fn app_with(mock: &MockBrevoClient, config: Config) -> Router {
    let metrics = Metrics::new();
    let client = Arc::new(mock.clone()) as Arc<dyn AsyncBrevoClient>;
    let service = LeadServiceImpl::with_client(&config, client, metrics.clone());
    let state = AppState::new(config, Some(Arc::new(service) as Arc<dyn LeadService>), metrics);
    build_router(state)
}

fn app(mock: &MockBrevoClient) -> Router {
    app_with(mock, test_config())
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_submit_json_lead() {
    let mock = MockBrevoClient::new();

    let response = app(&mock)
        .oneshot(json_request(
            "/api/brevo",
            json!({
                "name": "Jane Doe",
                "email": "Jane@Example.com",
                "phone": "+34 600 111 222",
                "company": "Acme",
                "message": "Hello"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "jane@example.com");
    assert_eq!(body["data"]["step"], "CREATE");
    assert_eq!(body["data"]["contactId"], 1);

    let stored = mock.contact("jane@example.com").unwrap();
    assert_eq!(stored.attributes.get("LASTNAME").unwrap(), "Doe");
}

#[tokio::test]
async fn test_submit_spanish_form_fields() {
    let mock = MockBrevoClient::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "Nombre=Mar%C3%ADa+L%C3%B3pez&Email=maria%40example.es&Telefono=600111222&Empresa=Acme&Mensaje=Hola",
        ))
        .unwrap();

    let response = app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = mock.contact("maria@example.es").unwrap();
    assert_eq!(stored.attributes.get("FIRSTNAME").unwrap(), "María");
    assert_eq!(stored.attributes.get("LASTNAME").unwrap(), "López");
    assert_eq!(stored.attributes.get("COMPANY").unwrap(), "Acme");
}

#[tokio::test]
async fn test_numeric_phone_is_accepted() {
    let mock = MockBrevoClient::new();

    let response = app(&mock)
        .oneshot(json_request(
            "/api/brevo",
            json!({"Nombre": "Jane Doe", "Email": "jane@example.com", "Telefono": 34600111222u64}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = mock.contact("jane@example.com").unwrap();
    assert_eq!(stored.attributes.get("SMS").unwrap(), "+34600111222");
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let mock = MockBrevoClient::new();

    let response = app(&mock)
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "not-an-email"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("email"));
    assert_eq!(body["field"], "email");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_short_name_is_rejected() {
    let mock = MockBrevoClient::new();

    let response = app(&mock)
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "J", "email": "jane@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "name");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let mock = MockBrevoClient::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/brevo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid request body");
    assert!(body.get("field").is_none());
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let mock = MockBrevoClient::new();

    let request = Request::builder()
        .method("GET")
        .uri("/api/brevo")
        .body(Body::empty())
        .unwrap();

    let response = app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_api_key_fails_without_contacting_crm() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let config = Config {
        brevo_api_key: None,
        brevo_api_url: server.url(),
        static_dir: "does-not-exist".to_string(),
        ..Config::default()
    };
    let app = build_router(AppState::from_config(config));

    // Even an invalid lead gets the configuration error
    for body in [
        json!({"name": "Jane Doe", "email": "jane@example.com"}),
        json!({"name": "", "email": "not-an-email"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("/api/brevo", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Server configuration error");
    }

    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_submit_through_real_client() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/contacts")
        .match_header("api-key", "test-api-key")
        .with_status(400)
        .with_body(r#"{"code": "duplicate_parameter", "message": "Contact already exist"}"#)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/contacts/jane%40example.com")
        .with_status(204)
        .create_async()
        .await;

    let config = Config {
        brevo_api_url: server.url(),
        ..test_config()
    };
    let app = build_router(AppState::from_config(config));

    let response = app
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com"}),
        ))
        .await
        .unwrap();

    create.assert_async().await;
    update.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["step"], "UPDATE_BY_EMAIL");
    assert_eq!(body["data"]["contactId"], Value::Null);
    assert_eq!(body["data"]["calls"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upstream_failure_is_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _create = server
        .mock("POST", "/contacts")
        .with_status(401)
        .with_body(r#"{"code": "unauthorized", "message": "Key not found"}"#)
        .create_async()
        .await;

    let config = Config {
        brevo_api_url: server.url(),
        ..test_config()
    };
    let app = build_router(AppState::from_config(config));

    let response = app
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "CRM error: Key not found");
    assert!(!body.to_string().contains("test-api-key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unresponsive_crm_is_server_error() {
    // Accepts connections into the backlog but never answers
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let config = Config {
        brevo_api_url: format!("http://{}", addr),
        request_timeout: 1,
        ..test_config()
    };
    let app = build_router(AppState::from_config(config));

    let started = std::time::Instant::now();
    let response = app
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Error communicating with CRM");
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(listener);
}

#[tokio::test]
async fn test_phone_conflict_is_reported_in_message() {
    let mock = MockBrevoClient::new();
    mock.add_contact("office@example.com", &[("SMS", "+34600111222")]);

    let response = app(&mock)
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com", "phone": "+34600111222"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["step"], "CREATE_WITHOUT_PHONE");
    assert_eq!(body["data"]["note"], "phone_not_associated");
    assert!(body["message"].as_str().unwrap().contains("phone not associated"));
}

fn request_from(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
    let mut request = json_request(
        "/api/brevo",
        json!({"name": "Jane Doe", "email": "jane@example.com"}),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
    request
}

fn rate_limited_app(mock: &MockBrevoClient, trust_forwarded_for: bool) -> Router {
    let config = Config {
        rate_limit_max_requests: 2,
        trust_forwarded_for,
        ..test_config()
    };
    app_with(mock, config)
}

#[tokio::test]
async fn test_rate_limit_by_peer_address() {
    let mock = MockBrevoClient::new();
    let app = rate_limited_app(&mock, false);
    let peer = [192, 0, 2, 1];

    for _ in 0..2 {
        let response = app.clone().oneshot(request_from(peer, "203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app.clone().oneshot(request_from(peer, "203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(limited).await;
    assert_eq!(body["error"], "Too many requests, please try again later");

    // Another peer is unaffected
    let response = app
        .clone()
        .oneshot(request_from([192, 0, 2, 2], "203.0.113.7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.contact_count(), 1);
}

#[tokio::test]
async fn test_rotating_forwarded_for_is_still_limited() {
    let mock = MockBrevoClient::new();
    let app = rate_limited_app(&mock, false);
    let peer = [192, 0, 2, 1];

    let mut accepted = 0;
    for i in 0..20 {
        let forwarded_for = format!("198.51.100.{}", i);
        let response = app
            .clone()
            .oneshot(request_from(peer, &forwarded_for))
            .await
            .unwrap();
        if response.status() == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(accepted, 2);
}

#[tokio::test]
async fn test_trusted_forwarded_for_keys_by_header() {
    let mock = MockBrevoClient::new();
    let app = rate_limited_app(&mock, true);
    let proxy = [10, 0, 0, 1];

    for _ in 0..2 {
        let response = app.clone().oneshot(request_from(proxy, "203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = app.clone().oneshot(request_from(proxy, "203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    // Same proxy, different visitor
    let response = app
        .clone()
        .oneshot(request_from(proxy, "198.51.100.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let mock = MockBrevoClient::new();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["crmConfigured"], true);
    assert!(body["metrics"].is_object());
}

#[tokio::test]
async fn test_notification_is_sent_after_success() {
    let mock = MockBrevoClient::new();
    let config = Config {
        notify_email: Some("sales@example.com".to_string()),
        ..test_config()
    };

    let response = app_with(&mock, config)
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com", "message": "<b>Hi</b>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The notification runs in the background
    let mut emails = mock.sent_emails();
    for _ in 0..50 {
        if !emails.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        emails = mock.sent_emails();
    }

    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to[0].email, "sales@example.com");
    assert_eq!(emails[0].reply_to.as_ref().unwrap().email, "jane@example.com");
    assert!(emails[0].html_content.contains("&lt;b&gt;Hi&lt;/b&gt;"));
}

#[tokio::test]
async fn test_notification_failure_does_not_affect_response() {
    let mock = MockBrevoClient::new();
    mock.fail_emails();
    let config = Config {
        notify_email: Some("sales@example.com".to_string()),
        ..test_config()
    };

    let response = app_with(&mock, config)
        .oneshot(json_request(
            "/api/brevo",
            json!({"name": "Jane Doe", "email": "jane@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
