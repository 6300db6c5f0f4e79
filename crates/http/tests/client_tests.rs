//! Integration tests for the ERP HTTP client

mod common;

use common::FlakyStore;
use erp_core::{ACCESS_KEY, CredentialStore, MemoryStore, REFRESH_KEY, SessionState};
use erp_http::client::Resource;
use erp_http::types::{DashboardStats, Listing, RegisterRequest, User};
use erp_http::{ApiClient, ClientConfig, ClientError};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn authenticated_client(server: &MockServer) -> ApiClient {
    let store = Arc::new(MemoryStore::new());
    store.set(ACCESS_KEY, "tok-A").unwrap();
    store.set(REFRESH_KEY, "ref-B").unwrap();
    ApiClient::builder()
        .base_url(server.uri())
        .store(store)
        .build()
        .unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct DailyLog {
    id: u32,
    site: u32,
    weather: String,
}

#[tokio::test]
async fn test_client_builder() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8000/api/")
        .login_path("/signin")
        .build();

    assert!(client.is_ok());
    let client = client.unwrap();
    assert_eq!(client.base_url(), "http://localhost:8000/api/");
    assert_eq!(client.session().login_path(), "/signin");
    assert!(client.session().state().is_logged_out());
}

#[tokio::test]
async fn test_client_builder_rejects_invalid_base_url() {
    let result = ApiClient::builder().base_url("not a url").build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_sub_second_timeout_is_kept() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8000/api/")
        .timeout(Duration::from_millis(250))
        .build()
        .unwrap();
    assert_eq!(client.config().timeout_secs, Some(1));

    let client = ApiClient::builder()
        .base_url("http://localhost:8000/api/")
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    assert_eq!(client.config().timeout_secs, Some(30));
}

#[tokio::test]
async fn test_client_from_config() {
    let config = ClientConfig {
        base_url: "https://erp.example.com/api/".to_string(),
        login_path: "/auth/login".to_string(),
        ..ClientConfig::default()
    };
    let client = ApiClient::builder().config(config.clone()).build().unwrap();
    assert_eq!(client.config(), &config);
    assert_eq!(client.session().login_path(), "/auth/login");
}

#[tokio::test]
async fn test_list_paginated_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/daily-logs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "next": format!("{}/daily-logs/?page=2", mock_server.uri()),
            "previous": null,
            "results": [{ "id": 1, "site": 4, "weather": "rain" }]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/daily-logs/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "next": null,
            "previous": format!("{}/daily-logs/", mock_server.uri()),
            "results": [{ "id": 2, "site": 4, "weather": "sun" }]
        })))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let logs = client.resource(Resource::DailyLogs);

    let first: Listing<DailyLog> = logs.list().await.unwrap();
    assert_eq!(first.total(), 41);
    assert_eq!(first.items()[0].weather, "rain");

    let second = logs.next_page(&first).await.unwrap().unwrap();
    assert_eq!(second.items()[0].id, 2);
    assert!(logs.next_page(&second).await.unwrap().is_none());

    let explicit: Listing<DailyLog> = logs.list_page(2).await.unwrap();
    assert_eq!(explicit, second);
}

#[tokio::test]
async fn test_list_plain_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/site-inspections/"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "status": "passed" },
            { "id": 2, "status": "failed" }
        ])))
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let listing: Listing = client.resource(Resource::SiteInspections).list().await.unwrap();

    assert_eq!(listing.total(), 2);
    assert_eq!(listing.into_items()[1]["status"], "failed");
}

#[tokio::test]
async fn test_resource_crud() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/purchase-requests/"))
        .and(body_json(json!({ "title": "Rebar", "quantity": 200 })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": 5, "title": "Rebar" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/purchase-requests/5/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "title": "Rebar" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/purchase-requests/5/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "title": "Steel rebar" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/purchase-requests/5/"))
        .and(body_json(json!({ "status": "approved" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "status": "approved" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/purchase-requests/5/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let requests = client.resource(Resource::PurchaseRequests);

    let created: Value = requests
        .create(&json!({ "title": "Rebar", "quantity": 200 }))
        .await
        .unwrap();
    assert_eq!(created["id"], 5);

    let fetched: Value = requests.get(5).await.unwrap();
    assert_eq!(fetched["title"], "Rebar");

    let updated: Value = requests
        .update(5, &json!({ "title": "Steel rebar", "quantity": 200 }))
        .await
        .unwrap();
    assert_eq!(updated["title"], "Steel rebar");

    let patched: Value = requests.patch(5, &json!({ "status": "approved" })).await.unwrap();
    assert_eq!(patched["status"], "approved");

    requests.delete(5).await.unwrap();
}

#[tokio::test]
async fn test_error_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reports/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "title": ["required"] })))
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let reports = client.resource(Resource::Reports);

    let err = reports.get::<Value>(99).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref m) if m == "Not found."));
    assert_eq!(err.status(), Some(404));

    let err = reports.create::<Value, _>(&json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::BadRequest(_)));
}

#[tokio::test]
async fn test_login_stores_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "tok-N", "refresh": "ref-N" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let credentials = client.login("foreman", "secret").await.unwrap();

    assert_eq!(credentials.access, "tok-N");
    assert_eq!(client.session().access_token().unwrap().as_deref(), Some("tok-N"));
    assert_eq!(client.session().refresh_token().unwrap().as_deref(), Some("ref-N"));
    assert_eq!(client.session().state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_rejected_login_is_not_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("No active account"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let err = client.login("foreman", "wrong").await.unwrap_err();

    assert!(matches!(err, ClientError::AuthenticationFailed(_)));
    assert!(client.session().state().is_logged_out());
}

#[tokio::test]
async fn test_logout_clears_credentials() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server);

    let redirect = client.logout();

    assert_eq!(redirect, "/login");
    assert_eq!(client.session().access_token().unwrap(), None);
    assert_eq!(client.session().refresh_token().unwrap(), None);
    assert!(client.session().state().is_logged_out());
}

#[tokio::test]
async fn test_current_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accounts/users/me/"))
        .and(header("authorization", "Bearer tok-A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "username": "foreman",
            "email": "foreman@site.local",
            "role": "site_engineer",
            "first_name": "Ada",
            "last_name": "Builder",
            "date_joined": "2024-03-01T08:00:00Z"
        })))
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let user: User = client.current_user().await.unwrap();

    assert_eq!(user.username, "foreman");
    assert_eq!(user.role.as_deref(), Some("site_engineer"));
}

#[tokio::test]
async fn test_dashboard_stats_tolerates_failing_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 12, "next": null, "previous": null, "results": []
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/employees/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/equipment/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let stats = client.dashboard_stats().await.unwrap();

    assert_eq!(
        stats,
        DashboardStats {
            projects: 12,
            employees: 2,
            equipment: 0,
        }
    );
}

#[tokio::test]
async fn test_dashboard_stats_reports_invalidated_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let err = client.dashboard_stats().await.unwrap_err();
    assert!(err.is_session_invalidated());
}

#[tokio::test]
async fn test_logout_with_failing_store_still_logs_out() {
    let mock_server = MockServer::start().await;
    let store = Arc::new(FlakyStore::with_tokens());
    let client = ApiClient::builder()
        .base_url(mock_server.uri())
        .store(store.clone())
        .build()
        .unwrap();
    let mut state = client.subscribe();
    store.fail_removes();

    let redirect = client.logout();

    assert_eq!(redirect, "/login");
    assert!(client.session().state().is_logged_out());
    state.changed().await.unwrap();
    assert!(state.borrow().is_logged_out());
}

#[tokio::test]
async fn test_register_account() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts/register/"))
        .and(body_json(json!({
            "email": "lina@site.example",
            "password": "s3cure-pass",
            "role": "engineer",
            "first_name": "Lina",
            "last_name": "Haddad"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "username": "lina",
            "email": "lina@site.example",
            "role": "engineer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let registration = RegisterRequest {
        role: "engineer".to_string(),
        first_name: "Lina".to_string(),
        last_name: "Haddad".to_string(),
        ..RegisterRequest::new("lina@site.example", "s3cure-pass")
    };
    let user = client.register(&registration).await.unwrap();

    assert_eq!(user.username, "lina");
    assert_eq!(user.role.as_deref(), Some("engineer"));
    // Registering does not log in
    assert!(client.session().state().is_logged_out());
    assert_eq!(client.session().access_token().unwrap(), None);
}

#[tokio::test]
async fn test_rejected_registration_is_not_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts/register/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "email": ["user with this email already exists."] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "tok-C" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = authenticated_client(&mock_server);
    let err = client
        .register(&RegisterRequest::new("lina@site.example", "s3cure-pass"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::BadRequest(_)));
    assert_eq!(client.session().state(), SessionState::Authenticated);
}
