//! Router tests against an in-memory database.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use database::Database;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::routes;
use crate::state::AppState;
use crate::storage::{AvatarStorage, LocalAvatarStorage};

struct TestApp {
    router: Router,
    avatars: Arc<LocalAvatarStorage>,
    _dir: TempDir,
}

async fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();

    let avatars = Arc::new(LocalAvatarStorage::new(dir.path(), "http://localhost/avatars"));
    let config = Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        avatar_dir: dir.path().to_path_buf(),
        avatar_base_url: "http://localhost/avatars".to_string(),
        session_ttl: Duration::from_secs(3600),
        session_sweep_interval: Duration::from_secs(900),
        support_email: "help@example.com".to_string(),
    };
    let state = AppState::new(db, avatars.clone(), config);

    TestApp {
        router: routes::router().with_state(state),
        avatars,
        _dir: dir,
    }
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    text: String,
}

impl Reply {
    fn json(&self) -> Value {
        if self.text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&self.text).unwrap()
        }
    }
}

impl TestApp {
    async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Body, content_type: &str) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        Reply {
            status,
            headers,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(method, uri, token, Body::from(body.to_string()), "application/json")
            .await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request("GET", uri, token, Body::empty(), "application/json")
            .await
    }

    async fn text(&self, uri: &str, token: &str, body: &str) -> Reply {
        self.request("POST", uri, Some(token), Body::from(body.to_string()), "text/plain")
            .await
    }

    async fn sign_up(&self, email: &str) -> String {
        let reply = self
            .json(
                "POST",
                "/api/auth/sign-up",
                None,
                json!({ "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
        reply.json()["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let reply = app.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "database": true,
        })
    );
}

#[tokio::test]
async fn test_sign_up_sign_in_and_session() {
    let app = app().await;
    let token = app.sign_up("Asha@Example.com").await;

    let session = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.json()["user"]["email"], "asha@example.com");
    assert_eq!(session.json()["profile"]["email"], "asha@example.com");

    let duplicate = app
        .json(
            "POST",
            "/api/auth/sign-up",
            None,
            json!({ "email": "asha@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(duplicate.json()["fields"][0]["field"], "email");

    let wrong = app
        .json(
            "POST",
            "/api/auth/sign-in",
            None,
            json!({ "email": "asha@example.com", "password": "nope1234" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let signed_in = app
        .json(
            "POST",
            "/api/auth/sign-in",
            None,
            json!({ "email": "ASHA@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(signed_in.status, StatusCode::OK);
    let second = signed_in.json()["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    let out = app.json("POST", "/api/auth/sign-out", Some(&token), json!({})).await;
    assert_eq!(out.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get("/api/auth/session", Some(&token)).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/auth/session", Some(&second)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_sign_up_validation() {
    let app = app().await;
    let reply = app
        .json(
            "POST",
            "/api/auth/sign-up",
            None,
            json!({ "email": "not-an-email", "password": "123" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<String> = reply.json()["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_contacts_require_session() {
    let app = app().await;
    assert_eq!(
        app.get("/api/contacts", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/contacts", Some("bogus")).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_contact_crud_and_search() {
    let app = app().await;
    let token = app.sign_up("asha@example.com").await;

    let invalid = app
        .json(
            "POST",
            "/api/contacts",
            Some(&token),
            json!({ "full_name": "Ra", "phone_number": "12345", "expected_wage": "abc" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(invalid.json()["fields"].as_array().unwrap().len(), 3);

    let created = app
        .json(
            "POST",
            "/api/contacts",
            Some(&token),
            json!({ "full_name": "Ravi Kumar", "phone_number": "9876543210", "occupation_1": "Mason" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text);
    let id = created.json()["id"].as_str().unwrap().to_string();

    app.json(
        "POST",
        "/api/contacts",
        Some(&token),
        json!({ "full_name": "Sita Devi", "phone_number": "8123456789" }),
    )
    .await;

    let all = app.get("/api/contacts", Some(&token)).await.json();
    let names: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ravi Kumar", "Sita Devi"]);

    let found = app.get("/api/contacts?q=sita", Some(&token)).await.json();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["phone_number"], "8123456789");

    let updated = app
        .json(
            "PUT",
            &format!("/api/contacts/{id}"),
            Some(&token),
            json!({ "full_name": "Ravi Kumar", "phone_number": "9876543210", "address": "Guntur" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["address"], "Guntur");
    assert_eq!(updated.json()["occupation_1"], "");

    let deleted = app
        .request("DELETE", &format!("/api/contacts/{id}"), Some(&token), Body::empty(), "application/json")
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app.get(&format!("/api/contacts/{id}"), Some(&token)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    let remaining = app.get("/api/contacts", Some(&token)).await.json();
    assert_eq!(remaining.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contacts_are_private_to_owner() {
    let app = app().await;
    let asha = app.sign_up("asha@example.com").await;
    let bala = app.sign_up("bala@example.com").await;

    let created = app
        .json(
            "POST",
            "/api/contacts",
            Some(&asha),
            json!({ "full_name": "Ravi Kumar", "phone_number": "9876543210" }),
        )
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    assert_eq!(
        app.get(&format!("/api/contacts/{id}"), Some(&bala)).await.status,
        StatusCode::NOT_FOUND
    );
    let listed = app.get("/api/contacts", Some(&bala)).await.json();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_import_preview_import_and_export() {
    let app = app().await;
    let token = app.sign_up("asha@example.com").await;
    let file = "Phone\tName\tAddress\n9876543210\tRavi\tGuntur\n\n8123456789\tSita\tVijayawada, AP\n7000000000\t\tNowhere\n";

    let preview = app.text("/api/contacts/import/preview", &token, file).await;
    assert_eq!(preview.status, StatusCode::OK, "{}", preview.text);
    let preview = preview.json();
    assert_eq!(preview["valid_rows"], 2);
    assert_eq!(preview["rejected_rows"], 1);
    assert_eq!(preview["delimiter"], "tab");
    assert_eq!(preview["first_record"]["full_name"], "Ravi");
    assert!(app
        .get("/api/contacts", Some(&token))
        .await
        .json()
        .as_array()
        .unwrap()
        .is_empty());

    let imported = app.text("/api/contacts/import", &token, file).await;
    assert_eq!(imported.status, StatusCode::CREATED);
    assert_eq!(imported.json(), json!({ "imported": 2, "rejected_rows": 1 }));

    let export = app.get("/api/contacts/export?format=csv", Some(&token)).await;
    assert_eq!(export.status, StatusCode::OK);
    let disposition = export.headers[CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"contacts_export_"));
    assert!(disposition.ends_with(".csv\""));
    let lines: Vec<&str> = export.text.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "Ravi,9876543210,Guntur,,,,,,,");
    assert_eq!(lines[2], "Sita,8123456789,\"Vijayawada, AP\",,,,,,,");

    let tsv = app.get("/api/contacts/export?format=excel", Some(&token)).await;
    assert!(tsv.headers[CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".xls\""));
    assert!(tsv.text.starts_with("Name\tPhone\t"));

    let bad = app.get("/api/contacts/export?format=pdf", Some(&token)).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_without_valid_rows() {
    let app = app().await;
    let token = app.sign_up("asha@example.com").await;

    let reply = app
        .text("/api/contacts/import", &token, "First,Last\nRavi,Kumar\n")
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = reply.json();
    assert_eq!(body["rows_read"], 1);
    assert_eq!(body["expected_headers"][0], "Name");
    assert_eq!(body["expected_headers"][1], "Phone Number");
}

#[tokio::test]
async fn test_profile_update_and_avatar() {
    let app = app().await;
    let token = app.sign_up("asha@example.com").await;

    let updated = app
        .json("PUT", "/api/profile", Some(&token), json!({ "full_name": "Asha Rao" }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["full_name"], "Asha Rao");

    let short = app
        .json("PUT", "/api/profile", Some(&token), json!({ "full_name": "As" }))
        .await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);

    let blank = app
        .json("PUT", "/api/profile", Some(&token), json!({ "full_name": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(blank.json()["fields"][0]["field"], "full_name");
    assert_eq!(blank.json()["fields"][0]["message"], "Name is required");
    let kept = app.get("/api/profile", Some(&token)).await;
    assert_eq!(kept.json()["full_name"], "Asha Rao");

    let image = base64::engine::general_purpose::STANDARD.encode(b"fake png bytes");
    let first = app
        .json(
            "PUT",
            "/api/profile/avatar",
            Some(&token),
            json!({ "data": format!("data:image/png;base64,{image}") }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.text);
    let url = first.json()["avatar_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost/avatars/"));
    assert!(url.ends_with(".png"));

    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = app
        .json(
            "PUT",
            "/api/profile/avatar",
            Some(&token),
            json!({ "data": image, "content_type": "image/jpeg" }),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert!(second.json()["avatar_url"].as_str().unwrap().ends_with(".jpg"));

    let user_id = app.get("/api/auth/session", Some(&token)).await.json()["user"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(app.avatars.list(&user_id).await.unwrap().len(), 1);

    let bad = app
        .json("PUT", "/api/profile/avatar", Some(&token), json!({ "data": "!!!" }))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_account_requires_password() {
    let app = app().await;
    let token = app.sign_up("asha@example.com").await;
    app.json(
        "POST",
        "/api/contacts",
        Some(&token),
        json!({ "full_name": "Ravi Kumar", "phone_number": "9876543210" }),
    )
    .await;

    let wrong = app
        .json("DELETE", "/api/account", Some(&token), json!({ "password": "wrong" }))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/auth/session", Some(&token)).await.status, StatusCode::OK);

    let deleted = app
        .json("DELETE", "/api/account", Some(&token), json!({ "password": "secret123" }))
        .await;
    assert_eq!(deleted.status, StatusCode::OK, "{}", deleted.text);
    assert_eq!(deleted.json(), json!({ "deleted_contacts": 1 }));

    assert_eq!(
        app.get("/api/auth/session", Some(&token)).await.status,
        StatusCode::UNAUTHORIZED
    );
    let sign_in = app
        .json(
            "POST",
            "/api/auth/sign-in",
            None,
            json!({ "email": "asha@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(sign_in.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bug_report_link() {
    let app = app().await;
    let reply = app.get("/api/support/bug-report", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["email"], "help@example.com");
    assert_eq!(body["subject"], "Bug Report - Contact Manager App");
    assert!(body["mailto"]
        .as_str()
        .unwrap()
        .starts_with("mailto:help@example.com?subject=Bug%20Report"));
}
