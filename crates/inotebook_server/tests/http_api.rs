use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use inotebook_core::{open_db_in_memory, Argon2Hasher, FsBlobStore, TokenCodec, TokenConfig};
use inotebook_server::build_router;
use inotebook_server::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "inotebook-test-boundary";
const MAX_UPLOAD_BYTES: usize = 1024;

struct Harness {
    app: Router,
    _uploads: TempDir,
}

impl Harness {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let codec =
            TokenCodec::new(TokenConfig::new("http-test-secret", Duration::from_secs(3600)).unwrap());
        let state = AppState::new(
            open_db_in_memory().unwrap(),
            codec,
            Arc::new(Argon2Hasher::with_params(64, 1, 1).unwrap()),
            FsBlobStore::open(uploads.path(), "http://localhost:4000/uploads").unwrap(),
            MAX_UPLOAD_BYTES,
        );
        Self {
            app: build_router(state),
            _uploads: uploads,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/user/signup",
                None,
                Some(json!({
                    "userName": "Ada",
                    "email": email,
                    "password": PASSWORD,
                    "phone": 5551234567u64,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/user/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut payload = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"me.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        payload.extend_from_slice(bytes);
        payload.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/images/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(payload))
            .unwrap();
        self.dispatch(request).await
    }
}

#[tokio::test]
async fn root_answers_health_text() {
    let harness = Harness::new();
    let response = harness
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Hello World!");
}

#[tokio::test]
async fn second_login_invalidates_first_token() {
    let harness = Harness::new();
    let first = harness.signup("ada@example.com").await;

    let (status, body) = harness
        .send(Method::GET, "/api/user/profile", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let second = harness.login("ada@example.com").await;

    let (status, body) = harness
        .send(Method::GET, "/api/user/profile", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "AUTH_STALE_EPOCH");

    let (status, _) = harness
        .send(Method::GET, "/api/user/profile", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let harness = Harness::new();
    let (status, body) = harness
        .send(Method::GET, "/api/notes/fetchAllNotes", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_MISSING");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_failures_are_unauthorized() {
    let harness = Harness::new();
    harness.signup("ada@example.com").await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email");
    assert_eq!(body["code"], "CREDENTIAL_MISMATCH");

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password-x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "CREDENTIAL_MISMATCH");
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let harness = Harness::new();
    harness.signup("ada@example.com").await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/user/signup",
            None,
            Some(json!({
                "userName": "Ada",
                "email": "ada@example.com",
                "password": PASSWORD,
                "phone": "5551234567",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let harness = Harness::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = harness.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn note_lifecycle_over_http() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/notes/addNote",
            Some(&token),
            Some(json!({ "title": "N", "description": "D" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["note"]["tag"], "General");
    let id = body["note"]["noteId"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(
            Method::PUT,
            &format!("/api/notes/editNote/{id}"),
            Some(&token),
            Some(json!({ "title": "N2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["title"], "N2");
    assert_eq!(body["note"]["tag"], "General");

    let (status, _) = harness
        .send(
            Method::PUT,
            &format!("/api/notes/deleteNote/{id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = harness
        .send(
            Method::PUT,
            &format!("/api/notes/editNote/{id}"),
            Some(&token),
            Some(json!({ "description": "D2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["state"], "recycled");

    let (_, active) = harness
        .send(Method::GET, "/api/notes/fetchAllNotes", Some(&token), None)
        .await;
    assert_eq!(active["notes"].as_array().unwrap().len(), 0);
    let (_, recycled) = harness
        .send(Method::GET, "/api/notes/fetchRecycleBin", Some(&token), None)
        .await;
    assert_eq!(recycled["notes"][0]["title"], "N2");
    assert_eq!(recycled["notes"][0]["description"], "D2");

    let (status, _) = harness
        .send(
            Method::DELETE,
            &format!("/api/notes/deletePermanent/{id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = harness
        .send(
            Method::GET,
            &format!("/api/notes/findNote/{id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn find_note_includes_author() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;
    let (_, body) = harness
        .send(
            Method::POST,
            "/api/notes/addNote",
            Some(&token),
            Some(json!({ "title": "N", "description": "D", "tag": "Work" })),
        )
        .await;
    let id = body["note"]["noteId"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(
            Method::GET,
            &format!("/api/notes/findNote/{id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["userName"], "Ada");
    assert_eq!(body["note"]["email"], "ada@example.com");
    assert_eq!(body["note"]["tag"], "Work");
}

#[tokio::test]
async fn unparsable_note_id_is_a_validation_error() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;
    let (status, body) = harness
        .send(Method::PUT, "/api/notes/deleteNote/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn image_upload_fetch_and_delete() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;

    let (status, body) = harness.upload(&token, "image/png", b"png-bytes").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let image_id = body["image"]["id"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(Method::GET, "/api/images/fetchImage", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageId"], image_id.as_str());
    let url = body["imageUrl"].as_str().unwrap();
    let key = url.rsplit('/').next().unwrap();

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/uploads/{key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"png-bytes");

    let (status, _) = harness
        .send(
            Method::DELETE,
            &format!("/api/images/delete/{image_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = harness
        .send(Method::GET, "/api/images/fetchImage", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_upload_rejects_type_and_size() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;

    let (status, body) = harness.upload(&token, "image/gif", b"gif").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let oversized = vec![7u8; MAX_UPLOAD_BYTES + 1];
    let (status, body) = harness.upload(&token, "image/png", &oversized).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn deleted_account_token_is_rejected() {
    let harness = Harness::new();
    let token = harness.signup("ada@example.com").await;
    harness
        .send(
            Method::POST,
            "/api/notes/addNote",
            Some(&token),
            Some(json!({ "title": "N", "description": "D" })),
        )
        .await;

    let (status, body) = harness
        .send(Method::DELETE, "/api/user/deleteUser", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notesRemoved"], 1);

    let (status, body) = harness
        .send(Method::GET, "/api/user/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "AUTH_ACCOUNT_NOT_FOUND");
}
