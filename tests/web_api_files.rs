//! Web API File Tests
//!
//! Integration tests for file metadata and the upload lifecycle.

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use folio::config::BlobConfig;
use folio::db::{NewProject, ProjectRepository};
use folio::library::{FileRepository, LocalBlobStore, TenantScope};
use folio::web::handlers::AppState;
use folio::web::middleware::{JwtClaims, JwtState};
use folio::web::router::create_router;
use folio::Database;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const JWT_SECRET: &str = "test-secret-key-for-testing-only";
const ORG_ID: i64 = 10;

struct TestContext {
    server: TestServer,
    db: Arc<Database>,
    project_id: i64,
    token: String,
    blob_root: Option<TempDir>,
}

impl TestContext {
    /// Build a server over an in-memory database, with or without blob storage.
    async fn new(with_blobs: bool) -> Self {
        let db = Arc::new(
            Database::open_in_memory()
                .await
                .expect("Failed to create test database"),
        );

        let mut app_state = AppState::new(db.clone(), vec!["admin".to_string()]);
        let blob_root = if with_blobs {
            let dir = TempDir::new().expect("Failed to create blob dir");
            let config = BlobConfig {
                enabled: true,
                root: dir.path().to_string_lossy().into_owned(),
                base_url: "http://localhost:8081/blobs".to_string(),
                signing_secret: "blob-secret".to_string(),
                ..Default::default()
            };
            let store = LocalBlobStore::new(&config).expect("Failed to create blob store");
            app_state = app_state.with_blob_store(Arc::new(store));
            Some(dir)
        } else {
            None
        };

        let jwt_state = Arc::new(JwtState::new(JWT_SECRET));
        let router = create_router(Arc::new(app_state), jwt_state, &[]);
        let server = TestServer::new(router).expect("Failed to create test server");

        let projects = ProjectRepository::new(db.pool());
        let project = projects
            .create(&NewProject::new(ORG_ID, "Tower A"))
            .await
            .expect("Failed to create project");
        projects
            .add_member(project.id, Some(1), None)
            .await
            .expect("Failed to add member");

        Self {
            server,
            db,
            project_id: project.id,
            token: token_for(1),
            blob_root,
        }
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn files_url(&self, file_id: i64) -> String {
        format!("/api/projects/{}/files/{}", self.project_id, file_id)
    }

    async fn create_folder(&self, name: &str) -> i64 {
        let response = self
            .server
            .post(&format!("/api/projects/{}/folders", self.project_id))
            .add_header(AUTHORIZATION, self.auth())
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }

    async fn request_upload(&self, folder_id: i64, body: Value) -> axum_test::TestResponse {
        self.server
            .post(&format!(
                "/api/projects/{}/folders/{}/files/upload",
                self.project_id, folder_id
            ))
            .add_header(AUTHORIZATION, self.auth())
            .json(&body)
            .await
    }

    /// Register an upload and return the pending file JSON.
    async fn pending_file(&self, folder_id: i64, filename: &str) -> Value {
        let response = self
            .request_upload(
                folder_id,
                json!({ "filename": filename, "content_type": "application/pdf", "size_bytes": 1024 }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["data"]["file"].clone()
    }

    /// Write the object the way the upload gateway would.
    async fn put_blob(&self, file_id: i64) {
        let scope = TenantScope::new(ORG_ID, self.project_id);
        let file = FileRepository::new(self.db.pool())
            .get_by_id(scope, file_id)
            .await
            .unwrap()
            .unwrap();
        let root = self.blob_root.as_ref().unwrap().path();
        let path = root.join(&file.blob_name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"%PDF-1.7").unwrap();
    }

    async fn complete(&self, file_id: i64) -> axum_test::TestResponse {
        self.server
            .post(&format!("{}/complete", self.files_url(file_id)))
            .add_header(AUTHORIZATION, self.auth())
            .await
    }

    /// Register, upload, and complete a file. Returns its ID.
    async fn ready_file(&self, folder_id: i64, filename: &str) -> i64 {
        let file_id = self.pending_file(folder_id, filename).await["id"]
            .as_i64()
            .unwrap();
        self.put_blob(file_id).await;
        self.complete(file_id).await.assert_status_ok();
        file_id
    }

    async fn list(&self, folder_id: i64, query: &str) -> Vec<Value> {
        let response = self
            .server
            .get(&format!(
                "/api/projects/{}/folders/{}/files{}",
                self.project_id, folder_id, query
            ))
            .add_header(AUTHORIZATION, self.auth())
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]
            .as_array()
            .unwrap()
            .clone()
    }
}

fn token_for(user_id: i64) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = JwtClaims {
        sub: user_id,
        role: "member".to_string(),
        email: None,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode token")
}

// Upload lifecycle

#[tokio::test]
async fn test_upload_without_blob_store() {
    let ctx = TestContext::new(false).await;
    let folder_id = ctx.create_folder("Drawings").await;

    let response = ctx
        .request_upload(folder_id, json!({ "filename": "A-101.pdf", "size_bytes": 10 }))
        .await;

    response.assert_status(StatusCode::NOT_IMPLEMENTED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_IMPLEMENTED");
}

#[tokio::test]
async fn test_upload_lifecycle() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Drawings").await;

    let response = ctx
        .request_upload(
            folder_id,
            json!({ "filename": " A-101.pdf ", "content_type": "Application/PDF", "size_bytes": 2048 }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let file = &body["data"]["file"];
    let upload = &body["data"]["upload"];

    assert_eq!(file["name"], "A-101.pdf");
    assert_eq!(file["status"], "pending");
    assert_eq!(file["content_type"], "application/pdf");
    assert_eq!(file["size_bytes"], 2048);
    assert_eq!(file["created_by"], 1);
    assert!(file.get("blob_name").is_none());
    assert_eq!(upload["method"], "PUT");
    let url = upload["url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:8081/blobs/"));
    assert!(url.contains("signature="));

    let file_id = file["id"].as_i64().unwrap();

    // Pending files stay out of the default listing
    assert!(ctx.list(folder_id, "").await.is_empty());
    assert_eq!(ctx.list(folder_id, "?include_pending=true").await.len(), 1);

    // Nothing in blob storage yet
    let response = ctx.complete(file_id).await;
    response.assert_status(StatusCode::CONFLICT);

    ctx.put_blob(file_id).await;

    let response = ctx.complete(file_id).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "ready");

    // Completing twice is harmless
    ctx.complete(file_id).await.assert_status_ok();

    let files = ctx.list(folder_id, "").await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], file_id);

    let response = ctx
        .server
        .get(&format!("{}/download", ctx.files_url(file_id)))
        .add_header(AUTHORIZATION, ctx.auth())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["method"], "GET");
    assert!(body["data"]["url"].as_str().unwrap().contains("filename="));
}

#[tokio::test]
async fn test_download_pending_file() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Drawings").await;
    let file_id = ctx.pending_file(folder_id, "A-102.pdf").await["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .server
        .get(&format!("{}/download", ctx.files_url(file_id)))
        .add_header(AUTHORIZATION, ctx.auth())
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upload_rejects_bad_input() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Drawings").await;

    let response = ctx
        .request_upload(folder_id, json!({ "filename": "../etc/passwd", "size_bytes": 10 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .request_upload(folder_id, json!({ "filename": "a.pdf", "size_bytes": -1 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .request_upload(9999, json!({ "filename": "a.pdf", "size_bytes": 10 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// Metadata

#[tokio::test]
async fn test_rename_and_move_file() {
    let ctx = TestContext::new(true).await;
    let drawings = ctx.create_folder("Drawings").await;
    let archive = ctx.create_folder("Archive").await;
    let file_id = ctx.ready_file(drawings, "A-101.pdf").await;

    let response = ctx
        .server
        .patch(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .json(&json!({ "name": "A-101 rev B.pdf", "folder_id": archive }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "A-101 rev B.pdf");
    assert_eq!(body["data"]["folder_id"], archive);
    assert_eq!(body["data"]["updated_by"], 1);

    assert!(ctx.list(drawings, "").await.is_empty());
    assert_eq!(ctx.list(archive, "").await.len(), 1);

    let response = ctx
        .server
        .patch(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .json(&json!({ "folder_id": 9999 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_delete_file() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Submittals").await;
    let file_id = ctx.ready_file(folder_id, "pump.pdf").await;

    let response = ctx
        .server
        .delete(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "deleted");
    assert_eq!(body["data"]["deleted_by"], 1);
    assert!(!body["data"]["deleted_at"].is_null());

    // Deleting again is a no-op
    ctx.server
        .delete(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .await
        .assert_status_ok();

    assert!(ctx.list(folder_id, "").await.is_empty());
    assert_eq!(ctx.list(folder_id, "?include_deleted=true").await.len(), 1);

    let response = ctx
        .server
        .patch(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .json(&json!({ "name": "resurrected.pdf" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = ctx
        .server
        .get(&format!("{}/download", ctx.files_url(file_id)))
        .add_header(AUTHORIZATION, ctx.auth())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folder_with_live_file_cannot_be_deleted() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Photos").await;
    let file_id = ctx.pending_file(folder_id, "site.jpg").await["id"]
        .as_i64()
        .unwrap();
    let folder_url = format!("/api/projects/{}/folders/{}", ctx.project_id, folder_id);

    ctx.server
        .delete(&folder_url)
        .add_header(AUTHORIZATION, ctx.auth())
        .await
        .assert_status(StatusCode::CONFLICT);

    ctx.server
        .delete(&ctx.files_url(file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .await
        .assert_status_ok();

    // Tombstones do not keep a folder alive
    ctx.server
        .delete(&folder_url)
        .add_header(AUTHORIZATION, ctx.auth())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_files_isolated_between_projects() {
    let ctx = TestContext::new(true).await;
    let folder_id = ctx.create_folder("Drawings").await;
    let file_id = ctx.ready_file(folder_id, "A-101.pdf").await;

    let projects = ProjectRepository::new(ctx.db.pool());
    let other = projects
        .create(&NewProject::new(ORG_ID, "Tower B"))
        .await
        .unwrap();
    projects.add_member(other.id, Some(1), None).await.unwrap();

    let response = ctx
        .server
        .delete(&format!("/api/projects/{}/files/{}", other.id, file_id))
        .add_header(AUTHORIZATION, ctx.auth())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    assert_eq!(ctx.list(folder_id, "").await.len(), 1);
}
