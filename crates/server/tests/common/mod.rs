//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with
//! failure-injecting doubles for the queue, cache and blob store, and
//! SQLite record and audit stores in a temp dir.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use helpdesk_core::{
    create_audit_system, create_authenticator, load_config_from_str, AttachmentLimits,
    AuditStore, MessageQueue, PriorityCache, RecordStore, SqliteAuditStore, SqliteRecordStore,
    TicketArchive, TicketIntake, TicketLifecycle, UserDirectory,
    testing::{MockBlobStore, MockMessageQueue, MockPriorityCache},
};
use helpdesk_server::state::AppState;

/// Re-export fixtures for test convenience
pub use helpdesk_core::testing::fixtures;

const BOUNDARY: &str = "helpdesk-test-boundary";

/// Who a request is sent as, via the proxy identity headers.
#[derive(Debug, Clone)]
pub struct Caller {
    pub email: String,
    pub role: Option<&'static str>,
}

impl Caller {
    pub fn user(email: &str) -> Self {
        Self {
            email: email.to_string(),
            role: Some("user"),
        }
    }

    pub fn technician(email: &str) -> Self {
        Self {
            email: email.to_string(),
            role: Some("technician"),
        }
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ticket_creation() {
///     let fixture = TestFixture::new().await;
///     let response = fixture
///         .submit(&Caller::user("u@x.com"), "Printer jam", "high")
///         .await;
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub queue: Arc<MockMessageQueue>,
    pub cache: Arc<MockPriorityCache>,
    pub blobs: Arc<MockBlobStore>,
    pub lifecycle: Arc<TicketLifecycle>,
    pub users: Arc<UserDirectory>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Header auth, small attachment limits, no background processor.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(&format!(
            r#"
[auth]
method = "header"

[server]
host = "127.0.0.1"
port = 0

[database]
path = "{}"

[blob]
max_attachment_bytes = 64
max_attachments = 2

[processor]
enabled = false
"#,
            db_path.display()
        ))
        .expect("Failed to parse test config");

        let authenticator =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));

        let audit_store: Arc<dyn AuditStore> =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let records: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::new(&db_path).expect("Failed to create record store"));
        let queue = Arc::new(MockMessageQueue::new());
        let cache = Arc::new(MockPriorityCache::new());
        let blobs = Arc::new(MockBlobStore::new());

        let users = Arc::new(
            UserDirectory::new(Arc::clone(&records)).with_audit(audit_handle.clone()),
        );
        let lifecycle = Arc::new(
            TicketLifecycle::new(
                Arc::clone(&queue) as Arc<dyn MessageQueue>,
                Arc::clone(&cache) as Arc<dyn PriorityCache>,
                TicketArchive::new(records),
                config.lifecycle.retention_days,
            )
            .with_audit(audit_handle),
        );
        let intake = Arc::new(TicketIntake::new(
            Arc::clone(&users),
            Arc::clone(&blobs) as _,
            Arc::clone(&lifecycle),
            AttachmentLimits {
                max_count: config.blob.max_attachments,
                max_bytes: config.blob.max_attachment_bytes,
            },
        ));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&audit_store),
            Arc::clone(&users),
            Arc::clone(&lifecycle),
            intake,
            None,
        ));

        Self {
            router: helpdesk_server::api::create_router(state),
            queue,
            cache,
            blobs,
            lifecycle,
            users,
            audit_store,
            temp_dir,
        }
    }

    /// Send a GET request without identity headers.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path), None, Body::empty())
            .await
    }

    pub async fn get_as(&self, caller: &Caller, path: &str) -> TestResponse {
        self.send(
            Request::builder().method("GET").uri(path),
            Some(caller),
            Body::empty(),
        )
        .await
    }

    pub async fn post_as(&self, caller: &Caller, path: &str) -> TestResponse {
        self.send(
            Request::builder().method("POST").uri(path),
            Some(caller),
            Body::empty(),
        )
        .await
    }

    pub async fn put_json_as(&self, caller: &Caller, path: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method("PUT")
                .uri(path)
                .header("Content-Type", "application/json"),
            Some(caller),
            Body::from(serde_json::to_vec(&body).unwrap()),
        )
        .await
    }

    /// POST a multipart form to `/api/v1/tickets`.
    pub async fn post_form_as(&self, caller: &Caller, parts: &[Part<'_>]) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tickets")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                ),
            Some(caller),
            Body::from(multipart_body(parts)),
        )
        .await
    }

    /// Submit a ticket with no attachments.
    pub async fn submit(&self, caller: &Caller, title: &str, priority: &str) -> TestResponse {
        self.post_form_as(
            caller,
            &[
                Part::Text("title", title),
                Part::Text("description", "details"),
                Part::Text("priority", priority),
            ],
        )
        .await
    }

    /// Drain the queue through the technician endpoint.
    pub async fn process(&self) -> TestResponse {
        self.post_as(&Caller::technician("ops@x.com"), "/api/v1/processor/process")
            .await
    }

    async fn send(
        &self,
        builder: axum::http::request::Builder,
        caller: Option<&Caller>,
        body: Body,
    ) -> TestResponse {
        let mut builder = builder;
        if let Some(caller) = caller {
            builder = builder.header("X-Auth-Email", &caller.email);
            if let Some(role) = caller.role {
                builder = builder.header("X-Auth-Role", role);
            }
        }
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
