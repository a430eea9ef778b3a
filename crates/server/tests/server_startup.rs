use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with storage inside `dir`
fn minimal_config(port: u16, dir: &TempDir) -> String {
    format!(
        r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[blob]
root = "{}"
"#,
        port,
        dir.path().join("helpdesk.db").display(),
        dir.path().join("attachments").display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn server_command(config_path: &std::path::Path) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_helpdesk"));
    command
        .env("HELPDESK_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true);
    command
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    server_command(config_path)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Run the binary to completion and report whether it failed.
async fn exits_with_error(config_path: &std::path::Path) -> bool {
    let result = timeout(Duration::from_secs(5), server_command(config_path).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command");
    !result.status.success()
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &dir));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &dir));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["auth"]["method"], "none");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["cache"]["backend"], "memory");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_env_override_replaces_file_value() {
    let file_port = get_available_port();
    let env_port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(file_port, &dir));

    let mut server = server_command(config.path())
        .env("HELPDESK_SERVER__PORT", env_port.to_string())
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(env_port, 40).await,
        "Server did not start on the overridden port"
    );

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    assert!(exits_with_error(std::path::Path::new("/nonexistent/config.toml")).await);
}

#[tokio::test]
async fn test_missing_auth_section_exits_with_error() {
    let config = write_config(
        r#"
[server]
port = 8080
"#,
    );
    assert!(exits_with_error(config.path()).await);
}

#[tokio::test]
async fn test_redis_backend_without_url_exits_with_error() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&format!(
        "{}\n[cache]\nbackend = \"redis\"\n",
        minimal_config(port, &dir)
    ));
    assert!(exits_with_error(config.path()).await);
}

#[tokio::test]
async fn test_unreachable_redis_exits_with_error() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&format!(
        "{}\n[cache]\nbackend = \"redis\"\nredis_url = \"redis://127.0.0.1:1/\"\nop_timeout_ms = 300\n",
        minimal_config(port, &dir)
    ));
    assert!(exits_with_error(config.path()).await);
}
