//! Integration coverage for the manager's public surface: creation gates (§4.7) and a full
//! spawn → stream → exit lifecycle (§4.6) driven through `Manager` rather than `CliSession`
//! directly, the way an external caller would use it.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use freshell_runtime::{Manager, ManagerError, SessionStatus};
use freshell_types::SpawnOptions;

fn fake_vendor_cli(stdout_script: &str) -> tempfile::TempPath {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    writeln!(file, "{stdout_script}").unwrap();
    let path = file.into_temp_path();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Scenario 5 (§8): Codex never supports resume, so the gate must fire before any process
/// is spawned — driven through the real `Manager::create` rather than a direct constructor.
#[tokio::test]
async fn manager_rejects_resume_request_for_codex_without_spawning() {
    let manager = Manager::new();
    let mut opts = SpawnOptions::new("hi");
    opts.resume_session_id = Some("any-id".to_string());

    let err = manager.create("codex", opts).await.unwrap_err();
    assert!(matches!(err, ManagerError::CapabilityUnsupported { .. }));
    assert!(manager.list().await.is_empty());
}

#[tokio::test]
async fn manager_rejects_unregistered_provider_name() {
    let manager = Manager::new();
    let err = manager.create("gemini", SpawnOptions::new("hi")).await.unwrap_err();
    assert_eq!(err, ManagerError::ProviderUnknown("gemini".to_string()));
}

/// Scenario 4 (§8), driven end to end through `Manager`: a `system{subtype:init}` line
/// followed by a clean exit produces `[session.start, session.end]` and a terminal
/// `completed` status.
#[tokio::test]
async fn manager_create_streams_claude_events_to_completion() {
    let script = fake_vendor_cli(
        r#"printf '%s\n' '{"type":"system","subtype":"init","cwd":"/p","model":"m"}'"#,
    );
    std::env::set_var("CLAUDE_CMD", &script);

    let manager = Manager::new();
    let id = manager.create("claude", SpawnOptions::new("hi")).await.unwrap();
    let session = manager.get(&id).await.expect("session registered");

    for _ in 0..200 {
        if session.status() != SessionStatus::Running {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(session.status(), SessionStatus::Completed);
    let events = session.events();
    assert_eq!(events.len(), 2);

    std::env::remove_var("CLAUDE_CMD");
}

#[tokio::test]
async fn manager_remove_kills_and_clears_the_registry() {
    let script = fake_vendor_cli("sleep 5");
    std::env::set_var("CLAUDE_CMD", &script);

    let manager = Manager::new();
    let id = manager.create("claude", SpawnOptions::new("hi")).await.unwrap();
    assert!(!manager.list().await.is_empty());

    assert!(manager.remove(&id).await);
    assert!(manager.get(&id).await.is_none());
    assert!(manager.list().await.is_empty());

    std::env::remove_var("CLAUDE_CMD");
}
