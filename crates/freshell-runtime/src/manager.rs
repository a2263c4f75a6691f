//! The session manager (C7, §4.7): a provider registry, a live-session registry, capability
//! gating on `create`, and a periodic retention sweep of terminated sessions.

use std::collections::HashMap;
use std::sync::Arc;

use freshell_providers::Registry;
use freshell_types::{ProviderId, SpawnOptions};
use tokio::sync::{watch, Mutex};

use crate::config;
use crate::error::ManagerError;
use crate::supervisor::{CliSession, SessionStatus};

pub struct Manager {
    providers: Registry,
    sessions: Mutex<HashMap<String, Arc<CliSession>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Manager {
    /// Builds the manager and starts its retention sweep (§4.7), ticking every
    /// `cleanupInterval` (fixed, 5 minutes) until `shutdown()` drops the cancellation sender.
    pub fn new() -> Arc<Manager> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = Arc::new(Manager {
            providers: Registry::new(),
            sessions: Mutex::new(HashMap::new()),
            shutdown_tx,
        });
        spawn_retention_sweep(manager.clone(), shutdown_rx);
        manager
    }

    /// Validates, in order, provider registration, live-streaming support, and — only when
    /// a resume id was requested — resume support (§4.7). On success, spawns and registers
    /// a supervisor under a fresh internal id.
    pub async fn create(&self, provider_name: &str, opts: SpawnOptions) -> Result<String, ManagerError> {
        let provider_id = ProviderId::parse(provider_name)
            .ok_or_else(|| ManagerError::ProviderUnknown(provider_name.to_string()))?;
        let provider = self
            .providers
            .get(provider_id)
            .ok_or_else(|| ManagerError::ProviderUnknown(provider_name.to_string()))?;

        if !provider.supports_live_streaming() {
            return Err(ManagerError::CapabilityUnsupported {
                provider: provider_id.to_string(),
                capability: "live streaming",
            });
        }
        if opts.resume_session_id.is_some() && !provider.supports_session_resume() {
            return Err(ManagerError::CapabilityUnsupported {
                provider: provider_id.to_string(),
                capability: "session resume",
            });
        }

        let internal_id = uuid::Uuid::new_v4().to_string();
        let session = CliSession::spawn(provider, opts, config::max_session_events());
        self.sessions.lock().await.insert(internal_id.clone(), session);
        Ok(internal_id)
    }

    pub async fn get(&self, internal_id: &str) -> Option<Arc<CliSession>> {
        self.sessions.lock().await.get(internal_id).cloned()
    }

    pub async fn list(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    /// Kills the session (if still running) and removes it from the registry.
    pub async fn remove(&self, internal_id: &str) -> bool {
        let session = self.sessions.lock().await.remove(internal_id);
        match session {
            Some(session) => {
                session.kill().await;
                true
            }
            None => false,
        }
    }

    /// Stops the retention timer, kills every live session, and clears the registry.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let sessions: Vec<Arc<CliSession>> = {
            let mut guard = self.sessions.lock().await;
            guard.drain().map(|(_, session)| session).collect()
        };
        for session in sessions {
            session.kill().await;
        }
    }
}

fn spawn_retention_sweep(manager: Arc<Manager>, mut shutdown_rx: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config::cleanup_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    manager.sweep_retention().await;
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }
    });
}

impl Manager {
    async fn sweep_retention(&self) {
        let retention = config::completed_session_retention();
        let now = chrono::Utc::now();
        let mut guard = self.sessions.lock().await;
        guard.retain(|_, session| {
            if session.status() == SessionStatus::Running {
                return true;
            }
            match session.completed_at() {
                Some(completed_at) => {
                    let age = now.signed_duration_since(completed_at);
                    age.to_std().map(|age| age < retention).unwrap_or(true)
                }
                None => true,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_unknown_provider() {
        let manager = Manager::new();
        let err = manager.create("gemini", SpawnOptions::new("hi")).await.unwrap_err();
        assert_eq!(err, ManagerError::ProviderUnknown("gemini".to_string()));
    }

    /// Scenario 5 (§8): Codex never supports resume, so a resume request must be gated
    /// before any process is spawned.
    #[tokio::test]
    async fn create_rejects_resume_for_codex() {
        let manager = Manager::new();
        let mut opts = SpawnOptions::new("hi");
        opts.resume_session_id = Some("id".to_string());
        let err = manager.create("codex", opts).await.unwrap_err();
        assert_eq!(
            err,
            ManagerError::CapabilityUnsupported { provider: "codex".to_string(), capability: "session resume" }
        );
        assert!(manager.list().await.is_empty());
    }

    #[tokio::test]
    async fn remove_on_unknown_id_returns_false() {
        let manager = Manager::new();
        assert!(!manager.remove("nope").await);
    }

    /// Scenario 6 (§8): a terminated session older than the retention window is swept;
    /// a still-running session is never removed regardless of age.
    #[tokio::test]
    async fn sweep_retention_evicts_only_aged_terminal_sessions() {
        std::env::set_var("FRESHELL_COMPLETED_SESSION_RETENTION_MS", "10");

        let manager = Manager::new();
        let mut exited = tokio::process::Command::new("/bin/sh");
        exited.arg("-c").arg("exit 0");
        let exited_session =
            CliSession::spawn_with(ProviderId::Claude, exited, &SpawnOptions::new("hi"), 10, |_| Vec::new());

        let mut running = tokio::process::Command::new("/bin/sh");
        running.arg("-c").arg("sleep 5");
        let running_session =
            CliSession::spawn_with(ProviderId::Claude, running, &SpawnOptions::new("hi"), 10, |_| Vec::new());

        for _ in 0..100 {
            if exited_session.status() != SessionStatus::Running {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(exited_session.status(), SessionStatus::Completed);

        {
            let mut guard = manager.sessions.lock().await;
            guard.insert("exited".to_string(), exited_session);
            guard.insert("running".to_string(), running_session.clone());
        }

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        manager.sweep_retention().await;

        let remaining = manager.list().await;
        assert!(!remaining.contains(&"exited".to_string()));
        assert!(remaining.contains(&"running".to_string()));

        running_session.kill().await;
        std::env::remove_var("FRESHELL_COMPLETED_SESSION_RETENTION_MS");
    }
}
