//! The per-session supervisor (C6, §4.6): spawns one vendor child, line-splits its stdout,
//! feeds the provider's normalizer, and fans the resulting events out to subscribers.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use freshell_types::{
    EventKind, NormalizedEvent, ProviderId, SessionEndPayload, SpawnOptions, UNKNOWN_SESSION_ID,
};
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::broadcast;
use tokio::sync::Mutex as TokioMutex;

use crate::ring_buffer::RingBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Error,
}

/// One spawned vendor CLI and everything the supervisor owns about it.
///
/// `status` and `events` are guarded by `std::sync::Mutex`, held only for the duration of a
/// single read or push and never across an `.await` (§5); `child` is a `tokio::sync::Mutex`
/// because both `kill()` and the exit-wait path need to hold it across an async call.
pub struct CliSession {
    provider_id: ProviderId,
    status: StdMutex<SessionStatus>,
    completed_at: StdMutex<Option<DateTime<Utc>>>,
    provider_session_id: StdMutex<Option<String>>,
    events: StdMutex<RingBuffer<NormalizedEvent>>,
    publisher: broadcast::Sender<NormalizedEvent>,
    child: TokioMutex<Option<tokio::process::Child>>,
}

impl CliSession {
    /// Spawns `opts` against `provider`'s command and argv, per §4.6. Never fails outright:
    /// a spawn error still yields a session, already terminal with a synthesized `session.end`.
    pub fn spawn(
        provider: Arc<dyn freshell_providers::Provider>,
        opts: SpawnOptions,
        capacity: usize,
    ) -> Arc<CliSession> {
        let provider_id = provider.id();
        let mut cmd = Command::new(provider.command());
        cmd.args(provider.stream_args(&opts));
        let normalizer = move |line: &str| provider.parse_event(line);
        Self::spawn_with(provider_id, cmd, &opts, capacity, normalizer)
    }

    pub(crate) fn spawn_with(
        provider_id: ProviderId,
        mut cmd: Command,
        opts: &SpawnOptions,
        capacity: usize,
        normalize: impl Fn(&str) -> Vec<NormalizedEvent> + Send + Sync + 'static,
    ) -> Arc<CliSession> {
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(if opts.keep_stdin_open { Stdio::piped() } else { Stdio::null() });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let (publisher, _rx) = broadcast::channel(1024);

        match cmd.spawn() {
            Ok(mut child) => {
                let stdout = child.stdout.take().expect("stdout is piped");
                let stderr = child.stderr.take().expect("stderr is piped");
                let session = Arc::new(CliSession {
                    provider_id,
                    status: StdMutex::new(SessionStatus::Running),
                    completed_at: StdMutex::new(None),
                    provider_session_id: StdMutex::new(None),
                    events: StdMutex::new(RingBuffer::new(capacity)),
                    publisher,
                    child: TokioMutex::new(Some(child)),
                });
                tokio::spawn(drain_stderr(stderr));
                spawn_reader_task(session.clone(), normalize, stdout);
                session
            }
            Err(err) => {
                let session = Arc::new(CliSession {
                    provider_id,
                    status: StdMutex::new(SessionStatus::Running),
                    completed_at: StdMutex::new(None),
                    provider_session_id: StdMutex::new(None),
                    events: StdMutex::new(RingBuffer::new(capacity)),
                    publisher,
                    child: TokioMutex::new(None),
                });
                session.set_terminal(SessionStatus::Error);
                session.record(NormalizedEvent::unknown_session(
                    Utc::now(),
                    provider_id,
                    EventKind::SessionEnd(SessionEndPayload {
                        message: Some(format!("failed to spawn: {err}")),
                        recoverable: Some(false),
                        input_tokens: None,
                        output_tokens: None,
                    }),
                ));
                session
            }
        }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        *self.completed_at.lock().unwrap()
    }

    pub fn provider_session_id(&self) -> Option<String> {
        self.provider_session_id.lock().unwrap().clone()
    }

    /// A stable snapshot of the ring buffer in logical order.
    pub fn events(&self) -> Vec<NormalizedEvent> {
        self.events.lock().unwrap().ordered().into_iter().cloned().collect()
    }

    pub fn event_count(&self) -> u64 {
        self.events.lock().unwrap().count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NormalizedEvent> {
        self.publisher.subscribe()
    }

    /// Signals the child, marks the session `error`, stamps `completedAt` if unset.
    /// Idempotent: a session that already reached a terminal state is left alone.
    pub async fn kill(&self) {
        let mut guard = self.child.lock().await;
        if let Some(child) = guard.as_mut() {
            let _ = child.kill().await;
        }
        drop(guard);
        self.set_terminal(SessionStatus::Error);
    }

    /// Binds `providerSessionId` on first non-`unknown` sighting, appends to the ring
    /// buffer, and fans out to subscribers. Returns the (possibly rewritten) event.
    fn record(&self, mut event: NormalizedEvent) -> NormalizedEvent {
        if event.session_id == UNKNOWN_SESSION_ID {
            if let Some(bound) = self.provider_session_id.lock().unwrap().clone() {
                event.session_id = bound;
            }
        } else {
            let mut slot = self.provider_session_id.lock().unwrap();
            if slot.is_none() {
                *slot = Some(event.session_id.clone());
            }
        }
        self.events.lock().unwrap().push(event.clone());
        let _ = self.publisher.send(event.clone());
        event
    }

    fn set_terminal(&self, status: SessionStatus) {
        {
            let mut current = self.status.lock().unwrap();
            if *current == SessionStatus::Running {
                *current = status;
            }
        }
        let mut completed_at = self.completed_at.lock().unwrap();
        if completed_at.is_none() {
            *completed_at = Some(Utc::now());
        }
    }

    fn finish(&self, exit_status: Option<ExitStatus>, saw_session_end: bool) {
        let success = exit_status.map(|s| s.success()).unwrap_or(false);
        self.set_terminal(if success { SessionStatus::Completed } else { SessionStatus::Error });

        if saw_session_end {
            return;
        }
        let session_id = self
            .provider_session_id
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());
        let message = (!success).then(|| match exit_status.and_then(|s| s.code()) {
            Some(code) => format!("Process exited with code {code}"),
            None => "Process exited without a status code".to_string(),
        });
        self.record(NormalizedEvent::new(
            Utc::now(),
            session_id,
            self.provider_id,
            EventKind::SessionEnd(SessionEndPayload {
                message,
                recoverable: (!success).then_some(false),
                input_tokens: None,
                output_tokens: None,
            }),
        ));
    }
}

/// Reads stdout in chunks, maintaining a carry buffer across `\r?\n` boundaries (§4.6), and
/// feeds every complete non-empty line to the normalizer.
fn spawn_reader_task(
    session: Arc<CliSession>,
    normalize: impl Fn(&str) -> Vec<NormalizedEvent> + Send + Sync + 'static,
    mut stdout: ChildStdout,
) {
    tokio::spawn(async move {
        let mut carry = String::new();
        let mut chunk = [0u8; 8192];
        let mut saw_session_end = false;

        loop {
            match stdout.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    carry.push_str(&String::from_utf8_lossy(&chunk[..n]));
                    while let Some(idx) = carry.find('\n') {
                        let mut line = carry[..idx].to_string();
                        carry.drain(..=idx);
                        if line.ends_with('\r') {
                            line.pop();
                        }
                        if line.is_empty() {
                            continue;
                        }
                        for event in normalize(&line) {
                            let event = session.record(event);
                            if matches!(event.kind, EventKind::SessionEnd(_)) {
                                saw_session_end = true;
                            }
                        }
                    }
                }
                Err(_) => break,
            }
        }

        let exit_status = {
            let mut guard = session.child.lock().await;
            if let Some(child) = guard.as_mut() {
                child.wait().await.ok()
            } else {
                None
            }
        };

        session.finish(exit_status, saw_session_end);
    });
}

async fn drain_stderr(stderr: ChildStderr) {
    use tokio::io::{AsyncBufReadExt, BufReader};
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("[freshell-runtime] child stderr: {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshell_types::SessionInfoPayload;
    use std::time::Duration;

    fn claude_like(line: &str) -> Vec<NormalizedEvent> {
        freshell_providers::claude::parser::parse_event_line(line)
    }

    /// Scenario 4 (§8): spawn, stream a `system{subtype:init}` line, exit 0.
    #[tokio::test]
    async fn spawn_stream_exit_produces_start_and_end_in_order() {
        let script = r#"{"type":"system","subtype":"init","cwd":"/p","model":"m"}"#;
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(format!("printf '%s\\n' '{script}'"));

        let opts = SpawnOptions::new("hi");
        let session = CliSession::spawn_with(ProviderId::Claude, cmd, &opts, 100, claude_like);

        for _ in 0..100 {
            if session.status() != SessionStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(session.status(), SessionStatus::Completed);
        let events = session.events();
        assert_eq!(events.len(), 2);
        match &events[0].kind {
            EventKind::SessionStart(SessionInfoPayload { cwd, model }) => {
                assert_eq!(cwd.as_deref(), Some("/p"));
                assert_eq!(model.as_deref(), Some("m"));
            }
            other => panic!("expected session.start, got {other:?}"),
        }
        assert!(matches!(events[1].kind, EventKind::SessionEnd(_)));
    }

    #[tokio::test]
    async fn spawn_failure_yields_terminal_session_with_synthetic_end() {
        let cmd = Command::new("/definitely/not/a/real/binary-xyz");
        let opts = SpawnOptions::new("hi");
        let session = CliSession::spawn_with(ProviderId::Claude, cmd, &opts, 10, claude_like);

        assert_eq!(session.status(), SessionStatus::Error);
        assert!(session.completed_at().is_some());
        let events = session.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].kind, EventKind::SessionEnd(_)));
    }

    #[tokio::test]
    async fn kill_is_idempotent_and_does_not_revert_a_completed_session() {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg("exit 0");
        let opts = SpawnOptions::new("hi");
        let session = CliSession::spawn_with(ProviderId::Claude, cmd, &opts, 10, claude_like);

        for _ in 0..100 {
            if session.status() != SessionStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(session.status(), SessionStatus::Completed);

        session.kill().await;
        session.kill().await;
        assert_eq!(session.status(), SessionStatus::Completed);
    }
}
