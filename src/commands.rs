//! Custom command runner: user-declared shell commands executed off the tick
//! path, with the last completed output published to a non-blocking cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CommandState {
    command: String,
    last_output: Option<String>,
    last_run_at: Option<Instant>,
    in_flight: bool,
}

/// Cheap to clone; all clones share one state map. The lock is only ever held
/// for map reads/writes, never across an await, so `latest()` cannot stall
/// the tick path.
#[derive(Clone, Default)]
pub struct CommandRunner {
    inner: Arc<Mutex<HashMap<String, CommandState>>>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key backed by a shell command. Re-registering an existing key
    /// swaps the command text but keeps the last completed output.
    pub fn register(&self, key: &str, command_text: &str) {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(key) {
            Some(state) => state.command = command_text.to_string(),
            None => {
                map.insert(
                    key.to_string(),
                    CommandState {
                        command: command_text.to_string(),
                        last_output: None,
                        last_run_at: None,
                        in_flight: false,
                    },
                );
            }
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.inner.lock().unwrap().contains_key(key)
    }

    /// Most recently completed output, or `None` if nothing has ever
    /// completed. Never blocks on a running command.
    pub fn latest(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .get(key)
            .and_then(|s| s.last_output.clone())
    }

    /// Run one registered command to completion and publish its output.
    /// No-op if the key is unknown or already in flight. Failures (spawn
    /// error, non-zero exit) keep the previous output and only log.
    pub async fn run_key(&self, key: &str) {
        let command = {
            let mut map = self.inner.lock().unwrap();
            match map.get_mut(key) {
                Some(state) if !state.in_flight => {
                    state.in_flight = true;
                    state.last_run_at = Some(Instant::now());
                    state.command.clone()
                }
                _ => return,
            }
        };

        let result = run_shell(&command).await;

        let mut map = self.inner.lock().unwrap();
        if let Some(state) = map.get_mut(key) {
            state.in_flight = false;
            match result {
                Ok(text) => {
                    debug!("custom command {key} completed");
                    state.last_output = Some(text);
                }
                Err(e) => warn!("custom command {key} failed: {e}"),
            }
        }
    }

    /// Spawn a detached run for every idle key.
    pub fn poll_once(&self) {
        let idle: Vec<String> = {
            let map = self.inner.lock().unwrap();
            map.iter()
                .filter(|(_, s)| !s.in_flight)
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in idle {
            let runner = self.clone();
            tokio::spawn(async move { runner.run_key(&key).await });
        }
    }
}

async fn run_shell(command: &str) -> anyhow::Result<String> {
    #[cfg(windows)]
    let (shell, flag) = ("cmd", "/C");
    #[cfg(not(windows))]
    let (shell, flag) = ("sh", "-c");

    let output = tokio::process::Command::new(shell)
        .arg(flag)
        .arg(command)
        .output()
        .await?;
    if !output.status.success() {
        anyhow::bail!("exit status {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .trim_end_matches(['\n', '\r'])
        .to_string())
}

/// Background poller, decoupled from the tick cadence since commands may be
/// slow. A key whose previous run is still in flight is skipped.
pub fn spawn_poller(runner: CommandRunner, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            runner.poll_once();
            sleep(period).await;
        }
    })
}
