//! Acting on restart requests.
//!
//! The engine only asks for a restart. The host stops the engine, lets
//! in-flight work drain for a bounded time, then exits with
//! [`RESTART_EXIT_CODE`] so the supervisor knows to start it again.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{HotConfig, RestartRequest};
use crate::lifecycle::Shutdown;

/// Exit code meaning "restart requested by a config change". Supervisors
/// must treat it as non-fatal and start the process again.
pub const RESTART_EXIT_CODE: i32 = 42;

/// How the process actually terminates.
pub trait ExitHook: Send + Sync {
    fn exit(&self, code: i32);
}

/// Production hook: terminate the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl ExitHook for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Waits for the first restart request and carries it out.
pub struct RestartHandler<H: ExitHook> {
    hook: H,
    drain: Duration,
}

impl<H: ExitHook> RestartHandler<H> {
    pub fn new(hook: H, drain: Duration) -> Self {
        Self { hook, drain }
    }

    /// Block until a request arrives, then stop the engine, broadcast
    /// shutdown, wait out the drain window and exit.
    ///
    /// Returns the request that fired, or `None` if the channel closed.
    pub async fn run(
        &self,
        mut requests: mpsc::UnboundedReceiver<RestartRequest>,
        engine: &HotConfig,
        shutdown: &Shutdown,
    ) -> Option<RestartRequest> {
        let request = requests.recv().await?;
        tracing::info!(reason = %request.reason, "Restart requested, draining before exit");

        engine.stop();
        shutdown.trigger();
        if !self.drain.is_zero() {
            tokio::time::sleep(self.drain).await;
        }

        tracing::info!(code = RESTART_EXIT_CODE, "Exiting for restart");
        self.hook.exit(RESTART_EXIT_CODE);
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RestartReason;
    use crate::settings::EngineSettings;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct RecordingExit(Arc<AtomicI32>);

    impl ExitHook for RecordingExit {
        fn exit(&self, code: i32) {
            self.0.store(code, Ordering::SeqCst);
        }
    }

    fn engine() -> (tempfile::TempDir, HotConfig) {
        let dir = tempfile::tempdir().unwrap();
        let engine = HotConfig::new(EngineSettings {
            config_dir: dir.path().to_path_buf(),
            plugins_dir: None,
            ..EngineSettings::default()
        })
        .unwrap();
        (dir, engine)
    }

    #[tokio::test]
    async fn test_request_exits_with_restart_code() {
        let (_dir, engine) = engine();
        let hook = RecordingExit::default();
        let handler = RestartHandler::new(hook.clone(), Duration::ZERO);
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RestartRequest {
            reason: RestartReason::ConfigUpdated { name: "a.json".into() },
        })
        .unwrap();

        let fired = handler.run(rx, &engine, &shutdown).await;
        assert!(fired.is_some());
        assert_eq!(hook.0.load(Ordering::SeqCst), RESTART_EXIT_CODE);
        assert!(listener.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_channel_never_exits() {
        let (_dir, engine) = engine();
        let hook = RecordingExit::default();
        let handler = RestartHandler::new(hook.clone(), Duration::ZERO);

        let (tx, rx) = mpsc::unbounded_channel::<RestartRequest>();
        drop(tx);

        assert!(handler.run(rx, &engine, &Shutdown::new()).await.is_none());
        assert_eq!(hook.0.load(Ordering::SeqCst), 0);
    }
}
