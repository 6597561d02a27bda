//! ExpirySweeper - Fails sessions that outlived their deadline.
//!
//! Runs on an interval until shutdown. Overlapping sweeps are harmless:
//! failing an already-failed session is a no-op and is not counted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info};

use super::SessionManager;
use crate::domain::foundation::Timestamp;
use crate::domain::session::SessionError;
use crate::ports::SessionRepository;

pub struct ExpirySweeper {
    sessions: Arc<dyn SessionRepository>,
    manager: Arc<SessionManager>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(sessions: Arc<dyn SessionRepository>, manager: Arc<SessionManager>, interval: Duration) -> Self {
        Self {
            sessions,
            manager,
            interval,
        }
    }

    /// Sweep until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Expiry sweeper stopped");
                        return;
                    }
                }
                _ = interval.tick() => {
                    if let Err(err) = self.sweep().await {
                        error!(error = %err, "Expiry sweep failed");
                    }
                }
            }
        }
    }

    /// Fail every expired active session. Returns how many this pass failed.
    pub async fn sweep(&self) -> Result<usize, SessionError> {
        let expired = self.sessions.find_expired(&Timestamp::now()).await?;
        let mut failed = 0;

        for session in expired {
            match self.manager.expire(session.id()).await {
                Ok(true) => failed += 1,
                Ok(false) => {}
                Err(err) => {
                    error!(session_id = %session.id(), error = %err, "Could not expire session");
                }
            }
        }

        if failed > 0 {
            info!(count = failed, "Expired sessions failed");
        }
        Ok(failed)
    }
}
