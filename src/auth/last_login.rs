use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::repository::{with_deadline, Repository};

const QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
struct LoginStamp {
    security_id: i64,
    origin: Option<String>,
}

/// Records last-login data off the request path. Dispatch never blocks and
/// never fails the caller; worker failures are only logged.
#[derive(Clone)]
pub struct LastLoginRecorder {
    tx: mpsc::Sender<LoginStamp>,
}

impl LastLoginRecorder {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(repo: Arc<dyn Repository>, deadline: Duration) -> Self {
        let (tx, mut rx) = mpsc::channel::<LoginStamp>(QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(stamp) = rx.recv().await {
                let result = with_deadline(
                    "update login data",
                    deadline,
                    repo.update_login_data(stamp.security_id, stamp.origin.as_deref()),
                )
                .await;
                match result {
                    Ok(()) => debug!(security_id = stamp.security_id, "last login recorded"),
                    Err(e) => warn!(
                        security_id = stamp.security_id,
                        error = %e,
                        "failed to record last login"
                    ),
                }
            }
            debug!("last-login worker stopped");
        });
        Self { tx }
    }

    pub fn record(&self, security_id: i64, origin: Option<String>) {
        let stamp = LoginStamp {
            security_id,
            origin,
        };
        if let Err(e) = self.tx.try_send(stamp) {
            warn!(security_id, error = %e, "last-login queue rejected update");
        }
    }
}
