use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use lease_core::{ClaimError, LeaseKey, ManagerError, Request, Secretary, WaitError};

use crate::blocks::Blocks;
use crate::config::Config;
use crate::event_loop::EventLoop;
use crate::message::{BlockMsg, CheckMsg, ClaimMsg};
use crate::token::Token;

/// Client-facing handle to a running (or already-dead) lease manager.
///
/// Cheap to clone: every clone shares the same underlying event loop.
/// Dropping every clone (and every outstanding [`Token`]) lets the loop
/// observe its channels close and exit on its own.
#[derive(Clone)]
pub struct Manager {
    secretary: Arc<dyn Secretary>,
    claim_tx: mpsc::UnboundedSender<ClaimMsg>,
    check_tx: mpsc::UnboundedSender<CheckMsg>,
    block_tx: mpsc::UnboundedSender<BlockMsg>,
    terminal_tx: watch::Sender<Option<ManagerError>>,
    terminal_rx: watch::Receiver<Option<ManagerError>>,
}

impl Manager {
    /// Validate `config` and spawn the event loop, returning a handle to it.
    #[must_use = "dropping every clone of the returned handle shuts the manager down"]
    pub fn spawn(config: Config) -> Manager {
        let log_context = config.log_context().to_string();
        let Config {
            store,
            clock,
            secretary,
            max_sleep,
            ..
        } = config;

        let (claim_tx, claim_rx) = mpsc::unbounded_channel();
        let (check_tx, check_rx) = mpsc::unbounded_channel();
        let (block_tx, block_rx) = mpsc::unbounded_channel();
        let (terminal_tx, terminal_rx) = watch::channel(None);

        let event_loop = EventLoop {
            store,
            clock,
            max_sleep,
            log_context,
            claim_rx,
            check_rx,
            block_rx,
            terminal_tx: terminal_tx.clone(),
            terminal_rx: terminal_rx.clone(),
            blocks: Blocks::new(),
        };
        tokio::spawn(event_loop.run());

        Manager {
            secretary,
            claim_tx,
            check_tx,
            block_tx,
            terminal_tx,
            terminal_rx,
        }
    }

    /// Construct a manager whose event loop never ran: every client call
    /// immediately fails with `err` (§4.6). Lets a supervisor present a
    /// uniform API for both live and known-broken instances.
    #[must_use]
    pub fn dead(err: ManagerError) -> Manager {
        let (claim_tx, _) = mpsc::unbounded_channel();
        let (check_tx, _) = mpsc::unbounded_channel();
        let (block_tx, _) = mpsc::unbounded_channel();
        let (terminal_tx, terminal_rx) = watch::channel(Some(err));
        Manager {
            secretary: Arc::new(lease_core::PermissiveSecretary),
            claim_tx,
            check_tx,
            block_tx,
            terminal_tx,
            terminal_rx,
        }
    }

    fn terminal(&self) -> Option<ManagerError> {
        self.terminal_rx.borrow().clone()
    }

    /// Claim `lease` for `holder`, or extend it if `holder` already holds
    /// it. `Ok(())` on success; `Err(ClaimError::Denied)` if another holder
    /// currently holds the lease — a normal business outcome, not a fault.
    pub async fn claim(&self, lease: LeaseKey, holder: impl Into<String>, duration: Duration) -> Result<(), ClaimError> {
        let holder = holder.into();
        self.secretary.check_lease(&lease.lease)?;
        self.secretary.check_holder(&holder)?;
        self.secretary.check_duration(duration)?;

        if let Some(err) = self.terminal() {
            return Err(err.into());
        }
        let (reply, reply_rx) = oneshot::channel();
        let msg = ClaimMsg {
            key: lease,
            request: Request::new(holder, duration),
            reply,
        };
        if self.claim_tx.send(msg).is_err() {
            return Err(self.terminal().unwrap_or(ManagerError::LoopEnded).into());
        }
        let mut terminal_rx = self.terminal_rx.clone();
        tokio::select! {
            res = reply_rx => res.unwrap_or(Err(ManagerError::LoopEnded.into())),
            _ = terminal_rx.changed() => Err(terminal_rx.borrow().clone().unwrap_or(ManagerError::LoopEnded).into()),
        }
    }

    /// Build a capability to check whether `holder` currently holds
    /// `lease`. Validated synchronously; the check itself happens when the
    /// returned [`Token`] is invoked.
    pub fn token(&self, lease: LeaseKey, holder: impl Into<String>) -> Token {
        Token {
            key: lease,
            holder: holder.into(),
            check_tx: self.check_tx.clone(),
            terminal_rx: self.terminal_rx.clone(),
        }
    }

    /// Wait until `lease` is absent from the store, or until `cancel`
    /// resolves first.
    ///
    /// Validates `lease` via the configured [`Secretary`] before sending the
    /// block request, the same as [`Manager::claim`].
    ///
    /// `cancel` is any future the caller wants to race against the wait —
    /// typically a `oneshot::Receiver` the caller signals to give up.
    pub async fn wait_until_expired(&self, lease: LeaseKey, cancel: impl std::future::Future<Output = ()>) -> Result<(), WaitError> {
        self.secretary.check_lease(&lease.lease)?;

        if let Some(err) = self.terminal() {
            return Err(err.into());
        }
        let (unblock, unblock_rx) = oneshot::channel();
        let msg = BlockMsg { key: lease, unblock };
        if self.block_tx.send(msg).is_err() {
            return Err(self.terminal().unwrap_or(ManagerError::LoopEnded).into());
        }
        let mut terminal_rx = self.terminal_rx.clone();
        tokio::pin!(cancel);
        tokio::select! {
            _ = unblock_rx => Ok(()),
            _ = cancel => Err(WaitError::Cancelled),
            _ = terminal_rx.changed() => Err(terminal_rx.borrow().clone().unwrap_or(ManagerError::LoopEnded).into()),
        }
    }

    /// Trigger shutdown. Idempotent; every outstanding and future call
    /// observes [`ManagerError::Killed`] within bounded time (invariant I2).
    pub fn kill(&self) {
        self.terminal_tx.send_if_modified(|value| {
            if value.is_none() {
                *value = Some(ManagerError::Killed);
                true
            } else {
                false
            }
        });
    }

    /// Wait for the manager to stop, for any reason, and return the
    /// terminal error it stopped with.
    pub async fn wait(&self) -> ManagerError {
        let mut rx = self.terminal_rx.clone();
        loop {
            if let Some(err) = rx.borrow().clone() {
                return err;
            }
            if rx.changed().await.is_err() {
                return ManagerError::LoopEnded;
            }
        }
    }
}
