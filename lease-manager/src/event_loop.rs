use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use lease_core::{ClaimError, Clock, ManagerError, MutateError, Request, Snapshot, Store, TokenError};

use crate::blocks::Blocks;
use crate::message::{BlockMsg, CheckMsg, ClaimMsg};

/// The single-writer event loop. Owns the store and is the only task that
/// ever calls its mutation methods (invariant I1).
pub(crate) struct EventLoop {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub max_sleep: Duration,
    pub log_context: String,
    pub claim_rx: mpsc::UnboundedReceiver<ClaimMsg>,
    pub check_rx: mpsc::UnboundedReceiver<CheckMsg>,
    pub block_rx: mpsc::UnboundedReceiver<BlockMsg>,
    pub terminal_tx: watch::Sender<Option<ManagerError>>,
    pub terminal_rx: watch::Receiver<Option<ManagerError>>,
    pub blocks: Blocks,
}

impl EventLoop {
    pub async fn run(mut self) {
        tracing::info!(entity = %self.log_context, "lease manager event loop started");

        let mut snapshot = self.store.leases().await;
        let mut wake_at = self.next_wake(&snapshot);
        loop {
            if let Err(err) = self.choose(wake_at).await {
                tracing::warn!(entity = %self.log_context, error = %err, "lease manager event loop stopping");
                self.terminal_tx.send_if_modified(|value| {
                    if value.is_none() {
                        *value = Some(err);
                        true
                    } else {
                        false
                    }
                });
                return;
            }
            snapshot = self.store.leases().await;
            self.blocks.release_absent(&snapshot);
            wake_at = self.next_wake(&snapshot);
        }
    }

    /// One iteration: select among the shutdown signal, the expiry timer,
    /// and the three request channels (§4.1 step 1).
    async fn choose(&mut self, wake_at: Instant) -> Result<(), ManagerError> {
        tokio::select! {
            biased;
            _ = self.terminal_rx.changed() => {
                Err(self.terminal_rx.borrow().clone().unwrap_or(ManagerError::Killed))
            }
            Some(claim) = self.claim_rx.recv() => {
                self.handle_claim(claim).await;
                Ok(())
            }
            Some(check) = self.check_rx.recv() => {
                self.handle_check(check).await;
                Ok(())
            }
            Some(block) = self.block_rx.recv() => {
                self.blocks.register(block.key, block.unblock);
                Ok(())
            }
            _ = self.clock.alarm(wake_at) => self.tick().await,
            else => Err(ManagerError::LoopEnded),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(entity = %self.log_context))]
    async fn handle_claim(&mut self, msg: ClaimMsg) {
        let outcome = self.try_claim(&msg.key, &msg.request).await;
        let _ = msg.reply.send(outcome);
    }

    async fn try_claim(&mut self, key: &lease_core::LeaseKey, request: &Request) -> Result<(), ClaimError> {
        loop {
            let mut terminal_rx = self.terminal_rx.clone();
            tokio::select! {
                biased;
                _ = terminal_rx.changed() => {
                    return Err(terminal_rx.borrow().clone().unwrap_or(ManagerError::Killed).into());
                }
                outcome = self.claim_once(key, request) => {
                    match outcome? {
                        Some(true) => return Ok(()),
                        Some(false) => return Err(ClaimError::Denied(key.clone())),
                        None => continue, // stale snapshot (Invalid); retry, polling shutdown again
                    }
                }
            }
        }
    }

    /// A single claim/extend attempt. `Ok(None)` means the store reported
    /// `Invalid` and the snapshot must be re-read by the caller.
    async fn claim_once(&self, key: &lease_core::LeaseKey, request: &Request) -> Result<Option<bool>, ManagerError> {
        let snapshot = self.store.leases().await;
        let result = match snapshot.get(key) {
            None => self.store.claim_lease(key, request).await,
            Some(info) if info.held_by(&request.holder) => self.store.extend_lease(key, request).await,
            Some(_) => return Ok(Some(false)),
        };
        match result {
            Ok(()) => Ok(Some(true)),
            Err(MutateError::Invalid(_)) => Ok(None),
            Err(MutateError::Fatal(err)) => Err(err.into()),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(entity = %self.log_context))]
    async fn handle_check(&mut self, msg: CheckMsg) {
        let outcome = self.try_check(&msg.key, &msg.holder, msg.trapdoor_key).await;
        let _ = msg.reply.send(outcome);
    }

    async fn try_check(
        &mut self,
        key: &lease_core::LeaseKey,
        holder: &str,
        trapdoor_key: Option<lease_core::TrapdoorKey>,
    ) -> Result<(), TokenError> {
        let snapshot = self.store.leases().await;
        let held = snapshot.get(key).is_some_and(|info| info.held_by(holder));
        let snapshot = if held {
            snapshot
        } else {
            self.store.refresh().await.map_err(ManagerError::from)?;
            self.store.leases().await
        };
        match snapshot.get(key) {
            Some(info) if info.held_by(holder) => {
                if let Some(trapdoor_key) = trapdoor_key {
                    info.trapdoor.attest(&trapdoor_key)?;
                }
                Ok(())
            }
            _ => Err(TokenError::NotHeld(key.clone())),
        }
    }

    /// The only place expiry happens (§4.5). Visits due keys in the
    /// deterministic `(Namespace, ModelUUID, Lease)` order (invariant I3).
    #[tracing::instrument(level = "debug", skip_all, fields(entity = %self.log_context), err)]
    async fn tick(&mut self) -> Result<(), ManagerError> {
        self.store.refresh().await.map_err(ManagerError::from)?;
        let snapshot = self.store.leases().await;
        let now = self.clock.now();
        let mut due: Vec<_> = snapshot
            .iter()
            .filter(|(_, info)| info.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        due.sort();

        let mut expired = Vec::with_capacity(due.len());
        for key in due {
            match self.store.expire_lease(&key).await {
                Ok(()) => expired.push(key),
                Err(MutateError::Invalid(_)) => {}
                Err(MutateError::Fatal(err)) => return Err(err.into()),
            }
        }
        if !expired.is_empty() {
            tracing::debug!(entity = %self.log_context, count = expired.len(), keys = ?expired, "expired leases");
        }
        Ok(())
    }

    /// `next = min(now + max_sleep, min(info.expiry for info in snapshot))`.
    fn next_wake(&self, snapshot: &Snapshot) -> Instant {
        let now = self.clock.now();
        let mut next = now + self.max_sleep;
        for info in snapshot.values() {
            if info.expiry <= next {
                next = info.expiry;
            }
        }
        next
    }
}
