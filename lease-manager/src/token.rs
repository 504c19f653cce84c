use tokio::sync::{mpsc, oneshot, watch};

use lease_core::{LeaseKey, ManagerError, TokenError, TrapdoorKey};

use crate::message::CheckMsg;

/// A cheap capability handle returned synchronously by
/// [`crate::Manager::token`].
///
/// A `Token` carries the key, the candidate holder, and a reference back to
/// the manager's check channel; it is logically a weak reference to the
/// manager (§9 design notes) — invoking it after the manager has stopped
/// observes the terminal signal rather than hanging.
#[derive(Clone)]
pub struct Token {
    pub(crate) key: LeaseKey,
    pub(crate) holder: String,
    pub(crate) check_tx: mpsc::UnboundedSender<CheckMsg>,
    pub(crate) terminal_rx: watch::Receiver<Option<ManagerError>>,
}

impl Token {
    /// Perform the check: does the asserted holder currently hold this key?
    pub async fn check(&self) -> Result<(), TokenError> {
        self.check_with_trapdoor(None).await
    }

    /// Perform the check and, if it succeeds and `trapdoor_key` is given,
    /// redeem the trapdoor proof bound to it.
    pub async fn check_with_trapdoor(&self, trapdoor_key: Option<TrapdoorKey>) -> Result<(), TokenError> {
        if let Some(err) = self.terminal_rx.borrow().clone() {
            return Err(err.into());
        }
        let (reply, reply_rx) = oneshot::channel();
        let msg = CheckMsg {
            key: self.key.clone(),
            holder: self.holder.clone(),
            trapdoor_key,
            reply,
        };
        if self.check_tx.send(msg).is_err() {
            return Err(self.terminal_rx.borrow().clone().unwrap_or(ManagerError::LoopEnded).into());
        }
        let mut terminal_rx = self.terminal_rx.clone();
        tokio::select! {
            res = reply_rx => res.unwrap_or(Err(ManagerError::LoopEnded.into())),
            _ = terminal_rx.changed() => Err(terminal_rx.borrow().clone().unwrap_or(ManagerError::LoopEnded).into()),
        }
    }
}
