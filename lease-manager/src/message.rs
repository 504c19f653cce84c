use tokio::sync::oneshot;

use lease_core::{ClaimError, LeaseKey, Request, TokenError, TrapdoorKey};

/// A claim request in flight on the event loop's request channel.
///
/// The handler side observes the manager's terminal signal itself (there is
/// no separate per-message stop channel) so that a persistently stale
/// snapshot can never starve shutdown (§4.2 of the design this crate
/// descends from).
pub(crate) struct ClaimMsg {
    pub key: LeaseKey,
    pub request: Request,
    pub reply: oneshot::Sender<Result<(), ClaimError>>,
}

/// A check request in flight on the event loop's request channel.
pub(crate) struct CheckMsg {
    pub key: LeaseKey,
    pub holder: String,
    pub trapdoor_key: Option<TrapdoorKey>,
    pub reply: oneshot::Sender<Result<(), TokenError>>,
}

/// A waiter registration in flight on the event loop's request channel.
///
/// `unblock` is dropped (closing the channel) by the registry once the
/// lease is observed absent from the store; the client races receiving on
/// it against its own cancellation and the manager's terminal signal.
pub(crate) struct BlockMsg {
    pub key: LeaseKey,
    pub unblock: oneshot::Sender<()>,
}
