//! Shared data model, error taxonomy, and external-collaborator traits for
//! the lease manager.
//!
//! This crate has no event loop of its own; [`lease-manager`] consumes it
//! to run the coordination core. It exists as its own crate so that a
//! [`Store`](store::Store), [`Clock`](clock::Clock), or
//! [`Secretary`](secretary::Secretary) implementation can depend on the
//! types without dragging in the scheduler and façade.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clock;
pub mod error;
pub mod info;
pub mod key;
pub mod request;
pub mod secretary;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{
    CheckError, ClaimError, ConfigError, Invalid, ManagerError, MutateError, RefreshError,
    SecretaryError, StoreError, TokenError, WaitError,
};
pub use info::{LeaseInfo, Trapdoor, TrapdoorKey};
pub use key::LeaseKey;
pub use request::Request;
pub use secretary::{NonEmptySecretary, PermissiveSecretary, Secretary};
pub use store::{Snapshot, Store};
