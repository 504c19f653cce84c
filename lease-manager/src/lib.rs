//! The lease coordination core: a single-writer event loop that grants,
//! extends, expires, and checks time-bounded exclusive leases on behalf of
//! many concurrent clients.
//!
//! Construct a [`Manager`] with [`Manager::spawn`], backed by a
//! [`lease_core::Store`] such as [`store::MemoryStore`], and call
//! [`Manager::claim`], [`Manager::token`], or
//! [`Manager::wait_until_expired`] from as many client tasks as needed.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod blocks;
pub mod config;
mod event_loop;
mod manager;
mod message;
pub mod store;
mod token;

pub use config::{Config, ConfigBuilder};
pub use manager::Manager;
pub use token::Token;

pub use lease_core::{
    CheckError, ClaimError, ConfigError, LeaseInfo, LeaseKey, ManagerError, Request, Secretary, SecretaryError, Snapshot,
    TokenError, Trapdoor, TrapdoorKey, WaitError,
};
pub use lease_core::{Clock, NonEmptySecretary, PermissiveSecretary, Store, SystemClock};
