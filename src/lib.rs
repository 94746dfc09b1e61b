//! Library crate for userdir-tui.
//!
//! This crate exposes the building blocks of the directory screen:
//! - Sectioned, paginated and searchable list state (`controller`)
//! - Alphabetical grouping of fetched pages (`grouping`)
//! - Background page fetching and stale-result detection (`fetch`)
//! - Paged user sources (`source`) and the local account directory (`sys`)
//! - Terminal application state, key bindings and rendering (`app`, `ui`)
//!
//! It is used by the `userdir-tui` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod app;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod grouping;
pub mod model;
pub mod search;
pub mod source;
pub mod sys;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
pub use controller::{ListEvent, UserListController};
/// Convenient error and result types shared across the crate.
pub use error::{DynError, FetchError, Result};
pub use model::{IndexPath, Session, User, UserStatus};
