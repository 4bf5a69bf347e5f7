//! # Directory Watcher
//!
//! This crate maintains the set of directories fswatcher registers with
//! the operating system and turns raw notifications into [`FsEvent`]s.
//!
//! ## Features
//!
//! - **Recursive Registration**: every directory of a subtree is watched
//!   individually, including trees that appear in one bulk operation
//! - **Exact Ignores**: absolute paths excluded from watching and triggering
//! - **Bounded Delivery**: events reach the consumer through a bounded channel
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  IgnoreFilter ──► WatchManager ──► WatchBackend (notify)       │
//! │                                          │                      │
//! │                                          ▼                      │
//! │                                   EventReceiver ──► FsEvent    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod event;
pub mod ignore;
pub mod manager;

pub use backend::{EventReceiver, NotifyBackend, WatchBackend};
pub use error::{Result, WatcherError};
pub use event::{FsEvent, FsEventKind};
pub use ignore::IgnoreFilter;
pub use manager::WatchManager;
