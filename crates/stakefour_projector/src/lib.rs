//! # STAKEFOUR Projector
//!
//! Read model for staked four-in-a-row matches, built purely from the
//! engine's notification stream.
//!
//! ## Design Principles
//!
//! 1. **Downstream only** - reads notifications, never calls back into the engine
//! 2. **No validation** - the engine already enforced every rule
//! 3. **At-least-once tolerant** - duplicates and gaps are both handled
//!
//! ## Example
//!
//! ```rust,ignore
//! use stakefour_projector::{Projection, ProjectorListener};
//!
//! let projection = Arc::new(RwLock::new(Projection::default()));
//! let mut listener = ProjectorListener::attach(Arc::clone(&engine), Arc::clone(&projection));
//! listener.poll();
//! let record = projection.read().get_by_key("00000").cloned();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod listener;
pub mod projection;
pub mod record;

pub use listener::{ListenerHandle, ListenerStats, NotificationSource, ProjectorListener};
pub use projection::{ApplyOutcome, Projection};
pub use record::{record_key, GameRecord, RecordStatus};
