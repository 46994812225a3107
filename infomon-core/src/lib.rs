//! # Infomon Core
//!
//! Turns a stream of unstructured game output into a typed, queryable store
//! of character facts.
//!
//! - [`parser`]: ordered catalogue of line shapes, each producing absolute
//!   or delta [`Mutation`]s
//! - [`store`]: durable SQLite table with atomic upserts
//! - [`cache`]: write-through, lazily populated in-memory mirror
//! - [`lookup`]: display name to mnemonic tables for trainable abilities
//! - [`status`]: boolean effects and the timer registry seam
//!
//! [`Infomon`] ties them together:
//!
//! ```
//! use infomon_core::{Infomon, ParseOutcome};
//!
//! let infomon = Infomon::open_in_memory()?;
//! let outcome = infomon.parse("You currently have full citizenship in Wehnimer's Landing.")?;
//! assert!(outcome.is_ok());
//! assert_eq!(
//!     infomon.get("citizenship")?,
//!     Some("Wehnimer's Landing".into())
//! );
//! assert_eq!(infomon.parse("A kobold arrives.")?, ParseOutcome::Noop);
//! # Ok::<(), infomon_core::InfomonError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod lookup;
pub mod parser;
pub mod status;
pub mod store;

pub use cache::FactCache;
pub use config::InfomonConfig;
pub use engine::Infomon;
pub use error::{InfomonError, Result};
pub use keys::FactValue;
pub use lookup::PsmCategory;
pub use parser::{LineParser, Mutation, ParseOutcome, Resolution, ShapeId};
pub use status::{EffectTimers, StatusEffect};
pub use store::FactStore;
