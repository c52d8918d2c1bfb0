//! `migration_parity` - differential parity and benchmark harness for a
//! compiler migration.
//!
//! A legacy compiler engine is the oracle; a migrated engine consumes the
//! IR the legacy engine emits. The harness runs both over a catalog of
//! fixtures, normalizes and compares their outputs (or diagnostics), and
//! writes a machine-readable report plus a human summary. A separate
//! benchmark mode compares their latency and peak memory.

pub mod bench;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parity;
pub mod report;
pub mod runner;
pub mod util;

pub use error::{ErrorCode, ParityError, Result, StructuredError};
