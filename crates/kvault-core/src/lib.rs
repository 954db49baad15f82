//! kvault-core: shared types for the kvault backup pipeline
//!
//! This crate carries the pieces every other kvault crate agrees on:
//! the error taxonomy, the `Record` data model (one key/value pair from
//! the cluster store), and the hierarchical key path transformer used to
//! relocate records during restore.

pub mod error;
pub mod record;
pub mod transform;

pub use error::{KvaultError, KvaultResult};
pub use record::{encode_records, exclude_prefixes, parse_records, Record};
pub use transform::{PathTransformer, Relocation};
