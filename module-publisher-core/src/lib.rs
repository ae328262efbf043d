#![doc = "module-publisher-core: pipeline library for module-publisher."]

//! Everything needed to publish pinned module versions: reading the module
//! index and version ledger, checking out repositories, building archives,
//! uploading them, and recording the result.
//!
//! External systems sit behind the traits in [`contract`]; the CLI crate
//! provides the S3 implementation of [`contract::ObjectStore`].

pub mod artifact;
pub mod checkout;
pub mod config;
pub mod contract;
pub mod error;
pub mod index_check;
pub mod ledger;
pub mod manifest;
pub mod publish;
pub mod upload;
pub mod workspace;

pub use error::{PublishError, Result};
