//! rowsink-core
//!
//! Types, store trait, errors and configuration shared by the batched-write
//! pipeline (`rowsink-writer`) and the store clients (`rowsink-lance`).

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::StoreClient;
