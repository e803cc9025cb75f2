//! Network validator.
//!
//! Stateless battery of configuration checks. Findings are the product of
//! this module and are never raised as errors.

pub mod checks;
pub mod types;

pub use checks::{run_checks, validate_network, CheckFn, ValidationContext, CHECKS};
pub use types::*;
