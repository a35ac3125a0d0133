//! Validation, resolution and the installed-project catalog

mod assembler;
pub mod catalog;
pub mod resolved;
pub mod validator;

pub use catalog::{AgentEvaluation, Catalog, CatalogError};
pub use resolved::{ResolvedCheckout, ResolvedPipeline};
pub use validator::{validate, ValidationIssue, ValidationReport, Validator};
