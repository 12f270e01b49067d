//! Dynamic form validation engine.
//!
//! Rule parsing, per-type coercion, compiled validators, schema building
//! and submission evaluation. Storage is reached only through
//! [`store::FormStore`] and external services only through
//! [`external::ExternalCheckClient`].

pub mod coercion;
pub mod error;
pub mod evaluator;
pub mod external;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod store;
pub mod validators;
pub mod value;
