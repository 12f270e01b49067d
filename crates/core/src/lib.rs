//! Dynamic form engine.
//!
//! Turns stored form definitions (typed fields plus rule strings) into
//! immutable [`validation::schema::FormSchema`] values and evaluates end-user
//! submissions against them. No database or HTTP server dependencies; the
//! persistence layer is consumed through [`validation::store::FormStore`].

pub mod error;
pub mod field_type;
pub mod naming;
pub mod reference;
pub mod types;
pub mod validation;
