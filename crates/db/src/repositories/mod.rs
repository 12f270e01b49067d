//! Repository layer: one unit struct per table, static async methods
//! taking a `&PgPool`.

pub mod field_property_repo;
pub mod field_repo;
pub mod form_repo;

pub use field_property_repo::FieldPropertyRepo;
pub use field_repo::FieldRepo;
pub use form_repo::FormRepo;
