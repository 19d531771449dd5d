//! Data access for the engine's collaborators.
//!
//! Thin sqlx query functions plus row-to-domain decoding. The engine itself
//! never touches the database; handlers and the materializer read through
//! these and hand plain values in.

pub mod bookings;
pub mod pricing_rules;
pub mod staffing;
pub mod templates;
