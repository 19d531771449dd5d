//! Domain types and DTOs
//!
//! These types define the data structures for TidyNest entities.

pub mod availability;
pub mod booking;
pub mod draft;
pub mod pricing;

// Re-export commonly used types
pub use availability::*;
pub use booking::*;
pub use draft::*;
pub use pricing::*;
