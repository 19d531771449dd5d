//! The scheduling, availability, and pricing engine.
//!
//! Everything in this module is pure: inputs arrive as parameters (the rule
//! set, existing bookings, staffing windows) and nothing reads ambient
//! state, so each piece is deterministic and unit-testable in isolation.
//! Handlers and the materializer load data and call in.

pub mod availability;
pub mod draft;
pub mod pricing;
pub mod recurrence;
