//! Service layer modules for external integrations and background work.

pub mod materializer;
pub mod payments;

pub use payments::PaymentClient;
