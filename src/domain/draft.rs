//! Booking draft types
//!
//! A draft is the customer's in-progress wizard state. It lives only inside
//! the active session, is mutated field-by-field as steps complete, and is
//! discarded on submission or reset. The attached pricing breakdown is a
//! memoized recompute, never independent state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::pricing::{Frequency, PriceBreakdown};

/// Service address captured in the first wizard step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub formatted: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub in_service_area: bool,
}

/// Requested date plus the slot label chosen from the availability response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleChoice {
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Access, parking, and free-form instructions from the address-details step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Logistics {
    pub access_notes: Option<String>,
    pub parking: Option<String>,
    pub instructions: Option<String>,
}

/// The in-progress booking accumulated across wizard steps.
///
/// Every field is optional until its step completes; the draft is never
/// partially invalid mid-edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub address: Option<Address>,
    pub service_type: Option<String>,
    pub frequency: Frequency,
    pub square_footage: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    /// Extra-service names in selection order; order is preserved into the
    /// quote's line items.
    pub selected_extras: Vec<String>,
    pub schedule: Option<ScheduleChoice>,
    pub contact: Option<ContactInfo>,
    pub logistics: Option<Logistics>,
    /// Last computed breakdown; a derived cache, refreshed on every update.
    pub pricing: Option<PriceBreakdown>,
}

/// Field-level partial update for a draft.
///
/// Only present fields are merged; absent fields never reset unrelated
/// state. `selected_extras` replaces the whole selection when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftUpdate {
    pub address: Option<Address>,
    pub service_type: Option<String>,
    pub frequency: Option<Frequency>,
    pub square_footage: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub selected_extras: Option<Vec<String>>,
    pub schedule: Option<ScheduleChoice>,
    pub contact: Option<ContactInfo>,
    pub logistics: Option<Logistics>,
}
