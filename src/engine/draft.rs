//! Draft state machine
//!
//! The wizard walks address → clean-type → details → extras → schedule →
//! contact → address-details → payment, but the engine is
//! transition-agnostic: it offers a shallow field-level merge and a reset.
//! Callers recompute pricing after every merge; the merge itself never
//! touches the cached breakdown beyond invalidating it, keeping the pure
//! calculator decoupled.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::draft::{BookingDraft, DraftUpdate};

/// Merge a partial update into a draft, field by field.
///
/// Absent fields never reset unrelated state; `selected_extras` replaces the
/// whole selection when present. The cached pricing is cleared because it no
/// longer reflects the draft.
pub fn apply_update(draft: &mut BookingDraft, update: DraftUpdate) {
    if let Some(address) = update.address {
        draft.address = Some(address);
    }
    if let Some(service_type) = update.service_type {
        draft.service_type = Some(service_type);
    }
    if let Some(frequency) = update.frequency {
        draft.frequency = frequency;
    }
    if let Some(square_footage) = update.square_footage {
        draft.square_footage = Some(square_footage);
    }
    if let Some(bedrooms) = update.bedrooms {
        draft.bedrooms = Some(bedrooms);
    }
    if let Some(bathrooms) = update.bathrooms {
        draft.bathrooms = Some(bathrooms);
    }
    if let Some(extras) = update.selected_extras {
        draft.selected_extras = extras;
    }
    if let Some(schedule) = update.schedule {
        draft.schedule = Some(schedule);
    }
    if let Some(contact) = update.contact {
        draft.contact = Some(contact);
    }
    if let Some(logistics) = update.logistics {
        draft.logistics = Some(logistics);
    }
    draft.pricing = None;
}

/// In-memory registry of active wizard sessions.
///
/// A draft belongs to exactly one session and never outlives it; nothing
/// here is persisted. Submission is the only caller allowed to remove a
/// session after confirmed success.
#[derive(Default)]
pub struct DraftSessions {
    sessions: RwLock<HashMap<Uuid, BookingDraft>>,
}

impl DraftSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session with an empty draft.
    pub fn create(&self) -> (Uuid, BookingDraft) {
        let id = Uuid::new_v4();
        let draft = BookingDraft::default();
        self.sessions.write().insert(id, draft.clone());
        (id, draft)
    }

    pub fn get(&self, id: Uuid) -> Option<BookingDraft> {
        self.sessions.read().get(&id).cloned()
    }

    /// Merge an update into the session's draft, returning the result.
    pub fn update(&self, id: Uuid, update: DraftUpdate) -> Option<BookingDraft> {
        let mut sessions = self.sessions.write();
        let draft = sessions.get_mut(&id)?;
        apply_update(draft, update);
        Some(draft.clone())
    }

    /// Write back a recomputed breakdown so `get` serves the memoized quote.
    pub fn cache_pricing(&self, id: Uuid, draft: &BookingDraft) {
        if let Some(stored) = self.sessions.write().get_mut(&id) {
            *stored = draft.clone();
        }
    }

    /// Reset the session to an empty draft.
    pub fn reset(&self, id: Uuid) -> Option<BookingDraft> {
        let mut sessions = self.sessions.write();
        let draft = sessions.get_mut(&id)?;
        *draft = BookingDraft::default();
        Some(draft.clone())
    }

    /// Drop the session entirely; called after a confirmed submission.
    pub fn remove(&self, id: Uuid) -> Option<BookingDraft> {
        self.sessions.write().remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::draft::Address;
    use crate::domain::pricing::Frequency;

    fn address(formatted: &str) -> Address {
        Address {
            formatted: formatted.to_string(),
            latitude: None,
            longitude: None,
            city: Some("Portland".to_string()),
            in_service_area: true,
        }
    }

    #[test]
    fn merge_leaves_unrelated_fields_alone() {
        let mut draft = BookingDraft::default();
        apply_update(
            &mut draft,
            DraftUpdate {
                address: Some(address("123 Main St")),
                service_type: Some("Standard Home Cleaning".to_string()),
                ..Default::default()
            },
        );
        apply_update(
            &mut draft,
            DraftUpdate {
                bedrooms: Some(4),
                ..Default::default()
            },
        );

        assert_eq!(draft.address.as_ref().unwrap().formatted, "123 Main St");
        assert_eq!(draft.service_type.as_deref(), Some("Standard Home Cleaning"));
        assert_eq!(draft.bedrooms, Some(4));
    }

    #[test]
    fn merge_replaces_extras_wholesale() {
        let mut draft = BookingDraft::default();
        apply_update(
            &mut draft,
            DraftUpdate {
                selected_extras: Some(vec!["Inside Fridge".to_string()]),
                ..Default::default()
            },
        );
        apply_update(
            &mut draft,
            DraftUpdate {
                selected_extras: Some(vec![
                    "Inside Oven".to_string(),
                    "Inside Fridge".to_string(),
                ]),
                ..Default::default()
            },
        );

        assert_eq!(draft.selected_extras, vec!["Inside Oven", "Inside Fridge"]);
    }

    #[test]
    fn merge_invalidates_cached_pricing() {
        let mut draft = BookingDraft::default();
        draft.pricing = Some(crate::domain::pricing::PriceBreakdown {
            line_items: vec![],
            total: rust_decimal::Decimal::ZERO,
            duration_hours: 2.0,
        });
        apply_update(
            &mut draft,
            DraftUpdate {
                frequency: Some(Frequency::Weekly),
                ..Default::default()
            },
        );
        assert!(draft.pricing.is_none());
    }

    #[test]
    fn sessions_are_isolated_and_resettable() {
        let sessions = DraftSessions::new();
        let (a, _) = sessions.create();
        let (b, _) = sessions.create();

        sessions.update(
            a,
            DraftUpdate {
                bedrooms: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(sessions.get(a).unwrap().bedrooms, Some(2));
        assert_eq!(sessions.get(b).unwrap().bedrooms, None);

        let reset = sessions.reset(a).unwrap();
        assert_eq!(reset, BookingDraft::default());

        assert!(sessions.remove(b).is_some());
        assert!(sessions.get(b).is_none());
    }

    #[test]
    fn update_on_unknown_session_is_none() {
        let sessions = DraftSessions::new();
        assert!(sessions.update(Uuid::new_v4(), DraftUpdate::default()).is_none());
    }
}
