use crate::domain::model::SlotKey;
use crate::utils::error::{Result, SignupError};
use std::collections::BTreeMap;

/// Emitted by every ledger mutation so the form layer can keep its bound
/// fields in sync; a `Deactivated` event means the slot's input must go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    Activated(SlotKey),
    Deactivated(SlotKey),
    Clamped { slot: SlotKey, headcount: u32 },
}

/// 按 (日期, 時段, 工作坊) 記錄人數，並確保同一時段的總人數
/// 不超過 party 人數。
///
/// Invariants:
/// - an entry exists only while its headcount is >= 1; reaching 0 removes it
/// - for every (date, timeslot), the sum of headcounts <= party size
#[derive(Debug, Clone)]
pub struct SlotLedger {
    party_size: u32,
    bookings: BTreeMap<SlotKey, u32>,
}

impl SlotLedger {
    pub fn new(party_size: u32) -> Self {
        Self {
            party_size: party_size.max(1),
            bookings: BTreeMap::new(),
        }
    }

    pub fn party_size(&self) -> u32 {
        self.party_size
    }

    pub fn headcount(&self, slot: &SlotKey) -> u32 {
        self.bookings.get(slot).copied().unwrap_or(0)
    }

    pub fn is_active(&self, slot: &SlotKey) -> bool {
        self.bookings.contains_key(slot)
    }

    pub fn bookings(&self) -> impl Iterator<Item = (&SlotKey, u32)> {
        self.bookings.iter().map(|(slot, count)| (slot, *count))
    }

    pub fn bookings_for_date<'a>(&'a self, date: &'a str) -> impl Iterator<Item = (&'a SlotKey, u32)> {
        self.bookings
            .iter()
            .filter(move |(slot, _)| slot.date == date)
            .map(|(slot, count)| (slot, *count))
    }

    /// Party size minus everything already booked at (date, timeslot) by
    /// other workshops. `excluding` is the workshop being adjusted.
    pub fn capacity_remaining(&self, date: &str, timeslot: &str, excluding: Option<&str>) -> u32 {
        let used: u32 = self
            .bookings
            .iter()
            .filter(|(slot, _)| slot.date == date && slot.timeslot == timeslot)
            .filter(|(slot, _)| excluding != Some(slot.workshop.as_str()))
            .map(|(_, count)| *count)
            .sum();
        self.party_size.saturating_sub(used)
    }

    /// Inactive -> active at headcount 1, or active -> removed entirely.
    pub fn toggle(&mut self, slot: &SlotKey) -> Result<Vec<SlotEvent>> {
        if self.bookings.remove(slot).is_some() {
            return Ok(vec![SlotEvent::Deactivated(slot.clone())]);
        }
        if self.capacity_remaining(&slot.date, &slot.timeslot, Some(&slot.workshop)) == 0 {
            return Err(SignupError::CapacityExceeded {
                date: slot.date.clone(),
                timeslot: slot.timeslot.clone(),
            });
        }
        self.bookings.insert(slot.clone(), 1);
        Ok(vec![SlotEvent::Activated(slot.clone())])
    }

    /// Silent no-op when the slot is inactive or the timeslot budget is
    /// already spent.
    pub fn increment(&mut self, slot: &SlotKey) -> Vec<SlotEvent> {
        let Some(current) = self.bookings.get(slot).copied() else {
            return Vec::new();
        };
        let budget = self.capacity_remaining(&slot.date, &slot.timeslot, Some(&slot.workshop));
        if current + 1 > budget {
            tracing::debug!(
                "increment ignored, {} at {} {} is at capacity",
                slot.workshop,
                slot.date,
                slot.timeslot
            );
            return Vec::new();
        }
        self.bookings.insert(slot.clone(), current + 1);
        Vec::new()
    }

    pub fn decrement(&mut self, slot: &SlotKey) -> Vec<SlotEvent> {
        let Some(current) = self.bookings.get(slot).copied() else {
            return Vec::new();
        };
        if current <= 1 {
            self.bookings.remove(slot);
            return vec![SlotEvent::Deactivated(slot.clone())];
        }
        self.bookings.insert(slot.clone(), current - 1);
        Vec::new()
    }

    /// Growing never auto-increases existing bookings. Shrinking re-clamps
    /// every (date, timeslot) group in key order so the sum invariant holds
    /// at the new size, deactivating slots that clamp to 0.
    pub fn set_party_size(&mut self, party_size: u32) -> Vec<SlotEvent> {
        let party_size = party_size.max(1);
        let grew = party_size >= self.party_size;
        self.party_size = party_size;
        if grew {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut budgets: BTreeMap<(String, String), u32> = BTreeMap::new();
        let keys: Vec<SlotKey> = self.bookings.keys().cloned().collect();
        for key in keys {
            let budget = budgets
                .entry((key.date.clone(), key.timeslot.clone()))
                .or_insert(party_size);
            let current = self.bookings[&key];
            let clamped = current.min(*budget);
            *budget -= clamped;
            if clamped == 0 {
                self.bookings.remove(&key);
                events.push(SlotEvent::Deactivated(key));
            } else if clamped < current {
                self.bookings.insert(key.clone(), clamped);
                events.push(SlotEvent::Clamped {
                    slot: key,
                    headcount: clamped,
                });
            }
        }
        events
    }
}
