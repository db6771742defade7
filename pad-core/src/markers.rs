//! Remote cursor tracking.
//!
//! Each remote participant owns at most one [`CursorMarker`]. Placing a
//! marker for a participant that already has one removes the old marker
//! first; the registry reports both halves as [`MarkerChange`]s so the
//! front-end can mirror them.

use std::collections::HashMap;

use livepad_types::{ParticipantId, Position};

/// Identifier of a marker instance. A new id is issued on every placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    /// Raw value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A labelled cursor for one remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorMarker {
    /// Marker instance id.
    pub id: MarkerId,
    /// Owning participant.
    pub participant: ParticipantId,
    /// Label shown next to the cursor.
    pub name: String,
    /// Document position.
    pub pos: Position,
    /// Label colour hue in degrees (0..360).
    pub hue: u16,
}

/// A change to the set of visible markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerChange {
    /// A marker was placed.
    Placed(CursorMarker),
    /// A marker was removed.
    Removed(CursorMarker),
}

/// Hue for a participant's label.
///
/// Numeric ids spread around the colour wheel in steps of 33 degrees;
/// other ids are hashed (FNV-1a) onto the wheel.
pub fn label_hue(participant: &ParticipantId) -> u16 {
    let seed = participant.numeric().unwrap_or_else(|| {
        participant
            .as_str()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
                (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
            })
    });
    ((seed % 360) * 33 % 360) as u16
}

/// Registry of remote cursor markers, keyed by participant.
#[derive(Debug, Default)]
pub struct CursorRegistry {
    markers: HashMap<ParticipantId, CursorMarker>,
    next_id: u64,
}

impl CursorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place (or move) the marker for `participant`.
    ///
    /// Returns the removal of the previous marker, if any, followed by the
    /// placement of the new one.
    pub fn upsert(&mut self, participant: ParticipantId, name: &str, pos: Position) -> Vec<MarkerChange> {
        let mut changes = Vec::with_capacity(2);
        if let Some(old) = self.markers.remove(&participant) {
            changes.push(MarkerChange::Removed(old));
        }

        self.next_id += 1;
        let marker = CursorMarker {
            id: MarkerId(self.next_id),
            hue: label_hue(&participant),
            participant: participant.clone(),
            name: name.to_string(),
            pos,
        };
        self.markers.insert(participant, marker.clone());
        changes.push(MarkerChange::Placed(marker));
        changes
    }

    /// Remove the marker for `participant`.
    pub fn remove(&mut self, participant: &ParticipantId) -> Option<MarkerChange> {
        self.markers.remove(participant).map(MarkerChange::Removed)
    }

    /// Remove every marker.
    pub fn clear(&mut self) -> Vec<MarkerChange> {
        let mut removed: Vec<CursorMarker> = self.markers.drain().map(|(_, m)| m).collect();
        removed.sort_by_key(|m| m.id);
        removed.into_iter().map(MarkerChange::Removed).collect()
    }

    /// Marker for `participant`, if any.
    pub fn get(&self, participant: &ParticipantId) -> Option<&CursorMarker> {
        self.markers.get(participant)
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// True when no markers exist.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Iterate over all markers (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &CursorMarker> {
        self.markers.values()
    }
}
