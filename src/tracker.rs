use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::types::AtBatEvent;

/// Whether a fetched at-bat should be announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Announce,
    Skip,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("invalid event (game {game_pk}, sequence {sequence_number}): empty event id")]
    InvalidEvent { game_pk: u64, sequence_number: u32 },
}

/// Event ids already announced during this process run.
///
/// Owned by the poll loop. Grows monotonically, except for [`SeenSet::release`]
/// which hands back an id whose announcement never went out.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
    /// Highest sequence number accepted per game.
    high_water: HashMap<u64, u32>,
    /// Ids handed back by `release` and not yet offered again.
    released: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.ids.contains(event_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove an id so the event is offered again on the next poll.
    ///
    /// Returns `false` if the id was not present.
    pub fn release(&mut self, event_id: &str) -> bool {
        let removed = self.ids.remove(event_id);
        if removed {
            self.released.insert(event_id.to_string());
        }
        removed
    }

    /// Track the per-game high-water mark; returns it if `event` falls behind.
    ///
    /// A retry of a released id is expected to be behind and is not flagged.
    fn late_behind(&mut self, id: &str, event: &AtBatEvent) -> Option<u32> {
        if self.released.remove(id) {
            return None;
        }
        let high = self.high_water.entry(event.game_pk).or_insert(event.sequence_number);
        if event.sequence_number < *high {
            Some(*high)
        } else {
            *high = event.sequence_number;
            None
        }
    }
}

/// Dedup gate: insert unseen ids and announce them, skip the rest.
///
/// Only the `Announce` path mutates `seen`. An empty id is rejected without
/// touching `seen`.
pub fn evaluate(seen: &mut SeenSet, event: &AtBatEvent) -> Result<Decision, TrackerError> {
    let id = event.event_id.trim();
    if id.is_empty() {
        return Err(TrackerError::InvalidEvent {
            game_pk: event.game_pk,
            sequence_number: event.sequence_number,
        });
    }

    if seen.ids.contains(id) {
        return Ok(Decision::Skip);
    }

    if let Some(high) = seen.late_behind(id, event) {
        debug!(
            "At-bat {id} arrived out of order (sequence {} < {high})",
            event.sequence_number
        );
    }

    seen.ids.insert(id.to_string());
    Ok(Decision::Announce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn make_event(id: &str, seq: u32) -> AtBatEvent {
        AtBatEvent {
            event_id: id.to_string(),
            sequence_number: seq,
            game_pk: 745_001,
            inning: 1,
            description: String::new(),
            rbi: 0,
            outcome: Outcome::Walk,
        }
    }

    #[test]
    fn first_sighting_announces() {
        let mut seen = SeenSet::new();
        let d = evaluate(&mut seen, &make_event("745001-3", 3)).unwrap();
        assert_eq!(d, Decision::Announce);
        assert!(seen.contains("745001-3"));
    }

    #[test]
    fn repeat_delivery_skips() {
        let mut seen = SeenSet::new();
        let e = make_event("745001-3", 3);
        assert_eq!(evaluate(&mut seen, &e).unwrap(), Decision::Announce);
        assert_eq!(evaluate(&mut seen, &e).unwrap(), Decision::Skip);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn distinct_ids_announce_in_any_order() {
        let mut seen = SeenSet::new();
        for (id, seq) in [("g-7", 7), ("g-2", 2), ("g-40", 40), ("g-0", 0)] {
            assert_eq!(
                evaluate(&mut seen, &make_event(id, seq)).unwrap(),
                Decision::Announce
            );
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn empty_id_is_invalid_and_not_recorded() {
        let mut seen = SeenSet::new();
        evaluate(&mut seen, &make_event("g-1", 1)).unwrap();

        let err = evaluate(&mut seen, &make_event("", 5)).unwrap_err();
        assert_eq!(
            err,
            TrackerError::InvalidEvent {
                game_pk: 745_001,
                sequence_number: 5
            }
        );
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn whitespace_id_is_invalid() {
        let mut seen = SeenSet::new();
        assert!(evaluate(&mut seen, &make_event("   ", 1)).is_err());
        assert!(seen.is_empty());
    }

    #[test]
    fn repeated_in_sequence_scenario() {
        let mut seen = SeenSet::new();
        let a1 = make_event("A1", 1);
        let a2 = make_event("A2", 2);
        let results: Vec<Decision> = [&a1, &a2, &a1]
            .into_iter()
            .map(|e| evaluate(&mut seen, e).unwrap())
            .collect();
        assert_eq!(
            results,
            vec![Decision::Announce, Decision::Announce, Decision::Skip]
        );
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn empty_poll_leaves_set_unchanged() {
        let mut seen = SeenSet::new();
        evaluate(&mut seen, &make_event("A1", 1)).unwrap();
        let events: Vec<AtBatEvent> = Vec::new();
        for e in &events {
            evaluate(&mut seen, e).unwrap();
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn release_allows_reannounce() {
        let mut seen = SeenSet::new();
        let e = make_event("A1", 1);
        evaluate(&mut seen, &e).unwrap();
        assert!(seen.release("A1"));
        assert!(!seen.release("A1"));
        assert_eq!(evaluate(&mut seen, &e).unwrap(), Decision::Announce);
    }

    #[test]
    fn out_of_order_still_announces() {
        let mut seen = SeenSet::new();
        evaluate(&mut seen, &make_event("g-9", 9)).unwrap();
        let d = evaluate(&mut seen, &make_event("g-4", 4)).unwrap();
        assert_eq!(d, Decision::Announce);
        assert_eq!(seen.high_water[&745_001], 9);
    }

    #[test]
    fn retried_release_is_not_flagged_late() {
        let mut seen = SeenSet::new();
        let a1 = make_event("A1", 1);
        evaluate(&mut seen, &a1).unwrap();
        evaluate(&mut seen, &make_event("A2", 5)).unwrap();
        seen.release("A1");

        assert_eq!(seen.late_behind("A1", &a1), None);
        assert!(seen.released.is_empty());
        // A genuinely late first sighting is still flagged.
        assert_eq!(seen.late_behind("A0", &make_event("A0", 0)), Some(5));
        assert_eq!(seen.high_water[&745_001], 5);
    }

    #[test]
    fn retry_after_release_announces_once() {
        let mut seen = SeenSet::new();
        let a1 = make_event("A1", 1);
        evaluate(&mut seen, &a1).unwrap();
        evaluate(&mut seen, &make_event("A2", 5)).unwrap();
        seen.release("A1");

        assert_eq!(evaluate(&mut seen, &a1).unwrap(), Decision::Announce);
        assert!(seen.released.is_empty());
        assert_eq!(evaluate(&mut seen, &a1).unwrap(), Decision::Skip);
    }
}
