//! Pending floor requests, keyed and ordered by floor.
use serde;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;

use crate::dispatch::elevator::Direction;
use crate::dispatch::error::DispatchError;

/// The intent attached to a request. `Up` and `Down` come from hall buttons,
/// `Internal` from a button inside the cabin.
///
/// On the wire this is `1`, `-1` or `0`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CallDirection {
    Up,
    Down,
    Internal,
}

impl TryFrom<i64> for CallDirection {
    type Error = DispatchError;

    fn try_from(value: i64) -> Result<CallDirection, DispatchError> {
        match value {
            1 => Ok(CallDirection::Up),
            -1 => Ok(CallDirection::Down),
            0 => Ok(CallDirection::Internal),
            other => Err(DispatchError::invalid(format!(
                "direction must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<CallDirection> for i64 {
    fn from(call: CallDirection) -> i64 {
        match call {
            CallDirection::Up => 1,
            CallDirection::Down => -1,
            CallDirection::Internal => 0,
        }
    }
}

/// One row of a ledger snapshot.
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PendingFloor {
    pub floor: i64,
    pub directions: Vec<CallDirection>,
}

/// Pending requests, one entry per floor that has at least one tag.
///
/// A single `BTreeMap` answers both the ascending and the descending
/// nearest-floor query with a range lookup, so neither direction needs a
/// second index.
///
/// # Example
/// ```rust
/// use elevator::dispatch::elevator::Direction;
/// use elevator::dispatch::request_ledger::{CallDirection, RequestLedger};
/// let mut ledger = RequestLedger::new();
/// ledger.add(7, CallDirection::Up);
/// ledger.add(2, CallDirection::Internal);
/// assert_eq!(ledger.next_in_direction(3, Direction::Up), Some(7));
/// assert_eq!(ledger.next_in_direction(3, Direction::Down), Some(2));
/// ```
#[derive(PartialEq, Clone, Debug, Default)]
pub struct RequestLedger {
    floors: BTreeMap<i64, BTreeSet<CallDirection>>,
}

impl RequestLedger {
    pub fn new() -> RequestLedger {
        RequestLedger {
            floors: BTreeMap::new(),
        }
    }

    /// Registers `call` at `floor`. Returns false if that exact tag was
    /// already pending.
    pub fn add(&mut self, floor: i64, call: CallDirection) -> bool {
        self.floors.entry(floor).or_default().insert(call)
    }

    /// Clears every tag on `floor`, returning what was there.
    pub fn remove(&mut self, floor: i64) -> Option<BTreeSet<CallDirection>> {
        self.floors.remove(&floor)
    }

    pub fn clear(&mut self) {
        self.floors.clear();
    }

    pub fn contains(&self, floor: i64) -> bool {
        self.floors.contains_key(&floor)
    }

    pub fn has_any(&self) -> bool {
        !self.floors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    /// Nearest pending floor at or beyond `from` in `dirn`. `Idle` has no
    /// sense of travel and always yields `None`.
    pub fn next_in_direction(&self, from: i64, dirn: Direction) -> Option<i64> {
        match dirn {
            Direction::Up => self.floors.range(from..).next().map(|(&f, _)| f),
            Direction::Down => self.floors.range(..=from).next_back().map(|(&f, _)| f),
            Direction::Idle => None,
        }
    }

    /// Pending floor closest to `from`. Ties go to the lower floor.
    pub fn closest_any(&self, from: i64) -> Option<i64> {
        let below = self.next_in_direction(from, Direction::Down);
        let above = self.next_in_direction(from, Direction::Up);
        match (below, above) {
            (Some(b), Some(a)) => {
                if a.abs_diff(from) < from.abs_diff(b) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (below, above) => below.or(above),
        }
    }

    /// Ascending by floor.
    pub fn snapshot(&self) -> Vec<PendingFloor> {
        self.floors
            .iter()
            .map(|(&floor, calls)| PendingFloor {
                floor,
                directions: calls.iter().copied().collect(),
            })
            .collect()
    }
}
