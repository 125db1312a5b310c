use log::{debug, info};
use serde;
use std::convert::TryFrom;

use crate::dispatch::direction_decider;
use crate::dispatch::error::DispatchError;
use crate::dispatch::request_ledger::{CallDirection, PendingFloor, RequestLedger};
use crate::util::constants as setting;

/// Travel direction of the car. On the wire this is `1`, `-1` or `0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Idle => Direction::Idle,
        }
    }

    /// Floor change for one step in this direction.
    pub fn delta(self) -> i64 {
        i64::from(self)
    }
}

impl TryFrom<i64> for Direction {
    type Error = DispatchError;

    fn try_from(value: i64) -> Result<Direction, DispatchError> {
        match value {
            1 => Ok(Direction::Up),
            -1 => Ok(Direction::Down),
            0 => Ok(Direction::Idle),
            other => Err(DispatchError::invalid(format!(
                "travel direction must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<Direction> for i64 {
    fn from(dirn: Direction) -> i64 {
        match dirn {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Idle => 0,
        }
    }
}

/// Read-only view of the car handed back by every operation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: String,
    pub current_floor: i64,
    pub direction: Direction,
    pub pending: Vec<PendingFloor>,
    pub next_stop: Option<i64>,
}

/// The dispatch engine. Owns the car position, its travel direction and the
/// pending requests.
///
/// All operations are synchronous and assume exclusive access; callers that
/// share one engine between threads must serialize access themselves.
#[derive(Clone, Debug)]
pub struct Elevator {
    id: String,
    floor: i64,
    dirn: Direction,
    orders: RequestLedger,
}

impl Default for Elevator {
    fn default() -> Elevator {
        Elevator::new(setting::ELEVATOR_ID)
    }
}

impl Elevator {
    pub fn new(id: impl Into<String>) -> Elevator {
        Elevator {
            id: id.into(),
            floor: setting::GROUND_FLOOR,
            dirn: Direction::Idle,
            orders: RequestLedger::new(),
        }
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }
    pub fn get_floor(&self) -> i64 {
        self.floor
    }
    pub fn get_dirn(&self) -> Direction {
        self.dirn
    }
    pub fn get_orders(&self) -> &RequestLedger {
        &self.orders
    }

    pub fn status(&self) -> Status {
        Status {
            id: self.id.clone(),
            current_floor: self.floor,
            direction: self.dirn,
            pending: self.orders.snapshot(),
            next_stop: self.orders.next_in_direction(self.floor, self.dirn),
        }
    }

    /// Registers a request. No range policy is applied here.
    ///
    /// An idle car picks its direction right away; a request for the floor
    /// an idle car is standing on is served on the spot.
    pub fn request_floor(&mut self, floor: i64, call: CallDirection) -> Status {
        if self.orders.add(floor, call) {
            debug!("New order: floor {} ({:?})", floor, call);
        }
        if self.dirn == Direction::Idle {
            match direction_decider::direction_towards(self.floor, floor) {
                Direction::Idle => self.service_floor(),
                dirn => self.set_dirn(dirn),
            }
        }
        self.status()
    }

    /// Same as [`Elevator::request_floor`] with the direction still in its
    /// wire encoding.
    pub fn request(&mut self, floor: i64, direction: i64) -> Result<Status, DispatchError> {
        let call = CallDirection::try_from(direction)?;
        Ok(self.request_floor(floor, call))
    }

    /// Advances the car `steps` times, each step fully resolved before the
    /// next. Fewer than one step is rejected.
    pub fn step(&mut self, steps: i64) -> Result<Status, DispatchError> {
        if steps < 1 {
            return Err(DispatchError::invalid(format!(
                "steps must be at least 1, got {}",
                steps
            )));
        }
        for _ in 0..steps {
            // An idle car with nothing to do stays idle until the next request.
            if self.dirn == Direction::Idle && !self.orders.has_any() {
                break;
            }
            self.step_once();
        }
        Ok(self.status())
    }

    pub fn reset(&mut self) -> Status {
        info!("Resetting {} to ground floor", self.id);
        self.floor = setting::GROUND_FLOOR;
        self.dirn = Direction::Idle;
        self.orders.clear();
        self.status()
    }

    fn step_once(&mut self) {
        if self.dirn == Direction::Idle {
            match self.orders.closest_any(self.floor) {
                None => return,
                Some(target) if target == self.floor => {
                    self.service_floor();
                    return;
                }
                Some(target) => {
                    let dirn = direction_decider::direction_towards(self.floor, target);
                    self.set_dirn(dirn);
                }
            }
        }

        self.floor += self.dirn.delta();
        if self.orders.contains(self.floor) {
            self.service_floor();
        }
        let next = direction_decider::choose_direction(&self.orders, self.floor, self.dirn);
        self.set_dirn(next);
    }

    /// Clears every request on the current floor. Leaves the car idle if
    /// that was the last one.
    fn service_floor(&mut self) {
        if let Some(calls) = self.orders.remove(self.floor) {
            debug!("Servicing floor {}: {:?}", self.floor, calls);
        }
        if !self.orders.has_any() {
            self.set_dirn(Direction::Idle);
        }
    }

    fn set_dirn(&mut self, dirn: Direction) {
        if dirn != self.dirn {
            debug!("Direction {:?} -> {:?} at floor {}", self.dirn, dirn, self.floor);
            self.dirn = dirn;
        }
    }
}
