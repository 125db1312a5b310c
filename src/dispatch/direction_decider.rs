use crate::dispatch::elevator::Direction;
use crate::dispatch::request_ledger::RequestLedger;

/// Direction that takes the car from `floor` toward `target`.
pub fn direction_towards(floor: i64, target: i64) -> Direction {
    if target > floor {
        Direction::Up
    } else if target < floor {
        Direction::Down
    } else {
        Direction::Idle
    }
}

/// Picks the travel direction after the car has settled on `floor`.
///
/// Keeps going while anything is pending ahead, otherwise turns around if
/// something is pending behind, otherwise heads for the closest request.
/// Returns `Idle` only when the ledger is empty or the closest request is on
/// `floor` itself.
pub fn choose_direction(orders: &RequestLedger, floor: i64, dirn: Direction) -> Direction {
    if !orders.has_any() {
        return Direction::Idle;
    }
    match dirn {
        Direction::Up | Direction::Down => {
            if orders.next_in_direction(floor, dirn).is_some() {
                return dirn;
            }
            let opposite = dirn.opposite();
            if orders.next_in_direction(floor, opposite).is_some() {
                return opposite;
            }
            re_anchor(orders, floor)
        }
        Direction::Idle => re_anchor(orders, floor),
    }
}

fn re_anchor(orders: &RequestLedger, floor: i64) -> Direction {
    match orders.closest_any(floor) {
        Some(target) => direction_towards(floor, target),
        None => Direction::Idle,
    }
}
