use crate::fixed::{self, Fixed64};
use crate::id::{BotId, MachineId};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// What a bot is doing. Bots refer to machines by id only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotTask {
    #[default]
    Idle,
    /// Travelling to `machine` to collect one unit of `resource`. The bot is
    /// empty-handed.
    MovingToPickup {
        machine: MachineId,
        resource: Resource,
    },
    /// Travelling to `machine` to hand over the carried `resource`.
    MovingToDeliver {
        machine: MachineId,
        resource: Resource,
    },
}

impl BotTask {
    pub fn target(&self) -> Option<MachineId> {
        match *self {
            BotTask::Idle => None,
            BotTask::MovingToPickup { machine, .. } | BotTask::MovingToDeliver { machine, .. } => {
                Some(machine)
            }
        }
    }
}

/// A mobile carrier holding at most one unit of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub x: Fixed64,
    pub y: Fixed64,
    pub payload: Option<Resource>,
    pub task: BotTask,
}

impl Bot {
    /// A new idle, empty-handed bot.
    pub fn new(id: BotId, x: Fixed64, y: Fixed64) -> Self {
        Self {
            id,
            x,
            y,
            payload: None,
            task: BotTask::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.task == BotTask::Idle
    }
}

/// Result of one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub x: Fixed64,
    pub y: Fixed64,
    pub arrived: bool,
}

/// Move from `(x, y)` toward `(tx, ty)` by at most `step`.
///
/// If the remaining distance is less than `step` the position snaps to the
/// target and `arrived` is set; there is no overshoot. A zero or negative
/// step never arrives and never moves.
///
/// The offset is computed on raw bits in 128-bit space: each axis moves by
/// `d * step / dist`, which never exceeds `|d|`, so the new position lies
/// between the start and the target for any pair of coordinates.
pub fn move_towards(x: Fixed64, y: Fixed64, tx: Fixed64, ty: Fixed64, step: Fixed64) -> Movement {
    let dx = fixed::raw_delta(x, tx);
    let dy = fixed::raw_delta(y, ty);
    let dist = fixed::raw_distance(dx, dy);
    let step = step.to_bits().max(0) as u128;

    if dist < step {
        return Movement {
            x: tx,
            y: ty,
            arrived: true,
        };
    }
    if dist == 0 || step == 0 {
        return Movement {
            x,
            y,
            arrived: false,
        };
    }

    // |d| < 2^64 and step < 2^63, so the product fits in i128.
    let advance = |from: Fixed64, d: i128| {
        let offset = d * step as i128 / dist as i128;
        Fixed64::from_bits((from.to_bits() as i128 + offset) as i64)
    };
    Movement {
        x: advance(x, dx),
        y: advance(y, dy),
        arrived: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::fixed_int;

    #[test]
    fn new_bot_is_idle_and_empty() {
        let bot = Bot::new(BotId(1), fixed_int(3), fixed_int(4));
        assert!(bot.is_idle());
        assert_eq!(bot.payload, None);
        assert_eq!(bot.task.target(), None);
    }

    #[test]
    fn target_of_moving_tasks() {
        let pick = BotTask::MovingToPickup {
            machine: MachineId(7),
            resource: Resource::Gear,
        };
        assert_eq!(pick.target(), Some(MachineId(7)));
    }

    #[test]
    fn moves_along_straight_line() {
        let m = move_towards(
            fixed_int(0),
            fixed_int(0),
            fixed_int(30),
            fixed_int(40),
            fixed_int(5),
        );
        assert!(!m.arrived);
        assert_eq!(m.x, fixed_int(3));
        assert_eq!(m.y, fixed_int(4));
    }

    #[test]
    fn snaps_when_within_reach() {
        let m = move_towards(
            fixed_int(0),
            fixed_int(0),
            fixed_int(3),
            fixed_int(4),
            fixed_int(6),
        );
        assert!(m.arrived);
        assert_eq!((m.x, m.y), (fixed_int(3), fixed_int(4)));
    }

    #[test]
    fn exact_step_distance_does_not_arrive() {
        let m = move_towards(
            fixed_int(0),
            fixed_int(0),
            fixed_int(3),
            fixed_int(4),
            fixed_int(5),
        );
        assert!(!m.arrived);
        assert_eq!((m.x, m.y), (fixed_int(3), fixed_int(4)));
    }

    #[test]
    fn already_at_target_arrives() {
        let m = move_towards(
            fixed_int(9),
            fixed_int(9),
            fixed_int(9),
            fixed_int(9),
            fixed_int(1),
        );
        assert!(m.arrived);
    }

    #[test]
    fn crosses_the_full_coordinate_range() {
        let far = fixed_int(2_000_000_000);
        let m = move_towards(-far, fixed_int(0), far, fixed_int(0), fixed_int(5));
        assert!(!m.arrived);
        assert_eq!(m.x, -far + fixed_int(5));
        assert_eq!(m.y, fixed_int(0));
    }

    #[test]
    fn opposite_corners_move_toward_each_other() {
        let far = fixed_int(2_000_000_000);
        let m = move_towards(-far, far, far, -far, fixed_int(10));
        assert!(!m.arrived);
        assert!(m.x > -far && m.x < -far + fixed_int(10), "{m:?}");
        assert!(m.y < far && m.y > far - fixed_int(10), "{m:?}");
    }

    #[test]
    fn negative_step_stays_put() {
        let m = move_towards(
            fixed_int(0),
            fixed_int(0),
            fixed_int(30),
            fixed_int(40),
            fixed_int(-5),
        );
        assert!(!m.arrived);
        assert_eq!((m.x, m.y), (fixed_int(0), fixed_int(0)));
    }

    #[test]
    fn zero_step_stays_put() {
        let m = move_towards(
            fixed_int(9),
            fixed_int(9),
            fixed_int(9),
            fixed_int(9),
            Fixed64::ZERO,
        );
        assert!(!m.arrived);
        assert_eq!((m.x, m.y), (fixed_int(9), fixed_int(9)));
    }
}
