use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a machine in the entity store. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u64);

/// Identifies a bot in the entity store. Allocated monotonically, never reused.
///
/// Bots are advanced in ascending `BotId` order every tick, so the ordering
/// of this type is part of the simulation's observable behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BotId(pub u64);

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m-{}", self.0)
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bot-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_id_equality() {
        assert_eq!(MachineId(0), MachineId(0));
        assert_ne!(MachineId(0), MachineId(1));
    }

    #[test]
    fn bot_ids_order_numerically() {
        let mut ids = vec![BotId(10), BotId(2), BotId(7)];
        ids.sort();
        assert_eq!(ids, vec![BotId(2), BotId(7), BotId(10)]);
    }

    #[test]
    fn display_uses_prefixes() {
        assert_eq!(MachineId(3).to_string(), "m-3");
        assert_eq!(BotId(42).to_string(), "bot-42");
    }
}
