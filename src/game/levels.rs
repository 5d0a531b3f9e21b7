use crate::consts;
use std::time::Duration;

/// The level progression: how many fruits clear a level, how many levels
/// there are, and how fast the snake moves on each one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct LevelSchedule {
    /// Tick period on level 1
    pub(super) base: Duration,

    /// Reduction in the tick period per level
    pub(super) step: Duration,

    /// Lower bound on the tick period
    pub(super) floor: Duration,

    /// Clearing this level wins the game
    pub(super) max_level: u32,

    /// Fruits that must be eaten to clear a level
    pub(super) food_per_level: u32,
}

impl LevelSchedule {
    /// Return the tick period for `level` (1-based)
    pub(super) fn speed_for(&self, level: u32) -> Duration {
        let reduction = self.step.saturating_mul(level.saturating_sub(1));
        self.base.saturating_sub(reduction).max(self.floor)
    }

    /// Is `level` the last one?
    pub(super) fn is_final(&self, level: u32) -> bool {
        level >= self.max_level
    }
}

impl Default for LevelSchedule {
    fn default() -> LevelSchedule {
        LevelSchedule {
            base: consts::BASE_TICK,
            step: consts::TICK_STEP,
            floor: consts::MIN_TICK,
            max_level: consts::MAX_LEVEL,
            food_per_level: consts::FOOD_PER_LEVEL,
        }
    }
}
