pub mod normalize;
pub mod performance;
pub mod scaling;
pub mod selector;
pub mod xp;

pub use performance::{PerformanceMap, WordPerformance};
pub use selector::{BattleAction, PowerTier, SelectOptions};
