pub mod breakdown;
pub mod config;
pub mod engine;
pub mod projection;
pub mod stakes;
pub mod standings;
pub mod validation;

pub use breakdown::{compute_breakdown, SportBreakdown, SportTotals};
pub use config::{StakesConfig, StakesTier};
pub use engine::{compute_block_score, sport_points};
pub use projection::{compute_projection, ProjectionResult};
pub use stakes::{compute_stakes, Stakes, StakesTable};
pub use standings::{compute_standings, StandingsSnapshot};
pub use validation::validate_competition;
