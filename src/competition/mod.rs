pub mod athlete;
pub mod block;
pub mod metrics;
pub mod record;
pub mod sport;

pub use athlete::{display_name, Athlete, AthleteId};
pub use block::{Block, BlockId, Schedule};
pub use metrics::{Metric, MetricsTable};
pub use record::{BlockScoreRecord, BlockState};
pub use sport::Sport;
