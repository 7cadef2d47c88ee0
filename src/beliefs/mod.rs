//! Health belief model: the belief map, per-turn score rounds and the
//! prompt/report views derived from them.

pub mod defaults;
pub mod map;
pub mod prompt;
pub mod report;
pub mod score;

pub use map::{Belief, BeliefCategory, BeliefMap, BeliefMapError};
pub use prompt::render_belief_prompt;
pub use report::CategoryReport;
pub use score::{BeliefScore, ScoreHistory, ScoreRound};
