pub mod process;
pub mod templates;

pub use process::{ChatProcess, TurnOutcome};
pub use templates::PromptTemplates;
