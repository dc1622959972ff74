pub mod percentage;
pub mod target;

pub use percentage::{MoveOutcome, MoveRule, PercentageMoveEvaluator, percent_change};
pub use target::{PassReport, TargetAlertEvaluator};
