//! The five named maintenance strategies and the name→policy resolver the run driver uses.

mod best_fit;
mod first_fit;
mod greedy_least_batch;
mod salus;
mod worst_fit;

pub use best_fit::BestFit;
pub use first_fit::FirstFit;
pub use greedy_least_batch::GreedyLeastBatch;
pub use salus::Salus;
pub use worst_fit::WorstFit;

use crate::error::SimError;
use crate::strategy::MigrationPolicy;

/// Resolves a strategy name (as it would appear in a config file) to its policy.
///
/// # Errors
/// Returns [`SimError::UnknownStrategy`] if `name` is not one of the five named strategies.
pub fn by_name(name: &str) -> Result<Box<dyn MigrationPolicy>, SimError> {
    match name {
        "best_fit" => Ok(Box::new(BestFit)),
        "first_fit" => Ok(Box::new(FirstFit)),
        "worst_fit" => Ok(Box::new(WorstFit)),
        "greedy_least_batch" => Ok(Box::new(GreedyLeastBatch)),
        "salus" => Ok(Box::new(Salus)),
        other => Err(SimError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_five_names() {
        for name in ["best_fit", "first_fit", "worst_fit", "greedy_least_batch", "salus"] {
            assert_eq!(by_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(by_name("bogus"), Err(SimError::UnknownStrategy(_))));
    }
}
