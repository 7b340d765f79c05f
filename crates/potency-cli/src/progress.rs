//! Progress indicators for CLI operations

use indicatif::{ProgressBar, ProgressStyle};
use potency_pipeline::Stage;

/// Create a spinner for indeterminate operations
///
/// Draws to stderr, and draws nothing when stderr is not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Spinner text shown while a run is in `stage`
pub fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Validating => "Reading molecules...",
        Stage::Staging => "Preparing workspace...",
        Stage::ComputingDescriptors => "Calculating descriptors...",
        Stage::SelectingFeatures => "Selecting model features...",
        Stage::Predicting => "Predicting pIC50...",
        Stage::Assembling => "Ranking results...",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner() {
        let pb = create_spinner("Processing...");
        assert!(!pb.is_finished());
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }

    #[test]
    fn test_descriptor_stage_message() {
        assert_eq!(
            stage_message(Stage::ComputingDescriptors),
            "Calculating descriptors..."
        );
    }
}
