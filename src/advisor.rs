//! Remediation suggestions derived from an [`AlertSet`].
//!
//! Deliberately static templates keyed on category, not parameterized per
//! process. Deduplication falls out of the fixed mapping.

use crate::classify::AlertSet;

const BOTTLENECK_SUGGESTIONS: [&str; 2] = [
    "Close background apps to free up resources.",
    "Optimize high-CPU processes.",
];
const DEADLOCK_SUGGESTION: &str = "Restart affected processes to resolve deadlocks.";
const STARVATION_SUGGESTION: &str = "Adjust CPU priority for starved processes.";
const AFFINITY_SUGGESTION: &str =
    "Reassign processes across multiple CPU cores for better balance.";
const ALL_CLEAR: &str = "System running optimally. No actions needed.";

/// Map an alert set to an ordered list of suggestion strings. An empty alert
/// set yields exactly the one all-clear message.
pub fn advise(alerts: &AlertSet) -> Vec<String> {
    let mut suggestions = Vec::new();

    if !alerts.bottleneck.is_empty() {
        suggestions.extend(BOTTLENECK_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    if !alerts.deadlock.is_empty() {
        suggestions.push(DEADLOCK_SUGGESTION.to_string());
    }
    if !alerts.starvation.is_empty() {
        suggestions.push(STARVATION_SUGGESTION.to_string());
    }
    if !alerts.affinity.is_empty() {
        suggestions.push(AFFINITY_SUGGESTION.to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(ALL_CLEAR.to_string());
    }
    suggestions
}
