//! Stateless recommendation engine over per-client state.

pub mod rules;
pub mod types;

pub use self::types::{Priority, Recommendation, RecommendedAction, RuleInput};

use self::rules::rules;

/// Evaluate the whole rule table for one client. Rules fire independently;
/// a client may collect several recommendations.
pub fn evaluate_client(input: &RuleInput) -> Vec<Recommendation> {
    rules()
        .iter()
        .filter_map(|rule| {
            (rule.matches)(input).map(|matched| Recommendation {
                action: rule.action,
                priority: matched.priority,
                client_code: input.client_code.clone(),
                client_name: input.client_name.to_string(),
                title: matched.title,
                rationale: matched.rationale,
            })
        })
        .collect()
}

/// Order recommendations for presentation: priority descending, input
/// order preserved within a priority so the UI never flickers between
/// identical passes.
pub fn rank(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by(|left, right| right.priority.cmp(&left.priority));
    recommendations
}
