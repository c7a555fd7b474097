use serde::{Deserialize, Serialize};

use crate::models::Matcher;

/// Declarative form of one matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherRecord {
    pub field_name: String,
    pub operator: String,
    pub value: String,
}

/// Order-preserving copy of the remote matchers. An empty input yields an
/// empty list, which the store records as "no matchers" rather than unset.
pub fn flatten_matchers(matchers: &[Matcher]) -> Vec<MatcherRecord> {
    matchers
        .iter()
        .map(|m| MatcherRecord {
            field_name: m.field_name.clone(),
            operator: m.operator.clone(),
            value: m.value.clone(),
        })
        .collect()
}

pub fn expand_matchers(records: &[MatcherRecord]) -> Vec<Matcher> {
    records
        .iter()
        .map(|r| Matcher {
            field_name: r.field_name.clone(),
            operator: r.operator.clone(),
            value: r.value.clone(),
        })
        .collect()
}
