//! # Normalization
//!
//! Pure conversions between remote objects and the declarative records kept
//! in the attribute store. *Flatten* goes remote → declarative, *expand* goes
//! declarative → remote. Nothing in here performs I/O or logs.

pub mod matcher;
pub mod notification;
pub mod search_index;
pub mod threshold;

pub use matcher::{MatcherRecord, expand_matchers, flatten_matchers};
pub use notification::{
    NotificationRecord, expand_notifications, flatten_notifications, notifications_equivalent,
    parse_notifications,
};
pub use search_index::{
    SynonymRecord, expand_json_fields, expand_synonyms, flatten_json_fields, flatten_synonyms,
    json_fields_equivalent,
};
pub use threshold::{
    MetricThresholdRecord, ThresholdAttributes, ThresholdRecord, expand_metric_threshold_config,
    expand_threshold_config, flatten_metric_threshold, flatten_metric_threshold_config,
    flatten_threshold, flatten_threshold_config,
};
