//! # Data Models
//!
//! Remote objects exchanged with the Atlas control-plane API. Wire structs
//! mirror the JSON the API sends and accepts; variant-bearing parts are
//! converted into tagged enums ([`AlertTrigger`], [`NotificationChannel`])
//! before any other code looks at them.

pub mod alert_configuration;
pub mod search_index;
pub mod sensitive;

pub use alert_configuration::{
    AlertConfiguration, AlertTrigger, Matcher, MetricThreshold, Notification,
    NotificationChannel, RemoteNotification, Threshold,
};
pub use search_index::{IndexMappings, SearchIndex, SynonymMapping, SynonymSource};
pub use sensitive::Sensitive;
