//! Threshold projections. Each threshold flavor is exposed two ways: a legacy
//! string map and a typed 0-or-1 element list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::{AlertTrigger, MetricThreshold, Threshold};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub operator: String,
    pub threshold: f64,
    pub units: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholdRecord {
    pub metric_name: String,
    pub operator: String,
    pub threshold: f64,
    pub units: String,
    pub mode: String,
}

/// Locale-independent shortest representation: `5.0` becomes `"5"`.
pub fn format_threshold(value: f64) -> String {
    value.to_string()
}

fn option_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn text_option(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn flatten_threshold(threshold: Option<&Threshold>) -> BTreeMap<String, String> {
    let Some(threshold) = threshold else {
        return BTreeMap::new();
    };
    BTreeMap::from([
        ("operator".to_string(), threshold.operator.clone()),
        ("threshold".to_string(), format_threshold(threshold.threshold)),
        ("units".to_string(), option_text(&threshold.units)),
    ])
}

pub fn flatten_metric_threshold(metric: Option<&MetricThreshold>) -> BTreeMap<String, String> {
    let Some(metric) = metric else {
        return BTreeMap::new();
    };
    BTreeMap::from([
        ("metric_name".to_string(), metric.metric_name.clone()),
        ("operator".to_string(), metric.operator.clone()),
        ("threshold".to_string(), format_threshold(metric.threshold)),
        ("units".to_string(), option_text(&metric.units)),
        ("mode".to_string(), option_text(&metric.mode)),
    ])
}

pub fn flatten_threshold_config(threshold: Option<&Threshold>) -> Vec<ThresholdRecord> {
    threshold
        .map(|t| ThresholdRecord {
            operator: t.operator.clone(),
            threshold: t.threshold,
            units: option_text(&t.units),
        })
        .into_iter()
        .collect()
}

pub fn flatten_metric_threshold_config(
    metric: Option<&MetricThreshold>,
) -> Vec<MetricThresholdRecord> {
    metric
        .map(|m| MetricThresholdRecord {
            metric_name: m.metric_name.clone(),
            operator: m.operator.clone(),
            threshold: m.threshold,
            units: option_text(&m.units),
            mode: option_text(&m.mode),
        })
        .into_iter()
        .collect()
}

pub fn expand_threshold_config(
    records: &[ThresholdRecord],
) -> Result<Option<Threshold>, ProviderError> {
    match records {
        [] => Ok(None),
        [record] => Ok(Some(Threshold {
            operator: record.operator.clone(),
            threshold: record.threshold,
            units: text_option(&record.units),
        })),
        _ => Err(ProviderError::variant_detection(
            "threshold_config",
            format!("expected at most one element, found {}", records.len()),
        )),
    }
}

pub fn expand_metric_threshold_config(
    records: &[MetricThresholdRecord],
) -> Result<Option<MetricThreshold>, ProviderError> {
    match records {
        [] => Ok(None),
        [record] => Ok(Some(MetricThreshold {
            metric_name: record.metric_name.clone(),
            operator: record.operator.clone(),
            threshold: record.threshold,
            units: text_option(&record.units),
            mode: text_option(&record.mode),
        })),
        _ => Err(ProviderError::variant_detection(
            "metric_threshold_config",
            format!("expected at most one element, found {}", records.len()),
        )),
    }
}

impl AlertTrigger {
    /// Build the trigger from both declarative lists. Setting both is rejected.
    pub fn from_records(
        threshold: &[ThresholdRecord],
        metric: &[MetricThresholdRecord],
    ) -> Result<Self, ProviderError> {
        let threshold = expand_threshold_config(threshold)?;
        let metric = expand_metric_threshold_config(metric)?;
        match (threshold, metric) {
            (Some(_), Some(_)) => Err(ProviderError::variant_detection(
                "alert configuration",
                "threshold_config and metric_threshold_config are mutually exclusive",
            )),
            (Some(threshold), None) => Ok(AlertTrigger::Threshold(threshold)),
            (None, Some(metric)) => Ok(AlertTrigger::Metric(metric)),
            (None, None) => Ok(AlertTrigger::None),
        }
    }
}

/// Every threshold-shaped attribute for one trigger. Only the populated side
/// produces output; the other side is an empty map and an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdAttributes {
    pub threshold: BTreeMap<String, String>,
    pub metric_threshold: BTreeMap<String, String>,
    pub threshold_config: Vec<ThresholdRecord>,
    pub metric_threshold_config: Vec<MetricThresholdRecord>,
}

impl From<&AlertTrigger> for ThresholdAttributes {
    fn from(trigger: &AlertTrigger) -> Self {
        ThresholdAttributes {
            threshold: flatten_threshold(trigger.threshold()),
            metric_threshold: flatten_metric_threshold(trigger.metric_threshold()),
            threshold_config: flatten_threshold_config(trigger.threshold()),
            metric_threshold_config: flatten_metric_threshold_config(trigger.metric_threshold()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic() -> Threshold {
        Threshold {
            operator: "GREATER_THAN".to_string(),
            threshold: 5.0,
            units: Some("RAW".to_string()),
        }
    }

    fn metric() -> MetricThreshold {
        MetricThreshold {
            metric_name: "CONNECTIONS_PERCENT".to_string(),
            operator: "GREATER_THAN".to_string(),
            threshold: 80.0,
            units: Some("RAW".to_string()),
            mode: Some("AVERAGE".to_string()),
        }
    }

    #[test]
    fn test_generic_threshold_fills_only_threshold_side() {
        let trigger = AlertTrigger::detect(Some(&generic()), None).unwrap();
        let attrs = ThresholdAttributes::from(&trigger);

        assert_eq!(
            attrs.threshold_config,
            vec![ThresholdRecord {
                operator: "GREATER_THAN".to_string(),
                threshold: 5.0,
                units: "RAW".to_string(),
            }]
        );
        assert!(attrs.metric_threshold_config.is_empty());
        assert!(attrs.metric_threshold.is_empty());
        assert_eq!(attrs.threshold.get("threshold").map(String::as_str), Some("5"));
        assert_eq!(attrs.threshold.get("operator").map(String::as_str), Some("GREATER_THAN"));
    }

    #[test]
    fn test_metric_threshold_fills_only_metric_side() {
        let empty_generic = Threshold::default();
        let trigger = AlertTrigger::detect(Some(&empty_generic), Some(&metric())).unwrap();
        let attrs = ThresholdAttributes::from(&trigger);

        assert_eq!(attrs.metric_threshold_config.len(), 1);
        let record = &attrs.metric_threshold_config[0];
        assert_eq!(record.metric_name, "CONNECTIONS_PERCENT");
        assert_eq!(record.threshold, 80.0);
        assert_eq!(record.mode, "AVERAGE");
        assert!(attrs.threshold_config.is_empty());
        assert!(attrs.threshold.is_empty());
        assert_eq!(attrs.metric_threshold.get("threshold").map(String::as_str), Some("80"));
    }

    #[test]
    fn test_format_threshold_is_shortest_decimal() {
        assert_eq!(format_threshold(5.0), "5");
        assert_eq!(format_threshold(80.5), "80.5");
        assert_eq!(format_threshold(0.1), "0.1");
        assert_eq!(format_threshold(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_absent_units_flatten_to_empty_string() {
        let threshold = Threshold {
            operator: "LESS_THAN".to_string(),
            threshold: 1.5,
            units: None,
        };
        let records = flatten_threshold_config(Some(&threshold));
        assert_eq!(records[0].units, "");

        let expanded = expand_threshold_config(&records).unwrap().unwrap();
        assert_eq!(expanded, threshold);
    }

    #[test]
    fn test_expand_rejects_more_than_one_element() {
        let record = ThresholdRecord::default();
        let err = expand_threshold_config(&[record.clone(), record]).unwrap_err();
        assert!(err.to_string().contains("threshold_config"));
    }

    #[test]
    fn test_from_records_rejects_both_sides() {
        let threshold = flatten_threshold_config(Some(&generic()));
        let metric_records = flatten_metric_threshold_config(Some(&metric()));

        assert!(matches!(
            AlertTrigger::from_records(&threshold, &metric_records),
            Err(ProviderError::VariantDetection { .. })
        ));
        assert_eq!(
            AlertTrigger::from_records(&[], &metric_records).unwrap(),
            AlertTrigger::Metric(metric())
        );
        assert_eq!(AlertTrigger::from_records(&[], &[]).unwrap(), AlertTrigger::None);
    }
}
