//! Alert configuration wire types and their tagged-union counterparts.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::Sensitive;

/// Alert configuration as returned by `GET /groups/{groupId}/alertConfigs/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_id: String,
    #[serde(default)]
    pub event_type_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub matchers: Vec<Matcher>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<MetricThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
    #[serde(default)]
    pub notifications: Vec<RemoteNotification>,
}

impl AlertConfiguration {
    /// Determine which threshold variant this configuration carries.
    pub fn trigger(&self) -> Result<AlertTrigger, ProviderError> {
        AlertTrigger::detect(self.threshold.as_ref(), self.metric_threshold.as_ref())
    }

    /// Replace both threshold slots from a trigger, leaving the unused one empty.
    pub fn set_trigger(&mut self, trigger: AlertTrigger) {
        match trigger {
            AlertTrigger::None => {
                self.threshold = None;
                self.metric_threshold = None;
            }
            AlertTrigger::Threshold(threshold) => {
                self.threshold = Some(threshold);
                self.metric_threshold = None;
            }
            AlertTrigger::Metric(metric) => {
                self.threshold = None;
                self.metric_threshold = Some(metric);
            }
        }
    }
}

/// A single `(field, operator, value)` condition. Order within the list is
/// significant to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

/// Generic threshold, used by non-metric events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl Threshold {
    /// The operator is the discriminant; the API sends all-zero objects in
    /// the unused slot.
    pub fn is_populated(&self) -> bool {
        !self.operator.is_empty()
    }
}

/// Threshold on a named host metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricThreshold {
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl MetricThreshold {
    pub fn is_populated(&self) -> bool {
        !self.metric_name.is_empty()
    }
}

/// The two threshold shapes are mutually exclusive on one configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AlertTrigger {
    #[default]
    None,
    Threshold(Threshold),
    Metric(MetricThreshold),
}

impl AlertTrigger {
    /// Pick the populated variant. Only an all-zero object in the unused slot
    /// counts as absent; anything else without its discriminant is an error.
    pub fn detect(
        threshold: Option<&Threshold>,
        metric: Option<&MetricThreshold>,
    ) -> Result<Self, ProviderError> {
        let threshold = match threshold {
            Some(t) if t.is_populated() => Some(t),
            Some(t) if *t != Threshold::default() => {
                return Err(ProviderError::variant_detection(
                    "threshold",
                    "values are set but operator is empty",
                ));
            }
            _ => None,
        };
        let metric = match metric {
            Some(m) if m.is_populated() => Some(m),
            Some(m) if *m != MetricThreshold::default() => {
                return Err(ProviderError::variant_detection(
                    "metric_threshold",
                    "values are set but metricName is empty",
                ));
            }
            _ => None,
        };

        match (threshold, metric) {
            (Some(_), Some(_)) => Err(ProviderError::variant_detection(
                "alert configuration",
                "both threshold and metric_threshold are populated",
            )),
            (Some(threshold), None) => Ok(AlertTrigger::Threshold(threshold.clone())),
            (None, Some(metric)) => Ok(AlertTrigger::Metric(metric.clone())),
            (None, None) => Ok(AlertTrigger::None),
        }
    }

    pub fn threshold(&self) -> Option<&Threshold> {
        match self {
            AlertTrigger::Threshold(threshold) => Some(threshold),
            _ => None,
        }
    }

    pub fn metric_threshold(&self) -> Option<&MetricThreshold> {
        match self {
            AlertTrigger::Metric(metric) => Some(metric),
            _ => None,
        }
    }
}

/// Notification channel type names as used by the API.
pub mod type_names {
    pub const GROUP: &str = "GROUP";
    pub const ORG: &str = "ORG";
    pub const TEAM: &str = "TEAM";
    pub const USER: &str = "USER";
    pub const EMAIL: &str = "EMAIL";
    pub const SMS: &str = "SMS";
    pub const PAGER_DUTY: &str = "PAGER_DUTY";
    pub const SLACK: &str = "SLACK";
    pub const DATADOG: &str = "DATADOG";
    pub const FLOWDOCK: &str = "FLOWDOCK";
    pub const OPS_GENIE: &str = "OPS_GENIE";
    pub const VICTOR_OPS: &str = "VICTOR_OPS";
    pub const WEBHOOK: &str = "WEBHOOK";
    pub const MICROSOFT_TEAMS: &str = "MICROSOFT_TEAMS";

    pub const ALL: &[&str] = &[
        GROUP,
        ORG,
        TEAM,
        USER,
        EMAIL,
        SMS,
        PAGER_DUTY,
        SLACK,
        DATADOG,
        FLOWDOCK,
        OPS_GENIE,
        VICTOR_OPS,
        WEBHOOK,
        MICROSOFT_TEAMS,
    ];
}

/// Notification exactly as the API sends it: one flat record whose populated
/// fields depend on `typeName`. Secrets are frequently redacted on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadog_api_key: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadog_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowdock_api_token: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_genie_api_key: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_genie_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victor_ops_api_key: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victor_ops_routing_key: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<Sensitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_teams_webhook_url: Option<Sensitive>,
}

/// Channel-specific part of a notification. Only the fields that belong to a
/// channel exist on its variant. Secrets are `None` when redacted by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationChannel {
    Group {
        email_enabled: bool,
        sms_enabled: bool,
        roles: Vec<String>,
    },
    Org {
        email_enabled: bool,
        sms_enabled: bool,
        roles: Vec<String>,
    },
    Team {
        team_id: String,
        team_name: String,
        email_enabled: bool,
        sms_enabled: bool,
    },
    User {
        username: String,
        email_enabled: bool,
        sms_enabled: bool,
    },
    Email {
        email_address: String,
        email_enabled: bool,
    },
    Sms {
        mobile_number: String,
    },
    PagerDuty {
        service_key: Option<Sensitive>,
    },
    Slack {
        api_token: Option<Sensitive>,
        channel_name: String,
    },
    Datadog {
        api_key: Option<Sensitive>,
        region: String,
    },
    Flowdock {
        api_token: Option<Sensitive>,
        flow_name: String,
        org_name: String,
    },
    OpsGenie {
        api_key: Option<Sensitive>,
        region: String,
    },
    VictorOps {
        api_key: Option<Sensitive>,
        routing_key: Option<Sensitive>,
    },
    Webhook {
        url: Option<Sensitive>,
        secret: Option<Sensitive>,
    },
    MicrosoftTeams {
        webhook_url: Option<Sensitive>,
    },
}

impl NotificationChannel {
    pub fn type_name(&self) -> &'static str {
        match self {
            NotificationChannel::Group { .. } => type_names::GROUP,
            NotificationChannel::Org { .. } => type_names::ORG,
            NotificationChannel::Team { .. } => type_names::TEAM,
            NotificationChannel::User { .. } => type_names::USER,
            NotificationChannel::Email { .. } => type_names::EMAIL,
            NotificationChannel::Sms { .. } => type_names::SMS,
            NotificationChannel::PagerDuty { .. } => type_names::PAGER_DUTY,
            NotificationChannel::Slack { .. } => type_names::SLACK,
            NotificationChannel::Datadog { .. } => type_names::DATADOG,
            NotificationChannel::Flowdock { .. } => type_names::FLOWDOCK,
            NotificationChannel::OpsGenie { .. } => type_names::OPS_GENIE,
            NotificationChannel::VictorOps { .. } => type_names::VICTOR_OPS,
            NotificationChannel::Webhook { .. } => type_names::WEBHOOK,
            NotificationChannel::MicrosoftTeams { .. } => type_names::MICROSOFT_TEAMS,
        }
    }
}

/// A notification with its channel resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub delay_min: i64,
    pub interval_min: i64,
    pub channel: NotificationChannel,
}

impl TryFrom<&RemoteNotification> for Notification {
    type Error = ProviderError;

    fn try_from(remote: &RemoteNotification) -> Result<Self, Self::Error> {
        let type_name = remote
            .type_name
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::variant_detection("notification", "missing typeName"))?;

        let required = |field: &'static str, value: &Option<String>| {
            value.clone().filter(|v| !v.is_empty()).ok_or_else(|| {
                ProviderError::variant_detection(
                    format!("{} notification", type_name),
                    format!("missing required field `{}`", field),
                )
            })
        };
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let flag = |value: Option<bool>| value.unwrap_or(false);
        let secret = |value: &Option<Sensitive>| value.clone().and_then(Sensitive::revealed);

        let channel = match type_name {
            type_names::GROUP => NotificationChannel::Group {
                email_enabled: flag(remote.email_enabled),
                sms_enabled: flag(remote.sms_enabled),
                roles: remote.roles.clone().unwrap_or_default(),
            },
            type_names::ORG => NotificationChannel::Org {
                email_enabled: flag(remote.email_enabled),
                sms_enabled: flag(remote.sms_enabled),
                roles: remote.roles.clone().unwrap_or_default(),
            },
            type_names::TEAM => NotificationChannel::Team {
                team_id: required("team_id", &remote.team_id)?,
                team_name: text(&remote.team_name),
                email_enabled: flag(remote.email_enabled),
                sms_enabled: flag(remote.sms_enabled),
            },
            type_names::USER => NotificationChannel::User {
                username: required("username", &remote.username)?,
                email_enabled: flag(remote.email_enabled),
                sms_enabled: flag(remote.sms_enabled),
            },
            type_names::EMAIL => NotificationChannel::Email {
                email_address: required("email_address", &remote.email_address)?,
                email_enabled: flag(remote.email_enabled),
            },
            type_names::SMS => NotificationChannel::Sms {
                mobile_number: required("mobile_number", &remote.mobile_number)?,
            },
            type_names::PAGER_DUTY => NotificationChannel::PagerDuty {
                service_key: secret(&remote.service_key),
            },
            type_names::SLACK => NotificationChannel::Slack {
                api_token: secret(&remote.api_token),
                channel_name: text(&remote.channel_name),
            },
            type_names::DATADOG => NotificationChannel::Datadog {
                api_key: secret(&remote.datadog_api_key),
                region: text(&remote.datadog_region),
            },
            type_names::FLOWDOCK => NotificationChannel::Flowdock {
                api_token: secret(&remote.flowdock_api_token),
                flow_name: text(&remote.flow_name),
                org_name: text(&remote.org_name),
            },
            type_names::OPS_GENIE => NotificationChannel::OpsGenie {
                api_key: secret(&remote.ops_genie_api_key),
                region: text(&remote.ops_genie_region),
            },
            type_names::VICTOR_OPS => NotificationChannel::VictorOps {
                api_key: secret(&remote.victor_ops_api_key),
                routing_key: secret(&remote.victor_ops_routing_key),
            },
            type_names::WEBHOOK => NotificationChannel::Webhook {
                url: secret(&remote.webhook_url),
                secret: secret(&remote.webhook_secret),
            },
            type_names::MICROSOFT_TEAMS => NotificationChannel::MicrosoftTeams {
                webhook_url: secret(&remote.microsoft_teams_webhook_url),
            },
            other => {
                return Err(ProviderError::variant_detection(
                    "notification",
                    format!("unknown typeName '{}'", other),
                ));
            }
        };

        Ok(Notification {
            delay_min: remote.delay_min.unwrap_or(0),
            interval_min: remote.interval_min.unwrap_or(0),
            channel,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl From<&Notification> for RemoteNotification {
    /// Only fields belonging to the channel are populated; everything else
    /// stays `None` and is left out of the request body.
    fn from(notification: &Notification) -> Self {
        let mut remote = RemoteNotification {
            type_name: Some(notification.channel.type_name().to_string()),
            delay_min: Some(notification.delay_min),
            // zero means "use the API default"
            interval_min: (notification.interval_min > 0).then_some(notification.interval_min),
            ..Default::default()
        };
        let roles = |roles: &Vec<String>| (!roles.is_empty()).then(|| roles.clone());

        match &notification.channel {
            NotificationChannel::Group {
                email_enabled,
                sms_enabled,
                roles: group_roles,
            }
            | NotificationChannel::Org {
                email_enabled,
                sms_enabled,
                roles: group_roles,
            } => {
                remote.email_enabled = Some(*email_enabled);
                remote.sms_enabled = Some(*sms_enabled);
                remote.roles = roles(group_roles);
            }
            NotificationChannel::Team {
                team_id,
                team_name,
                email_enabled,
                sms_enabled,
            } => {
                remote.team_id = non_empty(team_id);
                remote.team_name = non_empty(team_name);
                remote.email_enabled = Some(*email_enabled);
                remote.sms_enabled = Some(*sms_enabled);
            }
            NotificationChannel::User {
                username,
                email_enabled,
                sms_enabled,
            } => {
                remote.username = non_empty(username);
                remote.email_enabled = Some(*email_enabled);
                remote.sms_enabled = Some(*sms_enabled);
            }
            NotificationChannel::Email {
                email_address,
                email_enabled,
            } => {
                remote.email_address = non_empty(email_address);
                remote.email_enabled = Some(*email_enabled);
            }
            NotificationChannel::Sms { mobile_number } => {
                remote.mobile_number = non_empty(mobile_number);
            }
            NotificationChannel::PagerDuty { service_key } => {
                remote.service_key = service_key.clone();
            }
            NotificationChannel::Slack {
                api_token,
                channel_name,
            } => {
                remote.api_token = api_token.clone();
                remote.channel_name = non_empty(channel_name);
            }
            NotificationChannel::Datadog { api_key, region } => {
                remote.datadog_api_key = api_key.clone();
                remote.datadog_region = non_empty(region);
            }
            NotificationChannel::Flowdock {
                api_token,
                flow_name,
                org_name,
            } => {
                remote.flowdock_api_token = api_token.clone();
                remote.flow_name = non_empty(flow_name);
                remote.org_name = non_empty(org_name);
            }
            NotificationChannel::OpsGenie { api_key, region } => {
                remote.ops_genie_api_key = api_key.clone();
                remote.ops_genie_region = non_empty(region);
            }
            NotificationChannel::VictorOps {
                api_key,
                routing_key,
            } => {
                remote.victor_ops_api_key = api_key.clone();
                remote.victor_ops_routing_key = routing_key.clone();
            }
            NotificationChannel::Webhook { url, secret } => {
                remote.webhook_url = url.clone();
                remote.webhook_secret = secret.clone();
            }
            NotificationChannel::MicrosoftTeams { webhook_url } => {
                remote.microsoft_teams_webhook_url = webhook_url.clone();
            }
        }

        remote
    }
}
