//! Notification projections between the tagged [`NotificationChannel`] and the
//! flat, full-width record kept in the attribute store.
//!
//! The API redacts most secrets on read. Flattening therefore takes the
//! previously stored records and carries a secret forward whenever the remote
//! value is missing and a prior record for the same channel can be identified.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::{Notification, NotificationChannel, RemoteNotification, Sensitive};

/// Declarative form of one notification. Every field is always present; the
/// ones that do not apply to `type_name` hold their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationRecord {
    pub api_token: Sensitive,
    pub channel_name: String,
    pub datadog_api_key: Sensitive,
    pub datadog_region: String,
    pub delay_min: i64,
    pub email_address: String,
    pub email_enabled: bool,
    pub flowdock_api_token: Sensitive,
    pub flow_name: String,
    pub interval_min: i64,
    pub mobile_number: String,
    pub ops_genie_api_key: Sensitive,
    pub ops_genie_region: String,
    pub org_name: String,
    pub service_key: Sensitive,
    pub sms_enabled: bool,
    pub team_id: String,
    pub team_name: String,
    pub type_name: String,
    pub username: String,
    pub victor_ops_api_key: Sensitive,
    pub victor_ops_routing_key: Sensitive,
    pub roles: Vec<String>,
    pub microsoft_teams_webhook_url: Sensitive,
    pub webhook_secret: Sensitive,
    pub webhook_url: Sensitive,
}

impl NotificationRecord {
    fn secrets_mut(&mut self) -> [&mut Sensitive; 10] {
        [
            &mut self.api_token,
            &mut self.datadog_api_key,
            &mut self.flowdock_api_token,
            &mut self.ops_genie_api_key,
            &mut self.service_key,
            &mut self.victor_ops_api_key,
            &mut self.victor_ops_routing_key,
            &mut self.microsoft_teams_webhook_url,
            &mut self.webhook_secret,
            &mut self.webhook_url,
        ]
    }

    fn secrets(&self) -> [&Sensitive; 10] {
        [
            &self.api_token,
            &self.datadog_api_key,
            &self.flowdock_api_token,
            &self.ops_genie_api_key,
            &self.service_key,
            &self.victor_ops_api_key,
            &self.victor_ops_routing_key,
            &self.microsoft_teams_webhook_url,
            &self.webhook_secret,
            &self.webhook_url,
        ]
    }

    /// Copy of the record with every secret blanked.
    pub fn public_view(&self) -> NotificationRecord {
        let mut view = self.clone();
        for secret in view.secrets_mut() {
            *secret = Sensitive::default();
        }
        view
    }

    fn same_public_fields(&self, other: &NotificationRecord) -> bool {
        self.public_view() == other.public_view()
    }

    /// No secret the remote echoed back conflicts with a secret `prior` knows.
    fn secrets_agree_with(&self, prior: &NotificationRecord) -> bool {
        self.secrets()
            .into_iter()
            .zip(prior.secrets())
            .all(|(current, previous)| {
                current.is_empty() || previous.is_empty() || current == previous
            })
    }

    /// Fill every empty secret from `prior`.
    fn retain_secrets_from(&mut self, prior: &NotificationRecord) {
        for (secret, previous) in self.secrets_mut().into_iter().zip(prior.secrets()) {
            if secret.is_empty() && !previous.is_empty() {
                *secret = previous.clone();
            }
        }
    }
}

impl From<&Notification> for NotificationRecord {
    fn from(notification: &Notification) -> Self {
        let mut record = NotificationRecord {
            type_name: notification.channel.type_name().to_string(),
            delay_min: notification.delay_min,
            interval_min: notification.interval_min,
            ..Default::default()
        };
        let secret = |value: &Option<Sensitive>| value.clone().unwrap_or_default();

        match &notification.channel {
            NotificationChannel::Group {
                email_enabled,
                sms_enabled,
                roles,
            }
            | NotificationChannel::Org {
                email_enabled,
                sms_enabled,
                roles,
            } => {
                record.email_enabled = *email_enabled;
                record.sms_enabled = *sms_enabled;
                record.roles = roles.clone();
            }
            NotificationChannel::Team {
                team_id,
                team_name,
                email_enabled,
                sms_enabled,
            } => {
                record.team_id = team_id.clone();
                record.team_name = team_name.clone();
                record.email_enabled = *email_enabled;
                record.sms_enabled = *sms_enabled;
            }
            NotificationChannel::User {
                username,
                email_enabled,
                sms_enabled,
            } => {
                record.username = username.clone();
                record.email_enabled = *email_enabled;
                record.sms_enabled = *sms_enabled;
            }
            NotificationChannel::Email {
                email_address,
                email_enabled,
            } => {
                record.email_address = email_address.clone();
                record.email_enabled = *email_enabled;
            }
            NotificationChannel::Sms { mobile_number } => {
                record.mobile_number = mobile_number.clone();
            }
            NotificationChannel::PagerDuty { service_key } => {
                record.service_key = secret(service_key);
            }
            NotificationChannel::Slack {
                api_token,
                channel_name,
            } => {
                record.api_token = secret(api_token);
                record.channel_name = channel_name.clone();
            }
            NotificationChannel::Datadog { api_key, region } => {
                record.datadog_api_key = secret(api_key);
                record.datadog_region = region.clone();
            }
            NotificationChannel::Flowdock {
                api_token,
                flow_name,
                org_name,
            } => {
                record.flowdock_api_token = secret(api_token);
                record.flow_name = flow_name.clone();
                record.org_name = org_name.clone();
            }
            NotificationChannel::OpsGenie { api_key, region } => {
                record.ops_genie_api_key = secret(api_key);
                record.ops_genie_region = region.clone();
            }
            NotificationChannel::VictorOps {
                api_key,
                routing_key,
            } => {
                record.victor_ops_api_key = secret(api_key);
                record.victor_ops_routing_key = secret(routing_key);
            }
            NotificationChannel::Webhook { url, secret: hmac } => {
                record.webhook_url = secret(url);
                record.webhook_secret = secret(hmac);
            }
            NotificationChannel::MicrosoftTeams { webhook_url } => {
                record.microsoft_teams_webhook_url = secret(webhook_url);
            }
        }

        record
    }
}

fn text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn secret(value: &Sensitive) -> Option<Sensitive> {
    value.clone().non_empty()
}

impl From<&NotificationRecord> for RemoteNotification {
    /// Every non-empty field of the record, whether or not it applies to the
    /// channel. Feed through [`Notification::try_from`] to drop the rest.
    fn from(record: &NotificationRecord) -> Self {
        RemoteNotification {
            type_name: text(&record.type_name),
            delay_min: Some(record.delay_min),
            interval_min: Some(record.interval_min),
            email_address: text(&record.email_address),
            email_enabled: Some(record.email_enabled),
            sms_enabled: Some(record.sms_enabled),
            mobile_number: text(&record.mobile_number),
            roles: (!record.roles.is_empty()).then(|| record.roles.clone()),
            username: text(&record.username),
            team_id: text(&record.team_id),
            team_name: text(&record.team_name),
            service_key: secret(&record.service_key),
            api_token: secret(&record.api_token),
            channel_name: text(&record.channel_name),
            datadog_api_key: secret(&record.datadog_api_key),
            datadog_region: text(&record.datadog_region),
            flowdock_api_token: secret(&record.flowdock_api_token),
            flow_name: text(&record.flow_name),
            org_name: text(&record.org_name),
            ops_genie_api_key: secret(&record.ops_genie_api_key),
            ops_genie_region: text(&record.ops_genie_region),
            victor_ops_api_key: secret(&record.victor_ops_api_key),
            victor_ops_routing_key: secret(&record.victor_ops_routing_key),
            webhook_secret: secret(&record.webhook_secret),
            webhook_url: secret(&record.webhook_url),
            microsoft_teams_webhook_url: secret(&record.microsoft_teams_webhook_url),
        }
    }
}

/// Convert remote notifications, failing on the first one whose channel cannot
/// be determined.
pub fn parse_notifications(
    remote: &[RemoteNotification],
) -> Result<Vec<Notification>, ProviderError> {
    remote
        .iter()
        .enumerate()
        .map(|(index, n)| {
            Notification::try_from(n).map_err(|err| match err {
                ProviderError::VariantDetection { object, reason } => {
                    ProviderError::variant_detection(format!("notification[{}] {}", index, object), reason)
                }
                other => other,
            })
        })
        .collect()
}

/// Position of the prior record whose secrets `record` should inherit.
fn match_prior(
    index: usize,
    record: &NotificationRecord,
    prior: &[NotificationRecord],
    used: &[bool],
) -> Option<usize> {
    let same_type = |j: usize| {
        !used[j] && prior[j].type_name == record.type_name && record.secrets_agree_with(&prior[j])
    };

    if index < prior.len() && same_type(index) && prior[index].same_public_fields(record) {
        return Some(index);
    }
    if let Some(j) = (0..prior.len()).find(|&j| same_type(j) && prior[j].same_public_fields(record)) {
        return Some(j);
    }
    (index < prior.len() && same_type(index)).then_some(index)
}

/// One full-width record per notification, in order.
pub fn flatten_notifications(
    notifications: &[Notification],
    prior: &[NotificationRecord],
) -> Vec<NotificationRecord> {
    let mut used = vec![false; prior.len()];

    notifications
        .iter()
        .enumerate()
        .map(|(index, notification)| {
            let mut record = NotificationRecord::from(notification);
            if let Some(j) = match_prior(index, &record, prior, &used) {
                used[j] = true;
                record.retain_secrets_from(&prior[j]);
            }
            record
        })
        .collect()
}

/// Request bodies for the declared notifications. Each record is resolved to
/// its channel first so that fields foreign to the channel are never sent.
pub fn expand_notifications(
    records: &[NotificationRecord],
) -> Result<Vec<RemoteNotification>, ProviderError> {
    let full: Vec<RemoteNotification> = records.iter().map(RemoteNotification::from).collect();
    let notifications = parse_notifications(&full)?;
    Ok(notifications.iter().map(RemoteNotification::from).collect())
}

/// Whether two record lists hold the same notifications, ignoring order.
pub fn notifications_equivalent(a: &[NotificationRecord], b: &[NotificationRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|left| {
        match (0..b.len()).find(|&j| !used[j] && b[j] == *left) {
            Some(j) => {
                used[j] = true;
                true
            }
            None => false,
        }
    })
}
