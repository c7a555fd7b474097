//! Alert configuration resource and data source.

use tracing::{debug, info, warn};

use super::{part, read_attr, require_attr, write_attr};
use crate::attributes::AttributeStore;
use crate::client::{AtlasClient, ClientError};
use crate::error::{ProviderError, Result};
use crate::models::{AlertConfiguration, AlertTrigger};
use crate::normalization::{
    MatcherRecord, MetricThresholdRecord, NotificationRecord, ThresholdAttributes,
    ThresholdRecord, expand_matchers, expand_notifications, flatten_matchers,
    flatten_notifications, notifications_equivalent, parse_notifications,
};
use crate::state_id::{ALERT_CONFIGURATION, ALERT_CONFIGURATION_IMPORT};

const RESOURCE: &str = "alert configuration";

fn describe(project_id: &str, alert_id: &str) -> String {
    format!("alert configuration {} in project {}", alert_id, project_id)
}

fn state_id(project_id: &str, alert_id: &str) -> Result<String> {
    Ok(ALERT_CONFIGURATION.encode_pairs(&[("id", alert_id), ("project_id", project_id)])?)
}

/// Write every remote-derived attribute. The legacy string maps only exist on
/// the data source.
fn write_alert(
    store: &mut dyn AttributeStore,
    resource_id: &str,
    alert: &AlertConfiguration,
    legacy_maps: bool,
) -> Result<()> {
    let trigger = alert.trigger()?;
    let notifications = parse_notifications(&alert.notifications)?;
    let prior: Vec<NotificationRecord> =
        read_attr(store, resource_id, "notification")?.unwrap_or_default();
    let thresholds = ThresholdAttributes::from(&trigger);

    write_attr(store, resource_id, "event_type", &alert.event_type_name)?;
    write_attr(store, resource_id, "created", &alert.created)?;
    write_attr(store, resource_id, "updated", &alert.updated)?;
    if let Some(enabled) = alert.enabled {
        write_attr(store, resource_id, "enabled", &enabled)?;
    }
    write_attr(store, resource_id, "matcher", &flatten_matchers(&alert.matchers))?;
    if legacy_maps {
        write_attr(store, resource_id, "metric_threshold", &thresholds.metric_threshold)?;
        write_attr(store, resource_id, "threshold", &thresholds.threshold)?;
    }
    write_attr(
        store,
        resource_id,
        "metric_threshold_config",
        &thresholds.metric_threshold_config,
    )?;
    write_attr(store, resource_id, "threshold_config", &thresholds.threshold_config)?;
    // A reordering by the API alone keeps the stored order.
    let mut records = flatten_notifications(&notifications, &prior);
    if notifications_equivalent(&records, &prior) {
        records = prior;
    }
    write_attr(store, resource_id, "notification", &records)?;

    debug!(
        resource_id = %resource_id,
        matchers = alert.matchers.len(),
        notifications = notifications.len(),
        "wrote alert configuration attributes"
    );
    Ok(())
}

/// Request body built from the configured attributes.
fn alert_from_store(store: &dyn AttributeStore, resource_id: &str) -> Result<AlertConfiguration> {
    let event_type_name = require_attr(store, resource_id, "event_type")?;
    let enabled: Option<bool> = read_attr(store, resource_id, "enabled")?;
    let matchers: Vec<MatcherRecord> = read_attr(store, resource_id, "matcher")?.unwrap_or_default();
    let threshold: Vec<ThresholdRecord> =
        read_attr(store, resource_id, "threshold_config")?.unwrap_or_default();
    let metric: Vec<MetricThresholdRecord> =
        read_attr(store, resource_id, "metric_threshold_config")?.unwrap_or_default();
    let notifications: Vec<NotificationRecord> =
        read_attr(store, resource_id, "notification")?.unwrap_or_default();

    let mut alert = AlertConfiguration {
        event_type_name,
        enabled,
        matchers: expand_matchers(&matchers),
        notifications: expand_notifications(&notifications)?,
        ..Default::default()
    };
    alert.set_trigger(AlertTrigger::from_records(&threshold, &metric)?);
    Ok(alert)
}

/// Data source read. `alert_configuration_id` may be a raw remote id or the
/// encoded id of a managed resource.
pub async fn read_data_source(
    client: &dyn AtlasClient,
    store: &mut dyn AttributeStore,
) -> Result<()> {
    let project_id = require_attr(store, RESOURCE, "project_id")?;
    let raw_id = require_attr(store, &format!("project {}", project_id), "alert_configuration_id")?;
    let alert_id = ALERT_CONFIGURATION.part_or_raw(&raw_id, "id")?;
    let resource_id = describe(&project_id, &alert_id);

    let alert = client
        .get_alert_configuration(&project_id, &alert_id)
        .await
        .map_err(|e| ProviderError::remote("reading", &resource_id, e))?;

    write_alert(store, &resource_id, &alert, true)?;

    let remote_id = if alert.id.is_empty() { alert_id } else { alert.id };
    store.set_id(&state_id(&project_id, &remote_id)?);
    info!(project_id = %project_id, alert_id = %remote_id, "read alert configuration data source");
    Ok(())
}

pub async fn create(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let project_id = require_attr(store, RESOURCE, "project_id")?;
    let resource_id = format!("new alert configuration in project {}", project_id);
    let request = alert_from_store(store, &resource_id)?;

    let created = client
        .create_alert_configuration(&project_id, &request)
        .await
        .map_err(|e| ProviderError::remote("creating", &resource_id, e))?;
    if created.id.is_empty() {
        return Err(ProviderError::remote(
            "creating",
            &resource_id,
            ClientError::MalformedResponse {
                details: "response carries no alert configuration id".to_string(),
            },
        ));
    }

    store.set_id(&state_id(&project_id, &created.id)?);
    info!(project_id = %project_id, alert_id = %created.id, "created alert configuration");
    read(client, store).await
}

pub async fn read(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let parts = ALERT_CONFIGURATION.decode(&id)?;
    let project_id = part(&parts, "project_id", &id)?;
    let alert_id = part(&parts, "id", &id)?;
    let resource_id = describe(&project_id, &alert_id);

    let alert = match client.get_alert_configuration(&project_id, &alert_id).await {
        Ok(alert) => alert,
        Err(ClientError::NotFound { .. }) => {
            warn!(
                project_id = %project_id,
                alert_id = %alert_id,
                "alert configuration no longer exists, clearing state"
            );
            store.set_id("");
            return Ok(());
        }
        Err(e) => return Err(ProviderError::remote("reading", &resource_id, e)),
    };

    write_attr(store, &resource_id, "project_id", &project_id)?;
    write_attr(store, &resource_id, "alert_configuration_id", &alert_id)?;
    write_alert(store, &resource_id, &alert, false)?;
    store.set_id(&id);
    Ok(())
}

pub async fn update(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let parts = ALERT_CONFIGURATION.decode(&id)?;
    let project_id = part(&parts, "project_id", &id)?;
    let alert_id = part(&parts, "id", &id)?;
    let resource_id = describe(&project_id, &alert_id);

    let request = alert_from_store(store, &resource_id)?;
    client
        .update_alert_configuration(&project_id, &alert_id, &request)
        .await
        .map_err(|e| ProviderError::remote("updating", &resource_id, e))?;

    info!(project_id = %project_id, alert_id = %alert_id, "updated alert configuration");
    read(client, store).await
}

/// Delete the remote object. An object that is already gone counts as deleted.
pub async fn delete(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let parts = ALERT_CONFIGURATION.decode(&id)?;
    let project_id = part(&parts, "project_id", &id)?;
    let alert_id = part(&parts, "id", &id)?;

    match client.delete_alert_configuration(&project_id, &alert_id).await {
        Ok(()) | Err(ClientError::NotFound { .. }) => {}
        Err(e) => {
            return Err(ProviderError::remote(
                "deleting",
                describe(&project_id, &alert_id),
                e,
            ));
        }
    }

    store.set_id("");
    info!(project_id = %project_id, alert_id = %alert_id, "deleted alert configuration");
    Ok(())
}

/// Import from `{project_id}-{alert_id}`.
pub async fn import(
    client: &dyn AtlasClient,
    store: &mut dyn AttributeStore,
    import_id: &str,
) -> Result<()> {
    let parts = ALERT_CONFIGURATION_IMPORT.parse(import_id)?;
    let project_id = part(&parts, "project_id", import_id)?;
    let alert_id = part(&parts, "id", import_id)?;

    store.set_id(&ALERT_CONFIGURATION.encode(&parts)?);
    read(client, store).await?;

    if store.id().is_empty() {
        return Err(ProviderError::remote(
            "importing",
            describe(&project_id, &alert_id),
            ClientError::NotFound {
                resource: RESOURCE.to_string(),
            },
        ));
    }
    Ok(())
}
