//! Atlas Search index resource and data source.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{optional_text, part, read_attr, require_attr, write_attr};
use crate::attributes::{AttributeError, AttributeStore};
use crate::client::{AtlasClient, ClientError};
use crate::error::{ProviderError, Result};
use crate::models::{IndexMappings, SearchIndex};
use crate::normalization::{
    SynonymRecord, expand_json_fields, expand_synonyms, flatten_json_fields, flatten_synonyms,
    json_fields_equivalent,
};
use crate::state_id::{SEARCH_INDEX, SEARCH_INDEX_IMPORT};

const RESOURCE: &str = "search index";

fn describe(project_id: &str, cluster_name: &str, index_id: &str) -> String {
    format!(
        "search index {} on cluster {} in project {}",
        index_id, cluster_name, project_id
    )
}

fn state_id(project_id: &str, cluster_name: &str, index_id: &str) -> Result<String> {
    Ok(SEARCH_INDEX.encode_pairs(&[
        ("cluster_name", cluster_name),
        ("index_id", index_id),
        ("project_id", project_id),
    ])?)
}

fn invalid_json(key: &str, resource_id: &str, message: impl Into<String>) -> ProviderError {
    ProviderError::attribute_read(
        key,
        resource_id,
        AttributeError::Deserialize {
            key: key.to_string(),
            message: message.into(),
        },
    )
}

/// Store canonical JSON text unless the stored text already describes the
/// same document, so formatting differences never show up as drift.
fn write_json_attr(
    store: &mut dyn AttributeStore,
    resource_id: &str,
    key: &str,
    value: Option<Value>,
) -> Result<()> {
    let canonical = value.as_ref().map(flatten_json_fields).unwrap_or_default();
    let current: Option<String> = read_attr(store, resource_id, key)?;
    if current
        .as_deref()
        .is_some_and(|text| json_fields_equivalent(text, &canonical))
    {
        return Ok(());
    }
    write_attr(store, resource_id, key, &canonical)
}

fn write_index(store: &mut dyn AttributeStore, resource_id: &str, index: &SearchIndex) -> Result<()> {
    let mappings = index.mappings.clone().unwrap_or_default();

    write_attr(store, resource_id, "name", &index.name)?;
    write_attr(store, resource_id, "database", &index.database)?;
    write_attr(store, resource_id, "collection_name", &index.collection_name)?;
    write_attr(
        store,
        resource_id,
        "analyzer",
        index.analyzer.as_deref().unwrap_or_default(),
    )?;
    write_attr(
        store,
        resource_id,
        "search_analyzer",
        index.search_analyzer.as_deref().unwrap_or_default(),
    )?;
    write_attr(store, resource_id, "mappings_dynamic", &mappings.dynamic)?;
    write_json_attr(
        store,
        resource_id,
        "mappings_fields",
        mappings.fields.map(Value::Object),
    )?;
    write_json_attr(
        store,
        resource_id,
        "analyzers",
        index.analyzers.clone().map(Value::Array),
    )?;
    write_attr(store, resource_id, "synonyms", &flatten_synonyms(&index.synonyms))?;
    write_attr(
        store,
        resource_id,
        "status",
        index.status.as_deref().unwrap_or_default(),
    )?;

    debug!(
        resource_id = %resource_id,
        synonyms = index.synonyms.len(),
        "wrote search index attributes"
    );
    Ok(())
}

/// Request body built from the configured attributes.
fn index_from_store(store: &dyn AttributeStore, resource_id: &str) -> Result<SearchIndex> {
    let fields = match read_attr::<String>(store, resource_id, "mappings_fields")? {
        Some(text) => match expand_json_fields(&text) {
            Ok(None) => None,
            Ok(Some(Value::Object(map))) => Some(map),
            Ok(Some(_)) => {
                return Err(invalid_json("mappings_fields", resource_id, "expected a JSON object"));
            }
            Err(e) => return Err(invalid_json("mappings_fields", resource_id, e.to_string())),
        },
        None => None,
    };
    let analyzers = match read_attr::<String>(store, resource_id, "analyzers")? {
        Some(text) => match expand_json_fields(&text) {
            Ok(None) => None,
            Ok(Some(Value::Array(items))) => Some(items),
            Ok(Some(_)) => {
                return Err(invalid_json("analyzers", resource_id, "expected a JSON array"));
            }
            Err(e) => return Err(invalid_json("analyzers", resource_id, e.to_string())),
        },
        None => None,
    };
    let synonyms: Vec<SynonymRecord> =
        read_attr(store, resource_id, "synonyms")?.unwrap_or_default();

    Ok(SearchIndex {
        name: require_attr(store, resource_id, "name")?,
        database: require_attr(store, resource_id, "database")?,
        collection_name: require_attr(store, resource_id, "collection_name")?,
        analyzer: optional_text(store, resource_id, "analyzer")?,
        search_analyzer: optional_text(store, resource_id, "search_analyzer")?,
        mappings: Some(IndexMappings {
            dynamic: read_attr(store, resource_id, "mappings_dynamic")?.unwrap_or(false),
            fields: fields.filter(|f: &Map<String, Value>| !f.is_empty()),
        }),
        analyzers,
        synonyms: expand_synonyms(&synonyms),
        ..Default::default()
    })
}

/// Data source read by project, cluster and index id.
pub async fn read_data_source(
    client: &dyn AtlasClient,
    store: &mut dyn AttributeStore,
) -> Result<()> {
    let project_id = require_attr(store, RESOURCE, "project_id")?;
    let cluster_name = require_attr(store, RESOURCE, "cluster_name")?;
    let index_id = require_attr(store, RESOURCE, "index_id")?;
    let resource_id = describe(&project_id, &cluster_name, &index_id);

    let index = client
        .get_search_index(&project_id, &cluster_name, &index_id)
        .await
        .map_err(|e| ProviderError::remote("reading", &resource_id, e))?;

    write_index(store, &resource_id, &index)?;
    store.set_id(&state_id(&project_id, &cluster_name, &index_id)?);
    info!(
        project_id = %project_id,
        cluster_name = %cluster_name,
        index_id = %index_id,
        "read search index data source"
    );
    Ok(())
}

pub async fn create(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let project_id = require_attr(store, RESOURCE, "project_id")?;
    let cluster_name = require_attr(store, RESOURCE, "cluster_name")?;
    let resource_id = format!(
        "new search index on cluster {} in project {}",
        cluster_name, project_id
    );
    let request = index_from_store(store, &resource_id)?;

    let created = client
        .create_search_index(&project_id, &cluster_name, &request)
        .await
        .map_err(|e| ProviderError::remote("creating", &resource_id, e))?;
    if created.index_id.is_empty() {
        return Err(ProviderError::remote(
            "creating",
            &resource_id,
            ClientError::MalformedResponse {
                details: "response carries no indexID".to_string(),
            },
        ));
    }

    store.set_id(&state_id(&project_id, &cluster_name, &created.index_id)?);
    info!(
        project_id = %project_id,
        cluster_name = %cluster_name,
        index_id = %created.index_id,
        "created search index"
    );
    read(client, store).await
}

struct IndexKey {
    project_id: String,
    cluster_name: String,
    index_id: String,
}

impl IndexKey {
    fn decode(id: &str) -> Result<Self> {
        let parts = SEARCH_INDEX.decode(id)?;
        Ok(Self {
            project_id: part(&parts, "project_id", id)?,
            cluster_name: part(&parts, "cluster_name", id)?,
            index_id: part(&parts, "index_id", id)?,
        })
    }

    fn describe(&self) -> String {
        describe(&self.project_id, &self.cluster_name, &self.index_id)
    }
}

pub async fn read(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let key = IndexKey::decode(&id)?;
    let resource_id = key.describe();

    let index = match client
        .get_search_index(&key.project_id, &key.cluster_name, &key.index_id)
        .await
    {
        Ok(index) => index,
        Err(ClientError::NotFound { .. }) => {
            warn!(
                project_id = %key.project_id,
                cluster_name = %key.cluster_name,
                index_id = %key.index_id,
                "search index no longer exists, clearing state"
            );
            store.set_id("");
            return Ok(());
        }
        Err(e) => return Err(ProviderError::remote("reading", &resource_id, e)),
    };

    write_attr(store, &resource_id, "project_id", &key.project_id)?;
    write_attr(store, &resource_id, "cluster_name", &key.cluster_name)?;
    write_attr(store, &resource_id, "index_id", &key.index_id)?;
    write_index(store, &resource_id, &index)?;
    store.set_id(&id);
    Ok(())
}

pub async fn update(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let key = IndexKey::decode(&id)?;
    let resource_id = key.describe();

    let request = index_from_store(store, &resource_id)?;
    client
        .update_search_index(&key.project_id, &key.cluster_name, &key.index_id, &request)
        .await
        .map_err(|e| ProviderError::remote("updating", &resource_id, e))?;

    info!(
        project_id = %key.project_id,
        cluster_name = %key.cluster_name,
        index_id = %key.index_id,
        "updated search index"
    );
    read(client, store).await
}

/// Delete the remote index. An index that is already gone counts as deleted.
pub async fn delete(client: &dyn AtlasClient, store: &mut dyn AttributeStore) -> Result<()> {
    let id = store.id().to_string();
    let key = IndexKey::decode(&id)?;

    match client
        .delete_search_index(&key.project_id, &key.cluster_name, &key.index_id)
        .await
    {
        Ok(()) | Err(ClientError::NotFound { .. }) => {}
        Err(e) => return Err(ProviderError::remote("deleting", key.describe(), e)),
    }

    store.set_id("");
    info!(
        project_id = %key.project_id,
        cluster_name = %key.cluster_name,
        index_id = %key.index_id,
        "deleted search index"
    );
    Ok(())
}

/// Import from `{project_id}--{cluster_name}--{index_id}`.
pub async fn import(
    client: &dyn AtlasClient,
    store: &mut dyn AttributeStore,
    import_id: &str,
) -> Result<()> {
    let parts = SEARCH_INDEX_IMPORT.parse(import_id)?;
    let id = SEARCH_INDEX.encode(&parts)?;
    let key = IndexKey::decode(&id)?;

    store.set_id(&id);
    read(client, store).await?;

    if store.id().is_empty() {
        return Err(ProviderError::remote(
            "importing",
            key.describe(),
            ClientError::NotFound {
                resource: RESOURCE.to_string(),
            },
        ));
    }
    Ok(())
}
