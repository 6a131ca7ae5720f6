// Typed, read-only views of the Dataset, DatasetField and Facets objects
// returned by the API. Known fields are named; anything else the server
// sends lands in `extra` and stays reachable through `Resource::get`.

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::pagination::Listing;
use crate::printing::tabulate;
use crate::session::Session;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Mapping-style access over a resource's full JSON object.
pub trait Resource: Serialize + DeserializeOwned {
    /// Collection path, e.g. `/v1/datasets`.
    const PATH: &'static str;

    fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.to_map().keys().cloned().collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.to_map().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.to_map().remove(key)
    }

    /// `GET {PATH}/{id}`. `id` may be a numeric id or a full name.
    fn retrieve(client: &ApiClient, session: &Session, id: &str) -> Result<Self> {
        client.get(session, &format!("{}/{}", Self::PATH, id), &[])
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_genomic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genomic_builds: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Dataset {
    const PATH: &'static str = "/v1/datasets";
}

fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Dataset {
    /// Full name when present, otherwise the id.
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| id_segment(&self.id))
    }

    /// Lazily paginated list of this dataset's fields.
    pub fn fields<'c>(
        &self,
        client: &'c ApiClient,
        session: &'c Session,
    ) -> Result<Listing<'c, DatasetField>> {
        let path = match &self.fields_url {
            Some(url) => url.clone(),
            None => format!("{}/{}/fields", Self::PATH, id_segment(&self.id)),
        };
        Listing::fetch(client, session, &path, &[])
    }

    /// A single field by name.
    pub fn field(&self, client: &ApiClient, session: &Session, name: &str) -> Result<DatasetField> {
        let full_name = self
            .full_name
            .as_deref()
            .ok_or(Error::MissingField("full_name"))?;
        DatasetField::retrieve(client, session, &format!("{}/{}", full_name, name))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetField {
    pub id: Value,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for DatasetField {
    const PATH: &'static str = "/v1/dataset_fields";
}

impl DatasetField {
    /// Server-computed facets for this field.
    pub fn facets(&self, client: &ApiClient, session: &Session, limit: Option<u32>) -> Result<Facets> {
        let path = match &self.facets_url {
            Some(url) => url.clone(),
            None => format!("{}/{}/facets", Self::PATH, id_segment(&self.id)),
        };
        let query: Vec<(&str, String)> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        client.get(session, &path, &query)
    }
}

/// Facet summary for one field. `facets` is left untyped: its shape depends
/// on the field's data type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Facets {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub facets: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pipe-delimited table of fields: name, data type, description.
pub struct FieldTable<'a>(pub &'a [DatasetField]);

impl fmt::Display for FieldTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<&str>> = self
            .0
            .iter()
            .map(|field| {
                vec![
                    field.name.as_str(),
                    field.data_type.as_deref().unwrap_or(""),
                    field.description.as_deref().unwrap_or(""),
                ]
            })
            .collect();
        f.write_str(&tabulate(&["Field", "Data Type", "Description"], &rows))
    }
}
