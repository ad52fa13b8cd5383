use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::RelayError;

/// Client for the Foundry ontology object store.
pub struct FoundryClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ObjectPage {
    data: Option<Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

impl FoundryClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Fetch every object of one type, following `nextPageToken` until the
    /// server stops returning one. The first failed page aborts the fetch.
    pub async fn fetch_all(
        &self,
        ontology_rid: &str,
        object_type: &str,
        page_size: u32,
    ) -> Result<Vec<Value>, RelayError> {
        let url = format!(
            "{}/api/v1/ontologies/{}/objects/{}",
            self.base_url, ontology_rid, object_type
        );

        let mut all_objects: Vec<Value> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .header("Accept", "application/json")
                .query(&[("pageSize", page_size.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ObjectPage = decode_response(request.send().await?).await?;

            match page.data {
                Some(Value::Array(items)) => all_objects.extend(items),
                Some(single) => all_objects.push(single),
                None => {}
            }

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
            info!("retrieved {} objects so far", all_objects.len());
        }

        info!("total objects retrieved: {}", all_objects.len());
        Ok(all_objects)
    }

    /// List the ontologies visible to the token.
    pub async fn list_ontologies(&self) -> Result<Vec<Value>, RelayError> {
        let url = format!("{}/api/v1/ontologies", self.base_url);
        let envelope: DataEnvelope = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    /// List the object types defined in an ontology.
    pub async fn list_object_types(&self, ontology_rid: &str) -> Result<Vec<Value>, RelayError> {
        let url = format!("{}/api/v1/ontologies/{}/objectTypes", self.base_url, ontology_rid);
        let envelope: DataEnvelope = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RelayError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;
        decode_response(response).await
    }
}

/// Decode a response body, turning a non-success status into a remote-API
/// error carrying the server's error body: JSON-compacted when it parses,
/// raw text otherwise.
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RelayError> {
    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        let body = match serde_json::from_str::<Value>(&raw) {
            Ok(details) => details.to_string(),
            Err(_) => raw,
        };
        return Err(RelayError::RemoteApi {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
