//! Client for the cloud management API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use cloudnet_common::{
    ApiConfig, AsyncJob, Domain, Error, HttpMethod, MutationResponse, NetworkOffering,
    NetworkSpec, Project, RemoteNetwork, ResolvedIdentifiers, Result, Zone,
};

use crate::signing;

/// Request timeout for a single API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Narrows the network listing to a project or domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkScope {
    pub project_id: Option<String>,
    pub domain_id: Option<String>,
}

impl NetworkScope {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(id) = &self.project_id {
            params.push(("projectid".to_string(), id.clone()));
        }
        if let Some(id) = &self.domain_id {
            params.push(("domainid".to_string(), id.clone()));
        }
        params
    }
}

/// Arguments of `createNetwork`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNetworkPayload {
    pub name: String,
    pub displaytext: String,
    pub zoneid: String,
    pub networkofferingid: String,
    pub projectid: Option<String>,
    pub domainid: Option<String>,
}

impl CreateNetworkPayload {
    pub fn new(spec: &NetworkSpec, ids: &ResolvedIdentifiers) -> Self {
        Self {
            name: spec.name.clone(),
            displaytext: spec.display_text().to_string(),
            zoneid: ids.zone_id.clone(),
            networkofferingid: ids.network_offering_id.clone(),
            projectid: ids.project_id.clone(),
            domainid: ids.domain_id.clone(),
        }
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("name".to_string(), self.name.clone()),
            ("displaytext".to_string(), self.displaytext.clone()),
            ("zoneid".to_string(), self.zoneid.clone()),
            ("networkofferingid".to_string(), self.networkofferingid.clone()),
        ];
        if let Some(id) = &self.projectid {
            params.push(("projectid".to_string(), id.clone()));
        }
        if let Some(id) = &self.domainid {
            params.push(("domainid".to_string(), id.clone()));
        }
        params
    }
}

/// Calls the provider makes against the platform
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn list_zones(&self) -> Result<Vec<Zone>>;

    async fn list_domains(&self) -> Result<Vec<Domain>>;

    async fn list_network_offerings(&self) -> Result<Vec<NetworkOffering>>;

    async fn list_networks(&self, scope: &NetworkScope) -> Result<Vec<RemoteNetwork>>;

    async fn create_network(&self, payload: &CreateNetworkPayload) -> Result<MutationResponse>;

    async fn delete_network(&self, id: &str) -> Result<MutationResponse>;

    async fn query_async_job_result(&self, job_id: &str) -> Result<AsyncJob>;
}

/// Signed HTTP client for a CloudStack-compatible endpoint
pub struct HttpApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::ClientUnavailable(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Issue one signed command and return the unwrapped `<command>response`
    async fn call(
        &self,
        command: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<Map<String, Value>> {
        debug!("API call {} ({:?})", command, self.config.method);

        params.push(("command".to_string(), command.to_string()));
        params.push(("response".to_string(), "json".to_string()));
        params.push(("apiKey".to_string(), self.config.api_key.clone()));
        let signature = signing::sign(&params, &self.config.api_secret)?;
        params.push(("signature".to_string(), signature));

        let request = match self.config.method {
            HttpMethod::Get => self.http.get(&self.config.endpoint).query(&params),
            HttpMethod::Post => self.http.post(&self.config.endpoint).form(&params),
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} failed: {}", command, e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{} failed: {}", command, e)))?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    body: text,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let inner = unwrap_response(command, body);
        if !status.is_success() && !inner.contains_key("errortext") {
            return Err(Error::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(inner)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        command: &str,
        wrapper: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        let inner = self.call(command, params).await?;
        if let Some(message) = inner.get("errortext").and_then(Value::as_str) {
            return Err(Error::RemoteCall {
                command: command.to_string(),
                message: message.to_string(),
            });
        }

        match inner.get(wrapper) {
            Some(items) => Ok(serde_json::from_value(items.clone())?),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ManagementApi for HttpApiClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.list("listProjects", "project", Vec::new()).await
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list("listZones", "zone", Vec::new()).await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        self.list("listDomains", "domain", Vec::new()).await
    }

    async fn list_network_offerings(&self) -> Result<Vec<NetworkOffering>> {
        self.list("listNetworkOfferings", "networkoffering", Vec::new()).await
    }

    async fn list_networks(&self, scope: &NetworkScope) -> Result<Vec<RemoteNetwork>> {
        self.list("listNetworks", "network", scope.params()).await
    }

    async fn create_network(&self, payload: &CreateNetworkPayload) -> Result<MutationResponse> {
        let inner = self.call("createNetwork", payload.params()).await?;
        Ok(MutationResponse(inner))
    }

    async fn delete_network(&self, id: &str) -> Result<MutationResponse> {
        let inner = self
            .call("deleteNetwork", vec![("id".to_string(), id.to_string())])
            .await?;
        Ok(MutationResponse(inner))
    }

    async fn query_async_job_result(&self, job_id: &str) -> Result<AsyncJob> {
        let inner = self
            .call("queryAsyncJobResult", vec![("jobid".to_string(), job_id.to_string())])
            .await?;
        if let Some(message) = inner.get("errortext").and_then(Value::as_str) {
            return Err(Error::RemoteCall {
                command: "queryAsyncJobResult".to_string(),
                message: message.to_string(),
            });
        }
        Ok(serde_json::from_value(Value::Object(inner))?)
    }
}

/// Strip the `<command>response` envelope
fn unwrap_response(command: &str, body: Value) -> Map<String, Value> {
    let Value::Object(mut outer) = body else {
        return Map::new();
    };

    let key = format!("{}response", command.to_lowercase());
    if let Some(Value::Object(inner)) = outer.remove(&key) {
        return inner;
    }

    // errorresponse and friends
    if outer.len() == 1 {
        let name = outer.keys().next().cloned().unwrap_or_default();
        if name.ends_with("response") && outer[&name].is_object() {
            if let Some(Value::Object(inner)) = outer.remove(&name) {
                return inner;
            }
        }
    }

    outer
}
