//! In-memory platform for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};

use cloudnet_common::{
    AsyncJob, Domain, MutationResponse, NetworkOffering, Project, RemoteNetwork, Result, Zone,
};

use crate::client::{CreateNetworkPayload, ManagementApi, NetworkScope};

#[derive(Default)]
struct FakeState {
    projects: Vec<Project>,
    zones: Vec<Zone>,
    domains: Vec<Domain>,
    offerings: Vec<NetworkOffering>,
    networks: Vec<(Option<String>, RemoteNetwork)>,
    jobs: HashMap<String, VecDeque<AsyncJob>>,
    calls: HashMap<String, usize>,
    next_id: usize,
    async_mutations: bool,
    pending_polls: usize,
    create_error: Option<String>,
    delete_error: Option<String>,
    job_error: Option<String>,
}

/// Platform double that records every call
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let state = FakeState {
            projects: vec![Project {
                id: "p1".to_string(),
                name: "web".to_string(),
                displaytext: "Web Team".to_string(),
            }],
            zones: vec![
                Zone {
                    id: "1".to_string(),
                    name: "z1".to_string(),
                },
                Zone {
                    id: "2".to_string(),
                    name: "z2".to_string(),
                },
            ],
            domains: vec![
                Domain {
                    id: "d1".to_string(),
                    name: "ROOT".to_string(),
                    path: "ROOT".to_string(),
                },
                Domain {
                    id: "d2".to_string(),
                    name: "customers".to_string(),
                    path: "ROOT/customers".to_string(),
                },
            ],
            offerings: vec![
                NetworkOffering {
                    id: "o1".to_string(),
                    name: "DefaultIsolated".to_string(),
                },
                NetworkOffering {
                    id: "o2".to_string(),
                    name: "DefaultShared".to_string(),
                },
            ],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_zones(self, zones: Vec<Zone>) -> Self {
        self.state.lock().zones = zones;
        self
    }

    pub fn with_network(self, id: &str, name: &str, displaytext: &str) -> Self {
        self.state.lock().networks.push((
            None,
            RemoteNetwork {
                id: id.to_string(),
                name: name.to_string(),
                displaytext: displaytext.to_string(),
                ..Default::default()
            },
        ));
        self
    }

    /// Mutations answer with a job handle; each job reports `pending_polls`
    /// pending statuses before finishing
    pub fn with_async_jobs(self, pending_polls: usize) -> Self {
        {
            let mut state = self.state.lock();
            state.async_mutations = true;
            state.pending_polls = pending_polls;
        }
        self
    }

    pub fn failing_create(self, message: &str) -> Self {
        self.state.lock().create_error = Some(message.to_string());
        self
    }

    pub fn failing_delete(self, message: &str) -> Self {
        self.state.lock().delete_error = Some(message.to_string());
        self
    }

    /// Jobs still apply their side effect, then report this error text
    pub fn failing_jobs(self, message: &str) -> Self {
        self.state.lock().job_error = Some(message.to_string());
        self
    }

    /// Queue an explicit status sequence for a job id
    pub fn script_job(&self, job_id: &str, statuses: Vec<AsyncJob>) {
        self.state
            .lock()
            .jobs
            .insert(job_id.to_string(), statuses.into_iter().collect());
    }

    pub fn calls(&self, command: &str) -> usize {
        self.state.lock().calls.get(command).copied().unwrap_or(0)
    }

    /// Number of create and delete calls issued
    pub fn mutations(&self) -> usize {
        self.calls("createNetwork") + self.calls("deleteNetwork")
    }

    pub fn network_count(&self) -> usize {
        self.state.lock().networks.len()
    }

    fn record(state: &mut FakeState, command: &str) {
        *state.calls.entry(command.to_string()).or_default() += 1;
    }

    fn rejection(message: String) -> MutationResponse {
        let mut body = Map::new();
        body.insert("errorcode".to_string(), json!(431));
        body.insert("errortext".to_string(), Value::String(message));
        MutationResponse(body)
    }

    fn finish(state: &mut FakeState, result: Map<String, Value>) -> MutationResponse {
        state.next_id += 1;
        let job_id = format!("job-{}", state.next_id);

        let mut statuses: VecDeque<AsyncJob> = (0..state.pending_polls)
            .map(|_| AsyncJob {
                jobid: Some(job_id.clone()),
                jobstatus: 0,
                jobresult: None,
            })
            .collect();
        let done = match &state.job_error {
            Some(message) => AsyncJob {
                jobid: Some(job_id.clone()),
                jobstatus: 2,
                jobresult: Some(
                    json!({"errorcode": 530, "errortext": message})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                ),
            },
            None => AsyncJob {
                jobid: Some(job_id.clone()),
                jobstatus: 1,
                jobresult: Some(result),
            },
        };
        statuses.push_back(done);
        state.jobs.insert(job_id.clone(), statuses);

        let mut handle = Map::new();
        handle.insert("jobid".to_string(), Value::String(job_id));
        MutationResponse(handle)
    }
}

#[async_trait]
impl ManagementApi for FakePlatform {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "listProjects");
        Ok(state.projects.clone())
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "listZones");
        Ok(state.zones.clone())
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "listDomains");
        Ok(state.domains.clone())
    }

    async fn list_network_offerings(&self) -> Result<Vec<NetworkOffering>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "listNetworkOfferings");
        Ok(state.offerings.clone())
    }

    async fn list_networks(&self, scope: &NetworkScope) -> Result<Vec<RemoteNetwork>> {
        let mut state = self.state.lock();
        Self::record(&mut state, "listNetworks");
        Ok(state
            .networks
            .iter()
            .filter(|(project, _)| *project == scope.project_id)
            .map(|(_, network)| network.clone())
            .collect())
    }

    async fn create_network(&self, payload: &CreateNetworkPayload) -> Result<MutationResponse> {
        let mut state = self.state.lock();
        Self::record(&mut state, "createNetwork");

        if let Some(message) = state.create_error.clone() {
            return Ok(Self::rejection(message));
        }

        state.next_id += 1;
        let network = RemoteNetwork {
            id: format!("net-{}", state.next_id),
            name: payload.name.clone(),
            displaytext: payload.displaytext.clone(),
            zoneid: Some(payload.zoneid.clone()),
            state: Some("Allocated".to_string()),
        };
        state
            .networks
            .push((payload.projectid.clone(), network.clone()));

        let mut result = Map::new();
        result.insert("network".to_string(), serde_json::to_value(&network)?);

        if state.async_mutations {
            Ok(Self::finish(&mut state, result))
        } else {
            Ok(MutationResponse(result))
        }
    }

    async fn delete_network(&self, id: &str) -> Result<MutationResponse> {
        let mut state = self.state.lock();
        Self::record(&mut state, "deleteNetwork");

        if let Some(message) = state.delete_error.clone() {
            return Ok(Self::rejection(message));
        }
        state.networks.retain(|(_, network)| network.id != id);

        let mut result = Map::new();
        result.insert("success".to_string(), Value::Bool(true));

        if state.async_mutations {
            Ok(Self::finish(&mut state, result))
        } else {
            Ok(MutationResponse(result))
        }
    }

    async fn query_async_job_result(&self, job_id: &str) -> Result<AsyncJob> {
        let mut state = self.state.lock();
        Self::record(&mut state, "queryAsyncJobResult");

        let Some(statuses) = state.jobs.get_mut(job_id) else {
            return Ok(AsyncJob {
                jobid: Some(job_id.to_string()),
                jobstatus: 0,
                jobresult: None,
            });
        };

        // The last status sticks
        let job = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(job.unwrap_or_default())
    }
}
