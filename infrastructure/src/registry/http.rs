//! HTTP client for the supervision registry
//!
//! | Operation                  | Route                                              |
//! |----------------------------|----------------------------------------------------|
//! | register_project           | `POST /project`                                    |
//! | register_task              | `POST /project/{id}/tasks`                         |
//! | register_run               | `POST /task/{id}/run`                              |
//! | register_tool              | `POST /run/{id}/tool`                              |
//! | register_supervisor        | `POST /project/{id}/supervisor`                    |
//! | register_supervisor_chains | `POST /tool/{id}/supervisors`                      |
//! | get_supervisor_chains      | `GET /tool/{id}/supervisors`                       |
//! | get_tool                   | `GET /tool/{id}`                                   |
//! | log_interaction            | `POST /run/{id}/chat`                              |
//! | send_supervision_request   | `POST /tool_call/{id}/supervision_request`         |
//! | send_supervision_result    | `POST /tool_call/{id}/supervision_request/{rid}/result` |

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use toolwarden_application::{
    ChatFormat, InteractionIds, RegistryError, SupervisionRegistry, SupervisorRegistration,
};
use toolwarden_domain::{
    ChainId, ProjectId, RunId, SupervisionDecision, SupervisionRequestId, SupervisorChain,
    SupervisorId, TaskId, Tool, ToolCallId, ToolId, ToolSpecification,
};
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct Created {
    id: String,
}

/// Registry client over HTTP. Cheap to clone; holds no per-run state.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRegistryClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, RegistryError> {
        debug!("registry request: {}", path);
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, RegistryError> {
        let response = self
            .send(self.client.post(self.url(path)).json(body), path)
            .await?;
        Self::decode(response).await
    }

    async fn post_unit(&self, path: &str, body: &Value) -> Result<(), RegistryError> {
        self.send(self.client.post(self.url(path)).json(body), path)
            .await
            .map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RegistryError> {
        let response = self.send(self.client.get(self.url(path)), path).await?;
        Self::decode(response).await
    }

    async fn create(&self, path: &str, body: &Value) -> Result<String, RegistryError> {
        self.post::<Created>(path, body).await.map(|c| c.id)
    }
}

fn encode(value: &Value) -> String {
    STANDARD.encode(value.to_string())
}

#[async_trait]
impl SupervisionRegistry for HttpRegistryClient {
    async fn register_project(&self, name: &str) -> Result<ProjectId, RegistryError> {
        self.create("/project", &json!({"name": name}))
            .await
            .map(ProjectId::new)
    }

    async fn register_task(&self, project: &ProjectId, name: &str) -> Result<TaskId, RegistryError> {
        self.create(&format!("/project/{}/tasks", project), &json!({"name": name}))
            .await
            .map(TaskId::new)
    }

    async fn register_run(&self, task: &TaskId, name: &str) -> Result<RunId, RegistryError> {
        self.create(&format!("/task/{}/run", task), &json!({"name": name}))
            .await
            .map(RunId::new)
    }

    async fn register_tool(
        &self,
        run: &RunId,
        spec: &ToolSpecification,
    ) -> Result<ToolId, RegistryError> {
        let body = serde_json::to_value(spec).map_err(|e| RegistryError::Decode(e.to_string()))?;
        self.create(&format!("/run/{}/tool", run), &body)
            .await
            .map(ToolId::new)
    }

    async fn register_supervisor(
        &self,
        project: &ProjectId,
        registration: &SupervisorRegistration,
    ) -> Result<SupervisorId, RegistryError> {
        let body =
            serde_json::to_value(registration).map_err(|e| RegistryError::Decode(e.to_string()))?;
        self.create(&format!("/project/{}/supervisor", project), &body)
            .await
            .map(SupervisorId::new)
    }

    async fn register_supervisor_chains(
        &self,
        tool: &ToolId,
        chains: &[Vec<SupervisorId>],
    ) -> Result<(), RegistryError> {
        self.post_unit(&format!("/tool/{}/supervisors", tool), &json!(chains))
            .await
    }

    async fn get_supervisor_chains(
        &self,
        tool: &ToolId,
    ) -> Result<Vec<SupervisorChain>, RegistryError> {
        self.get(&format!("/tool/{}/supervisors", tool)).await
    }

    async fn get_tool(&self, tool: &ToolId) -> Result<Tool, RegistryError> {
        match self.get(&format!("/tool/{}", tool)).await {
            Err(RegistryError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(RegistryError::NotFound {
                    kind: "tool",
                    id: tool.to_string(),
                })
            }
            other => other,
        }
    }

    async fn log_interaction(
        &self,
        run: &RunId,
        format: ChatFormat,
        request: &Value,
        response: &Value,
    ) -> Result<InteractionIds, RegistryError> {
        let body = json!({
            "request_data": encode(request),
            "response_data": encode(response),
            "format": format,
        });
        self.post(&format!("/run/{}/chat", run), &body).await
    }

    async fn send_supervision_request(
        &self,
        tool_call: &ToolCallId,
        supervisor: &SupervisorId,
        chain: &ChainId,
        position: usize,
    ) -> Result<SupervisionRequestId, RegistryError> {
        let body = json!({
            "supervisor_id": supervisor,
            "chain_id": chain,
            "position_in_chain": position,
        });
        self.create(&format!("/tool_call/{}/supervision_request", tool_call), &body)
            .await
            .map(SupervisionRequestId::new)
    }

    async fn send_supervision_result(
        &self,
        tool_call: &ToolCallId,
        request: &SupervisionRequestId,
        decision: &SupervisionDecision,
    ) -> Result<(), RegistryError> {
        let body =
            serde_json::to_value(decision).map_err(|e| RegistryError::Decode(e.to_string()))?;
        self.post_unit(
            &format!(
                "/tool_call/{}/supervision_request/{}/result",
                tool_call, request
            ),
            &body,
        )
        .await
    }
}
