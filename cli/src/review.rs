//! `toolwarden review`: supervise one recorded model response offline.

use crate::commands::ReviewArgs;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use toolwarden_application::{
    AllowAll, AuditLogger, ChainSpec, ModelClient, ModelError, ModelRequest, NoAuditLogger,
    RejectAll, SessionBuilder, Supervisor, SupervisorEntry, SupervisorRegistration,
};
use toolwarden_domain::{SupervisorKind, ToolSpecification};
use toolwarden_infrastructure::{
    FileConfig, HttpModelClient, InMemoryRegistry, JsonlAuditLogger, adapter_for,
};
use tracing::{info, warn};

/// Stands in for the model when no API key is configured; fails only if
/// a resample is actually needed.
struct UnavailableModel {
    api_key_env: String,
}

#[async_trait]
impl ModelClient for UnavailableModel {
    async fn create(&self, _request: &ModelRequest) -> Result<Value, ModelError> {
        Err(ModelError::MissingApiKey(self.api_key_env.clone()))
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn model_client(config: &FileConfig) -> Arc<dyn ModelClient> {
    let provider = &config.provider;
    match HttpModelClient::from_env(provider.kind, provider.api_key_env(), provider.timeout()) {
        Ok(client) => {
            let client = client.with_base_url(provider.base_url());
            match &provider.model {
                Some(model) => Arc::new(client.with_model(model)),
                None => Arc::new(client),
            }
        }
        Err(e) => {
            warn!("Resampling is unavailable: {}", e);
            Arc::new(UnavailableModel {
                api_key_env: provider.api_key_env().to_string(),
            })
        }
    }
}

fn audit_logger(config: &FileConfig) -> Arc<dyn AuditLogger> {
    match config.audit.log_path.as_ref().and_then(JsonlAuditLogger::new) {
        Some(logger) => {
            info!("Audit trail: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoAuditLogger),
    }
}

fn policy_chain(name: String, allow: bool) -> ChainSpec {
    let (label, supervisor) = if allow {
        let supervisor: Arc<dyn Supervisor> = Arc::new(AllowAll);
        ("allow_all".to_string(), supervisor)
    } else {
        let supervisor: Arc<dyn Supervisor> =
            Arc::new(RejectAll::new(format!("The tool {} is denied by policy", name)));
        (format!("deny_{}", name), supervisor)
    };
    vec![SupervisorEntry::new(
        SupervisorRegistration::new(label, SupervisorKind::ClientProgrammatic)
            .with_description("Command line policy"),
        supervisor,
    )]
}

pub async fn run(args: ReviewArgs, config: FileConfig) -> Result<()> {
    if let Some(tool) = args.allow.iter().find(|t| args.deny.contains(t)) {
        bail!("Tool '{}' is both allowed and denied", tool);
    }

    let settings = config.execution_settings()?;
    let kind = args.provider.unwrap_or(config.provider.kind);
    let response = read_json(&args.response)?;
    let request = match &args.request {
        Some(path) => ModelRequest::from_payload(&read_json(path)?),
        None => ModelRequest::default(),
    };

    let mut builder = SessionBuilder::new(
        Arc::new(InMemoryRegistry::new()),
        adapter_for(kind),
        model_client(&config),
    )
    .with_settings(settings)
    .with_audit_logger(audit_logger(&config))
    .with_project("toolwarden-review")
    .with_task("review")
    .with_run(args.response.display().to_string());

    for tool in &args.allow {
        builder = builder.tool(
            ToolSpecification::new(tool.as_str(), "Allowed from the command line"),
            vec![policy_chain(tool.clone(), true)],
        );
    }
    for tool in &args.deny {
        builder = builder.tool(
            ToolSpecification::new(tool.as_str(), "Denied from the command line"),
            vec![policy_chain(tool.clone(), false)],
        );
    }

    let session = builder.build().await?;
    info!("Reviewing {} as {} response", args.response.display(), kind);

    let out = session.handle_model_response(&response, &request).await?;
    session.drain_monitoring().await?;

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
