//! AWS SSM Parameter Store client

use async_trait::async_trait;
use aws_sdk_ssm::types::{ParameterStringFilter, ParameterType};
use aws_sdk_ssm::Client as SsmClient;

use crate::error::{Result, SyncError};
use crate::remote::{ParameterKind, ParameterPage, ParameterRecord, ParameterStore, PutRequest};

/// Production [`ParameterStore`] backed by the AWS SSM API.
pub struct SsmParameterStore {
    client: SsmClient,
}

impl SsmParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }
}

fn kind_from_type(parameter_type: Option<&ParameterType>) -> ParameterKind {
    match parameter_type {
        Some(ParameterType::SecureString) => ParameterKind::SecureString,
        _ => ParameterKind::String,
    }
}

fn type_from_kind(kind: ParameterKind) -> ParameterType {
    match kind {
        ParameterKind::String => ParameterType::String,
        ParameterKind::SecureString => ParameterType::SecureString,
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn parameters_by_path(
        &self,
        path: &str,
        max_results: i32,
        next_token: Option<String>,
    ) -> Result<ParameterPage> {
        let response = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(false)
            .with_decryption(true)
            .max_results(max_results)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        let parameters = response
            .parameters()
            .iter()
            .map(|p| ParameterRecord {
                name: p.name().unwrap_or_default().to_string(),
                value: p.value().unwrap_or_default().to_string(),
                kind: kind_from_type(p.r#type()),
            })
            .collect();

        Ok(ParameterPage {
            parameters,
            next_token: response.next_token().map(String::from),
        })
    }

    async fn put_parameter(&self, request: PutRequest) -> Result<()> {
        self.client
            .put_parameter()
            .name(&request.name)
            .value(&request.value)
            .r#type(type_from_kind(request.kind))
            .overwrite(request.overwrite)
            .set_key_id(request.key_id)
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;
        Ok(())
    }

    async fn delete_parameters(&self, names: Vec<String>) -> Result<()> {
        self.client
            .delete_parameters()
            .set_names(Some(names))
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;
        Ok(())
    }

    async fn describe_key_id(&self, name: &str) -> Result<Option<String>> {
        let filter = ParameterStringFilter::builder()
            .key("Name")
            .option("Equals")
            .values(name)
            .build()
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        let response = self
            .client
            .describe_parameters()
            .parameter_filters(filter)
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        Ok(response
            .parameters()
            .first()
            .and_then(|metadata| metadata.key_id())
            .map(String::from))
    }
}
