//! Service registry: validated CRUD over the monitored targets

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::storage::StorageBackend;
use crate::storage::error::StorageError;
use crate::storage::schema::{MonitoredTarget, NewTarget, ProbeKind, TargetPatch};

#[derive(Debug)]
pub enum RegistryError {
    /// Input rejected before touching storage
    Validation(String),

    /// No target with this id
    NotFound(i64),

    Storage(StorageError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Validation(msg) => write!(f, "{msg}"),
            RegistryError::NotFound(id) => write!(f, "service {id} not found"),
            RegistryError::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        RegistryError::Storage(err)
    }
}

/// Request to register a target; `type` defaults to `http`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTarget {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTarget {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone)]
pub struct ServiceRegistry {
    storage: Arc<dyn StorageBackend>,
}

impl ServiceRegistry {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateTarget) -> Result<MonitoredTarget, RegistryError> {
        let name = required("name", request.name)?;
        let address = required("url", request.url)?;
        let probe_kind = match request.kind {
            Some(kind) => parse_kind(&kind)?,
            None => ProbeKind::Http,
        };

        let target = self
            .storage
            .insert_target(NewTarget {
                name,
                address,
                probe_kind,
            })
            .await?;

        info!("registered service {} ({})", target.name, target.id);
        Ok(target)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, request: UpdateTarget) -> Result<MonitoredTarget, RegistryError> {
        let id = request
            .id
            .ok_or_else(|| RegistryError::Validation("missing field 'id'".to_string()))?;

        let patch = TargetPatch {
            name: request.name.map(|name| required("name", Some(name))).transpose()?,
            address: request.url.map(|url| required("url", Some(url))).transpose()?,
            probe_kind: request.kind.as_deref().map(parse_kind).transpose()?,
        };

        let target = self
            .storage
            .update_target(id, patch)
            .await?
            .ok_or(RegistryError::NotFound(id))?;

        debug!("updated service {id}");
        Ok(target)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), RegistryError> {
        if !self.storage.delete_target(id).await? {
            return Err(RegistryError::NotFound(id));
        }

        info!("deleted service {id}");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<MonitoredTarget>, RegistryError> {
        Ok(self.storage.list_targets().await?)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, RegistryError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RegistryError::Validation(format!("missing field '{field}'")))
}

fn parse_kind(kind: &str) -> Result<ProbeKind, RegistryError> {
    kind.parse().map_err(RegistryError::Validation)
}
