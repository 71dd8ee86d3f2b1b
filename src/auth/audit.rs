//! Login Audit Sink
//!
//! Records when each vendor last logged in. This is an observability side
//! channel: the login path logs and ignores sink failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Audit sink errors
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Destination for successful-login records
#[async_trait]
pub trait LoginAudit: Send + Sync {
    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<(), AuditError>;
}

/// Emits login records to the tracing log only
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLoginAudit;

#[async_trait]
impl LoginAudit for TracingLoginAudit {
    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<(), AuditError> {
        tracing::info!(
            target: "mess_ledger::auth",
            email = %email,
            at = %at.to_rfc3339(),
            "vendor login"
        );
        Ok(())
    }
}

/// One entry per vendor email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginEntry {
    pub last_login: String,
    pub login_count: u64,
}

/// Keeps an `email -> LoginEntry` map in a JSON file, updating the entry
/// for an email that is already present and adding one otherwise.
pub struct JsonFileLoginAudit {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLoginAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current entries; a missing file is an empty log
    pub async fn entries(&self) -> Result<BTreeMap<String, LoginEntry>, AuditError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LoginAudit for JsonFileLoginAudit {
    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<(), AuditError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.entries().await?;
        let entry = entries.entry(email.to_string()).or_insert(LoginEntry {
            last_login: String::new(),
            login_count: 0,
        });
        entry.last_login = at.to_rfc3339();
        entry.login_count += 1;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Replace atomically via rename
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}
