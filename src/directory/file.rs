// File directory - credential inventory from a JSON document

use crate::Result;
use crate::directory::CredentialDirectory;
use crate::error::CredwatchError;
use crate::monitor::types::{Credential, CredentialSource, CredentialType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// On-disk inventory layout
#[derive(Debug, Deserialize)]
struct Inventory {
    applications: Vec<FileApplication>,
}

#[derive(Debug, Deserialize)]
struct FileApplication {
    id: String,
    display_name: String,
    #[serde(default)]
    source: CredentialSource,
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    credentials: Vec<FileCredential>,
}

#[derive(Debug, Deserialize)]
struct FileCredential {
    id: String,
    credential_type: CredentialType,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    starts_at: Option<DateTime<Utc>>,
}

/// Directory that re-reads a JSON file on every run.
///
/// ```json
/// {"applications": [{"id": "app-1", "display_name": "Billing API",
///   "credentials": [{"id": "k1", "credential_type": "password",
///                    "expires_at": "2025-07-01T00:00:00Z"}]}]}
/// ```
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialDirectory for FileDirectory {
    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CredwatchError::directory(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let inventory: Inventory = serde_json::from_str(&contents).map_err(|e| {
            CredwatchError::directory(format!("invalid inventory {}: {}", self.path.display(), e))
        })?;

        let credentials: Vec<Credential> = inventory
            .applications
            .into_iter()
            .flat_map(|app| {
                let FileApplication {
                    id,
                    display_name,
                    source,
                    object_id,
                    credentials,
                } = app;

                credentials.into_iter().map(move |c| Credential {
                    id: c.id,
                    credential_type: c.credential_type,
                    display_name: c.display_name,
                    expires_at: c.expires_at,
                    starts_at: c.starts_at,
                    application_id: id.clone(),
                    application_name: display_name.clone(),
                    source,
                    object_id: object_id.clone(),
                })
            })
            .collect();

        tracing::info!(
            "Loaded {} credentials from {}",
            credentials.len(),
            self.path.display()
        );
        Ok(credentials)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_inventory() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"applications": [
                {{"id": "app-1", "display_name": "Billing API", "credentials": [
                    {{"id": "k1", "credential_type": "password", "expires_at": "2025-07-01T00:00:00Z"}},
                    {{"id": "k2", "credential_type": "certificate"}}
                ]}},
                {{"id": "app-2", "display_name": "Connector", "source": "service_principal",
                  "object_id": "sp-1", "credentials": [
                    {{"id": "k3", "credential_type": "password", "display_name": "sync", "expires_at": "2025-09-01T00:00:00Z"}}
                ]}}
            ]}}"#
        )
        .unwrap();

        let creds = FileDirectory::new(file.path()).list_credentials().await.unwrap();
        assert_eq!(creds.len(), 3);
        assert_eq!(creds[0].application_name, "Billing API");
        assert!(creds[1].expires_at.is_none());
        assert_eq!(creds[2].source, CredentialSource::ServicePrincipal);
        assert_eq!(creds[2].object_id.as_deref(), Some("sp-1"));
    }

    #[tokio::test]
    async fn test_missing_file_is_directory_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDirectory::new(dir.path().join("absent.json"))
            .list_credentials()
            .await
            .unwrap_err();
        assert!(matches!(err, CredwatchError::DirectoryAccess { .. }));
    }

    #[tokio::test]
    async fn test_malformed_file_is_directory_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = FileDirectory::new(file.path())
            .list_credentials()
            .await
            .unwrap_err();
        assert!(matches!(err, CredwatchError::DirectoryAccess { .. }));
    }
}
