// Credential directories - where the credential inventory comes from

pub mod entra;
pub mod file;

use crate::Result;
use crate::graph::{GraphClient, GraphCredentials};
use crate::monitor::config::DirectoryConfig;
use crate::monitor::types::Credential;
use async_trait::async_trait;
use std::sync::Arc;

pub use entra::EntraDirectory;
pub use file::FileDirectory;

/// Source of every credential in scope for one run.
///
/// Implementations return the complete set or fail as a whole with
/// [`CredwatchError::DirectoryAccess`](crate::error::CredwatchError::DirectoryAccess);
/// partial inventories are never returned.
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// List all credentials across all applications
    async fn list_credentials(&self) -> Result<Vec<Credential>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Build the directory selected by configuration
pub fn from_config(config: &DirectoryConfig) -> Result<Arc<dyn CredentialDirectory>> {
    match config {
        DirectoryConfig::Graph(graph) => {
            let client = GraphClient::new(
                GraphCredentials {
                    tenant_id: graph.tenant_id.clone(),
                    client_id: graph.client_id.clone(),
                    client_secret: graph.client_secret.clone(),
                },
                graph.timeout_seconds,
            )?;
            Ok(Arc::new(EntraDirectory::new(
                client,
                graph.include_service_principals,
            )))
        }
        DirectoryConfig::File { path } => Ok(Arc::new(FileDirectory::new(path))),
    }
}
