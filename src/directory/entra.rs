// Entra ID directory - application and service principal credentials via Graph

use crate::Result;
use crate::directory::CredentialDirectory;
use crate::graph::GraphClient;
use crate::monitor::types::{Credential, CredentialSource, CredentialType};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

const APPLICATIONS_ENDPOINT: &str =
    "/applications?$select=id,appId,displayName,passwordCredentials,keyCredentials";
const SERVICE_PRINCIPALS_ENDPOINT: &str =
    "/servicePrincipals?$select=id,appId,displayName,passwordCredentials,keyCredentials";

/// Directory backed by Microsoft Entra ID
pub struct EntraDirectory {
    client: GraphClient,
    include_service_principals: bool,
}

impl EntraDirectory {
    pub fn new(client: GraphClient, include_service_principals: bool) -> Self {
        Self {
            client,
            include_service_principals,
        }
    }

    async fn application_credentials(&self) -> Result<Vec<Credential>> {
        tracing::info!("Fetching application registrations from Entra ID");
        let applications = self.client.get_all_pages(APPLICATIONS_ENDPOINT).await?;

        let credentials: Vec<Credential> = applications
            .iter()
            .flat_map(|app| map_owner(app, CredentialSource::AppRegistration))
            .collect();

        tracing::info!(
            "Retrieved {} credentials from {} app registrations",
            credentials.len(),
            applications.len()
        );
        Ok(credentials)
    }

    async fn service_principal_credentials(&self) -> Result<Vec<Credential>> {
        tracing::info!("Fetching service principals from Entra ID");
        let principals = self.client.get_all_pages(SERVICE_PRINCIPALS_ENDPOINT).await?;

        let credentials: Vec<Credential> = principals
            .iter()
            .flat_map(|sp| map_owner(sp, CredentialSource::ServicePrincipal))
            .collect();

        tracing::info!(
            "Retrieved {} credentials from {} service principals",
            credentials.len(),
            principals.len()
        );
        Ok(credentials)
    }
}

#[async_trait]
impl CredentialDirectory for EntraDirectory {
    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        let mut credentials = self.application_credentials().await?;

        if self.include_service_principals {
            credentials.extend(self.service_principal_credentials().await?);
        }

        Ok(credentials)
    }

    fn name(&self) -> &str {
        "entra_id"
    }
}

/// Map one application or service principal object onto its credentials
pub(crate) fn map_owner(owner: &Value, source: CredentialSource) -> Vec<Credential> {
    let app_id = str_field(owner, "appId").unwrap_or_default();
    let app_name = str_field(owner, "displayName").unwrap_or_else(|| "Unknown".to_string());
    let object_id = str_field(owner, "id");

    let groups = [
        ("passwordCredentials", CredentialType::Password),
        ("keyCredentials", CredentialType::Certificate),
    ];

    let (app_id, app_name) = (app_id.as_str(), app_name.as_str());
    groups
        .iter()
        .flat_map(|&(field, credential_type)| {
            owner
                .get(field)
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(move |raw| map_credential(raw, credential_type, app_id, app_name))
        })
        .map(|cred| match (source, &object_id) {
            (CredentialSource::ServicePrincipal, Some(id)) => cred.from_service_principal(id.clone()),
            (CredentialSource::ServicePrincipal, None) => Credential {
                source: CredentialSource::ServicePrincipal,
                ..cred
            },
            (CredentialSource::AppRegistration, _) => cred,
        })
        .collect()
}

/// A record with a missing or unreadable `endDateTime` keeps `expires_at = None`
fn map_credential(
    raw: &Value,
    credential_type: CredentialType,
    app_id: &str,
    app_name: &str,
) -> Credential {
    let key_id = str_field(raw, "keyId").unwrap_or_default();
    let expires_at = str_field(raw, "endDateTime").and_then(|s| {
        let parsed = parse_graph_datetime(&s);
        if parsed.is_none() {
            tracing::warn!("Unparsable endDateTime {:?} on credential {}", s, key_id);
        }
        parsed
    });

    Credential {
        id: key_id,
        credential_type,
        display_name: str_field(raw, "displayName"),
        expires_at,
        starts_at: str_field(raw, "startDateTime").and_then(|s| parse_graph_datetime(&s)),
        application_id: app_id.to_string(),
        application_name: app_name.to_string(),
        source: CredentialSource::AppRegistration,
        object_id: None,
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// RFC 3339, with naive timestamps taken as UTC
pub fn parse_graph_datetime(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}
