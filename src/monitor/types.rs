// Core credential model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const PORTAL_CREDENTIALS_URL: &str =
    "https://portal.azure.com/#view/Microsoft_AAD_RegisteredApps/ApplicationMenuBlade/~/Credentials/appId";

/// Kind of credential bound to an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    /// Client secret
    Password,
    /// Certificate (key credential)
    Certificate,
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialType::Password => write!(f, "password"),
            CredentialType::Certificate => write!(f, "certificate"),
        }
    }
}

/// Where in the directory the credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    #[default]
    AppRegistration,
    ServicePrincipal,
}

impl CredentialSource {
    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            CredentialSource::AppRegistration => "App Registration",
            CredentialSource::ServicePrincipal => "Service Principal",
        }
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::AppRegistration => write!(f, "app_registration"),
            CredentialSource::ServicePrincipal => write!(f, "service_principal"),
        }
    }
}

/// One secret or certificate bound to an application.
///
/// Built fresh from directory data on every run and never mutated. The
/// expiry is optional here only because upstream records can be malformed;
/// the analyzer rejects a credential without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub credential_type: CredentialType,
    pub display_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    pub application_id: String,
    pub application_name: String,
    #[serde(default)]
    pub source: CredentialSource,
    /// Service principal object id (differs from the application id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl Credential {
    /// Create a credential for an application registration
    pub fn new(
        id: impl Into<String>,
        credential_type: CredentialType,
        application_id: impl Into<String>,
        application_name: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            credential_type,
            display_name: None,
            expires_at: Some(expires_at),
            starts_at: None,
            application_id: application_id.into(),
            application_name: application_name.into(),
            source: CredentialSource::AppRegistration,
            object_id: None,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the start timestamp
    pub fn with_start(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Mark as a service principal credential
    pub fn from_service_principal(mut self, object_id: impl Into<String>) -> Self {
        self.source = CredentialSource::ServicePrincipal;
        self.object_id = Some(object_id.into());
        self
    }

    /// Display name, or a short id prefix when the credential has none
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.id.chars().take(8).collect(),
        }
    }

    /// Portal page where the owning application's credentials are managed
    pub fn portal_url(&self) -> String {
        format!("{}/{}", PORTAL_CREDENTIALS_URL, self.application_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_label_falls_back_to_id_prefix() {
        let cred = Credential::new(
            "0123456789abcdef",
            CredentialType::Password,
            "app-1",
            "Billing API",
            expiry(),
        );
        assert_eq!(cred.label(), "01234567");

        let named = cred.with_display_name("prod secret");
        assert_eq!(named.label(), "prod secret");
    }

    #[test]
    fn test_portal_url_uses_application_id() {
        let cred = Credential::new(
            "key-1",
            CredentialType::Certificate,
            "11111111-2222-3333-4444-555555555555",
            "Billing API",
            expiry(),
        );
        assert!(
            cred.portal_url()
                .ends_with("/Credentials/appId/11111111-2222-3333-4444-555555555555")
        );
    }

    #[test]
    fn test_service_principal_marker() {
        let cred = Credential::new("k", CredentialType::Password, "app", "App", expiry())
            .from_service_principal("sp-object");
        assert_eq!(cred.source, CredentialSource::ServicePrincipal);
        assert_eq!(cred.object_id.as_deref(), Some("sp-object"));
    }

    #[test]
    fn test_credential_type_serialization() {
        let json = serde_json::to_string(&CredentialType::Certificate).unwrap();
        assert_eq!(json, "\"certificate\"");
        assert_eq!(CredentialSource::ServicePrincipal.to_string(), "service_principal");
    }
}
