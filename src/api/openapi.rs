// OpenAPI Documentation

use crate::api::{
    models::{
        error::ApiErrorResponse,
        response::{CheckResponse, DeliveryResponse, HealthResponse},
    },
    routes,
};
use crate::monitor::check::SkippedCredential;
use crate::monitor::payload::ReportPayload;
use crate::monitor::report::ReportStatistics;
use crate::monitor::status::NotificationLevel;
use crate::monitor::thresholds::Thresholds;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::report::get_report,
        routes::check::trigger_check,
    ),
    components(
        schemas(
            ReportPayload,
            ReportStatistics,
            Thresholds,
            NotificationLevel,
            CheckResponse,
            DeliveryResponse,
            SkippedCredential,
            HealthResponse,
            ApiErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "report", description = "Latest credential expiry report"),
        (name = "check", description = "On-demand credential checks"),
        (name = "health", description = "Health check"),
    ),
    info(
        title = "credwatch API",
        version = "1.0.0",
        description = r#"
Expiry monitoring for directory application credentials.

When API keys are configured, every endpoint except `/health` requires the
`X-API-Key` header. Keys with `read_only` permission may read the report;
`operator` keys may also trigger checks.
"#,
        license(
            name = "GPL-3.0",
            url = "https://www.gnu.org/licenses/gpl-3.0.en.html"
        )
    )
)]
pub struct ApiDoc;

/// Security scheme modifier
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        let paths = json["paths"].as_object().unwrap();

        assert!(paths.contains_key("/api/v1/report"));
        assert!(paths.contains_key("/api/v1/check"));
        assert!(paths.contains_key("/api/v1/health"));
        assert!(json["components"]["schemas"]["ReportPayload"].is_object());
    }
}
