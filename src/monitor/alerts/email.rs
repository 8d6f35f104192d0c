// Email Notification Channel - Using lettre

use crate::Result;
use crate::monitor::alerts::{NotificationChannel, format_credential_list, remaining_label};
use crate::monitor::config::EmailConfig;
use crate::monitor::report::ExpirationReport;
use crate::monitor::status::NotificationLevel;
use crate::monitor::types::CredentialSource;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

const TEXT_LIST_LIMIT: usize = 25;
const HTML_ROW_LIMIT: usize = 15;

/// SMTP email channel
pub struct EmailChannel {
    config: EmailConfig,
}

impl EmailChannel {
    /// Create new email channel
    pub fn new(config: EmailConfig) -> Result<Self> {
        // Every address must parse
        config.from_address.parse::<Mailbox>()?;
        for to_addr in &config.to_addresses {
            to_addr.parse::<Mailbox>()?;
        }
        Ok(Self { config })
    }

    /// Build email message from report
    fn build_message(&self, report: &ExpirationReport) -> Result<Message> {
        let mut message_builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(format_subject(report));

        // Add all recipients
        for to_addr in &self.config.to_addresses {
            message_builder = message_builder.to(to_addr.parse()?);
        }

        let message = message_builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(format_text_body(report)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(format_html_body(report)),
                ),
        )?;

        Ok(message)
    }

    /// Get SMTP transport
    fn get_transport(&self) -> Result<SmtpTransport> {
        let transport = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_server)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_server)
        };

        let transport = transport.port(self.config.smtp_port);
        let transport = if !self.config.username.is_empty() && !self.config.password.is_empty() {
            transport.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
        } else {
            transport
        };

        Ok(transport.build())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        let message = self.build_message(report)?;
        let transport = self.get_transport()?;

        // Send email (blocking operation, run in blocking task)
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        tracing::info!("Email sent to {}", self.config.to_addresses.join(", "));
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn test_connection(&self) -> Result<()> {
        let transport = self.get_transport()?;

        let reachable = tokio::task::spawn_blocking(move || transport.test_connection()).await??;
        if !reachable {
            return Err(crate::error::CredwatchError::delivery(
                "email",
                format!("SMTP server {} did not accept a connection", self.config.smtp_server),
            ));
        }

        Ok(())
    }
}

/// Subject line with the level prefix
pub(crate) fn format_subject(report: &ExpirationReport) -> String {
    let prefix = match report.notification_level() {
        NotificationLevel::Expired => "[EXPIRED] ",
        NotificationLevel::Critical => "[CRITICAL] ",
        NotificationLevel::Warning => "[WARNING] ",
        NotificationLevel::Info => "[INFO] ",
        NotificationLevel::None => "",
    };

    format!("{}Credential Expiry Alert - {}", prefix, report.summary())
}

/// Plain text body, grouped by credential source
pub(crate) fn format_text_body(report: &ExpirationReport) -> String {
    let stats = report.statistics();
    let mut lines = vec![
        "Credential Expiration Report".to_string(),
        "=".repeat(40),
        String::new(),
        format!("Summary: {}", stats.summary()),
        format!("Applications Affected: {}", report.affected_applications()),
        String::new(),
        format!("Expired: {}", stats.expired_count),
        format!("Critical: {}", stats.critical_count),
        format!("Warning: {}", stats.warning_count),
        format!("Info: {}", stats.info_count),
        String::new(),
    ];

    for source in [CredentialSource::AppRegistration, CredentialSource::ServicePrincipal] {
        let attention = attention_for(report, source);
        if attention.is_empty() {
            continue;
        }

        lines.push(format!("{}S", source.display_name().to_uppercase()));
        lines.push("-".repeat(40));
        lines.push(report.source_summary(source));
        lines.push(String::new());
        lines.push(format_credential_list(&attention, TEXT_LIST_LIMIT, true));
        lines.push(String::new());
    }

    lines.push("-".repeat(40));
    lines.push(format!(
        "Generated by credwatch at {}",
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}

/// HTML body with one table per credential source
pub(crate) fn format_html_body(report: &ExpirationReport) -> String {
    let stats = report.statistics();
    let color = report.notification_level().color_hex();

    let sections: String = [
        (CredentialSource::AppRegistration, "#0078D4"),
        (CredentialSource::ServicePrincipal, "#5C2D91"),
    ]
    .iter()
    .map(|(source, header_color)| source_section_html(report, *source, header_color))
    .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 800px; margin: 0 auto; padding: 20px; }}
        .header {{ background: {}; color: white; padding: 15px; border-radius: 5px; }}
        .summary {{ background: #f8f9fa; padding: 15px; margin: 15px 0; border-radius: 5px; }}
        table {{ border-collapse: collapse; width: 100%; margin: 15px 0; }}
        th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
        tr:nth-child(even) {{ background-color: #f2f2f2; }}
        .footer {{ text-align: center; margin-top: 20px; color: #666; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h1>Credential Expiry Alert</h1></div>
        <div class="summary">
            <h2>{}</h2>
            <p>Applications Affected: {}</p>
            <p>Expired: {} | Critical: {} | Warning: {} | Info: {}</p>
        </div>
        {}
        <div class="footer">
            <p>Generated by credwatch at {}</p>
        </div>
    </div>
</body>
</html>"#,
        color,
        html_escape(&stats.summary()),
        report.affected_applications(),
        stats.expired_count,
        stats.critical_count,
        stats.warning_count,
        stats.info_count,
        sections,
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn source_section_html(report: &ExpirationReport, source: CredentialSource, header_color: &str) -> String {
    let attention = attention_for(report, source);
    if attention.is_empty() {
        return String::new();
    }

    let mut rows: String = attention
        .iter()
        .take(HTML_ROW_LIMIT)
        .map(|c| {
            let cred = &c.credential;
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} ({})</td><td><a href=\"{}\">Manage</a></td></tr>\n",
                html_escape(&cred.application_name),
                cred.credential_type,
                html_escape(&cred.label()),
                c.expires_at.format("%Y-%m-%d"),
                c.status.as_str().to_uppercase(),
                remaining_label(c),
                cred.portal_url()
            )
        })
        .collect();

    if attention.len() > HTML_ROW_LIMIT {
        rows.push_str(&format!(
            "<tr><td colspan=\"6\">... and {} more</td></tr>\n",
            attention.len() - HTML_ROW_LIMIT
        ));
    }

    format!(
        r#"<h3 style="color: {};">{}s</h3>
<table>
<tr><th>Application</th><th>Type</th><th>Name</th><th>Expiry</th><th>Status</th><th>Action</th></tr>
{}</table>
"#,
        header_color,
        source.display_name(),
        rows
    )
}

fn attention_for(
    report: &ExpirationReport,
    source: CredentialSource,
) -> Vec<&crate::monitor::analyzer::ClassifiedCredential> {
    let mut attention: Vec<_> = report
        .by_source(source)
        .into_iter()
        .filter(|c| c.status.requires_attention())
        .collect();
    attention.sort_by_key(|c| c.days_until_expiry);
    attention
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::alerts::test_support::sample_report;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            from_address: "alerts@example.com".to_string(),
            to_addresses: vec!["admin@example.com".to_string()],
            username: "user".to_string(),
            password: "pass".to_string(),
            use_tls: true,
        }
    }

    #[test]
    fn test_email_channel_new() {
        assert!(EmailChannel::new(create_test_config()).is_ok());
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut config = create_test_config();
        config.to_addresses = vec!["not an address".to_string()];
        assert!(EmailChannel::new(config).is_err());
    }

    #[test]
    fn test_subject_has_level_prefix() {
        let subject = format_subject(&sample_report());
        assert!(subject.starts_with("[EXPIRED] Credential Expiry Alert - 4 credentials"));
    }

    #[test]
    fn test_format_text_body() {
        let body = format_text_body(&sample_report());

        assert!(body.contains("APP REGISTRATIONS"));
        assert!(body.contains("SERVICE PRINCIPALS"));
        assert!(body.contains("Billing API - password 'prod-secret': EXPIRED"));
        assert!(body.contains("Manage: https://portal.azure.com/"));
        assert!(!body.contains("Intranet"));
    }

    #[test]
    fn test_format_html_body() {
        let body = format_html_body(&sample_report());

        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("#dc3545"));
        assert!(body.contains("Payroll"));
        assert!(body.contains("CRITICAL (3d)"));
        assert!(!body.contains("Intranet"));
    }

    #[test]
    fn test_build_message() {
        let channel = EmailChannel::new(create_test_config()).unwrap();
        assert!(channel.build_message(&sample_report()).is_ok());
    }

    #[test]
    fn test_channel_name() {
        let channel = EmailChannel::new(create_test_config()).unwrap();
        assert_eq!(channel.channel_name(), "email");
    }
}
