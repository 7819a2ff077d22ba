//! Viewer configuration.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use waybill_view_client::HttpFetcherConfig;
use waybill_view_core::{EventFilter, ThemeMode};

/// Viewer configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    /// Live server settings, used when no fixture file is configured
    pub http: HttpFetcherConfig,

    /// Offline fixture file (JSON object of identifier -> body)
    pub fixtures: Option<PathBuf>,

    /// Also resolve each party's details
    pub resolve_parties: bool,

    /// Chart theme
    pub theme: ThemeMode,

    /// Event names drawn as x-axis markers
    pub marker_events: EventFilter,
}

impl ViewerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WAYBILL_VIEW_BASE_URL`: Base URL for relative identifiers
    /// - `WAYBILL_VIEW_TIMEOUT_SECS`: Request timeout in seconds
    /// - `WAYBILL_VIEW_BEARER_TOKEN`: Bearer token for authentication
    /// - `WAYBILL_VIEW_CA_CERT`: PEM file with a custom CA certificate
    /// - `WAYBILL_VIEW_FIXTURES`: Fixture file; replaces the HTTP fetcher
    /// - `WAYBILL_VIEW_RESOLVE_PARTIES`: "true" to resolve party details
    /// - `WAYBILL_VIEW_THEME`: "light" or "dark"
    /// - `WAYBILL_VIEW_MARKER_EVENTS`: JSON array of event names
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("WAYBILL_VIEW_BASE_URL") {
            config.http.base_url = url;
        }

        if let Some(secs) = lookup("WAYBILL_VIEW_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("Invalid WAYBILL_VIEW_TIMEOUT_SECS")?;
            config.http.timeout = Duration::from_secs(secs);
        }

        if let Some(token) = lookup("WAYBILL_VIEW_BEARER_TOKEN") {
            config.http.bearer_token = Some(token);
        }

        if let Some(path) = lookup("WAYBILL_VIEW_CA_CERT") {
            config.http.ca_cert_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("WAYBILL_VIEW_FIXTURES") {
            config.fixtures = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("WAYBILL_VIEW_RESOLVE_PARTIES") {
            config.resolve_parties = parse_flag(&flag)
                .with_context(|| format!("Invalid WAYBILL_VIEW_RESOLVE_PARTIES: {flag}"))?;
        }

        if let Some(theme) = lookup("WAYBILL_VIEW_THEME") {
            config.theme = theme.parse().context("Invalid WAYBILL_VIEW_THEME")?;
        }

        if let Some(events) = lookup("WAYBILL_VIEW_MARKER_EVENTS") {
            let names: Vec<String> =
                serde_json::from_str(&events).context("Invalid WAYBILL_VIEW_MARKER_EVENTS")?;
            config.marker_events = EventFilter::new(names);
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ViewerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ViewerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = config(&[]).unwrap();
        assert_eq!(config.http.base_url, "http://localhost:8080");
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert!(config.fixtures.is_none());
        assert!(!config.resolve_parties);
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.marker_events, EventFilter::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = config(&[
            ("WAYBILL_VIEW_BASE_URL", "https://tracking.example.org"),
            ("WAYBILL_VIEW_TIMEOUT_SECS", "5"),
            ("WAYBILL_VIEW_BEARER_TOKEN", "secret"),
            ("WAYBILL_VIEW_FIXTURES", "/tmp/fixtures.json"),
            ("WAYBILL_VIEW_RESOLVE_PARTIES", "TRUE"),
            ("WAYBILL_VIEW_THEME", "dark"),
            ("WAYBILL_VIEW_MARKER_EVENTS", r#"["(RAIL) Departed"]"#),
        ])
        .unwrap();

        assert_eq!(config.http.base_url, "https://tracking.example.org");
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.fixtures, Some(PathBuf::from("/tmp/fixtures.json")));
        assert!(config.resolve_parties);
        assert_eq!(config.theme, ThemeMode::Dark);
        assert_eq!(config.marker_events.names(), ["(RAIL) Departed"]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("WAYBILL_VIEW_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("WAYBILL_VIEW_THEME", "sepia")]).is_err());
        assert!(config(&[("WAYBILL_VIEW_RESOLVE_PARTIES", "maybe")]).is_err());
        assert!(config(&[("WAYBILL_VIEW_MARKER_EVENTS", "not json")]).is_err());
    }
}
