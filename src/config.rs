//! Configuration for the query client
//!
//! `ServiceConfig` is what the library needs; `Args` is the CLI/environment
//! layer of the binary, parsed with clap.

use clap::Parser;

use crate::error::{QueryClientError, Result};
use crate::types::{QueryDefinition, QueryInvocation};

/// Login credentials for one company database.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Company database the session is opened against
    pub company_db: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        company_db: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            company_db: company_db.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("company_db", &self.company_db)
            .finish()
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service Layer base URL, e.g. `https://host:50000/b1s/v1`
    pub base_url: String,
    pub credentials: Credentials,
    /// Request timeout in seconds (default: none, transport default applies)
    pub timeout_secs: Option<u64>,
    /// Accept self-signed or otherwise invalid TLS certificates
    pub accept_invalid_certs: bool,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout_secs: None,
            accept_invalid_certs: false,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Absolute URL for a path below the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// sl-queries - register, run and remove an ad-hoc Service Layer SQL query
#[derive(Parser, Debug, Clone)]
#[command(name = "sl-queries")]
#[command(about = "Run an ad-hoc SQL query through the SAP Business One Service Layer")]
pub struct Args {
    /// Service Layer base URL
    #[arg(long, env = "SL_BASE_URL", default_value = "http://localhost:50001/b1s/v1")]
    pub base_url: String,

    /// Service Layer user name
    #[arg(long, env = "SL_USERNAME")]
    pub username: String,

    /// Service Layer password
    #[arg(long, env = "SL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Company database to log into
    #[arg(long, env = "SL_COMPANY_DB", default_value = "SBODemoUS")]
    pub company_db: String,

    /// Identifier (SqlCode) the query is registered under
    #[arg(long, env = "SL_QUERY_ID", default_value = "GetCardCodeData")]
    pub query_id: String,

    /// Display name (SqlName) of the query
    #[arg(long, env = "SL_QUERY_NAME", default_value = "whatever")]
    pub query_name: String,

    /// Query text (SqlText); use `:name` placeholders for parameters
    #[arg(
        long,
        env = "SL_QUERY_TEXT",
        default_value = "select cardcode, cardname, balance from ocrd where cardcode = :cardcode"
    )]
    pub query_text: String,

    /// Query parameter as `name=value`; repeat for several, order is kept
    #[arg(long = "param", value_name = "NAME=VALUE", default_value = "cardcode='C20000'")]
    pub params: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, env = "SL_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Accept invalid TLS certificates (self-signed Service Layer installs)
    #[arg(long, env = "SL_ACCEPT_INVALID_CERTS", default_value = "false")]
    pub accept_invalid_certs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(QueryClientError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        let required = [
            ("username", &self.username),
            ("company DB", &self.company_db),
            ("query id", &self.query_id),
            ("query text", &self.query_text),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(QueryClientError::Config(format!("{} must not be empty", name)));
            }
        }

        for param in &self.params {
            if param.split('=').next().unwrap_or_default().trim().is_empty() {
                return Err(QueryClientError::Config(format!(
                    "parameter '{}' has no name",
                    param
                )));
            }
        }

        Ok(())
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(
            &self.base_url,
            Credentials::new(&self.username, &self.password, &self.company_db),
        )
        .with_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        config
    }

    pub fn query_definition(&self) -> QueryDefinition {
        QueryDefinition::new(&self.query_id, &self.query_name, &self.query_text)
    }

    /// Parameters in the order given; `name` without `=` has no value.
    pub fn invocation(&self) -> QueryInvocation {
        self.params
            .iter()
            .fold(QueryInvocation::new(), |invocation, param| {
                match param.split_once('=') {
                    Some((name, value)) => invocation.with_param(name, value),
                    None => invocation.with_flag(param),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["sl-queries", "--username", "manager", "--password", "secret"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_demo_run() {
        let args = args(&[]);
        assert!(args.validate().is_ok());
        assert_eq!(args.query_id, "GetCardCodeData");
        assert_eq!(args.invocation().query_string(), "cardcode='C20000'");
        assert_eq!(args.service_config().timeout_secs, None);
    }

    #[test]
    fn test_params_keep_order_and_missing_values() {
        let args = args(&["--param", "b=2", "--param", "a", "--param", "c=x=y"]);
        assert_eq!(args.invocation().query_string(), "b=2&a=&c=x=y");
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let args = args(&["--base-url", "ftp://host/b1s/v1"]);
        assert!(matches!(args.validate(), Err(QueryClientError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_nameless_param() {
        let args = args(&["--param", "=1"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ServiceConfig::new(
            "https://sl:50000/b1s/v1/",
            Credentials::new("u", "p", "db"),
        );
        assert_eq!(config.url("/Login"), "https://sl:50000/b1s/v1/Login");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("manager", "hunter2", "SBODemoUS"));
        assert!(debug.contains("manager"));
        assert!(!debug.contains("hunter2"));
    }
}
