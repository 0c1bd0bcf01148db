//! Types for the Service Layer query API

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::config::Credentials;

/// Request body for `POST /Login`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "CompanyDB")]
    pub company_db: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("company_db", &self.company_db)
            .finish()
    }
}

impl From<&Credentials> for LoginRequest {
    fn from(credentials: &Credentials) -> Self {
        Self {
            user_name: credentials.username.clone(),
            password: credentials.password.clone(),
            company_db: credentials.company_db.clone(),
        }
    }
}

/// Response from `POST /Login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Session token, sent back as the `B1SESSION` cookie
    #[serde(rename = "SessionId")]
    pub session_id: Option<String>,
    /// Server-side session timeout in minutes
    #[serde(rename = "SessionTimeout", default)]
    pub session_timeout: Option<u32>,
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
}

/// A named, parameterized query to register with the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    /// Unique key the query is registered under (SqlCode)
    pub identifier: String,
    /// Free text name (SqlName)
    pub display_name: String,
    /// Query body with `:name` placeholders (SqlText)
    pub text: String,
}

impl QueryDefinition {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            text: text.into(),
        }
    }
}

/// Request body for `POST /SQLQueries`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRegistration<'a> {
    #[serde(rename = "SqlCode")]
    pub sql_code: &'a str,
    #[serde(rename = "SqlName")]
    pub sql_name: &'a str,
    #[serde(rename = "SqlText")]
    pub sql_text: &'a str,
}

impl<'a> From<&'a QueryDefinition> for QueryRegistration<'a> {
    fn from(definition: &'a QueryDefinition) -> Self {
        Self {
            sql_code: &definition.identifier,
            sql_name: &definition.display_name,
            sql_text: &definition.text,
        }
    }
}

/// Parameters for one execution of a registered query.
///
/// Order is preserved exactly as given. String literals must carry their
/// own quotes (`'C20000'`); only query-string separators get escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInvocation {
    pub parameters: Vec<(String, Option<String>)>,
}

impl QueryInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an alternating `name, value, name, value, ...` list.
    ///
    /// A trailing name without a value is kept and sent as `name=`.
    pub fn from_pairs<S: AsRef<str>>(flat: &[S]) -> Self {
        let parameters = flat
            .chunks(2)
            .map(|pair| {
                (
                    pair[0].as_ref().to_string(),
                    pair.get(1).map(|v| v.as_ref().to_string()),
                )
            })
            .collect();
        Self { parameters }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), Some(value.into())));
        self
    }

    /// Add a parameter with no value.
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.parameters.push((name.into(), None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// `name=value` pairs joined by `&`, without a leading `?`.
    ///
    /// Only the characters that would change how the query string splits
    /// are escaped; SQL quotes and other literals pass through unchanged.
    pub fn query_string(&self) -> String {
        self.parameters
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    escape_query_component(name, true),
                    escape_query_component(value.as_deref().unwrap_or(""), false)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-escape `%`, `&`, `#`, `+` and space (and `=` in names).
fn escape_query_component(raw: &str, is_name: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '%' | '&' | '#' | '+' | ' ') || (is_name && c == '=');
    if !raw.contains(needs_escape) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// One scalar leaf of a flattened result tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    /// `/`-separated object keys and `[]` array markers from the root
    pub path: String,
    pub value: String,
}

impl FlatEntry {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for FlatEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.value)
    }
}
