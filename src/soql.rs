//! Deterministic SOQL rendering for the Unit object.
//!
//! Filters arrive here already validated (see [`crate::filters`]); this module
//! owns the query text itself. Clauses are modeled as a small typed AST rather
//! than ad-hoc string concatenation so that escaping stays centralized in
//! [`escape_literal`] and the rendered text is auditable in one place.
//!
//! # Determinism
//!
//! Rendering is a pure function of the clause list: identical filters always
//! produce byte-identical query text, which in turn produces identical cache
//! keys. Clause order is fixed by the caller and preserved here.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// The Salesforce object this proxy fronts.
pub const UNIT_OBJECT: &str = "Unit__c";

/// Fields projected when the caller does not pass `fields`.
pub const DEFAULT_FIELDS: &[&str] = &[
    "Id",
    "Name",
    "Status__c",
    "Sub_Status__c",
    "Model__c",
    "Offline__c",
    "LastModifiedDate",
];

/// Every field a caller may request via `fields`.
pub const ALLOWED_FIELDS: &[&str] = &[
    "Id",
    "Name",
    "Status__c",
    "Sub_Status__c",
    "Model__c",
    "Offline__c",
    "LastModifiedDate",
    "SerialNumber__c",
    "Firmware_Version__c",
    "Last_Seen__c",
    "CreatedDate",
];

/// SOQL datetime literal format (unquoted, always UTC).
const SOQL_DATETIME: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Escape a string for embedding in a single-quoted SOQL literal.
///
/// Backslashes are doubled first, then single quotes are escaped, so an
/// attacker-controlled value can never terminate the surrounding literal.
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

/// One validated WHERE-clause constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `field = 'value'`
    Eq { field: &'static str, value: String },
    /// `field IN ('a', 'b')`
    In {
        field: &'static str,
        values: Vec<String>,
    },
    /// `field = true|false` (unquoted)
    EqBool { field: &'static str, value: bool },
    /// `field >= 2024-01-01T00:00:00Z` (unquoted datetime literal)
    OnOrAfter {
        field: &'static str,
        at: DateTime<Utc>,
    },
    /// `field <= 2024-01-01T23:59:59Z`
    OnOrBefore {
        field: &'static str,
        at: DateTime<Utc>,
    },
}

impl Clause {
    fn render(&self) -> String {
        match self {
            Clause::Eq { field, value } => format!("{field} = '{}'", escape_literal(value)),
            Clause::In { field, values } => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("'{}'", escape_literal(v)))
                    .collect();
                format!("{field} IN ({})", quoted.join(", "))
            }
            Clause::EqBool { field, value } => format!("{field} = {value}"),
            Clause::OnOrAfter { field, at } => {
                format!("{field} >= {}", at.format(SOQL_DATETIME))
            }
            Clause::OnOrBefore { field, at } => {
                format!("{field} <= {}", at.format(SOQL_DATETIME))
            }
        }
    }
}

/// A fully assembled, ready-to-render query against the Unit object.
#[derive(Debug, Clone)]
pub struct SoqlQuery {
    pub fields: Vec<String>,
    pub clauses: Vec<Clause>,
    pub limit: u32,
    pub offset: Option<u32>,
}

impl SoqlQuery {
    /// Render the query text. Same query value, same text, byte for byte.
    pub fn render(&self) -> String {
        let mut soql = format!("SELECT {} FROM {UNIT_OBJECT}", self.fields.join(", "));

        if !self.clauses.is_empty() {
            let rendered: Vec<String> = self.clauses.iter().map(Clause::render).collect();
            soql.push_str(" WHERE ");
            soql.push_str(&rendered.join(" AND "));
        }

        soql.push_str(&format!(" LIMIT {}", self.limit));
        if let Some(offset) = self.offset {
            soql.push_str(&format!(" OFFSET {offset}"));
        }

        soql
    }
}

/// Cache key for a rendered SOQL query.
pub fn query_cache_key(soql: &str) -> String {
    hash_key("soql", soql)
}

/// Cache key for a cursor-addressed request.
///
/// Prefixed distinctly from plain-query keys so the two keyspaces can
/// never collide on the same file.
pub fn cursor_cache_key(cursor: &str) -> String {
    hash_key("cursor", cursor)
}

/// SHA-256 over `<kind>:<input>`, hex-encoded for stable fixed-length keys.
fn hash_key(kind: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
