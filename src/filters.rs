//! Filter parsing and validation for the `/units` endpoint.
//!
//! Every recognized query parameter is either accepted-and-normalized into a
//! [`FilterSet`] or the whole request is rejected with a stable error code.
//! Validation is fail-fast in a fixed order: cursor exclusivity first, then
//! unit_id, status, sub_status, model, offline, modified_since, from, to,
//! fields, limit, offset. Nothing downstream performs its own escaping, so
//! anything not explicitly allowed here must be rejected here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::soql::{ALLOWED_FIELDS, Clause, DEFAULT_FIELDS, SoqlQuery};

/// Path prefix every relative cursor must start with.
const CURSOR_PATH_PREFIX: &str = "/services/data";

/// Raw, untrusted query parameters as received from the client.
///
/// Everything is an `Option<String>` so limit/offset can distinguish
/// "absent" from "present but malformed" and produce the right error code.
#[derive(Debug, Default, Deserialize)]
pub struct RawUnitQuery {
    pub unit_id: Option<String>,
    pub status: Option<String>,
    pub sub_status: Option<String>,
    pub model: Option<String>,
    pub offline: Option<String>,
    pub modified_since: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub fields: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub next_cursor: Option<String>,
}

impl RawUnitQuery {
    /// True when any parameter other than `next_cursor` is present.
    fn has_filter_params(&self) -> bool {
        self.unit_id.is_some()
            || self.status.is_some()
            || self.sub_status.is_some()
            || self.model.is_some()
            || self.offline.is_some()
            || self.modified_since.is_some()
            || self.from.is_some()
            || self.to.is_some()
            || self.fields.is_some()
            || self.limit.is_some()
            || self.offset.is_some()
    }
}

/// The validated, in-memory representation of one request's intent.
///
/// Created once per request, consumed once by the query builder, never
/// persisted and never shared across requests.
#[derive(Debug, Clone)]
pub struct FilterSet {
    pub unit_id: Option<String>,
    pub status: Option<Vec<String>>,
    pub sub_status: Option<Vec<String>>,
    pub model: Option<Vec<String>>,
    pub offline: Option<bool>,
    pub modified_since: Option<DateTime<Utc>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Resolved projection (explicit `fields` or the default subset)
    pub fields: Vec<String>,
    pub limit: u32,
    /// Whether the caller supplied `limit` (required for `offset`)
    pub explicit_limit: bool,
    pub offset: Option<u32>,
    /// Opaque continuation token; mutually exclusive with everything above
    pub cursor: Option<String>,
}

impl FilterSet {
    /// Assemble the SOQL query for this filter set.
    ///
    /// Clause order is fixed (unit id, status, sub_status, model, offline,
    /// modified_since, from, to) so identical filters always render
    /// byte-identical query text. Must not be called for cursor requests.
    pub fn to_soql(&self) -> SoqlQuery {
        let mut clauses = Vec::new();

        if let Some(unit_id) = &self.unit_id {
            clauses.push(Clause::Eq {
                field: "Id",
                value: unit_id.clone(),
            });
        }
        if let Some(status) = &self.status {
            clauses.push(Clause::In {
                field: "Status__c",
                values: status.clone(),
            });
        }
        if let Some(sub_status) = &self.sub_status {
            clauses.push(Clause::In {
                field: "Sub_Status__c",
                values: sub_status.clone(),
            });
        }
        if let Some(model) = &self.model {
            clauses.push(Clause::In {
                field: "Model__c",
                values: model.clone(),
            });
        }
        if let Some(offline) = self.offline {
            clauses.push(Clause::EqBool {
                field: "Offline__c",
                value: offline,
            });
        }
        if let Some(at) = self.modified_since {
            clauses.push(Clause::OnOrAfter {
                field: "LastModifiedDate",
                at,
            });
        }
        if let Some(at) = self.from {
            clauses.push(Clause::OnOrAfter {
                field: "CreatedDate",
                at,
            });
        }
        if let Some(at) = self.to {
            clauses.push(Clause::OnOrBefore {
                field: "CreatedDate",
                at,
            });
        }

        SoqlQuery {
            fields: self.fields.clone(),
            clauses,
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// Compact one-line summary of the active filters for the access log.
    pub fn describe(&self) -> String {
        if let Some(cursor) = &self.cursor {
            return format!("cursor={cursor}");
        }

        let mut parts = Vec::new();
        if let Some(v) = &self.unit_id {
            parts.push(format!("unit_id={v}"));
        }
        if let Some(v) = &self.status {
            parts.push(format!("status={}", v.join(",")));
        }
        if let Some(v) = &self.sub_status {
            parts.push(format!("sub_status={}", v.join(",")));
        }
        if let Some(v) = &self.model {
            parts.push(format!("model={}", v.join(",")));
        }
        if let Some(v) = self.offline {
            parts.push(format!("offline={v}"));
        }
        if let Some(v) = self.modified_since {
            parts.push(format!("modified_since={}", v.to_rfc3339()));
        }
        if let Some(v) = self.from {
            parts.push(format!("from={}", v.to_rfc3339()));
        }
        if let Some(v) = self.to {
            parts.push(format!("to={}", v.to_rfc3339()));
        }
        parts.push(format!("limit={}", self.limit));
        if let Some(v) = self.offset {
            parts.push(format!("offset={v}"));
        }
        parts.join(" ")
    }
}

/// Validate raw parameters into a [`FilterSet`], or reject the request.
///
/// All rejections are HTTP 400 with a stable `error` code; no partial
/// processing and no upstream call happens after a rejection.
pub fn validate(raw: RawUnitQuery, config: &Config) -> AppResult<FilterSet> {
    // Cursor exclusivity is checked before anything else
    if let Some(cursor) = &raw.next_cursor {
        if raw.has_filter_params() {
            return Err(AppError::validation(
                "invalid_next_cursor_usage",
                "next_cursor cannot be combined with any other parameter",
            ));
        }
        let cursor = validate_cursor(cursor, config)?;
        return Ok(FilterSet {
            unit_id: None,
            status: None,
            sub_status: None,
            model: None,
            offline: None,
            modified_since: None,
            from: None,
            to: None,
            fields: DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect(),
            limit: config.max_limit,
            explicit_limit: false,
            offset: None,
            cursor: Some(cursor),
        });
    }

    let unit_id = raw.unit_id.as_deref().map(validate_unit_id).transpose()?;

    let status = validate_list_param(
        raw.status.as_deref(),
        "status",
        "invalid_status",
        &config.status_allow_list,
    )?;
    // Operator-configured default status bypasses the allow-list check
    let status = match (status, &config.default_status) {
        (Some(values), _) => Some(values),
        (None, Some(default)) => Some(vec![default.clone()]),
        (None, None) => None,
    };

    let sub_status = validate_list_param(
        raw.sub_status.as_deref(),
        "sub_status",
        "invalid_sub_status",
        &config.sub_status_allow_list,
    )?;
    let model = validate_list_param(
        raw.model.as_deref(),
        "model",
        "invalid_model",
        &config.model_allow_list,
    )?;

    let offline = raw.offline.as_deref().map(validate_offline).transpose()?;

    let modified_since = raw
        .modified_since
        .as_deref()
        .map(validate_modified_since)
        .transpose()?;
    let from = raw
        .from
        .as_deref()
        .map(|v| validate_date_bound(v, "from", "invalid_from", false))
        .transpose()?;
    let to = raw
        .to
        .as_deref()
        .map(|v| validate_date_bound(v, "to", "invalid_to", true))
        .transpose()?;

    let fields = match raw.fields.as_deref() {
        Some(raw_fields) => validate_fields(raw_fields)?,
        None => DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect(),
    };

    let explicit_limit = raw.limit.is_some();
    let limit = match raw.limit.as_deref() {
        Some(raw_limit) => validate_limit(raw_limit, config.max_limit)?,
        None => config.max_limit,
    };

    let offset = match raw.offset.as_deref() {
        Some(raw_offset) => {
            if !explicit_limit {
                return Err(AppError::validation(
                    "offset_requires_limit",
                    "offset requires limit to be explicitly provided",
                ));
            }
            Some(validate_offset(raw_offset, config.max_offset)?)
        }
        None => None,
    };

    Ok(FilterSet {
        unit_id,
        status,
        sub_status,
        model,
        offline,
        modified_since,
        from,
        to,
        fields,
        limit,
        explicit_limit,
        offset,
        cursor: None,
    })
}

/// `unit_id` must be a 15-18 character alphanumeric Salesforce record id.
fn validate_unit_id(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let valid = (15..=18).contains(&trimmed.len())
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric());

    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::validation(
            "invalid_unit_id",
            "unit_id must be 15-18 alphanumeric characters",
        ))
    }
}

/// Comma-separated list: split, trim, drop empties, dedupe preserving order.
///
/// Must yield at least one value; when an allow-list is configured, every
/// value must be on it.
fn validate_list_param(
    raw: Option<&str>,
    name: &str,
    code: &'static str,
    allow_list: &[String],
) -> AppResult<Option<Vec<String>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut values: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !values.iter().any(|v| v == trimmed) {
            values.push(trimmed.to_string());
        }
    }

    if values.is_empty() {
        return Err(AppError::validation(
            code,
            format!("{name} must contain at least one value"),
        ));
    }

    if !allow_list.is_empty() {
        let unknown: Vec<&str> = values
            .iter()
            .filter(|v| !allow_list.iter().any(|a| a == *v))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::validation(
                code,
                format!("{name} contains unknown values: {}", unknown.join(", ")),
            ));
        }
    }

    Ok(Some(values))
}

/// `offline` accepts case-insensitive `true`/`false` only.
fn validate_offline(raw: &str) -> AppResult<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AppError::validation(
            "invalid_offline",
            "offline must be 'true' or 'false'",
        ))
    }
}

/// `modified_since` accepts a calendar date (normalized to midnight UTC) or a
/// full ISO-8601 timestamp with offset, normalized to UTC.
fn validate_modified_since(raw: &str) -> AppResult<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::validation(
                "invalid_modified_since",
                "modified_since must be YYYY-MM-DD or an ISO-8601 timestamp",
            )
        })
}

/// `from`/`to` accept calendar dates only. `from` lower-bounds at 00:00:00Z,
/// `to` upper-bounds at 23:59:59Z.
fn validate_date_bound(
    raw: &str,
    name: &str,
    code: &'static str,
    upper: bool,
) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(code, format!("{name} must be a YYYY-MM-DD date")))?;

    let time = if upper {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    Ok(time.unwrap_or_default().and_utc())
}

/// `fields` is restricted to the fixed allow-list of known Unit fields.
fn validate_fields(raw: &str) -> AppResult<Vec<String>> {
    let mut fields: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !fields.iter().any(|f| f == trimmed) {
            fields.push(trimmed.to_string());
        }
    }

    if fields.is_empty() {
        return Err(AppError::validation(
            "invalid_fields",
            "fields must contain at least one field name",
        ));
    }

    let unknown: Vec<&str> = fields
        .iter()
        .filter(|f| !ALLOWED_FIELDS.contains(&f.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::validation(
            "invalid_fields",
            format!("fields contains unknown names: {}", unknown.join(", ")),
        ));
    }

    Ok(fields)
}

fn validate_limit(raw: &str, max_limit: u32) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (1..=max_limit).contains(n))
        .ok_or_else(|| {
            AppError::validation(
                "invalid_limit",
                format!("limit must be an integer between 1 and {max_limit}"),
            )
        })
}

fn validate_offset(raw: &str, max_offset: u32) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n <= max_offset)
        .ok_or_else(|| {
            AppError::validation(
                "invalid_offset",
                format!("offset must be an integer between 0 and {max_offset}"),
            )
        })
}

/// A cursor is either an absolute URL on the configured Salesforce origin
/// (scheme, host, and port must all match, and the path must sit under the
/// REST API prefix), or a bare path beginning with that prefix.
///
/// The cursor is fetched with the upstream bearer token attached, so string
/// prefix checks are not enough: `example.my.salesforce.com.evil.example`
/// starts with the configured base as text but is a different host. The
/// comparison therefore goes through parsed URL components.
fn validate_cursor(raw: &str, config: &Config) -> AppResult<String> {
    let trimmed = raw.trim();

    if trimmed.starts_with(CURSOR_PATH_PREFIX) {
        return Ok(trimmed.to_string());
    }

    if let Ok(url) = Url::parse(trimmed) {
        let base = &config.sf_base_url;
        let same_origin = url.scheme() == base.scheme()
            && url.host() == base.host()
            && url.port_or_known_default() == base.port_or_known_default();
        if same_origin && url.path().starts_with(CURSOR_PATH_PREFIX) {
            return Ok(trimmed.to_string());
        }
    }

    Err(AppError::validation(
        "invalid_next_cursor",
        format!("next_cursor must be a {CURSOR_PATH_PREFIX} path or a URL under the configured Salesforce instance"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    fn error_code(err: AppError) -> String {
        match err {
            AppError::Validation { code, .. } => code.to_string(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_empty_query_uses_defaults() {
        let set = validate(RawUnitQuery::default(), &config()).unwrap();

        assert!(set.unit_id.is_none());
        assert!(set.status.is_none());
        assert!(set.cursor.is_none());
        assert_eq!(set.limit, 200);
        assert!(!set.explicit_limit);
        assert_eq!(set.fields, DEFAULT_FIELDS);
    }

    #[test]
    fn test_valid_unit_id_is_trimmed() {
        let raw = RawUnitQuery {
            unit_id: Some("  a0B1234567890ABCde ".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(set.unit_id.as_deref(), Some("a0B1234567890ABCde"));
    }

    #[test]
    fn test_invalid_unit_ids() {
        for bad in ["short", "a0B1234567890ABCdef9", "a0B12345678!0ABC"] {
            let raw = RawUnitQuery {
                unit_id: Some(bad.to_string()),
                ..RawUnitQuery::default()
            };
            let err = validate(raw, &config()).unwrap_err();
            assert_eq!(error_code(err), "invalid_unit_id", "input: {bad}");
        }
    }

    #[test]
    fn test_status_list_dedupes_and_drops_empties() {
        let raw = RawUnitQuery {
            status: Some(" Deployed ,, Returned , Deployed ".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(
            set.status,
            Some(vec!["Deployed".to_string(), "Returned".to_string()])
        );
    }

    #[test]
    fn test_status_all_empty_values_rejected() {
        let raw = RawUnitQuery {
            status: Some(" , ,".to_string()),
            ..RawUnitQuery::default()
        };
        let err = validate(raw, &config()).unwrap_err();
        assert_eq!(error_code(err), "invalid_status");
    }

    #[test]
    fn test_status_allow_list_rejects_unknown() {
        let cfg = Config {
            status_allow_list: vec!["Deployed".to_string(), "Returned".to_string()],
            ..Config::default()
        };
        let raw = RawUnitQuery {
            status: Some("Deployed,Scrapped".to_string()),
            ..RawUnitQuery::default()
        };
        let err = validate(raw, &cfg).unwrap_err();
        match err {
            AppError::Validation { code, message } => {
                assert_eq!(code, "invalid_status");
                assert!(message.contains("Scrapped"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_status_applied_when_absent() {
        let cfg = Config {
            default_status: Some("Deployed".to_string()),
            ..Config::default()
        };
        let set = validate(RawUnitQuery::default(), &cfg).unwrap();
        assert_eq!(set.status, Some(vec!["Deployed".to_string()]));

        // An explicit status wins over the default
        let raw = RawUnitQuery {
            status: Some("Returned".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &cfg).unwrap();
        assert_eq!(set.status, Some(vec!["Returned".to_string()]));
    }

    #[test]
    fn test_offline_case_insensitive() {
        for (input, expected) in [("true", true), ("TRUE", true), ("False", false)] {
            let raw = RawUnitQuery {
                offline: Some(input.to_string()),
                ..RawUnitQuery::default()
            };
            let set = validate(raw, &config()).unwrap();
            assert_eq!(set.offline, Some(expected), "input: {input}");
        }

        let raw = RawUnitQuery {
            offline: Some("yes".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_offline"
        );
    }

    #[test]
    fn test_modified_since_date_and_timestamp() {
        let raw = RawUnitQuery {
            modified_since: Some("2024-03-01".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(
            set.modified_since.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );

        // Offset timestamps are normalized to UTC
        let raw = RawUnitQuery {
            modified_since: Some("2024-03-01T10:30:00+02:00".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(
            set.modified_since.unwrap().to_rfc3339(),
            "2024-03-01T08:30:00+00:00"
        );

        let raw = RawUnitQuery {
            modified_since: Some("yesterday".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_modified_since"
        );
    }

    #[test]
    fn test_from_to_bounds() {
        let raw = RawUnitQuery {
            from: Some("2024-03-01".to_string()),
            to: Some("2024-03-31".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(set.from.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(set.to.unwrap().to_rfc3339(), "2024-03-31T23:59:59+00:00");
    }

    #[test]
    fn test_from_rejects_timestamps() {
        let raw = RawUnitQuery {
            from: Some("2024-03-01T00:00:00Z".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_from"
        );

        let raw = RawUnitQuery {
            to: Some("03/31/2024".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_to"
        );
    }

    #[test]
    fn test_fields_allow_list() {
        let raw = RawUnitQuery {
            fields: Some("Id,Name,SerialNumber__c".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(set.fields, vec!["Id", "Name", "SerialNumber__c"]);

        let raw = RawUnitQuery {
            fields: Some("Id,Password__c".to_string()),
            ..RawUnitQuery::default()
        };
        let err = validate(raw, &config()).unwrap_err();
        match err {
            AppError::Validation { code, message } => {
                assert_eq!(code, "invalid_fields");
                assert!(message.contains("Password__c"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_limit_boundaries() {
        for (input, ok) in [("1", true), ("200", true), ("0", false), ("201", false)] {
            let raw = RawUnitQuery {
                limit: Some(input.to_string()),
                ..RawUnitQuery::default()
            };
            let result = validate(raw, &config());
            assert_eq!(result.is_ok(), ok, "limit={input}");
            if !ok {
                assert_eq!(error_code(result.unwrap_err()), "invalid_limit");
            }
        }

        let raw = RawUnitQuery {
            limit: Some("fifty".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_limit"
        );
    }

    #[test]
    fn test_offset_requires_limit() {
        let raw = RawUnitQuery {
            offset: Some("100".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "offset_requires_limit"
        );

        let raw = RawUnitQuery {
            limit: Some("50".to_string()),
            offset: Some("100".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(set.offset, Some(100));
        assert_eq!(set.limit, 50);
    }

    #[test]
    fn test_offset_range() {
        let raw = RawUnitQuery {
            limit: Some("50".to_string()),
            offset: Some("2001".to_string()),
            ..RawUnitQuery::default()
        };
        assert_eq!(
            error_code(validate(raw, &config()).unwrap_err()),
            "invalid_offset"
        );

        let raw = RawUnitQuery {
            limit: Some("50".to_string()),
            offset: Some("2000".to_string()),
            ..RawUnitQuery::default()
        };
        assert!(validate(raw, &config()).is_ok());
    }

    #[test]
    fn test_cursor_mutually_exclusive_with_every_filter() {
        let others: Vec<RawUnitQuery> = vec![
            RawUnitQuery {
                unit_id: Some("a0B1234567890ABC".to_string()),
                ..RawUnitQuery::default()
            },
            RawUnitQuery {
                status: Some("Deployed".to_string()),
                ..RawUnitQuery::default()
            },
            RawUnitQuery {
                offline: Some("true".to_string()),
                ..RawUnitQuery::default()
            },
            RawUnitQuery {
                fields: Some("Id".to_string()),
                ..RawUnitQuery::default()
            },
            RawUnitQuery {
                limit: Some("50".to_string()),
                ..RawUnitQuery::default()
            },
        ];

        for mut raw in others {
            raw.next_cursor = Some("/services/data/v58.0/query/01g-next".to_string());
            assert_eq!(
                error_code(validate(raw, &config()).unwrap_err()),
                "invalid_next_cursor_usage"
            );
        }
    }

    #[test]
    fn test_cursor_path_and_absolute_url() {
        let raw = RawUnitQuery {
            next_cursor: Some("/services/data/v58.0/query/01g-next".to_string()),
            ..RawUnitQuery::default()
        };
        let set = validate(raw, &config()).unwrap();
        assert_eq!(
            set.cursor.as_deref(),
            Some("/services/data/v58.0/query/01g-next")
        );

        let raw = RawUnitQuery {
            next_cursor: Some(
                "https://example.my.salesforce.com/services/data/v58.0/query/01g-next".to_string(),
            ),
            ..RawUnitQuery::default()
        };
        assert!(validate(raw, &config()).unwrap().cursor.is_some());
    }

    #[test]
    fn test_cursor_rejects_foreign_urls() {
        for bad in [
            "https://evil.example.com/services/data/v58.0/query/01g-next",
            "relative/path",
            "ftp://example.my.salesforce.com/x",
        ] {
            let raw = RawUnitQuery {
                next_cursor: Some(bad.to_string()),
                ..RawUnitQuery::default()
            };
            assert_eq!(
                error_code(validate(raw, &config()).unwrap_err()),
                "invalid_next_cursor",
                "input: {bad}"
            );
        }
    }

    #[test]
    fn test_cursor_rejects_lookalike_origins() {
        // These all start with the configured base as raw text but would
        // send the bearer token somewhere else
        for bad in [
            // Host extension
            "https://example.my.salesforce.com.evil.example/services/data/v58.0/query/01g-next",
            // Userinfo trick: real host is evil.example
            "https://example.my.salesforce.com@evil.example/services/data/v58.0/query/01g-next",
            // Same host, non-default port
            "https://example.my.salesforce.com:8443/services/data/v58.0/query/01g-next",
            // Scheme downgrade
            "http://example.my.salesforce.com/services/data/v58.0/query/01g-next",
            // Right origin, path outside the REST API prefix
            "https://example.my.salesforce.com/other/path",
        ] {
            let raw = RawUnitQuery {
                next_cursor: Some(bad.to_string()),
                ..RawUnitQuery::default()
            };
            assert_eq!(
                error_code(validate(raw, &config()).unwrap_err()),
                "invalid_next_cursor",
                "input: {bad}"
            );
        }
    }

    #[test]
    fn test_to_soql_clause_order() {
        let raw = RawUnitQuery {
            unit_id: Some("a0B1234567890ABC".to_string()),
            status: Some("Deployed".to_string()),
            offline: Some("false".to_string()),
            from: Some("2024-03-01".to_string()),
            limit: Some("50".to_string()),
            ..RawUnitQuery::default()
        };
        let soql = validate(raw, &config()).unwrap().to_soql().render();

        assert_eq!(
            soql,
            "SELECT Id, Name, Status__c, Sub_Status__c, Model__c, Offline__c, LastModifiedDate \
             FROM Unit__c WHERE Id = 'a0B1234567890ABC' AND Status__c IN ('Deployed') \
             AND Offline__c = false AND CreatedDate >= 2024-03-01T00:00:00Z LIMIT 50"
        );
    }
}
