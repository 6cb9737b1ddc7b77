//! Response postprocessing: pagination metadata and cache-fallback markers.
//!
//! A successful upstream payload is augmented with a top-level `pagination`
//! object before it is cached or returned, so the metadata is itself
//! reproducible from cache. Two continuation shapes exist:
//!
//! - Salesforce handed back a `nextRecordsUrl`: exposed verbatim as
//!   `next_cursor` with `has_more: true`
//! - limit/offset paging with `totalSize > offset + returned`: a numeric
//!   `next_cursor = offset + limit` is synthesized

use serde_json::{Map, Value, json};

use crate::filters::FilterSet;

/// Attach pagination metadata to a decoded upstream payload.
///
/// Non-object payloads pass through untouched; there is no sensible place
/// to hang metadata on them.
pub fn augment(payload: Value, filters: &FilterSet) -> Value {
    let Value::Object(mut obj) = payload else {
        return payload;
    };

    let returned = obj
        .get("records")
        .and_then(Value::as_array)
        .map_or(0, Vec::len) as u64;
    let total_size = obj.get("totalSize").and_then(Value::as_u64);
    let offset = u64::from(filters.offset.unwrap_or(0));
    let limit = u64::from(filters.limit);

    let mut pagination = Map::new();
    pagination.insert("limit".to_string(), json!(limit));
    pagination.insert("offset".to_string(), json!(offset));
    pagination.insert("returned".to_string(), json!(returned));
    if let Some(total) = total_size {
        pagination.insert("total_size".to_string(), json!(total));
    }

    if let Some(next_url) = obj.get("nextRecordsUrl").and_then(Value::as_str) {
        // Upstream continuation locator wins; expose it verbatim
        pagination.insert("next_cursor".to_string(), json!(next_url));
        pagination.insert("has_more".to_string(), json!(true));
    } else if filters.cursor.is_none()
        && total_size.is_some_and(|total| total > offset + returned)
    {
        pagination.insert("next_cursor".to_string(), json!(offset + limit));
        pagination.insert("has_more".to_string(), json!(true));
    } else {
        pagination.insert("has_more".to_string(), json!(false));
    }

    obj.insert("pagination".to_string(), Value::Object(pagination));
    Value::Object(obj)
}

/// Annotate a cached payload served as a fallback for a failed upstream call.
///
/// JSON objects get a `cached: true` marker merged in, preserving every
/// original top-level key. Anything else is wrapped.
pub fn annotate_cached(payload: &str) -> Value {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(mut obj)) => {
            obj.insert("cached".to_string(), json!(true));
            Value::Object(obj)
        }
        _ => json!({ "cached": true, "data": payload }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::filters::{RawUnitQuery, validate};

    fn filters(limit: Option<&str>, offset: Option<&str>) -> FilterSet {
        let raw = RawUnitQuery {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
            ..RawUnitQuery::default()
        };
        validate(raw, &Config::default()).unwrap()
    }

    fn cursor_filters() -> FilterSet {
        let raw = RawUnitQuery {
            next_cursor: Some("/services/data/v58.0/query/01g-next".to_string()),
            ..RawUnitQuery::default()
        };
        validate(raw, &Config::default()).unwrap()
    }

    #[test]
    fn test_synthesizes_numeric_cursor_from_total_size() {
        let payload = json!({
            "totalSize": 120,
            "done": false,
            "records": (0..50).map(|i| json!({"Id": i})).collect::<Vec<_>>(),
        });

        let augmented = augment(payload, &filters(Some("50"), None));
        let pagination = augmented.get("pagination").unwrap();

        assert_eq!(pagination.get("limit").unwrap(), 50);
        assert_eq!(pagination.get("offset").unwrap(), 0);
        assert_eq!(pagination.get("returned").unwrap(), 50);
        assert_eq!(pagination.get("total_size").unwrap(), 120);
        assert_eq!(pagination.get("has_more").unwrap(), true);
        assert_eq!(pagination.get("next_cursor").unwrap(), 50);
    }

    #[test]
    fn test_next_records_url_exposed_verbatim() {
        let payload = json!({
            "totalSize": 5000,
            "records": [],
            "nextRecordsUrl": "/services/data/v58.0/query/01g-3000"
        });

        let augmented = augment(payload, &filters(None, None));
        let pagination = augmented.get("pagination").unwrap();

        assert_eq!(
            pagination.get("next_cursor").unwrap(),
            "/services/data/v58.0/query/01g-3000"
        );
        assert_eq!(pagination.get("has_more").unwrap(), true);
    }

    #[test]
    fn test_no_more_pages() {
        let payload = json!({
            "totalSize": 2,
            "records": [{"Id": "a"}, {"Id": "b"}],
        });

        let augmented = augment(payload, &filters(Some("50"), None));
        let pagination = augmented.get("pagination").unwrap();

        assert_eq!(pagination.get("has_more").unwrap(), false);
        assert!(pagination.get("next_cursor").is_none());
    }

    #[test]
    fn test_offset_advances_synthesized_cursor() {
        let payload = json!({
            "totalSize": 300,
            "records": (0..50).map(|i| json!({"Id": i})).collect::<Vec<_>>(),
        });

        let augmented = augment(payload, &filters(Some("50"), Some("100")));
        let pagination = augmented.get("pagination").unwrap();

        assert_eq!(pagination.get("offset").unwrap(), 100);
        assert_eq!(pagination.get("next_cursor").unwrap(), 150);
    }

    #[test]
    fn test_cursor_requests_never_synthesize_numeric_cursor() {
        // Without a nextRecordsUrl a cursor-addressed page is the last one,
        // even if totalSize is larger than what came back
        let payload = json!({
            "totalSize": 5000,
            "records": [{"Id": "a"}],
        });

        let augmented = augment(payload, &cursor_filters());
        let pagination = augmented.get("pagination").unwrap();

        assert_eq!(pagination.get("has_more").unwrap(), false);
        assert!(pagination.get("next_cursor").is_none());
    }

    #[test]
    fn test_non_object_payload_passes_through() {
        let payload = json!([1, 2, 3]);
        assert_eq!(augment(payload.clone(), &filters(None, None)), payload);
    }

    #[test]
    fn test_annotate_cached_merges_marker() {
        let annotated = annotate_cached(r#"{"totalSize": 1, "records": []}"#);

        assert_eq!(annotated.get("cached").unwrap(), true);
        assert_eq!(annotated.get("totalSize").unwrap(), 1);
        assert!(annotated.get("records").is_some());
    }

    #[test]
    fn test_annotate_cached_wraps_non_objects() {
        let annotated = annotate_cached("not json at all");

        assert_eq!(annotated.get("cached").unwrap(), true);
        assert_eq!(annotated.get("data").unwrap(), "not json at all");
    }
}
