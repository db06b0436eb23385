use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::json;
use std::time::Duration;

use super::*;

// ==================== RetryPolicy Tests ====================

#[test]
fn test_retry_policy_default() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.initial_delay_ms, 100, "initial_delay_ms should default to 100");
    assert_eq!(policy.max_delay_ms, 5000, "max_delay_ms should default to 5000");
    assert_eq!(policy.multiplier, 2.0);
    assert_eq!(policy.max_retries, Some(3), "max_retries should default to Some(3)");
    assert!(policy.max_elapsed_ms.is_none(), "max_elapsed_ms should default to unbounded");
}

#[test]
fn test_retry_policy_builder_pattern() {
    let policy = RetryPolicy::new()
        .with_initial_delay_ms(20)
        .with_max_delay_ms(400)
        .with_multiplier(3.0)
        .with_max_retries(None)
        .with_max_elapsed_ms(Some(1000));

    assert_eq!(policy.initial_delay_ms, 20);
    assert_eq!(policy.max_delay_ms, 400);
    assert_eq!(policy.multiplier, 3.0);
    assert!(policy.max_retries.is_none());
    assert_eq!(policy.max_elapsed_ms, Some(1000));
}

#[test]
fn test_retry_policy_presets() {
    let fast = RetryPolicy::fast();
    let relaxed = RetryPolicy::relaxed();

    assert!(fast.initial_delay_ms < relaxed.initial_delay_ms);
    assert!(fast.max_delay_ms < relaxed.max_delay_ms);
    assert!(fast.max_elapsed_ms.is_some(), "fast preset bounds total time");
}

#[test]
fn test_retry_policy_delay_schedule() {
    let policy = RetryPolicy::new().with_initial_delay_ms(100).with_max_delay_ms(1000);

    assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1000), "delay is capped");
    assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_millis(1000));
}

#[test]
fn test_retry_policy_bad_multiplier_is_flat() {
    let policy = RetryPolicy::new().with_multiplier(0.5);
    assert_eq!(policy.delay_for_attempt(3), policy.delay_for_attempt(0));
}

#[test]
fn test_retry_policy_allows_retry() {
    let policy = RetryPolicy::new().with_max_retries(Some(2));
    assert!(policy.allows_retry(0, Duration::ZERO));
    assert!(policy.allows_retry(1, Duration::ZERO));
    assert!(!policy.allows_retry(2, Duration::ZERO), "budget of 2 retries is spent");

    let disabled = RetryPolicy::new().with_max_retries(Some(0));
    assert!(!disabled.allows_retry(0, Duration::ZERO));

    let timed = RetryPolicy::new()
        .with_max_retries(None)
        .with_initial_delay_ms(100)
        .with_max_elapsed_ms(Some(500));
    assert!(timed.allows_retry(0, Duration::from_millis(300)));
    assert!(
        !timed.allows_retry(0, Duration::from_millis(450)),
        "next delay would overrun the elapsed budget"
    );
}

#[test]
fn test_retry_policy_serde_defaults() {
    let parsed: RetryPolicy = serde_json::from_str(r#"{"initial_delay_ms": 5}"#).unwrap();

    assert_eq!(parsed.initial_delay_ms, 5);
    assert_eq!(parsed.max_delay_ms, 5000, "missing fields fall back to defaults");
    assert_eq!(parsed.max_retries, Some(3));
    assert!(parsed.max_elapsed_ms.is_none());
}

// ==================== DecoderConfig / BulkUpdateOptions Tests ====================

#[test]
fn test_decoder_config() {
    assert!(!DecoderConfig::default().weakly_typed_input);
    assert!(DecoderConfig::new().with_weakly_typed_input(true).weakly_typed_input);
}

#[test]
fn test_bulk_update_options_builder() {
    let opts = BulkUpdateOptions::new("users", "id")
        .with_columns(["name", "age"])
        .with_stmt_suffix("RETURNING id")
        .with_dialect(Dialect::PostgreSql);

    assert_eq!(opts.table, "users");
    assert_eq!(opts.primary_key, "id");
    assert_eq!(opts.columns, vec!["name".to_string(), "age".to_string()]);
    assert_eq!(opts.stmt_suffix.as_deref(), Some("RETURNING id"));
    assert_eq!(opts.dialect, Dialect::PostgreSql);
}

#[test]
fn test_bulk_update_options_deserialize() {
    let opts: BulkUpdateOptions = serde_json::from_value(json!({
        "table": "users",
        "primary_key": "id",
        "columns": ["name"],
        "dialect": "postgresql"
    }))
    .unwrap();

    assert_eq!(opts.dialect, Dialect::PostgreSql);
    assert!(opts.stmt_suffix.is_none());

    let minimal: BulkUpdateOptions =
        serde_json::from_value(json!({"table": "t", "primary_key": "id"})).unwrap();
    assert_eq!(minimal.dialect, Dialect::MySql, "dialect defaults to MySql");
    assert!(minimal.columns.is_empty());
}

#[test]
fn test_dialect_placeholders() {
    assert_eq!(Dialect::MySql.placeholder(5), "?");
    assert_eq!(Dialect::PostgreSql.placeholder(5), "$5");
    assert!(!Dialect::MySql.requires_casts());
    assert!(Dialect::PostgreSql.requires_casts());
}

// ==================== ColumnDescriptor Tests ====================

#[test]
fn test_column_descriptor_builder() {
    let col = ColumnDescriptor::new("age", "INT").not_null().with_scan_kind(ScanKind::U32);

    assert!(col.is_not_null());
    assert_eq!(col.scan_kind, Some(ScanKind::U32));
    assert!(!ColumnDescriptor::new("x", "TEXT").is_not_null());
    assert!(!ColumnDescriptor::new("x", "TEXT").nullable().is_not_null());
}

#[test]
fn test_column_descriptor_serde() {
    let col: ColumnDescriptor =
        serde_json::from_value(json!({"name": "id", "database_type_name": "BIGINT"})).unwrap();
    assert_eq!(col.nullability, Nullability::Unknown, "nullability defaults to unknown");
    assert!(col.scan_kind.is_none());

    let json = serde_json::to_value(ColumnDescriptor::new("age", "INT").not_null()).unwrap();
    assert_eq!(json["nullability"], "not_null");
    assert!(json.get("scan_kind").is_none(), "absent scan hint is skipped");
}

// ==================== Arg / Param Tests ====================

#[test]
fn test_flatten_args_preserves_order() {
    let flat = flatten_args(vec![Arg::from(1i64), Arg::from(vec![2i64, 3]), Arg::from(4i64)]);

    assert_eq!(
        flat,
        vec![
            Some(Value::I64(1)),
            Some(Value::I64(2)),
            Some(Value::I64(3)),
            Some(Value::I64(4)),
        ]
    );
}

#[test]
fn test_flatten_args_nulls_and_empty_lists() {
    let flat = flatten_args(vec![
        Arg::null(),
        Arg::from(Vec::<i32>::new()),
        Arg::from(vec![Some("a"), None]),
    ]);

    assert_eq!(flat, vec![None, Some(Value::from("a")), None]);
}

#[test]
fn test_bytes_are_a_single_argument() {
    let flat = flatten_args(vec![Arg::from(vec![1u8, 2, 3])]);
    assert_eq!(flat, vec![Some(Value::Bytes(vec![1, 2, 3]))]);
}

// ==================== Value / DecodedValue Tests ====================

#[test]
fn test_decoded_value_wrapping() {
    assert_eq!(DecodedValue::wrap(Some(Value::I64(1)), true), DecodedValue::Bare(Value::I64(1)));
    assert_eq!(
        DecodedValue::wrap(Some(Value::I64(1)), false),
        DecodedValue::Present(Value::I64(1))
    );
    assert_eq!(DecodedValue::wrap(None, true), DecodedValue::Absent);

    assert!(DecodedValue::Absent.is_optional());
    assert!(!DecodedValue::Bare(Value::Bool(true)).is_optional());
    assert_eq!(DecodedValue::Present(Value::from("x")).into_value(), Some(Value::from("x")));
}

#[test]
fn test_value_serialization() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let values = vec![
        DecodedValue::Bare(Value::I32(7)),
        DecodedValue::Present(Value::from("hi")),
        DecodedValue::Absent,
        DecodedValue::Bare(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
        DecodedValue::Bare(Value::Time(NaiveTime::from_hms_opt(8, 5, 0).unwrap())),
        DecodedValue::Bare(Value::Timestamp(ts)),
        DecodedValue::Bare(Value::Bytes(b"dbq".to_vec())),
        DecodedValue::Present(Value::Json(json!({"a": [1, 2]}))),
    ];

    assert_eq!(
        serde_json::to_value(&values).unwrap(),
        json!([7, "hi", null, "2024-03-01", "08:05:00", "2024-03-01T12:30:00Z", "ZGJx", {"a": [1, 2]}])
    );
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::U8(200).as_i64(), Some(200));
    assert_eq!(Value::U64(u64::MAX).as_i64(), None, "out of i64 range");
    assert_eq!(Value::I16(-3).as_f64(), Some(-3.0));
    assert!(Value::Float(1.0).as_i128().is_none());
    assert_eq!(Value::from(true).type_name(), "bool");
}

// ==================== QueryOptions / QueryOutput Tests ====================

#[test]
fn test_query_options_defaults() {
    let opts = QueryOptions::new();
    assert!(!opts.bind_records);
    assert!(!opts.single_result);
    assert!(!opts.raw_results);
    assert!(opts.retry_policy.is_none(), "no retry unless configured");
    assert!(opts.post_fetch.is_none());
    assert!(!opts.concurrent_post_process);
}

#[test]
fn test_query_output_helpers() {
    let empty: QueryOutput = QueryOutput::Empty;
    assert!(empty.is_empty());
    assert_eq!(empty.len(), 0);
    assert!(empty.into_rows().is_none());

    let records: QueryOutput<i32> = QueryOutput::Records(vec![1, 2]);
    assert_eq!(records.len(), 2);
    assert_eq!(records.into_records(), Some(vec![1, 2]));
}
