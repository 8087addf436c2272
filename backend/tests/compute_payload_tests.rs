//! Tests for the compute gateway wire format
//!
//! The external worker must see exact decimal strings; a float round trip
//! would corrupt persisted results.

use rust_decimal::Decimal;
use shared::{ComputePayload, ComputePayloadItem, ComputeResultDelivery};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn sample_item(comment: Option<&str>) -> ComputePayloadItem {
    ComputePayloadItem {
        month_id: 7,
        base_yield: dec("100.00"),
        ideal_temp: dec("20.50"),
        ideal_precip: dec("50"),
        avg_temp: dec("18.30"),
        sum_precipitation: dec("61.70"),
        comment: comment.map(|c| c.to_string()),
    }
}

#[test]
fn numeric_fields_serialize_as_exact_strings() {
    let payload = ComputePayload {
        order_id: 12,
        items: vec![sample_item(Some("two trees lost"))],
    };

    let value = serde_json::to_value(&payload).unwrap();
    let item = &value["items"][0];

    assert_eq!(item["base_yield"], "100.00");
    assert_eq!(item["ideal_temp"], "20.50");
    assert_eq!(item["avg_temp"], "18.30");
    assert_eq!(item["sum_precipitation"], "61.70");
    assert_eq!(item["comment"], "two trees lost");
}

#[test]
fn null_comment_passes_through_as_explicit_null() {
    let payload = ComputePayload {
        order_id: 12,
        items: vec![sample_item(None)],
    };

    let value = serde_json::to_value(&payload).unwrap();
    let item = &value["items"][0];

    // The key must be present and null, not omitted
    assert!(item.as_object().unwrap().contains_key("comment"));
    assert!(item["comment"].is_null());
}

#[test]
fn payload_round_trips_without_precision_loss() {
    let payload = ComputePayload {
        order_id: 3,
        items: vec![sample_item(None)],
    };

    let json = serde_json::to_string(&payload).unwrap();
    let back: ComputePayload = serde_json::from_str(&json).unwrap();

    assert_eq!(back.items[0].base_yield.to_string(), "100.00");
    assert_eq!(back.items[0].sum_precipitation.to_string(), "61.70");
}

#[test]
fn result_delivery_keeps_raw_string() {
    let body: ComputeResultDelivery =
        serde_json::from_str(r#"{"result_value": "42.50"}"#).unwrap();
    assert_eq!(body.result_value, "42.50");

    // Non-numeric content deserializes fine; the gateway rejects it with a
    // validation error when parsing, not with a generic body error
    let body: ComputeResultDelivery =
        serde_json::from_str(r#"{"result_value": "not-a-number"}"#).unwrap();
    assert!(body.result_value.parse::<Decimal>().is_err());
}
