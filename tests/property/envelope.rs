//! Property tests for signaling envelope validation.
//!
//! Uses proptest to verify:
//! 1. Relayed envelopes come back out exactly as they went in, whatever the
//!    payload and whatever extra fields the sender attached.
//! 2. Arbitrary JSON never makes `Signal::parse` panic.
//! 3. Any `type` outside the known set is rejected as an unknown kind.

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use signalpost_proto::{Envelope, Signal, SignalError, SignalKind};

// --- Strategies ---

/// Strategy for arbitrary JSON values, nested a few levels deep.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 =:.\\-]{0,32}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for non-null payloads.
fn arb_payload() -> impl Strategy<Value = Value> {
    arb_json().prop_filter("data must be non-null", |v| !v.is_null())
}

/// Strategy for peer identifiers.
fn arb_peer() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Strategy for one of the relayed kinds, in wire spelling.
fn arb_relayed_kind() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("offer"),
        Just("answer"),
        Just("ice-candidate"),
        Just("candidate"),
    ]
}

/// Strategy for extra sender-defined fields that must survive relaying.
fn arb_extras() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(("x[a-z]{1,8}", arb_json()), 0..4)
}

// --- Properties ---

proptest! {
    #[test]
    fn relayed_envelope_is_passed_through_unchanged(
        kind in arb_relayed_kind(),
        from in arb_peer(),
        to in arb_peer(),
        data in arb_payload(),
        extras in arb_extras(),
    ) {
        let mut body = Map::new();
        body.insert("type".into(), json!(kind));
        body.insert("from".into(), json!(from));
        body.insert("to".into(), json!(to));
        body.insert("data".into(), data.clone());
        for (key, value) in extras {
            body.insert(key, value);
        }
        let original = Value::Object(body);

        let envelope = Envelope::try_from(original.clone()).unwrap();
        prop_assert!(envelope.kind().is_relayed());
        prop_assert_eq!(envelope.from(), from.as_str());
        prop_assert_eq!(envelope.to(), to.as_str());
        prop_assert_eq!(envelope.data(), &data);

        let text = serde_json::to_string(&envelope).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(reparsed, original);
    }

    #[test]
    fn parse_never_panics(value in arb_json()) {
        let _ = Signal::parse(value);
    }

    #[test]
    fn unknown_type_rejected(kind in "[a-z]{1,12}", from in arb_peer()) {
        prop_assume!(kind.parse::<SignalKind>().is_err());
        let result = Signal::parse(json!({ "type": kind.clone(), "from": from }));
        prop_assert_eq!(result, Err(SignalError::UnknownKind(kind)));
    }
}
