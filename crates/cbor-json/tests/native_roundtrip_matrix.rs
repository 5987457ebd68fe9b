use std::net::IpAddr;
use std::time::{Duration, Instant};

use cbor_json::{
    cbor_from_jsonable, cbor_from_native, jsonable_from_cbor, jsonable_from_native,
    native_from_cbor, native_from_jsonable, Decimal, Error, Fraction, IpNetwork, Map, MimeMessage,
    NativeValue, Pattern, Set, SimpleValue, DEFAULT_MAX_DEPTH,
};
use chrono::DateTime;
use proptest::prelude::*;
use serde_json::{json, Value};

fn via_json_text(value: &NativeValue) -> NativeValue {
    let json = jsonable_from_native(value).unwrap_or_else(|e| panic!("{value:?}: {e}"));
    let text = serde_json::to_string(&json).unwrap();
    native_from_jsonable(&serde_json::from_str(&text).unwrap()).unwrap()
}

fn via_cbor(value: &NativeValue) -> NativeValue {
    native_from_cbor(&cbor_from_native(value).unwrap()).unwrap()
}

fn every_kind() -> Vec<NativeValue> {
    let mut key_map = Map::new();
    key_map.insert(NativeValue::Integer(1), NativeValue::text("int key"));
    key_map.insert(
        NativeValue::Tuple(vec![1.into(), "a".into()]),
        NativeValue::text("tuple key"),
    );
    key_map.insert(
        NativeValue::FrozenSet([1, 2].into_iter().map(NativeValue::from).collect()),
        NativeValue::Null,
    );
    let mut text_map = Map::new();
    text_map.insert(NativeValue::text("x"), NativeValue::Float(0.25));
    text_map.insert(NativeValue::text("y"), NativeValue::list(vec![]));

    vec![
        NativeValue::Null,
        NativeValue::Undefined,
        NativeValue::Bool(true),
        NativeValue::Integer(-7),
        NativeValue::Integer(i128::MAX),
        NativeValue::Integer(i128::MIN),
        NativeValue::Float(-1.25),
        NativeValue::Float(1e300),
        NativeValue::text("héllo"),
        NativeValue::Bytes(vec![]),
        NativeValue::Bytes((0..=255).collect()),
        NativeValue::list(vec![1.into(), NativeValue::list(vec![2.into()])]),
        NativeValue::map(text_map),
        NativeValue::map(key_map),
        NativeValue::set(["a", "b"].into_iter().map(NativeValue::from).collect()),
        NativeValue::Date("1900-02-28".parse().unwrap()),
        NativeValue::DateTime(DateTime::parse_from_rfc3339("2001-02-03T04:05:06Z").unwrap()),
        NativeValue::DateTime(
            DateTime::parse_from_rfc3339("1969-07-20T20:17:40.5-05:00").unwrap(),
        ),
        NativeValue::Uuid(uuid::Uuid::from_u128(0x1234_5678_9abc_def0)),
        NativeValue::Fraction(Fraction::new(-22, 7).unwrap()),
        NativeValue::Decimal("-12.340".parse::<Decimal>().unwrap()),
        NativeValue::Decimal(Decimal::new(1, 40)),
        NativeValue::Regex(Pattern::new(r"^\d+(\.\d+)?$").unwrap()),
        NativeValue::IpAddress("::1".parse::<IpAddr>().unwrap()),
        NativeValue::IpNetwork("2001:db8::/32".parse::<IpNetwork>().unwrap()),
        NativeValue::Mime(MimeMessage::new("Subject: hi\n\nbody\n")),
        NativeValue::Simple(SimpleValue::new(99).unwrap()),
        NativeValue::tagged(4000, NativeValue::list(vec!["x".into()])),
    ]
}

#[test]
fn every_kind_round_trips() {
    for value in every_kind() {
        assert_eq!(via_json_text(&value), value);
        assert_eq!(via_cbor(&value), value);
    }
}

#[test]
fn frozen_kinds_thaw_outside_keys() {
    let mut map = Map::new();
    map.insert(NativeValue::text("k"), NativeValue::Null);
    let cases = [
        (
            NativeValue::Tuple(vec![1.into()]),
            NativeValue::list(vec![1.into()]),
        ),
        (NativeValue::FrozenMap(map.clone()), NativeValue::map(map)),
        (NativeValue::FrozenSet(Set::new()), NativeValue::set(Set::new())),
    ];
    for (frozen, thawed) in cases {
        assert_eq!(via_json_text(&frozen), thawed);
        assert_eq!(via_cbor(&frozen), thawed);
    }
}

#[test]
fn offsets_are_kept_in_json_but_not_in_cbor() {
    let dt = DateTime::parse_from_rfc3339("2020-06-01T12:00:00+05:30").unwrap();
    let value = NativeValue::DateTime(dt);
    let NativeValue::DateTime(json_dt) = via_json_text(&value) else {
        panic!("expected datetime")
    };
    assert_eq!(json_dt.offset(), dt.offset());
    let NativeValue::DateTime(cbor_dt) = via_cbor(&value) else {
        panic!("expected datetime")
    };
    assert_eq!(cbor_dt, dt);
    assert_eq!(cbor_dt.offset().local_minus_utc(), 0);
}

#[test]
fn recursive_structure_is_rejected() {
    let a1 = NativeValue::list(vec![1.into()]);
    let a2 = NativeValue::list(vec![2.into(), a1.clone()]);
    let NativeValue::List(a1_items) = &a1 else {
        unreachable!()
    };
    a1_items.borrow_mut().push(a2.clone());

    assert!(matches!(cbor_from_native(&a1), Err(Error::CyclicStructure)));
    assert!(matches!(jsonable_from_native(&a2), Err(Error::CyclicStructure)));
    assert_eq!(
        Error::CyclicStructure.to_string(),
        "cannot encode a recursively linked structure"
    );
    a1_items.borrow_mut().clear();
}

#[test]
fn map_containing_itself_is_rejected() {
    let map = NativeValue::map(Map::new());
    let NativeValue::Map(inner) = &map else {
        unreachable!()
    };
    inner.borrow_mut().insert(NativeValue::text("me"), map.clone());
    assert!(matches!(cbor_from_native(&map), Err(Error::CyclicStructure)));
    inner.borrow_mut().remove(&NativeValue::text("me"));
}

#[test]
fn shared_subtree_is_duplicated() {
    let shared = NativeValue::list(vec![1.into(), 2.into()]);
    let mut map = Map::new();
    map.insert(NativeValue::text("left"), shared.clone());
    map.insert(NativeValue::text("right"), shared.clone());
    let value = NativeValue::list(vec![NativeValue::map(map), shared]);
    let back = via_cbor(&value);
    assert_eq!(back, value);

    // The copies are independent after decoding.
    let items = back.sequence_items().unwrap();
    let NativeValue::List(tail) = &items[1] else {
        unreachable!()
    };
    tail.borrow_mut().push(3.into());
    let NativeValue::Map(head) = &items[0] else {
        unreachable!()
    };
    assert_eq!(
        head.borrow().get(&NativeValue::text("left")),
        Some(&NativeValue::list(vec![1.into(), 2.into()]))
    );
}

#[test]
fn insertion_order_does_not_change_bytes() {
    let keys = ["delta", "a", "charlie", "bravo", "echo"];
    let mut forward = Map::new();
    for (i, key) in keys.iter().enumerate() {
        forward.insert(NativeValue::text(*key), NativeValue::from(i as i64));
    }
    let mut backward = Map::new();
    for (i, key) in keys.iter().enumerate().rev() {
        backward.insert(NativeValue::text(*key), NativeValue::from(i as i64));
    }
    let forward = NativeValue::map(forward);
    let backward = NativeValue::map(backward);
    assert_eq!(forward, backward);
    let bytes = cbor_from_native(&forward).unwrap();
    assert_eq!(bytes, cbor_from_native(&backward).unwrap());
    assert_eq!(bytes, cbor_from_native(&forward).unwrap());
}

const PI_50: &str = "3.1415926535897932384626433832795028841971693993751";

#[test]
fn wide_decimals_and_fractions_round_trip() {
    let cases = [
        NativeValue::Decimal(PI_50.parse().unwrap()),
        NativeValue::Decimal(format!("-{PI_50}E+400").parse().unwrap()),
        NativeValue::Fraction("1/340282366920938463463374607431768211457".parse().unwrap()),
        NativeValue::Fraction(
            "-340282366920938463463374607431768211457/340282366920938463463374607431768211459"
                .parse()
                .unwrap(),
        ),
    ];
    for value in cases {
        assert_eq!(via_json_text(&value), value);
        assert_eq!(via_cbor(&value), value);
    }
    assert_eq!(
        jsonable_from_native(&NativeValue::Decimal(PI_50.parse().unwrap())).unwrap(),
        json!({"$type": "decimal", "$value": PI_50})
    );
}

#[test]
fn decimal_specials_survive_json() {
    for text in ["-0", "-0.000", "NaN", "sNaN", "Infinity", "-Infinity"] {
        let value = NativeValue::Decimal(text.parse().unwrap());
        assert_eq!(via_json_text(&value), value, "{text}");
        assert_eq!(
            jsonable_from_native(&value).unwrap(),
            json!({"$type": "decimal", "$value": text})
        );
    }
}

#[test]
fn decimal_specials_map_to_cbor_floats() {
    let zero = NativeValue::Decimal("-0.0".parse().unwrap());
    assert_eq!(via_cbor(&zero), NativeValue::Decimal("0.0".parse().unwrap()));
    let infinity = NativeValue::Decimal("-Infinity".parse().unwrap());
    assert_eq!(via_cbor(&infinity), NativeValue::Float(f64::NEG_INFINITY));
    let nan = NativeValue::Decimal(Decimal::nan());
    assert!(matches!(via_cbor(&nan), NativeValue::Float(f) if f.is_nan()));
}

fn nested_lists(depth: usize) -> NativeValue {
    let mut value = NativeValue::Integer(0);
    for _ in 0..depth {
        value = NativeValue::list(vec![value]);
    }
    value
}

fn nested_arrays(depth: usize) -> Value {
    let mut value = json!(0);
    for _ in 0..depth {
        value = Value::Array(vec![value]);
    }
    value
}

#[test]
fn default_depth_passes_every_walker() {
    let value = nested_lists(DEFAULT_MAX_DEPTH);
    let bytes = cbor_from_native(&value).unwrap();
    assert_eq!(native_from_cbor(&bytes).unwrap(), value);
    let json = jsonable_from_native(&value).unwrap();
    assert_eq!(json, nested_arrays(DEFAULT_MAX_DEPTH));
    assert_eq!(native_from_jsonable(&json).unwrap(), value);
    assert_eq!(jsonable_from_cbor(&bytes).unwrap(), json);
    assert_eq!(cbor_from_jsonable(&json).unwrap(), bytes);
}

#[test]
fn one_past_default_depth_fails_every_walker() {
    let limit = DEFAULT_MAX_DEPTH;
    let too_deep = |result: Result<(), Error>| {
        assert!(
            matches!(result, Err(Error::DepthLimitExceeded { limit: l }) if l == limit),
            "{result:?}"
        )
    };
    let value = nested_lists(limit + 1);
    let json = nested_arrays(limit + 1);
    let mut bytes = vec![0x81; limit + 1];
    bytes.push(0x00);

    too_deep(cbor_from_native(&value).map(drop));
    too_deep(jsonable_from_native(&value).map(drop));
    too_deep(native_from_cbor(&bytes).map(drop));
    too_deep(jsonable_from_cbor(&bytes).map(drop));
    too_deep(native_from_jsonable(&json).map(drop));
    too_deep(cbor_from_jsonable(&json).map(drop));
}

#[test]
fn large_maps_convert_in_linear_time() {
    let object: serde_json::Map<String, Value> =
        (0..50_000).map(|i| (format!("key{i}"), json!(i))).collect();
    let json = Value::Object(object);
    let started = Instant::now();
    let native = native_from_jsonable(&json).unwrap();
    let NativeValue::Map(map) = &native else {
        panic!("expected map")
    };
    assert_eq!(map.borrow().len(), 50_000);
    assert_eq!(
        map.borrow().get(&NativeValue::text("key49999")),
        Some(&NativeValue::Integer(49_999))
    );
    assert_eq!(jsonable_from_native(&native).unwrap(), json);
    assert_eq!(via_cbor(&native), native);
    assert!(started.elapsed() < Duration::from_secs(20));
}

fn leaf() -> impl Strategy<Value = NativeValue> {
    prop_oneof![
        Just(NativeValue::Null),
        Just(NativeValue::Undefined),
        any::<bool>().prop_map(NativeValue::Bool),
        any::<i128>().prop_map(NativeValue::Integer),
        any::<i32>().prop_map(|i| NativeValue::Float(i as f64 / 16.0)),
        ".{0,12}".prop_map(NativeValue::Text),
        proptest::collection::vec(any::<u8>(), 0..48).prop_map(NativeValue::Bytes),
        (-100_000i64..100_000).prop_map(|days| {
            NativeValue::Date(
                chrono::NaiveDate::default() + chrono::Duration::days(days),
            )
        }),
    ]
}

fn tree() -> impl Strategy<Value = NativeValue> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(NativeValue::list),
            proptest::collection::vec(("[a-z$]{0,6}", inner.clone()), 0..6).prop_map(|entries| {
                NativeValue::map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (NativeValue::Text(k), v))
                        .collect(),
                )
            }),
            proptest::collection::vec(leaf(), 0..6)
                .prop_map(|members| NativeValue::set(members.into_iter().collect())),
            (1000u64..50_000, inner).prop_map(|(tag, value)| NativeValue::tagged(tag, value)),
        ]
    })
}

proptest! {
    #[test]
    fn arbitrary_trees_round_trip(value in tree()) {
        prop_assert_eq!(via_json_text(&value), value.clone());
        prop_assert_eq!(via_cbor(&value), value);
    }

    #[test]
    fn encoding_twice_gives_identical_bytes(value in tree()) {
        prop_assert_eq!(cbor_from_native(&value).unwrap(), cbor_from_native(&value).unwrap());
    }
}
