//! Edge case tests for docket-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use chrono::{TimeZone, Utc};
use docket_engine::geo::{within_polygon, within_radians};
use docket_engine::predicate::{
    contained_in, contained_in_objects, contains_string, does_not_exist, equal_to_using, exists,
    greater_than, has_prefix, has_suffix, is_not_null, is_null, matches_text_with_options,
    quote_regex, relative,
};
use docket_engine::query::{and, in_query, nor};
use docket_engine::{
    Constraint, Error, GeoPoint, Object, Operation, Operator, Query, QueryValue, Record, Role,
    TextOption,
};
use serde_json::json;

fn where_of(query: &Query) -> serde_json::Value {
    serde_json::Value::Object(query.predicate())
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn empty_string_value() {
    let query = Query::new("Item").filter(equal_to_using("name", "", false));
    assert_eq!(where_of(&query), json!({"name": ""}));
}

#[test]
fn unicode_strings() {
    let values = vec![
        "日本語テスト",      // Japanese
        "Привет мир",        // Russian
        "مرحبا بالعالم",     // Arabic
        "🎉🚀💯",            // Emoji
        "Hello\nWorld\tTab", // Whitespace
        "Null\0Test",        // Embedded null
    ];

    for value in values {
        let query = Query::new("Item").filter(equal_to_using("name", value, false));
        let bytes = serde_json::to_vec(&query.predicate()).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded["name"], value, "Failed for: {}", value);
    }
}

#[test]
fn very_long_strings() {
    // 1MB string
    let long_string = "x".repeat(1024 * 1024);
    let constraint = equal_to_using("name", long_string.as_str(), true);
    let encoded = constraint.encode().unwrap();
    assert_eq!(encoded["$eq"].as_str().unwrap().len(), 1024 * 1024);
}

#[test]
fn regex_quoting_escapes_terminator() {
    assert_eq!(quote_regex("a.b"), r"\Qa.b\E");
    assert_eq!(quote_regex(r"x\Ey"), r"\Qx\E\\E\Qy\E");

    let prefix = has_prefix("name", "Mr. ", None);
    assert_eq!(prefix.encode(), Some(json!({"$regex": r"^\QMr. \E"})));

    let suffix = has_suffix("name", "Jr.", Some("i"));
    assert_eq!(
        suffix.encode(),
        Some(json!({"$regex": r"\QJr.\E$", "$options": "i"}))
    );

    let contains = contains_string("name", "", None);
    assert_eq!(contains.encode(), Some(json!({"$regex": r"\Q\E"})));
}

// ============================================================================
// Numeric Edge Cases
// ============================================================================

#[test]
fn integer_boundaries() {
    let values = vec![i64::MIN, i64::MAX, 0i64, -1i64, 1i64];

    for value in values {
        let constraint = greater_than("count", value);
        assert_eq!(constraint.encode(), Some(json!({"$gt": value})));
    }

    let constraint = greater_than("count", u64::MAX);
    assert_eq!(constraint.encode(), Some(json!({"$gt": u64::MAX})));
}

#[test]
fn non_finite_floats_encode_as_null() {
    let constraint = greater_than("ratio", f64::NAN);
    assert_eq!(constraint.encode(), Some(json!({"$gt": null})));
}

#[test]
fn float_values_round_trip() {
    let constraint = greater_than("ratio", 0.1 + 0.2);
    let bytes = serde_json::to_vec(&constraint.to_predicate()).unwrap();
    let decoded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded["ratio"]["$gt"].as_f64(), Some(0.1 + 0.2));
}

// ============================================================================
// Date Edge Cases
// ============================================================================

#[test]
fn nested_dates_use_envelope() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.timestamp_millis_opt(1_704_153_600_123).unwrap();

    let constraint = contained_in("createdAt", vec![start, end]);
    assert_eq!(
        constraint.encode(),
        Some(json!({"$in": [
            {"__type": "Date", "iso": "2024-01-01T00:00:00.000Z"},
            {"__type": "Date", "iso": "2024-01-02T00:00:00.123Z"}
        ]}))
    );

    let nested = Constraint::bare(
        "window",
        QueryValue::map([("from", QueryValue::from(start))]),
    );
    assert_eq!(
        nested.encode(),
        Some(json!({"from": {"__type": "Date", "iso": "2024-01-01T00:00:00.000Z"}}))
    );
}

#[test]
fn relative_time() {
    let constraint = relative(greater_than("createdAt", "3 days ago"));
    assert_eq!(
        constraint.encode(),
        Some(json!({"$gt": {"$relativeTime": "3 days ago"}}))
    );

    // Non-string values pass through untouched.
    let numeric = relative(greater_than("score", 3));
    assert_eq!(numeric.encode(), Some(json!({"$gt": 3})));
}

// ============================================================================
// Existence Edge Cases
// ============================================================================

#[test]
fn null_marker_vs_not_null() {
    let query = Query::new("Item").filter(is_null("deletedAt"));
    assert_eq!(where_of(&query), json!({"deletedAt": null}));

    let query = Query::new("Item").filter(is_not_null("deletedAt"));
    assert_eq!(where_of(&query), json!({"deletedAt": {"$ne": null}}));
}

#[test]
fn exists_then_does_not_exist() {
    let query = Query::new("Item")
        .filter(exists("avatar"))
        .filter(does_not_exist("avatar"));
    assert_eq!(where_of(&query), json!({"avatar": {"$exists": false}}));
}

#[test]
fn null_marker_replaces_operators() {
    let query = Query::new("Item")
        .filter(exists("avatar"))
        .filter(is_null("avatar"));
    assert_eq!(where_of(&query), json!({"avatar": null}));
}

// ============================================================================
// Record Edge Cases
// ============================================================================

#[test]
fn containment_fails_on_first_unsaved_record() {
    let records = [
        Object::with_id("_User", "a"),
        Object::new("_User"),
        Object::with_id("_User", "c"),
    ];
    let result = contained_in_objects("owner", &records);
    assert!(matches!(result, Err(Error::IdentityMissing { .. })));
}

#[test]
fn role_name_validation_propagates() {
    let role: Role = serde_json::from_value(json!({"name": "bad/name", "objectId": "r1"})).unwrap();
    assert!(matches!(role.to_pointer(), Err(Error::Validation(_))));

    let user = Object::with_id("_User", "heel");
    assert!(matches!(
        role.users().add("users", [&user]),
        Ok(ref op) if op.len() == 1
    ));
}

#[test]
fn heterogeneous_records_in_one_operation() {
    let user = Object::with_id("_User", "a");
    let role = Role::new("Staff").unwrap().with_id("r");
    let records: Vec<&dyn Record> = vec![&user, &role];

    let result = Operation::new().add_relation("members", records);
    assert!(matches!(result, Err(Error::ClassMismatch { .. })));
}

// ============================================================================
// Text Search Edge Cases
// ============================================================================

#[test]
fn text_options_type_checked() {
    let result = matches_text_with_options(
        "body",
        "coffee",
        [(TextOption::CaseSensitive, json!("yes"))],
    );
    assert!(matches!(
        result,
        Err(Error::OptionTypeMismatch { option, .. }) if option == "caseSensitive"
    ));

    let constraint = matches_text_with_options(
        "body",
        "coffee",
        [
            (TextOption::Language, json!("en")),
            (TextOption::DiacriticSensitive, json!(false)),
        ],
    )
    .unwrap();
    assert_eq!(
        constraint.encode(),
        Some(json!({"$text": {"$search": {
            "$term": "coffee",
            "$language": "en",
            "$diacriticSensitive": false
        }}}))
    );
}

// ============================================================================
// Nesting Edge Cases
// ============================================================================

#[test]
fn deeply_nested_queries() {
    let mut query = Query::new("Item").filter(greater_than("depth", 0));
    for depth in 1..=20 {
        query = Query::new("Item")
            .filter(greater_than("depth", depth))
            .filter(in_query("parent", &query));
    }

    let encoded = serde_json::to_string(&query.predicate()).unwrap();
    assert_eq!(encoded.matches("$inQuery").count(), 20);
}

#[test]
fn empty_combinators() {
    let query = Query::new("Item").filter(and(Vec::<&Query>::new()));
    assert_eq!(where_of(&query), json!({"$and": []}));
}

#[test]
fn nested_combinators_keep_structure() {
    let a = Query::new("Item").filter(greater_than("x", 1));
    let b = Query::new("Item").filter(nor([&a]));
    let query = Query::new("Item").filter(and([&a, &b]));
    assert_eq!(
        where_of(&query),
        json!({"$and": [
            {"x": {"$gt": 1}},
            {"$nor": [{"x": {"$gt": 1}}]}
        ]})
    );
}

// ============================================================================
// Geo Edge Cases
// ============================================================================

#[test]
fn geo_point_bounds() {
    assert!(GeoPoint::new(90.0, 180.0).is_ok());
    assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    assert!(matches!(
        GeoPoint::new(90.1, 0.0),
        Err(Error::InvalidGeoPoint(_))
    ));
    assert!(matches!(
        GeoPoint::new(0.0, -180.5),
        Err(Error::InvalidGeoPoint(_))
    ));
}

#[test]
fn polygon_needs_three_points() {
    let a = GeoPoint::new(0.0, 0.0).unwrap();
    let b = GeoPoint::new(0.0, 1.0).unwrap();
    assert!(matches!(
        within_polygon("area", &[a, b]),
        Err(Error::InvalidPolygon(_))
    ));
}

#[test]
fn unsorted_radius_constraints_merge() {
    let point = GeoPoint::new(10.0, 20.0).unwrap();
    let query = Query::new("Place").filter_all(within_radians("location", point, 0.5, false));

    let operators: Vec<Option<Operator>> = query
        .constraints()
        .constraints()
        .map(Constraint::operator)
        .collect();
    assert_eq!(
        operators,
        vec![Some(Operator::CenterSphere), Some(Operator::GeoWithin)]
    );
}
