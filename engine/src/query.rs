//! Query assembly: merging constraints into a predicate, nested queries and
//! logical combinators.

use crate::value::{Predicate, QueryValue};
use crate::{ClassName, Constraint, FieldKey, Operator, QuerySettings};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Default page size applied by the service.
pub const DEFAULT_LIMIT: usize = 100;

// ============================================================================
// Predicate merging
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum FieldConstraints {
    /// Operator-less or null constraint owning the whole key
    Bare(Constraint),
    /// Operator constraints, at most one per operator, in insertion order
    Tagged(Vec<Constraint>),
}

/// Constraints merged by key.
///
/// An operator-less constraint replaces everything under its key. A tagged
/// constraint replaces an operator-less one and any earlier constraint with
/// the same operator; different operators on one key coexist. Combinators
/// and `$relatedTo` use their symbol as key and so land at the top level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    fields: BTreeMap<FieldKey, FieldConstraints>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a constraint.
    pub fn add(&mut self, constraint: Constraint) {
        let key = constraint.key().to_string();
        let Some(operator) = constraint.operator() else {
            if self
                .fields
                .insert(key.clone(), FieldConstraints::Bare(constraint))
                .is_some()
            {
                tracing::debug!(key = %key, "constraint replaced earlier constraints on key");
            }
            return;
        };

        let entry = self
            .fields
            .entry(key)
            .or_insert_with(|| FieldConstraints::Tagged(Vec::new()));
        if let FieldConstraints::Bare(previous) = entry {
            tracing::debug!(key = %previous.key(), %operator, "operator replaced bare constraint");
            *entry = FieldConstraints::Tagged(Vec::new());
        }
        if let FieldConstraints::Tagged(constraints) = entry {
            constraints.retain(|c| c.operator() != Some(operator));
            constraints.push(constraint);
        }
    }

    /// All merged constraints, ordered by key.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.fields.values().flat_map(|field| match field {
            FieldConstraints::Bare(c) => std::slice::from_ref(c).iter(),
            FieldConstraints::Tagged(cs) => cs.iter(),
        })
    }

    /// Constraints currently held for a key.
    pub fn get(&self, key: &str) -> Vec<&Constraint> {
        match self.fields.get(key) {
            Some(FieldConstraints::Bare(c)) => vec![c],
            Some(FieldConstraints::Tagged(cs)) => cs.iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode the merged predicate.
    ///
    /// Empty emissions contribute nothing; a key left with nothing to emit
    /// is omitted.
    pub fn to_predicate(&self) -> Predicate {
        let mut predicate = Predicate::new();
        for (key, field) in &self.fields {
            match field {
                FieldConstraints::Bare(constraint) => {
                    if let Some(encoded) = constraint.encode() {
                        predicate.insert(key.clone(), encoded);
                    }
                }
                FieldConstraints::Tagged(constraints) => {
                    let mut operators = serde_json::Map::new();
                    for constraint in constraints {
                        if let (Some(op), Some(value)) =
                            (constraint.operator(), constraint.encoded_value())
                        {
                            operators.insert(op.symbol().to_string(), value);
                        }
                    }
                    if !operators.is_empty() {
                        predicate.insert(key.clone(), serde_json::Value::Object(operators));
                    }
                }
            }
        }
        predicate
    }
}

impl FromIterator<Constraint> for Where {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut predicate = Where::new();
        for constraint in iter {
            predicate.add(constraint);
        }
        predicate
    }
}

impl Serialize for Where {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_predicate().serialize(serializer)
    }
}

// ============================================================================
// Nested queries
// ============================================================================

/// A nested query reduced to its class and predicate.
///
/// Encodes as `{"className": ..., "where": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuery {
    class_name: ClassName,
    #[serde(rename = "where")]
    predicate: Predicate,
}

impl SubQuery {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

// ============================================================================
// Query
// ============================================================================

/// Sort order for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Ascending(String),
    Descending(String),
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Ascending(key) => write!(f, "{key}"),
            Order::Descending(key) => write!(f, "-{key}"),
        }
    }
}

/// A query against one class.
///
/// Built by chaining; constraints are merged into a [`Where`] as they are
/// added.
#[derive(Debug, Clone)]
pub struct Query {
    class_name: ClassName,
    predicate: Where,
    settings: Arc<QuerySettings>,
    limit: usize,
    skip: usize,
    order: Vec<Order>,
    keys: Option<BTreeSet<String>>,
    include: Option<BTreeSet<String>>,
    exclude_keys: Option<BTreeSet<String>>,
    count: bool,
}

impl Query {
    /// Create a query with default settings.
    pub fn new(class_name: impl Into<ClassName>) -> Self {
        Self::with_settings(class_name, Arc::new(QuerySettings::default()))
    }

    /// Create a query sharing the given settings.
    pub fn with_settings(class_name: impl Into<ClassName>, settings: Arc<QuerySettings>) -> Self {
        Self {
            class_name: class_name.into(),
            predicate: Where::new(),
            settings,
            limit: DEFAULT_LIMIT,
            skip: 0,
            order: Vec::new(),
            keys: None,
            include: None,
            exclude_keys: None,
            count: false,
        }
    }

    /// Add a constraint.
    pub fn filter(mut self, constraint: Constraint) -> Self {
        self.predicate.add(constraint);
        self
    }

    /// Add several constraints, in order.
    pub fn filter_all<I>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = Constraint>,
    {
        for constraint in constraints {
            self.predicate.add(constraint);
        }
        self
    }

    /// Add an equality constraint using the query's settings at call time.
    pub fn equal_to(self, key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Self {
        let constraint = crate::predicate::equal_to(key, value, &self.settings);
        self.filter(constraint)
    }

    /// Maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Number of results to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Append a sort key.
    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Restrict returned fields.
    pub fn select<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keys
            .get_or_insert_with(BTreeSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Exclude fields from the results.
    pub fn exclude<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.exclude_keys
            .get_or_insert_with(BTreeSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Fetch pointed-to records for these keys.
    pub fn include<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.include
            .get_or_insert_with(BTreeSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Fetch every pointed-to record.
    pub fn include_all(self) -> Self {
        self.include(["*"])
    }

    /// Order by full-text score and return the score.
    pub fn sort_by_text_score(self) -> Self {
        let score = Operator::Score.symbol();
        self.order(Order::Ascending(score.to_string()))
            .select([score])
    }

    /// Ask for the number of matches.
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn settings(&self) -> &Arc<QuerySettings> {
        &self.settings
    }

    pub fn constraints(&self) -> &Where {
        &self.predicate
    }

    /// The merged predicate, as sent under `where`.
    pub fn predicate(&self) -> Predicate {
        self.predicate.to_predicate()
    }

    /// Reduce to class and predicate for nesting in another query.
    ///
    /// Paging, ordering and projection are dropped.
    pub fn sub_query(&self) -> SubQuery {
        SubQuery {
            predicate: self.predicate(),
            class_name: self.class_name.clone(),
        }
    }

    /// Encode the full query body.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    #[serde(rename = "where")]
    predicate: Predicate,
    limit: usize,
    skip: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u8>,
}

fn join(keys: &Option<BTreeSet<String>>) -> Option<String> {
    keys.as_ref()
        .map(|keys| keys.iter().cloned().collect::<Vec<_>>().join(","))
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let order = (!self.order.is_empty()).then(|| {
            self.order
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        });
        let body = QueryBody {
            predicate: self.predicate(),
            limit: self.limit,
            skip: self.skip,
            order,
            keys: join(&self.keys),
            include: join(&self.include),
            exclude_keys: join(&self.exclude_keys),
            count: self.count.then_some(1),
        };
        // Route through a JSON value so body keys are sorted like every
        // other payload.
        serde_json::to_value(body)
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

// ============================================================================
// Combinators and sub-query constraints
// ============================================================================

fn combine<'a, I>(operator: Operator, queries: I) -> Constraint
where
    I: IntoIterator<Item = &'a Query>,
{
    let predicates = queries
        .into_iter()
        .map(|query| QueryValue::Predicate(query.predicate()))
        .collect();
    Constraint::bare(operator.symbol(), QueryValue::List(predicates))
}

/// Matches records satisfying any of the queries.
pub fn or<'a, I>(queries: I) -> Constraint
where
    I: IntoIterator<Item = &'a Query>,
{
    combine(Operator::Or, queries)
}

/// Matches records satisfying all of the queries.
pub fn and<'a, I>(queries: I) -> Constraint
where
    I: IntoIterator<Item = &'a Query>,
{
    combine(Operator::And, queries)
}

/// Matches records satisfying none of the queries.
pub fn nor<'a, I>(queries: I) -> Constraint
where
    I: IntoIterator<Item = &'a Query>,
{
    combine(Operator::Nor, queries)
}

/// Pointer field points to a record returned by `query`.
pub fn in_query(key: impl Into<FieldKey>, query: &Query) -> Constraint {
    Constraint::new(key, Operator::InQuery, query.sub_query())
}

/// Pointer field does not point to any record returned by `query`.
pub fn not_in_query(key: impl Into<FieldKey>, query: &Query) -> Constraint {
    Constraint::new(key, Operator::NotInQuery, query.sub_query())
}

fn select_value(query_key: impl Into<String>, query: &Query) -> QueryValue {
    QueryValue::map([
        ("query", QueryValue::SubQuery(query.sub_query())),
        ("key", QueryValue::String(query_key.into())),
    ])
}

/// Field equals the value of `query_key` in some record returned by `query`.
pub fn matches_key_in_query(
    key: impl Into<FieldKey>,
    query_key: impl Into<String>,
    query: &Query,
) -> Constraint {
    Constraint::new(key, Operator::Select, select_value(query_key, query))
}

/// Field equals no value of `query_key` among the records returned by `query`.
pub fn does_not_match_key_in_query(
    key: impl Into<FieldKey>,
    query_key: impl Into<String>,
    query: &Query,
) -> Constraint {
    Constraint::new(key, Operator::DontSelect, select_value(query_key, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{within_radians, GeoPoint};
    use crate::predicate::{equal_to_using, exists, greater_than, is_null, less_than};
    use serde_json::json;

    fn predicate_of(query: &Query) -> serde_json::Value {
        serde_json::Value::Object(query.predicate())
    }

    #[test]
    fn bare_constraint_overrides_earlier_ones() {
        let query = Query::new("GameScore")
            .filter(greater_than("score", 10))
            .filter(equal_to_using("score", 42, false));
        assert_eq!(predicate_of(&query), json!({"score": 42}));
    }

    #[test]
    fn operator_overrides_bare_constraint() {
        let query = Query::new("GameScore")
            .filter(equal_to_using("score", 42, false))
            .filter(greater_than("score", 10));
        assert_eq!(predicate_of(&query), json!({"score": {"$gt": 10}}));
    }

    #[test]
    fn eq_operator_coexists_with_other_operators() {
        let query = Query::new("GameScore")
            .filter(equal_to_using("score", 42, true))
            .filter(greater_than("score", 10))
            .filter(less_than("score", 50));
        assert_eq!(
            predicate_of(&query),
            json!({"score": {"$eq": 42, "$gt": 10, "$lt": 50}})
        );
    }

    #[test]
    fn same_operator_replaces_previous() {
        let query = Query::new("GameScore")
            .filter(greater_than("score", 10))
            .filter(greater_than("score", 20));
        assert_eq!(predicate_of(&query), json!({"score": {"$gt": 20}}));
        assert_eq!(query.constraints().get("score").len(), 1);
    }

    #[test]
    fn query_equal_to_reads_settings_each_call() {
        let settings = Arc::new(QuerySettings::default());
        let query = Query::with_settings("GameScore", Arc::clone(&settings)).equal_to("a", 1);
        settings.set_use_equal_operator(true);
        let query = query.equal_to("b", 2);

        assert_eq!(predicate_of(&query), json!({"a": 1, "b": {"$eq": 2}}));
    }

    #[test]
    fn empty_emission_is_skipped() {
        let query = Query::new("Place")
            .filter(Constraint::comparator_only("location", Operator::NearSphere))
            .filter(exists("name"));
        assert_eq!(predicate_of(&query), json!({"name": {"$exists": true}}));
    }

    #[test]
    fn geo_pair_merges_under_one_key() {
        let point = GeoPoint::new(1.0, 2.0).unwrap();
        let query = Query::new("Place").filter_all(within_radians("location", point, 0.5, true));
        assert_eq!(
            predicate_of(&query),
            json!({"location": {
                "$nearSphere": {"__type": "GeoPoint", "latitude": 1.0, "longitude": 2.0},
                "$maxDistance": 0.5
            }})
        );
    }

    #[test]
    fn null_marker_in_predicate() {
        let query = Query::new("GameScore").filter(is_null("cheatMode"));
        assert_eq!(predicate_of(&query), json!({"cheatMode": null}));
    }

    #[test]
    fn or_preserves_order_at_top_level() {
        let q1 = Query::new("Player").filter(greater_than("wins", 150));
        let q2 = Query::new("Player").filter(less_than("wins", 5));
        let query = Query::new("Player").filter(or([&q1, &q2]));

        assert_eq!(
            predicate_of(&query),
            json!({"$or": [{"wins": {"$gt": 150}}, {"wins": {"$lt": 5}}]})
        );
    }

    #[test]
    fn and_nor_symbols() {
        let q = Query::new("Player").filter(exists("name"));
        assert_eq!(
            serde_json::Value::Object(and([&q]).to_predicate()),
            json!({"$and": [{"name": {"$exists": true}}]})
        );
        assert_eq!(
            serde_json::Value::Object(nor([&q]).to_predicate()),
            json!({"$nor": [{"name": {"$exists": true}}]})
        );
    }

    #[test]
    fn sub_query_ignores_paging() {
        let inner = Query::new("Post")
            .filter(exists("image"))
            .limit(5)
            .skip(10)
            .order(Order::Descending("createdAt".into()));
        let c = in_query("post", &inner);
        assert_eq!(
            serde_json::Value::Object(c.to_predicate()),
            json!({"post": {"$inQuery": {
                "where": {"image": {"$exists": true}},
                "className": "Post"
            }}})
        );

        let c = not_in_query("post", &inner);
        assert_eq!(c.operator(), Some(Operator::NotInQuery));
    }

    #[test]
    fn select_and_dont_select() {
        let teams = Query::new("Team").filter(greater_than("winPct", 0.5));
        let c = matches_key_in_query("hometown", "city", &teams);
        assert_eq!(
            serde_json::Value::Object(c.to_predicate()),
            json!({"hometown": {"$select": {
                "query": {"className": "Team", "where": {"winPct": {"$gt": 0.5}}},
                "key": "city"
            }}})
        );

        let c = does_not_match_key_in_query("hometown", "city", &teams);
        assert_eq!(c.operator(), Some(Operator::DontSelect));
    }

    #[test]
    fn query_body() {
        let query = Query::new("GameScore")
            .filter(greater_than("score", 1000))
            .limit(10)
            .skip(20)
            .order(Order::Descending("score".into()))
            .order(Order::Ascending("playerName".into()))
            .select(["score", "playerName"])
            .include(["game"])
            .exclude(["cheatMode"]);

        assert_eq!(
            query.to_value(),
            json!({
                "where": {"score": {"$gt": 1000}},
                "limit": 10,
                "skip": 20,
                "order": "-score,playerName",
                "keys": "playerName,score",
                "include": "game",
                "excludeKeys": "cheatMode"
            })
        );
    }

    #[test]
    fn default_body_and_count() {
        let query = Query::new("GameScore");
        assert_eq!(query.to_value(), json!({"where": {}, "limit": 100, "skip": 0}));

        let counting = query.limit(0).count(true);
        assert_eq!(
            counting.to_value(),
            json!({"where": {}, "limit": 0, "skip": 0, "count": 1})
        );
    }

    #[test]
    fn text_score_sorting() {
        let query = Query::new("Article").sort_by_text_score().include_all();
        let body = query.to_value();
        assert_eq!(body["order"], json!("$score"));
        assert_eq!(body["keys"], json!("$score"));
        assert_eq!(body["include"], json!("*"));
    }

    #[test]
    fn where_from_iterator() {
        let merged: Where = vec![exists("a"), is_null("b")].into_iter().collect();
        assert_eq!(merged.constraints().count(), 2);
        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({"a": {"$exists": true}, "b": null})
        );
    }

    #[test]
    fn body_bytes_are_canonical() {
        let query = Query::new("GameScore")
            .filter(greater_than("score", 1000))
            .order(Order::Descending("score".into()))
            .exclude(["secret"])
            .limit(10)
            .count(true);

        let bytes = serde_json::to_vec(&query).unwrap();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            r#"{"count":1,"excludeKeys":"secret","limit":10,"order":"-score","skip":0,"where":{"score":{"$gt":1000}}}"#
        );

        let reparsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(serde_json::to_vec(&reparsed).unwrap(), bytes);
    }

    #[test]
    fn sub_query_bytes_are_canonical() {
        let inner = Query::new("Team").filter(greater_than("winPct", 0.5));
        assert_eq!(
            serde_json::to_string(&inner.sub_query()).unwrap(),
            r#"{"className":"Team","where":{"winPct":{"$gt":0.5}}}"#
        );
    }
}
