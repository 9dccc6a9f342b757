//! Constructors for field predicates.
//!
//! Each function validates its arguments and returns a ready [`Constraint`].
//! Functions taking records resolve them to pointers first and fail on the
//! first record without an identity.

use crate::record::{pointers, Record};
use crate::value::QueryValue;
use crate::{error::Result, Constraint, Error, FieldKey, Operator, QuerySettings};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Comparisons
// ============================================================================

/// Field equals `value`.
///
/// Reads the equality mode from `settings` on every call. In the default
/// mode the constraint is operator-less, so a later constraint on the same
/// key replaces it when merged. With `use_equal_operator` it is tagged
/// `$eq` and can sit beside other operators on the key.
pub fn equal_to(
    key: impl Into<FieldKey>,
    value: impl Into<QueryValue>,
    settings: &QuerySettings,
) -> Constraint {
    equal_to_using(key, value, settings.use_equal_operator())
}

/// Field equals `value`, with the equality mode given explicitly.
pub fn equal_to_using(
    key: impl Into<FieldKey>,
    value: impl Into<QueryValue>,
    use_equal_operator: bool,
) -> Constraint {
    if use_equal_operator {
        Constraint::new(key, Operator::EqualTo, value)
    } else {
        Constraint::bare(key, value)
    }
}

/// Field points to `object`.
pub fn equal_to_object<R: Record + ?Sized>(
    key: impl Into<FieldKey>,
    object: &R,
    settings: &QuerySettings,
) -> Result<Constraint> {
    let pointer = object.to_pointer()?;
    Ok(equal_to(key, pointer, settings))
}

pub fn not_equal_to(key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Constraint {
    Constraint::new(key, Operator::NotEqualTo, value)
}

/// Field does not point to `object`.
pub fn not_equal_to_object<R: Record + ?Sized>(
    key: impl Into<FieldKey>,
    object: &R,
) -> Result<Constraint> {
    Ok(not_equal_to(key, object.to_pointer()?))
}

pub fn less_than(key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Constraint {
    Constraint::new(key, Operator::LessThan, value)
}

pub fn less_than_or_equal_to(key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Constraint {
    Constraint::new(key, Operator::LessThanOrEqualTo, value)
}

pub fn greater_than(key: impl Into<FieldKey>, value: impl Into<QueryValue>) -> Constraint {
    Constraint::new(key, Operator::GreaterThan, value)
}

pub fn greater_than_or_equal_to(
    key: impl Into<FieldKey>,
    value: impl Into<QueryValue>,
) -> Constraint {
    Constraint::new(key, Operator::GreaterThanOrEqualTo, value)
}

/// Wrap the string value of a comparison as a relative time.
///
/// `less_than("createdAt", "3 days ago")` becomes
/// `{"createdAt": {"$lt": {"$relativeTime": "3 days ago"}}}`. Constraints
/// without a string value are returned unchanged.
pub fn relative(constraint: Constraint) -> Constraint {
    let time = match constraint.value().and_then(QueryValue::as_str) {
        Some(time) => time.to_string(),
        None => return constraint,
    };
    let wrapped = QueryValue::map([(Operator::RelativeTime.symbol(), time)]);
    constraint.with_value(wrapped)
}

// ============================================================================
// Containment
// ============================================================================

fn list_constraint<V, I>(key: impl Into<FieldKey>, operator: Operator, values: I) -> Constraint
where
    V: Into<QueryValue>,
    I: IntoIterator<Item = V>,
{
    Constraint::new(key, operator, QueryValue::list(values))
}

fn pointer_list_constraint<'a, R, I>(
    key: impl Into<FieldKey>,
    operator: Operator,
    objects: I,
) -> Result<Constraint>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    Ok(list_constraint(key, operator, pointers(objects)?))
}

/// Field value is one of `values`.
pub fn contained_in<V, I>(key: impl Into<FieldKey>, values: I) -> Constraint
where
    V: Into<QueryValue>,
    I: IntoIterator<Item = V>,
{
    list_constraint(key, Operator::ContainedIn, values)
}

/// Field points to one of `objects`.
pub fn contained_in_objects<'a, R, I>(key: impl Into<FieldKey>, objects: I) -> Result<Constraint>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    pointer_list_constraint(key, Operator::ContainedIn, objects)
}

/// Field value is none of `values`.
pub fn not_contained_in<V, I>(key: impl Into<FieldKey>, values: I) -> Constraint
where
    V: Into<QueryValue>,
    I: IntoIterator<Item = V>,
{
    list_constraint(key, Operator::NotContainedIn, values)
}

pub fn not_contained_in_objects<'a, R, I>(
    key: impl Into<FieldKey>,
    objects: I,
) -> Result<Constraint>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    pointer_list_constraint(key, Operator::NotContainedIn, objects)
}

/// Array field contains every one of `values`.
pub fn contains_all<V, I>(key: impl Into<FieldKey>, values: I) -> Constraint
where
    V: Into<QueryValue>,
    I: IntoIterator<Item = V>,
{
    list_constraint(key, Operator::All, values)
}

pub fn contains_all_objects<'a, R, I>(key: impl Into<FieldKey>, objects: I) -> Result<Constraint>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    pointer_list_constraint(key, Operator::All, objects)
}

/// Every element of the array field is one of `values`.
pub fn contained_by<V, I>(key: impl Into<FieldKey>, values: I) -> Constraint
where
    V: Into<QueryValue>,
    I: IntoIterator<Item = V>,
{
    list_constraint(key, Operator::ContainedBy, values)
}

pub fn contained_by_objects<'a, R, I>(key: impl Into<FieldKey>, objects: I) -> Result<Constraint>
where
    R: Record + ?Sized + 'a,
    I: IntoIterator<Item = &'a R>,
{
    pointer_list_constraint(key, Operator::ContainedBy, objects)
}

// ============================================================================
// Existence
// ============================================================================

/// Field is `null` or absent.
pub fn is_null(key: impl Into<FieldKey>) -> Constraint {
    Constraint::null(key)
}

/// Field is present and not `null`.
pub fn is_not_null(key: impl Into<FieldKey>) -> Constraint {
    Constraint::new(key, Operator::NotEqualTo, QueryValue::Null)
}

/// Field is present, whatever its value.
pub fn exists(key: impl Into<FieldKey>) -> Constraint {
    Constraint::new(key, Operator::Exists, true)
}

/// Field is absent.
pub fn does_not_exist(key: impl Into<FieldKey>) -> Constraint {
    Constraint::new(key, Operator::Exists, false)
}

// ============================================================================
// Text and regex
// ============================================================================

/// Options accepted by full-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextOption {
    /// Stop words and stemming language (string)
    Language,
    /// Case sensitive matching (bool)
    CaseSensitive,
    /// Diacritic sensitive matching (bool)
    DiacriticSensitive,
}

impl TextOption {
    /// Wire key of the option inside `$search`.
    pub const fn symbol(self) -> &'static str {
        match self {
            TextOption::Language => "$language",
            TextOption::CaseSensitive => "$caseSensitive",
            TextOption::DiacriticSensitive => "$diacriticSensitive",
        }
    }

    fn name(self) -> &'static str {
        match self {
            TextOption::Language => "language",
            TextOption::CaseSensitive => "caseSensitive",
            TextOption::DiacriticSensitive => "diacriticSensitive",
        }
    }

    fn check(self, value: &serde_json::Value) -> Result<()> {
        let (valid, expected) = match self {
            TextOption::Language => (value.is_string(), "String"),
            TextOption::CaseSensitive | TextOption::DiacriticSensitive => {
                (value.is_boolean(), "Bool")
            }
        };
        if valid {
            return Ok(());
        }
        tracing::warn!(option = self.name(), "rejected text search option");
        Err(Error::OptionTypeMismatch {
            option: self.name().to_string(),
            expected: expected.to_string(),
            got: json_type_name(value).to_string(),
        })
    }
}

impl fmt::Display for TextOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "language" => Ok(TextOption::Language),
            "caseSensitive" => Ok(TextOption::CaseSensitive),
            "diacriticSensitive" => Ok(TextOption::DiacriticSensitive),
            other => Err(Error::Validation(format!("unknown text option '{other}'"))),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "Null",
        serde_json::Value::Bool(_) => "Bool",
        serde_json::Value::Number(_) => "Number",
        serde_json::Value::String(_) => "String",
        serde_json::Value::Array(_) => "Array",
        serde_json::Value::Object(_) => "Object",
    }
}

/// Full-text search on the field.
pub fn matches_text(key: impl Into<FieldKey>, text: impl Into<String>) -> Constraint {
    let search = QueryValue::map([(Operator::Term.symbol(), text.into())]);
    text_constraint(key, search)
}

/// Full-text search with options.
///
/// Fails with [`Error::OptionTypeMismatch`] if an option value has the
/// wrong JSON type for its option.
pub fn matches_text_with_options<I>(
    key: impl Into<FieldKey>,
    text: impl Into<String>,
    options: I,
) -> Result<Constraint>
where
    I: IntoIterator<Item = (TextOption, serde_json::Value)>,
{
    let mut search = std::collections::BTreeMap::new();
    search.insert(
        Operator::Term.symbol().to_string(),
        QueryValue::String(text.into()),
    );
    for (option, value) in options {
        option.check(&value)?;
        search.insert(option.symbol().to_string(), QueryValue::from(value));
    }
    Ok(text_constraint(key, QueryValue::Map(search)))
}

fn text_constraint(key: impl Into<FieldKey>, search: QueryValue) -> Constraint {
    let search = QueryValue::map([(Operator::Search.symbol(), search)]);
    Constraint::new(key, Operator::Text, search)
}

/// Field matches a regular expression.
///
/// Without modifiers this is a `$regex` constraint. With modifiers the
/// constraint is operator-less and carries `{"$regex": ..., "$options": ...}`.
pub fn matches_regex(
    key: impl Into<FieldKey>,
    regex: impl Into<String>,
    modifiers: Option<&str>,
) -> Constraint {
    let regex = regex.into();
    match modifiers {
        Some(modifiers) => Constraint::bare(
            key,
            QueryValue::map([
                (Operator::Regex.symbol(), regex.as_str()),
                (Operator::RegexOptions.symbol(), modifiers),
            ]),
        ),
        None => Constraint::new(key, Operator::Regex, regex),
    }
}

/// Quote a literal so every regex metacharacter in it is matched verbatim.
pub fn quote_regex(literal: &str) -> String {
    format!("\\Q{}\\E", literal.replace("\\E", "\\E\\\\E\\Q"))
}

/// String field contains `substring`.
pub fn contains_string(
    key: impl Into<FieldKey>,
    substring: &str,
    modifiers: Option<&str>,
) -> Constraint {
    matches_regex(key, quote_regex(substring), modifiers)
}

/// String field starts with `prefix`.
pub fn has_prefix(key: impl Into<FieldKey>, prefix: &str, modifiers: Option<&str>) -> Constraint {
    matches_regex(key, format!("^{}", quote_regex(prefix)), modifiers)
}

/// String field ends with `suffix`.
pub fn has_suffix(key: impl Into<FieldKey>, suffix: &str, modifiers: Option<&str>) -> Constraint {
    matches_regex(key, format!("{}$", quote_regex(suffix)), modifiers)
}

// ============================================================================
// Relational
// ============================================================================

fn related_constraint(key: Option<FieldKey>, object: Option<QueryValue>) -> Constraint {
    let mut condition = std::collections::BTreeMap::new();
    if let Some(key) = key {
        condition.insert("key".to_string(), QueryValue::String(key));
    }
    if let Some(object) = object {
        condition.insert("object".to_string(), object);
    }
    Constraint::bare(Operator::RelatedTo.symbol(), QueryValue::Map(condition))
}

/// Records that are members of `object`'s relation under `key`.
pub fn related_to<R: Record + ?Sized>(key: impl Into<FieldKey>, object: &R) -> Result<Constraint> {
    let pointer = object.to_pointer()?;
    Ok(related_constraint(Some(key.into()), Some(pointer.into())))
}

/// Relational predicate naming only the relation key.
pub fn related_to_key(key: impl Into<FieldKey>) -> Constraint {
    related_constraint(Some(key.into()), None)
}

/// Relational predicate naming only the owning object.
pub fn related_to_object<R: Record + ?Sized>(object: &R) -> Result<Constraint> {
    let pointer = object.to_pointer()?;
    Ok(related_constraint(None, Some(pointer.into())))
}
