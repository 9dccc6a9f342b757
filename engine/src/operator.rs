//! Query operators and their wire symbols.
//!
//! The symbol table is part of the protocol and must not change.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An operator that can tag a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    EqualTo,
    NotEqualTo,
    ContainedIn,
    NotContainedIn,
    ContainedBy,
    Exists,
    Select,
    DontSelect,
    All,
    Regex,
    InQuery,
    NotInQuery,
    NearSphere,
    Or,
    And,
    Nor,
    RelatedTo,
    Within,
    GeoWithin,
    GeoIntersects,
    MaxDistance,
    CenterSphere,
    Box,
    Polygon,
    Point,
    Text,
    Search,
    Term,
    RegexOptions,
    RelativeTime,
    Score,
}

impl Operator {
    /// Every operator, in table order.
    pub const ALL: [Operator; 35] = [
        Operator::LessThan,
        Operator::LessThanOrEqualTo,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqualTo,
        Operator::EqualTo,
        Operator::NotEqualTo,
        Operator::ContainedIn,
        Operator::NotContainedIn,
        Operator::ContainedBy,
        Operator::Exists,
        Operator::Select,
        Operator::DontSelect,
        Operator::All,
        Operator::Regex,
        Operator::InQuery,
        Operator::NotInQuery,
        Operator::NearSphere,
        Operator::Or,
        Operator::And,
        Operator::Nor,
        Operator::RelatedTo,
        Operator::Within,
        Operator::GeoWithin,
        Operator::GeoIntersects,
        Operator::MaxDistance,
        Operator::CenterSphere,
        Operator::Box,
        Operator::Polygon,
        Operator::Point,
        Operator::Text,
        Operator::Search,
        Operator::Term,
        Operator::RegexOptions,
        Operator::RelativeTime,
        Operator::Score,
    ];

    /// The wire symbol for this operator.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::LessThan => "$lt",
            Operator::LessThanOrEqualTo => "$lte",
            Operator::GreaterThan => "$gt",
            Operator::GreaterThanOrEqualTo => "$gte",
            Operator::EqualTo => "$eq",
            Operator::NotEqualTo => "$ne",
            Operator::ContainedIn => "$in",
            Operator::NotContainedIn => "$nin",
            Operator::ContainedBy => "$containedBy",
            Operator::Exists => "$exists",
            Operator::Select => "$select",
            Operator::DontSelect => "$dontSelect",
            Operator::All => "$all",
            Operator::Regex => "$regex",
            Operator::InQuery => "$inQuery",
            Operator::NotInQuery => "$notInQuery",
            Operator::NearSphere => "$nearSphere",
            Operator::Or => "$or",
            Operator::And => "$and",
            Operator::Nor => "$nor",
            Operator::RelatedTo => "$relatedTo",
            Operator::Within => "$within",
            Operator::GeoWithin => "$geoWithin",
            Operator::GeoIntersects => "$geoIntersects",
            Operator::MaxDistance => "$maxDistance",
            Operator::CenterSphere => "$centerSphere",
            Operator::Box => "$box",
            Operator::Polygon => "$polygon",
            Operator::Point => "$point",
            Operator::Text => "$text",
            Operator::Search => "$search",
            Operator::Term => "$term",
            Operator::RegexOptions => "$options",
            Operator::RelativeTime => "$relativeTime",
            Operator::Score => "$score",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

/// Returned when a string is not a known operator symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator symbol: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}
