//! Filter predicates understood by the remote search endpoints.
//!
//! A [`FilterExpression`] is a single `{field, operator, value}` predicate.
//! Expressions are validated on construction and cannot be mutated
//! afterwards; a query is simply an ordered `Vec<FilterExpression>`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Fields and operators
// ─────────────────────────────────────────────────────────────────────────────

/// Field a predicate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldId {
    Namespace,
    Id,
    Type,
    State,
    FlowId,
    StartDate,
    EndDate,
    Metadata,
    TriggerId,
    TriggerExecutionId,
    Scope,
    ChildFilter,
    Labels,
    Updated,
    Created,
    AssetId,
    Query,
    MinLevel,
}

impl FieldId {
    /// Name used in the wire encoding (`filters[<name>][<OP>]`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Namespace => "namespace",
            FieldId::Id => "id",
            FieldId::Type => "type",
            FieldId::State => "state",
            FieldId::FlowId => "flowId",
            FieldId::StartDate => "startDate",
            FieldId::EndDate => "endDate",
            FieldId::Metadata => "metadata",
            FieldId::TriggerId => "triggerId",
            FieldId::TriggerExecutionId => "triggerExecutionId",
            FieldId::Scope => "scope",
            FieldId::ChildFilter => "childFilter",
            FieldId::Labels => "labels",
            FieldId::Updated => "updated",
            FieldId::Created => "created",
            FieldId::AssetId => "assetId",
            FieldId::Query => "q",
            FieldId::MinLevel => "level",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a field and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    Prefix,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    StartsWith,
}

impl Operator {
    /// Token used in the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::In => "IN",
            Operator::Prefix => "PREFIX",
            Operator::LessThanOrEqualTo => "LESS_THAN_OR_EQUAL_TO",
            Operator::GreaterThanOrEqualTo => "GREATER_THAN_OR_EQUAL_TO",
            Operator::StartsWith => "STARTS_WITH",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Values
// ─────────────────────────────────────────────────────────────────────────────

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single string value.
    Text(String),
    /// A point in time.
    Instant(DateTime<Utc>),
    /// A sequence of values, only valid with [`Operator::In`].
    List(Vec<String>),
    /// A key/value map, only valid on [`FieldId::Metadata`].
    Map(BTreeMap<String, String>),
}

impl FilterValue {
    /// Human readable name of the value shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            FilterValue::Text(_) => "text",
            FilterValue::Instant(_) => "instant",
            FilterValue::List(_) => "list",
            FilterValue::Map(_) => "map",
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, FilterValue::Text(_) | FilterValue::Instant(_))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Instant(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl From<BTreeMap<String, String>> for FilterValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        FilterValue::Map(value)
    }
}

/// Format an instant the way the remote API expects it (RFC 3339, UTC).
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Expression
// ─────────────────────────────────────────────────────────────────────────────

/// One immutable `{field, operator, value}` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterExpression {
    field: FieldId,
    operator: Operator,
    value: FilterValue,
}

impl FilterExpression {
    /// Create a predicate, checking that the value shape fits the operator.
    ///
    /// * `IN` takes a non-empty list.
    /// * `METADATA` takes a non-empty map and only `EQUALS` / `NOT_EQUALS`.
    /// * Everything else takes a scalar (text or instant).
    pub fn new(field: FieldId, operator: Operator, value: impl Into<FilterValue>) -> Result<Self> {
        let value = value.into();

        let expected = if field == FieldId::Metadata {
            if !matches!(operator, Operator::Equals | Operator::NotEquals) {
                return Err(Error::UnsupportedOperator { field, operator });
            }
            match &value {
                FilterValue::Map(map) if !map.is_empty() => None,
                FilterValue::Map(_) => return Err(Error::EmptyValue { field }),
                _ => Some("map"),
            }
        } else if operator == Operator::In {
            match &value {
                FilterValue::List(list) if !list.is_empty() => None,
                FilterValue::List(_) => return Err(Error::EmptyValue { field }),
                _ => Some("list"),
            }
        } else if value.is_scalar() {
            None
        } else {
            Some("scalar")
        };

        if let Some(expected) = expected {
            return Err(Error::FilterShape {
                field,
                operator,
                expected,
                actual: value.shape(),
            });
        }

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Shorthand for an `EQUALS` predicate on a text value.
    pub fn equals(field: FieldId, value: impl Into<String>) -> Result<Self> {
        Self::new(field, Operator::Equals, FilterValue::Text(value.into()))
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Text(v) => write!(f, "{} {} {}", self.field, self.operator, v),
            FilterValue::Instant(v) => {
                write!(f, "{} {} {}", self.field, self.operator, format_instant(v))
            }
            FilterValue::List(v) => write!(f, "{} {} [{}]", self.field, self.operator, v.join(", ")),
            FilterValue::Map(v) => {
                let pairs: Vec<String> = v.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{} {} {{{}}}", self.field, self.operator, pairs.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_requires_list() {
        let err = FilterExpression::new(FieldId::Type, Operator::In, "table").unwrap_err();
        assert!(matches!(
            err,
            Error::FilterShape {
                expected: "list",
                ..
            }
        ));

        let ok = FilterExpression::new(
            FieldId::Type,
            Operator::In,
            vec!["table".to_string(), "view".to_string()],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_in_rejects_empty_list() {
        let err = FilterExpression::new(FieldId::State, Operator::In, Vec::<String>::new());
        assert!(matches!(err, Err(Error::EmptyValue { .. })));
    }

    #[test]
    fn test_metadata_requires_map() {
        let err = FilterExpression::equals(FieldId::Metadata, "owner").unwrap_err();
        assert!(matches!(err, Error::FilterShape { expected: "map", .. }));

        let mut map = BTreeMap::new();
        map.insert("owner".to_string(), "data-team".to_string());
        let expr = FilterExpression::new(FieldId::Metadata, Operator::NotEquals, map).unwrap();
        assert_eq!(expr.operator(), Operator::NotEquals);
    }

    #[test]
    fn test_metadata_rejects_range_operators() {
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "v".to_string());
        let err = FilterExpression::new(FieldId::Metadata, Operator::Prefix, map).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_scalar_operators_reject_collections() {
        let err = FilterExpression::new(
            FieldId::Namespace,
            Operator::Equals,
            vec!["a".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::FilterShape { expected: "scalar", .. }));
    }

    #[test]
    fn test_display() {
        let expr = FilterExpression::new(FieldId::Namespace, Operator::Prefix, "company").unwrap();
        assert_eq!(expr.to_string(), "namespace PREFIX company");
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(FieldId::FlowId.as_str(), "flowId");
        assert_eq!(
            Operator::GreaterThanOrEqualTo.as_str(),
            "GREATER_THAN_OR_EQUAL_TO"
        );
    }
}
