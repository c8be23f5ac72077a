//! Builds filter predicate lists from optional criteria.
//!
//! Every task and monitor describes what it wants as a [`FilterCriteria`] and
//! lets [`FilterBuilder`] turn it into the ordered `Vec<FilterExpression>` the
//! search endpoints accept. The differences between callers (exact or prefix
//! namespace, `IN` or one `EQUALS` per value, which id and date fields apply)
//! are expressed through [`FilterOptions`].

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::{
    ChildFilter, FieldId, FilterExpression, FlowScope, Label, LogLevel, Operator, StateType,
};

use crate::error::{EngineError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// How the namespace criterion is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamespaceMatch {
    #[default]
    Exact,
    /// The namespace and all of its dot-separated children.
    Prefix,
}

/// How multi-valued criteria are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultiValue {
    /// One `IN` expression holding every value.
    #[default]
    In,
    /// One `EQUALS` expression per value.
    PerValue,
}

/// Fields that receive the start and end of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFields {
    pub start: FieldId,
    pub end: FieldId,
}

impl Default for DateFields {
    fn default() -> Self {
        Self {
            start: FieldId::StartDate,
            end: FieldId::EndDate,
        }
    }
}

/// Per-caller encoding choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub namespace_match: NamespaceMatch,
    pub multi_value: MultiValue,
    /// Field the `id` criterion applies to (`ID` or `ASSET_ID`).
    pub id_field: FieldId,
    pub date_fields: DateFields,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            namespace_match: NamespaceMatch::Exact,
            multi_value: MultiValue::In,
            id_field: FieldId::Id,
            date_fields: DateFields::default(),
        }
    }
}

impl FilterOptions {
    pub fn with_namespace_match(mut self, namespace_match: NamespaceMatch) -> Self {
        self.namespace_match = namespace_match;
        self
    }

    pub fn with_multi_value(mut self, multi_value: MultiValue) -> Self {
        self.multi_value = multi_value;
        self
    }

    pub fn with_id_field(mut self, id_field: FieldId) -> Self {
        self.id_field = id_field;
        self
    }

    pub fn with_date_fields(mut self, start: FieldId, end: FieldId) -> Self {
        self.date_fields = DateFields { start, end };
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Criteria
// ─────────────────────────────────────────────────────────────────────────────

/// Comparison applied by a metadata query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataComparison {
    EqualTo,
    NotEqualTo,
}

impl MetadataComparison {
    fn operator(self) -> Operator {
        match self {
            MetadataComparison::EqualTo => Operator::Equals,
            MetadataComparison::NotEqualTo => Operator::NotEquals,
        }
    }
}

/// One `{key, comparison, value}` condition on asset metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataQuery {
    #[serde(rename = "field")]
    pub key: String,
    #[serde(rename = "type")]
    pub comparison: MetadataComparison,
    pub value: String,
}

impl MetadataQuery {
    pub fn equal_to(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            comparison: MetadataComparison::EqualTo,
            value: value.into(),
        }
    }

    pub fn not_equal_to(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            comparison: MetadataComparison::NotEqualTo,
            value: value.into(),
        }
    }
}

/// Everything a caller may filter on. All fields are optional; blank strings
/// and empty lists are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub namespace: Option<String>,
    /// Additional namespaces, each matched exactly.
    pub namespaces: Vec<String>,
    pub id: Option<String>,
    pub flow_id: Option<String>,
    pub trigger_id: Option<String>,
    pub trigger_execution_id: Option<String>,
    pub types: Vec<String>,
    pub states: Vec<StateType>,
    pub scopes: Vec<FlowScope>,
    pub labels: Vec<Label>,
    pub child_filter: Option<ChildFilter>,
    pub metadata: Vec<MetadataQuery>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Window ending now; exclusive with explicit dates.
    pub time_range: Option<Duration>,
    /// Free-text search.
    pub query: Option<String>,
    pub min_level: Option<LogLevel>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Turns [`FilterCriteria`] into filter expressions.
///
/// Output order is fixed: namespace, namespaces, id, flow id, trigger id,
/// trigger execution id, types, states, scopes, labels, child filter,
/// metadata (`EQUALS` then `NOT_EQUALS`), start date, end date, free-text
/// query, minimum level.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder {
    options: FilterOptions,
}

impl FilterBuilder {
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Build the predicate list. `now` anchors a relative `time_range`.
    pub fn build(
        &self,
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
    ) -> Result<Vec<FilterExpression>> {
        let mut filters = Vec::new();

        if let Some(namespace) = present(&criteria.namespace) {
            let operator = match self.options.namespace_match {
                NamespaceMatch::Exact => Operator::Equals,
                NamespaceMatch::Prefix => Operator::Prefix,
            };
            filters.push(FilterExpression::new(
                FieldId::Namespace,
                operator,
                namespace,
            )?);
        }

        self.push_many(
            &mut filters,
            FieldId::Namespace,
            non_blank(criteria.namespaces.iter().cloned()),
        )?;

        push_equals(&mut filters, self.options.id_field, &criteria.id)?;
        push_equals(&mut filters, FieldId::FlowId, &criteria.flow_id)?;
        push_equals(&mut filters, FieldId::TriggerId, &criteria.trigger_id)?;
        push_equals(
            &mut filters,
            FieldId::TriggerExecutionId,
            &criteria.trigger_execution_id,
        )?;

        self.push_many(
            &mut filters,
            FieldId::Type,
            non_blank(criteria.types.iter().cloned()),
        )?;
        self.push_many(
            &mut filters,
            FieldId::State,
            criteria.states.iter().map(|s| s.as_str().to_string()).collect(),
        )?;
        self.push_many(
            &mut filters,
            FieldId::Scope,
            criteria.scopes.iter().map(|s| s.as_str().to_string()).collect(),
        )?;
        self.push_many(
            &mut filters,
            FieldId::Labels,
            criteria
                .labels
                .iter()
                .map(|l| format!("{}:{}", l.key, l.value))
                .collect(),
        )?;

        if let Some(child_filter) = criteria.child_filter {
            filters.push(FilterExpression::equals(
                FieldId::ChildFilter,
                child_filter.as_str(),
            )?);
        }

        filters.extend(metadata_filters(&criteria.metadata)?);

        let (start, end) = date_range(criteria, now)?;
        if let Some(start) = start {
            filters.push(FilterExpression::new(
                self.options.date_fields.start,
                Operator::GreaterThanOrEqualTo,
                start,
            )?);
        }
        if let Some(end) = end {
            filters.push(FilterExpression::new(
                self.options.date_fields.end,
                Operator::LessThanOrEqualTo,
                end,
            )?);
        }

        push_equals(&mut filters, FieldId::Query, &criteria.query)?;

        if let Some(level) = criteria.min_level {
            filters.push(FilterExpression::equals(FieldId::MinLevel, level.as_str())?);
        }

        tracing::debug!(count = filters.len(), "built filters");
        Ok(filters)
    }

    fn push_many(
        &self,
        filters: &mut Vec<FilterExpression>,
        field: FieldId,
        values: Vec<String>,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        match self.options.multi_value {
            MultiValue::In => filters.push(FilterExpression::new(field, Operator::In, values)?),
            MultiValue::PerValue => {
                for value in values {
                    filters.push(FilterExpression::equals(field, value)?);
                }
            }
        }
        Ok(())
    }
}

/// Whether `namespace` equals `scope` or is one of its dot-separated children.
///
/// `company.team` is in scope `company`; `companyx` is not.
pub fn namespace_in_scope(namespace: &str, scope: &str) -> bool {
    match namespace.strip_prefix(scope) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// The value if it is set and not blank; blank criteria are never sent.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn non_blank(values: impl Iterator<Item = String>) -> Vec<String> {
    values.filter(|v| !v.trim().is_empty()).collect()
}

fn push_equals(
    filters: &mut Vec<FilterExpression>,
    field: FieldId,
    value: &Option<String>,
) -> Result<()> {
    if let Some(value) = present(value) {
        filters.push(FilterExpression::equals(field, value)?);
    }
    Ok(())
}

/// Group metadata queries into one map-valued expression per comparison.
fn metadata_filters(queries: &[MetadataQuery]) -> Result<Vec<FilterExpression>> {
    let mut filters = Vec::new();

    for comparison in [MetadataComparison::EqualTo, MetadataComparison::NotEqualTo] {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for query in queries.iter().filter(|q| q.comparison == comparison) {
            if query.key.trim().is_empty() {
                return Err(EngineError::EmptyRequiredValue(
                    "metadata query key".to_string(),
                ));
            }
            match map.get(&query.key) {
                Some(existing) if existing != &query.value => {
                    return Err(EngineError::InvalidFilterCombination(format!(
                        "metadata key '{}' is compared with both '{}' and '{}'",
                        query.key, existing, query.value
                    )));
                }
                Some(_) => {}
                None => {
                    map.insert(query.key.clone(), query.value.clone());
                }
            }
        }
        if !map.is_empty() {
            filters.push(FilterExpression::new(
                FieldId::Metadata,
                comparison.operator(),
                map,
            )?);
        }
    }

    Ok(filters)
}

/// Resolve explicit dates and a relative time range into a start/end pair.
fn date_range(
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let Some(range) = criteria.time_range else {
        return Ok((criteria.start_date, criteria.end_date));
    };

    if criteria.start_date.is_some() || criteria.end_date.is_some() {
        return Err(EngineError::InvalidFilterCombination(
            "time_range cannot be combined with start_date or end_date".to_string(),
        ));
    }

    let start = TimeDelta::from_std(range)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| {
            EngineError::InvalidFilterCombination(format!(
                "time_range of {}s reaches before the earliest representable date",
                range.as_secs()
            ))
        })?;

    Ok((Some(start), Some(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_types::FilterValue;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_criteria_build_nothing() {
        let filters = FilterBuilder::default()
            .build(&FilterCriteria::new(), now())
            .unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let criteria = FilterCriteria {
            namespace: Some("  ".to_string()),
            flow_id: Some(String::new()),
            types: vec![String::new()],
            ..Default::default()
        };
        let filters = FilterBuilder::default().build(&criteria, now()).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_namespace_match_modes() {
        let criteria = FilterCriteria {
            namespace: Some("company".to_string()),
            ..Default::default()
        };

        let exact = FilterBuilder::default().build(&criteria, now()).unwrap();
        assert_eq!(exact[0].operator(), Operator::Equals);

        let prefix = FilterBuilder::new(
            FilterOptions::default().with_namespace_match(NamespaceMatch::Prefix),
        )
        .build(&criteria, now())
        .unwrap();
        assert_eq!(prefix[0].operator(), Operator::Prefix);
    }

    #[test]
    fn test_multi_value_modes() {
        let criteria = FilterCriteria {
            states: vec![StateType::Failed, StateType::Killed],
            ..Default::default()
        };

        let grouped = FilterBuilder::default().build(&criteria, now()).unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].operator(), Operator::In);
        assert_eq!(
            grouped[0].value(),
            &FilterValue::List(vec!["FAILED".to_string(), "KILLED".to_string()])
        );

        let split = FilterBuilder::new(
            FilterOptions::default().with_multi_value(MultiValue::PerValue),
        )
        .build(&criteria, now())
        .unwrap();
        assert_eq!(split.len(), 2);
        assert!(split.iter().all(|f| f.operator() == Operator::Equals));
    }

    #[test]
    fn test_labels_encoded_as_key_value() {
        let criteria = FilterCriteria {
            labels: vec![Label {
                key: "team".to_string(),
                value: "data".to_string(),
            }],
            ..Default::default()
        };
        let filters = FilterBuilder::new(
            FilterOptions::default().with_multi_value(MultiValue::PerValue),
        )
        .build(&criteria, now())
        .unwrap();
        assert_eq!(filters[0].field(), FieldId::Labels);
        assert_eq!(filters[0].value(), &FilterValue::Text("team:data".to_string()));
    }

    #[test]
    fn test_id_field_option() {
        let criteria = FilterCriteria {
            id: Some("orders".to_string()),
            ..Default::default()
        };
        let filters = FilterBuilder::new(FilterOptions::default().with_id_field(FieldId::AssetId))
            .build(&criteria, now())
            .unwrap();
        assert_eq!(filters[0].field(), FieldId::AssetId);
    }

    #[test]
    fn test_metadata_grouped_by_comparison() {
        let criteria = FilterCriteria {
            metadata: vec![
                MetadataQuery::not_equal_to("tier", "bronze"),
                MetadataQuery::equal_to("owner", "data"),
                MetadataQuery::equal_to("region", "eu"),
            ],
            ..Default::default()
        };
        let filters = FilterBuilder::default().build(&criteria, now()).unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].operator(), Operator::Equals);
        match filters[0].value() {
            FilterValue::Map(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map["owner"], "data");
            }
            other => panic!("expected map, got {other:?}"),
        }
        assert_eq!(filters[1].operator(), Operator::NotEquals);
    }

    #[test]
    fn test_metadata_conflicting_key_rejected() {
        let criteria = FilterCriteria {
            metadata: vec![
                MetadataQuery::equal_to("owner", "data"),
                MetadataQuery::equal_to("owner", "platform"),
            ],
            ..Default::default()
        };
        let err = FilterBuilder::default().build(&criteria, now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilterCombination(_)));
    }

    #[test]
    fn test_metadata_repeated_identical_key_accepted() {
        let criteria = FilterCriteria {
            metadata: vec![
                MetadataQuery::equal_to("owner", "data"),
                MetadataQuery::equal_to("owner", "data"),
                MetadataQuery::not_equal_to("owner", "platform"),
            ],
            ..Default::default()
        };
        let filters = FilterBuilder::default().build(&criteria, now()).unwrap();
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_time_range_resolves_against_now() {
        let criteria = FilterCriteria {
            time_range: Some(Duration::from_secs(3600)),
            ..Default::default()
        };
        let filters = FilterBuilder::default().build(&criteria, now()).unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].field(), FieldId::StartDate);
        assert_eq!(filters[0].operator(), Operator::GreaterThanOrEqualTo);
        assert_eq!(
            filters[0].value(),
            &FilterValue::Instant(now() - TimeDelta::hours(1))
        );
        assert_eq!(filters[1].field(), FieldId::EndDate);
        assert_eq!(filters[1].operator(), Operator::LessThanOrEqualTo);
        assert_eq!(filters[1].value(), &FilterValue::Instant(now()));
    }

    #[test]
    fn test_time_range_with_explicit_date_rejected() {
        for criteria in [
            FilterCriteria {
                time_range: Some(Duration::from_secs(60)),
                start_date: Some(now()),
                ..Default::default()
            },
            FilterCriteria {
                time_range: Some(Duration::from_secs(60)),
                end_date: Some(now()),
                ..Default::default()
            },
        ] {
            let err = FilterBuilder::default().build(&criteria, now()).unwrap_err();
            assert!(matches!(err, EngineError::InvalidFilterCombination(_)));
        }
    }

    #[test]
    fn test_date_fields_option() {
        let criteria = FilterCriteria {
            end_date: Some(now()),
            ..Default::default()
        };
        let filters = FilterBuilder::new(
            FilterOptions::default().with_date_fields(FieldId::Updated, FieldId::Updated),
        )
        .build(&criteria, now())
        .unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].field(), FieldId::Updated);
        assert_eq!(filters[0].operator(), Operator::LessThanOrEqualTo);
    }

    #[test]
    fn test_output_order_is_stable() {
        let criteria = FilterCriteria {
            query: Some("timeout".to_string()),
            min_level: Some(LogLevel::Warn),
            flow_id: Some("etl".to_string()),
            namespace: Some("company".to_string()),
            trigger_id: Some("daily".to_string()),
            ..Default::default()
        };
        let builder = FilterBuilder::default();
        let fields: Vec<FieldId> = builder
            .build(&criteria, now())
            .unwrap()
            .iter()
            .map(|f| f.field())
            .collect();
        assert_eq!(
            fields,
            vec![
                FieldId::Namespace,
                FieldId::FlowId,
                FieldId::TriggerId,
                FieldId::Query,
                FieldId::MinLevel
            ]
        );
        assert_eq!(
            builder.build(&criteria, now()).unwrap(),
            builder.build(&criteria, now()).unwrap()
        );
    }

    #[test]
    fn test_namespace_in_scope() {
        assert!(namespace_in_scope("company", "company"));
        assert!(namespace_in_scope("company.team", "company"));
        assert!(namespace_in_scope("company.team.etl", "company.team"));
        assert!(!namespace_in_scope("companyx", "company"));
        assert!(!namespace_in_scope("other.company", "company"));
    }
}
