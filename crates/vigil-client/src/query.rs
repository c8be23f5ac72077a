//! Query-string encoding for search requests.
//!
//! Filters travel as `filters[<field>][<OPERATOR>]=<value>` pairs. List
//! values repeat the pair once per element and metadata maps add the key as
//! a third bracket: `filters[metadata][EQUALS][owner]=data-team`.

use vigil_types::{FilterExpression, FilterValue, format_instant};

/// Ordered query pairs for one request.
pub type QueryPairs = Vec<(String, String)>;

/// Encode a filter list into query pairs, preserving expression order.
pub fn encode_filters(filters: &[FilterExpression]) -> QueryPairs {
    let mut pairs = Vec::new();

    for filter in filters {
        let prefix = format!(
            "filters[{}][{}]",
            filter.field().as_str(),
            filter.operator().as_str()
        );
        match filter.value() {
            FilterValue::Text(value) => pairs.push((prefix, value.clone())),
            FilterValue::Instant(value) => pairs.push((prefix, format_instant(value))),
            FilterValue::List(values) => {
                for value in values {
                    pairs.push((prefix.clone(), value.clone()));
                }
            }
            FilterValue::Map(map) => {
                for (key, value) in map {
                    pairs.push((format!("{prefix}[{key}]"), value.clone()));
                }
            }
        }
    }

    pairs
}

/// Paging and sorting parameters prepended to every search.
pub fn page_pairs(page: u32, size: u32, sort: Option<&str>) -> QueryPairs {
    let mut pairs = vec![
        ("page".to_string(), page.to_string()),
        ("size".to_string(), size.to_string()),
    ];
    if let Some(sort) = sort {
        pairs.push(("sort".to_string(), sort.to_string()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use vigil_types::{FieldId, Operator};

    use super::*;

    #[test]
    fn test_encode_scalar() {
        let filters = vec![FilterExpression::equals(FieldId::Namespace, "company.team").unwrap()];
        assert_eq!(
            encode_filters(&filters),
            vec![(
                "filters[namespace][EQUALS]".to_string(),
                "company.team".to_string()
            )]
        );
    }

    #[test]
    fn test_encode_list_repeats_key() {
        let filters = vec![
            FilterExpression::new(
                FieldId::State,
                Operator::In,
                vec!["FAILED".to_string(), "KILLED".to_string()],
            )
            .unwrap(),
        ];
        let pairs = encode_filters(&filters);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(k, _)| k == "filters[state][IN]"));
        assert_eq!(pairs[1].1, "KILLED");
    }

    #[test]
    fn test_encode_metadata_map() {
        let mut map = BTreeMap::new();
        map.insert("owner".to_string(), "data".to_string());
        map.insert("tier".to_string(), "gold".to_string());
        let filters = vec![FilterExpression::new(FieldId::Metadata, Operator::NotEquals, map).unwrap()];
        let pairs = encode_filters(&filters);
        assert_eq!(pairs[0].0, "filters[metadata][NOT_EQUALS][owner]");
        assert_eq!(pairs[1].0, "filters[metadata][NOT_EQUALS][tier]");
    }

    #[test]
    fn test_encode_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let filters =
            vec![FilterExpression::new(FieldId::Updated, Operator::LessThanOrEqualTo, at).unwrap()];
        assert_eq!(encode_filters(&filters)[0].1, "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_page_pairs() {
        let pairs = page_pairs(2, 50, Some("date:desc"));
        assert_eq!(pairs[0], ("page".to_string(), "2".to_string()));
        assert_eq!(pairs[2], ("sort".to_string(), "date:desc".to_string()));
    }
}
