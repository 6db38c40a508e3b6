//! List-query composition: search, categorical filters, ordering and pagination.
//!
//! The output is a store-agnostic [`ListPlan`]; adapters render or evaluate it.

use crate::config::{FieldKind, ResolvedResource, CREATED_AT_FIELD, ID_FIELD};
use crate::service::validation::{coerce_bool, coerce_integer};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const SEARCH_PARAM: &str = "search";

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    All,
    /// Matches no record.
    Nothing,
    Eq { field: String, value: Value },
    /// Case-insensitive substring match on a text field.
    Contains { field: String, needle: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Predicate::Eq {
            field: field.into(),
            value,
        }
    }

    pub fn id(id: i64) -> Self {
        Predicate::eq(ID_FIELD, Value::Number(id.into()))
    }

    /// AND of the parts, collapsing the empty and single-part cases.
    pub fn all_of(mut parts: Vec<Predicate>) -> Self {
        match parts.len() {
            0 => Predicate::All,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListPlan {
    pub predicate: Predicate,
    pub order: Vec<OrderBy>,
    pub page: Page,
}

/// Build the list plan for a resource from raw query parameters.
pub fn build_list_plan(resource: &ResolvedResource, params: &HashMap<String, String>) -> ListPlan {
    let limit = parse_count(params.get("limit"), DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = parse_count(params.get("offset"), 0);

    let mut parts = Vec::new();
    if let Some(term) = params.get(SEARCH_PARAM).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !resource.search.is_empty() {
            parts.push(Predicate::Or(
                resource
                    .search
                    .iter()
                    .map(|field| Predicate::Contains {
                        field: field.clone(),
                        needle: term.to_string(),
                    })
                    .collect(),
            ));
        }
    }
    for name in &resource.filters {
        let Some(raw) = params.get(name).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let Some(rule) = resource.field(name) else { continue };
        parts.push(match filter_value(&rule.kind, raw) {
            Some(value) => Predicate::eq(name.clone(), value),
            None => Predicate::Nothing,
        });
    }

    ListPlan {
        predicate: Predicate::all_of(parts),
        order: default_order(resource),
        page: Page { limit, offset },
    }
}

/// Display order ascending when the resource has one, newest first otherwise. Id breaks ties.
pub fn default_order(resource: &ResolvedResource) -> Vec<OrderBy> {
    match &resource.display_order {
        Some(field) => vec![
            OrderBy {
                field: field.clone(),
                direction: Direction::Asc,
            },
            OrderBy {
                field: ID_FIELD.into(),
                direction: Direction::Asc,
            },
        ],
        None => vec![
            OrderBy {
                field: CREATED_AT_FIELD.into(),
                direction: Direction::Desc,
            },
            OrderBy {
                field: ID_FIELD.into(),
                direction: Direction::Desc,
            },
        ],
    }
}

/// Negative values clamp to 0; missing or non-numeric values use the default.
fn parse_count(raw: Option<&String>, default: u32) -> u32 {
    match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(n)) => n.clamp(0, u32::MAX as i64) as u32,
        _ => default,
    }
}

fn filter_value(kind: &FieldKind, raw: &str) -> Option<Value> {
    let as_json = Value::String(raw.to_string());
    if kind.is_integer() {
        coerce_integer(&as_json).map(|n| Value::Number(n.into()))
    } else if *kind == FieldKind::Boolean {
        coerce_bool(&as_json).map(Value::Bool)
    } else {
        Some(as_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve, ResolvedModel};
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&builtin_config().unwrap()).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_and_recency_order() {
        let m = model();
        let plan = build_list_plan(m.resource("blog-posts").unwrap(), &HashMap::new());
        assert_eq!(plan.page, Page { limit: 10, offset: 0 });
        assert_eq!(plan.predicate, Predicate::All);
        assert_eq!(plan.order[0].field, "createdAt");
        assert_eq!(plan.order[0].direction, Direction::Desc);
    }

    #[test]
    fn limit_is_clamped() {
        let m = model();
        let r = m.resource("blog-posts").unwrap();
        assert_eq!(build_list_plan(r, &params(&[("limit", "1000")])).page.limit, 100);
        assert_eq!(build_list_plan(r, &params(&[("limit", "-5")])).page.limit, 0);
        assert_eq!(build_list_plan(r, &params(&[("limit", "abc")])).page.limit, 10);
        assert_eq!(build_list_plan(r, &params(&[("offset", "-1")])).page.offset, 0);
        assert_eq!(build_list_plan(r, &params(&[("offset", "NaN")])).page.offset, 0);
        assert_eq!(build_list_plan(r, &params(&[("offset", "20")])).page.offset, 20);
    }

    #[test]
    fn search_or_group_ands_with_filters() {
        let m = model();
        let r = m.resource("testimonials").unwrap();
        let plan = build_list_plan(r, &params(&[("search", " market "), ("rating", "5"), ("featured", "true")]));
        let Predicate::And(parts) = plan.predicate else { panic!("expected AND") };
        assert_eq!(parts.len(), 3);
        let Predicate::Or(search) = &parts[0] else { panic!("expected OR") };
        assert_eq!(search.len(), 3);
        assert_eq!(
            search[2],
            Predicate::Contains {
                field: "quote".into(),
                needle: "market".into()
            }
        );
        assert_eq!(parts[1], Predicate::eq("rating", json!(5)));
        assert_eq!(parts[2], Predicate::eq("featured", json!(true)));
    }

    #[test]
    fn unrecognized_params_are_ignored() {
        let m = model();
        let r = m.resource("blog-posts").unwrap();
        let plan = build_list_plan(r, &params(&[("title", "x"), ("search", "  ")]));
        assert_eq!(plan.predicate, Predicate::All);
    }

    #[test]
    fn uncoercible_filter_matches_nothing() {
        let m = model();
        let r = m.resource("client-projects").unwrap();
        let plan = build_list_plan(r, &params(&[("clientId", "abc")]));
        assert_eq!(plan.predicate, Predicate::Nothing);
    }

    #[test]
    fn display_order_resources_sort_ascending() {
        let m = model();
        let plan = build_list_plan(m.resource("team-members").unwrap(), &HashMap::new());
        assert_eq!(plan.order[0].field, "displayOrder");
        assert_eq!(plan.order[0].direction, Direction::Asc);
    }
}
