//! Filtering, sorting, field limiting and pagination over JSON documents.
//!
//! Parameters arrive as ordered `(key, value)` pairs. Keys of the form
//! `field[op]` compare with `gte`, `gt`, `lte` or `lt`; a plain key that repeats
//! matches any of its values.

use std::cmp::Ordering;

use serde_json::{Map, Value as JsonValue};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 100;
const DEFAULT_SORT: &str = "-createdAt";
const RESERVED: &[&str] = &["page", "sort", "limit", "fields"];

/// Ordered query-string pairs; keys may repeat.
pub type QueryParams = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    field: String,
    op: Op,
    /// More than one value only for `Eq`, meaning "any of".
    values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct SortKey {
    field: String,
    descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Projection {
    Default,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiFeatures {
    filters: Vec<Filter>,
    sort: Vec<SortKey>,
    projection: Projection,
    page: usize,
    limit: usize,
    /// Left out of the output unless an inclusion projection names them.
    hidden: Vec<String>,
}

impl Default for ApiFeatures {
    fn default() -> Self {
        Self::from_params(&[])
    }
}

fn parse_key(key: &str) -> (String, Op) {
    if let Some((field, rest)) = key.split_once('[') {
        let op = match rest.strip_suffix(']') {
            Some("gte") => Some(Op::Gte),
            Some("gt") => Some(Op::Gt),
            Some("lte") => Some(Op::Lte),
            Some("lt") => Some(Op::Lt),
            _ => None,
        };
        if let Some(op) = op {
            return (field.to_string(), op);
        }
    }
    (key.to_string(), Op::Eq)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn last_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl ApiFeatures {
    pub fn from_params(params: &[(String, String)]) -> Self {
        let mut filters: Vec<Filter> = Vec::new();
        for (key, value) in params {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            let (field, op) = parse_key(key);
            match filters
                .iter_mut()
                .find(|f| op == Op::Eq && f.op == Op::Eq && f.field == field)
            {
                Some(existing) => existing.values.push(value.clone()),
                None => filters.push(Filter {
                    field,
                    op,
                    values: vec![value.clone()],
                }),
            }
        }

        let sort = split_list(last_value(params, "sort").unwrap_or(DEFAULT_SORT))
            .map(|key| match key.strip_prefix('-') {
                Some(field) => SortKey {
                    field: field.to_string(),
                    descending: true,
                },
                None => SortKey {
                    field: key.to_string(),
                    descending: false,
                },
            })
            .collect();

        let projection = match last_value(params, "fields") {
            None => Projection::Default,
            Some(raw) => {
                let names: Vec<&str> = split_list(raw).collect();
                if names.is_empty() {
                    Projection::Default
                } else if names.iter().all(|n| n.starts_with('-')) {
                    Projection::Exclude(names.iter().map(|n| n[1..].to_string()).collect())
                } else {
                    Projection::Include(
                        names
                            .iter()
                            .filter(|n| !n.starts_with('-'))
                            .map(|n| n.to_string())
                            .collect(),
                    )
                }
            }
        };

        let positive = |key: &str, default: usize| {
            last_value(params, key)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };

        Self {
            filters,
            sort,
            projection,
            page: positive("page", DEFAULT_PAGE),
            limit: positive("limit", DEFAULT_LIMIT),
            hidden: Vec::new(),
        }
    }

    pub fn hide(mut self, fields: &[&str]) -> Self {
        self.hidden.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Filter, sort, paginate, then project.
    pub fn apply(&self, docs: Vec<JsonValue>) -> Vec<JsonValue> {
        let mut docs: Vec<JsonValue> = docs.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| self.compare(a, b));
        docs.into_iter()
            .skip((self.page - 1).saturating_mul(self.limit))
            .take(self.limit)
            .map(|d| self.project(d))
            .collect()
    }

    fn matches(&self, doc: &JsonValue) -> bool {
        self.filters.iter().all(|filter| match doc.get(&filter.field) {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Array(items)) => items
                .iter()
                .any(|item| filter.values.iter().any(|v| compare_op(item, filter.op, v))),
            Some(value) => filter.values.iter().any(|v| compare_op(value, filter.op, v)),
        })
    }

    fn compare(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        for key in &self.sort {
            let ord = compare_values(a.get(&key.field), b.get(&key.field));
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn project(&self, doc: JsonValue) -> JsonValue {
        let JsonValue::Object(map) = doc else {
            return doc;
        };
        let projected: Map<String, JsonValue> = match &self.projection {
            Projection::Default => map.into_iter().filter(|(k, _)| !self.hidden.contains(k)).collect(),
            Projection::Exclude(names) => map
                .into_iter()
                .filter(|(k, _)| !self.hidden.contains(k) && !names.contains(k))
                .collect(),
            Projection::Include(names) => map
                .into_iter()
                .filter(|(k, _)| k == "id" || names.contains(k))
                .collect(),
        };
        JsonValue::Object(projected)
    }
}

/// Compare a stored value against a raw query value.
fn compare_op(value: &JsonValue, op: Op, raw: &str) -> bool {
    let ord = match value {
        JsonValue::Number(n) => match (n.as_f64(), raw.parse::<f64>()) {
            (Some(a), Ok(b)) => a.partial_cmp(&b),
            _ => None,
        },
        JsonValue::String(s) => Some(s.as_str().cmp(raw)),
        JsonValue::Bool(b) => match raw {
            "true" => Some(b.cmp(&true)),
            "false" => Some(b.cmp(&false)),
            _ => None,
        },
        _ => None,
    };
    let Some(ord) = ord else {
        return false;
    };
    match op {
        Op::Eq => ord == Ordering::Equal,
        Op::Gte => ord != Ordering::Less,
        Op::Gt => ord == Ordering::Greater,
        Op::Lte => ord != Ordering::Greater,
        Op::Lt => ord == Ordering::Less,
    }
}

/// Missing and null sort first; numbers before strings before everything else.
fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    fn rank(v: Option<&JsonValue>) -> u8 {
        match v {
            None | Some(JsonValue::Null) => 0,
            Some(JsonValue::Number(_)) => 1,
            Some(JsonValue::String(_)) => 2,
            Some(JsonValue::Bool(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn tours() -> Vec<JsonValue> {
        vec![
            json!({"id": "1", "name": "Forest Hiker", "price": 397, "duration": 5, "difficulty": "easy", "createdAt": "2021-01-01T00:00:00Z"}),
            json!({"id": "2", "name": "Sea Explorer", "price": 497, "duration": 7, "difficulty": "medium", "createdAt": "2021-01-03T00:00:00Z"}),
            json!({"id": "3", "name": "Snow Adventurer", "price": 997, "duration": 4, "difficulty": "difficult", "createdAt": "2021-01-02T00:00:00Z"}),
            json!({"id": "4", "name": "City Wanderer", "price": 1197, "duration": 9, "difficulty": "easy", "createdAt": "2021-01-04T00:00:00Z"}),
        ]
    }

    fn names(docs: &[JsonValue]) -> Vec<&str> {
        docs.iter().map(|d| d["name"].as_str().unwrap()).collect()
    }

    #[test]
    fn defaults_sort_newest_first() {
        let out = ApiFeatures::default().apply(tours());
        assert_eq!(names(&out), vec!["City Wanderer", "Sea Explorer", "Snow Adventurer", "Forest Hiker"]);
        assert!(out.iter().all(|d| d.get("createdAt").is_some()));
    }

    #[test]
    fn hidden_fields_are_dropped_by_default() {
        let out = ApiFeatures::default().hide(&["createdAt"]).apply(tours());
        assert_eq!(names(&out), vec!["City Wanderer", "Sea Explorer", "Snow Adventurer", "Forest Hiker"]);
        assert!(out.iter().all(|d| d.get("createdAt").is_none()));
    }

    #[test]
    fn range_filters_compare_numerically() {
        let f = ApiFeatures::from_params(&params(&[("duration[gte]", "5"), ("price[lt]", "1000")]));
        let mut out = names(&f.apply(tours())).into_iter().map(String::from).collect::<Vec<_>>();
        out.sort();
        assert_eq!(out, vec!["Forest Hiker", "Sea Explorer"]);
    }

    #[test]
    fn repeated_keys_match_any_value() {
        let f = ApiFeatures::from_params(&params(&[("duration", "5"), ("duration", "9"), ("sort", "price")]));
        assert_eq!(names(&f.apply(tours())), vec!["Forest Hiker", "City Wanderer"]);
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let f = ApiFeatures::from_params(&params(&[("page", "1"), ("limit", "10"), ("fields", "name"), ("sort", "name")]));
        assert_eq!(f.apply(tours()).len(), 4);
    }

    #[test]
    fn multi_key_sort() {
        let f = ApiFeatures::from_params(&params(&[("sort", "difficulty,-price")]));
        assert_eq!(
            names(&f.apply(tours())),
            vec!["Snow Adventurer", "City Wanderer", "Forest Hiker", "Sea Explorer"]
        );
    }

    #[test]
    fn include_projection_keeps_id_and_can_reveal_created_at() {
        let f = ApiFeatures::from_params(&params(&[("fields", "name,createdAt")])).hide(&["createdAt"]);
        let out = f.apply(tours());
        let keys: Vec<&String> = out[0].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(out[0].get("createdAt").is_some());
        assert!(out[0].get("id").is_some());
    }

    #[test]
    fn exclude_projection_still_hides_created_at() {
        let f = ApiFeatures::from_params(&params(&[("fields", "-price")])).hide(&["createdAt"]);
        let out = f.apply(tours());
        assert!(out[0].get("price").is_none());
        assert!(out[0].get("createdAt").is_none());
        assert!(out[0].get("name").is_some());
    }

    #[test]
    fn pagination() {
        let f = ApiFeatures::from_params(&params(&[("sort", "price"), ("page", "2"), ("limit", "3")]));
        assert_eq!(names(&f.apply(tours())), vec!["City Wanderer"]);

        let f = ApiFeatures::from_params(&params(&[("page", "0"), ("limit", "abc")]));
        assert_eq!(f.page(), DEFAULT_PAGE);
        assert_eq!(f.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn array_fields_match_any_element() {
        let docs = vec![json!({"name": "a", "tags": ["x", "y"]}), json!({"name": "b", "tags": ["z"]})];
        let f = ApiFeatures::from_params(&params(&[("tags", "y")]));
        assert_eq!(names(&f.apply(docs)), vec!["a"]);
    }

    #[test]
    fn unknown_operator_is_a_plain_field() {
        let f = ApiFeatures::from_params(&params(&[("price[ne]", "397")]));
        assert!(f.apply(tours()).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn a_page_never_exceeds_the_limit(page in 1usize..5, limit in 1usize..6, prices in proptest::collection::vec(0u32..2000, 0..20)) {
            let docs: Vec<JsonValue> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| json!({"id": i.to_string(), "name": format!("t{i}"), "price": p}))
                .collect();
            let f = ApiFeatures::from_params(&params(&[
                ("page", page.to_string().as_str()),
                ("limit", limit.to_string().as_str()),
                ("sort", "price"),
            ]));
            let out = f.apply(docs.clone());
            proptest::prop_assert!(out.len() <= limit);
            let expected = docs.len().saturating_sub((page - 1) * limit).min(limit);
            proptest::prop_assert_eq!(out.len(), expected);
            proptest::prop_assert!(out.windows(2).all(|w| w[0]["price"].as_u64() <= w[1]["price"].as_u64()));
        }
    }
}
