//! Search, sort and paging of collection entries for list views.
//!
//! A [`Grid`] turns [`GridRecord`]s (one per entry, holding raw values and
//! their display descriptions) into one page of rows. Steps run in a fixed
//! order: extra predicate, free-text phrase, column filters, sort, page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub use crate::ordering::SortMode;

use crate::constants::UUID_ATTR;

/// Values of one collection entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridRecord {
    uuid: String,
    values: BTreeMap<String, String>,
    descriptions: BTreeMap<String, String>,
}

impl GridRecord {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) {
        let field = field.into();
        self.descriptions.insert(field.clone(), description.into());
        self.values.insert(field, value.into());
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Stored value; empty for unknown fields.
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Display form of the value; empty for unknown fields.
    pub fn description(&self, field: &str) -> &str {
        self.descriptions
            .get(field)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any case sorts descending; everything else ascending.
    fn from_param(value: &Value) -> Self {
        match value.as_str() {
            Some(direction) if direction.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Per-column criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnFilter {
    /// Case-insensitive substring of the description.
    Contains(String),
    /// Stored value equals this exactly.
    Exact { exact: String },
}

impl ColumnFilter {
    fn matches(&self, record: &GridRecord, field: &str) -> bool {
        match self {
            ColumnFilter::Contains(needle) => record
                .description(field)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            ColumnFilter::Exact { exact } => record.value(field) == exact,
        }
    }
}

/// Integer form of a request parameter; `None` when it has none.
fn lenient_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Paging and filter parameters of a search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// 1-based page number; missing or below 1 means the first page.
    pub current: Option<i64>,
    /// Rows per page; missing uses the grid default, below 1 means all rows.
    pub row_count: Option<i64>,
    pub sort: BTreeMap<String, SortDirection>,
    pub search_phrase: String,
    pub filters: BTreeMap<String, ColumnFilter>,
}

impl SearchParams {
    /// Reads parameters from a request parameter map.
    ///
    /// Malformed values count as absent: a page or row count without an
    /// integer reading, a sort that is not an object, filters of an unknown
    /// shape.
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let param = |key: &str| params.get(key).filter(|v| !v.is_null());
        let integer = |key: &str| {
            let value = param(key)?;
            let parsed = lenient_integer(value);
            if parsed.is_none() {
                debug!(param = key, value = %value, "Ignoring non-numeric search parameter");
            }
            parsed
        };

        let sort = match param("sort") {
            Some(Value::Object(sort)) => sort
                .iter()
                .map(|(field, direction)| (field.clone(), SortDirection::from_param(direction)))
                .collect(),
            _ => BTreeMap::new(),
        };
        let filters = match param("filters") {
            Some(Value::Object(filters)) => filters
                .iter()
                .filter_map(|(field, filter)| {
                    let filter = match filter {
                        Value::Object(_) => serde_json::from_value(filter.clone()).ok(),
                        other => lenient_text(other).map(ColumnFilter::Contains),
                    };
                    filter.map(|filter| (field.clone(), filter))
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        Self {
            current: integer("current"),
            row_count: integer("rowCount"),
            sort,
            search_phrase: param("searchPhrase").and_then(lenient_text).unwrap_or_default(),
            filters,
        }
    }

    pub fn page(&self) -> usize {
        usize::try_from(self.current.unwrap_or(1)).unwrap_or(0).max(1)
    }
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub rows: Vec<Map<String, Value>>,
    /// Rows on this page.
    pub row_count: usize,
    /// Entries in the collection before filtering.
    pub total: usize,
    /// Entries left after filtering.
    pub filtered: usize,
    pub current: usize,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchResponse {
    /// The empty result returned for requests that cannot be served.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            row_count: 0,
            total: 0,
            filtered: 0,
            current: 1,
            status: "failed".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

type Predicate<'a> = Box<dyn Fn(&GridRecord) -> bool + 'a>;

/// Search configuration for one collection.
pub struct Grid<'a> {
    fields: Vec<String>,
    default_sort: Option<String>,
    predicate: Option<Predicate<'a>>,
    sort_mode: SortMode,
    default_row_count: i64,
}

impl<'a> Grid<'a> {
    /// A grid exposing `fields`; all rows per page unless configured otherwise.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            default_sort: None,
            predicate: None,
            sort_mode: SortMode::default(),
            default_row_count: -1,
        }
    }

    pub fn default_sort(mut self, field: impl Into<String>) -> Self {
        self.default_sort = Some(field.into());
        self
    }

    /// Applied before any request filter.
    pub fn filter(mut self, predicate: impl Fn(&GridRecord) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    pub fn default_row_count(mut self, rows: i64) -> Self {
        self.default_row_count = rows;
        self
    }

    fn exposes(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn matches_phrase(&self, record: &GridRecord, phrase: &str) -> bool {
        phrase.split_whitespace().all(|term| {
            let term = term.to_lowercase();
            self.fields
                .iter()
                .any(|field| record.description(field).to_lowercase().contains(&term))
        })
    }

    /// Produces the requested page of `records`.
    pub fn fetch(&self, records: Vec<GridRecord>, params: &SearchParams) -> SearchResponse {
        let total = records.len();

        let mut matching: Vec<GridRecord> = records
            .into_iter()
            .filter(|r| self.predicate.as_ref().is_none_or(|keep| keep(r)))
            .filter(|r| self.matches_phrase(r, &params.search_phrase))
            .filter(|r| {
                params
                    .filters
                    .iter()
                    .filter(|(field, _)| self.exposes(field))
                    .all(|(field, filter)| filter.matches(r, field))
            })
            .collect();

        let requested = params
            .sort
            .iter()
            .find(|(field, _)| self.exposes(field))
            .map(|(field, direction)| (field.as_str(), *direction));
        let sort_key = requested.or_else(|| {
            self.default_sort
                .as_deref()
                .map(|field| (field, SortDirection::Asc))
        });
        if let Some((field, direction)) = sort_key {
            matching.sort_by(|a, b| {
                let ordering = self
                    .sort_mode
                    .compare(a.description(field), b.description(field));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let filtered = matching.len();
        let page = params.page();
        let per_page = params.row_count.unwrap_or(self.default_row_count);
        let rows: Vec<Map<String, Value>> = match usize::try_from(per_page) {
            Ok(per_page) if per_page > 0 => matching
                .iter()
                .skip((page - 1).saturating_mul(per_page))
                .take(per_page)
                .map(|r| self.row(r))
                .collect(),
            _ => matching.iter().map(|r| self.row(r)).collect(),
        };

        SearchResponse {
            row_count: rows.len(),
            rows,
            total,
            filtered,
            current: page,
            status: "ok".to_string(),
            message: None,
        }
    }

    fn row(&self, record: &GridRecord) -> Map<String, Value> {
        let mut row: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                (
                    field.clone(),
                    Value::String(record.description(field).to_string()),
                )
            })
            .collect();
        row.insert(UUID_ATTR.to_string(), Value::String(record.uuid().to_string()));
        row
    }
}
