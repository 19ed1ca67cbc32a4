use serde::Deserialize;
use serde_json::{Map, Value};

// ═══════════════════════════════════════════════════════════════
//  Typed views of a Solr response body
// ═══════════════════════════════════════════════════════════════

pub type Document = Map<String, Value>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SolrBody {
    response: Option<DocList>,
    grouped: Option<Map<String, Value>>,
    #[serde(rename = "responseHeader")]
    response_header: Option<ResponseHeader>,
    facets: Option<Facets>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseHeader {
    params: Map<String, Value>,
}

/// `response` (or a group's `doclist`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocList {
    #[serde(rename = "numFound")]
    pub num_found: Value,
    pub docs: Vec<Document>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Facets {
    #[serde(rename = "lineChartFacet")]
    line_chart: Option<Terms<LineJobBucket>>,
    #[serde(rename = "heatMapFacet")]
    heat_map: Option<Terms<HeatJobBucket>>,
}

/// A JSON-facet `terms` (or `range`) result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Terms<B> {
    #[serde(default = "Vec::new")]
    pub buckets: Vec<B>,
}

impl<B> Default for Terms<B> {
    fn default() -> Self {
        Self { buckets: Vec::new() }
    }
}

/// Line chart: job → partition → timestamp → {actual, score, anomaly}.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LineJobBucket {
    pub val: Value,
    pub group: Terms<PartitionBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartitionBucket {
    /// Usually a JSON document encoded as a string, carrying `aggr_field`.
    pub val: Value,
    pub timestamp: Terms<TimeBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeBucket {
    pub val: Value,
    pub actual: Terms<ValueBucket>,
    pub score: Terms<ValueBucket>,
    pub anomaly: Terms<ValueBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValueBucket {
    pub val: Value,
}

impl Terms<ValueBucket> {
    /// Value of the first bucket, `null` when there is none.
    pub fn first_val(&self) -> Value {
        self.buckets.first().map(|b| b.val.clone()).unwrap_or(Value::Null)
    }
}

/// Heatmap: job → `Day0` range buckets → `score.score`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatJobBucket {
    pub val: Value,
    #[serde(rename = "Day0")]
    pub day0: Terms<DayBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DayBucket {
    pub val: Value,
    pub score: Option<ScoreFacet>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreFacet {
    pub score: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct GroupedField {
    groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "groupValue")]
    pub group_value: Value,
    pub doclist: DocList,
}

// ═══════════════════════════════════════════════════════════════
//  ResponseShape — structural dispatch, decided once
// ═══════════════════════════════════════════════════════════════

/// The shape of a Solr body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    LineChartFacet(Vec<LineJobBucket>),
    HeatmapFacet(Vec<HeatJobBucket>),
    UngroupedFlat(DocList),
    Grouped {
        groups: Vec<Group>,
        /// First entry of the echoed `fl`, which compiled requests lead
        /// with the time field.
        echoed_time_field: Option<String>,
    },
    Empty,
}

/// Tag of a [`ResponseShape`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    LineChartFacet,
    HeatmapFacet,
    UngroupedFlat,
    Grouped,
    Empty,
}

impl ResponseShape {
    /// Classify a body.
    ///
    /// A `response` key selects the ungrouped family, in which facet
    /// trees take priority (line chart, then heatmap) over plain
    /// documents. Otherwise a `grouped` key selects grouped documents.
    /// Anything else, including `null` and bodies that do not decode, is
    /// `Empty`.
    pub fn parse(payload: &Value) -> Self {
        if !payload.is_object() {
            return Self::Empty;
        }
        let body: SolrBody = match SolrBody::deserialize(payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "malformed solr response, treating as empty");
                return Self::Empty;
            }
        };

        if let Some(docs) = body.response {
            let facets = body.facets.unwrap_or_default();
            if let Some(line) = facets.line_chart {
                return Self::LineChartFacet(line.buckets);
            }
            if let Some(heat) = facets.heat_map {
                return Self::HeatmapFacet(heat.buckets);
            }
            return Self::UngroupedFlat(docs);
        }

        if let Some(grouped) = body.grouped {
            let params = body.response_header.map(|h| h.params).unwrap_or_default();
            return Self::grouped(&grouped, &params);
        }

        Self::Empty
    }

    fn grouped(grouped: &Map<String, Value>, params: &Map<String, Value>) -> Self {
        let echoed_field = params.get("group.field").and_then(|v| match v {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        });
        let field = echoed_field.or_else(|| grouped.keys().next().map(String::as_str));

        let groups = match field.and_then(|f| grouped.get(f)) {
            Some(value) => match GroupedField::deserialize(value) {
                Ok(g) => g.groups,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed grouped response, treating as empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let echoed_time_field = params
            .get("fl")
            .and_then(Value::as_str)
            .and_then(|fl| fl.split(',').next())
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        Self::Grouped {
            groups,
            echoed_time_field,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::LineChartFacet(_) => ShapeKind::LineChartFacet,
            Self::HeatmapFacet(_) => ShapeKind::HeatmapFacet,
            Self::UngroupedFlat(_) => ShapeKind::UngroupedFlat,
            Self::Grouped { .. } => ShapeKind::Grouped,
            Self::Empty => ShapeKind::Empty,
        }
    }
}
