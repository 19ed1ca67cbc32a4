use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compiler::{CompiledRequest, Params};
use crate::response::{DocList, ResponseShape};
use crate::target::TimeRange;
use crate::template::{VarFormat, VariableBindings, VariableResolver};
use crate::values::{display, epoch_millis};

const ANNOTATION_LIMIT: &str = "10";

/// Annotation query as configured on a dashboard.
///
/// Blank fields fall back to the same defaults as missing ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationSpec {
    pub query: String,
    pub time_field: String,
    pub collection: String,
    pub tags_field: String,
    pub title_field: String,
    pub text_field: Option<String>,
}

impl Default for AnnotationSpec {
    fn default() -> Self {
        Self {
            query: String::new(),
            time_field: "timestamp_dt".to_string(),
            collection: "annotations".to_string(),
            tags_field: "tags".to_string(),
            title_field: "desc".to_string(),
            text_field: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub time_ms: i64,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub text: Option<String>,
}

impl AnnotationSpec {
    fn time_field(&self) -> &str {
        non_blank(&self.time_field).unwrap_or("timestamp_dt")
    }

    fn collection(&self) -> &str {
        non_blank(&self.collection).unwrap_or("annotations")
    }

    fn tags_field(&self) -> &str {
        non_blank(&self.tags_field).unwrap_or("tags")
    }

    fn title_field(&self) -> &str {
        non_blank(&self.title_field).unwrap_or("desc")
    }

    fn text_field(&self) -> Option<&str> {
        self.text_field.as_deref().and_then(non_blank)
    }

    /// `q=<query> AND <timeField>:[from TO to]` against the annotation
    /// collection, parsed with edismax.
    pub fn compile(
        &self,
        range: &TimeRange,
        vars: &VariableBindings,
        resolver: &dyn VariableResolver,
    ) -> CompiledRequest {
        let resolved = resolver.resolve(&self.query, vars, VarFormat::Glob);
        let base = non_blank(&resolved).unwrap_or("*:*");
        let q = format!("{base} AND {}", range.filter(self.time_field()));

        CompiledRequest::new(
            format!("/solr/{}/select", self.collection()),
            Params::new()
                .with("wt", "json")
                .with("defType", "edismax")
                .with("q", q)
                .with("limit", ANNOTATION_LIMIT),
        )
    }

    /// One annotation per returned document.
    pub fn annotations_from(&self, payload: &Value) -> Vec<Annotation> {
        let docs = match ResponseShape::parse(payload) {
            ResponseShape::UngroupedFlat(DocList { docs, .. }) => docs,
            _ => return Vec::new(),
        };
        docs.iter()
            .map(|doc| Annotation {
                time_ms: doc.get(self.time_field()).map(epoch_millis).unwrap_or_default(),
                title: doc.get(self.title_field()).and_then(text),
                tags: doc.get(self.tags_field()).map(tags).unwrap_or_default(),
                text: self.text_field().and_then(|f| doc.get(f)).and_then(text),
            })
            .collect()
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(items.iter().map(display).collect::<Vec<_>>().join(" ")),
        other => Some(display(other)),
    }
}

fn tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display).collect(),
        Value::Null => Vec::new(),
        other => vec![display(other)],
    }
}
