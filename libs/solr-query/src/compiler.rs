use crate::target::{SkipReason, TargetSpec, TimeRange};
use crate::template::{VarFormat, VariableBindings, VariableResolver};

pub const START_TIME_PLACEHOLDER: &str = "__START_TIME__";
pub const END_TIME_PLACEHOLDER: &str = "__END_TIME__";

const DEFAULT_ROWS: &str = "100";
const DEFAULT_SORT_ORDER: &str = "desc";

// ═══════════════════════════════════════════════════════════════
//  Params — ordered query-string parameters
// ═══════════════════════════════════════════════════════════════

/// Ordered parameter list. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  CompiledRequest
// ═══════════════════════════════════════════════════════════════

/// A GET against `<base><path>?<params>`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRequest {
    path: String,
    params: Params,
}

impl CompiledRequest {
    pub fn new(path: impl Into<String>, params: Params) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// Outcome of compiling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    Request(CompiledRequest),
    Skip(SkipReason),
}

impl Compiled {
    pub fn request(self) -> Option<CompiledRequest> {
        match self {
            Self::Request(request) => Some(request),
            Self::Skip(_) => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Target compilation
// ═══════════════════════════════════════════════════════════════

/// Compile a target into a Solr `select` request.
pub fn compile(
    target: &TargetSpec,
    range: &TimeRange,
    vars: &VariableBindings,
    resolver: &dyn VariableResolver,
) -> Compiled {
    if let Some(reason) = target.skip_reason() {
        tracing::debug!(collection = %target.collection, %reason, "target skipped");
        return Compiled::Skip(reason);
    }

    let time = target.time_field.as_str();
    let from = range.from_literal();
    let to = range.to_literal();

    let query = rewrite_filter(&resolver.resolve(&target.filter_expression, vars, VarFormat::Glob));
    let sort = resolve_setting(target.sort_field.as_deref(), resolver, vars, time);
    let sort_order = resolve_setting(target.sort_order.as_deref(), resolver, vars, DEFAULT_SORT_ORDER);
    let rows = resolve_setting(target.row_limit.as_deref(), resolver, vars, DEFAULT_ROWS);
    let start = target
        .start_offset
        .as_deref()
        .map(|s| resolver.resolve(s, vars, VarFormat::Glob))
        .filter(|s| !s.trim().is_empty());

    let mut params = Params::new()
        .with("wt", "json")
        .with("fq", range.filter(time))
        .with("q", query)
        .with("fl", select_list(time, &target.fields_to_select))
        .with("rows", rows)
        .with("sort", format!("{sort} {sort_order}"));
    if let Some(start) = start {
        params.set("start", start);
    }

    if target.cloud_mode_override {
        params.set("startTime", from.as_str());
        params.set("endTime", to.as_str());
    }

    apply_raw_params(&mut params, &target.raw_params, &from, &to);

    if target.grouping_enabled {
        params.set("group", "true");
        params.set("group.field", target.group_by_field.as_str());
        if let Some(limit) = target.group_limit.as_deref().filter(|l| !l.is_empty()) {
            params.set("group.limit", limit);
        }
    }

    let path = format!("/solr/{}/select", target.collection);
    tracing::debug!(%path, params = params.len(), "compiled request");
    Compiled::Request(CompiledRequest::new(path, params))
}

/// Brace-group shorthand: `{` → `(`, `}` → `)`, `,` → ` OR `.
///
/// Purely textual: commas and braces anywhere in the query are rewritten.
pub fn rewrite_filter(query: &str) -> String {
    query.replace('{', "(").replace('}', ")").replace(',', " OR ")
}

/// Setting precedence: the resolved template when it is non-blank,
/// otherwise the hard default. Unknown variables resolve to themselves
/// and therefore win over the default.
pub fn resolve_setting(
    template: Option<&str>,
    resolver: &dyn VariableResolver,
    vars: &VariableBindings,
    default: &str,
) -> String {
    template
        .map(|t| resolver.resolve(t, vars, VarFormat::Glob))
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn select_list(time: &str, fields: &str) -> String {
    if fields.is_empty() {
        time.to_string()
    } else {
        format!("{time},{fields}")
    }
}

/// Apply `&`-joined `key=value` overrides. Each entry splits on its first
/// `=`; range placeholders in values are replaced with the window bounds.
pub fn apply_raw_params(params: &mut Params, raw: &str, from: &str, to: &str) {
    for entry in raw.split('&').filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        let value = value
            .replace(START_TIME_PLACEHOLDER, from)
            .replace(END_TIME_PLACEHOLDER, to);
        params.set(key, value);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Helper requests
// ═══════════════════════════════════════════════════════════════

/// `GET <base>/`
pub fn health_check() -> CompiledRequest {
    CompiledRequest::new("/", Params::new())
}

/// `GET <base>/solr/admin/collections?action=LIST&wt=json`
pub fn list_collections() -> CompiledRequest {
    CompiledRequest::new(
        "/solr/admin/collections",
        Params::new().with("action", "LIST").with("wt", "json"),
    )
}

/// First document as CSV; its header line names the fields.
pub fn list_fields(collection: &str) -> CompiledRequest {
    CompiledRequest::new(
        format!("/solr/{collection}/select"),
        Params::new().with("q", "*:*").with("wt", "csv").with("rows", "1"),
    )
}

/// Facet terms of one field. A variable query of the form `field,extra`
/// uses the text before the first comma.
pub fn facet_values(collection: &str, query: &str) -> CompiledRequest {
    let field = query.split(',').next().unwrap_or_default();
    CompiledRequest::new(
        format!("/solr/{collection}/select"),
        Params::new()
            .with("q", "*:*")
            .with("facet", "true")
            .with("facet.field", field)
            .with("wt", "json")
            .with("rows", "0"),
    )
}
