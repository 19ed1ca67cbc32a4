use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::values::display;

// ═══════════════════════════════════════════════════════════════
//  Variable bindings
// ═══════════════════════════════════════════════════════════════

/// Current value of a dashboard variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Single(String),
    Multi(Vec<String>),
}

impl VariableValue {
    fn render(&self, format: VarFormat) -> String {
        match self {
            Self::Single(v) => v.clone(),
            Self::Multi(values) => match format {
                VarFormat::Glob if values.len() == 1 => values[0].clone(),
                VarFormat::Glob => format!("{{{}}}", values.join(",")),
                VarFormat::Pipe => values.join("|"),
                VarFormat::Csv | VarFormat::Raw => values.join(","),
            },
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<&str>> for VariableValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&Value> for VariableValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::Multi(items.iter().map(display).collect()),
            Value::Null => Self::Single(String::new()),
            other => Self::Single(display(other)),
        }
    }
}

/// Wire form of one binding: either a bare value or a host
/// `scopedVars` entry `{"text": .., "value": ..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BindingWire {
    Scoped { value: Value },
    Plain(Value),
}

/// Name → value scope used for template substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBindings {
    values: HashMap<String, VariableValue>,
}

impl<'de> Deserialize<'de> for VariableBindings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = Option::<HashMap<String, BindingWire>>::deserialize(deserializer)?;
        let values = wire
            .unwrap_or_default()
            .into_iter()
            .map(|(name, binding)| {
                let value = match &binding {
                    BindingWire::Scoped { value } | BindingWire::Plain(value) => {
                        VariableValue::from(value)
                    }
                };
                (name, value)
            })
            .collect();
        Ok(Self { values })
    }
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<VariableValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Formats
// ═══════════════════════════════════════════════════════════════

/// How multi-valued variables are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarFormat {
    /// `{a,b}`, which the filter rewrite turns into `(a OR b)`.
    #[default]
    Glob,
    Csv,
    Pipe,
    Raw,
}

impl VarFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "glob" => Some(Self::Glob),
            "csv" => Some(Self::Csv),
            "pipe" => Some(Self::Pipe),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Resolver capability
// ═══════════════════════════════════════════════════════════════

/// Host-side template substitution.
///
/// Implementations must leave unknown variables in place.
pub trait VariableResolver: Send + Sync {
    fn resolve(&self, template: &str, scope: &VariableBindings, format: VarFormat) -> String;
}

/// Resolver for `$name`, `${name}`, `${name:format}` and `[[name]]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedVarResolver;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)(?::(\w+))?\}|\[\[(\w+)(?::(\w+))?\]\]|\$(\w+)")
        .expect("variable pattern is valid")
});

impl VariableResolver for ScopedVarResolver {
    fn resolve(&self, template: &str, scope: &VariableBindings, format: VarFormat) -> String {
        if scope.is_empty() || !template.contains(['$', '[']) {
            return template.to_string();
        }
        VARIABLE
            .replace_all(template, |caps: &Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(3)).or_else(|| caps.get(5));
                let explicit = caps.get(2).or_else(|| caps.get(4));
                let format = explicit
                    .and_then(|f| VarFormat::parse(f.as_str()))
                    .unwrap_or(format);
                match name.and_then(|n| scope.get(n.as_str())) {
                    Some(value) => value.render(format),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> VariableBindings {
        VariableBindings::new()
            .with("host", "web-1")
            .with("status", vec!["A", "B", "C"])
            .with("rows", "250")
    }

    #[test]
    fn test_resolve_all_syntaxes() {
        let r = ScopedVarResolver;
        let s = scope();
        assert_eq!(r.resolve("host:$host", &s, VarFormat::Glob), "host:web-1");
        assert_eq!(r.resolve("host:${host}x", &s, VarFormat::Glob), "host:web-1x");
        assert_eq!(r.resolve("host:[[host]]", &s, VarFormat::Glob), "host:web-1");
    }

    #[test]
    fn test_multi_value_formats() {
        let r = ScopedVarResolver;
        let s = scope();
        assert_eq!(r.resolve("status:$status", &s, VarFormat::Glob), "status:{A,B,C}");
        assert_eq!(r.resolve("$status", &s, VarFormat::Csv), "A,B,C");
        assert_eq!(r.resolve("${status:pipe}", &s, VarFormat::Glob), "A|B|C");
    }

    #[test]
    fn test_unknown_variables_pass_through() {
        let r = ScopedVarResolver;
        let s = scope();
        assert_eq!(r.resolve("$missing AND $host", &s, VarFormat::Glob), "$missing AND web-1");
        assert_eq!(r.resolve("$rows", &VariableBindings::new(), VarFormat::Glob), "$rows");
    }

    #[test]
    fn test_deserialize_scoped_vars() {
        let bindings: VariableBindings = serde_json::from_value(json!({
            "host": {"text": "web-1", "value": "web-1"},
            "status": {"text": "A + B", "value": ["A", "B"]},
            "limit": 10
        }))
        .unwrap();

        assert_eq!(bindings.get("host"), Some(&VariableValue::Single("web-1".into())));
        assert_eq!(
            bindings.get("status"),
            Some(&VariableValue::Multi(vec!["A".into(), "B".into()]))
        );
        assert_eq!(bindings.get("limit"), Some(&VariableValue::Single("10".into())));
    }
}
