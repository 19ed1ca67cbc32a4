//! Solr query compilation and response shaping for dashboard series.
//!
//! A dashboard target is compiled into a Solr `select` request
//! ([`compiler`]), executed through a [`Transport`], and the heterogeneous
//! Solr body (documents, grouped documents, JSON facet trees) is reshaped
//! into canonical [`Series`] ([`normalize`]). [`Orchestrator`] runs many
//! targets concurrently.

pub mod annotation;
pub mod compiler;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod presets;
pub mod response;
pub mod series;
pub mod target;
pub mod template;
pub mod transport;
pub mod values;

pub use annotation::{Annotation, AnnotationSpec};
pub use compiler::{Compiled, CompiledRequest, Params, compile};
pub use error::{QueryError, TransportError};
pub use normalize::{normalize, normalize_at};
pub use orchestrator::Orchestrator;
pub use response::{ResponseShape, ShapeKind};
pub use series::{Column, ColumnKind, Datapoint, Series, TableSeries, TimeSeries};
pub use target::{OutputFormat, SkipReason, TargetSpec, TimeRange};
pub use template::{ScopedVarResolver, VarFormat, VariableBindings, VariableResolver, VariableValue};
pub use transport::{Auth, HttpTransport, SolrResponse, Transport};
pub use values::TextValue;
