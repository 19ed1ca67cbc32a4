use grafana_plugin_sdk::backend;
use serde::Deserialize;
use serde_json::Value;
use solr_query::{Auth, HttpTransport, Orchestrator, ScopedVarResolver, TransportError};

pub(crate) const DEFAULT_URL: &str = "http://localhost:8983";

pub(crate) type SolrOrchestrator = Orchestrator<HttpTransport, ScopedVarResolver>;

type InstanceSettings = backend::DataSourceInstanceSettings<Value, Value>;

// ═══════════════════════════════════════════════════════════════
//  jsonData — datasource configuration page
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SolrSettings {
    pub url: Option<String>,
    /// Enables the collections listing.
    pub solr_cloud_mode: bool,
    pub solr_anomaly_collection: Option<String>,
    pub solr_raw_collection: Option<String>,
    pub with_credentials: bool,
}

impl SolrSettings {
    /// Collection that dashboard variable queries facet over. Variable
    /// queries stay disabled until both collections are configured.
    pub fn variable_collection(&self) -> Option<&str> {
        let anomaly = self.solr_anomaly_collection.as_deref().filter(|c| !c.is_empty())?;
        self.solr_raw_collection.as_deref().filter(|c| !c.is_empty())?;
        Some(anomaly)
    }
}

// ═══════════════════════════════════════════════════════════════
//  DatasourceConfig — resolved connection parameters
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub(crate) struct DatasourceConfig {
    pub base_url: String,
    pub settings: SolrSettings,
    pub auth: Option<Auth>,
}

impl DatasourceConfig {
    /// URL precedence: instance URL, then `jsonData.url`, then [`DEFAULT_URL`].
    pub fn from_instance(instance: Option<&InstanceSettings>) -> Self {
        let Some(instance) = instance else {
            return Self::from_parts("", Value::Null, false, "", &Value::Null);
        };
        // Serializing normalizes the secure data whether or not the SDK wraps it in an Option.
        let secure = serde_json::to_value(&instance.decrypted_secure_json_data).unwrap_or_default();
        Self::from_parts(
            &instance.url,
            instance.json_data.clone(),
            instance.basic_auth_enabled,
            &instance.basic_auth_user,
            &secure,
        )
    }

    fn from_parts(
        instance_url: &str,
        json_data: Value,
        basic_auth_enabled: bool,
        basic_auth_user: &str,
        secure: &Value,
    ) -> Self {
        let settings: SolrSettings = if json_data.is_null() {
            SolrSettings::default()
        } else {
            serde_json::from_value(json_data).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid datasource jsonData, using defaults");
                SolrSettings::default()
            })
        };

        let base_url = [Some(instance_url), settings.url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|u| !u.is_empty())
            .unwrap_or(DEFAULT_URL)
            .to_string();

        let secret = |key: &str| {
            secure
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let auth = if basic_auth_enabled {
            Some(Auth::Basic {
                user: basic_auth_user.to_string(),
                password: secret("basicAuthPassword"),
            })
        } else {
            secret("bearerToken").map(Auth::Bearer)
        };

        Self {
            base_url,
            settings,
            auth,
        }
    }

    pub fn transport(&self) -> Result<HttpTransport, TransportError> {
        HttpTransport::new(&self.base_url, self.auth.clone(), self.settings.with_credentials)
    }

    pub fn orchestrator(&self) -> Result<SolrOrchestrator, TransportError> {
        Ok(Orchestrator::new(self.transport()?, ScopedVarResolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_precedence() {
        let config = DatasourceConfig::from_parts("", json!({"url": "http://solr:8983/"}), false, "", &Value::Null);
        assert_eq!(config.base_url, "http://solr:8983/");

        let config = DatasourceConfig::from_parts("http://proxy", json!({"url": "http://solr"}), false, "", &Value::Null);
        assert_eq!(config.base_url, "http://proxy");

        let config = DatasourceConfig::from_instance(None);
        assert_eq!(config.base_url, DEFAULT_URL);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_settings_and_auth() {
        let config = DatasourceConfig::from_parts(
            "",
            json!({"solrCloudMode": true, "solrAnomalyCollection": "anomalies"}),
            true,
            "admin",
            &json!({"basicAuthPassword": "secret"}),
        );
        assert!(config.settings.solr_cloud_mode);
        assert_eq!(config.settings.solr_anomaly_collection.as_deref(), Some("anomalies"));
        assert_eq!(
            config.auth,
            Some(Auth::Basic { user: "admin".into(), password: Some("secret".into()) })
        );

        let bearer = DatasourceConfig::from_parts("", Value::Null, false, "", &json!({"bearerToken": "t0k"}));
        assert_eq!(bearer.auth, Some(Auth::Bearer("t0k".into())));
    }

    #[test]
    fn test_variable_collection_needs_both_collections() {
        let settings: SolrSettings =
            serde_json::from_value(json!({"solrAnomalyCollection": "anomalies"})).unwrap();
        assert_eq!(settings.variable_collection(), None);

        let settings: SolrSettings = serde_json::from_value(
            json!({"solrAnomalyCollection": "anomalies", "solrRawCollection": "raw"}),
        )
        .unwrap();
        assert_eq!(settings.variable_collection(), Some("anomalies"));
    }

    #[test]
    fn test_invalid_json_data_falls_back() {
        let config = DatasourceConfig::from_parts("", json!({"solrCloudMode": "maybe"}), false, "", &Value::Null);
        assert!(!config.settings.solr_cloud_mode);
    }
}
