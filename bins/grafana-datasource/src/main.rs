mod plugin;

use plugin::SolrPlugin;

#[grafana_plugin_sdk::main(
    services(data, diagnostics, resource),
    init_subscriber = true,
)]
async fn plugin() -> SolrPlugin {
    SolrPlugin::new()
}
