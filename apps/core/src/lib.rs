pub mod config;
pub mod contract;
pub mod core_service;
pub mod discovery;
pub mod history_cache;
pub mod history_store;
pub mod host_actions;
pub mod launch;
pub mod logging;
pub mod model;
pub mod path_key;
pub mod plugin_registry;
pub mod reconcile;
pub mod runtime;
pub mod score;
pub mod transport;

#[cfg(test)]
mod tests {
    mod ranking_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/ranking_latency_test.rs"
        ));
    }
}
