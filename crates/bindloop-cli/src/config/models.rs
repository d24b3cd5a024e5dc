use bindloop::engine::config::DesignConfig;

pub struct AppConfig {
    pub design: DesignConfig,
    /// Program and leading arguments of the collaborator backend.
    pub backend_command: Vec<String>,
    /// The advanced settings document as read, forwarded to every backend call.
    pub backend_settings: serde_json::Value,
    pub seed: Option<u64>,
}
