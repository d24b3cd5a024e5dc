use bindloop::engine::config::AdvancedSettings;

pub struct DefaultsConfig {
    pub backend_command: String,
    pub advanced: AdvancedSettings,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            backend_command: "bindloop-backend".to_string(),
            advanced: AdvancedSettings::default(),
        }
    }
}
