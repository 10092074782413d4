//! Configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//! - `config/default` (any format the `config` crate understands, optional)
//! - `config/infrastructure` (optional, bulk exchange/queue/binding lists)
//! - environment variables prefixed `HOOKHUB`, sections separated by `__`
//!   (`HOOKHUB__SERVER__PORT=9000`)

mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{
    BindingConfig, BrokerSettings, ExchangeConfig, InfrastructureSettings, LoggingSettings,
    PersistenceSettings, QueueConfig, ServerSettings, Settings, WebhookSettings,
};

/// Loads the configuration from the default locations and the environment,
/// merged over `Settings::default()`.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config")
}

/// Same as [`load_config`], reading the files from `dir`.
pub fn load_config_from(dir: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(&format!("{dir}/default")).required(false))
        .add_source(File::with_name(&format!("{dir}/infrastructure")).required(false))
        .add_source(
            Environment::with_prefix("HOOKHUB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}
