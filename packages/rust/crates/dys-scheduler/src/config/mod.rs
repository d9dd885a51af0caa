//! Config namespace: YAML runtime settings.

mod settings;

pub use settings::{
    BlockSettings, BridgeSettings, FilterSettings, PaginationSettings, RuntimeSettings,
    SubmitSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
