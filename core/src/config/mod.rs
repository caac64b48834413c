mod load;
mod types;

pub use load::{
    apply_env_overrides, get_jobq_data_dir, load, parse_config, read_config,
};
pub use types::{
    AppConfig, ClassifierConfig, DispatcherConfig, ElevationConfig, LoggingConfig,
    RepositoryConfig, RetryConfig,
};
