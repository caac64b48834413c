use std::sync::Arc;

use anyhow::Result;

use jobq_core::api::{
    AppConfig, ClassifierRegistry, Dispatcher, FixedCooldown, LockPatternClassifier,
    OutputRendererPlugin, RetryConfig, RetryStrategyPlugin, TaskExecutor,
};
use jobq_core::executor::retry::max_attempts;

use crate::classifier;
use crate::executor::{
    ExponentialBackoffPlugin, JsonlRendererPlugin, LinearRetryPlugin, ProcessExecutor,
    TextRendererPlugin,
};

pub fn build_executor(cfg: &AppConfig) -> Arc<dyn TaskExecutor> {
    Arc::new(ProcessExecutor::new(
        cfg.elevation.clone(),
        cfg.dispatcher.capture_bytes,
        cfg.dispatcher.echo_output,
    ))
}

pub fn build_retry_strategy(cfg: &RetryConfig) -> Arc<dyn RetryStrategyPlugin> {
    match cfg.strategy.as_str() {
        "linear" => Arc::new(LinearRetryPlugin::new(cfg.clone())),
        "exponential-backoff" | "exponential" => {
            Arc::new(ExponentialBackoffPlugin::new(cfg.clone()))
        }
        other => {
            if other != "fixed" {
                tracing::warn!(strategy = other, "unknown retry strategy, using fixed");
            }
            Arc::new(FixedCooldown::new(
                std::time::Duration::from_millis(cfg.base_delay_ms),
                max_attempts(cfg.max_attempts),
            ))
        }
    }
}

/// Presets for known families plus configured overrides; unknown families
/// fall back to the generic text rules.
pub fn build_classifiers(cfg: &AppConfig) -> Result<ClassifierRegistry> {
    let mut registry = ClassifierRegistry::default();
    for (family, rules) in classifier::merged(&cfg.classifiers) {
        let c = LockPatternClassifier::from_config(family.clone(), &rules)?;
        registry.insert(family, Arc::new(c));
    }
    Ok(registry)
}

pub fn build_renderer(format: &str, verbose: bool, ascii_only: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new()),
        // Anything other than jsonl behaves like text.
        _ => Arc::new(TextRendererPlugin::new(ascii_only, verbose)),
    }
}

/// Dispatcher wired from configuration.
pub fn build_dispatcher(cfg: &AppConfig) -> Result<Dispatcher> {
    let progress = cfg.dispatcher.progress_bar && !cfg.dispatcher.echo_output;
    Ok(Dispatcher::builder(build_executor(cfg))
        .classifiers(build_classifiers(cfg)?)
        .retry_strategy(build_retry_strategy(&cfg.dispatcher.retry))
        .renderer(build_renderer(
            &cfg.dispatcher.output,
            cfg.verbose,
            cfg.dispatcher.ascii_output,
        ))
        .progress_bar(progress)
        .build())
}
