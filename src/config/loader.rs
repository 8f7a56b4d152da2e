use anyhow::{anyhow, Context, Result};
use tracing::debug;

use super::RuntimeConfig;

pub const ENV_PREFIX: &str = "BACCARAT";

/// Layer an optional TOML file and `BACCARAT__SECTION__KEY` environment
/// variables over the built-in defaults.
pub fn load_config(path: &str) -> Result<RuntimeConfig> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::with_name(path).format(::config::FileFormat::Toml).required(false))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read configuration from {}", path))?;

    let runtime: RuntimeConfig = settings
        .try_deserialize()
        .context("configuration has an invalid shape")?;

    runtime
        .validate()
        .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;

    debug!("Loaded configuration from {} (env prefix {})", path, ENV_PREFIX);
    Ok(runtime)
}

/// Render a configuration the way it would be written to `config.toml`
pub fn render_toml(config: &RuntimeConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config("does-not-exist.toml").unwrap();
        assert_eq!(config.engine.historical.similarity_threshold, 0.9);
        assert_eq!(config.engine.current_shoe.min_rounds, 5);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("baccarat-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[engine.current_shoe]\nlong_pattern_threshold = 0.95\nshort_pattern_threshold = 0.95\n",
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.engine.current_shoe.long_pattern_threshold, 0.95);
        assert_eq!(config.engine.current_shoe.short_pattern_threshold, 0.95);
        assert_eq!(config.engine.current_shoe.max_pattern_len, 7);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_render_toml_round_trips() {
        let rendered = render_toml(&RuntimeConfig::default()).unwrap();
        assert!(rendered.contains("[engine.historical]"));
        let parsed: RuntimeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.engine, RuntimeConfig::default().engine);
    }
}
