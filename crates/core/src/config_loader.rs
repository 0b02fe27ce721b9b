use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Prefix for environment overrides, e.g. `SIGNAL_EXCHANGE__SYMBOL=BTCUSDT`.
pub const ENV_PREFIX: &str = "SIGNAL_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, a TOML file, environment
    /// variables, and an optional JSON sidecar next to the TOML file.
    ///
    /// Missing files are skipped, so `load` on a fresh checkout yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or variable cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults and environment");
        }
        Self::figment(path, None)
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))
    }

    /// Loads configuration with a `Config.<profile>.toml` overlay from the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or variable cannot be parsed.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), profile, "loading configuration profile");
        Self::figment(path, Some(profile))
            .extract()
            .with_context(|| {
                format!(
                    "failed to load configuration from {} (profile {profile})",
                    path.display()
                )
            })
    }

    fn figment(path: &Path, profile: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path));

        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(path.with_file_name(format!("Config.{profile}.toml"))));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(path.with_extension("json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [exchange]
                symbol = "ETHUSDT"
                interval = "5"

                [strategy]
                kind = "pullback"
                "#,
            )?;
            jail.set_env("SIGNAL_EXCHANGE__SYMBOL", "BTCUSDT");

            let config = ConfigLoader::load("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.exchange.symbol, "BTCUSDT");
            assert_eq!(config.exchange.interval, "5");
            assert_eq!(config.strategy.kind, StrategyKind::Pullback);
            assert_eq!(config.indicators.rsi_period, 14);
            Ok(())
        });
    }

    #[test]
    fn profile_overlay_wins_over_base() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[pipeline]\npoll_interval_secs = 30\n")?;
            jail.create_file("Config.fast.toml", "[pipeline]\npoll_interval_secs = 5\n")?;

            let config = ConfigLoader::load_with_profile("Config.toml", "fast")
                .map_err(|e| e.to_string())?;
            assert_eq!(config.pipeline.poll_interval_secs, 5);
            Ok(())
        });
    }
}
