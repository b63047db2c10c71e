//! Configuration layering for the terminal host
//!
//! Precedence, lowest first: built-in defaults, the TOML file named by
//! `--config`, `SPELLMASTER_*` environment variables, command-line flags.
//! The merged result is validated once at the end.

use std::path::Path;

use anyhow::{Context, Result};
use spellmaster::HarnessConfig;
use tracing::debug;

/// Flag-level overrides. `None`/`false` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub tick_interval_ms: Option<u64>,
    pub max_level: Option<u32>,
    pub no_sounds: bool,
    pub no_visuals: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(ms) = self.tick_interval_ms {
            config.escalation.tick_interval_ms = ms;
        }
        if let Some(max) = self.max_level {
            config.escalation.max_level = max;
        }
        if self.no_sounds {
            config.presentation.sounds = false;
        }
        if self.no_visuals {
            config.presentation.visuals = false;
        }
    }
}

/// Resolve configuration against the process environment.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<HarnessConfig> {
    load_config_with(path, overrides, |var| std::env::var(var).ok())
}

/// Resolve configuration against an arbitrary variable lookup.
pub fn load_config_with<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    config
        .apply_overrides(lookup)
        .context("applying SPELLMASTER_* environment")?;
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    debug!(?config, "Configuration resolved");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_layers() {
        let config = load_config_with(None, &Overrides::default(), env(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_precedence_file_env_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spellmaster.toml");
        std::fs::write(
            &path,
            "[escalation]\ntick_interval_ms = 250\nmax_level = 50\n\n[controller]\nstep = 0.5\n",
        )
        .unwrap();

        let overrides = Overrides {
            max_level: Some(10),
            no_sounds: true,
            ..Default::default()
        };
        let config = load_config_with(
            Some(&path),
            &overrides,
            env(&[
                ("SPELLMASTER_TICK_INTERVAL_MS", "200"),
                ("SPELLMASTER_MAX_LEVEL", "20"),
            ]),
        )
        .unwrap();

        assert_eq!(config.controller.step, 0.5); // file
        assert_eq!(config.escalation.tick_interval_ms, 200); // env over file
        assert_eq!(config.escalation.max_level, 10); // flag over env
        assert!(!config.presentation.sounds);
        assert!(config.presentation.visuals);
    }

    #[test]
    fn test_invalid_merge_rejected() {
        let overrides = Overrides {
            tick_interval_ms: Some(0),
            ..Default::default()
        };
        let err = load_config_with(None, &overrides, env(&[])).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config_with(
            Some(Path::new("/nonexistent/spellmaster.toml")),
            &Overrides::default(),
            env(&[]),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/spellmaster.toml"));
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let err = load_config_with(
            None,
            &Overrides::default(),
            env(&[("SPELLMASTER_SOUNDS", "loud")]),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("SPELLMASTER_SOUNDS"));
    }
}
