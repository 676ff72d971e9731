use std::path::Path;

use sim_engine::{AppError, InputSource, LoopConfig, Scene};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::demo_input::ScriptedInput;
use super::gameplay;
use super::tuning::{Tuning, TuningError};

const TUNING_ENV_VAR: &str = "PLATFORMER_TUNING";
const SEED_ENV_VAR: &str = "PLATFORMER_SEED";
const MAX_TICKS_ENV_VAR: &str = "PLATFORMER_MAX_TICKS";
const DEFAULT_SEED: u64 = 0x5eed;
const DEFAULT_MAX_TICKS: u64 = 600;

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Loop(#[from] AppError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) input: Box<dyn InputSource>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let tuning_path = std::env::var(TUNING_ENV_VAR).ok();
    let tuning = load_tuning(tuning_path.as_deref().map(Path::new))?;
    let seed = parse_u64_setting(SEED_ENV_VAR, std::env::var(SEED_ENV_VAR).ok())
        .unwrap_or(DEFAULT_SEED);
    let max_ticks = parse_u64_setting(MAX_TICKS_ENV_VAR, std::env::var(MAX_TICKS_ENV_VAR).ok())
        .unwrap_or(DEFAULT_MAX_TICKS);

    let config = LoopConfig {
        max_ticks: Some(max_ticks),
        ..LoopConfig::default()
    };
    config.validate()?;
    info!(
        seed,
        max_ticks,
        tuning = tuning_path.as_deref().unwrap_or("<defaults>"),
        "app_configured"
    );

    Ok(AppWiring {
        config,
        scene: gameplay::build_scene(tuning, seed),
        input: Box::new(ScriptedInput::demo()),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_tuning(path: Option<&Path>) -> Result<Tuning, TuningError> {
    match path {
        Some(path) => Tuning::load(path),
        None => Ok(Tuning::default()),
    }
}

/// Unset yields `None`. A malformed value is reported and also yields `None`.
fn parse_u64_setting(name: &str, raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(var = name, value = %raw, error = %err, "env_setting_ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn u64_setting_parses_trimmed_values() {
        assert_eq!(parse_u64_setting("X", None), None);
        assert_eq!(parse_u64_setting("X", Some(" 42 ".to_string())), Some(42));
    }

    #[test]
    fn malformed_u64_setting_falls_back() {
        assert_eq!(parse_u64_setting("X", Some("forty".to_string())), None);
        assert_eq!(parse_u64_setting("X", Some("-1".to_string())), None);
    }

    #[test]
    fn missing_tuning_path_uses_defaults() {
        let tuning = load_tuning(None).expect("defaults");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn tuning_file_overrides_named_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "boss": {{ "throw_force": 30.0 }} }}"#).expect("write");

        let tuning = load_tuning(Some(file.path())).expect("tuning");

        assert_eq!(tuning.boss.throw_force, 30.0);
        assert_eq!(tuning.player, Tuning::default().player);
    }

    #[test]
    fn bad_tuning_file_surfaces_as_startup_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "boss": {{ "hits_to_defeat": "three" }} }}"#).expect("write");

        let err = StartupError::from(load_tuning(Some(file.path())).expect_err("invalid"));

        assert!(err.to_string().contains("boss.hits_to_defeat"));
    }
}
