use std::process::ExitCode;

use sim_engine::{run_headless, AppError, FeedbackRouter, LoopSummary, SceneRuntime};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_wiring(app) {
        Ok(summary) => {
            info!(
                ticks_run = summary.ticks_run,
                resets = summary.resets,
                sim_seconds = summary.sim_seconds,
                tps = summary.metrics.tps,
                "demo_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_wiring(app: AppWiring) -> Result<LoopSummary, AppError> {
    let AppWiring {
        config,
        scene,
        mut input,
    } = app;
    let mut runtime = SceneRuntime::new(scene);
    let mut router = FeedbackRouter::default();
    run_headless(&config, &mut runtime, input.as_mut(), &mut router)
}

#[cfg(test)]
mod tests {
    use sim_engine::LoopConfig;

    use super::*;
    use crate::app::demo_input::ScriptedInput;
    use crate::app::gameplay::build_scene;
    use crate::app::tuning::Tuning;

    fn wiring(max_ticks: Option<u64>, target_tps: u32) -> AppWiring {
        AppWiring {
            config: LoopConfig {
                target_tps,
                max_ticks,
                ..LoopConfig::default()
            },
            scene: build_scene(Tuning::default(), 7),
            input: Box::new(ScriptedInput::demo()),
        }
    }

    #[test]
    fn demo_runs_to_tick_cap_and_resets_once() {
        let summary = run_wiring(wiring(Some(450), 60)).expect("run");
        assert_eq!(summary.ticks_run, 450);
        assert_eq!(summary.resets, 1);
        assert!(summary.metrics.tps > 0.0);
    }

    #[test]
    fn invalid_loop_config_is_rejected() {
        let result = run_wiring(wiring(Some(10), 0));
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }
}
