//! Platformer rules: the player controller, the three adversaries, the
//! interaction pass and the scene that runs them in a fixed order.

mod boss;
mod chaser;
mod interactions;
mod level;
mod patroller;
mod player;
mod scene_impl;
mod types;

use sim_engine::Scene;

pub(crate) use scene_impl::PlatformerScene;

use crate::app::tuning::Tuning;

pub(crate) fn build_scene(tuning: Tuning, seed: u64) -> Box<dyn Scene> {
    Box::new(PlatformerScene::new(tuning, seed))
}

#[cfg(test)]
mod tests;
