use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse tuning json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning value at {path}: {reason}")]
    Invalid { path: String, reason: &'static str },
}

/// Every gameplay constant, grouped by the system that reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Tuning {
    pub(crate) player: PlayerTuning,
    pub(crate) patroller: PatrollerTuning,
    pub(crate) boss: BossTuning,
    pub(crate) chaser: ChaserTuning,
    pub(crate) interactions: InteractionTuning,
    pub(crate) level: LevelTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerTuning {
    pub(crate) speed: f32,
    /// Upward velocity applied by a jump.
    pub(crate) jump_velocity: f32,
    pub(crate) gravity: f32,
    pub(crate) half_extents: Vec3,
    pub(crate) turn_rate: f32,
    /// Degrees of yaw or pitch per unit of pointer movement.
    pub(crate) pointer_sensitivity_degrees: f32,
    pub(crate) pitch_limit_degrees: f32,
    pub(crate) fall_threshold: f32,
    pub(crate) ground_probe_lift: f32,
    pub(crate) ground_probe_distance: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 8.0,
            jump_velocity: 8.0,
            gravity: 1.5 * 25.0,
            half_extents: Vec3::new(0.4, 0.9, 0.4),
            turn_rate: 10.0,
            pointer_sensitivity_degrees: 40.0,
            pitch_limit_degrees: 45.0,
            fall_threshold: -20.0,
            ground_probe_lift: 0.1,
            ground_probe_distance: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PatrollerTuning {
    pub(crate) speed: f32,
    pub(crate) path_limit: f32,
    pub(crate) half_extents: Vec3,
}

impl Default for PatrollerTuning {
    fn default() -> Self {
        Self {
            speed: 2.0,
            path_limit: 5.0,
            half_extents: Vec3::new(0.5, 0.35, 0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BossTuning {
    pub(crate) gravity: f32,
    pub(crate) spin_degrees_per_second: f32,
    pub(crate) throw_force: f32,
    pub(crate) upward_force: f32,
    pub(crate) recovery_seconds: f32,
    pub(crate) hits_to_defeat: u32,
    pub(crate) wander_radius: f32,
    pub(crate) wander_duration_seconds: f32,
    /// Expected wander starts per second while idle.
    pub(crate) wander_rate_per_second: f32,
    pub(crate) radius: f32,
    pub(crate) capture_distance: f32,
    pub(crate) capture_facing_dot: f32,
    pub(crate) carry_forward: f32,
    pub(crate) carry_up: f32,
    /// A thrown boss below this height is returned home.
    pub(crate) fall_threshold: f32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            spin_degrees_per_second: 360.0,
            throw_force: 25.0,
            upward_force: 8.0,
            recovery_seconds: 3.0,
            hits_to_defeat: 3,
            wander_radius: 5.0,
            wander_duration_seconds: 2.0,
            // 1% per tick at 60 ticks per second.
            wander_rate_per_second: -(0.99_f32.ln()) * 60.0,
            radius: 2.0,
            capture_distance: 5.0,
            capture_facing_dot: 0.5,
            carry_forward: 1.0,
            carry_up: 2.5,
            fall_threshold: -20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ChaserTuning {
    pub(crate) tether_length: f32,
    pub(crate) lunge_speed: f32,
    pub(crate) retract_speed: f32,
    pub(crate) detection_radius: f32,
    pub(crate) retract_height: f32,
    pub(crate) arrival_distance: f32,
    pub(crate) radius: f32,
    pub(crate) spawn_offset: Vec3,
}

impl Default for ChaserTuning {
    fn default() -> Self {
        Self {
            tether_length: 20.0,
            lunge_speed: 35.0,
            retract_speed: 5.0,
            detection_radius: 25.0,
            retract_height: 4.0,
            arrival_distance: 1.0,
            radius: 4.0,
            spawn_offset: Vec3::new(-5.0, 4.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct InteractionTuning {
    pub(crate) stomp_descent_threshold: f32,
    pub(crate) stomp_height_margin: f32,
    pub(crate) stomp_min_air_time: f32,
    pub(crate) stomp_bounce: f32,
    pub(crate) star_pickup_radius: f32,
    pub(crate) star_message: String,
    pub(crate) star_message_seconds: f32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            stomp_descent_threshold: -1.0,
            stomp_height_margin: 0.1,
            stomp_min_air_time: 0.1,
            stomp_bounce: 5.0,
            star_pickup_radius: 4.0,
            star_message: "YOU GOT A STAR!".to_string(),
            star_message_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelTuning {
    pub(crate) player_spawn: Vec3,
    pub(crate) respawn_point: Vec3,
    pub(crate) patroller_spawns: Vec<Vec3>,
    pub(crate) boss_home: Vec3,
    pub(crate) chaser_post: Vec3,
    pub(crate) star_position: Vec3,
    pub(crate) coin_count: u32,
    pub(crate) coin_area_half_extent: f32,
    pub(crate) coin_height: f32,
    pub(crate) coin_radius: f32,
    pub(crate) star_radius: f32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            player_spawn: Vec3::new(0.0, 5.0, -20.0),
            respawn_point: Vec3::new(0.0, 10.0, -10.0),
            patroller_spawns: vec![Vec3::new(5.0, 0.5, 5.0), Vec3::new(-5.0, 0.5, 10.0)],
            boss_home: Vec3::new(80.0, 2.5, 60.0),
            chaser_post: Vec3::new(-40.0, 0.0, 0.0),
            star_position: Vec3::new(80.0, 4.0, 60.0),
            coin_count: 10,
            coin_area_half_extent: 10.0,
            coin_height: 1.0,
            coin_radius: 0.5,
            star_radius: 1.5,
        }
    }
}

impl Tuning {
    pub(crate) fn from_json_str(raw: &str) -> Result<Self, TuningError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let tuning: Tuning = serde_path_to_error::deserialize(&mut deserializer).map_err(
            |error| {
                let path = error.path().to_string();
                TuningError::Parse {
                    path,
                    source: error.into_inner(),
                }
            },
        )?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, TuningError> {
        let raw = fs::read_to_string(path).map_err(|source| TuningError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub(crate) fn validate(&self) -> Result<(), TuningError> {
        let p = &self.player;
        positive("player.speed", p.speed)?;
        positive("player.jump_velocity", p.jump_velocity)?;
        positive("player.gravity", p.gravity)?;
        positive_vec("player.half_extents", p.half_extents)?;
        positive("player.turn_rate", p.turn_rate)?;
        non_negative("player.pointer_sensitivity_degrees", p.pointer_sensitivity_degrees)?;
        non_negative("player.pitch_limit_degrees", p.pitch_limit_degrees)?;
        if p.pitch_limit_degrees > 90.0 {
            return Err(invalid("player.pitch_limit_degrees", "must not exceed 90"));
        }
        finite("player.fall_threshold", p.fall_threshold)?;
        non_negative("player.ground_probe_lift", p.ground_probe_lift)?;
        positive("player.ground_probe_distance", p.ground_probe_distance)?;

        let g = &self.patroller;
        positive("patroller.speed", g.speed)?;
        positive("patroller.path_limit", g.path_limit)?;
        positive_vec("patroller.half_extents", g.half_extents)?;

        let b = &self.boss;
        positive("boss.gravity", b.gravity)?;
        finite("boss.spin_degrees_per_second", b.spin_degrees_per_second)?;
        non_negative("boss.throw_force", b.throw_force)?;
        non_negative("boss.upward_force", b.upward_force)?;
        positive("boss.recovery_seconds", b.recovery_seconds)?;
        if b.hits_to_defeat == 0 {
            return Err(invalid("boss.hits_to_defeat", "must be at least 1"));
        }
        non_negative("boss.wander_radius", b.wander_radius)?;
        positive("boss.wander_duration_seconds", b.wander_duration_seconds)?;
        non_negative("boss.wander_rate_per_second", b.wander_rate_per_second)?;
        positive("boss.radius", b.radius)?;
        positive("boss.capture_distance", b.capture_distance)?;
        finite("boss.capture_facing_dot", b.capture_facing_dot)?;
        if !(-1.0..=1.0).contains(&b.capture_facing_dot) {
            return Err(invalid("boss.capture_facing_dot", "must be within [-1, 1]"));
        }
        finite("boss.carry_forward", b.carry_forward)?;
        finite("boss.carry_up", b.carry_up)?;
        finite("boss.fall_threshold", b.fall_threshold)?;

        let c = &self.chaser;
        positive("chaser.tether_length", c.tether_length)?;
        positive("chaser.lunge_speed", c.lunge_speed)?;
        positive("chaser.retract_speed", c.retract_speed)?;
        non_negative("chaser.detection_radius", c.detection_radius)?;
        finite("chaser.retract_height", c.retract_height)?;
        positive("chaser.arrival_distance", c.arrival_distance)?;
        positive("chaser.radius", c.radius)?;
        finite_vec("chaser.spawn_offset", c.spawn_offset)?;

        let i = &self.interactions;
        finite("interactions.stomp_descent_threshold", i.stomp_descent_threshold)?;
        non_negative("interactions.stomp_height_margin", i.stomp_height_margin)?;
        non_negative("interactions.stomp_min_air_time", i.stomp_min_air_time)?;
        non_negative("interactions.stomp_bounce", i.stomp_bounce)?;
        positive("interactions.star_pickup_radius", i.star_pickup_radius)?;
        non_negative("interactions.star_message_seconds", i.star_message_seconds)?;

        let l = &self.level;
        finite_vec("level.player_spawn", l.player_spawn)?;
        finite_vec("level.respawn_point", l.respawn_point)?;
        for (index, spawn) in l.patroller_spawns.iter().enumerate() {
            finite_vec(&format!("level.patroller_spawns[{index}]"), *spawn)?;
        }
        finite_vec("level.boss_home", l.boss_home)?;
        finite_vec("level.chaser_post", l.chaser_post)?;
        finite_vec("level.star_position", l.star_position)?;
        non_negative("level.coin_area_half_extent", l.coin_area_half_extent)?;
        finite("level.coin_height", l.coin_height)?;
        positive("level.coin_radius", l.coin_radius)?;
        positive("level.star_radius", l.star_radius)?;
        Ok(())
    }
}

fn invalid(path: &str, reason: &'static str) -> TuningError {
    TuningError::Invalid {
        path: path.to_string(),
        reason,
    }
}

fn finite(path: &str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path, "must be finite"))
    }
}

fn non_negative(path: &str, value: f32) -> Result<(), TuningError> {
    finite(path, value)?;
    if value < 0.0 {
        return Err(invalid(path, "must not be negative"));
    }
    Ok(())
}

fn positive(path: &str, value: f32) -> Result<(), TuningError> {
    finite(path, value)?;
    if value <= 0.0 {
        return Err(invalid(path, "must be greater than zero"));
    }
    Ok(())
}

fn finite_vec(path: &str, value: Vec3) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(path, "must be finite"))
    }
}

fn positive_vec(path: &str, value: Vec3) -> Result<(), TuningError> {
    finite_vec(path, value)?;
    if value.cmple(Vec3::ZERO).any() {
        return Err(invalid(path, "every component must be greater than zero"));
    }
    Ok(())
}
