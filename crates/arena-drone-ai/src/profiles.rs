//! Tier-specific behavioral profiles.
//!
//! Consolidates per-tier combat parameters for the drone FSM.

use rand::Rng;

use arena_core::components::Personality;
use arena_core::enums::DroneType;

/// Behavioral profile for a drone tier.
pub struct DroneProfile {
    pub max_health: f64,
    /// Cruise speed (units/s).
    pub speed: f64,
    /// Range at which players are noticed.
    pub detection_range: f64,
    /// Range at which the drone stops and shoots.
    pub attack_range: f64,
    /// Seconds between shots.
    pub attack_cooldown_secs: f64,
    pub projectile_speed: f64,
    pub projectile_damage: f64,
    /// Health ratio at or below which the drone retreats. None = never.
    pub retreat_threshold: Option<f64>,
    /// Health ratio at or below which the drone regroups. None = never.
    pub regroup_threshold: Option<f64>,
    /// Speed multiplier while retreating or swooping. None = no boost.
    pub boost_multiplier: Option<f64>,
    /// Chance per shot of breaking into a flank.
    pub flank_chance: f64,
    /// Range personality traits are rolled from.
    pub personality_range: (f64, f64),
}

impl DroneProfile {
    /// Speed with boost applied, if the tier has one.
    pub fn boosted_speed(&self) -> f64 {
        self.speed * self.boost_multiplier.unwrap_or(1.0)
    }
}

/// Get the behavioral profile for a given tier.
pub fn get_profile(drone_type: DroneType) -> DroneProfile {
    match drone_type {
        DroneType::L1 => DroneProfile {
            max_health: 30.0,
            speed: 120.0,
            detection_range: 300.0,
            attack_range: 180.0,
            attack_cooldown_secs: 1.5,
            projectile_speed: 350.0,
            projectile_damage: 5.0,
            retreat_threshold: None,
            regroup_threshold: None,
            boost_multiplier: None,
            flank_chance: 0.0,
            personality_range: (0.1, 0.5),
        },
        DroneType::L2 => DroneProfile {
            max_health: 60.0,
            speed: 140.0,
            detection_range: 400.0,
            attack_range: 220.0,
            attack_cooldown_secs: 1.2,
            projectile_speed: 400.0,
            projectile_damage: 8.0,
            retreat_threshold: Some(0.2),
            regroup_threshold: Some(0.4),
            boost_multiplier: None,
            flank_chance: 0.0,
            personality_range: (0.3, 0.7),
        },
        DroneType::L3 => DroneProfile {
            max_health: 120.0,
            speed: 160.0,
            detection_range: 500.0,
            attack_range: 260.0,
            attack_cooldown_secs: 1.0,
            projectile_speed: 450.0,
            projectile_damage: 12.0,
            retreat_threshold: Some(0.15),
            regroup_threshold: Some(0.35),
            boost_multiplier: Some(1.6),
            flank_chance: 0.3,
            personality_range: (0.4, 1.0),
        },
    }
}

/// Roll a personality within the tier's trait range.
pub fn roll_personality<R: Rng + ?Sized>(drone_type: DroneType, rng: &mut R) -> Personality {
    let (lo, hi) = get_profile(drone_type).personality_range;
    let mut trait_value = || rng.gen_range(lo..=hi);
    Personality {
        courage: trait_value(),
        aggression: trait_value(),
        caution: trait_value(),
        intelligence: trait_value(),
        teamwork: trait_value(),
    }
}
