//! Per-drone AI memory: the current behavior with its timers, plus the
//! bookkeeping the FSM needs between evaluations.
//!
//! Flank sub-phases are an explicit nested enum rather than flags, so every
//! reachable state is a value of [`Behavior`].

use arena_core::enums::{FlankVariant, MobState};
use arena_core::types::Position;

/// One leg of a patrol: a fixed heading held until the distance is used up
/// or the decision time arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolLeg {
    /// Heading in radians.
    pub heading: f64,
    /// Distance left on this leg.
    pub remaining: f64,
    /// Sim time at which the next stop/turn decision is rolled.
    pub decide_at: f64,
}

/// Phases of the advanced flank.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvancedPhase {
    /// Back off briefly to re-evaluate.
    Assessment { until: f64 },
    /// Move to a point shielded by an ally.
    Cover { point: Position, until: f64 },
    /// Follow a curved path around the target.
    Swooping { path: Vec<Position>, next: usize },
}

/// Flank manoeuvre by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum FlankManeuver {
    /// Sidestep perpendicular to the target bearing until `until`.
    /// `side` is +1 or -1.
    Basic { side: f64, until: f64 },
    Advanced(AdvancedPhase),
}

impl FlankManeuver {
    pub fn variant(&self) -> FlankVariant {
        match self {
            FlankManeuver::Basic { .. } => FlankVariant::Basic,
            FlankManeuver::Advanced(_) => FlankVariant::Advanced,
        }
    }
}

/// Outer AI state with its per-state data.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Patrol(PatrolLeg),
    Idle { until: f64 },
    Chase,
    Attack,
    Retreat,
    Regroup { until: f64 },
    Flank {
        started_at: f64,
        maneuver: FlankManeuver,
    },
}

impl Behavior {
    pub fn state(&self) -> MobState {
        match self {
            Behavior::Patrol(_) => MobState::Patrol,
            Behavior::Idle { .. } => MobState::Idle,
            Behavior::Chase => MobState::Chase,
            Behavior::Attack => MobState::Attack,
            Behavior::Retreat => MobState::Retreat,
            Behavior::Regroup { .. } => MobState::Regroup,
            Behavior::Flank { .. } => MobState::Flank,
        }
    }
}

/// ECS component holding a drone's AI memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Brain {
    pub behavior: Behavior,
    pub last_shot_at: Option<f64>,
    /// Health ratio seen at the previous evaluation.
    pub prev_health_ratio: f64,
}

impl Brain {
    /// A fresh brain starting in `PATROL` on the given leg.
    pub fn new(leg: PatrolLeg) -> Self {
        Self {
            behavior: Behavior::Patrol(leg),
            last_shot_at: None,
            prev_health_ratio: 1.0,
        }
    }

    pub fn state(&self) -> MobState {
        self.behavior.state()
    }
}
