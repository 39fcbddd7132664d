//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Realm ---

/// Default realm width in world units.
pub const REALM_WIDTH: f64 = 2000.0;

/// Default realm height in world units.
pub const REALM_HEIGHT: f64 = 2000.0;

/// Realm every new or unresolvable player lands in.
pub const DEFAULT_REALM: &str = "nexus";

/// Distance within which a travel request can use a portal.
pub const PORTAL_USE_RADIUS: f64 = 40.0;

// --- Player movement ---

/// Top player speed (units/s).
pub const MAX_SPEED: f64 = 450.0;

/// Fraction of the gap between current and target velocity closed per tick.
pub const VELOCITY_LERP: f64 = 0.18;

/// Multiplicative per-tick decay on axes with no active input.
pub const FRICTION: f64 = 0.92;

/// Velocity components below this magnitude are zeroed (units/s).
pub const VELOCITY_EPSILON: f64 = 1.0;

/// Input older than this is forced to neutral before integration.
pub const STALE_INPUT_SECS: f64 = 1.0;

// --- Player state ---

pub const PLAYER_MAX_HEALTH: f64 = 100.0;

/// Number of hotbar slots.
pub const HOTBAR_SLOTS: usize = 4;

/// Inventory slots without a backpack.
pub const BASE_INVENTORY_CAPACITY: usize = 4;

/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 32;

// --- Energy ---

pub const PLAYER_MAX_ENERGY: f64 = 1.0;

/// Energy regenerated per second while not firing.
pub const ENERGY_REGEN_PER_SEC: f64 = 0.25;

/// Regeneration is applied in quanta of this many seconds.
pub const ENERGY_REGEN_STEP_SECS: f64 = 0.1;

/// Interval between energy status events per player.
pub const ENERGY_STATUS_INTERVAL_SECS: f64 = 0.1;

// --- Weapons ---

/// Delay between consecutive shots of a burst.
pub const BURST_SHOT_DELAY_SECS: f64 = 0.09;

/// Fastest allowed automatic fire interval.
pub const MIN_AUTO_FIRE_INTERVAL_SECS: f64 = 0.05;

// --- Projectiles ---

/// Lifetime of every projectile.
pub const PROJECTILE_LIFETIME_SECS: f64 = 1.5;

/// Circular hit radius used for projectile collision.
pub const PROJECTILE_HIT_RADIUS: f64 = 24.0;

// --- Drone AI ---

/// Patrol decision interval bounds (seconds).
pub const PATROL_DECISION_MIN_SECS: f64 = 3.0;
pub const PATROL_DECISION_MAX_SECS: f64 = 7.0;

/// Idle duration bounds (seconds).
pub const IDLE_MIN_SECS: f64 = 2.0;
pub const IDLE_MAX_SECS: f64 = 5.0;

/// Patrol leg length bounds (units).
pub const PATROL_LEG_MIN: f64 = 200.0;
pub const PATROL_LEG_MAX: f64 = 400.0;

/// Patrolling drones farther than this from their spawner head home.
pub const PATROL_LEASH: f64 = 500.0;

/// Per-tick velocity decay while idle or regrouping.
pub const DRONE_IDLE_DECAY: f64 = 0.85;

/// Chase is abandoned beyond this multiple of detection range.
pub const LOSE_TARGET_RANGE_FACTOR: f64 = 1.5;

/// Retreat ends beyond this multiple of detection range.
pub const RETREAT_ESCAPE_RANGE_FACTOR: f64 = 0.8;

/// Fixed recovery timer entered after a retreat.
pub const REGROUP_DURATION_SECS: f64 = 4.0;

/// Fraction of max health recovered per second while regrouping.
pub const REGROUP_HEAL_PER_SEC: f64 = 0.05;

/// Hard upper bound on any flank manoeuvre.
pub const FLANK_TIMEOUT_SECS: f64 = 6.0;

/// Basic flank duration bounds (seconds).
pub const BASIC_FLANK_MIN_SECS: f64 = 1.0;
pub const BASIC_FLANK_MAX_SECS: f64 = 2.5;

/// Minimum intelligence for the advanced flank variant.
pub const ADVANCED_FLANK_INTELLIGENCE: f64 = 0.6;

/// Advanced flank: assessment (back-off) duration.
pub const FLANK_ASSESS_SECS: f64 = 0.6;

/// Advanced flank: longest time spent moving to cover.
pub const FLANK_COVER_MAX_SECS: f64 = 2.0;

/// Advanced flank: distance behind the shielding ally.
pub const FLANK_COVER_OFFSET: f64 = 60.0;

/// Advanced flank: allies farther than this are not considered for cover.
pub const FLANK_ALLY_SEARCH_RADIUS: f64 = 400.0;

/// Arrival radius for cover points and swoop waypoints.
pub const FLANK_ARRIVE_RADIUS: f64 = 25.0;

/// Number of waypoints in a swooping path.
pub const SWOOP_WAYPOINTS: usize = 6;

/// Angular sweep of a swooping path around the target (radians).
pub const SWOOP_ARC: f64 = std::f64::consts::PI;

/// Swoop radius as a fraction of attack range.
pub const SWOOP_RADIUS_FACTOR: f64 = 0.8;

// --- Persistence ---

/// Periodic save interval for connected players.
pub const SAVE_INTERVAL_SECS: u64 = 30;
