//! Player movement integration.
//!
//! Blends velocity toward the input intent, applies friction on idle axes,
//! clamps speed and integrates position inside the realm bounds.

use glam::DVec2;

use arena_core::components::{Player, PlayerInput};
use arena_core::constants::*;
use arena_core::types::{Position, Velocity};

use crate::registry::Registry;

/// Integrate every connected player by one step.
pub fn run(registry: &mut Registry, now: f64, dt: f64) {
    let bounds: Vec<(String, f64, f64)> = registry
        .realms()
        .iter()
        .map(|r| (r.name.clone(), r.half_width(), r.half_height()))
        .collect();

    for (_entity, (player, pos, vel)) in registry
        .world
        .query_mut::<(&mut Player, &mut Position, &mut Velocity)>()
    {
        if now - player.input.updated_at > STALE_INPUT_SECS {
            neutralize(&mut player.input);
        }

        let (hw, hh) = bounds
            .iter()
            .find(|(name, _, _)| *name == player.realm)
            .map(|(_, hw, hh)| (*hw, *hh))
            .unwrap_or((REALM_WIDTH / 2.0, REALM_HEIGHT / 2.0));

        *vel = step_velocity(*vel, &player.input);
        integrate(pos, vel, dt, hw, hh);
    }
}

/// Clear directional intent, keeping aim.
fn neutralize(input: &mut PlayerInput) {
    input.up = false;
    input.down = false;
    input.left = false;
    input.right = false;
}

/// Target velocity for an intent: MAX_SPEED along the pressed direction,
/// diagonals normalised.
pub fn target_velocity(input: &PlayerInput) -> Velocity {
    let dir = DVec2::new(axis(input.left, input.right), axis(input.up, input.down));
    Velocity::from_dvec2(dir.normalize_or_zero() * MAX_SPEED)
}

/// One velocity update: lerp on driven axes, friction on idle ones.
pub fn step_velocity(current: Velocity, input: &PlayerInput) -> Velocity {
    let target = target_velocity(input);
    let x_driven = axis(input.left, input.right) != 0.0;
    let y_driven = axis(input.up, input.down) != 0.0;

    let mut next = Velocity::new(
        blend(current.x, target.x, x_driven),
        blend(current.y, target.y, y_driven),
    );

    if next.x.abs() < VELOCITY_EPSILON {
        next.x = 0.0;
    }
    if next.y.abs() < VELOCITY_EPSILON {
        next.y = 0.0;
    }

    let speed = next.speed();
    if speed > MAX_SPEED {
        let scale = MAX_SPEED / speed;
        next.x *= scale;
        next.y *= scale;
    }
    next
}

fn blend(current: f64, target: f64, driven: bool) -> f64 {
    if driven {
        current + (target - current) * VELOCITY_LERP
    } else {
        current * FRICTION
    }
}

fn axis(negative: bool, positive: bool) -> f64 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Advance position and clamp it into the half-extent box. Velocity on a
/// clamped axis is zeroed.
pub fn integrate(pos: &mut Position, vel: &mut Velocity, dt: f64, half_width: f64, half_height: f64) {
    let dt = dt.max(0.0);
    let x = pos.x + vel.x * dt;
    let y = pos.y + vel.y * dt;
    pos.x = x.clamp(-half_width, half_width);
    pos.y = y.clamp(-half_height, half_height);
    if pos.x != x {
        vel.x = 0.0;
    }
    if pos.y != y {
        vel.y = 0.0;
    }
}
