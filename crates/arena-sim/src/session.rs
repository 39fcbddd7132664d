//! Session lifecycle: identity validation, player materialisation from
//! persisted records, teardown back into records, and portal travel.

use tracing::{debug, info, warn};

use arena_core::components::{Player, PlayerInput};
use arena_core::constants::*;
use arena_core::error::SessionError;
use arena_core::events::{Outbound, ServerEvent};
use arena_core::gear::Gear;
use arena_core::records::PlayerRecord;
use arena_core::state::{InitPayload, PhysicsConstants};
use arena_core::types::{Position, Velocity};

use crate::registry::Registry;

/// Validate and normalise a username supplied by the transport layer.
pub fn validate_username(raw: &str) -> Result<String, SessionError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SessionError::MissingIdentity);
    }
    if name.chars().count() > USERNAME_MAX_LEN || name.chars().any(char::is_control) {
        return Err(SessionError::InvalidIdentity);
    }
    Ok(name.to_string())
}

/// Materialise a player from a record (or the default record).
pub fn connect(
    registry: &mut Registry,
    username: &str,
    record: Option<PlayerRecord>,
    now: f64,
) -> Result<InitPayload, SessionError> {
    let username = validate_username(username)?;
    if registry.has_player(&username) {
        return Err(SessionError::AlreadyConnected(username));
    }

    let record = record.unwrap_or_else(|| PlayerRecord::default_for(&username));
    let realm = registry
        .realm_or_default(&record.realm)
        .cloned()
        .ok_or(SessionError::InvalidIdentity)?;
    if realm.name != record.realm {
        warn!(player = %username, realm = %record.realm, "unknown realm in record, using {}", realm.name);
    }

    let (gear, dropped) = Gear::from_persisted(&record.gear);
    if !dropped.is_empty() {
        warn!(player = %username, dropped = dropped.len(), "persisted inventory exceeded capacity");
    }

    let position = realm.clamp(Position::new(record.x, record.y));
    let player = Player {
        username: username.clone(),
        realm: realm.name.clone(),
        input: PlayerInput {
            updated_at: now,
            ..PlayerInput::default()
        },
        active_hotbar: 0,
        health: PLAYER_MAX_HEALTH,
        max_health: PLAYER_MAX_HEALTH,
        gear: gear.clone(),
    };
    registry.insert_player(player, position, now);
    info!(player = %username, realm = %realm.name, "player connected");

    Ok(InitPayload {
        username,
        realm: realm.name.clone(),
        position,
        physics: PhysicsConstants {
            max_speed: MAX_SPEED,
            velocity_lerp: VELOCITY_LERP,
            friction: FRICTION,
            tick_rate: TICK_RATE,
        },
        realm_size: (realm.width, realm.height),
        gear,
        realm_config: realm,
    })
}

/// Remove a player and return the record to persist.
pub fn disconnect(registry: &mut Registry, username: &str) -> Option<PlayerRecord> {
    let (player, position) = registry.remove_player(username)?;
    info!(player = %username, "player disconnected");
    Some(to_record(&player, position))
}

pub fn to_record(player: &Player, position: Position) -> PlayerRecord {
    PlayerRecord {
        username: player.username.clone(),
        x: position.x,
        y: position.y,
        realm: player.realm.clone(),
        gear: player.gear.to_persisted(),
    }
}

/// Records for every connected player, in name order.
pub fn records(registry: &Registry) -> Vec<PlayerRecord> {
    registry
        .players()
        .filter_map(|(_, entity)| {
            let player = registry.world.get::<&Player>(entity).ok()?;
            let position = *registry.world.get::<&Position>(entity).ok()?;
            Some(to_record(&player, position))
        })
        .collect()
}

/// Attempt portal transit. Returns whether the player moved.
pub fn travel(registry: &mut Registry, username: &str, events: &mut Vec<Outbound>) -> bool {
    let Some(entity) = registry.player(username) else {
        return false;
    };
    let (current, position) = {
        let Ok(player) = registry.world.get::<&Player>(entity) else {
            return false;
        };
        let Ok(position) = registry.world.get::<&Position>(entity) else {
            return false;
        };
        (player.realm.clone(), *position)
    };

    let Some(portal) = registry
        .realm(&current)
        .and_then(|r| r.portal_near(&position, PORTAL_USE_RADIUS))
        .cloned()
    else {
        debug!(player = username, "travel requested away from any portal");
        events.push(Outbound::error(username, "no portal in range"));
        return false;
    };
    let Some(destination) = registry.realm(&portal.to_realm).cloned() else {
        warn!(realm = %portal.to_realm, "portal leads to an unknown realm");
        return false;
    };

    let arrival = destination.clamp(Position::new(portal.to_x, portal.to_y));
    if let Ok((player, pos, vel)) = registry
        .world
        .query_one_mut::<(&mut Player, &mut Position, &mut Velocity)>(entity)
    {
        player.realm = destination.name.clone();
        *pos = arrival;
        *vel = Velocity::default();
    }
    registry.move_member(username, &current, &destination.name);

    info!(player = username, from = %current, to = %destination.name, "realm travel");
    events.push(Outbound::player(
        username,
        ServerEvent::RealmChanged {
            realm: destination.name,
            x: arrival.x,
            y: arrival.y,
        },
    ));
    true
}
