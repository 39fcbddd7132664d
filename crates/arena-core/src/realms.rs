//! Realm definitions: named world partitions with bounds, portals and special areas.

use serde::{Deserialize, Serialize};

use crate::constants::{REALM_HEIGHT, REALM_WIDTH};
use crate::enums::AreaKind;
use crate::types::Position;

/// A one-way link from a point in one realm to a point in another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub x: f64,
    pub y: f64,
    pub to_realm: String,
    pub to_x: f64,
    pub to_y: f64,
}

/// Feature switches for a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmFeatures {
    /// Spawners and drones are active.
    pub drones: bool,
    /// Player projectiles may hit other players.
    pub pvp: bool,
}

/// A circular area with special rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialArea {
    pub kind: AreaKind,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Static configuration of a realm, sent to clients on connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmConfig {
    pub name: String,
    pub width: f64,
    pub height: f64,
    /// Where respawned players appear.
    pub spawn: Position,
    pub features: RealmFeatures,
    pub special_areas: Vec<SpecialArea>,
    pub portals: Vec<Portal>,
}

impl RealmConfig {
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Whether a point lies inside the realm's bounding box.
    pub fn contains(&self, pos: &Position) -> bool {
        pos.within_half_extents(self.half_width(), self.half_height())
    }

    /// Clamp a point into the realm's bounding box.
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(-self.half_width(), self.half_width()),
            pos.y.clamp(-self.half_height(), self.half_height()),
        )
    }

    /// Whether a point lies inside any safe zone.
    pub fn in_safe_zone(&self, pos: &Position) -> bool {
        self.special_areas.iter().any(|area| {
            area.kind == AreaKind::SafeZone
                && Position::new(area.x, area.y).distance_to(pos) <= area.radius
        })
    }

    /// First portal within `radius` of `pos`.
    pub fn portal_near(&self, pos: &Position, radius: f64) -> Option<&Portal> {
        self.portals
            .iter()
            .find(|p| Position::new(p.x, p.y).distance_to(pos) <= radius)
    }
}

/// The built-in realms.
pub fn builtin_realms() -> Vec<RealmConfig> {
    vec![
        RealmConfig {
            name: "nexus".into(),
            width: REALM_WIDTH,
            height: REALM_HEIGHT,
            spawn: Position::default(),
            features: RealmFeatures {
                drones: true,
                pvp: false,
            },
            special_areas: vec![SpecialArea {
                kind: AreaKind::SafeZone,
                x: 0.0,
                y: 0.0,
                radius: 150.0,
            }],
            portals: vec![Portal {
                x: 300.0,
                y: 300.0,
                to_realm: "range".into(),
                to_x: 300.0,
                to_y: 300.0,
            }],
        },
        RealmConfig {
            name: "range".into(),
            width: REALM_WIDTH,
            height: REALM_HEIGHT,
            spawn: Position::default(),
            features: RealmFeatures {
                drones: false,
                pvp: false,
            },
            special_areas: Vec::new(),
            portals: vec![Portal {
                x: 300.0,
                y: 300.0,
                to_realm: "nexus".into(),
                to_x: 300.0,
                to_y: 300.0,
            }],
        },
    ]
}
