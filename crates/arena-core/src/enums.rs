//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Drone AI state as seen by clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MobState {
    #[default]
    Patrol,
    Idle,
    Chase,
    Attack,
    Retreat,
    Regroup,
    Flank,
}

/// Drone tier. Ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DroneType {
    #[serde(rename = "drone_l1")]
    L1,
    #[serde(rename = "drone_l2")]
    L2,
    #[serde(rename = "drone_l3")]
    L3,
}

impl DroneType {
    pub const ALL: [DroneType; 3] = [DroneType::L1, DroneType::L2, DroneType::L3];

    /// Wire name, e.g. `drone_l1`.
    pub fn as_str(self) -> &'static str {
        match self {
            DroneType::L1 => "drone_l1",
            DroneType::L2 => "drone_l2",
            DroneType::L3 => "drone_l3",
        }
    }
}

/// Flank manoeuvre sophistication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlankVariant {
    /// Sidestep perpendicular to the target bearing.
    Basic,
    /// Assessment, cover, then a curved swoop around the target.
    Advanced,
}

/// Slot type declared by an item definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotType {
    Weapon,
    Head,
    Chest,
    Boots,
    ShoulderLeft,
    ShoulderRight,
    Backpack,
}

/// Named equipment slot on a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipSlot {
    Head,
    Chest,
    Boots,
    ShoulderLeft,
    ShoulderRight,
    Backpack,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 6] = [
        EquipSlot::Head,
        EquipSlot::Chest,
        EquipSlot::Boots,
        EquipSlot::ShoulderLeft,
        EquipSlot::ShoulderRight,
        EquipSlot::Backpack,
    ];

    /// Whether an item of `slot_type` may occupy this slot.
    pub fn accepts(self, slot_type: SlotType) -> bool {
        matches!(
            (self, slot_type),
            (EquipSlot::Head, SlotType::Head)
                | (EquipSlot::Chest, SlotType::Chest)
                | (EquipSlot::Boots, SlotType::Boots)
                | (EquipSlot::ShoulderLeft, SlotType::ShoulderLeft)
                | (EquipSlot::ShoulderRight, SlotType::ShoulderRight)
                | (EquipSlot::Backpack, SlotType::Backpack)
        )
    }
}

/// Spawner archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnerKind {
    Hive,
    Nest,
}

/// Kind of special area inside a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    /// Drones never acquire players standing here.
    SafeZone,
}
