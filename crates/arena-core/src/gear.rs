//! Player gear: inventory, hotbar and named equipment slots.
//!
//! The JSON shape matches what is persisted in player records:
//! `{"inventory": [null, {"id": "..."}], "hotbar": [...], "equipment": {"head": null, ...}}`.

use serde::{Deserialize, Serialize};

use crate::constants::{BASE_INVENTORY_CAPACITY, HOTBAR_SLOTS};
use crate::enums::EquipSlot;
use crate::items::{self, PISTOL_A, RIFLE_A};

/// Reference to an item definition held in a gear slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
}

impl ItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A single gear slot: empty or holding one item.
pub type Slot = Option<ItemRef>;

/// Named equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Equipment {
    pub head: Slot,
    pub chest: Slot,
    pub boots: Slot,
    pub shoulder_left: Slot,
    pub shoulder_right: Slot,
    pub backpack: Slot,
}

impl Equipment {
    pub fn slot(&self, slot: EquipSlot) -> &Slot {
        match slot {
            EquipSlot::Head => &self.head,
            EquipSlot::Chest => &self.chest,
            EquipSlot::Boots => &self.boots,
            EquipSlot::ShoulderLeft => &self.shoulder_left,
            EquipSlot::ShoulderRight => &self.shoulder_right,
            EquipSlot::Backpack => &self.backpack,
        }
    }

    pub fn slot_mut(&mut self, slot: EquipSlot) -> &mut Slot {
        match slot {
            EquipSlot::Head => &mut self.head,
            EquipSlot::Chest => &mut self.chest,
            EquipSlot::Boots => &mut self.boots,
            EquipSlot::ShoulderLeft => &mut self.shoulder_left,
            EquipSlot::ShoulderRight => &mut self.shoulder_right,
            EquipSlot::Backpack => &mut self.backpack,
        }
    }
}

/// Source or destination of a gear move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GearRef {
    Inventory { index: usize },
    Hotbar { index: usize },
    Equipment { slot: EquipSlot },
}

impl GearRef {
    pub fn equip_slot(&self) -> Option<EquipSlot> {
        match self {
            GearRef::Equipment { slot } => Some(*slot),
            _ => None,
        }
    }
}

/// A player's complete gear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    /// Length always equals [`Gear::capacity`].
    pub inventory: Vec<Slot>,
    pub hotbar: [Slot; HOTBAR_SLOTS],
    pub equipment: Equipment,
}

/// Lenient persisted form; every field may be missing or short.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGear {
    inventory: Vec<Slot>,
    hotbar: Vec<Slot>,
    equipment: Equipment,
}

impl Default for Gear {
    fn default() -> Self {
        Self {
            inventory: vec![None; BASE_INVENTORY_CAPACITY],
            hotbar: Default::default(),
            equipment: Equipment::default(),
        }
    }
}

impl Gear {
    /// Fixed loadout handed to players with no persisted record.
    pub fn starter() -> Self {
        Self {
            inventory: vec![None, Some(ItemRef::new(PISTOL_A)), None, None],
            hotbar: [
                Some(ItemRef::new(PISTOL_A)),
                Some(ItemRef::new(RIFLE_A)),
                None,
                None,
            ],
            equipment: Equipment::default(),
        }
    }

    /// Inventory capacity implied by the equipped backpack.
    pub fn capacity(&self) -> usize {
        capacity_for(&self.equipment)
    }

    pub fn get(&self, r: GearRef) -> Option<&Slot> {
        match r {
            GearRef::Inventory { index } => self.inventory.get(index),
            GearRef::Hotbar { index } => self.hotbar.get(index),
            GearRef::Equipment { slot } => Some(self.equipment.slot(slot)),
        }
    }

    pub fn get_mut(&mut self, r: GearRef) -> Option<&mut Slot> {
        match r {
            GearRef::Inventory { index } => self.inventory.get_mut(index),
            GearRef::Hotbar { index } => self.hotbar.get_mut(index),
            GearRef::Equipment { slot } => Some(self.equipment.slot_mut(slot)),
        }
    }

    /// Grow with empty slots or truncate from the end to `capacity`.
    pub fn resize_inventory(&mut self, capacity: usize) {
        self.inventory.resize(capacity, None);
    }

    /// Parse persisted gear JSON, tolerating missing or malformed data.
    ///
    /// Returns the normalised gear and any items that did not fit.
    pub fn from_persisted(json: &str) -> (Gear, Vec<ItemRef>) {
        let raw: RawGear = serde_json::from_str(json).unwrap_or_default();
        Self::normalize(raw)
    }

    fn normalize(raw: RawGear) -> (Gear, Vec<ItemRef>) {
        let mut hotbar: [Slot; HOTBAR_SLOTS] = Default::default();
        for (slot, item) in hotbar.iter_mut().zip(raw.hotbar) {
            *slot = item;
        }

        let capacity = capacity_for(&raw.equipment);
        let mut inventory = raw.inventory;
        let mut dropped = Vec::new();
        if inventory.len() > capacity {
            let overflow: Vec<ItemRef> = inventory.drain(capacity..).flatten().collect();
            for item in overflow {
                match inventory.iter_mut().find(|slot| slot.is_none()) {
                    Some(free) => *free = Some(item),
                    None => dropped.push(item),
                }
            }
        }
        inventory.resize(capacity, None);

        (
            Gear {
                inventory,
                hotbar,
                equipment: raw.equipment,
            },
            dropped,
        )
    }

    /// Serialise for persistence.
    pub fn to_persisted(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Capacity for a given equipment set. Unknown backpack ids add nothing.
pub fn capacity_for(equipment: &Equipment) -> usize {
    let bonus = equipment
        .backpack
        .as_ref()
        .and_then(|item| items::item(&item.id))
        .map_or(0, |def| def.capacity_bonus);
    BASE_INVENTORY_CAPACITY + bonus
}
