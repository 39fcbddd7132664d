//! Static item definitions.
//!
//! Items are immutable process-wide data keyed by id. Player gear refers to
//! them by id only; lookups from runtime input return `Option`.

use crate::constants::MIN_AUTO_FIRE_INTERVAL_SECS;
use crate::enums::SlotType;

/// How a weapon's per-shot energy cost is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyCost {
    /// Fixed amount of energy.
    Flat(f64),
    /// Fraction of the shooter's maximum energy.
    FractionOfMax(f64),
}

impl EnergyCost {
    pub fn resolve(self, max_energy: f64) -> f64 {
        match self {
            EnergyCost::Flat(amount) => amount,
            EnergyCost::FractionOfMax(fraction) => fraction * max_energy,
        }
    }
}

/// Firing parameters of a weapon item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Projectile speed (units/s).
    pub projectile_speed: f64,
    /// Damage applied per hit.
    pub damage: f64,
    /// Rate of fire (shots per second for automatic weapons, bursts per second otherwise).
    pub rate_of_fire: f64,
    pub cost: EnergyCost,
    /// Shots per trigger pull for non-automatic weapons.
    pub burst_shots: u32,
    /// Fires continuously while the trigger is held.
    pub automatic: bool,
    /// Minimum pause after a burst completes (seconds).
    pub cooldown_secs: f64,
}

impl WeaponStats {
    /// Interval between automatic shots.
    pub fn auto_interval_secs(&self) -> f64 {
        (1.0 / self.rate_of_fire.max(f64::EPSILON)).max(MIN_AUTO_FIRE_INTERVAL_SECS)
    }

    /// Cooldown window applied once a burst is spent.
    pub fn burst_cooldown_secs(&self) -> f64 {
        self.cooldown_secs
            .max(1.0 / self.rate_of_fire.max(f64::EPSILON))
    }
}

/// Immutable item definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub slot_type: SlotType,
    /// Extra inventory slots granted while equipped as a backpack.
    pub capacity_bonus: usize,
    pub weapon: Option<WeaponStats>,
}

pub const PISTOL_A: &str = "item_pistol_a";
pub const RIFLE_A: &str = "item_rifle_a";
pub const BACKPACK_TIER1: &str = "item_backpack_tier1";

const fn armor(id: &'static str, name: &'static str, slot_type: SlotType) -> ItemDef {
    ItemDef {
        id,
        name,
        slot_type,
        capacity_bonus: 0,
        weapon: None,
    }
}

static ITEMS: [ItemDef; 8] = [
    ItemDef {
        id: PISTOL_A,
        name: "Pistol A",
        slot_type: SlotType::Weapon,
        capacity_bonus: 0,
        weapon: Some(WeaponStats {
            projectile_speed: 600.0,
            damage: 10.0,
            rate_of_fire: 3.0,
            cost: EnergyCost::FractionOfMax(0.33),
            burst_shots: 3,
            automatic: false,
            cooldown_secs: 1.0,
        }),
    },
    ItemDef {
        id: RIFLE_A,
        name: "Rifle A",
        slot_type: SlotType::Weapon,
        capacity_bonus: 0,
        weapon: Some(WeaponStats {
            projectile_speed: 800.0,
            damage: 6.0,
            rate_of_fire: 10.0,
            cost: EnergyCost::Flat(0.05),
            burst_shots: 1,
            automatic: true,
            cooldown_secs: 0.0,
        }),
    },
    ItemDef {
        id: BACKPACK_TIER1,
        name: "Backpack T1",
        slot_type: SlotType::Backpack,
        capacity_bonus: 4,
        weapon: None,
    },
    armor("item_helmet_basic", "Helmet", SlotType::Head),
    armor("item_suit_basic", "Suit", SlotType::Chest),
    armor("item_boots_basic", "Boots", SlotType::Boots),
    armor("item_pauldron_left", "Left Pauldron", SlotType::ShoulderLeft),
    armor("item_pauldron_right", "Right Pauldron", SlotType::ShoulderRight),
];

/// Look up an item definition by id.
pub fn item(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|def| def.id == id)
}

/// All item definitions.
pub fn all_items() -> &'static [ItemDef] {
    &ITEMS
}
