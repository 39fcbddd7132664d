//! Authoritative gear moves between inventory, hotbar and equipment.
//!
//! A move swaps the contents of two slots. It is validated in full against a
//! scratch copy and only committed when every check passes, so a rejected
//! move never leaves a partial mutation.

use arena_core::enums::EquipSlot;
use arena_core::error::GearError;
use arena_core::gear::{Gear, GearRef, Slot};
use arena_core::items;

/// Swap the contents of `from` and `to`.
pub fn apply_move(gear: &mut Gear, from: GearRef, to: GearRef) -> Result<(), GearError> {
    let source = gear.get(from).ok_or(GearError::BadRef)?.clone();
    let dest = gear.get(to).ok_or(GearError::BadRef)?.clone();
    if from == to {
        return Ok(());
    }

    // Each item lands where the other one was.
    check_fits(&source, to)?;
    check_fits(&dest, from)?;

    let mut next = gear.clone();
    *next.get_mut(from).ok_or(GearError::BadRef)? = dest;
    *next.get_mut(to).ok_or(GearError::BadRef)? = source;

    let touches_backpack = [from, to]
        .iter()
        .any(|r| r.equip_slot() == Some(EquipSlot::Backpack));
    if touches_backpack {
        let capacity = next.capacity();
        if next.inventory.iter().skip(capacity).any(Option::is_some) {
            return Err(GearError::WouldDiscardItems);
        }
        next.resize_inventory(capacity);
    }

    *gear = next;
    Ok(())
}

/// An item may enter an equipment slot only if its declared slot type matches.
fn check_fits(item: &Slot, into: GearRef) -> Result<(), GearError> {
    let (Some(item), Some(slot)) = (item, into.equip_slot()) else {
        return Ok(());
    };
    let def = items::item(&item.id).ok_or(GearError::UnknownItem)?;
    if slot.accepts(def.slot_type) {
        Ok(())
    } else {
        Err(GearError::InvalidSlot)
    }
}
