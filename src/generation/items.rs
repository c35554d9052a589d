//! # Item Generation
//!
//! Floor-scaled tables for the loot lying around each floor.

use crate::game::PrefabId;
use crate::generation::{SpawnTable, StepTable};

/// Item weights by floor.
pub fn item_table() -> SpawnTable {
    SpawnTable::new(&[
        (0, PrefabId::HealthPotion, 35),
        (0, PrefabId::ConfusionScroll, 10),
        (0, PrefabId::LightningScroll, 25),
        (0, PrefabId::Dagger, 25),
        (0, PrefabId::LeatherArmor, 20),
        (1, PrefabId::FireballScroll, 25),
    ])
}

/// Most items a single room can receive.
pub fn items_per_room() -> StepTable {
    StepTable::new(&[(1, 1), (4, 2)])
}

/// Items spawned on a whole cave floor.
pub fn items_per_floor() -> StepTable {
    StepTable::new(&[(1, 6), (4, 9)])
}
