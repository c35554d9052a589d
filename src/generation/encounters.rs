//! # Encounter Generation
//!
//! Floor-scaled weighted tables deciding which monsters spawn, and how many.
//!
//! A [`SpawnTable`] lists prefabs under the first floor they may appear on.
//! Entries unlock cumulatively as floors get deeper, and a later entry for a
//! prefab already listed replaces its weight. A [`StepTable`] maps floors to
//! a count cap the same way.

use crate::game::PrefabId;
use crate::{CairnError, CairnResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weighted prefab choices keyed by minimum floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnTable {
    /// `(minimum floor, prefab, weight)`, in ascending floor order
    entries: Vec<(u32, PrefabId, u32)>,
}

impl SpawnTable {
    /// Builds a table from `(minimum floor, prefab, weight)` entries.
    pub fn new(entries: &[(u32, PrefabId, u32)]) -> Self {
        let mut entries = entries.to_vec();
        entries.sort_by_key(|(floor, _, _)| *floor);
        Self { entries }
    }

    /// The effective weights on `floor`, in first-listed order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{monster_table, PrefabId};
    ///
    /// let table = monster_table();
    /// assert_eq!(table.weights_for(1), vec![(PrefabId::Orc, 80)]);
    /// assert_eq!(
    ///     table.weights_for(5),
    ///     vec![(PrefabId::Orc, 80), (PrefabId::Troll, 30)]
    /// );
    /// ```
    pub fn weights_for(&self, floor: u32) -> Vec<(PrefabId, u32)> {
        let mut weights: Vec<(PrefabId, u32)> = Vec::new();
        for (min_floor, prefab, weight) in &self.entries {
            if *min_floor > floor {
                break;
            }
            match weights.iter_mut().find(|(id, _)| id == prefab) {
                Some(existing) => existing.1 = *weight,
                None => weights.push((*prefab, *weight)),
            }
        }
        weights
    }

    /// Draws `count` prefabs with replacement.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        floor: u32,
        count: u32,
        rng: &mut R,
    ) -> CairnResult<Vec<PrefabId>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let weights = self.weights_for(floor);
        let distribution =
            WeightedIndex::new(weights.iter().map(|(_, weight)| *weight)).map_err(|error| {
                CairnError::GenerationFailed(format!(
                    "No spawn weights on floor {}: {}",
                    floor, error
                ))
            })?;
        Ok((0..count)
            .map(|_| weights[distribution.sample(rng)].0)
            .collect())
    }
}

/// A value that steps up at given floors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTable {
    /// `(minimum floor, value)`, in ascending floor order
    steps: Vec<(u32, u32)>,
}

impl StepTable {
    pub fn new(steps: &[(u32, u32)]) -> Self {
        let mut steps = steps.to_vec();
        steps.sort_by_key(|(floor, _)| *floor);
        Self { steps }
    }

    /// Value of the deepest step not below `floor`; 0 above the first step.
    pub fn value_for(&self, floor: u32) -> u32 {
        self.steps
            .iter()
            .take_while(|(min_floor, _)| *min_floor <= floor)
            .last()
            .map(|(_, value)| *value)
            .unwrap_or(0)
    }
}

/// Monster weights by floor.
pub fn monster_table() -> SpawnTable {
    SpawnTable::new(&[
        (0, PrefabId::Orc, 80),
        (3, PrefabId::Troll, 15),
        (5, PrefabId::Troll, 30),
        (7, PrefabId::Troll, 60),
    ])
}

/// Most monsters a single room can receive.
pub fn monsters_per_room() -> StepTable {
    StepTable::new(&[(1, 2), (4, 3), (6, 5)])
}

/// Monsters spawned on a whole cave floor.
pub fn monsters_per_floor() -> StepTable {
    StepTable::new(&[(1, 10), (4, 15), (6, 20)])
}
