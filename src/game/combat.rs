//! # Combat Resolver
//!
//! Pure melee outcome computation.
//!
//! [`resolve_melee`] reads attacker and defender stats and a source of dice
//! and returns what happened. It never touches hit points; applying damage
//! and triggering death belongs to the action layer.
//!
//! Rolls are drawn in a fixed order: to-hit percentile, damage spread,
//! strength contest, critical percentile. Misses stop after the first roll.

use crate::game::Actor;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Base miss chance (in percent) before modifiers.
pub const BASE_MISS_CHANCE_MELEE: f64 = 8.0;

/// Percentile a critical roll must exceed.
pub const CRITICAL_THRESHOLD: i32 = 90;

/// The three shapes of a melee result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackOutcome {
    Miss,
    Hit,
    Critical,
}

/// Outcome plus non-negative damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub outcome: AttackOutcome,
    pub damage: i32,
}

/// Source of the random draws melee needs.
pub trait MeleeDice {
    /// Uniform integer in `0..=100`.
    fn percentile(&mut self) -> i32;
    /// Uniform integer in `-spread..=spread`.
    fn spread(&mut self, spread: i32) -> i32;
    /// Uniform integer in `0..=20`.
    fn contest(&mut self) -> i32;
}

/// Dice backed by any [`Rng`].
pub struct RngDice<'a, R: Rng + ?Sized>(pub &'a mut R);

impl<R: Rng + ?Sized> MeleeDice for RngDice<'_, R> {
    fn percentile(&mut self) -> i32 {
        self.0.gen_range(0..=100)
    }

    fn spread(&mut self, spread: i32) -> i32 {
        let spread = spread.abs();
        self.0.gen_range(-spread..=spread)
    }

    fn contest(&mut self) -> i32 {
        self.0.gen_range(0..=20)
    }
}

/// Dice that replay predetermined values, for fixtures and replays.
///
/// Exhausted queues fall back to the least eventful value: a percentile of 0
/// (miss, no critical), a spread of 0 and a contest of 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    percentiles: VecDeque<i32>,
    spreads: VecDeque<i32>,
    contests: VecDeque<i32>,
}

impl ScriptedDice {
    pub fn new(percentiles: &[i32], spreads: &[i32], contests: &[i32]) -> Self {
        Self {
            percentiles: percentiles.iter().copied().collect(),
            spreads: spreads.iter().copied().collect(),
            contests: contests.iter().copied().collect(),
        }
    }
}

impl MeleeDice for ScriptedDice {
    fn percentile(&mut self) -> i32 {
        self.percentiles.pop_front().unwrap_or(0)
    }

    fn spread(&mut self, spread: i32) -> i32 {
        self.spreads
            .pop_front()
            .unwrap_or(0)
            .clamp(-spread.abs(), spread.abs())
    }

    fn contest(&mut self) -> i32 {
        self.contests.pop_front().unwrap_or(0)
    }
}

/// Rounds half to even, matching the reference damage tables.
fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}

/// Percent chance that `attacker` misses `defender`.
pub fn chance_to_miss(attacker: &Actor, defender: &Actor) -> i32 {
    let defender_modifier = 0.50 * defender.fighting() as f64
        + (0.33 + 0.03 * defender.shielding() as f64) * defender.defense() as f64
        + defender.evasion() as f64;
    let attacker_modifier = (attacker.fighting() + attacker.accuracy()) as f64;
    round_half_even(BASE_MISS_CHANCE_MELEE + defender_modifier - attacker_modifier)
}

/// Resolves one melee attack.
///
/// # Examples
///
/// ```
/// use cairn::{resolve_melee, Actor, AttackOutcome, Fighter, ScriptedDice};
///
/// let attacker = Actor::new(Fighter::new(30, 0, 5));
/// let defender = Actor::new(Fighter::new(10, 0, 3));
///
/// // Hit roll 50, spread 0, contest 0, no critical.
/// let mut dice = ScriptedDice::new(&[50, 10], &[0], &[0]);
/// let result = resolve_melee(&attacker, &defender, &mut dice);
/// assert_eq!(result.outcome, AttackOutcome::Hit);
/// assert_eq!(result.damage, 4);
/// ```
pub fn resolve_melee<D: MeleeDice + ?Sized>(attacker: &Actor, defender: &Actor, dice: &mut D) -> AttackResult {
    if dice.percentile() <= chance_to_miss(attacker, defender) {
        return AttackResult {
            outcome: AttackOutcome::Miss,
            damage: 0,
        };
    }

    let attacker_power = attacker.power();
    let spread = attacker_power.div_euclid(3);
    let power = attacker_power as f64 * (0.80 + 0.05 * attacker.fighting() as f64);
    let raw_damage = power + dice.spread(spread) as f64;

    let armor = defender.armor() as f64;
    let shielding = defender.shielding() as f64;
    let armor_reduction = if dice.contest() + defender.fighting() > 2 * attacker_power {
        0.60 * armor + 0.03 * shielding
    } else {
        0.35 * armor + 0.03 * shielding
    };

    let damage = round_half_even(raw_damage - armor_reduction).max(0);

    if dice.percentile() > CRITICAL_THRESHOLD {
        AttackResult {
            outcome: AttackOutcome::Critical,
            damage: damage * 2,
        }
    } else {
        AttackResult {
            outcome: AttackOutcome::Hit,
            damage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{seeded_rng, Fighter, Skills};

    fn attacker() -> Actor {
        Actor::new(Fighter::new(30, 0, 5))
    }

    fn defender() -> Actor {
        Actor::new(Fighter::new(10, 0, 3))
    }

    #[test]
    fn test_forced_miss() {
        let mut dice = ScriptedDice::new(&[8], &[], &[]);
        let result = resolve_melee(&attacker(), &defender(), &mut dice);
        assert_eq!(result.outcome, AttackOutcome::Miss);
        assert_eq!(result.damage, 0);
    }

    #[test]
    fn test_plain_hit_matches_formula() {
        let mut dice = ScriptedDice::new(&[9, 90], &[0], &[0]);
        let result = resolve_melee(&attacker(), &defender(), &mut dice);
        assert_eq!(result, AttackResult { outcome: AttackOutcome::Hit, damage: 4 });
    }

    #[test]
    fn test_critical_doubles_hit_damage() {
        let mut dice = ScriptedDice::new(&[50, 91], &[0], &[0]);
        let result = resolve_melee(&attacker(), &defender(), &mut dice);
        assert_eq!(result, AttackResult { outcome: AttackOutcome::Critical, damage: 8 });
    }

    #[test]
    fn test_zero_damage_critical_still_reported() {
        let weak = Actor::new(Fighter::new(5, 0, 0));
        let mut dice = ScriptedDice::new(&[50, 100], &[0], &[0]);
        let result = resolve_melee(&weak, &defender(), &mut dice);
        assert_eq!(result, AttackResult { outcome: AttackOutcome::Critical, damage: 0 });
    }

    #[test]
    fn test_armor_never_produces_negative_damage() {
        let tank = Actor::new(Fighter::new(10, 0, 3).with_armor(40));
        let mut dice = ScriptedDice::new(&[50, 0], &[-1], &[20]);
        let result = resolve_melee(&attacker(), &tank, &mut dice);
        assert_eq!(result.outcome, AttackOutcome::Hit);
        assert_eq!(result.damage, 0);
    }

    #[test]
    fn test_strong_defender_branch() {
        // power 5 * 0.8 = 4, spread +1 => 5. Contest 20 > 10: 0.60 * 5 = 3 => 2.
        let armored = Actor::new(Fighter::new(10, 0, 3).with_armor(5));
        let mut dice = ScriptedDice::new(&[50, 0], &[1], &[20]);
        assert_eq!(resolve_melee(&attacker(), &armored, &mut dice).damage, 2);

        // Contest 0: 0.35 * 5 = 1.75 => 5 - 1.75 = 3.25 => 3.
        let mut dice = ScriptedDice::new(&[50, 0], &[1], &[0]);
        assert_eq!(resolve_melee(&attacker(), &armored, &mut dice).damage, 3);
    }

    #[test]
    fn test_miss_chance_modifiers() {
        let mut skilled = attacker();
        skilled.skills = Skills {
            fighting: 2,
            ..Skills::default()
        };
        skilled.fighter.base_accuracy = 1;
        let sturdy = Actor::new(Fighter::new(10, 3, 3).with_evasion(2));
        // 8 + (0.99 + 2) - 3 = 7.99
        assert_eq!(chance_to_miss(&skilled, &sturdy), 8);
        assert_eq!(chance_to_miss(&attacker(), &defender()), 8);
    }

    #[test]
    fn test_half_even_rounding() {
        assert_eq!(round_half_even(2.5), 2);
        assert_eq!(round_half_even(3.5), 4);
        assert_eq!(round_half_even(-0.5), 0);
    }

    #[test]
    fn test_rng_dice_ranges() {
        let mut rng = seeded_rng(3);
        let mut dice = RngDice(&mut rng);
        for _ in 0..500 {
            assert!((0..=100).contains(&dice.percentile()));
            assert!((-2..=2).contains(&dice.spread(2)));
            assert!((0..=20).contains(&dice.contest()));
        }
    }
}
