//! # AI Behaviors
//!
//! Per-actor decision procedures run by the scheduler.
//!
//! An AI never mutates the world itself. It inspects the map, updates its
//! own memory (path, last known player position, confusion counter) and
//! returns the [`ConcreteAction`] to perform, or asks to be replaced by the
//! behaviour it displaced.

use crate::game::{
    BumpAction, ConcreteAction, Direction, EntityId, GameMap, MeleeAction, MoveAction, Position,
    WaitAction,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Behaviour attached to a living actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ai {
    /// Controlled through player input, never by the scheduler
    Player,
    Hostile(HostileAi),
    Confused(ConfusedAi),
}

/// Chases and attacks the player, remembering where it was last seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileAi {
    /// Remaining steps of the current route, next step first
    pub path: Vec<Position>,
    /// Where the player was last seen
    pub examine_location: Option<Position>,
}

/// Stumbles randomly, then hands control back to `previous`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusedAi {
    pub previous: Box<Ai>,
    pub turns_remaining: u32,
}

/// What the scheduler should do with an actor this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AiStep {
    Act(ConcreteAction),
    /// Restore the behaviour that was active before confusion
    Revert,
}

/// Read-only view handed to an AI when it decides.
pub struct AiContext<'a> {
    pub actor: EntityId,
    pub position: Position,
    pub player_position: Position,
    pub map: &'a GameMap,
}

impl Ai {
    pub fn hostile() -> Self {
        Ai::Hostile(HostileAi::default())
    }

    /// Wraps `previous` in a confusion lasting `turns` turns.
    pub fn confused(previous: Ai, turns: u32) -> Self {
        Ai::Confused(ConfusedAi {
            previous: Box::new(previous),
            turns_remaining: turns,
        })
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Ai::Player)
    }

    /// The behaviour to restore once this one ends.
    pub fn into_previous(self) -> Option<Ai> {
        match self {
            Ai::Confused(confused) => Some(*confused.previous),
            _ => None,
        }
    }

    /// Chooses the next step for the actor described by `ctx`.
    pub fn next_step<R: Rng + ?Sized>(&mut self, ctx: &AiContext<'_>, rng: &mut R) -> AiStep {
        match self {
            Ai::Player => AiStep::Act(wait(ctx.actor)),
            Ai::Hostile(hostile) => AiStep::Act(hostile.next_action(ctx)),
            Ai::Confused(confused) => confused.next_step(ctx, rng),
        }
    }
}

fn wait(actor: EntityId) -> ConcreteAction {
    ConcreteAction::Wait(WaitAction { actor })
}

impl HostileAi {
    fn next_action(&mut self, ctx: &AiContext<'_>) -> ConcreteAction {
        let target = ctx.player_position;
        let distance = ctx.position.chebyshev_distance(target);

        if ctx.map.is_visible(ctx.position) {
            self.examine_location = Some(target);
            if distance <= 1 {
                if let Some(direction) = Direction::from_delta(target - ctx.position) {
                    return ConcreteAction::Melee(MeleeAction {
                        actor: ctx.actor,
                        direction,
                    });
                }
            }
            self.path = ctx
                .map
                .cost_grid()
                .find_path(ctx.position, target)
                .unwrap_or_default();
        } else if let Some(location) = self.examine_location {
            if ctx.position == location {
                self.examine_location = None;
            } else {
                self.path = ctx
                    .map
                    .cost_grid()
                    .find_path(ctx.position, location)
                    .unwrap_or_default();
            }
        }

        if !self.path.is_empty() {
            let next = self.path.remove(0);
            if let Some(direction) = Direction::from_delta(next - ctx.position) {
                return ConcreteAction::Move(MoveAction {
                    actor: ctx.actor,
                    direction,
                });
            }
            self.path.clear();
        }

        wait(ctx.actor)
    }
}

impl ConfusedAi {
    fn next_step<R: Rng + ?Sized>(&mut self, ctx: &AiContext<'_>, rng: &mut R) -> AiStep {
        if self.turns_remaining == 0 {
            return AiStep::Revert;
        }

        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        self.turns_remaining -= 1;
        AiStep::Act(ConcreteAction::Bump(BumpAction {
            actor: ctx.actor,
            direction,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{seeded_rng, TileType};
    use uuid::Uuid;

    fn corridor_map() -> GameMap {
        let mut map = GameMap::new(12, 3, 1);
        for x in 1..11 {
            map.set_tile(Position::new(x, 1), TileType::Floor).unwrap();
        }
        map
    }

    fn ctx(map: &GameMap, position: Position, player_position: Position) -> AiContext<'_> {
        AiContext {
            actor: Uuid::from_u128(7),
            position,
            player_position,
            map,
        }
    }

    #[test]
    fn test_hostile_attacks_when_adjacent_and_visible() {
        let mut map = corridor_map();
        map.update_fov(Position::new(5, 1), 8);
        let mut ai = Ai::hostile();
        let mut rng = seeded_rng(1);

        let step = ai.next_step(&ctx(&map, Position::new(6, 1), Position::new(5, 1)), &mut rng);
        assert_eq!(
            step,
            AiStep::Act(ConcreteAction::Melee(MeleeAction {
                actor: Uuid::from_u128(7),
                direction: Direction::West,
            }))
        );
    }

    #[test]
    fn test_hostile_steps_toward_visible_player() {
        let mut map = corridor_map();
        map.update_fov(Position::new(2, 1), 8);
        let mut ai = Ai::hostile();
        let mut rng = seeded_rng(1);

        let step = ai.next_step(&ctx(&map, Position::new(8, 1), Position::new(2, 1)), &mut rng);
        assert!(matches!(
            step,
            AiStep::Act(ConcreteAction::Move(MoveAction {
                direction: Direction::West,
                ..
            }))
        ));
        match ai {
            Ai::Hostile(hostile) => {
                assert_eq!(hostile.examine_location, Some(Position::new(2, 1)));
                assert_eq!(hostile.path.first(), Some(&Position::new(6, 1)));
            }
            other => panic!("unexpected ai {:?}", other),
        }
    }

    #[test]
    fn test_hostile_waits_when_unseen_without_memory() {
        let map = corridor_map();
        let mut ai = Ai::hostile();
        let mut rng = seeded_rng(1);
        let step = ai.next_step(&ctx(&map, Position::new(8, 1), Position::new(2, 1)), &mut rng);
        assert!(matches!(step, AiStep::Act(ConcreteAction::Wait(_))));
    }

    #[test]
    fn test_hostile_forgets_examined_location_on_arrival() {
        let map = corridor_map();
        let mut ai = Ai::Hostile(HostileAi {
            path: Vec::new(),
            examine_location: Some(Position::new(8, 1)),
        });
        let mut rng = seeded_rng(1);
        let step = ai.next_step(&ctx(&map, Position::new(8, 1), Position::new(2, 1)), &mut rng);
        assert!(matches!(step, AiStep::Act(ConcreteAction::Wait(_))));
        assert_eq!(ai, Ai::hostile());
    }

    #[test]
    fn test_confusion_counts_down_then_reverts() {
        let map = corridor_map();
        let mut ai = Ai::confused(Ai::hostile(), 2);
        let mut rng = seeded_rng(4);
        let context = ctx(&map, Position::new(5, 1), Position::new(2, 1));

        for _ in 0..2 {
            assert!(matches!(
                ai.next_step(&context, &mut rng),
                AiStep::Act(ConcreteAction::Bump(_))
            ));
        }
        assert_eq!(ai.next_step(&context, &mut rng), AiStep::Revert);
        assert_eq!(ai.into_previous(), Some(Ai::hostile()));
    }
}
