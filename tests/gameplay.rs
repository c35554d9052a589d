//! End-to-end turns played through `GameState::play_turn`.

use cairn::{
    resolve_melee, seeded_rng, AttackOutcome, BumpAction, CairnResult, ConcreteAction,
    DescendAction, Direction, Fighter, GameConfig, GameMap, GameState, MessageKind, MoveAction,
    PickUpAction, Position, PrefabId, Prefabs, RngDice, TileType, TurnOutcome,
};
use proptest::prelude::*;

/// A walled 12x12 room with the player at (5, 5).
fn arena(seed: u64) -> GameState {
    let mut map = GameMap::new(12, 12, 1);
    for y in 1..11 {
        for x in 1..11 {
            map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
        }
    }
    let prefabs = Prefabs::standard();
    let mut rng = seeded_rng(seed);
    let mut player = prefabs.spawn_player(&mut rng).unwrap();
    player.position = Position::new(5, 5);
    let player_id = player.id;
    map.add_entity(player);
    GameState::from_map(map, player_id, seed).unwrap()
}

fn bump(state: &GameState, direction: Direction) -> ConcreteAction {
    ConcreteAction::Bump(BumpAction {
        actor: state.player_id,
        direction,
    })
}

#[test]
fn test_player_hits_adjacent_orc() {
    // Find a seed whose next melee draw is a plain hit, predicted on a
    // copy of the game rng.
    let (mut state, orc, damage) = (0..200)
        .find_map(|seed| {
            let mut state = arena(seed);
            let orc = state.spawn(PrefabId::Orc, Position::new(6, 5)).ok()?;
            let mut rng = state.rng.clone();
            let predicted = resolve_melee(
                state.actor(state.player_id).ok()?,
                state.actor(orc).ok()?,
                &mut RngDice(&mut rng),
            );
            (predicted.outcome == AttackOutcome::Hit && predicted.damage > 0)
                .then_some((state, orc, predicted.damage))
        })
        .expect("a seed with a plain hit");

    let outcome = state.play_turn(bump(&state, Direction::East)).unwrap();

    assert_eq!(outcome, TurnOutcome::Performed);
    assert_eq!(state.actor(orc).unwrap().fighter.hp(), 10 - damage);
    assert!(state
        .message_log
        .contains(&format!("Player attacks orc for {} hit points.", damage)));
    assert_eq!(state.statistics.damage_dealt, damage as u64);
}

#[test]
fn test_pick_up_with_full_inventory() {
    let mut state = arena(1);
    let player = state.player_id;
    let dagger = state
        .prefabs
        .spawn(PrefabId::Dagger, Position::origin(), &mut state.rng)
        .unwrap();
    {
        let inventory = &mut state.actor_mut(player).unwrap().inventory;
        inventory.capacity = 1;
        inventory.items.push(dagger);
    }
    let potion = state
        .spawn(PrefabId::HealthPotion, Position::new(5, 5))
        .unwrap();

    let outcome = state
        .play_turn(ConcreteAction::PickUp(PickUpAction { actor: player }))
        .unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Rejected("Your inventory is full.".to_string())
    );
    assert_eq!(state.map().entity(potion).unwrap().position, Position::new(5, 5));
    assert_eq!(state.actor(player).unwrap().inventory.items.len(), 1);
    assert_eq!(state.turn_number, 0);
    let last = state.message_log.last().unwrap();
    assert_eq!(last.text, "Your inventory is full.");
    assert_eq!(last.kind, MessageKind::Impossible);
}

#[test]
fn test_slain_orc_stops_acting_and_blocking() {
    let mut state = arena(2);
    let orc = state.spawn(PrefabId::Orc, Position::new(6, 5)).unwrap();
    state.actor_mut(orc).unwrap().fighter.set_hp(1);

    for _ in 0..50 {
        if !state.entity(orc).unwrap().is_alive() {
            break;
        }
        state.play_turn(bump(&state, Direction::East)).unwrap();
    }

    let remains = state.entity(orc).unwrap();
    assert!(!remains.is_alive());
    assert!(!remains.blocks_movement);
    assert!(!state.ticker.is_scheduled(orc));
    assert_eq!(state.statistics.enemies_defeated, 1);

    let step = ConcreteAction::Move(MoveAction {
        actor: state.player_id,
        direction: Direction::East,
    });
    assert_eq!(state.play_turn(step).unwrap(), TurnOutcome::Performed);
    assert_eq!(state.player_position().unwrap(), Position::new(6, 5));
}

#[test]
fn test_descend_builds_next_floor() -> CairnResult<()> {
    let mut state = GameState::new_game(GameConfig::for_testing(8))?;
    let player = state.player_id;
    let stairs = state.map().downstairs;
    state.entity_mut(player)?.position = stairs;

    let outcome = state.play_turn(ConcreteAction::Descend(DescendAction { actor: player }))?;

    assert_eq!(outcome, TurnOutcome::Performed);
    assert_eq!(state.world.depth(), 2);
    assert_eq!(state.world.archive.len(), 1);
    assert!(state.world.archive[0].entity(player).is_none());
    assert!(state.map().is_visible(state.player_position()?));
    assert!(state.message_log.contains("You descend the staircase."));
    assert_eq!(state.statistics.max_depth_reached, 2);
    Ok(())
}

#[test]
fn test_descend_off_stairs_is_rejected() -> CairnResult<()> {
    let mut state = arena(4);
    let player = state.player_id;
    let outcome = state.play_turn(ConcreteAction::Descend(DescendAction { actor: player }))?;
    assert!(matches!(outcome, TurnOutcome::Rejected(_)));
    assert_eq!(state.world.depth(), 1);
    Ok(())
}

proptest! {
    #[test]
    fn test_hp_stays_in_bounds(
        max_hp in 1i32..100,
        changes in prop::collection::vec((any::<bool>(), 0i32..150), 0..40),
    ) {
        let mut fighter = Fighter::new(max_hp, 0, 1);
        for (is_damage, amount) in changes {
            if is_damage {
                fighter.take_damage(amount);
            } else {
                fighter.heal(amount);
            }
            prop_assert!(fighter.hp() >= 0);
            prop_assert!(fighter.hp() <= fighter.max_hp());
        }
    }
}
