//! # Command Definitions
//!
//! Text commands for the headless driver.
//!
//! One command per line. Blank lines and lines starting with `#` are
//! skipped, which lets a script file carry comments.

use crate::game::{Direction, LevelUpChoice, Position};
use crate::input::PlayerIntent;
use crate::{CairnError, CairnResult};
use std::path::PathBuf;

/// Summary printed by `help`.
pub const HELP_TEXT: &str = "\
n s e w ne nw se sw   move or attack
wait                  pass a turn
get                   pick up an item
drop N | use N        drop or use inventory item N
equip N               equip or remove inventory item N
cast N                cast spell N
target X Y            choose a tile for a targeted effect
cancel                abandon targeting
look X Y              describe a tile
descend               take the stairs down
levelup con|str       spend a pending level up
map | inv | stats     show the map, inventory or status
save FILE             save the game
quit                  leave";

/// A parsed driver command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Something the player does in the dungeon
    Intent(PlayerIntent),
    LevelUp(LevelUpChoice),
    ShowMap,
    ShowInventory,
    ShowStatus,
    Save(PathBuf),
    Help,
    Quit,
}

impl Command {
    /// Parses one line of input.
    ///
    /// Returns `Ok(None)` for blank lines and comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{Command, Direction, PlayerIntent, Position};
    ///
    /// assert_eq!(
    ///     Command::parse("ne").unwrap(),
    ///     Some(Command::Intent(PlayerIntent::Move(Direction::Northeast)))
    /// );
    /// assert_eq!(
    ///     Command::parse("target 4 7").unwrap(),
    ///     Some(Command::Intent(PlayerIntent::ConfirmTarget(Position::new(4, 7))))
    /// );
    /// assert_eq!(Command::parse("  # comment").unwrap(), None);
    /// assert!(Command::parse("dance").is_err());
    /// ```
    pub fn parse(line: &str) -> CairnResult<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        if let (Some(direction), true) = (direction(&verb), args.is_empty()) {
            return Ok(Some(Command::Intent(PlayerIntent::Move(direction))));
        }

        let command = match (verb.as_str(), args.as_slice()) {
            ("wait" | ".", []) => Command::Intent(PlayerIntent::Wait),
            ("get" | "g", []) => Command::Intent(PlayerIntent::PickUp),
            ("drop", [index]) => Command::Intent(PlayerIntent::Drop(number(index)?)),
            ("use", [index]) => Command::Intent(PlayerIntent::Use(number(index)?)),
            ("equip", [index]) => Command::Intent(PlayerIntent::Equip(number(index)?)),
            ("cast", [index]) => Command::Intent(PlayerIntent::Cast(number(index)?)),
            ("target", [x, y]) => Command::Intent(PlayerIntent::ConfirmTarget(position(x, y)?)),
            ("cancel", []) => Command::Intent(PlayerIntent::Cancel),
            ("descend" | ">", []) => Command::Intent(PlayerIntent::Descend),
            ("look", [x, y]) => Command::Intent(PlayerIntent::LookAt(position(x, y)?)),
            ("levelup", [stat]) => Command::LevelUp(level_up_choice(stat)?),
            ("map", []) => Command::ShowMap,
            ("inv" | "i", []) => Command::ShowInventory,
            ("stats", []) => Command::ShowStatus,
            ("save", [path]) => Command::Save(PathBuf::from(path)),
            ("help" | "?", []) => Command::Help,
            ("quit" | "q", []) => Command::Quit,
            _ => return Err(unknown(line)),
        };
        Ok(Some(command))
    }
}

fn unknown(line: &str) -> CairnError {
    CairnError::InvalidAction(format!("Unknown command '{}'", line))
}

fn direction(word: &str) -> Option<Direction> {
    match word {
        "n" => Some(Direction::North),
        "s" => Some(Direction::South),
        "e" => Some(Direction::East),
        "w" => Some(Direction::West),
        "ne" => Some(Direction::Northeast),
        "nw" => Some(Direction::Northwest),
        "se" => Some(Direction::Southeast),
        "sw" => Some(Direction::Southwest),
        _ => None,
    }
}

fn number(word: &str) -> CairnResult<usize> {
    word.parse()
        .map_err(|_| CairnError::InvalidAction(format!("'{}' is not an index", word)))
}

fn position(x: &str, y: &str) -> CairnResult<Position> {
    let coordinate = |word: &str| {
        word.parse::<i32>()
            .map_err(|_| CairnError::InvalidAction(format!("'{}' is not a coordinate", word)))
    };
    Ok(Position::new(coordinate(x)?, coordinate(y)?))
}

fn level_up_choice(word: &str) -> CairnResult<LevelUpChoice> {
    match word.to_lowercase().as_str() {
        "con" | "constitution" => Ok(LevelUpChoice::Constitution),
        "str" | "strength" => Ok(LevelUpChoice::Strength),
        _ => Err(CairnError::InvalidAction(format!(
            "'{}' is not a stat; use con or str",
            word
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_directions() {
        assert_eq!(parse("s"), Command::Intent(PlayerIntent::Move(Direction::South)));
        assert_eq!(parse("SW"), Command::Intent(PlayerIntent::Move(Direction::Southwest)));
        assert!(Command::parse("n 3").is_err());
    }

    #[test]
    fn test_indexed_commands() {
        assert_eq!(parse("drop 2"), Command::Intent(PlayerIntent::Drop(2)));
        assert_eq!(parse("use 0"), Command::Intent(PlayerIntent::Use(0)));
        assert_eq!(parse("equip 1"), Command::Intent(PlayerIntent::Equip(1)));
        assert_eq!(parse("cast 0"), Command::Intent(PlayerIntent::Cast(0)));
        assert!(Command::parse("drop x").is_err());
        assert!(Command::parse("use").is_err());
    }

    #[test]
    fn test_meta_commands() {
        assert_eq!(
            parse("look 3 -1"),
            Command::Intent(PlayerIntent::LookAt(Position::new(3, -1)))
        );
        assert_eq!(parse("levelup str"), Command::LevelUp(LevelUpChoice::Strength));
        assert_eq!(parse("levelup CON"), Command::LevelUp(LevelUpChoice::Constitution));
        assert_eq!(parse("save run.json"), Command::Save(PathBuf::from("run.json")));
        assert_eq!(parse("quit"), Command::Quit);
        assert!(Command::parse("levelup dex").is_err());
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# walk east").unwrap(), None);
    }
}
