//! Static world description.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{EngineError, EngineResult};

/// A location the player can be in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Display name, also used as the status title.
    pub name: String,
    /// Prose shown on `look`.
    #[serde(default)]
    pub description: String,
    /// Exits by direction, pointing at room ids.
    #[serde(default)]
    pub exits: BTreeMap<Direction, String>,
    /// Ids of the items initially here.
    #[serde(default)]
    pub items: Vec<String>,
}

/// Something that can lie in a room or be carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Prose shown when examined.
    #[serde(default)]
    pub description: String,
    /// Whether the player can pick it up.
    #[serde(default = "portable_by_default")]
    pub portable: bool,
}

fn portable_by_default() -> bool {
    true
}

/// A complete game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Game title.
    pub title: String,
    /// Text shown when a new game starts.
    #[serde(default)]
    pub intro: String,
    /// Id of the starting room.
    pub start: String,
    /// Rooms by id.
    pub rooms: BTreeMap<String, Room>,
    /// Items by id.
    #[serde(default)]
    pub items: BTreeMap<String, Item>,
}

impl World {
    /// Decode and validate a world from JSON.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let world: World = serde_json::from_str(text)?;
        world.validate()?;
        Ok(world)
    }

    /// Check that every reference points at something that exists.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.rooms.contains_key(&self.start) {
            return Err(EngineError::RoomNotFound(self.start.clone()));
        }
        for room in self.rooms.values() {
            if let Some(missing) = room.exits.values().find(|id| !self.rooms.contains_key(*id)) {
                return Err(EngineError::RoomNotFound(missing.clone()));
            }
            if let Some(missing) = room.items.iter().find(|id| !self.items.contains_key(*id)) {
                return Err(EngineError::ItemNotHere(missing.clone()));
            }
        }
        Ok(())
    }

    /// Look up a room by id.
    pub fn room(&self, id: &str) -> EngineResult<&Room> {
        self.rooms
            .get(id)
            .ok_or_else(|| EngineError::RoomNotFound(id.to_string()))
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// The built-in demo world: a small cave system.
    pub fn demo() -> Self {
        let mut rooms = BTreeMap::new();
        rooms.insert(
            "cave".to_string(),
            room(
                "Cave",
                "A damp cave. Daylight filters in from a crack above.",
                &[(Direction::Up, "hillside"), (Direction::North, "tunnel")],
                &["lamp"],
            ),
        );
        rooms.insert(
            "tunnel".to_string(),
            room(
                "Tunnel",
                "A narrow tunnel slopes down into darkness.",
                &[(Direction::South, "cave"), (Direction::Down, "lake")],
                &["rope"],
            ),
        );
        rooms.insert(
            "lake".to_string(),
            room(
                "Underground Lake",
                "Black water laps at a pebbled shore.",
                &[(Direction::Up, "tunnel")],
                &["key", "boulder"],
            ),
        );
        rooms.insert(
            "hillside".to_string(),
            room(
                "Hillside",
                "Wind tugs at the grass. The cave mouth yawns below.",
                &[(Direction::Down, "cave")],
                &[],
            ),
        );

        let mut items = BTreeMap::new();
        items.insert("lamp".to_string(), item("brass lamp", "Dented but working.", true));
        items.insert("rope".to_string(), item("coil of rope", "Damp, but sturdy.", true));
        items.insert("key".to_string(), item("iron key", "Cold and heavy.", true));
        items.insert(
            "boulder".to_string(),
            item("boulder", "Far too heavy to move.", false),
        );

        Self {
            title: "The Cave".to_string(),
            intro: "You wake on cold stone with no memory of how you got here.".to_string(),
            start: "cave".to_string(),
            rooms,
            items,
        }
    }
}

fn room(name: &str, description: &str, exits: &[(Direction, &str)], items: &[&str]) -> Room {
    Room {
        name: name.to_string(),
        description: description.to_string(),
        exits: exits
            .iter()
            .map(|(dir, id)| (*dir, (*id).to_string()))
            .collect(),
        items: items.iter().map(|id| (*id).to_string()).collect(),
    }
}

fn item(name: &str, description: &str, portable: bool) -> Item {
    Item {
        name: name.to_string(),
        description: description.to_string(),
        portable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_world_is_valid() {
        let world = World::demo();
        world.validate().unwrap();
        assert_eq!(world.room("cave").unwrap().name, "Cave");
    }

    #[test]
    fn world_from_json() {
        let world = World::from_json(
            r#"{
                "title": "Tiny",
                "start": "a",
                "rooms": {
                    "a": {"name": "Room A", "exits": {"east": "b"}, "items": ["pebble"]},
                    "b": {"name": "Room B", "exits": {"west": "a"}}
                },
                "items": {"pebble": {"name": "pebble"}}
            }"#,
        )
        .unwrap();

        assert_eq!(world.rooms.len(), 2);
        assert_eq!(
            world.room("a").unwrap().exits.get(&Direction::East),
            Some(&"b".to_string())
        );
        assert!(world.item("pebble").unwrap().portable);
    }

    #[test]
    fn dangling_exit_is_rejected() {
        let result = World::from_json(
            r#"{"title": "Broken", "start": "a",
                "rooms": {"a": {"name": "A", "exits": {"north": "nowhere"}}}}"#,
        );
        assert!(matches!(result, Err(EngineError::RoomNotFound(id)) if id == "nowhere"));
    }

    #[test]
    fn missing_start_is_rejected() {
        let result = World::from_json(r#"{"title": "Empty", "start": "a", "rooms": {}}"#);
        assert!(result.is_err());
    }
}
