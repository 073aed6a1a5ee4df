//! Game state and command execution.

use std::collections::BTreeMap;

use fabel_pipeline::{ConfigProperties, SaveData};
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use tracing::debug;

use crate::direction::Direction;
use crate::error::{EngineError, EngineResult};
use crate::world::World;

/// Minimum similarity score for fuzzy item matching (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// How long `wait` pauses the client, in milliseconds.
pub const WAIT_MILLIS: u64 = 1500;

/// Verbs offered when nothing has been typed yet.
const VERBS: [&str; 8] = [
    "look",
    "go",
    "take",
    "drop",
    "examine",
    "inventory",
    "wait",
    "help",
];

/// Everything about a game in progress that changes between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Id of the current room.
    pub location: String,
    /// Ids of carried items, in pickup order.
    pub inventory: Vec<String>,
    /// Ids of the items lying in each room.
    pub room_items: BTreeMap<String, Vec<String>>,
    /// Number of turns that changed the state.
    pub turns: u32,
}

impl GameState {
    fn initial(world: &World) -> Self {
        Self {
            location: world.start.clone(),
            inventory: Vec::new(),
            room_items: world
                .rooms
                .iter()
                .map(|(id, room)| (id.clone(), room.items.clone()))
                .collect(),
            turns: 0,
        }
    }
}

/// One step of a command's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Beat {
    /// Text to print.
    Text(String),
    /// Ask the client to pause for this many milliseconds.
    Pause(u64),
}

/// The output of a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Output in the order it should be shown.
    pub beats: Vec<Beat>,
}

impl Outcome {
    fn text(text: impl Into<String>) -> Self {
        Self {
            beats: vec![Beat::Text(text.into())],
        }
    }

    fn then(mut self, text: impl Into<String>) -> Self {
        self.beats.push(Beat::Text(text.into()));
        self
    }

    fn pause(mut self, millis: u64) -> Self {
        self.beats.push(Beat::Pause(millis));
        self
    }

    /// All printed text joined by newlines.
    pub fn joined(&self) -> String {
        self.beats
            .iter()
            .filter_map(|beat| match beat {
                Beat::Text(text) => Some(text.as_str()),
                Beat::Pause(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What goes into a snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    title: String,
    state: GameState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    undo: Vec<GameState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    redo: Vec<GameState>,
}

/// A running game.
#[derive(Debug)]
pub struct Game {
    world: World,
    state: GameState,
    undo: Vec<GameState>,
    redo: Vec<GameState>,
    brief: bool,
}

impl Game {
    /// Create a game positioned at the world's start.
    pub fn new(world: World) -> Self {
        let state = GameState::initial(&world);
        Self {
            world,
            state,
            undo: Vec::new(),
            redo: Vec::new(),
            brief: false,
        }
    }

    /// The world being played.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Begin play, either fresh or from a snapshot.
    pub fn start(&mut self, data: Option<SaveData>) -> EngineResult<Outcome> {
        match data {
            Some(data) => self.load(data),
            None => {
                self.reset();
                let intro = self.world.intro.clone();
                let room = self.describe_room(true)?;
                if intro.is_empty() {
                    Ok(Outcome::text(room))
                } else {
                    Ok(Outcome::text(intro).then(room))
                }
            }
        }
    }

    /// Return to the initial state and forget all history.
    pub fn reset(&mut self) {
        self.state = GameState::initial(&self.world);
        self.undo.clear();
        self.redo.clear();
    }

    /// Apply engine configuration. Unknown properties are ignored.
    pub fn configure(&mut self, properties: &ConfigProperties) {
        for (key, value) in properties {
            match key.as_str() {
                "brief" => self.brief = value == "true",
                _ => debug!(key = %key, "ignoring unknown property"),
            }
        }
    }

    /// Run one command.
    ///
    /// Commands that change the state record an undo step and clear the
    /// redo stack. Failed commands leave everything untouched.
    pub fn execute(&mut self, command: &[String]) -> EngineResult<Outcome> {
        let before = self.state.clone();
        let outcome = self.run(command)?;
        if self.state != before {
            self.undo.push(before);
            self.redo.clear();
        }
        Ok(outcome)
    }

    fn run(&mut self, command: &[String]) -> EngineResult<Outcome> {
        let Some((verb, rest)) = command.split_first() else {
            return Ok(Outcome::text("Pardon?"));
        };
        let verb = verb.to_lowercase();
        let object = rest.join(" ");

        if let Some(direction) = Direction::parse(&verb) {
            return self.go(direction);
        }

        match verb.as_str() {
            "look" | "l" => Ok(Outcome::text(self.describe_room(true)?)),
            "go" | "walk" => {
                let Some(direction) = rest.first() else {
                    return Err(EngineError::MissingArgument("Go".to_string()));
                };
                let direction = Direction::parse(direction)
                    .ok_or_else(|| EngineError::NoExit(direction.clone()))?;
                self.go(direction)
            }
            "take" | "get" => self.take(&object),
            "drop" => self.drop_item(&object),
            "examine" | "x" => self.examine(&object),
            "inventory" | "i" => Ok(Outcome::text(self.describe_inventory())),
            "wait" | "z" => {
                self.state.turns += 1;
                Ok(Outcome::text("You sit down and wait.")
                    .pause(WAIT_MILLIS)
                    .then("Time passes."))
            }
            "help" => Ok(Outcome::text(format!(
                "Try: {}. Directions can be abbreviated (n, s, e, w, u, d).",
                VERBS.join(", ")
            ))),
            _ => Err(EngineError::UnknownCommand(command.join(" "))),
        }
    }

    fn go(&mut self, direction: Direction) -> EngineResult<Outcome> {
        let target = self
            .world
            .room(&self.state.location)?
            .exits
            .get(&direction)
            .cloned()
            .ok_or_else(|| EngineError::NoExit(direction.to_string()))?;
        self.state.location = target;
        self.state.turns += 1;
        Ok(Outcome::text(self.describe_room(!self.brief)?))
    }

    fn take(&mut self, name: &str) -> EngineResult<Outcome> {
        if name.is_empty() {
            return Err(EngineError::MissingArgument("Take".to_string()));
        }
        let here = self.items_here().to_vec();
        let id = self
            .resolve(name, &here)
            .ok_or_else(|| EngineError::ItemNotHere(name.to_string()))?;
        let item = self
            .world
            .item(&id)
            .ok_or_else(|| EngineError::ItemNotHere(name.to_string()))?;
        if !item.portable {
            return Err(EngineError::CannotTake(item.name.clone()));
        }
        let text = format!("Taken: {}.", item.name);

        if let Some(items) = self.state.room_items.get_mut(&self.state.location) {
            items.retain(|i| *i != id);
        }
        self.state.inventory.push(id);
        self.state.turns += 1;
        Ok(Outcome::text(text))
    }

    fn drop_item(&mut self, name: &str) -> EngineResult<Outcome> {
        if name.is_empty() {
            return Err(EngineError::MissingArgument("Drop".to_string()));
        }
        let id = self
            .resolve(name, &self.state.inventory)
            .ok_or_else(|| EngineError::NotCarried(name.to_string()))?;
        let text = format!("Dropped: {}.", self.item_name(&id));

        self.state.inventory.retain(|i| *i != id);
        self.state
            .room_items
            .entry(self.state.location.clone())
            .or_default()
            .push(id);
        self.state.turns += 1;
        Ok(Outcome::text(text))
    }

    fn examine(&self, name: &str) -> EngineResult<Outcome> {
        if name.is_empty() {
            return Err(EngineError::MissingArgument("Examine".to_string()));
        }
        let visible: Vec<String> = self
            .items_here()
            .iter()
            .chain(&self.state.inventory)
            .cloned()
            .collect();
        let id = self
            .resolve(name, &visible)
            .ok_or_else(|| EngineError::ItemNotHere(name.to_string()))?;
        match self.world.item(&id) {
            Some(item) if !item.description.is_empty() => {
                Ok(Outcome::text(item.description.clone()))
            }
            Some(item) => Ok(Outcome::text(format!(
                "You see nothing special about the {}.",
                item.name
            ))),
            None => Err(EngineError::ItemNotHere(name.to_string())),
        }
    }

    /// Resolve a typed name against candidate item ids.
    ///
    /// Exact id or name matches win; otherwise the closest fuzzy match above
    /// the threshold is used.
    fn resolve(&self, input: &str, candidates: &[String]) -> Option<String> {
        let input = input.to_lowercase();
        let names = |id: &String| {
            let name = self
                .world
                .item(id)
                .map(|item| item.name.to_lowercase())
                .unwrap_or_default();
            (id.to_lowercase(), name)
        };

        if let Some(exact) = candidates.iter().find(|id| {
            let (id, name) = names(id);
            id == input || name == input
        }) {
            return Some(exact.clone());
        }

        let mut best: Option<(&String, f64)> = None;
        for candidate in candidates {
            let (id, name) = names(candidate);
            let score = jaro_winkler(&input, &id).max(jaro_winkler(&input, &name));
            if score >= FUZZY_THRESHOLD && best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best.map(|(id, _)| id.clone())
    }

    fn items_here(&self) -> &[String] {
        self.state
            .room_items
            .get(&self.state.location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn item_name(&self, id: &str) -> String {
        self.world
            .item(id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn describe_room(&self, full: bool) -> EngineResult<String> {
        let room = self.world.room(&self.state.location)?;
        let mut lines = vec![room.name.clone()];
        if full && !room.description.is_empty() {
            lines.push(room.description.clone());
        }

        let items: Vec<String> = self.items_here().iter().map(|id| self.item_name(id)).collect();
        if !items.is_empty() {
            lines.push(format!("You see: {}.", items.join(", ")));
        }

        let exits: Vec<&str> = room.exits.keys().map(Direction::name).collect();
        if exits.is_empty() {
            lines.push("There are no exits.".to_string());
        } else {
            lines.push(format!("Exits: {}.", exits.join(", ")));
        }
        Ok(lines.join("\n"))
    }

    fn describe_inventory(&self) -> String {
        if self.state.inventory.is_empty() {
            return "You are empty-handed.".to_string();
        }
        let items: Vec<String> = self
            .state
            .inventory
            .iter()
            .map(|id| self.item_name(id))
            .collect();
        format!("You are carrying: {}.", items.join(", "))
    }

    /// Words that may follow a partial command.
    pub fn words_for(&self, partial: &[String]) -> Vec<String> {
        let Some((verb, rest)) = partial.split_first() else {
            return VERBS.iter().map(|v| (*v).to_string()).collect();
        };
        if !rest.is_empty() {
            return Vec::new();
        }

        match verb.to_lowercase().as_str() {
            "go" | "walk" => self
                .world
                .room(&self.state.location)
                .map(|room| room.exits.keys().map(|d| d.name().to_string()).collect())
                .unwrap_or_default(),
            "take" | "get" => self
                .items_here()
                .iter()
                .filter(|id| self.world.item(id).is_some_and(|item| item.portable))
                .cloned()
                .collect(),
            "drop" => self.state.inventory.clone(),
            "examine" | "x" => self
                .items_here()
                .iter()
                .chain(&self.state.inventory)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Name of the current room, used as the status title.
    pub fn title(&self) -> EngineResult<&str> {
        Ok(self.world.room(&self.state.location)?.name.as_str())
    }

    /// Whether there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Take a snapshot. A compressed snapshot leaves out the undo history.
    pub fn save(&self, compress: bool) -> EngineResult<SaveData> {
        let snapshot = Snapshot {
            title: self.world.title.clone(),
            state: self.state.clone(),
            undo: if compress { Vec::new() } else { self.undo.clone() },
            redo: if compress { Vec::new() } else { self.redo.clone() },
        };
        serde_json::to_value(snapshot).map_err(|e| EngineError::InvalidSave(e.to_string()))
    }

    /// Restore a snapshot taken by [`Game::save`].
    pub fn load(&mut self, data: SaveData) -> EngineResult<Outcome> {
        let snapshot: Snapshot =
            serde_json::from_value(data).map_err(|e| EngineError::InvalidSave(e.to_string()))?;
        if snapshot.title != self.world.title {
            return Err(EngineError::InvalidSave(format!(
                "snapshot is for \"{}\"",
                snapshot.title
            )));
        }
        if !self.world.rooms.contains_key(&snapshot.state.location) {
            return Err(EngineError::InvalidSave(format!(
                "unknown room \"{}\"",
                snapshot.state.location
            )));
        }

        self.state = snapshot.state;
        self.undo = snapshot.undo;
        self.redo = snapshot.redo;
        Ok(Outcome::text(self.describe_room(true)?))
    }

    /// Step back one state-changing command.
    pub fn undo(&mut self) -> EngineResult<Outcome> {
        let previous = self.undo.pop().ok_or(EngineError::NoHistory("undo"))?;
        self.redo.push(std::mem::replace(&mut self.state, previous));
        Ok(Outcome::text("Undone.").then(self.describe_room(true)?))
    }

    /// Step forward one undone command.
    pub fn redo(&mut self) -> EngineResult<Outcome> {
        let next = self.redo.pop().ok_or(EngineError::NoHistory("redo"))?;
        self.undo.push(std::mem::replace(&mut self.state, next));
        Ok(Outcome::text("Redone.").then(self.describe_room(true)?))
    }

    /// One-line summary of the game.
    pub fn info(&self) -> String {
        format!(
            "{}: {} rooms, {} items, turn {}.",
            self.world.title,
            self.world.rooms.len(),
            self.world.items.len(),
            self.state.turns
        )
    }
}
