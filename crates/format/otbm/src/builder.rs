use log::info;
use mapcore_datatypes::{ChunkedMap, Creature, MapVersion, Position, Spawn, Tile, Town, Waypoint};

/// The surface a map reader needs from whatever it's building into. Kept as a trait, mirroring
/// the reference reader's decoupling of node parsing from the concrete in-memory
/// representation, so a future alternate target (a validator that only counts entities,
/// say) can reuse the same parsing code.
pub trait MapBuilder {
    fn set_size(&mut self, width: u16, height: u16);
    fn set_version(&mut self, version: MapVersion);
    fn set_spawn_file(&mut self, file: String);
    fn set_house_file(&mut self, file: String);
    fn set_description(&mut self, description: String);
    fn get_or_create_tile(&mut self, pos: Position) -> &mut Tile;
    fn set_tile(&mut self, pos: Position, tile: Tile);
    fn add_town(&mut self, town: Town);
    fn add_waypoint(&mut self, waypoint: Waypoint);
    fn set_spawn(&mut self, pos: Position, spawn: Spawn);
    fn set_creature(&mut self, pos: Position, creature: Creature);
}

/// The only [`MapBuilder`] this crate ships: builds directly into a [`ChunkedMap`].
pub struct ChunkedMapBuilder<'a> {
    map: &'a mut ChunkedMap,
}

impl<'a> ChunkedMapBuilder<'a> {
    pub fn new(map: &'a mut ChunkedMap) -> Self {
        Self { map }
    }
}

impl MapBuilder for ChunkedMapBuilder<'_> {
    fn set_size(&mut self, width: u16, height: u16) {
        self.map.width = width;
        self.map.height = height;
    }

    fn set_version(&mut self, version: MapVersion) {
        self.map.version = version;
    }

    fn set_spawn_file(&mut self, file: String) {
        info!("spawn sidecar file: {file}");
        self.map.spawn_file = file;
    }

    fn set_house_file(&mut self, file: String) {
        info!("house sidecar file: {file}");
        self.map.house_file = file;
    }

    fn set_description(&mut self, description: String) {
        self.map.description = description;
    }

    fn get_or_create_tile(&mut self, pos: Position) -> &mut Tile {
        self.map.get_or_create_tile(pos)
    }

    fn set_tile(&mut self, pos: Position, tile: Tile) {
        self.map.set_tile(pos, tile);
    }

    fn add_town(&mut self, town: Town) {
        self.map.towns.push(town);
    }

    fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.map.waypoints.push(waypoint);
    }

    fn set_spawn(&mut self, pos: Position, spawn: Spawn) {
        self.map.get_or_create_tile(pos).spawn = Some(spawn);
    }

    fn set_creature(&mut self, pos: Position, creature: Creature) {
        self.map.get_or_create_tile(pos).creature = Some(creature);
    }
}
