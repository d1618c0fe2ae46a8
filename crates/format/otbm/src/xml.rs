//! Sidecar XML formats that can live alongside the binary map file: a spawn list and a house
//! list. Both are tiny schemas, so a `serde`-derived DOM via `quick_xml::de`/`quick_xml::se`
//! is used rather than hand-rolling a streaming parser.

use std::path::Path;

use log::warn;
use mapcore_datatypes::{ChunkedMap, Creature, Direction, Position, Spawn};
use serde::{Deserialize, Serialize};

use crate::error::OtbmError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename = "spawns")]
struct SpawnsXml {
    #[serde(rename = "spawn", default)]
    spawns: Vec<SpawnXml>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct SpawnXml {
    #[serde(rename = "@centerx")]
    center_x: i32,
    #[serde(rename = "@centery")]
    center_y: i32,
    #[serde(rename = "@centerz")]
    center_z: u8,
    #[serde(rename = "@radius")]
    radius: i32,
    #[serde(rename = "monster", default)]
    monsters: Vec<MonsterXml>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct MonsterXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@x")]
    x: i32,
    #[serde(rename = "@y")]
    y: i32,
    #[serde(rename = "@spawntime")]
    spawn_time: i32,
    #[serde(rename = "@direction", default = "default_direction")]
    direction: u8,
}

fn default_direction() -> u8 {
    2 // south
}

fn direction_from_xml(value: u8) -> Direction {
    match value {
        0 => Direction::North,
        1 => Direction::East,
        3 => Direction::West,
        _ => Direction::South,
    }
}

/// Loads a spawns sidecar file, attaching each `<spawn>` to its center tile and a `Creature`
/// to each `<monster>`'s tile. A center tile that already has a spawn is left untouched and
/// the XML entry is silently skipped, matching the reference loader's duplicate handling.
pub fn read_spawns_xml(path: &Path, map: &mut ChunkedMap) -> Result<(usize, usize), OtbmError> {
    let data = std::fs::read_to_string(path).map_err(|error| {
        OtbmError::Codec(mapcore_codec::CodecError::Io(error))
    })?;
    let parsed: SpawnsXml = quick_xml::de::from_str(&data)?;

    let mut spawns_read = 0;
    let mut creatures_read = 0;

    for spawn_xml in parsed.spawns {
        let center = Position::new(spawn_xml.center_x, spawn_xml.center_y, spawn_xml.center_z);
        let tile = map.get_or_create_tile(center);
        if tile.spawn.is_some() {
            warn!("duplicate spawn at {center:?} in sidecar file, skipping");
            continue;
        }
        tile.spawn = Some(Spawn::new(center, spawn_xml.radius));
        spawns_read += 1;

        for monster in spawn_xml.monsters {
            let pos = Position::new(monster.x, monster.y, spawn_xml.center_z);
            let mut creature = Creature::new(monster.name);
            creature.spawn_time = monster.spawn_time;
            creature.direction = direction_from_xml(monster.direction);
            map.get_or_create_tile(pos).creature = Some(creature);
            creatures_read += 1;
        }
    }

    Ok((spawns_read, creatures_read))
}

/// Writes every spawn on the map, and the creatures within its radius, to a spawns sidecar
/// file. Mirrors [`crate::entities_io::write_spawns`]'s claimed-position determinism so a
/// creature shared by overlapping spawn radii is written under exactly one spawn.
pub fn write_spawns_xml(path: &Path, map: &ChunkedMap) -> Result<(), OtbmError> {
    let mut spawns = Vec::new();
    map.for_each_tile(|tile| {
        if let Some(spawn) = &tile.spawn {
            spawns.push((tile.position, spawn.clone()));
        }
    });

    let mut by_floor: std::collections::HashMap<u8, Vec<(Position, Creature)>> = std::collections::HashMap::new();
    map.for_each_tile(|tile| {
        if let Some(creature) = &tile.creature {
            by_floor.entry(tile.position.z).or_default().push((tile.position, creature.clone()));
        }
    });

    let mut claimed = std::collections::HashSet::new();
    let mut spawn_xmls = Vec::new();

    for (center, spawn) in spawns {
        let mut monsters = Vec::new();
        if let Some(creatures) = by_floor.get(&center.z) {
            for (pos, creature) in creatures {
                if claimed.contains(pos) || !spawn.contains(*pos) {
                    continue;
                }
                claimed.insert(*pos);
                monsters.push(MonsterXml {
                    name: creature.name.clone(),
                    x: pos.x,
                    y: pos.y,
                    spawn_time: creature.spawn_time,
                    direction: creature.direction as u8,
                });
            }
        }

        spawn_xmls.push(SpawnXml {
            center_x: center.x,
            center_y: center.y,
            center_z: center.z,
            radius: spawn.radius,
            monsters,
        });
    }

    let document = SpawnsXml { spawns: spawn_xmls };
    let body = quick_xml::se::to_string(&document)?;
    std::fs::write(path, body).map_err(|error| OtbmError::Codec(mapcore_codec::CodecError::Io(error)))?;

    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename = "houses")]
struct HousesXml {
    #[serde(rename = "house", default)]
    houses: Vec<HouseXml>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HouseXml {
    #[serde(rename = "@houseid")]
    pub id:          u32,
    #[serde(rename = "@name")]
    pub name:        String,
    #[serde(rename = "@entryx")]
    pub entry_x:     i32,
    #[serde(rename = "@entryy")]
    pub entry_y:     i32,
    #[serde(rename = "@entryz")]
    pub entry_z:     u8,
    #[serde(rename = "@townid")]
    pub town_id:     u32,
    #[serde(rename = "@size")]
    pub size:        u32,
    #[serde(rename = "@rent")]
    pub rent:        u32,
    #[serde(rename = "@guildhall", default)]
    pub guildhall:   bool,
}

/// Loads a houses sidecar file into a plain list. Interpreting these records against the
/// map's tiles (setting `Tile::house_id` for each covered position) is left to the caller;
/// this crate only parses the schema.
pub fn read_houses_xml(path: &Path) -> Result<Vec<HouseXml>, OtbmError> {
    let data = std::fs::read_to_string(path).map_err(|error| {
        OtbmError::Codec(mapcore_codec::CodecError::Io(error))
    })?;
    let parsed: HousesXml = quick_xml::de::from_str(&data)?;
    Ok(parsed.houses)
}

pub fn write_houses_xml(path: &Path, houses: &[HouseXml]) -> Result<(), OtbmError> {
    let document = HousesXml { houses: houses.to_vec() };
    let body = quick_xml::se::to_string(&document)?;
    std::fs::write(path, body).map_err(|error| OtbmError::Codec(mapcore_codec::CodecError::Io(error)))?;
    Ok(())
}
