use std::collections::HashMap;

use log::{trace, warn};
use mapcore_codec::{BinaryNode, NodeWriter};
use mapcore_datatypes::{Creature, Direction, Position, Spawn, Town, Waypoint};

use crate::builder::MapBuilder;
use crate::error::ReadStats;
use crate::node_types::node;

pub fn parse_towns(towns_node: &BinaryNode, builder: &mut dyn MapBuilder, stats: &mut ReadStats) {
    for mut town_node in towns_node.children().cloned() {
        match parse_town(&mut town_node) {
            Ok(town) => {
                builder.add_town(town);
                stats.towns_read += 1;
            }
            Err(error) => {
                warn!("skipping malformed town entry: {error}");
                stats.entries_skipped += 1;
            }
        }
    }
}

fn parse_town(node: &mut BinaryNode) -> Result<Town, &'static str> {
    let id = node.read_u32().ok_or("missing id")?;
    let name = node.read_string().map_err(|_| "invalid name")?.ok_or("missing name")?;
    let x = node.read_u16().ok_or("missing x")?;
    let y = node.read_u16().ok_or("missing y")?;
    let z = node.read_u8().ok_or("missing z")?;
    Ok(Town { id, name, temple_position: Position::new(i32::from(x), i32::from(y), z) })
}

pub fn parse_waypoints(waypoints_node: &BinaryNode, builder: &mut dyn MapBuilder, stats: &mut ReadStats) {
    for mut waypoint_node in waypoints_node.children().cloned() {
        match parse_waypoint(&mut waypoint_node) {
            Ok(waypoint) => {
                builder.add_waypoint(waypoint);
                stats.waypoints_read += 1;
            }
            Err(error) => {
                warn!("skipping malformed waypoint entry: {error}");
                stats.entries_skipped += 1;
            }
        }
    }
}

fn parse_waypoint(node: &mut BinaryNode) -> Result<Waypoint, &'static str> {
    let name = node.read_string().map_err(|_| "invalid name")?.ok_or("missing name")?;
    let x = node.read_u16().ok_or("missing x")?;
    let y = node.read_u16().ok_or("missing y")?;
    let z = node.read_u8().ok_or("missing z")?;
    Ok(Waypoint { name, position: Position::new(i32::from(x), i32::from(y), z) })
}

pub fn parse_spawns(spawns_node: &BinaryNode, builder: &mut dyn MapBuilder, stats: &mut ReadStats) {
    for mut area_node in spawns_node.children().cloned() {
        if let Err(error) = parse_spawn_area(&mut area_node, builder, stats) {
            trace!("skipping malformed spawn area: {error}");
            stats.entries_skipped += 1;
        }
    }
}

fn parse_spawn_area(area_node: &mut BinaryNode, builder: &mut dyn MapBuilder, stats: &mut ReadStats) -> Result<(), &'static str> {
    let x = area_node.read_u16().ok_or("missing x")?;
    let y = area_node.read_u16().ok_or("missing y")?;
    let z = area_node.read_u8().ok_or("missing z")?;
    let radius = area_node.read_u16().ok_or("missing radius")?;

    let center = Position::new(i32::from(x), i32::from(y), z);
    builder.set_spawn(center, Spawn::new(center, i32::from(radius)));

    for monster_node in area_node.children_mut() {
        match parse_monster(monster_node) {
            Ok((dx, dy, creature)) => {
                let pos = Position::new(i32::from(x) + dx, i32::from(y) + dy, z);
                builder.set_creature(pos, creature);
                stats.creatures_read += 1;
            }
            Err(error) => {
                trace!("skipping malformed monster entry: {error}");
                stats.entries_skipped += 1;
            }
        }
    }

    Ok(())
}

fn parse_monster(node: &mut BinaryNode) -> Result<(i32, i32, Creature), &'static str> {
    let dx = node.read_u16().ok_or("missing dx")?;
    let dy = node.read_u16().ok_or("missing dy")?;
    let name = node.read_string().map_err(|_| "invalid name")?.ok_or("missing name")?;
    let spawn_time = node.read_u16().ok_or("missing spawn_time")?;

    let mut creature = Creature::new(name);
    creature.spawn_time = i32::from(spawn_time);
    creature.direction = Direction::South;

    Ok((i32::from(dx), i32::from(dy), creature))
}

pub fn write_towns(writer: &mut NodeWriter, towns: &[Town]) {
    writer.begin_node(node::TOWNS);
    for town in towns {
        writer.begin_node(node::TOWN);
        writer.write_u32(town.id);
        writer.write_string(&town.name);
        writer.write_u16(town.temple_position.x as u16);
        writer.write_u16(town.temple_position.y as u16);
        writer.write_u8(town.temple_position.z);
        writer.end_node();
    }
    writer.end_node();
}

pub fn write_waypoints(writer: &mut NodeWriter, waypoints: &[Waypoint]) {
    writer.begin_node(node::WAYPOINTS);
    for waypoint in waypoints {
        writer.begin_node(node::WAYPOINT);
        writer.write_string(&waypoint.name);
        writer.write_u16(waypoint.position.x as u16);
        writer.write_u16(waypoint.position.y as u16);
        writer.write_u8(waypoint.position.z);
        writer.end_node();
    }
    writer.end_node();
}

/// Writes one `SpawnArea` node per spawn found on the map, each followed by `Monster`
/// children for every creature within its radius on the same floor. If a creature falls
/// within more than one spawn's radius, it's written under the first spawn encountered in
/// the deterministic floor-major tile iteration order, matching the read path's assumption
/// that each creature belongs to exactly one spawn on write.
pub fn write_spawns(writer: &mut NodeWriter, map: &mapcore_datatypes::ChunkedMap) {
    writer.begin_node(node::SPAWNS);

    let mut spawns = Vec::new();
    map.for_each_tile(|tile| {
        if let Some(spawn) = &tile.spawn {
            spawns.push((tile.position, spawn.clone()));
        }
    });

    let mut creatures_by_floor: HashMap<u8, Vec<(Position, Creature)>> = HashMap::new();
    map.for_each_tile(|tile| {
        if let Some(creature) = &tile.creature {
            creatures_by_floor.entry(tile.position.z).or_default().push((tile.position, creature.clone()));
        }
    });

    let mut claimed = std::collections::HashSet::new();
    for (center, spawn) in spawns {
        writer.begin_node(node::SPAWN_AREA);
        writer.write_u16(center.x as u16);
        writer.write_u16(center.y as u16);
        writer.write_u8(center.z);
        writer.write_u16(spawn.radius as u16);

        if let Some(creatures) = creatures_by_floor.get(&center.z) {
            for (pos, creature) in creatures {
                if claimed.contains(pos) || !spawn.contains(*pos) {
                    continue;
                }
                claimed.insert(*pos);

                writer.begin_node(node::MONSTER);
                writer.write_u16((pos.x - center.x) as u16);
                writer.write_u16((pos.y - center.y) as u16);
                writer.write_string(&creature.name);
                writer.write_u16(creature.spawn_time as u16);
                writer.end_node();
            }
        }

        writer.end_node();
    }

    writer.end_node();
}

#[cfg(test)]
mod tests {
    use mapcore_codec::NodeReader;
    use mapcore_datatypes::ChunkedMap;

    use super::*;
    use crate::builder::ChunkedMapBuilder;

    #[test]
    fn a_creature_shared_by_two_spawns_is_claimed_by_the_first() {
        let mut map = ChunkedMap::new();

        let first_center = Position::new(0, 0, 7);
        let second_center = Position::new(4, 0, 7);
        map.get_or_create_tile(first_center).spawn = Some(Spawn::new(first_center, 5));
        map.get_or_create_tile(second_center).spawn = Some(Spawn::new(second_center, 5));

        let shared_pos = Position::new(2, 0, 7);
        map.get_or_create_tile(shared_pos).creature = Some(Creature::new("rat"));

        let mut writer = NodeWriter::new();
        write_spawns(&mut writer, &map);
        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());

        let reader = NodeReader::from_bytes(&data, *b"TEST").unwrap();
        let root = reader.into_root();

        let mut restored = ChunkedMap::new();
        let mut builder = ChunkedMapBuilder::new(&mut restored);
        let mut stats = crate::error::ReadStats::default();
        parse_spawns(&root, &mut builder, &mut stats);

        assert_eq!(stats.creatures_read, 1);
        assert!(restored.get_tile(shared_pos).unwrap().creature.is_some());
    }
}
