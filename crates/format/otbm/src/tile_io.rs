use log::{trace, warn};
use mapcore_codec::{BinaryNode, NodeReader, NodeWriter};
use mapcore_datatypes::{Item, Position, Tile, TileFlags};

use crate::builder::MapBuilder;
use crate::error::ReadStats;
use crate::item_io::{parse_item, write_item};
use crate::node_types::{attr, node};

/// Parses a `TileArea` node's children into tiles in `builder`, soft-skipping any single
/// tile that fails to parse (logged at `trace`) rather than aborting the whole area.
pub fn parse_tile_area(area: &mut BinaryNode, otbm_version: u32, builder: &mut dyn MapBuilder, stats: &mut ReadStats) {
    let (Some(base_x), Some(base_y), Some(base_z)) =
        (area.read_u16(), area.read_u16(), area.read_u8())
    else {
        warn!("TileArea node missing its base coordinates, skipping");
        stats.entries_skipped += 1;
        return;
    };

    for tile_node in area.children_mut() {
        match parse_tile(tile_node, base_x, base_y, base_z, otbm_version) {
            Ok(tile) => {
                stats.items_read += tile.ground.as_ref().map_or(0, count_items)
                    + tile.items.iter().map(count_items).sum::<u64>();
                builder.set_tile(tile.position, tile);
                stats.tiles_read += 1;
            }
            Err(error) => {
                trace!("skipping tile in area ({base_x}, {base_y}, {base_z}): {error}");
                stats.tiles_skipped += 1;
            }
        }
    }
}

/// Counts `item` and every item nested in its container contents, recursively.
fn count_items(item: &Item) -> u64 {
    1 + item.contents.iter().map(count_items).sum::<u64>()
}

fn parse_tile(tile_node: &mut BinaryNode, base_x: u16, base_y: u16, base_z: u8, otbm_version: u32) -> Result<Tile, String> {
    let x_offset = tile_node.read_u8().ok_or("missing x_offset")?;
    let y_offset = tile_node.read_u8().ok_or("missing y_offset")?;
    let house_id = if tile_node.node_type() == node::HOUSE_TILE {
        tile_node.read_u32().ok_or("missing house_id")?
    } else {
        0
    };

    let pos = Position::new(
        i32::from(base_x) + i32::from(x_offset),
        i32::from(base_y) + i32::from(y_offset),
        base_z,
    );

    let mut tile = Tile::new(pos);
    tile.house_id = house_id;

    loop {
        let Some(tag) = tile_node.read_u8() else { break };
        match tag {
            attr::TILE_FLAGS => {
                let flags = tile_node.read_u32().ok_or("missing tile flags")?;
                tile.flags = TileFlags::from_bits(flags);
            }
            attr::ITEM => {
                // Inline items in the attribute stream carry only a server id, unlike full
                // `Item` child nodes, which have their own attribute stream and children.
                let server_id = tile_node.read_u16().ok_or("missing inline item id")?;
                tile.add_item(mapcore_datatypes::Item::new(server_id));
            }
            other => {
                warn!("unrecognised tile attribute tag {other}, stopping attribute loop");
                break;
            }
        }
    }

    let mut ground_set = tile.ground.is_some();
    for child in tile_node.children_mut() {
        let item = parse_item(child, otbm_version).map_err(|error| error.to_string())?;
        if ground_set {
            tile.add_item_direct(item);
        } else {
            tile.set_ground(item);
            ground_set = true;
        }
    }

    Ok(tile)
}

/// Buckets tiles by `(base_x, base_y, base_z)` (`floor_div(x, 256) * 256`, same for `y`) and
/// writes one `TileArea` node per bucket, in ascending order, mirroring the read path.
pub fn write_tile_areas(writer: &mut NodeWriter, map: &mapcore_datatypes::ChunkedMap, otbm_version: u32) {
    const AREA_SIZE: i32 = 256;

    let mut by_area: std::collections::BTreeMap<(i32, i32, u8), Vec<Tile>> = std::collections::BTreeMap::new();
    map.for_each_tile(|tile| {
        let base_x = tile.position.x.div_euclid(AREA_SIZE) * AREA_SIZE;
        let base_y = tile.position.y.div_euclid(AREA_SIZE) * AREA_SIZE;
        by_area.entry((base_x, base_y, tile.position.z)).or_default().push(tile.clone());
    });

    for ((base_x, base_y, base_z), tiles) in by_area {
        writer.begin_node(node::TILE_AREA);
        writer.write_u16(base_x as u16);
        writer.write_u16(base_y as u16);
        writer.write_u8(base_z);

        for tile in &tiles {
            write_tile(writer, tile, base_x, base_y, otbm_version);
        }

        writer.end_node();
    }
}

fn write_tile(writer: &mut NodeWriter, tile: &Tile, base_x: i32, base_y: i32, otbm_version: u32) {
    let node_type = if tile.house_id != 0 { node::HOUSE_TILE } else { node::TILE };
    writer.begin_node(node_type);
    writer.write_u8((tile.position.x - base_x) as u8);
    writer.write_u8((tile.position.y - base_y) as u8);
    if tile.house_id != 0 {
        writer.write_u32(tile.house_id);
    }

    if tile.flags.bits() != 0 {
        writer.write_u8(attr::TILE_FLAGS);
        writer.write_u32(tile.flags.bits());
    }

    if let Some(ground) = &tile.ground {
        if ground.is_complex() {
            write_item(writer, ground, otbm_version);
        } else {
            writer.write_u8(attr::ITEM);
            writer.write_u16(ground.server_id);
        }
    }

    for item in &tile.items {
        write_item(writer, item, otbm_version);
    }

    writer.end_node();
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::{ChunkedMap, Item};

    use super::*;
    use crate::builder::ChunkedMapBuilder;

    fn round_trip(map: &ChunkedMap) -> ChunkedMap {
        let mut writer = NodeWriter::new();
        writer.begin_node(0); // synthetic wrapper standing in for MapData in this test
        write_tile_areas(&mut writer, map, 4);
        writer.end_node();

        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());
        let reader = NodeReader::from_bytes(&data, *b"TEST").unwrap();
        let mut wrapper = reader.into_root();

        let mut out = ChunkedMap::new();
        let mut builder = ChunkedMapBuilder::new(&mut out);
        let mut stats = crate::error::ReadStats::default();
        for area in wrapper.children_mut() {
            parse_tile_area(area, 4, &mut builder, &mut stats);
        }
        out
    }

    #[test]
    fn round_trips_a_tile_with_ground_and_a_complex_stacked_item() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(100, 100, 7);

        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(100));
        let mut stacked = Item::new(200);
        stacked.data.action_id = 42;
        tile.add_item_direct(stacked);
        map.set_tile(pos, tile);

        let restored = round_trip(&map);
        let tile = restored.get_tile(pos).unwrap();

        assert_eq!(tile.ground.as_ref().unwrap().server_id, 100);
        assert_eq!(tile.items.len(), 1);
        assert_eq!(tile.items[0].server_id, 200);
        assert_eq!(tile.items[0].data.action_id, 42);
    }

    #[test]
    fn parsing_a_tile_area_counts_ground_and_stacked_items() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(100, 100, 7);

        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        tile.add_item_direct(Item::new(201));
        map.set_tile(pos, tile);

        let mut writer = NodeWriter::new();
        writer.begin_node(0);
        write_tile_areas(&mut writer, &map, 4);
        writer.end_node();

        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());
        let reader = NodeReader::from_bytes(&data, *b"TEST").unwrap();
        let mut wrapper = reader.into_root();

        let mut out = ChunkedMap::new();
        let mut builder = ChunkedMapBuilder::new(&mut out);
        let mut stats = crate::error::ReadStats::default();
        for area in wrapper.children_mut() {
            parse_tile_area(area, 4, &mut builder, &mut stats);
        }

        assert_eq!(stats.tiles_read, 1);
        assert_eq!(stats.items_read, 3);
    }

    #[test]
    fn round_trips_a_house_tile_with_flags() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(5, 5, 7);

        let mut tile = Tile::new(pos);
        tile.house_id = 7;
        tile.flags.set(TileFlags::PROTECTION_ZONE, true);
        map.set_tile(pos, tile);

        let restored = round_trip(&map);
        let tile = restored.get_tile(pos).unwrap();

        assert_eq!(tile.house_id, 7);
        assert!(tile.flags.contains(TileFlags::PROTECTION_ZONE));
    }
}
