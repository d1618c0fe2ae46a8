use std::path::Path;

use mapcore_codec::NodeWriter;
use mapcore_datatypes::ChunkedMap;

use crate::entities_io::{write_spawns, write_towns, write_waypoints};
use crate::error::OtbmError;
use crate::node_types::{attr, node, FILE_IDENTIFIER};
use crate::tile_io::write_tile_areas;

/// Serializes `map` to `path` as a complete map file: the four-byte identifier, the root
/// header, and a `MapData` node holding the map's attributes followed by its tile areas,
/// towns, spawns, and waypoints, in that order.
pub fn write_map(path: &Path, map: &ChunkedMap) -> Result<(), OtbmError> {
    let mut writer = NodeWriter::new();

    writer.begin_node(node::ROOT_HEADER);
    writer.write_u32(map.version.otbm_version);
    writer.write_u16(map.width);
    writer.write_u16(map.height);
    writer.write_u32(map.version.items_major);
    writer.write_u32(map.version.items_minor);

    writer.begin_node(node::MAP_DATA);
    if !map.description.is_empty() {
        writer.write_u8(attr::DESCRIPTION);
        writer.write_string(&map.description);
    }
    if !map.spawn_file.is_empty() {
        writer.write_u8(attr::EXT_SPAWN_FILE);
        writer.write_string(&map.spawn_file);
    }
    if !map.house_file.is_empty() {
        writer.write_u8(attr::EXT_HOUSE_FILE);
        writer.write_string(&map.house_file);
    }

    write_tile_areas(&mut writer, map, map.version.otbm_version);
    write_towns(&mut writer, &map.towns);
    write_spawns(&mut writer, map);
    write_waypoints(&mut writer, &map.waypoints);

    writer.end_node(); // MapData
    writer.end_node(); // RootHeader

    writer
        .write_to(path, FILE_IDENTIFIER)
        .map_err(|error| OtbmError::Codec(mapcore_codec::CodecError::Io(error)))?;

    Ok(())
}
