use std::io::{Cursor, Read, Write};
use std::mem::size_of;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use mapcore_datatypes::{AttributeValue, Creature, Item, Position, Spawn, Tile};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("truncated or malformed tile snapshot buffer")]
    Malformed(#[from] std::io::Error),
    #[error("tile snapshot string was not valid UTF-8")]
    InvalidUtf8,
    #[error("tile snapshot had an unrecognised attribute value tag {0}")]
    UnknownAttributeTag(u8),
}

fn write_string(buf: &mut Vec<u8>, value: &str) {
    buf.write_u16::<LittleEndian>(value.len() as u16).expect("writing to a Vec never fails");
    buf.write_all(value.as_bytes()).expect("writing to a Vec never fails");
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String, SnapshotError> {
    let len = cursor.read_u16::<LittleEndian>()?;
    let mut bytes = vec![0u8; len as usize];
    cursor.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| SnapshotError::InvalidUtf8)
}

const HAS_TEXT: u8 = 1 << 0;
const HAS_DESCRIPTION: u8 = 1 << 1;
const HAS_TELEPORT: u8 = 1 << 2;
const HAS_DEPOT_ID: u8 = 1 << 3;
const HAS_DOOR_ID: u8 = 1 << 4;
const HAS_CONTENTS: u8 = 1 << 5;
const HAS_ATTRIBUTES: u8 = 1 << 6;

const ATTR_VALUE_STRING: u8 = 0;
const ATTR_VALUE_INT: u8 = 1;
const ATTR_VALUE_FLOAT: u8 = 2;
const ATTR_VALUE_BOOL: u8 = 3;

fn serialize_item(buf: &mut Vec<u8>, item: &Item) {
    buf.write_u16::<LittleEndian>(item.server_id).expect("writing to a Vec never fails");
    buf.write_u16::<LittleEndian>(item.client_id.unwrap_or(0)).expect("writing to a Vec never fails");

    buf.write_u16::<LittleEndian>(item.data.action_id).expect("writing to a Vec never fails");
    buf.write_u16::<LittleEndian>(item.data.unique_id).expect("writing to a Vec never fails");
    buf.write_u8(item.data.count).expect("writing to a Vec never fails");
    buf.write_u8(item.data.charges).expect("writing to a Vec never fails");
    buf.write_u8(item.data.tier).expect("writing to a Vec never fails");
    buf.write_u16::<LittleEndian>(item.data.duration).expect("writing to a Vec never fails");

    let extension = item.extension.as_deref();
    let text = extension.and_then(|e| e.text.as_deref());
    let description = extension.and_then(|e| e.description.as_deref());
    let teleport = extension.and_then(|e| e.teleport_destination);
    let depot_id = extension.and_then(|e| e.depot_id);
    let door_id = extension.and_then(|e| e.door_id);
    let attributes = extension.filter(|e| !e.attributes.is_empty()).map(|e| &e.attributes);

    let mut flags = 0u8;
    if text.is_some() { flags |= HAS_TEXT; }
    if description.is_some() { flags |= HAS_DESCRIPTION; }
    if teleport.is_some() { flags |= HAS_TELEPORT; }
    if depot_id.is_some() { flags |= HAS_DEPOT_ID; }
    if door_id.is_some() { flags |= HAS_DOOR_ID; }
    if attributes.is_some() { flags |= HAS_ATTRIBUTES; }
    if !item.contents.is_empty() { flags |= HAS_CONTENTS; }
    buf.write_u8(flags).expect("writing to a Vec never fails");

    if let Some(text) = text { write_string(buf, text); }
    if let Some(description) = description { write_string(buf, description); }
    if let Some((x, y, z)) = teleport {
        buf.write_i32::<LittleEndian>(x).expect("writing to a Vec never fails");
        buf.write_i32::<LittleEndian>(y).expect("writing to a Vec never fails");
        buf.write_u8(z).expect("writing to a Vec never fails");
    }
    if let Some(depot_id) = depot_id { buf.write_u16::<LittleEndian>(depot_id).expect("writing to a Vec never fails"); }
    if let Some(door_id) = door_id { buf.write_u8(door_id).expect("writing to a Vec never fails"); }
    if let Some(attributes) = attributes {
        buf.write_u16::<LittleEndian>(attributes.len() as u16).expect("writing to a Vec never fails");
        for (key, value) in attributes {
            write_string(buf, key);
            match value {
                AttributeValue::String(s) => { buf.write_u8(ATTR_VALUE_STRING).expect("writing to a Vec never fails"); write_string(buf, s); }
                AttributeValue::Int(i)    => { buf.write_u8(ATTR_VALUE_INT).expect("writing to a Vec never fails"); buf.write_i64::<LittleEndian>(*i).expect("writing to a Vec never fails"); }
                AttributeValue::Float(f)  => { buf.write_u8(ATTR_VALUE_FLOAT).expect("writing to a Vec never fails"); buf.write_f64::<LittleEndian>(*f).expect("writing to a Vec never fails"); }
                AttributeValue::Bool(b)   => { buf.write_u8(ATTR_VALUE_BOOL).expect("writing to a Vec never fails"); buf.write_u8(u8::from(*b)).expect("writing to a Vec never fails"); }
            }
        }
    }

    if !item.contents.is_empty() {
        buf.write_u16::<LittleEndian>(item.contents.len() as u16).expect("writing to a Vec never fails");
        for child in &item.contents {
            serialize_item(buf, child);
        }
    }
}

fn deserialize_item(cursor: &mut Cursor<&[u8]>) -> Result<Item, SnapshotError> {
    let server_id = cursor.read_u16::<LittleEndian>()?;
    let client_id = cursor.read_u16::<LittleEndian>()?;

    let mut item = Item::new(server_id);
    item.client_id = (client_id != 0).then_some(client_id);

    item.data.action_id = cursor.read_u16::<LittleEndian>()?;
    item.data.unique_id = cursor.read_u16::<LittleEndian>()?;
    item.data.count = cursor.read_u8()?;
    item.data.charges = cursor.read_u8()?;
    item.data.tier = cursor.read_u8()?;
    item.data.duration = cursor.read_u16::<LittleEndian>()?;

    let flags = cursor.read_u8()?;
    if flags & HAS_TEXT != 0 {
        let text = read_string(cursor)?;
        item.extension_mut().text = Some(text);
    }
    if flags & HAS_DESCRIPTION != 0 {
        let description = read_string(cursor)?;
        item.extension_mut().description = Some(description);
    }
    if flags & HAS_TELEPORT != 0 {
        let x = cursor.read_i32::<LittleEndian>()?;
        let y = cursor.read_i32::<LittleEndian>()?;
        let z = cursor.read_u8()?;
        item.extension_mut().teleport_destination = Some((x, y, z));
    }
    if flags & HAS_DEPOT_ID != 0 {
        item.extension_mut().depot_id = Some(cursor.read_u16::<LittleEndian>()?);
    }
    if flags & HAS_DOOR_ID != 0 {
        item.extension_mut().door_id = Some(cursor.read_u8()?);
    }
    if flags & HAS_ATTRIBUTES != 0 {
        let count = cursor.read_u16::<LittleEndian>()?;
        for _ in 0..count {
            let key = read_string(cursor)?;
            let value_tag = cursor.read_u8()?;
            let value = match value_tag {
                ATTR_VALUE_STRING => AttributeValue::String(read_string(cursor)?),
                ATTR_VALUE_INT => AttributeValue::Int(cursor.read_i64::<LittleEndian>()?),
                ATTR_VALUE_FLOAT => AttributeValue::Float(cursor.read_f64::<LittleEndian>()?),
                ATTR_VALUE_BOOL => AttributeValue::Bool(cursor.read_u8()? != 0),
                other => return Err(SnapshotError::UnknownAttributeTag(other)),
            };
            item.extension_mut().attributes.insert(key, value);
        }
    }
    if flags & HAS_CONTENTS != 0 {
        let count = cursor.read_u16::<LittleEndian>()?;
        for _ in 0..count {
            item.contents.push(deserialize_item(cursor)?);
        }
    }

    Ok(item)
}

/// A serialized capture of one tile's complete state, used to store the before/after sides
/// of an undo/redo [`crate::HistoryEntry`]. An empty buffer means "no tile here" (the
/// position had nothing on it when captured); restoring such a snapshot means removing
/// whatever is there now.
#[derive(Debug, Clone, Default)]
pub struct TileSnapshot {
    position: Position,
    data:     Vec<u8>,
}

impl TileSnapshot {
    pub fn capture(tile: Option<&Tile>, pos: Position) -> Self {
        let Some(tile) = tile else {
            return Self { position: pos, data: Vec::new() };
        };

        let mut data = Vec::with_capacity(256);
        data.write_u8(1).expect("writing to a Vec never fails");
        data.write_i32::<LittleEndian>(pos.x).expect("writing to a Vec never fails");
        data.write_i32::<LittleEndian>(pos.y).expect("writing to a Vec never fails");
        data.write_i16::<LittleEndian>(i16::from(pos.z)).expect("writing to a Vec never fails");

        data.write_u16::<LittleEndian>(tile.flags.bits() as u16).expect("writing to a Vec never fails");
        data.write_u32::<LittleEndian>(tile.house_id).expect("writing to a Vec never fails");

        data.write_u8(u8::from(tile.ground.is_some())).expect("writing to a Vec never fails");
        if let Some(ground) = &tile.ground {
            serialize_item(&mut data, ground);
        }

        data.write_u16::<LittleEndian>(tile.items.len() as u16).expect("writing to a Vec never fails");
        for item in &tile.items {
            serialize_item(&mut data, item);
        }

        data.write_u8(u8::from(tile.spawn.is_some())).expect("writing to a Vec never fails");
        if let Some(spawn) = &tile.spawn {
            data.write_i32::<LittleEndian>(spawn.radius).expect("writing to a Vec never fails");
        }

        data.write_u8(u8::from(tile.creature.is_some())).expect("writing to a Vec never fails");
        if let Some(creature) = &tile.creature {
            write_string(&mut data, &creature.name);
        }

        Self { position: pos, data }
    }

    pub fn restore(&self) -> Result<Option<Tile>, SnapshotError> {
        if self.data.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(self.data.as_slice());
        let has_data = cursor.read_u8()?;
        if has_data == 0 {
            return Ok(None);
        }

        let x = cursor.read_i32::<LittleEndian>()?;
        let y = cursor.read_i32::<LittleEndian>()?;
        let z = cursor.read_i16::<LittleEndian>()? as u8;
        let pos = Position::new(x, y, z);

        let mut tile = Tile::new(pos);
        tile.flags = mapcore_datatypes::TileFlags::from_bits(u32::from(cursor.read_u16::<LittleEndian>()?));
        tile.house_id = cursor.read_u32::<LittleEndian>()?;

        if cursor.read_u8()? != 0 {
            tile.set_ground(deserialize_item(&mut cursor)?);
        }

        let item_count = cursor.read_u16::<LittleEndian>()?;
        for _ in 0..item_count {
            tile.add_item_direct(deserialize_item(&mut cursor)?);
        }

        if cursor.read_u8()? != 0 {
            let radius = cursor.read_i32::<LittleEndian>()?;
            tile.spawn = Some(Spawn::new(pos, radius));
        }

        if cursor.read_u8()? != 0 {
            let name = read_string(&mut cursor)?;
            tile.creature = Some(Creature::new(name));
        }

        Ok(Some(tile))
    }

    /// Builds a snapshot directly from already-serialized (and possibly just-decompressed)
    /// bytes, bypassing [`Self::capture`]. Used by the history entry's decompression path.
    pub fn with_data(position: Position, data: Vec<u8>) -> Self {
        Self { position, data }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    pub fn memsize(&self) -> usize {
        size_of::<Self>() + self.data.capacity()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::ItemExtension;

    #[test]
    fn empty_tile_snapshot_restores_to_none() {
        let snapshot = TileSnapshot::capture(None, Position::new(1, 1, 7));
        assert!(snapshot.is_empty());
        assert!(snapshot.restore().unwrap().is_none());
    }

    #[test]
    fn round_trips_a_tile_with_ground_items_spawn_and_creature() {
        let pos = Position::new(3, 4, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        tile.house_id = 7;
        tile.spawn = Some(Spawn::new(pos, 5));
        tile.creature = Some(Creature::new("rat"));

        let snapshot = TileSnapshot::capture(Some(&tile), pos);
        let restored = snapshot.restore().unwrap().unwrap();

        assert_eq!(restored.ground.unwrap().server_id, 100);
        assert_eq!(restored.items.len(), 1);
        assert_eq!(restored.items[0].server_id, 200);
        assert_eq!(restored.house_id, 7);
        assert_eq!(restored.spawn.unwrap().radius, 5);
        assert_eq!(restored.creature.unwrap().name, "rat");
    }

    #[test]
    fn round_trips_item_extension_fields_and_nested_contents() {
        let mut outer = Item::new(500);
        outer.extension = Some(Box::new(ItemExtension {
            text: Some("hello".into()),
            description: Some("a box".into()),
            teleport_destination: Some((10, 20, 7)),
            depot_id: Some(3),
            door_id: Some(9),
            ..Default::default()
        }));
        outer.extension_mut().attributes.insert("owner".into(), AttributeValue::String("alice".into()));
        outer.extension_mut().attributes.insert("durability".into(), AttributeValue::Int(42));
        outer.contents.push(Item::new(501));

        let mut tile = Tile::new(Position::default());
        tile.set_ground(outer);

        let snapshot = TileSnapshot::capture(Some(&tile), Position::default());
        let restored = snapshot.restore().unwrap().unwrap();
        let ground = restored.ground.unwrap();
        let extension = ground.extension.unwrap();

        assert_eq!(extension.text.as_deref(), Some("hello"));
        assert_eq!(extension.description.as_deref(), Some("a box"));
        assert_eq!(extension.teleport_destination, Some((10, 20, 7)));
        assert_eq!(extension.depot_id, Some(3));
        assert_eq!(extension.door_id, Some(9));
        assert_eq!(extension.attributes.get("owner"), Some(&AttributeValue::String("alice".into())));
        assert_eq!(extension.attributes.get("durability"), Some(&AttributeValue::Int(42)));
        assert_eq!(ground.contents.len(), 1);
        assert_eq!(ground.contents[0].server_id, 501);
    }
}
