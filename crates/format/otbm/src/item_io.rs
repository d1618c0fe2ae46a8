use log::warn;
use mapcore_codec::{BinaryNode, CodecError, NodeStructureError, NodeWriter, StructureError};
use mapcore_datatypes::{AttributeValue, Item};

use crate::node_types::{attr_map_value, item_attr, node, ATTRIBUTE_MAP_VERSION};

/// Parses one `Item` node: its own inline fields, its attribute stream, and its children
/// (nested container contents), recursively.
pub fn parse_item(node: &mut BinaryNode, otbm_version: u32) -> Result<Item, StructureError> {
    if node.node_type() != node::ITEM {
        return Err(NodeStructureError::unexpected_node_type(node::ITEM, node.node_type()).into());
    }

    let server_id = node.read_u16().ok_or_else(|| {
        NodeStructureError::field_read_failed("item.server_id")
    })?;

    let mut item = Item::new(server_id);

    loop {
        let Some(tag) = node.read_u8() else { break };
        match tag {
            item_attr::ACTION_ID => item.data.action_id = read_u16_field(node, "action_id")?,
            item_attr::UNIQUE_ID => item.data.unique_id = read_u16_field(node, "unique_id")?,
            item_attr::COUNT     => item.data.count    = read_u8_field(node, "count")?,
            item_attr::CHARGES   => item.data.charges  = read_u8_field(node, "charges")?,
            item_attr::TIER      => item.data.tier     = read_u8_field(node, "tier")?,
            item_attr::DURATION  => item.data.duration = read_u16_field(node, "duration")?,
            item_attr::TEXT => {
                let text = read_string_field(node, "text")?;
                item.extension_mut().text = Some(text);
            }
            item_attr::DESCRIPTION => {
                let description = read_string_field(node, "description")?;
                item.extension_mut().description = Some(description);
            }
            item_attr::TELEPORT_DESTINATION => {
                let x = read_u16_field(node, "teleport.x")?;
                let y = read_u16_field(node, "teleport.y")?;
                let z = read_u8_field(node, "teleport.z")?;
                item.extension_mut().teleport_destination = Some((i32::from(x), i32::from(y), z));
            }
            item_attr::DEPOT_ID => {
                item.extension_mut().depot_id = Some(read_u16_field(node, "depot_id")?);
            }
            item_attr::HOUSE_DOOR_ID => {
                item.extension_mut().door_id = Some(read_u8_field(node, "door_id")?);
            }
            item_attr::ATTRIBUTE_MAP if otbm_version >= ATTRIBUTE_MAP_VERSION => {
                parse_attribute_map(node, &mut item)?;
            }
            other => {
                warn!("unrecognised item attribute tag {other}, stopping attribute loop");
                break;
            }
        }
    }

    for child in node.children_mut() {
        item.contents.push(parse_item(child, otbm_version)?);
    }

    Ok(item)
}

fn parse_attribute_map(cursor: &mut BinaryNode, item: &mut Item) -> Result<(), StructureError> {
    let count = read_u16_field(cursor, "attribute_map.count")?;
    for _ in 0..count {
        let key = read_string_field(cursor, "attribute_map.key")?;
        let value_tag = read_u8_field(cursor, "attribute_map.value_tag")?;
        let value = match value_tag {
            attr_map_value::STRING => AttributeValue::String(read_string_field(cursor, "attribute_map.value")?),
            attr_map_value::INT    => AttributeValue::Int(cursor.read_i64().ok_or_else(|| {
                NodeStructureError::field_read_failed("attribute_map.value")
            })?),
            attr_map_value::FLOAT  => AttributeValue::Float(cursor.read_f64().ok_or_else(|| {
                NodeStructureError::field_read_failed("attribute_map.value")
            })?),
            attr_map_value::BOOL   => AttributeValue::Bool(cursor.read_bool().ok_or_else(|| {
                NodeStructureError::field_read_failed("attribute_map.value")
            })?),
            other => return Err(CodecError::custom(format!("unknown attribute map value tag {other}")).into()),
        };
        item.extension_mut().attributes.insert(key, value);
    }
    Ok(())
}

fn read_u8_field(cursor: &mut BinaryNode, field: &str) -> Result<u8, StructureError> {
    cursor.read_u8().ok_or_else(|| NodeStructureError::field_read_failed(field).into())
}

fn read_u16_field(cursor: &mut BinaryNode, field: &str) -> Result<u16, StructureError> {
    cursor.read_u16().ok_or_else(|| NodeStructureError::field_read_failed(field).into())
}

fn read_string_field(cursor: &mut BinaryNode, field: &str) -> Result<String, StructureError> {
    cursor.read_string()?.ok_or_else(|| NodeStructureError::field_read_failed(field).into())
}

/// Writes one `Item` node: inline fields, attributes (only those actually set), and any
/// container contents, recursively.
pub fn write_item(writer: &mut NodeWriter, item: &Item, otbm_version: u32) {
    writer.begin_node(node::ITEM);
    writer.write_u16(item.server_id);

    if item.data.action_id != 0 {
        writer.write_u8(item_attr::ACTION_ID);
        writer.write_u16(item.data.action_id);
    }
    if item.data.unique_id != 0 {
        writer.write_u8(item_attr::UNIQUE_ID);
        writer.write_u16(item.data.unique_id);
    }
    if item.data.count > 1 {
        writer.write_u8(item_attr::COUNT);
        writer.write_u8(item.data.count);
    }
    if item.data.charges != 0 {
        writer.write_u8(item_attr::CHARGES);
        writer.write_u8(item.data.charges);
    }
    if item.data.tier != 0 {
        writer.write_u8(item_attr::TIER);
        writer.write_u8(item.data.tier);
    }
    if item.data.duration != 0 {
        writer.write_u8(item_attr::DURATION);
        writer.write_u16(item.data.duration);
    }

    if let Some(extension) = &item.extension {
        if let Some(text) = &extension.text {
            writer.write_u8(item_attr::TEXT);
            writer.write_string(text);
        }
        if let Some(description) = &extension.description {
            writer.write_u8(item_attr::DESCRIPTION);
            writer.write_string(description);
        }
        if let Some((x, y, z)) = extension.teleport_destination {
            writer.write_u8(item_attr::TELEPORT_DESTINATION);
            writer.write_u16(x as u16);
            writer.write_u16(y as u16);
            writer.write_u8(z);
        }
        if let Some(depot_id) = extension.depot_id {
            writer.write_u8(item_attr::DEPOT_ID);
            writer.write_u16(depot_id);
        }
        if let Some(door_id) = extension.door_id {
            writer.write_u8(item_attr::HOUSE_DOOR_ID);
            writer.write_u8(door_id);
        }

        if !extension.attributes.is_empty() && otbm_version >= ATTRIBUTE_MAP_VERSION {
            writer.write_u8(item_attr::ATTRIBUTE_MAP);
            writer.write_u16(extension.attributes.len() as u16);
            for (key, value) in &extension.attributes {
                writer.write_string(key);
                match value {
                    AttributeValue::String(s) => { writer.write_u8(attr_map_value::STRING); writer.write_string(s); }
                    AttributeValue::Int(i)    => { writer.write_u8(attr_map_value::INT); writer.write_i64(*i); }
                    AttributeValue::Float(f)  => { writer.write_u8(attr_map_value::FLOAT); writer.write_f64(*f); }
                    AttributeValue::Bool(b)   => { writer.write_u8(attr_map_value::BOOL); writer.write_bool(*b); }
                }
            }
        }
    }

    for child in &item.contents {
        write_item(writer, child, otbm_version);
    }

    writer.end_node();
}

#[cfg(test)]
mod tests {
    use mapcore_codec::NodeReader;
    use mapcore_datatypes::AttributeValue;

    use super::*;

    fn round_trip(item: &Item, otbm_version: u32) -> Item {
        let mut writer = NodeWriter::new();
        write_item(&mut writer, item, otbm_version);
        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());

        let reader = NodeReader::from_bytes(&data, *b"TEST").unwrap();
        let mut root = reader.into_root();
        parse_item(&mut root, otbm_version).unwrap()
    }

    #[test]
    fn round_trips_a_bare_item() {
        let item = Item::new(1234);
        let restored = round_trip(&item, ATTRIBUTE_MAP_VERSION);
        assert_eq!(restored.server_id, 1234);
        assert!(!restored.is_complex());
    }

    #[test]
    fn round_trips_nested_container_contents() {
        let mut outer = Item::new(100);
        outer.contents.push(Item::new(200));
        outer.contents.push(Item::new(300));

        let restored = round_trip(&outer, ATTRIBUTE_MAP_VERSION);
        assert_eq!(restored.contents.len(), 2);
        assert_eq!(restored.contents[0].server_id, 200);
        assert_eq!(restored.contents[1].server_id, 300);
    }

    #[test]
    fn round_trips_the_attribute_map_on_version_4() {
        let mut item = Item::new(100);
        item.extension_mut().attributes.insert("owner".into(), AttributeValue::String("alice".into()));
        item.extension_mut().attributes.insert("durability".into(), AttributeValue::Int(42));

        let restored = round_trip(&item, ATTRIBUTE_MAP_VERSION);
        let attributes = &restored.extension.unwrap().attributes;
        assert_eq!(attributes.get("owner"), Some(&AttributeValue::String("alice".into())));
        assert_eq!(attributes.get("durability"), Some(&AttributeValue::Int(42)));
    }

    #[test]
    fn attribute_map_is_skipped_below_version_4() {
        let mut item = Item::new(100);
        item.extension_mut().attributes.insert("owner".into(), AttributeValue::String("alice".into()));

        let restored = round_trip(&item, 3);
        assert!(restored.extension.is_none());
    }
}
