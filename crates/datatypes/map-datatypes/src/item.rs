#[cfg(feature = "attribute_map")]
use indexmap::IndexMap;

/// A generic typed attribute value, used by format v4's per-item attribute map.
#[cfg(feature = "attribute_map")]
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Fields that are rarely set on an item; kept out of [`Item`] itself so that the common
/// case (a plain item with none of these) doesn't pay for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemExtension {
    pub text:                Option<String>,
    pub description:         Option<String>,
    pub teleport_destination: Option<(i32, i32, u8)>,
    pub depot_id:            Option<u16>,
    pub door_id:             Option<u8>,
    #[cfg(feature = "attribute_map")]
    pub attributes:          IndexMap<String, AttributeValue>,
}

impl ItemExtension {
    pub fn is_empty(&self) -> bool {
        let base_empty = self.text.is_none()
            && self.description.is_none()
            && self.teleport_destination.is_none()
            && self.depot_id.is_none()
            && self.door_id.is_none();

        #[cfg(feature = "attribute_map")]
        let base_empty = base_empty && self.attributes.is_empty();

        base_empty
    }
}

/// Inline, cheap-to-copy item data. Anything rarer lives in the lazily-allocated
/// [`ItemExtension`] behind [`Item::extension`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemData {
    pub action_id: u16,
    pub unique_id: u16,
    pub count:     u8,
    pub charges:   u8,
    pub tier:      u8,
    pub duration:  u16,
}

/// A single item. Items may contain other items (a container); ownership of those children
/// is exclusive to the container item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub server_id: u16,
    pub client_id: Option<u16>,
    pub data:      ItemData,
    pub extension: Option<Box<ItemExtension>>,
    pub contents:  Vec<Item>,
}

impl Item {
    pub fn new(server_id: u16) -> Self {
        Self { server_id, ..Default::default() }
    }

    /// An item is "complex" if it carries anything beyond a bare server id: a non-default
    /// action/unique id, a stack count greater than one, an allocated extension record, or
    /// container contents. Used to decide whether a tile's stacked-item list needs to keep
    /// full fidelity or can be represented compactly.
    pub fn is_complex(&self) -> bool {
        self.data.action_id != 0
            || self.data.unique_id != 0
            || self.data.count > 1
            || self.extension.is_some()
            || !self.contents.is_empty()
    }

    pub fn extension_mut(&mut self) -> &mut ItemExtension {
        self.extension.get_or_insert_with(|| Box::new(ItemExtension::default()))
    }

    /// Drops the extension record if it's now empty, so that a cleared-out item doesn't
    /// keep paying for an allocation it no longer needs.
    pub fn prune_extension(&mut self) {
        if self.extension.as_deref().is_some_and(ItemExtension::is_empty) {
            self.extension = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_item_is_not_complex() {
        let item = Item::new(100);
        assert!(!item.is_complex());
    }

    #[test]
    fn item_with_action_id_is_complex() {
        let mut item = Item::new(100);
        item.data.action_id = 42;
        assert!(item.is_complex());
    }

    #[test]
    fn pruning_removes_an_empty_extension() {
        let mut item = Item::new(100);
        item.extension_mut();
        item.prune_extension();
        assert!(item.extension.is_none());
    }
}
