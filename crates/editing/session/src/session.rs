use mapcore_datatypes::{ChunkedMap, EntityType, Position, Tile};
use mapcore_history::{ActionType, HistoryConfig, HistoryManager};
use mapcore_preview::{CopyBuffer, PastePreview, PreviewService, RelativePosition};
use mapcore_selection::{SelectionFilter, SelectionService};

use crate::clipboard::ClipboardService;

/// The pure domain data of one open map: the map itself, selection state, and undo/redo
/// history, plus the bookkeeping every open document needs (file path, dirty flag). Decoupled
/// from any rendering or view-state concern, which [`EditorSession`] layers on top.
#[derive(Debug)]
pub struct MapInstance {
    map:       ChunkedMap,
    selection: SelectionService,
    history:   HistoryManager,
    file_path: Option<String>,
    modified:  bool,
}

impl MapInstance {
    pub fn new(map: ChunkedMap) -> Self {
        Self { map, selection: SelectionService::new(), history: HistoryManager::new(HistoryConfig::default()), file_path: None, modified: false }
    }

    pub fn map(&self) -> &ChunkedMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut ChunkedMap {
        &mut self.map
    }

    pub fn selection(&self) -> &SelectionService {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionService {
        &mut self.selection
    }

    pub fn history_mut(&mut self) -> &mut HistoryManager {
        &mut self.history
    }

    pub fn select_region(&mut self, min_x: i32, min_y: i32, max_x: i32, max_y: i32, z: u8) {
        self.selection.select_region(&self.map, min_x, min_y, max_x, max_y, z, &SelectionFilter::all());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Deletes every selected entity. The selection is cleared before any tile is touched, so
    /// that whatever observes selection changes sees a consistent "nothing selected" state
    /// while the entities it referred to still exist, rather than after they've already been
    /// removed.
    pub fn delete_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }

        let entries = self.selection.all_entries();

        self.history.begin_operation("Delete selection", ActionType::Delete, Some(&self.selection));

        let mut affected: Vec<Position> = Vec::new();
        for entry in &entries {
            let pos = entry.position();
            if !affected.contains(&pos) {
                affected.push(pos);
            }
        }

        self.selection.clear();

        for pos in &affected {
            self.history.record_tile_before(*pos, self.map.get_tile(*pos));
        }

        for entry in entries {
            let Some(tile) = self.map.get_tile_mut(entry.position()) else { continue };
            match entry.id.entity_type {
                EntityType::Ground => tile.ground = None,
                EntityType::Item => {
                    let idx = entry.id.local_id as usize;
                    if idx < tile.items.len() {
                        tile.items.remove(idx);
                    }
                }
                EntityType::Creature => tile.creature = None,
                EntityType::Spawn => tile.spawn = None,
            }
        }

        self.history.end_operation(&self.map, Some(&self.selection));
        self.set_modified(true);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Option<String> {
        let desc = self.history.undo(&mut self.map, Some(&mut self.selection));
        if desc.is_some() {
            self.set_modified(true);
        }
        desc
    }

    pub fn redo(&mut self) -> Option<String> {
        let desc = self.history.redo(&mut self.map, Some(&mut self.selection));
        if desc.is_some() {
            self.set_modified(true);
        }
        desc
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, path: impl Into<String>) {
        self.file_path = Some(path.into());
    }

    pub fn display_name(&self) -> String {
        let base = self.file_path.as_deref().map_or("Untitled", |path| {
            let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
            match file_name.rfind('.') {
                Some(0) | None => file_name,
                Some(dot) => &file_name[..dot],
            }
        });
        if self.modified { format!("{base}*") } else { base.to_string() }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
}

/// Camera/zoom state preserved when switching between open map tabs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub camera_x:        f32,
    pub camera_y:         f32,
    pub zoom:             f32,
    pub current_floor:    u8,
    pub lighting_enabled: bool,
    pub ambient_light:    i32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { camera_x: 0.0, camera_y: 0.0, zoom: 1.0, current_floor: mapcore_datatypes::GROUND_FLOOR, lighting_enabled: false, ambient_light: 128 }
    }
}

/// Minimap pan/zoom state, preserved per tab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapState {
    pub center_x:  i32,
    pub center_y:  i32,
    pub floor:     u8,
    pub zoom_level: u8,
}

impl Default for MinimapState {
    fn default() -> Self {
        Self { center_x: 0, center_y: 0, floor: mapcore_datatypes::GROUND_FLOOR, zoom_level: 2 }
    }
}

/// In-game preview window state, preserved per tab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngamePreviewState {
    pub is_open:      bool,
    pub follow_cursor: bool,
    pub locked_x:     i32,
    pub locked_y:     i32,
    pub locked_z:     u8,
    pub width_tiles:  i32,
    pub height_tiles: i32,
}

impl Default for IngamePreviewState {
    fn default() -> Self {
        Self { is_open: false, follow_cursor: true, locked_x: 0, locked_y: 0, locked_z: mapcore_datatypes::GROUND_FLOOR, width_tiles: 15, height_tiles: 11 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowseTileState {
    pub is_open: bool,
}

/// Pending paste state: the tiles awaiting a target position, and whether confirming should
/// replace destination tiles outright or merge onto them.
#[derive(Debug, Clone)]
struct PasteState {
    tiles:        Vec<(RelativePosition, Tile)>,
    replace_mode: bool,
}

/// Merges `incoming`'s content onto `existing` in place: ground fills in only if missing,
/// items always append, and (unlike plain map-to-map merging) a creature or spawn fills in
/// only if the destination doesn't already have one.
fn merge_entities_into(existing: &mut Tile, incoming: &Tile) {
    if existing.ground.is_none() {
        existing.ground.clone_from(&incoming.ground);
    }
    for item in &incoming.items {
        existing.add_item(item.clone());
    }
    if existing.creature.is_none() {
        existing.creature.clone_from(&incoming.creature);
    }
    if existing.spawn.is_none() {
        existing.spawn.clone_from(&incoming.spawn);
    }
}

/// One open map tab: the document plus clipboard, preview, and view state that only matter
/// while a tab is open. Per-tab rendering state (camera, minimap, in-game preview, browse
/// tile) is preserved across tab switches but never touched by the editing operations
/// themselves.
#[derive(Debug)]
pub struct EditorSession {
    document: MapInstance,
    clipboard: ClipboardService,
    preview:  PreviewService,
    paste:    Option<PasteState>,

    pub view_state:           ViewState,
    pub minimap_state:        MinimapState,
    pub ingame_preview_state: IngamePreviewState,
    pub browse_tile_state:    BrowseTileState,
}

impl EditorSession {
    pub fn new(map: ChunkedMap) -> Self {
        Self {
            document: MapInstance::new(map),
            clipboard: ClipboardService::new(),
            preview: PreviewService::new(),
            paste: None,
            view_state: ViewState::default(),
            minimap_state: MinimapState::default(),
            ingame_preview_state: IngamePreviewState::default(),
            browse_tile_state: BrowseTileState::default(),
        }
    }

    pub fn document(&self) -> &MapInstance {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut MapInstance {
        &mut self.document
    }

    pub fn map(&self) -> &ChunkedMap {
        self.document.map()
    }

    pub fn map_mut(&mut self) -> &mut ChunkedMap {
        self.document.map_mut()
    }

    pub fn selection(&self) -> &SelectionService {
        self.document.selection()
    }

    pub fn selection_mut(&mut self) -> &mut SelectionService {
        self.document.selection_mut()
    }

    pub fn clipboard(&self) -> &ClipboardService {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut ClipboardService {
        &mut self.clipboard
    }

    pub fn preview(&self) -> &PreviewService {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewService {
        &mut self.preview
    }

    pub fn is_pasting(&self) -> bool {
        self.paste.is_some()
    }

    pub fn is_paste_replace_mode(&self) -> bool {
        self.paste.as_ref().is_some_and(|p| p.replace_mode)
    }

    /// Enters paste-preview mode: clones `tiles` for safekeeping and installs a paste preview
    /// on the session's [`PreviewService`], but touches nothing on the map yet.
    pub fn start_paste(&mut self, tiles: Vec<(RelativePosition, Tile)>, replace_mode: bool) {
        let buffer = CopyBuffer { origin: Position::default(), tiles: tiles.clone() };
        self.preview.set_paste_preview(PastePreview::new(&buffer));
        self.paste = Some(PasteState { tiles, replace_mode });
    }

    pub fn cancel_paste(&mut self) {
        self.paste = None;
        self.preview.clear();
    }

    /// Commits a pending paste at `target_pos`: in replace mode, every pasted tile overwrites
    /// whatever's at its destination; otherwise each pasted tile is merged onto the
    /// destination the same way [`crate::MapMergeService`]'s non-overwrite branch merges maps,
    /// extended to also fill in a missing creature or spawn.
    pub fn confirm_paste(&mut self, target_pos: Position, replace_mode: bool) {
        let Some(paste) = self.paste.take() else { return };

        self.document.history.begin_operation("Paste", ActionType::Paste, Some(&self.document.selection));

        for (rel, _) in &paste.tiles {
            let abs = Self::absolute(target_pos, *rel);
            self.document.history.record_tile_before(abs, self.document.map.get_tile(abs));
        }

        for (rel, tile) in paste.tiles {
            let abs = Self::absolute(target_pos, rel);
            if replace_mode {
                let mut placed = tile;
                placed.position = abs;
                self.document.map.set_tile(abs, placed);
            } else {
                let dest = self.document.map.get_or_create_tile(abs);
                merge_entities_into(dest, &tile);
            }
        }

        self.document.history.end_operation(&self.document.map, Some(&self.document.selection));
        self.document.set_modified(true);
        self.preview.clear();
    }

    fn absolute(target: Position, rel: RelativePosition) -> Position {
        let z = (i32::from(target.z) + rel.z).clamp(0, i32::from(mapcore_datatypes::MAX_FLOOR));
        Position::new(target.x + rel.x, target.y + rel.y, z as u8)
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::Item;

    use super::*;

    #[test]
    fn a_fresh_session_has_no_selection_and_is_unmodified() {
        let session = EditorSession::new(ChunkedMap::new());
        assert!(session.selection().is_empty());
        assert!(!session.document().is_modified());
        assert_eq!(session.document().display_name(), "Untitled");
    }

    #[test]
    fn deleting_a_selection_clears_it_before_removing_tiles() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(1));
        map.set_tile(pos, tile);

        let mut session = EditorSession::new(map);
        session.document_mut().select_region(1, 1, 1, 1, 7);
        session.document_mut().delete_selection();

        assert!(session.selection().is_empty());
        assert!(session.map().get_tile(pos).unwrap().is_empty());
        assert!(session.document().is_modified());
    }

    #[test]
    fn undo_restores_a_deleted_selection() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(42));
        map.set_tile(pos, tile);

        let mut session = EditorSession::new(map);
        session.document_mut().select_region(1, 1, 1, 1, 7);
        session.document_mut().delete_selection();
        assert!(session.document_mut().undo().is_some());

        assert_eq!(session.map().get_tile(pos).unwrap().ground.as_ref().unwrap().server_id, 42);
    }

    #[test]
    fn confirm_paste_in_replace_mode_overwrites_the_destination() {
        let mut session = EditorSession::new(ChunkedMap::new());

        let mut pasted = Tile::new(Position::default());
        pasted.set_ground(Item::new(10));
        session.start_paste(vec![(RelativePosition::new(0, 0, 0), pasted)], true);
        assert!(session.is_pasting());

        session.confirm_paste(Position::new(5, 5, 7), true);

        assert!(!session.is_pasting());
        assert_eq!(session.map().get_tile(Position::new(5, 5, 7)).unwrap().ground.as_ref().unwrap().server_id, 10);
    }

    #[test]
    fn confirm_paste_in_merge_mode_keeps_the_existing_ground() {
        let mut map = ChunkedMap::new();
        let mut existing = Tile::new(Position::new(5, 5, 7));
        existing.set_ground(Item::new(1));
        map.set_tile(Position::new(5, 5, 7), existing);
        let mut session = EditorSession::new(map);

        let mut pasted = Tile::new(Position::default());
        pasted.set_ground(Item::new(2));
        pasted.add_item_direct(Item::new(300));
        session.start_paste(vec![(RelativePosition::new(0, 0, 0), pasted)], false);
        session.confirm_paste(Position::new(5, 5, 7), false);

        let tile = session.map().get_tile(Position::new(5, 5, 7)).unwrap();
        assert_eq!(tile.ground.as_ref().unwrap().server_id, 1);
        assert_eq!(tile.items.len(), 1);
    }

    #[test]
    fn cancel_paste_leaves_the_map_untouched() {
        let mut session = EditorSession::new(ChunkedMap::new());
        let mut pasted = Tile::new(Position::default());
        pasted.set_ground(Item::new(10));
        session.start_paste(vec![(RelativePosition::new(0, 0, 0), pasted)], true);

        session.cancel_paste();
        assert!(!session.is_pasting());
        assert!(session.map().get_tile(Position::new(0, 0, 7)).is_none());
    }
}
