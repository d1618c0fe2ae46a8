use mapcore_brushes::{Brush, BrushSettingsService};

use crate::provider::PreviewProvider;
use crate::types::{Anchor, PreviewBounds, PreviewStyle, PreviewTileData, RelativePosition};

/// Preview for the raw-item brush: one copy of the item at every brush-shaped offset.
#[derive(Debug)]
pub struct RawBrushPreview {
    item_id:         u16,
    subtype:         u8,
    anchor:          Anchor,
    tiles:           Vec<PreviewTileData>,
    bounds:          PreviewBounds,
    needs_regen:     bool,
    cached_offsets:  Vec<(i32, i32)>,
}

impl RawBrushPreview {
    pub fn new(item_id: u16, subtype: u8) -> Self {
        let mut preview = Self {
            item_id,
            subtype,
            anchor: Anchor::default(),
            tiles: Vec::new(),
            bounds: PreviewBounds::default(),
            needs_regen: false,
            cached_offsets: Vec::new(),
        };
        preview.build(None);
        preview
    }

    fn settings_changed(&self, settings: Option<&BrushSettingsService>) -> bool {
        settings.is_some_and(|s| s.brush_offsets() != self.cached_offsets)
    }

    fn build(&mut self, settings: Option<&BrushSettingsService>) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();
        self.needs_regen = false;

        if self.item_id == 0 {
            self.cached_offsets.clear();
            return;
        }

        let offsets = settings.map_or_else(|| vec![(0, 0)], BrushSettingsService::brush_offsets);
        self.cached_offsets = offsets.clone();

        for (dx, dy) in offsets {
            let mut tile = PreviewTileData::new(RelativePosition::new(dx, dy, 0));
            tile.add_item(self.item_id, self.subtype, 0.0);
            self.bounds.expand_pos(tile.relative_position);
            self.tiles.push(tile);
        }
    }

    /// Rebuilds against the current brush settings, if any changed since the last call.
    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        if self.settings_changed(settings) {
            self.needs_regen = true;
        }
        if self.needs_regen {
            self.build(settings);
        }
    }
}

impl PreviewProvider for RawBrushPreview {
    fn is_active(&self) -> bool {
        self.item_id > 0
    }

    fn anchor_position(&self) -> Anchor {
        self.anchor
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.anchor = cursor;
    }

    fn needs_regeneration(&self) -> bool {
        self.needs_regen
    }

    fn regenerate(&mut self) {
        self.build(None);
    }
}

/// Preview for the creature brush: a creature-name tag at every brush-shaped offset.
#[derive(Debug)]
pub struct CreaturePreview {
    creature_name:  String,
    anchor:         Anchor,
    tiles:          Vec<PreviewTileData>,
    bounds:         PreviewBounds,
    needs_regen:    bool,
    cached_offsets: Vec<(i32, i32)>,
}

impl CreaturePreview {
    pub fn new(creature_name: impl Into<String>) -> Self {
        let mut preview = Self {
            creature_name: creature_name.into(),
            anchor: Anchor::default(),
            tiles: Vec::new(),
            bounds: PreviewBounds::default(),
            needs_regen: false,
            cached_offsets: Vec::new(),
        };
        preview.build(None);
        preview
    }

    fn offsets_from(settings: Option<&BrushSettingsService>) -> Vec<(i32, i32)> {
        settings.map_or_else(
            || vec![(0, 0)],
            |s| s.brush_positions(Anchor::new(0, 0, 0)).into_iter().map(|p| (p.x, p.y)).collect(),
        )
    }

    fn settings_changed(&self, settings: Option<&BrushSettingsService>) -> bool {
        Self::offsets_from(settings) != self.cached_offsets
    }

    fn build(&mut self, settings: Option<&BrushSettingsService>) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();
        self.needs_regen = false;

        if self.creature_name.is_empty() {
            return;
        }

        let offsets = Self::offsets_from(settings);
        self.cached_offsets = offsets.clone();

        for (dx, dy) in offsets {
            let mut tile = PreviewTileData::new(RelativePosition::new(dx, dy, 0));
            tile.creature_name = Some(self.creature_name.clone());
            self.bounds.expand_pos(tile.relative_position);
            self.tiles.push(tile);
        }
    }

    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        if self.settings_changed(settings) {
            self.needs_regen = true;
        }
        if self.needs_regen {
            self.build(settings);
        }
    }
}

impl PreviewProvider for CreaturePreview {
    fn is_active(&self) -> bool {
        !self.creature_name.is_empty()
    }

    fn anchor_position(&self) -> Anchor {
        self.anchor
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.anchor = cursor;
    }

    fn needs_regeneration(&self) -> bool {
        self.needs_regen
    }

    fn regenerate(&mut self) {
        self.build(None);
    }
}

/// Preview for the spawn brush: a single center tile carrying the spawn radius, so the
/// renderer can draw the full border itself rather than every covered tile being enumerated
/// here.
#[derive(Debug)]
pub struct SpawnPreview {
    anchor:         Anchor,
    tiles:          Vec<PreviewTileData>,
    bounds:         PreviewBounds,
    needs_regen:    bool,
    cached_radius:  i32,
}

const DEFAULT_SPAWN_PREVIEW_RADIUS: i32 = 3;

impl SpawnPreview {
    pub fn new() -> Self {
        let mut preview = Self {
            anchor: Anchor::default(),
            tiles: Vec::new(),
            bounds: PreviewBounds::default(),
            needs_regen: true,
            cached_radius: DEFAULT_SPAWN_PREVIEW_RADIUS,
        };
        preview.build(None);
        preview
    }

    fn build(&mut self, settings: Option<&BrushSettingsService>) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();
        self.needs_regen = false;

        let radius = settings.map_or(DEFAULT_SPAWN_PREVIEW_RADIUS, BrushSettingsService::default_spawn_radius);
        self.cached_radius = radius;

        let mut center = PreviewTileData::new(RelativePosition::default());
        center.has_spawn = true;
        center.spawn_radius = radius;
        self.tiles.push(center);

        self.bounds.expand(-radius, -radius, 0);
        self.bounds.expand(radius, radius, 0);
    }

    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        if let Some(settings) = settings {
            let radius = settings.default_spawn_radius();
            if radius != self.cached_radius {
                self.needs_regen = true;
            }
        }
        if self.needs_regen {
            self.build(settings);
        }
    }
}

impl Default for SpawnPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewProvider for SpawnPreview {
    fn is_active(&self) -> bool {
        true
    }

    fn anchor_position(&self) -> Anchor {
        self.anchor
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.anchor = cursor;
    }

    fn style(&self) -> PreviewStyle {
        PreviewStyle::Outline
    }

    fn needs_regeneration(&self) -> bool {
        self.needs_regen
    }

    fn regenerate(&mut self) {
        self.build(None);
    }
}

/// Preview for flag/eraser/house/waypoint brushes: a flat color tint at every brush-shaped
/// offset, no item or creature content.
#[derive(Debug)]
pub struct ZoneBrushPreview {
    color:          u32,
    anchor:         Anchor,
    tiles:          Vec<PreviewTileData>,
    bounds:         PreviewBounds,
    needs_regen:    bool,
    cached_offsets: Vec<(i32, i32)>,
}

impl ZoneBrushPreview {
    pub fn new(color: u32) -> Self {
        let mut preview = Self {
            color,
            anchor: Anchor::default(),
            tiles: Vec::new(),
            bounds: PreviewBounds::default(),
            needs_regen: false,
            cached_offsets: Vec::new(),
        };
        preview.build(None);
        preview
    }

    fn settings_changed(&self, settings: Option<&BrushSettingsService>) -> bool {
        settings.is_some_and(|s| s.brush_offsets() != self.cached_offsets)
    }

    fn build(&mut self, settings: Option<&BrushSettingsService>) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();
        self.needs_regen = false;

        if self.color == 0 {
            self.cached_offsets.clear();
            return;
        }

        let offsets = settings.map_or_else(|| vec![(0, 0)], BrushSettingsService::brush_offsets);
        self.cached_offsets = offsets.clone();

        for (dx, dy) in offsets {
            let mut tile = PreviewTileData::new(RelativePosition::new(dx, dy, 0));
            tile.zone_color = self.color;
            self.bounds.expand_pos(tile.relative_position);
            self.tiles.push(tile);
        }
    }

    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        if self.settings_changed(settings) {
            self.needs_regen = true;
        }
        if self.needs_regen {
            self.build(settings);
        }
    }
}

impl PreviewProvider for ZoneBrushPreview {
    fn is_active(&self) -> bool {
        self.color != 0
    }

    fn anchor_position(&self) -> Anchor {
        self.anchor
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.anchor = cursor;
    }

    fn needs_regeneration(&self) -> bool {
        self.needs_regen
    }

    fn regenerate(&mut self) {
        self.build(None);
    }
}

/// Semi-transparent ARGB tints used to distinguish zone-brush previews at a glance.
pub mod zone_colors {
    pub const FLAG: u32 = 0x80FF_FF00;
    pub const ERASER: u32 = 0x80FF_4444;
    pub const HOUSE: u32 = 0x8044_88FF;
    pub const WAYPOINT: u32 = 0x8044_FF44;
}

/// One ready-to-render preview, produced by [`create_provider`]. `refresh` re-checks the
/// brush's own settings and rebuilds if they changed; the `Zone*` variants never depend on
/// settings beyond brush shape, and the other variants are likewise shape-only.
#[derive(Debug)]
pub enum BrushPreview {
    Raw(RawBrushPreview),
    Creature(CreaturePreview),
    Spawn(SpawnPreview),
    Zone(ZoneBrushPreview),
}

impl BrushPreview {
    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        match self {
            Self::Raw(p) => p.refresh(settings),
            Self::Creature(p) => p.refresh(settings),
            Self::Spawn(p) => p.refresh(settings),
            Self::Zone(p) => p.refresh(settings),
        }
    }

    pub fn provider_mut(&mut self) -> &mut dyn PreviewProvider {
        match self {
            Self::Raw(p) => p,
            Self::Creature(p) => p,
            Self::Spawn(p) => p,
            Self::Zone(p) => p,
        }
    }

    pub fn provider(&self) -> &dyn PreviewProvider {
        match self {
            Self::Raw(p) => p,
            Self::Creature(p) => p,
            Self::Spawn(p) => p,
            Self::Zone(p) => p,
        }
    }
}

/// Builds the preview appropriate for a brush variant, or `None` for brushes with no preview
/// support (currently none — every brush variant maps to a provider).
pub fn create_provider(brush: &Brush) -> Option<BrushPreview> {
    let preview = match brush {
        Brush::Raw(raw) => {
            log::debug!("creating raw brush preview for item {}", raw.server_id);
            BrushPreview::Raw(RawBrushPreview::new(raw.server_id, 0))
        }
        Brush::Creature(creature) => {
            log::debug!("creating creature preview for {}", creature.name);
            BrushPreview::Creature(CreaturePreview::new(creature.name.clone()))
        }
        Brush::Spawn(_) => {
            log::debug!("creating spawn preview");
            BrushPreview::Spawn(SpawnPreview::new())
        }
        Brush::Flag(_) => BrushPreview::Zone(ZoneBrushPreview::new(zone_colors::FLAG)),
        Brush::Eraser(_) => BrushPreview::Zone(ZoneBrushPreview::new(zone_colors::ERASER)),
        Brush::House(_) => BrushPreview::Zone(ZoneBrushPreview::new(zone_colors::HOUSE)),
        Brush::Waypoint(_) => BrushPreview::Zone(ZoneBrushPreview::new(zone_colors::WAYPOINT)),
    };
    Some(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_brushes::RawBrush;

    #[test]
    fn raw_brush_preview_places_one_item_per_offset() {
        let mut preview = RawBrushPreview::new(100, 0);
        let tiles = preview.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].items[0].item_id, 100);
    }

    #[test]
    fn raw_brush_preview_is_inactive_for_item_id_zero() {
        let preview = RawBrushPreview::new(0, 0);
        assert!(!preview.is_active());
    }

    #[test]
    fn creature_preview_is_inactive_for_an_empty_name() {
        let preview = CreaturePreview::new("");
        assert!(!preview.is_active());
    }

    #[test]
    fn spawn_preview_carries_the_default_radius() {
        let mut preview = SpawnPreview::new();
        let tiles = preview.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].spawn_radius, DEFAULT_SPAWN_PREVIEW_RADIUS);
        assert_eq!(preview.style(), PreviewStyle::Outline);
    }

    #[test]
    fn zone_preview_tints_every_offset() {
        let mut preview = ZoneBrushPreview::new(zone_colors::HOUSE);
        let tiles = preview.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].zone_color, zone_colors::HOUSE);
    }

    #[test]
    fn factory_maps_every_brush_variant_to_a_provider() {
        assert!(matches!(create_provider(&Brush::Raw(RawBrush::new(1))), Some(BrushPreview::Raw(_))));
    }
}
