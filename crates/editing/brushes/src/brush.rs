use mapcore_datatypes::{ChunkedMap, Creature, Item, Outfit, Position, Spawn, Tile, TileFlags};

use crate::settings::BrushSettingsService;

/// Whether any existing spawn within the maximum possible radius already covers `pos`. Used
/// by the creature brush's auto-spawn check; called before the tile at `pos` is mutably
/// borrowed, since it needs read access to every nearby tile.
pub fn spawn_covers(map: &ChunkedMap, pos: Position) -> bool {
    const MAX_RADIUS: i32 = 10;
    for dy in -MAX_RADIUS..=MAX_RADIUS {
        for dx in -MAX_RADIUS..=MAX_RADIUS {
            let nearby = Position::new(pos.x + dx, pos.y + dy, pos.z);
            if let Some(spawn) = map.get_tile(nearby).and_then(|t| t.spawn.as_ref()) {
                if spawn.contains(pos) {
                    return true;
                }
            }
        }
    }
    false
}

/// Tag identifying which brush variant is active, independent of any particular instance's
/// configuration (item id, flag, outfit, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushKind {
    Raw,
    Creature,
    Spawn,
    Eraser,
    Flag,
    House,
    Waypoint,
}

/// Per-call context passed to [`Brush::draw`]: the current stroke's variation counter (for
/// brushes that vary appearance across a drag), whether a drag is in progress, a borrow of
/// the brush settings service the creature/spawn brushes read auto-spawn config from, and
/// (for the creature brush only) whether an existing spawn already covers this tile.
///
/// `existing_spawn_covers` is computed by the caller via [`spawn_covers`] before the tile's
/// mutable borrow is taken, since `draw` itself only ever sees the one tile it's painting,
/// not the whole map.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub variation:             u32,
    pub is_dragging:           bool,
    pub brush_settings:        Option<&'a BrushSettingsService>,
    pub existing_spawn_covers: bool,
}

#[derive(Debug, Clone)]
pub struct RawBrush {
    pub server_id: u16,
}

impl RawBrush {
    pub fn new(server_id: u16) -> Self {
        Self { server_id }
    }

    fn draw(&self, tile: &mut Tile) {
        tile.add_item(Item::new(self.server_id));
    }

    fn undraw(&self, tile: &mut Tile) {
        tile.remove_items_if(|item| self.owns_item(item));
        if tile.ground.as_ref().is_some_and(|g| self.owns_item(g)) {
            tile.ground = None;
        }
    }

    fn owns_item(&self, item: &Item) -> bool {
        item.server_id == self.server_id
    }
}

#[derive(Debug, Clone)]
pub struct CreatureBrush {
    pub name:   String,
    pub outfit: Outfit,
}

impl CreatureBrush {
    pub fn new(name: impl Into<String>, outfit: Outfit) -> Self {
        Self { name: name.into(), outfit }
    }

    fn draw(&self, tile: &mut Tile, ctx: &DrawContext<'_>) {
        let mut creature = Creature::new(self.name.clone());
        creature.outfit = self.outfit.clone();
        creature.position = tile.position;
        tile.creature = Some(creature);

        let auto_spawn = ctx.brush_settings.is_some_and(BrushSettingsService::auto_create_spawn);
        if !auto_spawn || ctx.existing_spawn_covers {
            return;
        }

        let pos = tile.position;
        let radius = ctx.brush_settings.map_or(3, BrushSettingsService::default_spawn_radius);
        tile.spawn = Some(Spawn::new(pos, radius));
        log::debug!("auto-created spawn at {pos:?} with radius {radius}");
    }

    fn undraw(&self, tile: &mut Tile) {
        tile.creature = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpawnBrush;

impl SpawnBrush {
    fn draw(&self, tile: &mut Tile, ctx: &DrawContext<'_>) {
        if tile.spawn.is_some() {
            return;
        }
        let radius = ctx.brush_settings.map_or(3, BrushSettingsService::default_spawn_radius);
        tile.spawn = Some(Spawn::new(tile.position, radius));
    }

    fn undraw(&self, tile: &mut Tile) {
        tile.spawn = None;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EraserBrush {
    pub erase_ground:   bool,
    pub erase_items:    bool,
    pub erase_creatures: bool,
    pub erase_spawns:   bool,
}

impl Default for EraserBrush {
    fn default() -> Self {
        Self { erase_ground: true, erase_items: true, erase_creatures: true, erase_spawns: true }
    }
}

impl EraserBrush {
    fn draw(&self, tile: &mut Tile) {
        if self.erase_ground {
            tile.ground = None;
        }
        if self.erase_items {
            tile.items.clear();
        }
        if self.erase_creatures {
            tile.creature = None;
        }
        if self.erase_spawns {
            tile.spawn = None;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlagBrush {
    pub flag: u32,
    pub name: &'static str,
}

impl FlagBrush {
    pub const fn new(flag: u32, name: &'static str) -> Self {
        Self { flag, name }
    }

    fn draw(&self, tile: &mut Tile) {
        tile.flags.set(self.flag, true);
    }

    fn undraw(&self, tile: &mut Tile) {
        tile.flags.set(self.flag, false);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HouseBrush {
    pub house_id: u32,
}

impl HouseBrush {
    fn draw(&self, tile: &mut Tile) {
        if self.house_id == 0 {
            return;
        }
        tile.house_id = self.house_id;
    }

    fn undraw(&self, tile: &mut Tile) {
        tile.house_id = 0;
    }
}

/// Reserved for a named navigation marker; [`Tile`] has no waypoint field yet, so `draw`/
/// `undraw` only log.
#[derive(Debug, Clone, Default)]
pub struct WaypointBrush {
    pub name: String,
}

impl WaypointBrush {
    fn draw(&self, tile: &Tile) {
        if self.name.is_empty() {
            return;
        }
        log::trace!("set waypoint {:?} at {:?}", self.name, tile.position);
    }

    fn undraw(&self, tile: &Tile) {
        log::trace!("removed waypoint from {:?}", tile.position);
    }
}

/// A brush, as a closed set of variants rather than a trait-object hierarchy: every variant
/// the editor supports is known at compile time, so dispatch is a match rather than a vtable.
#[derive(Debug, Clone)]
pub enum Brush {
    Raw(RawBrush),
    Creature(CreatureBrush),
    Spawn(SpawnBrush),
    Eraser(EraserBrush),
    Flag(FlagBrush),
    House(HouseBrush),
    Waypoint(WaypointBrush),
}

impl Brush {
    pub fn kind(&self) -> BrushKind {
        match self {
            Brush::Raw(_) => BrushKind::Raw,
            Brush::Creature(_) => BrushKind::Creature,
            Brush::Spawn(_) => BrushKind::Spawn,
            Brush::Eraser(_) => BrushKind::Eraser,
            Brush::Flag(_) => BrushKind::Flag,
            Brush::House(_) => BrushKind::House,
            Brush::Waypoint(_) => BrushKind::Waypoint,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Brush::Raw(raw) => format!("RAW:{}", raw.server_id),
            Brush::Creature(creature) => creature.name.clone(),
            Brush::Spawn(_) => "Spawn".to_owned(),
            Brush::Eraser(_) => "Eraser".to_owned(),
            Brush::Flag(flag) => flag.name.to_owned(),
            Brush::House(_) => "House".to_owned(),
            Brush::Waypoint(_) => "Waypoint".to_owned(),
        }
    }

    pub fn look_id(&self) -> u32 {
        match self {
            Brush::Raw(raw) => u32::from(raw.server_id),
            Brush::Creature(creature) => u32::from(creature.outfit.look_type),
            _ => 0,
        }
    }

    pub fn draggable(&self) -> bool {
        true
    }

    /// Applies this brush to `tile`. The creature brush's auto-spawn decision is read from
    /// `ctx.existing_spawn_covers`, computed by the caller via [`spawn_covers`] — `draw`
    /// itself never needs to see the rest of the map.
    pub fn draw(&self, tile: &mut Tile, ctx: &DrawContext<'_>) {
        match self {
            Brush::Raw(raw) => raw.draw(tile),
            Brush::Creature(creature) => creature.draw(tile, ctx),
            Brush::Spawn(spawn) => spawn.draw(tile, ctx),
            Brush::Eraser(eraser) => eraser.draw(tile),
            Brush::Flag(flag) => flag.draw(tile),
            Brush::House(house) => house.draw(tile),
            Brush::Waypoint(waypoint) => waypoint.draw(tile),
        }
    }

    /// Removes what this brush placed at `tile`. A no-op for the eraser: history handles
    /// reversing an erase, there's nothing for the eraser itself to "undraw".
    pub fn undraw(&self, tile: &mut Tile) {
        match self {
            Brush::Raw(raw) => raw.undraw(tile),
            Brush::Creature(creature) => creature.undraw(tile),
            Brush::Spawn(spawn) => spawn.undraw(tile),
            Brush::Eraser(_) => {}
            Brush::Flag(flag) => flag.undraw(tile),
            Brush::House(house) => house.undraw(tile),
            Brush::Waypoint(waypoint) => waypoint.undraw(tile),
        }
    }

    pub fn owns_item(&self, item: &Item) -> bool {
        match self {
            Brush::Raw(raw) => raw.owns_item(item),
            _ => false,
        }
    }
}

/// Bit values for [`Brush::Flag`]'s zone flags, matching [`TileFlags`]'s constants.
pub mod zone_flags {
    use super::TileFlags;

    pub const PROTECTION_ZONE: u32 = TileFlags::PROTECTION_ZONE;
    pub const NO_PVP:          u32 = TileFlags::NO_PVP;
    pub const NO_LOGOUT:       u32 = TileFlags::NO_LOGOUT;
    pub const PVP_ZONE:        u32 = TileFlags::PVP_ZONE;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(settings: Option<&BrushSettingsService>) -> DrawContext<'_> {
        DrawContext { variation: 0, is_dragging: false, brush_settings: settings, existing_spawn_covers: false }
    }

    #[test]
    fn raw_brush_places_and_removes_by_server_id() {
        let mut tile = Tile::new(Position::new(0, 0, 7));
        let brush = Brush::Raw(RawBrush::new(100));

        brush.draw(&mut tile, &ctx(None));
        assert_eq!(tile.ground.as_ref().unwrap().server_id, 100);

        brush.undraw(&mut tile);
        assert!(tile.ground.is_none());
    }

    #[test]
    fn eraser_only_clears_enabled_categories() {
        let mut tile = Tile::new(Position::new(0, 0, 7));
        tile.set_ground(Item::new(1));
        tile.creature = Some(Creature::new("rat"));

        let brush = Brush::Eraser(EraserBrush { erase_ground: true, erase_items: false, erase_creatures: false, erase_spawns: false });
        brush.draw(&mut tile, &ctx(None));

        assert!(tile.ground.is_none());
        assert!(tile.creature.is_some());
    }

    #[test]
    fn spawn_brush_refuses_to_overwrite_an_existing_spawn() {
        let mut tile = Tile::new(Position::new(0, 0, 7));
        tile.spawn = Some(Spawn::new(tile.position, 1));

        let brush = Brush::Spawn(SpawnBrush);
        brush.draw(&mut tile, &ctx(None));

        assert_eq!(tile.spawn.as_ref().unwrap().radius, 1);
    }

    #[test]
    fn creature_brush_auto_spawns_when_no_existing_spawn_covers_the_tile() {
        let map = ChunkedMap::new();
        let pos = Position::new(0, 0, 7);
        let mut tile = Tile::new(pos);
        let mut settings = BrushSettingsService::new();
        settings.set_auto_create_spawn(true);
        settings.set_default_spawn_radius(4);

        let brush = Brush::Creature(CreatureBrush::new("rat", Outfit::default()));
        let mut draw_ctx = ctx(Some(&settings));
        draw_ctx.existing_spawn_covers = spawn_covers(&map, pos);
        brush.draw(&mut tile, &draw_ctx);

        assert!(tile.creature.is_some());
        assert_eq!(tile.spawn.as_ref().unwrap().radius, 4);
    }

    #[test]
    fn creature_brush_skips_auto_spawn_when_a_covering_spawn_already_exists() {
        let mut map = ChunkedMap::new();
        let covering_spawn_pos = Position::new(0, 0, 7);
        map.get_or_create_tile(covering_spawn_pos).spawn = Some(Spawn::new(covering_spawn_pos, 5));

        let target_pos = Position::new(2, 2, 7);
        let mut tile = Tile::new(target_pos);
        let mut settings = BrushSettingsService::new();
        settings.set_auto_create_spawn(true);

        let brush = Brush::Creature(CreatureBrush::new("rat", Outfit::default()));
        let mut draw_ctx = ctx(Some(&settings));
        draw_ctx.existing_spawn_covers = spawn_covers(&map, target_pos);
        brush.draw(&mut tile, &draw_ctx);

        assert!(tile.spawn.is_none());
    }

    #[test]
    fn house_brush_zero_id_clears_the_assignment() {
        let mut tile = Tile::new(Position::new(0, 0, 7));
        tile.house_id = 7;

        let brush = Brush::House(HouseBrush { house_id: 0 });
        brush.draw(&mut tile, &ctx(None));

        assert_eq!(tile.house_id, 7);

        brush.undraw(&mut tile);
        assert_eq!(tile.house_id, 0);
    }

    #[test]
    fn flag_brush_sets_and_clears_its_bit() {
        let mut tile = Tile::new(Position::new(0, 0, 7));
        let brush = Brush::Flag(FlagBrush::new(zone_flags::PROTECTION_ZONE, "PZ"));

        brush.draw(&mut tile, &ctx(None));
        assert!(tile.flags.contains(zone_flags::PROTECTION_ZONE));

        brush.undraw(&mut tile);
        assert!(!tile.flags.contains(zone_flags::PROTECTION_ZONE));
    }
}
