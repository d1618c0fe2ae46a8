use std::collections::HashSet;

use mapcore_datatypes::{ChunkedMap, Position};
use mapcore_history::{ActionType, HistoryManager};

use crate::brush::{spawn_covers, Brush, DrawContext};
use crate::settings::BrushSettingsService;

/// Drives brush selection and stroke painting. Unlike the original's `BrushController`,
/// this holds no borrows of the map, history manager, or settings service as fields — every
/// operation takes them as parameters instead, since a Rust struct can't cheaply hold
/// mutable borrows of several independently-mutated objects across calls the way a set of
/// non-owning C++ pointers can. State that genuinely belongs to the controller itself (the
/// current brush, stroke bookkeeping) still lives here.
#[derive(Debug, Default)]
pub struct BrushController {
    current_brush: Option<Brush>,

    stroke_active:     bool,
    painted_positions: HashSet<(i32, i32, u8)>,
    last_stroke_pos:   Option<Position>,
}

impl BrushController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.current_brush = Some(brush);
    }

    pub fn clear_brush(&mut self) {
        self.current_brush = None;
    }

    pub fn has_brush(&self) -> bool {
        self.current_brush.is_some()
    }

    pub fn current_brush(&self) -> Option<&Brush> {
        self.current_brush.as_ref()
    }

    pub fn current_item_id(&self) -> Option<u16> {
        match self.current_brush.as_ref()? {
            Brush::Raw(raw) => Some(raw.server_id),
            _ => None,
        }
    }

    pub fn is_in_stroke(&self) -> bool {
        self.stroke_active
    }

    fn paint_tile_direct(&self, map: &mut ChunkedMap, settings: Option<&BrushSettingsService>, pos: Position) {
        let Some(brush) = self.current_brush.as_ref() else { return };
        let existing_spawn_covers = matches!(brush, Brush::Creature(_)) && spawn_covers(map, pos);
        let ctx = DrawContext { variation: 0, is_dragging: self.stroke_active, brush_settings: settings, existing_spawn_covers };
        let tile = map.get_or_create_tile(pos);
        brush.draw(tile, &ctx);
    }

    /// Single-click paint: if a stroke is active, records the before-state inline and
    /// de-duplicates against this stroke's painted set; otherwise wraps the paint in its own
    /// history operation. Brushes never touch selection, so `None` is always passed through.
    pub fn apply_brush(&mut self, map: &mut ChunkedMap, history: &mut HistoryManager, settings: Option<&BrushSettingsService>, pos: Position) -> bool {
        let Some(brush) = self.current_brush.as_ref() else { return false };

        if self.stroke_active {
            let key = (pos.x, pos.y, pos.z);
            if !self.painted_positions.insert(key) {
                return true;
            }
            history.record_tile_before(pos, map.get_tile(pos));
            self.paint_tile_direct(map, settings, pos);
            return true;
        }

        history.begin_operation(format!("Brush: {}", brush.name()), ActionType::Draw, None);
        history.record_tile_before(pos, map.get_tile(pos));
        self.paint_tile_direct(map, settings, pos);
        history.end_operation(map, None);
        true
    }

    /// Erases at `pos` using the current brush's `undraw`. A no-op (returns false) if the
    /// tile is absent; for the eraser brush, `undraw` itself is a no-op and undo is what
    /// actually restores the erased tile.
    pub fn erase_brush(&mut self, map: &mut ChunkedMap, history: &mut HistoryManager, pos: Position) -> bool {
        let Some(brush) = self.current_brush.as_ref() else { return false };
        if map.get_tile(pos).is_none() {
            return false;
        }

        history.begin_operation(format!("Erase: {}", brush.name()), ActionType::Delete, None);
        history.record_tile_before(pos, map.get_tile(pos));
        if let Some(mut tile) = map.get_tile_mut(pos) {
            brush.undraw(&mut tile);
        }
        history.end_operation(map, None);
        true
    }

    pub fn begin_stroke(&mut self, history: &mut HistoryManager) {
        let Some(brush) = self.current_brush.as_ref() else { return };
        history.begin_operation(format!("Brush: {}", brush.name()), ActionType::Draw, None);

        self.stroke_active = true;
        self.painted_positions.clear();
        self.last_stroke_pos = None;
    }

    pub fn continue_stroke(&mut self, map: &mut ChunkedMap, history: &mut HistoryManager, settings: Option<&BrushSettingsService>, pos: Position) {
        if !self.stroke_active || self.current_brush.is_none() {
            return;
        }

        let expand = |center: Position| -> Vec<Position> {
            settings.map_or_else(|| vec![center], |s| s.brush_positions(center))
        };

        let Some(last_pos) = self.last_stroke_pos else {
            for target in expand(pos) {
                self.paint_at(map, history, settings, target);
            }
            self.last_stroke_pos = Some(pos);
            return;
        };

        self.last_stroke_pos = Some(pos);
        for line_pos in line_positions(last_pos, pos) {
            for target in expand(line_pos) {
                self.paint_at(map, history, settings, target);
            }
        }
    }

    fn paint_at(&mut self, map: &mut ChunkedMap, history: &mut HistoryManager, settings: Option<&BrushSettingsService>, pos: Position) {
        let key = (pos.x, pos.y, pos.z);
        if !self.painted_positions.insert(key) {
            return;
        }
        history.record_tile_before(pos, map.get_tile(pos));
        self.paint_tile_direct(map, settings, pos);
    }

    /// Ends the current stroke: if anything was painted, ends the history operation
    /// (capturing after-states); otherwise cancels it. Always clears stroke bookkeeping,
    /// even if no stroke was active.
    pub fn end_stroke(&mut self, map: &ChunkedMap, history: &mut HistoryManager) {
        if self.stroke_active {
            if self.painted_positions.is_empty() {
                history.cancel_operation();
            } else {
                history.end_operation(map, None);
            }
        }

        self.stroke_active = false;
        self.painted_positions.clear();
        self.last_stroke_pos = None;
    }
}

/// 2D Bresenham line between two tile positions, both endpoints inclusive, staying on
/// `from`'s floor.
pub fn line_positions(from: Position, to: Position) -> Vec<Position> {
    let mut positions = Vec::new();
    let (mut x0, mut y0) = (from.x, from.y);
    let (x1, y1) = (to.x, to.y);
    let z = from.z;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        positions.push(Position::new(x0, y0, z));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x0 == x1 {
                break;
            }
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            if y0 == y1 {
                break;
            }
            err += dx;
            y0 += sy;
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::RawBrush;
    use mapcore_history::HistoryConfig;

    #[test]
    fn line_positions_between_adjacent_tiles_is_just_the_two_endpoints() {
        let from = Position::new(0, 0, 7);
        let to = Position::new(1, 0, 7);
        assert_eq!(line_positions(from, to), vec![from, to]);
    }

    #[test]
    fn line_positions_walks_a_diagonal_one_step_at_a_time() {
        let from = Position::new(0, 0, 7);
        let to = Position::new(3, 3, 7);
        let positions = line_positions(from, to);

        assert_eq!(positions.first(), Some(&from));
        assert_eq!(positions.last(), Some(&to));
        for window in positions.windows(2) {
            let (a, b) = (window[0], window[1]);
            assert!((a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1);
        }
    }

    #[test]
    fn apply_brush_in_single_click_mode_pushes_one_history_entry() {
        let mut map = ChunkedMap::new();
        let mut history = HistoryManager::new(HistoryConfig::default());
        let mut controller = BrushController::new();
        controller.set_brush(Brush::Raw(RawBrush::new(42)));

        let applied = controller.apply_brush(&mut map, &mut history, None, Position::new(0, 0, 7));

        assert!(applied);
        assert_eq!(history.entry_count(), 1);
        assert_eq!(map.get_tile(Position::new(0, 0, 7)).unwrap().ground.as_ref().unwrap().server_id, 42);
    }

    #[test]
    fn stroke_paints_each_tile_at_most_once() {
        let mut map = ChunkedMap::new();
        let mut history = HistoryManager::new(HistoryConfig::default());
        let mut controller = BrushController::new();
        controller.set_brush(Brush::Raw(RawBrush::new(7)));

        controller.begin_stroke(&mut history);
        controller.continue_stroke(&mut map, &mut history, None, Position::new(0, 0, 7));
        controller.continue_stroke(&mut map, &mut history, None, Position::new(0, 0, 7));
        controller.end_stroke(&map, &mut history);

        assert_eq!(history.entry_count(), 1);
    }

    #[test]
    fn continue_stroke_interpolates_a_line_between_cursor_positions() {
        let mut map = ChunkedMap::new();
        let mut history = HistoryManager::new(HistoryConfig::default());
        let mut controller = BrushController::new();
        controller.set_brush(Brush::Raw(RawBrush::new(7)));

        controller.begin_stroke(&mut history);
        controller.continue_stroke(&mut map, &mut history, None, Position::new(0, 0, 7));
        controller.continue_stroke(&mut map, &mut history, None, Position::new(2, 0, 7));
        controller.end_stroke(&map, &mut history);

        assert!(map.get_tile(Position::new(1, 0, 7)).is_some());
    }

    #[test]
    fn ending_a_stroke_with_nothing_painted_cancels_the_operation() {
        let map = ChunkedMap::new();
        let mut history = HistoryManager::new(HistoryConfig::default());
        let mut controller = BrushController::new();
        controller.set_brush(Brush::Raw(RawBrush::new(7)));

        controller.begin_stroke(&mut history);
        controller.end_stroke(&map, &mut history);

        assert_eq!(history.entry_count(), 0);
        assert!(!controller.is_in_stroke());
    }

    #[test]
    fn erase_brush_is_a_noop_on_an_absent_tile() {
        let mut map = ChunkedMap::new();
        let mut history = HistoryManager::new(HistoryConfig::default());
        let mut controller = BrushController::new();
        controller.set_brush(Brush::Raw(RawBrush::new(7)));

        let erased = controller.erase_brush(&mut map, &mut history, Position::new(5, 5, 7));
        assert!(!erased);
    }
}
