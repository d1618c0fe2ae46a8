use mapcore_datatypes::Position;

/// Brush shape: determines how a center position expands into a set of tile offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushType {
    Square,
    Circle,
    Custom,
}

/// How a brush's dimensions are specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushSizeMode {
    /// Symmetric radius: produces an NxN square or an N-radius circle.
    Standard,
    /// Independent width and height.
    CustomDimensions,
}

/// A user-defined brush shape: a grid of selected cells, plus the offsets from its center
/// that those cells represent. `offsets` is only valid after [`Self::compute_offsets`].
#[derive(Debug, Clone, PartialEq)]
pub struct CustomBrushShape {
    pub name:      String,
    pub grid:      Vec<Vec<bool>>,
    pub grid_size: usize,
    pub offsets:   Vec<(i32, i32)>,
}

impl CustomBrushShape {
    pub fn new(name: impl Into<String>, grid_size: usize) -> Self {
        Self {
            name:    name.into(),
            grid:    vec![vec![false; grid_size]; grid_size],
            grid_size,
            offsets: Vec::new(),
        }
    }

    /// Recomputes `offsets` from `grid`. The center cell is `grid_size / 2` (integer
    /// division) in both axes; every selected cell contributes `(x - center, y - center)`,
    /// visited row-major (y outer, x inner).
    pub fn compute_offsets(&mut self) {
        self.offsets.clear();
        let center = (self.grid_size / 2) as i32;
        for (y, row) in self.grid.iter().enumerate() {
            for (x, &selected) in row.iter().enumerate() {
                if selected {
                    self.offsets.push((x as i32 - center, y as i32 - center));
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.iter().all(|row| row.iter().all(|&cell| !cell))
    }
}

pub const MIN_SIZE: i32 = 1;
pub const MAX_SIZE: i32 = 10;
pub const DEFAULT_CUSTOM_GRID_SIZE: usize = 10;

/// Brush size, shape, and custom-brush state shared by the controller and preview
/// providers. Every setter funnels through [`Self::notify_changed`], which preview
/// providers poll via [`Self::revision`] to know when to regenerate.
#[derive(Debug)]
pub struct BrushSettingsService {
    brush_type:  BrushType,
    size_mode:   BrushSizeMode,
    standard_size: i32,
    custom_width:  i32,
    custom_height: i32,

    custom_brushes:        Vec<CustomBrushShape>,
    selected_custom_brush: Option<String>,

    auto_create_spawn:   bool,
    default_spawn_radius: i32,
    default_spawn_time:  i32,

    revision: u64,
}

impl Default for BrushSettingsService {
    fn default() -> Self {
        Self {
            brush_type:  BrushType::Square,
            size_mode:   BrushSizeMode::Standard,
            standard_size: 1,
            custom_width:  1,
            custom_height: 1,
            custom_brushes:        Vec::new(),
            selected_custom_brush: None,
            auto_create_spawn:   false,
            default_spawn_radius: 3,
            default_spawn_time:  60,
            revision: 0,
        }
    }
}

impl BrushSettingsService {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify_changed(&mut self) {
        self.revision += 1;
    }

    /// Bumped on every setting change. Preview providers cache this to detect staleness
    /// instead of comparing every field.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn brush_type(&self) -> BrushType {
        self.brush_type
    }

    pub fn set_brush_type(&mut self, brush_type: BrushType) {
        self.brush_type = brush_type;
        self.notify_changed();
    }

    /// False when `Custom` is selected: a custom shape has no independent size controls.
    pub fn is_size_mode_enabled(&self) -> bool {
        self.brush_type != BrushType::Custom
    }

    pub fn size_mode(&self) -> BrushSizeMode {
        self.size_mode
    }

    pub fn set_size_mode(&mut self, mode: BrushSizeMode) {
        self.size_mode = mode;
        self.notify_changed();
    }

    pub fn standard_size(&self) -> i32 {
        self.standard_size
    }

    pub fn set_standard_size(&mut self, radius: i32) {
        self.standard_size = radius.clamp(MIN_SIZE, MAX_SIZE);
        self.notify_changed();
    }

    pub fn increase_size(&mut self) {
        self.set_standard_size(self.standard_size + 1);
    }

    pub fn decrease_size(&mut self) {
        self.set_standard_size(self.standard_size - 1);
    }

    pub fn custom_width(&self) -> i32 {
        self.custom_width
    }

    pub fn custom_height(&self) -> i32 {
        self.custom_height
    }

    pub fn set_custom_dimensions(&mut self, width: i32, height: i32) {
        self.custom_width = width.clamp(MIN_SIZE, MAX_SIZE);
        self.custom_height = height.clamp(MIN_SIZE, MAX_SIZE);
        self.notify_changed();
    }

    pub fn effective_width(&self) -> i32 {
        match self.size_mode {
            BrushSizeMode::Standard => self.standard_size,
            BrushSizeMode::CustomDimensions => self.custom_width,
        }
    }

    pub fn effective_height(&self) -> i32 {
        match self.size_mode {
            BrushSizeMode::Standard => self.standard_size,
            BrushSizeMode::CustomDimensions => self.custom_height,
        }
    }

    pub fn add_custom_brush(&mut self, brush: CustomBrushShape) {
        if let Some(existing) = self.custom_brushes.iter_mut().find(|b| b.name == brush.name) {
            *existing = brush;
        } else {
            self.custom_brushes.push(brush);
        }
        self.notify_changed();
    }

    pub fn remove_custom_brush(&mut self, name: &str) {
        self.custom_brushes.retain(|b| b.name != name);
        if self.selected_custom_brush.as_deref() == Some(name) {
            self.selected_custom_brush = None;
        }
        self.notify_changed();
    }

    pub fn select_custom_brush(&mut self, name: impl Into<String>) {
        self.selected_custom_brush = Some(name.into());
        self.notify_changed();
    }

    pub fn selected_custom_brush(&self) -> Option<&CustomBrushShape> {
        let name = self.selected_custom_brush.as_deref()?;
        self.custom_brushes.iter().find(|b| b.name == name)
    }

    pub fn custom_brushes(&self) -> &[CustomBrushShape] {
        &self.custom_brushes
    }

    pub fn auto_create_spawn(&self) -> bool {
        self.auto_create_spawn
    }

    pub fn set_auto_create_spawn(&mut self, enabled: bool) {
        self.auto_create_spawn = enabled;
        self.notify_changed();
    }

    pub fn default_spawn_radius(&self) -> i32 {
        self.default_spawn_radius
    }

    pub fn set_default_spawn_radius(&mut self, radius: i32) {
        self.default_spawn_radius = radius.clamp(1, 10);
        self.notify_changed();
    }

    pub fn default_spawn_time(&self) -> i32 {
        self.default_spawn_time
    }

    pub fn set_default_spawn_time(&mut self, seconds: i32) {
        self.default_spawn_time = seconds.clamp(1, 86400);
        self.notify_changed();
    }

    /// Relative `(dx, dy)` offsets for the current brush type/size, useful for preview
    /// rendering without a concrete center position.
    pub fn brush_offsets(&self) -> Vec<(i32, i32)> {
        match self.brush_type {
            BrushType::Square => {
                let (w, h) = (self.effective_width(), self.effective_height());
                let (half_w, half_h) = (w / 2, h / 2);
                let mut offsets = Vec::with_capacity((w * h) as usize);
                for dy in -half_h..=(h - 1 - half_h) {
                    for dx in -half_w..=(w - 1 - half_w) {
                        offsets.push((dx, dy));
                    }
                }
                offsets
            }
            BrushType::Circle => {
                let radius = self.standard_size;
                let mut offsets = Vec::new();
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx * dx + dy * dy <= radius * radius {
                            offsets.push((dx, dy));
                        }
                    }
                }
                offsets
            }
            BrushType::Custom => self
                .selected_custom_brush()
                .map(|shape| shape.offsets.clone())
                .unwrap_or_default(),
        }
    }

    /// Absolute tile positions the brush should affect, centered on `center` and staying on
    /// its floor.
    pub fn brush_positions(&self, center: Position) -> Vec<Position> {
        self.brush_offsets()
            .into_iter()
            .map(|(dx, dy)| Position::new(center.x + dx, center.y + dy, center.z))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_shape_offsets_are_centered_on_the_grid_midpoint() {
        let mut shape = CustomBrushShape::new("plus", 3);
        shape.grid[1][1] = true;
        shape.grid[0][1] = true;
        shape.compute_offsets();

        assert_eq!(shape.offsets, vec![(0, -1), (0, 0)]);
    }

    #[test]
    fn square_offsets_cover_the_full_width_and_height() {
        let mut settings = BrushSettingsService::new();
        settings.set_brush_type(BrushType::Square);
        settings.set_standard_size(3);

        let offsets = settings.brush_offsets();
        assert_eq!(offsets.len(), 9);
        assert!(offsets.contains(&(-1, -1)));
        assert!(offsets.contains(&(1, 1)));
    }

    #[test]
    fn circle_offsets_only_include_points_within_radius() {
        let mut settings = BrushSettingsService::new();
        settings.set_brush_type(BrushType::Circle);
        settings.set_standard_size(2);

        let offsets = settings.brush_offsets();
        assert!(offsets.contains(&(0, 0)));
        assert!(offsets.contains(&(2, 0)));
        assert!(!offsets.contains(&(2, 2)));
    }

    #[test]
    fn custom_brush_without_a_selection_yields_no_offsets() {
        let settings_with_custom_type = {
            let mut s = BrushSettingsService::new();
            s.set_brush_type(BrushType::Custom);
            s
        };
        assert!(settings_with_custom_type.brush_offsets().is_empty());
    }

    #[test]
    fn every_setter_bumps_the_revision() {
        let mut settings = BrushSettingsService::new();
        let before = settings.revision();
        settings.set_default_spawn_radius(5);
        assert!(settings.revision() > before);
    }

    #[test]
    fn brush_positions_stay_on_the_centers_floor() {
        let mut settings = BrushSettingsService::new();
        settings.set_brush_type(BrushType::Square);
        settings.set_standard_size(1);

        let positions = settings.brush_positions(Position::new(10, 10, 7));
        assert_eq!(positions, vec![Position::new(10, 10, 7)]);
    }
}
