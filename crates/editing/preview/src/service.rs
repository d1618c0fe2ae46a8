use mapcore_brushes::BrushSettingsService;

use crate::brush_providers::BrushPreview;
use crate::drag::DragPreview;
use crate::paste::PastePreview;
use crate::provider::PreviewProvider;
use crate::types::{Anchor, PreviewBounds, PreviewStyle, PreviewTileData};

/// The one kind of preview that can be active at a time.
#[derive(Debug)]
enum ActivePreview {
    Brush(BrushPreview),
    Paste(PastePreview),
    Drag(DragPreview),
}

impl ActivePreview {
    fn provider_mut(&mut self) -> &mut dyn PreviewProvider {
        match self {
            Self::Brush(p) => p.provider_mut(),
            Self::Paste(p) => p,
            Self::Drag(p) => p,
        }
    }

    fn provider(&self) -> &dyn PreviewProvider {
        match self {
            Self::Brush(p) => p.provider(),
            Self::Paste(p) => p,
            Self::Drag(p) => p,
        }
    }
}

/// Central holder for the editor's one active preview: a brush, a paste, or a drag, never
/// more than one at once. Owned per map tab, so each tab tracks its own preview state
/// independently.
#[derive(Debug, Default)]
pub struct PreviewService {
    active: Option<ActivePreview>,
}

impl PreviewService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_brush_preview(&mut self, preview: BrushPreview) {
        self.active = Some(ActivePreview::Brush(preview));
    }

    pub fn set_paste_preview(&mut self, preview: PastePreview) {
        self.active = Some(ActivePreview::Paste(preview));
    }

    pub fn set_drag_preview(&mut self, preview: DragPreview) {
        self.active = Some(ActivePreview::Drag(preview));
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn has_preview(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.provider().is_active())
    }

    pub fn tiles(&mut self) -> &[PreviewTileData] {
        match &mut self.active {
            Some(active) => active.provider_mut().tiles(),
            None => &[],
        }
    }

    pub fn anchor_position(&self) -> Anchor {
        self.active.as_ref().map_or_else(Anchor::default, |a| a.provider().anchor_position())
    }

    pub fn bounds(&self) -> PreviewBounds {
        self.active.as_ref().map_or_else(PreviewBounds::default, |a| a.provider().bounds())
    }

    pub fn style(&self) -> PreviewStyle {
        self.active.as_ref().map_or(PreviewStyle::default(), |a| a.provider().style())
    }

    pub fn update_cursor(&mut self, cursor: Anchor) {
        if let Some(active) = &mut self.active {
            active.provider_mut().update_cursor_position(cursor);
        }
    }

    /// Refreshes the active preview against `settings`, if it's brush-backed and its brush's
    /// shape changed. Paste and drag previews never depend on brush settings.
    pub fn refresh(&mut self, settings: Option<&BrushSettingsService>) {
        if let Some(ActivePreview::Brush(preview)) = &mut self.active {
            preview.refresh(settings);
        }
    }
}

#[cfg(test)]
mod tests {
    use mapcore_brushes::{Brush, RawBrush};
    use mapcore_datatypes::{ChunkedMap, Position};
    use mapcore_selection::SelectionService;

    use super::*;
    use crate::brush_providers::create_provider;

    #[test]
    fn a_fresh_service_has_no_preview() {
        let mut service = PreviewService::new();
        assert!(!service.has_preview());
        assert!(service.tiles().is_empty());
    }

    #[test]
    fn setting_a_brush_preview_makes_it_active() {
        let mut service = PreviewService::new();
        let preview = create_provider(&Brush::Raw(RawBrush::new(42))).unwrap();
        service.set_brush_preview(preview);

        assert!(service.has_preview());
        assert_eq!(service.tiles().len(), 1);
    }

    #[test]
    fn setting_a_new_preview_replaces_the_old_one() {
        let mut service = PreviewService::new();
        service.set_brush_preview(create_provider(&Brush::Raw(RawBrush::new(1))).unwrap());

        let map = ChunkedMap::new();
        let selection = SelectionService::new();
        service.set_drag_preview(DragPreview::new(&selection, &map, Position::new(0, 0, 7)));

        assert!(!service.has_preview());
    }

    #[test]
    fn clear_removes_any_active_preview() {
        let mut service = PreviewService::new();
        service.set_brush_preview(create_provider(&Brush::Raw(RawBrush::new(1))).unwrap());
        service.clear();
        assert!(!service.has_preview());
    }

    #[test]
    fn update_cursor_moves_the_anchor_of_the_active_preview() {
        let mut service = PreviewService::new();
        service.set_brush_preview(create_provider(&Brush::Raw(RawBrush::new(1))).unwrap());
        service.update_cursor(Position::new(5, 5, 7));
        assert_eq!(service.anchor_position(), Position::new(5, 5, 7));
    }
}
