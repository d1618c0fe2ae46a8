//! Brush variants and stroke painting for the map editor.
//!
//! [`Brush`] is a closed set of the editor's brush variants; [`BrushSettingsService`] holds
//! shared size/shape configuration; [`BrushController`] drives click and drag painting on
//! top of both, recording every change through a [`mapcore_history::HistoryManager`].

mod brush;
mod controller;
mod settings;

pub use self::brush::{spawn_covers, zone_flags, Brush, BrushKind, CreatureBrush, DrawContext, EraserBrush, FlagBrush, HouseBrush, RawBrush, SpawnBrush, WaypointBrush};
pub use self::controller::{line_positions, BrushController};
pub use self::settings::{BrushSettingsService, BrushSizeMode, BrushType, CustomBrushShape, DEFAULT_CUSTOM_GRID_SIZE, MAX_SIZE, MIN_SIZE};
