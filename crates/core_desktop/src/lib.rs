//! WebDesk Core Window Engine
//!
//! Platform-agnostic window management for a virtual desktop of floating windows.
//!
//! This crate implements the "floating windows between two bands" paradigm where:
//! - A toolbar band is reserved at the top and a taskbar band at the bottom
//! - Windows float freely in the usable area between the bands
//! - Windows can be dragged (with edge snapping), resized from eight handles,
//!   minimized to the taskbar, maximized to the usable area, and raised
//! - The whole window collection can be saved to and restored from a durable slot

pub mod content;
pub mod desktop;
pub mod geometry;
pub mod interaction;
pub mod session;
pub mod store;
pub mod view;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use content::{ContentInput, ContentProvider, ContentSettings, ContentView};
pub use desktop::{Desktop, PointerTarget};
pub use geometry::{clamp, confine, snap_to_edges};
pub use interaction::{Gesture, ResizeDirection};
pub use session::{MemorySlot, SessionSlot, SlotError};
pub use store::{WindowStore, WindowUpdate};
pub use view::{DesktopView, TaskbarEntry, WindowView};

/// Unique identifier for a window.
/// Issued by the desktop's monotonic counter, never reused within a session.
pub type WindowId = u64;

/// Errors for operations the desktop rejects outright.
///
/// Most operations treat an unknown id as a silent no-op; these are reserved
/// for requests that cannot be honored at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DesktopError {
    #[error("Window {0} not found on the desktop")]
    WindowNotFound(WindowId),

    #[error("Window {0} is minimized")]
    WindowMinimized(WindowId),

    #[error("Desktop bounds have not been measured yet")]
    BoundsUnavailable,

    #[error("Unknown application type: {0}")]
    UnknownAppType(String),

    #[error("Window {0} ({1}) does not accept that input")]
    UnsupportedInput(WindowId, AppType),
}

/// A point in screen coordinates (layout units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Content-box dimensions of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Create a new size.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rectangle from a position and a size.
    pub fn from_parts(pos: Point, size: Size) -> Self {
        Self::new(pos.x, pos.y, size.width, size.height)
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Check if this rectangle fully contains another.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }
}

/// Measured dimensions of the whole desktop surface, bands included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopBounds {
    pub width: i32,
    pub height: i32,
}

impl DesktopBounds {
    /// Create new desktop bounds.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// The region between the toolbar and taskbar bands.
    pub fn usable_area(&self, layout: &DesktopLayout) -> Rect {
        Rect::new(
            0,
            layout.toolbar_height,
            self.width,
            self.height
                .saturating_sub(layout.toolbar_height)
                .saturating_sub(layout.taskbar_height),
        )
    }

    /// Clamp a window origin so a window of `size` stays inside the usable area.
    pub fn clamp_position(&self, pos: Point, size: Size, layout: &DesktopLayout) -> Point {
        Point::new(
            clamp(pos.x, 0, self.width.saturating_sub(size.width)),
            clamp(
                pos.y,
                layout.toolbar_height,
                self.height
                    .saturating_sub(size.height)
                    .saturating_sub(layout.taskbar_height),
            ),
        )
    }
}

/// Layout constants shared by every part of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopLayout {
    /// Height of the reserved toolbar band at the top.
    pub toolbar_height: i32,
    /// Height of the reserved taskbar band at the bottom.
    pub taskbar_height: i32,
    /// Distance under which a dragged window snaps to an edge.
    pub snap_threshold: i32,
    /// Whether dragging snaps to edges at all.
    pub snapping: bool,
    /// Smallest size a resize may produce.
    pub min_size: Size,
    /// Size of newly added windows.
    pub default_size: Size,
    /// Origin (both axes) of the first added window.
    pub origin: i32,
    /// Cascade step applied per existing window when adding.
    pub offset_step: i32,
    /// Stacking order assumed for windows that never had one.
    pub base_z_index: u32,
}

impl Default for DesktopLayout {
    fn default() -> Self {
        Self {
            toolbar_height: 40,
            taskbar_height: 40,
            snap_threshold: 20,
            snapping: true,
            min_size: Size::new(200, 150),
            default_size: Size::new(400, 300),
            origin: 50,
            offset_step: 20,
            base_z_index: 100,
        }
    }
}

/// The closed set of applications a window can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Notepad,
    Video,
    Browser,
}

impl AppType {
    /// Every application offered by the toolbar menu, in menu order.
    pub const ALL: [AppType; 3] = [AppType::Notepad, AppType::Video, AppType::Browser];

    /// Lowercase identifier used on the wire and in sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Notepad => "notepad",
            AppType::Video => "video",
            AppType::Browser => "browser",
        }
    }

    /// Human-readable label used for default window titles.
    pub fn label(&self) -> &'static str {
        match self {
            AppType::Notepad => "Notepad",
            AppType::Video => "Video",
            AppType::Browser => "Browser",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppType {
    type Err = DesktopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "notepad" => Ok(AppType::Notepad),
            "video" => Ok(AppType::Video),
            "browser" => Ok(AppType::Browser),
            _ => Err(DesktopError::UnknownAppType(s.to_string())),
        }
    }
}

fn default_z_index() -> u32 {
    DesktopLayout::default().base_z_index
}

/// The state of one managed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    /// Stable identifier.
    pub id: WindowId,
    /// Top-left corner.
    pub pos: Point,
    /// Current dimensions.
    pub size: Size,
    /// Position captured when the window was maximized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_pos: Option<Point>,
    /// Size captured when the window was maximized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_size: Option<Size>,
    /// Hidden from the desktop, kept in the taskbar.
    #[serde(default)]
    pub is_minimized: bool,
    /// Occupies the whole usable area.
    #[serde(default)]
    pub is_maximized: bool,
    /// User-editable title.
    pub title: String,
    /// Hosted application.
    pub app_type: AppType,
    /// Stacking order, higher draws on top.
    #[serde(default = "default_z_index")]
    pub z_index: u32,
}

impl WindowRecord {
    /// The window's current rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.pos, self.size)
    }

    /// Default title for the `ordinal`-th window hosting `app_type`.
    pub fn default_title(app_type: AppType, ordinal: usize) -> String {
        format!("{} {}", app_type.label(), ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersects() {
        let r1 = Rect::new(0, 0, 100, 100);
        let r2 = Rect::new(50, 50, 100, 100);
        let r3 = Rect::new(200, 200, 50, 50);

        assert!(r1.intersects(&r2));
        assert!(r2.intersects(&r1));
        assert!(!r1.intersects(&r3));
        assert!(!r3.intersects(&r1));
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0, 40, 1000, 700);
        assert!(outer.contains(&Rect::new(10, 50, 200, 150)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&Rect::new(900, 50, 200, 150)));
        assert!(!outer.contains(&Rect::new(0, 0, 200, 150)));
    }

    #[test]
    fn test_usable_area() {
        let bounds = DesktopBounds::new(1280, 800);
        let area = bounds.usable_area(&DesktopLayout::default());
        assert_eq!(area, Rect::new(0, 40, 1280, 720));
    }

    #[test]
    fn test_clamp_position() {
        let layout = DesktopLayout::default();
        let bounds = DesktopBounds::new(1000, 800);
        let size = Size::new(400, 300);

        assert_eq!(
            bounds.clamp_position(Point::new(-50, 0), size, &layout),
            Point::new(0, 40)
        );
        assert_eq!(
            bounds.clamp_position(Point::new(900, 900), size, &layout),
            Point::new(600, 460)
        );
        assert_eq!(
            bounds.clamp_position(Point::new(100, 100), size, &layout),
            Point::new(100, 100)
        );
    }

    #[test]
    fn test_extreme_geometry_saturates() {
        let layout = DesktopLayout::default();
        let rect = Rect::new(i32::MAX - 10, i32::MAX - 10, 400, 300);
        assert_eq!(rect.right(), i32::MAX);
        assert_eq!(rect.bottom(), i32::MAX);

        let bounds = DesktopBounds::new(1280, 800);
        let huge = Size::new(i32::MAX, i32::MAX);
        let pos = bounds.clamp_position(Point::new(i32::MIN, i32::MIN), huge, &layout);
        assert_eq!(pos, Point::new(1280 - i32::MAX, 760 - i32::MAX));

        let tall_bands = DesktopLayout {
            taskbar_height: i32::MAX,
            ..layout
        };
        let pos = bounds.clamp_position(Point::new(0, 0), huge, &tall_bands);
        assert_eq!(pos.y, i32::MIN);
        assert_eq!(bounds.usable_area(&tall_bands).height, 760 - i32::MAX);
    }

    #[test]
    fn test_app_type_parse() {
        assert_eq!("notepad".parse::<AppType>(), Ok(AppType::Notepad));
        assert_eq!("Video".parse::<AppType>(), Ok(AppType::Video));
        assert_eq!("BROWSER".parse::<AppType>(), Ok(AppType::Browser));
        assert_eq!(
            "terminal".parse::<AppType>(),
            Err(DesktopError::UnknownAppType("terminal".to_string()))
        );
    }

    #[test]
    fn test_default_title() {
        assert_eq!(WindowRecord::default_title(AppType::Notepad, 1), "Notepad 1");
        assert_eq!(WindowRecord::default_title(AppType::Video, 2), "Video 2");
    }

    #[test]
    fn test_record_wire_format() {
        let record = WindowRecord {
            id: 7,
            pos: Point::new(50, 50),
            size: Size::new(400, 300),
            prev_pos: None,
            prev_size: None,
            is_minimized: false,
            is_maximized: false,
            title: "Notepad 1".to_string(),
            app_type: AppType::Notepad,
            z_index: 101,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"isMinimized\":false"));
        assert!(json.contains("\"appType\":\"notepad\""));
        assert!(json.contains("\"zIndex\":101"));
        assert!(!json.contains("prevPos"));
    }

    #[test]
    fn test_record_missing_z_index_uses_baseline() {
        let json = r#"{
            "id": 1,
            "pos": {"x": 50, "y": 50},
            "size": {"width": 400, "height": 300},
            "title": "Video 1",
            "appType": "video"
        }"#;
        let record: WindowRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.z_index, 100);
        assert!(!record.is_minimized);
        assert!(!record.is_maximized);
        assert_eq!(record.prev_pos, None);
    }
}
