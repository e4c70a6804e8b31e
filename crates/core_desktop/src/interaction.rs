//! Drag and resize gestures.
//!
//! Each window carries at most one [`Gesture`]. A gesture starts on
//! pointer-down over the header or a resize handle, turns every pointer-move
//! into a geometry update, and ends on the next pointer-up wherever it happens.

use crate::geometry::{confine, snap_to_edges};
use crate::store::WindowUpdate;
use crate::{DesktopBounds, DesktopError, DesktopLayout, Point, Size, WindowRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which edge or corner a resize handle grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeDirection {
    /// All eight handles, corners first.
    pub const ALL: [ResizeDirection; 8] = [
        ResizeDirection::NE,
        ResizeDirection::NW,
        ResizeDirection::SE,
        ResizeDirection::SW,
        ResizeDirection::N,
        ResizeDirection::S,
        ResizeDirection::E,
        ResizeDirection::W,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeDirection::N => "n",
            ResizeDirection::S => "s",
            ResizeDirection::E => "e",
            ResizeDirection::W => "w",
            ResizeDirection::NE => "ne",
            ResizeDirection::NW => "nw",
            ResizeDirection::SE => "se",
            ResizeDirection::SW => "sw",
        }
    }

    fn north(&self) -> bool {
        matches!(self, ResizeDirection::N | ResizeDirection::NE | ResizeDirection::NW)
    }

    fn south(&self) -> bool {
        matches!(self, ResizeDirection::S | ResizeDirection::SE | ResizeDirection::SW)
    }

    fn east(&self) -> bool {
        matches!(self, ResizeDirection::E | ResizeDirection::NE | ResizeDirection::SE)
    }

    fn west(&self) -> bool {
        matches!(self, ResizeDirection::W | ResizeDirection::NW | ResizeDirection::SW)
    }
}

impl fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResizeDirection::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid resize direction '{}'", s))
    }
}

/// Transient pointer state of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving the window by its header.
    Dragging {
        /// Pointer position relative to the window origin at pointer-down.
        offset: Point,
    },
    /// Resizing the window by one of its handles.
    Resizing {
        direction: ResizeDirection,
        /// Raw pointer position at pointer-down.
        start_pointer: Point,
        /// Window origin at pointer-down.
        start_pos: Point,
        /// Window size at pointer-down.
        start_size: Size,
    },
}

impl Gesture {
    /// Start dragging `record` with the pointer at `pointer`.
    pub fn begin_drag(record: &WindowRecord, pointer: Point) -> Result<Self, DesktopError> {
        if record.is_minimized {
            return Err(DesktopError::WindowMinimized(record.id));
        }
        Ok(Gesture::Dragging {
            offset: Point::new(
                pointer.x.saturating_sub(record.pos.x),
                pointer.y.saturating_sub(record.pos.y),
            ),
        })
    }

    /// Start resizing `record` from the `direction` handle.
    pub fn begin_resize(
        record: &WindowRecord,
        pointer: Point,
        direction: ResizeDirection,
    ) -> Result<Self, DesktopError> {
        if record.is_minimized {
            return Err(DesktopError::WindowMinimized(record.id));
        }
        Ok(Gesture::Resizing {
            direction,
            start_pointer: pointer,
            start_pos: record.pos,
            start_size: record.size,
        })
    }

    /// Check whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }

    /// Translate a pointer-move into the update to commit for `record`.
    ///
    /// `windows` is the last committed collection, read for snapping.
    /// Returns `None` when idle or when the window has been minimized.
    pub fn pointer_move(
        &self,
        record: &WindowRecord,
        pointer: Point,
        windows: &[WindowRecord],
        bounds: Option<DesktopBounds>,
        layout: &DesktopLayout,
    ) -> Option<WindowUpdate> {
        if record.is_minimized {
            return None;
        }

        match *self {
            Gesture::Idle => None,
            Gesture::Dragging { offset } => {
                let mut pos = Point::new(
                    pointer.x.saturating_sub(offset.x),
                    pointer.y.saturating_sub(offset.y),
                );
                if layout.snapping {
                    pos = snap_to_edges(
                        pos,
                        record.size,
                        windows,
                        record.id,
                        layout.snap_threshold,
                        bounds,
                        layout,
                    );
                }
                Some(WindowUpdate::pos(confine(pos, record.size, bounds, layout)))
            }
            Gesture::Resizing {
                direction,
                start_pointer,
                start_pos,
                start_size,
            } => {
                let (pos, size) =
                    resize_geometry(direction, start_pointer, start_pos, start_size, pointer, layout);
                Some(WindowUpdate::geometry(confine(pos, size, bounds, layout), size))
            }
        }
    }
}

/// Compute the unclamped origin and size of a resize in progress.
///
/// West and north handles move the origin by the raw pointer delta even when
/// the size is already at its minimum.
fn resize_geometry(
    direction: ResizeDirection,
    start_pointer: Point,
    start_pos: Point,
    start_size: Size,
    pointer: Point,
    layout: &DesktopLayout,
) -> (Point, Size) {
    let dx = pointer.x.saturating_sub(start_pointer.x);
    let dy = pointer.y.saturating_sub(start_pointer.y);
    let min = layout.min_size;

    let mut pos = start_pos;
    let mut size = start_size;

    if direction.east() {
        size.width = start_size.width.saturating_add(dx).max(min.width);
    }
    if direction.west() {
        size.width = start_size.width.saturating_sub(dx).max(min.width);
        pos.x = start_pos.x.saturating_add(dx);
    }
    if direction.south() {
        size.height = start_size.height.saturating_add(dy).max(min.height);
    }
    if direction.north() {
        size.height = start_size.height.saturating_sub(dy).max(min.height);
        pos.y = start_pos.y.saturating_add(dy);
    }

    (pos, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppType, WindowId};

    fn window(id: WindowId, x: i32, y: i32, width: i32, height: i32) -> WindowRecord {
        WindowRecord {
            id,
            pos: Point::new(x, y),
            size: Size::new(width, height),
            prev_pos: None,
            prev_size: None,
            is_minimized: false,
            is_maximized: false,
            title: format!("Notepad {}", id),
            app_type: AppType::Notepad,
            z_index: 101,
        }
    }

    fn bounds() -> Option<DesktopBounds> {
        Some(DesktopBounds::new(1280, 800))
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("ne".parse::<ResizeDirection>(), Ok(ResizeDirection::NE));
        assert_eq!("SW".parse::<ResizeDirection>(), Ok(ResizeDirection::SW));
        assert!("up".parse::<ResizeDirection>().is_err());
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&ResizeDirection::SE).unwrap();
        assert_eq!(json, "\"se\"");
        let parsed: ResizeDirection = serde_json::from_str("\"nw\"").unwrap();
        assert_eq!(parsed, ResizeDirection::NW);
    }

    #[test]
    fn test_begin_drag_captures_offset() {
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(130, 110)).unwrap();
        assert_eq!(gesture, Gesture::Dragging { offset: Point::new(30, 10) });
        assert!(gesture.is_active());
    }

    #[test]
    fn test_no_gesture_on_minimized_window() {
        let mut win = window(1, 100, 100, 400, 300);
        win.is_minimized = true;
        assert_eq!(
            Gesture::begin_drag(&win, Point::new(0, 0)),
            Err(DesktopError::WindowMinimized(1))
        );
        assert_eq!(
            Gesture::begin_resize(&win, Point::new(0, 0), ResizeDirection::E),
            Err(DesktopError::WindowMinimized(1))
        );
    }

    #[test]
    fn test_idle_pointer_move_does_nothing() {
        let win = window(1, 100, 100, 400, 300);
        let update = Gesture::Idle.pointer_move(
            &win,
            Point::new(500, 500),
            &[],
            bounds(),
            &DesktopLayout::default(),
        );
        assert_eq!(update, None);
    }

    #[test]
    fn test_drag_follows_pointer() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(130, 110)).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(330, 310), &[win.clone()], bounds(), &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(300, 300)));
        assert_eq!(update.size, None);
    }

    #[test]
    fn test_drag_snaps_near_left_edge() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(100, 100)).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(19, 300), &[win.clone()], bounds(), &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(0, 300)));

        let update = gesture
            .pointer_move(&win, Point::new(21, 300), &[win.clone()], bounds(), &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(21, 300)));
    }

    #[test]
    fn test_drag_without_snapping() {
        let layout = DesktopLayout {
            snapping: false,
            ..Default::default()
        };
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(100, 100)).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(5, 300), &[win.clone()], bounds(), &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(5, 300)));
    }

    #[test]
    fn test_drag_without_bounds_applies_floors_only() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(100, 100)).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(-40, 10), &[win.clone()], None, &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(0, 40)));

        let update = gesture
            .pointer_move(&win, Point::new(5000, 3000), &[win.clone()], None, &layout)
            .unwrap();
        assert_eq!(update.pos, Some(Point::new(5000, 3000)));
    }

    #[test]
    fn test_drag_always_within_usable_area() {
        let layout = DesktopLayout::default();
        let desktop = DesktopBounds::new(1280, 800);
        let others = vec![window(2, 600, 300, 300, 200), window(3, 0, 40, 200, 150)];

        for (width, height) in [(200, 150), (400, 300), (900, 600)] {
            let win = window(1, 200, 200, width, height);
            let gesture = Gesture::begin_drag(&win, Point::new(210, 215)).unwrap();

            for px in (-600..=2000).step_by(37) {
                for py in (-600..=1600).step_by(41) {
                    let update = gesture
                        .pointer_move(&win, Point::new(px, py), &others, Some(desktop), &layout)
                        .unwrap();
                    let pos = update.pos.unwrap();
                    assert!(pos.x >= 0 && pos.x <= desktop.width - width, "x out of range: {:?}", pos);
                    assert!(
                        pos.y >= layout.toolbar_height
                            && pos.y <= desktop.height - height - layout.taskbar_height,
                        "y out of range: {:?}",
                        pos
                    );
                }
            }
        }
    }

    #[test]
    fn test_resize_south_east_grows() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);
        let gesture =
            Gesture::begin_resize(&win, Point::new(500, 400), ResizeDirection::SE).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(550, 420), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(450, 320)));
        assert_eq!(update.pos, Some(Point::new(100, 100)));
    }

    #[test]
    fn test_resize_north_west_moves_origin() {
        let layout = DesktopLayout::default();
        let win = window(1, 300, 300, 400, 300);
        let gesture =
            Gesture::begin_resize(&win, Point::new(300, 300), ResizeDirection::NW).unwrap();

        let update = gesture
            .pointer_move(&win, Point::new(250, 260), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(450, 340)));
        assert_eq!(update.pos, Some(Point::new(250, 260)));
    }

    #[test]
    fn test_resize_west_position_follows_pointer_past_minimum() {
        let layout = DesktopLayout::default();
        let win = window(1, 300, 300, 400, 300);
        let gesture = Gesture::begin_resize(&win, Point::new(300, 400), ResizeDirection::W).unwrap();

        // Width floors at 200 but x keeps following the pointer
        let update = gesture
            .pointer_move(&win, Point::new(600, 400), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(200, 300)));
        assert_eq!(update.pos, Some(Point::new(600, 300)));
    }

    #[test]
    fn test_resize_single_axis_leaves_other_axis() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);

        let east = Gesture::begin_resize(&win, Point::new(500, 200), ResizeDirection::E).unwrap();
        let update = east
            .pointer_move(&win, Point::new(560, 260), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(460, 300)));

        let south = Gesture::begin_resize(&win, Point::new(300, 400), ResizeDirection::S).unwrap();
        let update = south
            .pointer_move(&win, Point::new(360, 450), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(400, 350)));
    }

    #[test]
    fn test_resize_respects_minimum_size() {
        let layout = DesktopLayout::default();
        let win = window(1, 300, 200, 400, 300);

        for direction in ResizeDirection::ALL {
            let gesture = Gesture::begin_resize(&win, Point::new(500, 350), direction).unwrap();
            for dx in (-900..=900).step_by(45) {
                for dy in (-900..=900).step_by(45) {
                    let update = gesture
                        .pointer_move(&win, Point::new(500 + dx, 350 + dy), &[], bounds(), &layout)
                        .unwrap();
                    let size = update.size.unwrap();
                    assert!(size.width >= layout.min_size.width, "{direction}: {size:?}");
                    assert!(size.height >= layout.min_size.height, "{direction}: {size:?}");
                }
            }
        }
    }

    #[test]
    fn test_resize_clamps_with_new_size() {
        let layout = DesktopLayout::default();
        let win = window(1, 800, 400, 400, 300);
        let gesture =
            Gesture::begin_resize(&win, Point::new(1200, 700), ResizeDirection::SE).unwrap();

        // Grows to 600x400; x must fall back to 1280 - 600, y to 800 - 400 - 40
        let update = gesture
            .pointer_move(&win, Point::new(1400, 800), &[], bounds(), &layout)
            .unwrap();
        assert_eq!(update.size, Some(Size::new(600, 400)));
        assert_eq!(update.pos, Some(Point::new(680, 360)));
    }

    #[test]
    fn test_drag_extreme_pointer_stays_in_bounds() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(130, 110)).unwrap();

        for pointer in [
            Point::new(i32::MIN, 0),
            Point::new(0, i32::MIN),
            Point::new(i32::MAX, i32::MAX),
            Point::new(i32::MIN, i32::MAX),
        ] {
            let update = gesture
                .pointer_move(&win, pointer, &[win.clone()], bounds(), &layout)
                .unwrap();
            let pos = update.pos.unwrap();
            assert!(pos.x >= 0 && pos.x <= 880, "{:?} -> {:?}", pointer, pos);
            assert!(pos.y >= 40 && pos.y <= 460, "{:?} -> {:?}", pointer, pos);
        }
    }

    #[test]
    fn test_begin_drag_extreme_pointer() {
        let win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(i32::MIN, i32::MIN)).unwrap();
        assert_eq!(
            gesture,
            Gesture::Dragging {
                offset: Point::new(i32::MIN, i32::MIN)
            }
        );
    }

    #[test]
    fn test_resize_extreme_pointer_saturates() {
        let layout = DesktopLayout::default();
        let win = window(1, 100, 100, 400, 300);

        for direction in ResizeDirection::ALL {
            let gesture = Gesture::begin_resize(&win, Point::new(500, 400), direction).unwrap();
            for pointer in [Point::new(i32::MIN, i32::MIN), Point::new(i32::MAX, i32::MAX)] {
                let update = gesture
                    .pointer_move(&win, pointer, &[], bounds(), &layout)
                    .unwrap();
                let size = update.size.unwrap();
                assert!(size.width >= layout.min_size.width, "{direction}: {size:?}");
                assert!(size.height >= layout.min_size.height, "{direction}: {size:?}");
            }
        }
    }

    #[test]
    fn test_move_ignored_once_minimized() {
        let layout = DesktopLayout::default();
        let mut win = window(1, 100, 100, 400, 300);
        let gesture = Gesture::begin_drag(&win, Point::new(100, 100)).unwrap();
        win.is_minimized = true;

        let update = gesture.pointer_move(&win, Point::new(300, 300), &[], bounds(), &layout);
        assert_eq!(update, None);
    }
}
