//! Pure geometry helpers: clamping, confinement and edge snapping.
//!
//! Coordinates may come straight off the wire or out of a stored session, so
//! all arithmetic here saturates instead of overflowing.

use crate::{DesktopBounds, DesktopLayout, Point, Size, WindowId, WindowRecord};

/// Restrict `value` to `[min, max]`.
///
/// The caller guarantees `min <= max`. When it does not hold (a window larger
/// than the desktop), the upper bound wins and nothing panics.
pub fn clamp(value: i32, min: i32, max: i32) -> i32 {
    value.max(min).min(max)
}

/// Candidate edges a window of `size` may snap to, in matching order.
///
/// Desktop corners come first, then the top-left and bottom-right corners of
/// every other non-minimized window in collection order.
fn snap_edges(
    size: Size,
    windows: &[WindowRecord],
    current_id: WindowId,
    bounds: DesktopBounds,
    layout: &DesktopLayout,
) -> Vec<Point> {
    let mut edges = vec![
        Point::new(0, layout.toolbar_height),
        Point::new(
            bounds.width.saturating_sub(size.width),
            bounds
                .height
                .saturating_sub(size.height)
                .saturating_sub(layout.taskbar_height),
        ),
    ];

    for win in windows {
        if win.id != current_id && !win.is_minimized {
            edges.push(win.pos);
            let rect = win.rect();
            edges.push(Point::new(rect.right(), rect.bottom()));
        }
    }

    edges
}

/// Snap a candidate window origin to nearby edges.
///
/// Each axis is handled independently: edges are visited in order and a
/// coordinate strictly closer than `threshold` to an edge coordinate is
/// replaced by it, so the last matching edge wins. Without measured `bounds`
/// the position is returned unchanged.
pub fn snap_to_edges(
    pos: Point,
    size: Size,
    windows: &[WindowRecord],
    current_id: WindowId,
    threshold: i32,
    bounds: Option<DesktopBounds>,
    layout: &DesktopLayout,
) -> Point {
    let Some(bounds) = bounds else {
        return pos;
    };

    // A negative threshold disables snapping
    let threshold = u32::try_from(threshold).unwrap_or(0);
    let mut snapped = pos;
    for edge in snap_edges(size, windows, current_id, bounds, layout) {
        if snapped.x.abs_diff(edge.x) < threshold {
            snapped.x = edge.x;
        }
        if snapped.y.abs_diff(edge.y) < threshold {
            snapped.y = edge.y;
        }
    }
    snapped
}

/// Keep a window of `size` inside the usable area.
///
/// Without measured bounds only the left edge and the toolbar floor apply.
pub fn confine(
    pos: Point,
    size: Size,
    bounds: Option<DesktopBounds>,
    layout: &DesktopLayout,
) -> Point {
    match bounds {
        Some(bounds) => bounds.clamp_position(pos, size, layout),
        None => Point::new(pos.x.max(0), pos.y.max(layout.toolbar_height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppType;

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
            z_index: 100 + id as u32,
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 10), 5);
        assert_eq!(clamp(-5, 0, 10), 0);
        assert_eq!(clamp(15, 0, 10), 10);
        assert_eq!(clamp(0, 0, 0), 0);
    }

    #[test]
    fn test_clamp_inverted_bounds_prefers_max() {
        // Window wider than the desktop: no swap, no panic
        assert_eq!(clamp(50, 0, -100), -100);
    }

    #[test]
    fn test_snap_without_bounds_is_identity() {
        let layout = DesktopLayout::default();
        let pos = Point::new(3, 42);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &[], 1, 20, None, &layout);
        assert_eq!(snapped, pos);
    }

    #[test]
    fn test_snap_to_desktop_top_left() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(1280, 800));
        let threshold = layout.snap_threshold;

        // threshold - 1 away from both edges: snaps
        let near = Point::new(threshold - 1, layout.toolbar_height + threshold - 1);
        let snapped = snap_to_edges(near, Size::new(400, 300), &[], 1, threshold, bounds, &layout);
        assert_eq!(snapped, Point::new(0, layout.toolbar_height));

        // threshold + 1 away: untouched
        let far = Point::new(threshold + 1, layout.toolbar_height + threshold + 1);
        let snapped = snap_to_edges(far, Size::new(400, 300), &[], 1, threshold, bounds, &layout);
        assert_eq!(snapped, far);
    }

    #[test]
    fn test_snap_exactly_at_threshold_does_not_snap() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(1280, 800));
        let pos = Point::new(20, 300);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &[], 1, 20, bounds, &layout);
        assert_eq!(snapped.x, 20);
    }

    #[test]
    fn test_snap_to_desktop_bottom_right() {
        let layout = DesktopLayout::default();
        let bounds = DesktopBounds::new(1280, 800);
        let size = Size::new(400, 300);
        // Far edge aligns at x = 880, y = 800 - 300 - 40 = 460
        let pos = Point::new(870, 455);
        let snapped = snap_to_edges(pos, size, &[], 1, 20, Some(bounds), &layout);
        assert_eq!(snapped, Point::new(880, 460));
    }

    #[test]
    fn test_snap_axes_are_independent() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(1280, 800));
        let pos = Point::new(5, 300);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &[], 1, 20, bounds, &layout);
        assert_eq!(snapped, Point::new(0, 300));
    }

    #[test]
    fn test_snap_to_other_window_corners() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(2000, 1200));
        let others = vec![window(1, 300, 200, 400, 300), window(2, 600, 400, 200, 150)];

        // Near window 1's bottom-right corner (700, 500)
        let snapped = snap_to_edges(
            Point::new(690, 512),
            Size::new(200, 150),
            &others,
            2,
            20,
            bounds,
            &layout,
        );
        assert_eq!(snapped, Point::new(700, 500));
    }

    #[test]
    fn test_snap_ignores_self_and_minimized() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(2000, 1200));
        let mut hidden = window(2, 500, 500, 200, 150);
        hidden.is_minimized = true;
        let windows = vec![window(1, 505, 505, 400, 300), hidden];

        // Window 1 is the one being dragged; window 2 is minimized
        let pos = Point::new(505, 505);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &windows, 1, 20, bounds, &layout);
        assert_eq!(snapped, pos);
    }

    #[test]
    fn test_snap_extreme_coordinates() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(1280, 800));
        let others = vec![window(2, i32::MAX - 5, i32::MAX - 5, 400, 300)];

        let pos = Point::new(i32::MIN, i32::MAX);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &others, 1, 20, bounds, &layout);
        assert_eq!(snapped, Point::new(i32::MIN, i32::MAX));

        let snapped = snap_to_edges(
            Point::new(i32::MAX - 10, 300),
            Size::new(400, 300),
            &others,
            1,
            20,
            bounds,
            &layout,
        );
        assert_eq!(snapped.x, i32::MAX);
    }

    #[test]
    fn test_negative_threshold_never_snaps() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(1280, 800));
        let pos = Point::new(0, 40);
        let snapped = snap_to_edges(pos, Size::new(400, 300), &[], 1, -5, bounds, &layout);
        assert_eq!(snapped, pos);
    }

    #[test]
    fn test_confine() {
        let layout = DesktopLayout::default();
        let size = Size::new(400, 300);
        let bounds = Some(DesktopBounds::new(1280, 800));

        assert_eq!(confine(Point::new(530, 530), size, bounds, &layout), Point::new(530, 460));
        assert_eq!(confine(Point::new(-9, 9), size, None, &layout), Point::new(0, 40));
        assert_eq!(
            confine(Point::new(5000, 5000), size, None, &layout),
            Point::new(5000, 5000)
        );
    }

    #[test]
    fn test_snap_last_matching_edge_wins() {
        let layout = DesktopLayout::default();
        let bounds = Some(DesktopBounds::new(2000, 1200));
        // Both windows offer an x edge within the threshold of 310
        let windows = vec![window(1, 300, 600, 100, 100), window(2, 315, 800, 100, 100)];
        let snapped = snap_to_edges(
            Point::new(310, 300),
            Size::new(200, 150),
            &windows,
            99,
            20,
            bounds,
            &layout,
        );
        assert_eq!(snapped.x, 315);
    }
}
