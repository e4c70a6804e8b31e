//! Window state store.
//!
//! The reducers in this module are pure: each takes the current collection and
//! returns a new one, leaving the input untouched. Every reducer treats an
//! unknown id as a no-op because gesture callbacks may outlive a window that
//! was closed in the meantime.
//!
//! [`WindowStore`] owns the authoritative collection and notifies subscribers
//! once per committed change.

use crate::{DesktopBounds, DesktopLayout, Point, Size, WindowId, WindowRecord};

/// A partial update merged into a window record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    pub pos: Option<Point>,
    pub size: Option<Size>,
    pub title: Option<String>,
    pub is_minimized: Option<bool>,
    pub is_maximized: Option<bool>,
    pub z_index: Option<u32>,
}

impl WindowUpdate {
    /// An update that only moves the window.
    pub fn pos(pos: Point) -> Self {
        Self {
            pos: Some(pos),
            ..Default::default()
        }
    }

    /// An update that moves and resizes the window together.
    pub fn geometry(pos: Point, size: Size) -> Self {
        Self {
            pos: Some(pos),
            size: Some(size),
            ..Default::default()
        }
    }

    /// An update that renames the window.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Check whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn merge_into(&self, record: &mut WindowRecord) {
        if let Some(pos) = self.pos {
            record.pos = pos;
        }
        if let Some(size) = self.size {
            record.size = size;
        }
        if let Some(ref title) = self.title {
            record.title = title.clone();
        }
        if let Some(is_minimized) = self.is_minimized {
            record.is_minimized = is_minimized;
        }
        if let Some(is_maximized) = self.is_maximized {
            record.is_maximized = is_maximized;
        }
        if let Some(z_index) = self.z_index {
            record.z_index = z_index;
        }
    }
}

/// Find a window by id.
pub fn find_window(windows: &[WindowRecord], id: WindowId) -> Option<&WindowRecord> {
    windows.iter().find(|w| w.id == id)
}

/// Apply `f` to the record matching `id`, cloning everything else.
fn map_window(
    windows: &[WindowRecord],
    id: WindowId,
    f: impl Fn(&mut WindowRecord),
) -> Vec<WindowRecord> {
    windows
        .iter()
        .map(|w| {
            let mut w = w.clone();
            if w.id == id {
                f(&mut w);
            }
            w
        })
        .collect()
}

/// Merge `updates` into the window matching `id`.
pub fn update_window_state(
    windows: &[WindowRecord],
    id: WindowId,
    updates: &WindowUpdate,
) -> Vec<WindowRecord> {
    map_window(windows, id, |w| updates.merge_into(w))
}

/// Flip the minimized flag of a window (taskbar click).
///
/// Minimizing also clears the maximized flag; restoring leaves it as it was.
/// Either way the window is pushed below the toolbar band if needed.
pub fn toggle_window_state(
    windows: &[WindowRecord],
    id: WindowId,
    layout: &DesktopLayout,
) -> Vec<WindowRecord> {
    map_window(windows, id, |w| {
        let minimizing = !w.is_minimized;
        w.is_minimized = minimizing;
        if minimizing {
            w.is_maximized = false;
        }
        w.pos.y = w.pos.y.max(layout.toolbar_height);
    })
}

/// Minimize a window from its own chrome.
pub fn minimize_window_state(windows: &[WindowRecord], id: WindowId) -> Vec<WindowRecord> {
    map_window(windows, id, |w| {
        w.is_minimized = true;
        w.is_maximized = false;
    })
}

/// Maximize a window, or restore it if it is already maximized.
///
/// Only one window is shown while another is maximized: every other window is
/// minimized, in both directions of the toggle. An unknown id leaves the
/// collection untouched.
pub fn maximize_window_state(
    windows: &[WindowRecord],
    id: WindowId,
    bounds: DesktopBounds,
    layout: &DesktopLayout,
) -> Vec<WindowRecord> {
    if find_window(windows, id).is_none() {
        return windows.to_vec();
    }

    windows
        .iter()
        .map(|w| {
            let mut w = w.clone();
            if w.id != id {
                w.is_minimized = true;
            } else if w.is_maximized {
                w.pos = w.prev_pos.unwrap_or(w.pos);
                w.size = w.prev_size.unwrap_or(w.size);
                w.is_minimized = false;
                w.is_maximized = false;
            } else {
                w.prev_pos = Some(w.pos);
                w.prev_size = Some(w.size);
                let area = bounds.usable_area(layout);
                w.pos = Point::new(area.x, area.y);
                w.size = Size::new(area.width, area.height);
                w.is_minimized = false;
                w.is_maximized = true;
            }
            w
        })
        .collect()
}

/// Highest stacking order in use, if any window exists.
fn top_z_index(windows: &[WindowRecord]) -> Option<u32> {
    windows.iter().map(|w| w.z_index).max()
}

/// Stacking order for a newly added window: one above every existing window,
/// and never below the baseline.
pub fn next_z_index(windows: &[WindowRecord], layout: &DesktopLayout) -> u32 {
    top_z_index(windows)
        .unwrap_or(0)
        .max(layout.base_z_index)
        .saturating_add(1)
}

/// Renumber stacking order upward from the baseline, keeping relative order.
///
/// Ties keep collection order.
pub fn compact_z_indices(windows: &[WindowRecord], layout: &DesktopLayout) -> Vec<WindowRecord> {
    let mut order: Vec<usize> = (0..windows.len()).collect();
    order.sort_by_key(|&i| windows[i].z_index);

    let mut next = windows.to_vec();
    let mut z_index = layout.base_z_index;
    for i in order {
        z_index = z_index.saturating_add(1);
        next[i].z_index = z_index;
    }
    next
}

/// Compact the stacking order once it has reached the top of the range.
fn make_room(windows: &[WindowRecord], layout: &DesktopLayout) -> Vec<WindowRecord> {
    if top_z_index(windows) == Some(u32::MAX) {
        compact_z_indices(windows, layout)
    } else {
        windows.to_vec()
    }
}

/// Append a new window above all others.
pub fn add_window_state(
    windows: &[WindowRecord],
    mut record: WindowRecord,
    layout: &DesktopLayout,
) -> Vec<WindowRecord> {
    let mut next = make_room(windows, layout);
    record.z_index = next_z_index(&next, layout);
    next.push(record);
    next
}

/// Raise a window above all others.
///
/// The raised window gets `1 + max(z_index)` over the collection.
pub fn bring_to_front(
    windows: &[WindowRecord],
    id: WindowId,
    layout: &DesktopLayout,
) -> Vec<WindowRecord> {
    if find_window(windows, id).is_none() {
        return windows.to_vec();
    }

    let next = make_room(windows, layout);
    let z_index = top_z_index(&next).unwrap_or(0).saturating_add(1);
    map_window(&next, id, |w| w.z_index = z_index)
}

/// Remove a window from the collection.
pub fn remove_window(windows: &[WindowRecord], id: WindowId) -> Vec<WindowRecord> {
    windows.iter().filter(|w| w.id != id).cloned().collect()
}

/// Handle returned by [`WindowStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[WindowRecord]) + Send>;

/// The authoritative window collection.
///
/// Single writer, many readers: mutations go through [`WindowStore::apply`]
/// which swaps in the reducer's result and notifies subscribers.
#[derive(Default)]
pub struct WindowStore {
    windows: Vec<WindowRecord>,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for WindowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowStore")
            .field("windows", &self.windows)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl WindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current window records in collection order.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    /// Find a window by id.
    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        find_window(&self.windows, id)
    }

    /// Check if a window exists.
    pub fn contains(&self, id: WindowId) -> bool {
        self.get(id).is_some()
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Check if the store holds no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Number of committed changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Run a reducer over the collection and commit its result.
    ///
    /// Subscribers are only notified when the result differs.
    pub fn apply(&mut self, reducer: impl FnOnce(&[WindowRecord]) -> Vec<WindowRecord>) {
        let next = reducer(&self.windows);
        if next != self.windows {
            self.commit(next);
        }
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, windows: Vec<WindowRecord>) {
        self.commit(windows);
    }

    /// Register a listener called after every committed change.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&[WindowRecord]) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, windows: Vec<WindowRecord>) {
        self.windows = windows;
        self.revision += 1;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.windows);
        }
    }
}
