//! Desktop orchestrator.
//!
//! [`Desktop`] owns the window store and everything that hangs off it: the id
//! counter, the measured bounds, in-progress gestures, mounted content and the
//! session slot. Hosts drive it with toolbar, chrome, taskbar and pointer
//! actions, then read a [`DesktopView`] back.

use crate::content::{provider_for, ContentInput, ContentProvider, ContentSettings};
use crate::geometry::confine;
use crate::interaction::{Gesture, ResizeDirection};
use crate::session::{self, SessionSlot};
use crate::store::{self, SubscriptionId, WindowStore, WindowUpdate};
use crate::view::{DesktopView, TaskbarEntry, WindowView, EMPTY_TASKBAR_HINT};
use crate::{
    AppType, DesktopBounds, DesktopError, DesktopLayout, Point, WindowId, WindowRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Default key of the durable session slot.
pub const DEFAULT_SESSION_KEY: &str = "desktop-session";

/// The part of a window a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "direction", rename_all = "snake_case")]
pub enum PointerTarget {
    /// The title bar: starts a drag.
    Header,
    /// One of the eight resize handles: starts a resize.
    Resize(ResizeDirection),
    /// Anywhere else in the window: raises it.
    Body,
}

/// The virtual desktop.
pub struct Desktop {
    store: WindowStore,
    layout: DesktopLayout,
    content_settings: ContentSettings,
    bounds: Option<DesktopBounds>,
    gestures: HashMap<WindowId, Gesture>,
    providers: HashMap<WindowId, Box<dyn ContentProvider>>,
    slot: Box<dyn SessionSlot>,
    session_key: String,
    next_id: WindowId,
}

impl Desktop {
    /// Create an empty desktop persisting into `slot`.
    pub fn new(layout: DesktopLayout, slot: Box<dyn SessionSlot>) -> Self {
        Self {
            store: WindowStore::new(),
            layout,
            content_settings: ContentSettings::default(),
            bounds: None,
            gestures: HashMap::new(),
            providers: HashMap::new(),
            slot,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            next_id: 1,
        }
    }

    /// Use a different key for the durable session slot.
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// Use different defaults for newly mounted content.
    pub fn with_content_settings(mut self, settings: ContentSettings) -> Self {
        self.content_settings = settings;
        self
    }

    pub fn layout(&self) -> &DesktopLayout {
        &self.layout
    }

    /// Replace the layout constants. Existing windows are left where they are.
    pub fn set_layout(&mut self, layout: DesktopLayout) {
        self.layout = layout;
    }

    /// Replace the defaults used for content mounted from now on.
    pub fn set_content_settings(&mut self, settings: ContentSettings) {
        self.content_settings = settings;
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Replace the durable slot key used by later saves, loads and clears.
    pub fn set_session_key(&mut self, key: impl Into<String>) {
        self.session_key = key.into();
    }

    /// Last measured desktop bounds.
    pub fn bounds(&self) -> Option<DesktopBounds> {
        self.bounds
    }

    /// Record the desktop's measured size. Called by the host on every change.
    pub fn set_bounds(&mut self, bounds: DesktopBounds) {
        if self.bounds != Some(bounds) {
            debug!("Desktop bounds now {}x{}", bounds.width, bounds.height);
        }
        self.bounds = Some(bounds);
    }

    /// Window records in creation order.
    pub fn windows(&self) -> &[WindowRecord] {
        self.store.windows()
    }

    /// Find a window by id.
    pub fn window(&self, id: WindowId) -> Option<&WindowRecord> {
        self.store.get(id)
    }

    /// Number of windows, minimized ones included.
    pub fn window_count(&self) -> usize {
        self.store.len()
    }

    /// Number of committed store changes.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// The gesture in progress on a window.
    pub fn gesture(&self, id: WindowId) -> Gesture {
        self.gestures.get(&id).copied().unwrap_or_default()
    }

    /// Register a listener called after every committed change.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&[WindowRecord]) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Remove a listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Toolbar
    // ------------------------------------------------------------------

    /// Open a new window hosting `app_type`.
    ///
    /// New windows cascade from the origin by one step per existing window,
    /// stay inside the usable area and open above everything else.
    pub fn add_window(&mut self, app_type: AppType) -> WindowId {
        let id = self.issue_id();

        let count = self.store.len();
        let step = i32::try_from(count)
            .unwrap_or(i32::MAX)
            .saturating_mul(self.layout.offset_step);
        let offset = self.layout.origin.saturating_add(step);
        let size = self.layout.default_size;
        let record = WindowRecord {
            id,
            pos: confine(Point::new(offset, offset), size, self.bounds, &self.layout),
            size,
            prev_pos: None,
            prev_size: None,
            is_minimized: false,
            is_maximized: false,
            title: WindowRecord::default_title(app_type, count + 1),
            app_type,
            z_index: 0,
        };

        info!("Added window {} '{}'", id, record.title);
        let layout = self.layout;
        self.store
            .apply(|windows| store::add_window_state(windows, record, &layout));
        self.mount(id, app_type);
        id
    }

    /// Write the current collection to the session slot.
    pub fn save_session(&mut self) -> bool {
        session::save_session(self.slot.as_mut(), &self.session_key, self.store.windows())
    }

    /// Replace the collection with the saved session.
    ///
    /// A missing or unreadable session leaves the desktop empty. Returns the
    /// number of windows restored.
    pub fn load_session(&mut self) -> usize {
        let windows = session::load_session(self.slot.as_ref(), &self.session_key);
        if let Some(max_id) = windows.iter().map(|w| w.id).max() {
            self.next_id = self.next_id.max(max_id.saturating_add(1));
        }

        self.unmount_all();
        self.gestures.clear();
        let mounts: Vec<(WindowId, AppType)> = windows.iter().map(|w| (w.id, w.app_type)).collect();
        self.store.replace(windows);
        for (id, app_type) in mounts {
            self.mount(id, app_type);
        }
        self.store.len()
    }

    /// Delete the saved session and close every window.
    pub fn clear_session(&mut self) {
        session::clear_session(self.slot.as_mut(), &self.session_key);
        self.unmount_all();
        self.gestures.clear();
        self.store.replace(Vec::new());
    }

    // ------------------------------------------------------------------
    // Window chrome and taskbar
    // ------------------------------------------------------------------

    /// Close a window. Returns false if it did not exist.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        if !self.store.contains(id) {
            debug!("Close ignored for unknown window {}", id);
            return false;
        }
        self.abandon_gesture(id);
        if let Some(mut provider) = self.providers.remove(&id) {
            provider.unmount();
        }
        self.store.apply(|windows| store::remove_window(windows, id));
        info!("Closed window {}", id);
        true
    }

    /// Minimize or restore a window (taskbar click).
    pub fn toggle_window(&mut self, id: WindowId) {
        let layout = self.layout;
        self.store
            .apply(|windows| store::toggle_window_state(windows, id, &layout));
        self.abandon_if_minimized(id);
    }

    /// Minimize a window from its own chrome.
    pub fn minimize_window(&mut self, id: WindowId) {
        self.store
            .apply(|windows| store::minimize_window_state(windows, id));
        self.abandon_if_minimized(id);
    }

    /// Maximize a window, or restore it when already maximized.
    ///
    /// Every other window is minimized. Needs measured bounds.
    pub fn maximize_window(&mut self, id: WindowId) -> Result<(), DesktopError> {
        let Some(bounds) = self.bounds else {
            warn!("Cannot maximize window {}: desktop not measured yet", id);
            return Err(DesktopError::BoundsUnavailable);
        };
        if !self.store.contains(id) {
            debug!("Maximize ignored for unknown window {}", id);
            return Ok(());
        }

        let layout = self.layout;
        self.store
            .apply(|windows| store::maximize_window_state(windows, id, bounds, &layout));

        let hidden: Vec<WindowId> = self
            .gestures
            .keys()
            .copied()
            .filter(|&other| other != id)
            .collect();
        for other in hidden {
            self.abandon_gesture(other);
        }
        Ok(())
    }

    /// Rename a window.
    pub fn rename_window(&mut self, id: WindowId, title: impl Into<String>) {
        let update = WindowUpdate::title(title);
        self.store
            .apply(|windows| store::update_window_state(windows, id, &update));
    }

    /// Raise a window above all others.
    pub fn focus_window(&mut self, id: WindowId) {
        let layout = self.layout;
        self.store
            .apply(|windows| store::bring_to_front(windows, id, &layout));
    }

    /// Forward user input to the content hosted in a window.
    pub fn content_input(
        &mut self,
        id: WindowId,
        input: ContentInput,
    ) -> Result<(), DesktopError> {
        let app_type = self
            .store
            .get(id)
            .map(|w| w.app_type)
            .ok_or(DesktopError::WindowNotFound(id))?;
        let provider = self
            .providers
            .get_mut(&id)
            .ok_or(DesktopError::WindowNotFound(id))?;

        if provider.input(input) {
            debug!("Content input delivered to window {}", id);
            Ok(())
        } else {
            Err(DesktopError::UnsupportedInput(id, app_type))
        }
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Handle a pointer-down on part of a window.
    ///
    /// Header and resize-handle presses start a gesture; every press raises
    /// the window exactly once.
    pub fn pointer_down(
        &mut self,
        id: WindowId,
        target: PointerTarget,
        pointer: Point,
    ) -> Result<(), DesktopError> {
        let record = self.store.get(id).ok_or(DesktopError::WindowNotFound(id))?;

        match target {
            PointerTarget::Header => {
                let gesture = Gesture::begin_drag(record, pointer)?;
                self.gestures.insert(id, gesture);
                debug!("Drag started on window {}", id);
            }
            PointerTarget::Resize(direction) => {
                let gesture = Gesture::begin_resize(record, pointer, direction)?;
                self.gestures.insert(id, gesture);
                debug!("Resize {} started on window {}", direction, id);
            }
            PointerTarget::Body => {
                if record.is_minimized {
                    return Err(DesktopError::WindowMinimized(id));
                }
            }
        }

        self.focus_window(id);
        Ok(())
    }

    /// Feed a pointer-move to every gesture in progress.
    ///
    /// Returns the number of windows whose geometry was committed.
    pub fn pointer_move(&mut self, pointer: Point) -> usize {
        let mut active: Vec<WindowId> = self.gestures.keys().copied().collect();
        active.sort_unstable();

        let mut committed = 0;
        for id in active {
            let gesture = self.gesture(id);
            let update = match self.store.get(id) {
                Some(record) => gesture.pointer_move(
                    record,
                    pointer,
                    self.store.windows(),
                    self.bounds,
                    &self.layout,
                ),
                None => None,
            };

            match update {
                Some(update) => {
                    self.store
                        .apply(|windows| store::update_window_state(windows, id, &update));
                    committed += 1;
                }
                None => self.abandon_gesture(id),
            }
        }
        committed
    }

    /// End every gesture in progress. Returns how many ended.
    pub fn pointer_up(&mut self) -> usize {
        let ended = self.gestures.len();
        self.gestures.clear();
        ended
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Build the render model for the current state.
    pub fn render(&self) -> DesktopView {
        let mut windows: Vec<WindowView> = self
            .store
            .windows()
            .iter()
            .filter(|w| !w.is_minimized)
            .map(|w| WindowView {
                id: w.id,
                title: w.title.clone(),
                app_type: w.app_type,
                rect: w.rect(),
                z_index: w.z_index,
                is_maximized: w.is_maximized,
                interacting: self.gesture(w.id).is_active(),
                content: self.providers.get(&w.id).map(|p| p.view()),
            })
            .collect();
        windows.sort_by_key(|w| w.z_index);

        let taskbar: Vec<TaskbarEntry> = self
            .store
            .windows()
            .iter()
            .map(|w| TaskbarEntry {
                id: w.id,
                title: w.title.clone(),
                minimized: w.is_minimized,
            })
            .collect();

        let placeholder = taskbar
            .is_empty()
            .then(|| EMPTY_TASKBAR_HINT.to_string());

        DesktopView {
            windows,
            taskbar,
            placeholder,
        }
    }

    /// Next free identifier.
    ///
    /// The counter only collides with an existing window once a restored
    /// session has pushed it to the top of the range; then the lowest unused
    /// id is taken instead.
    fn issue_id(&mut self) -> WindowId {
        let id = self.next_id;
        if !self.store.contains(id) {
            self.next_id = id.saturating_add(1);
            return id;
        }

        let mut free: WindowId = 1;
        while self.store.contains(free) {
            free = free.saturating_add(1);
        }
        warn!("Window id counter exhausted, reusing free id {}", free);
        free
    }

    fn mount(&mut self, id: WindowId, app_type: AppType) {
        let mut provider = provider_for(app_type, &self.content_settings);
        provider.mount(id);
        self.providers.insert(id, provider);
    }

    fn unmount_all(&mut self) {
        for (_, mut provider) in self.providers.drain() {
            provider.unmount();
        }
    }

    fn abandon_gesture(&mut self, id: WindowId) {
        if self.gestures.remove(&id).is_some() {
            debug!("Abandoned gesture on window {}", id);
        }
    }

    fn abandon_if_minimized(&mut self, id: WindowId) {
        if self.store.get(id).map_or(true, |w| w.is_minimized) {
            self.abandon_gesture(id);
        }
    }
}
