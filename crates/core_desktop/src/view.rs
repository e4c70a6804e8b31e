//! Render model handed to the host surface.

use crate::content::ContentView;
use crate::{AppType, Rect, WindowId};
use serde::{Deserialize, Serialize};

/// Taskbar text shown while the desktop has no windows.
pub const EMPTY_TASKBAR_HINT: &str = "Click on + to add a window.";

/// One window as it should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowView {
    pub id: WindowId,
    pub title: String,
    pub app_type: AppType,
    pub rect: Rect,
    pub z_index: u32,
    pub is_maximized: bool,
    /// Whether a drag or resize is in progress on this window.
    pub interacting: bool,
    /// Hosted content, `None` if no provider is mounted.
    pub content: Option<ContentView>,
}

/// One taskbar button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskbarEntry {
    pub id: WindowId,
    pub title: String,
    pub minimized: bool,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopView {
    /// Visible windows, back to front.
    pub windows: Vec<WindowView>,
    /// Taskbar entries in creation order.
    pub taskbar: Vec<TaskbarEntry>,
    /// Hint shown in the taskbar when it is empty.
    pub placeholder: Option<String>,
}

impl DesktopView {
    /// The window drawn on top, if any is visible.
    pub fn front(&self) -> Option<&WindowView> {
        self.windows.last()
    }
}
