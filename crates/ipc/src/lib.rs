//! WebDesk IPC Protocol
//!
//! Shared types for daemon-CLI communication over a loopback TCP socket.
//! Each message is one JSON object followed by a newline.

use serde::{Deserialize, Serialize};
use webdesk_core::{AppType, ContentInput, DesktopView, PointerTarget, WindowId, WindowRecord};

/// Address the daemon listens on unless configured otherwise.
pub const DEFAULT_ADDR: &str = "127.0.0.1:47820";

/// Maximum size of a single IPC message in bytes.
pub const MAX_IPC_MESSAGE_SIZE: usize = 64 * 1024;

/// Seconds a client may take to send its command.
pub const IPC_READ_TIMEOUT_SECS: u64 = 5;

/// Commands that can be sent from the CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcCommand {
    /// Open a new window from the toolbar menu.
    AddWindow { app_type: AppType },
    /// Close a window.
    CloseWindow { id: WindowId },
    /// Minimize or restore a window, as a taskbar click does.
    ToggleWindow { id: WindowId },
    /// Minimize a window from its chrome.
    MinimizeWindow { id: WindowId },
    /// Maximize a window, or restore it if already maximized.
    MaximizeWindow { id: WindowId },
    /// Raise a window above all others.
    FocusWindow { id: WindowId },
    /// Change a window's title.
    RenameWindow { id: WindowId, title: String },
    /// Forward input to the application hosted in a window.
    ContentInput { id: WindowId, input: ContentInput },

    /// Pointer pressed on part of a window.
    PointerDown {
        id: WindowId,
        target: PointerTarget,
        x: i32,
        y: i32,
    },
    /// Pointer moved anywhere on the desktop.
    PointerMove { x: i32, y: i32 },
    /// Pointer released anywhere on the desktop.
    PointerUp,

    /// Report the measured desktop size.
    SetBounds { width: i32, height: i32 },

    /// Write the window collection to the session slot.
    SaveSession,
    /// Replace the window collection with the saved session.
    LoadSession,
    /// Delete the saved session and close every window.
    ClearSession,

    /// List every window record.
    QueryWindows,
    /// Fetch the render model.
    QueryView,

    /// Reload configuration from file.
    Reload,
    /// Stop the daemon.
    Stop,
}

/// Responses from the daemon to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully.
    Ok,
    /// Command failed with an error.
    Error {
        /// Error message describing what went wrong.
        message: String,
    },
    /// A window was opened.
    WindowAdded { id: WindowId },
    /// Window records in creation order.
    WindowList { windows: Vec<WindowRecord> },
    /// Current render model.
    View { view: DesktopView },
}

impl IpcResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Check whether the response reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, IpcResponse::Error { .. })
    }
}
