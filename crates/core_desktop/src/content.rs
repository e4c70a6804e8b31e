//! Embedded content providers.
//!
//! Each window hosts one opaque provider chosen by its [`AppType`]. The engine
//! mounts and unmounts providers and forwards [`ContentInput`] to them;
//! whatever state they keep is their own.

use crate::{AppType, WindowId};
use serde::{Deserialize, Serialize};

/// Defaults handed to newly created providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSettings {
    /// Page a new browser window opens.
    pub browser_url: String,
    /// Media a new video window plays.
    pub video_url: String,
    /// Hint shown in an empty notepad.
    pub notepad_placeholder: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            browser_url: "https://www.nabraj.com".to_string(),
            video_url: "https://www.nabraj.com/static/sample-video.mov".to_string(),
            notepad_placeholder: "Start typing...".to_string(),
        }
    }
}

/// What a provider presents inside its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentView {
    /// Editable text area.
    Text { text: String, placeholder: String },
    /// Media player with controls.
    Media { source: String, mime: String },
    /// Address bar plus the page currently shown.
    Page { address: String, page: String },
}

/// User input addressed to the content of one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentInput {
    /// Replace the text of a notepad.
    Text { text: String },
    /// Type into the address bar of a browser.
    Address { address: String },
    /// Load the address currently in the browser's bar.
    Navigate,
}

/// An application hosted inside a window.
pub trait ContentProvider: Send {
    /// The application this provider implements.
    fn app_type(&self) -> AppType;

    /// Called once when the hosting window appears on the desktop.
    fn mount(&mut self, window_id: WindowId);

    /// Called once when the hosting window goes away.
    fn unmount(&mut self);

    /// Whether the provider is currently mounted.
    fn is_mounted(&self) -> bool;

    /// Describe the content for rendering.
    fn view(&self) -> ContentView;

    /// Apply user input. Returns false if this provider does not take it.
    fn input(&mut self, _input: ContentInput) -> bool {
        false
    }
}

/// Create the provider for `app_type`.
pub fn provider_for(app_type: AppType, settings: &ContentSettings) -> Box<dyn ContentProvider> {
    match app_type {
        AppType::Notepad => Box::new(Notepad::new(&settings.notepad_placeholder)),
        AppType::Video => Box::new(VideoPlayer::new(&settings.video_url)),
        AppType::Browser => Box::new(Browser::new(&settings.browser_url)),
    }
}

/// Plain text editor.
#[derive(Debug, Clone)]
pub struct Notepad {
    text: String,
    placeholder: String,
    mounted_in: Option<WindowId>,
}

impl Notepad {
    pub fn new(placeholder: &str) -> Self {
        Self {
            text: String::new(),
            placeholder: placeholder.to_string(),
            mounted_in: None,
        }
    }

    /// Replace the buffer contents.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl ContentProvider for Notepad {
    fn app_type(&self) -> AppType {
        AppType::Notepad
    }

    fn mount(&mut self, window_id: WindowId) {
        self.mounted_in = Some(window_id);
    }

    fn unmount(&mut self) {
        // The buffer lives only as long as the window
        self.text.clear();
        self.mounted_in = None;
    }

    fn is_mounted(&self) -> bool {
        self.mounted_in.is_some()
    }

    fn view(&self) -> ContentView {
        ContentView::Text {
            text: self.text.clone(),
            placeholder: self.placeholder.clone(),
        }
    }

    fn input(&mut self, input: ContentInput) -> bool {
        match input {
            ContentInput::Text { text } => {
                self.set_text(text);
                true
            }
            _ => false,
        }
    }
}

/// Video player for a single media source.
#[derive(Debug, Clone)]
pub struct VideoPlayer {
    source: String,
    mounted_in: Option<WindowId>,
}

impl VideoPlayer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            mounted_in: None,
        }
    }
}

impl ContentProvider for VideoPlayer {
    fn app_type(&self) -> AppType {
        AppType::Video
    }

    fn mount(&mut self, window_id: WindowId) {
        self.mounted_in = Some(window_id);
    }

    fn unmount(&mut self) {
        self.mounted_in = None;
    }

    fn is_mounted(&self) -> bool {
        self.mounted_in.is_some()
    }

    fn view(&self) -> ContentView {
        ContentView::Media {
            source: self.source.clone(),
            mime: "video/mp4".to_string(),
        }
    }
}

/// Embedded page viewer with an address bar.
///
/// Typing into the address bar does not change the page until
/// [`Browser::navigate`] commits it.
#[derive(Debug, Clone)]
pub struct Browser {
    address: String,
    page: String,
    mounted_in: Option<WindowId>,
}

impl Browser {
    pub fn new(home: &str) -> Self {
        Self {
            address: home.to_string(),
            page: home.to_string(),
            mounted_in: None,
        }
    }

    /// Edit the address bar.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Load the address currently in the bar.
    pub fn navigate(&mut self) {
        self.page = self.address.clone();
    }
}

impl ContentProvider for Browser {
    fn app_type(&self) -> AppType {
        AppType::Browser
    }

    fn mount(&mut self, window_id: WindowId) {
        self.mounted_in = Some(window_id);
    }

    fn unmount(&mut self) {
        self.mounted_in = None;
    }

    fn is_mounted(&self) -> bool {
        self.mounted_in.is_some()
    }

    fn view(&self) -> ContentView {
        ContentView::Page {
            address: self.address.clone(),
            page: self.page.clone(),
        }
    }

    fn input(&mut self, input: ContentInput) -> bool {
        match input {
            ContentInput::Address { address } => self.set_address(address),
            ContentInput::Navigate => self.navigate(),
            ContentInput::Text { .. } => return false,
        }
        true
    }
}
