//! WebDesk CLI
//!
//! Command-line interface for controlling the WebDesk daemon.
//!
//! Commands are sent to the daemon via IPC (line-delimited JSON over TCP).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use webdesk_core::{
    AppType, ContentInput, DesktopView, PointerTarget, ResizeDirection, WindowId, WindowRecord,
};
use webdesk_ipc::{IpcCommand, IpcResponse, DEFAULT_ADDR, IPC_READ_TIMEOUT_SECS};

const IPC_TIMEOUT: Duration = Duration::from_secs(IPC_READ_TIMEOUT_SECS);

#[derive(Parser)]
#[command(name = "webdesk-cli")]
#[command(author, version, about = "Control the WebDesk virtual desktop")]
struct Cli {
    /// Daemon address
    #[arg(long, global = true, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new window (notepad, video or browser)
    Add {
        app: AppType,
    },
    /// Close a window
    Close {
        id: WindowId,
    },
    /// Minimize or restore a window, like a taskbar click
    Toggle {
        id: WindowId,
    },
    /// Minimize a window
    Minimize {
        id: WindowId,
    },
    /// Maximize a window, or restore it if already maximized
    Maximize {
        id: WindowId,
    },
    /// Raise a window above all others
    Focus {
        id: WindowId,
    },
    /// Rename a window
    Rename {
        id: WindowId,
        title: String,
    },
    /// Drive the application inside a window
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },
    /// Send pointer input
    Pointer {
        #[command(subcommand)]
        action: PointerAction,
    },
    /// Report the desktop size
    Bounds {
        width: i32,
        height: i32,
    },
    /// Save the session
    Save,
    /// Restore the saved session
    Load,
    /// Delete the saved session and close every window
    Clear,
    /// Query desktop state
    Query {
        #[command(subcommand)]
        what: QueryType,
    },
    /// Reload configuration
    Reload,
    /// Stop the daemon
    Stop,
}

#[derive(Subcommand)]
enum ContentAction {
    /// Replace the text of a notepad
    Text { id: WindowId, text: String },
    /// Type an address into a browser's address bar
    Address { id: WindowId, address: String },
    /// Load the address in a browser's bar
    Navigate { id: WindowId },
}

#[derive(Subcommand)]
enum PointerAction {
    /// Press on a window's header, a resize handle or its body
    Down {
        id: WindowId,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        /// Press a resize handle (n, s, e, w, ne, nw, se, sw) instead of the header
        #[arg(long, conflicts_with = "body")]
        handle: Option<ResizeDirection>,
        /// Press the window body instead of the header
        #[arg(long)]
        body: bool,
    },
    /// Move the pointer
    Move {
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    /// Release the pointer
    Up,
}

#[derive(Subcommand)]
enum QueryType {
    /// List every window record
    Windows,
    /// Show the render model
    View,
}

impl Commands {
    fn into_ipc(self) -> IpcCommand {
        match self {
            Commands::Add { app } => IpcCommand::AddWindow { app_type: app },
            Commands::Close { id } => IpcCommand::CloseWindow { id },
            Commands::Toggle { id } => IpcCommand::ToggleWindow { id },
            Commands::Minimize { id } => IpcCommand::MinimizeWindow { id },
            Commands::Maximize { id } => IpcCommand::MaximizeWindow { id },
            Commands::Focus { id } => IpcCommand::FocusWindow { id },
            Commands::Rename { id, title } => IpcCommand::RenameWindow { id, title },
            Commands::Content { action } => {
                let (id, input) = match action {
                    ContentAction::Text { id, text } => (id, ContentInput::Text { text }),
                    ContentAction::Address { id, address } => {
                        (id, ContentInput::Address { address })
                    }
                    ContentAction::Navigate { id } => (id, ContentInput::Navigate),
                };
                IpcCommand::ContentInput { id, input }
            }
            Commands::Pointer { action } => match action {
                PointerAction::Down {
                    id,
                    x,
                    y,
                    handle,
                    body,
                } => {
                    let target = match (handle, body) {
                        (Some(direction), _) => PointerTarget::Resize(direction),
                        (None, true) => PointerTarget::Body,
                        (None, false) => PointerTarget::Header,
                    };
                    IpcCommand::PointerDown { id, target, x, y }
                }
                PointerAction::Move { x, y } => IpcCommand::PointerMove { x, y },
                PointerAction::Up => IpcCommand::PointerUp,
            },
            Commands::Bounds { width, height } => IpcCommand::SetBounds { width, height },
            Commands::Save => IpcCommand::SaveSession,
            Commands::Load => IpcCommand::LoadSession,
            Commands::Clear => IpcCommand::ClearSession,
            Commands::Query { what } => match what {
                QueryType::Windows => IpcCommand::QueryWindows,
                QueryType::View => IpcCommand::QueryView,
            },
            Commands::Reload => IpcCommand::Reload,
            Commands::Stop => IpcCommand::Stop,
        }
    }
}

/// Send one command and wait for its response.
async fn send_command(addr: &str, cmd: &IpcCommand) -> Result<IpcResponse> {
    let stream = tokio::time::timeout(IPC_TIMEOUT, TcpStream::connect(addr))
        .await
        .with_context(|| format!("Timed out connecting to daemon at {}", addr))?
        .with_context(|| format!("Failed to connect to daemon at {}. Is webdesk running?", addr))?;

    let (reader, mut writer) = stream.into_split();
    let request = serde_json::to_string(cmd).context("Failed to serialize command")? + "\n";
    writer
        .write_all(request.as_bytes())
        .await
        .context("Failed to send command")?;

    let mut line = String::new();
    let mut reader = BufReader::new(reader);
    let bytes_read = tokio::time::timeout(IPC_TIMEOUT, reader.read_line(&mut line))
        .await
        .context("Timed out waiting for daemon response")?
        .context("Failed to read daemon response")?;
    if bytes_read == 0 {
        bail!("Daemon closed the connection without responding");
    }

    serde_json::from_str(line.trim()).context("Failed to parse daemon response")
}

fn format_windows(windows: &[WindowRecord]) -> String {
    if windows.is_empty() {
        return "No windows.".to_string();
    }

    let mut out = String::new();
    for w in windows {
        let mut flags = Vec::new();
        if w.is_minimized {
            flags.push("minimized");
        }
        if w.is_maximized {
            flags.push("maximized");
        }
        out.push_str(&format!(
            "{:>4}  {:<8} {:>5},{:<5} {:>5}x{:<5} z={:<5} {}{}\n",
            w.id,
            w.app_type.as_str(),
            w.pos.x,
            w.pos.y,
            w.size.width,
            w.size.height,
            w.z_index,
            w.title,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        ));
    }
    out
}

fn format_view(view: &DesktopView) -> String {
    let mut out = String::from("Desktop (back to front):\n");
    if view.windows.is_empty() {
        out.push_str("  (nothing visible)\n");
    }
    for w in &view.windows {
        out.push_str(&format!(
            "  {:>4}  {} at {},{} {}x{} z={}{}{}\n",
            w.id,
            w.title,
            w.rect.x,
            w.rect.y,
            w.rect.width,
            w.rect.height,
            w.z_index,
            if w.is_maximized { " [maximized]" } else { "" },
            if w.interacting { " [interacting]" } else { "" },
        ));
    }

    out.push_str("Taskbar:\n");
    match &view.placeholder {
        Some(hint) => out.push_str(&format!("  {}\n", hint)),
        None => {
            for entry in &view.taskbar {
                out.push_str(&format!(
                    "  [{}] {}{}\n",
                    entry.id,
                    entry.title,
                    if entry.minimized { " (minimized)" } else { "" }
                ));
            }
        }
    }
    out
}

fn print_response(response: IpcResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        if let IpcResponse::Error { message } = response {
            bail!("{}", message);
        }
        return Ok(());
    }

    match response {
        IpcResponse::Ok => {}
        IpcResponse::Error { message } => bail!("{}", message),
        IpcResponse::WindowAdded { id } => println!("Added window {}", id),
        IpcResponse::WindowList { windows } => print!("{}", format_windows(&windows)),
        IpcResponse::View { view } => print!("{}", format_view(&view)),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.into_ipc();
    let response = send_command(&cli.addr, &cmd).await?;
    print_response(response, cli.json)
}
