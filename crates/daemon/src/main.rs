//! WebDesk Daemon
//!
//! Host process for the WebDesk window engine.
//!
//! Responsibilities:
//! - Own the desktop and its window collection
//! - Handle IPC commands from the CLI
//! - Persist the session to disk
//! - Reload configuration on request

mod config;
mod storage;

use anyhow::{Context, Result};
use config::Config;
use std::net::SocketAddr;
use std::time::Duration;
use storage::FileSlot;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use webdesk_core::{Desktop, DesktopBounds, DesktopError, Point, SessionSlot, WindowId};
use webdesk_ipc::{IpcCommand, IpcResponse, IPC_READ_TIMEOUT_SECS, MAX_IPC_MESSAGE_SIZE};

/// Events that the daemon event loop processes.
enum DaemonEvent {
    /// An IPC command from a CLI client.
    IpcCommand {
        cmd: IpcCommand,
        responder: oneshot::Sender<IpcResponse>,
    },
    /// Shutdown signal.
    Shutdown,
}

/// IPC read timeout - clients must send within this period.
const IPC_READ_TIMEOUT: Duration = Duration::from_secs(IPC_READ_TIMEOUT_SECS);

/// Returned when a response cannot be serialized.
const SERIALIZATION_ERROR: &str =
    "{\"status\":\"error\",\"message\":\"Internal serialization error\"}\n";

/// Application state.
struct AppState {
    /// The window engine.
    desktop: Desktop,
    /// User configuration.
    config: Config,
    /// Daemon start time for uptime reporting.
    start_time: std::time::Instant,
}

impl AppState {
    /// Create new state persisting sessions under the configured directory.
    fn new_with_config(config: Config) -> Self {
        let slot = FileSlot::new(config.session_dir());
        info!("Session files in {}", slot.dir().display());
        Self::with_slot(config, Box::new(slot))
    }

    /// Create new state persisting sessions into `slot`.
    fn with_slot(config: Config, slot: Box<dyn SessionSlot>) -> Self {
        let mut desktop = Desktop::new(config.desktop_layout(), slot)
            .with_session_key(config.session.storage_key.clone())
            .with_content_settings(config.content_settings());
        if let Some(bounds) = config.initial_bounds() {
            desktop.set_bounds(bounds);
        }

        Self {
            desktop,
            config,
            start_time: std::time::Instant::now(),
        }
    }

    fn apply_config(&mut self, config: Config) {
        self.desktop.set_layout(config.desktop_layout());
        self.desktop.set_content_settings(config.content_settings());
        self.desktop
            .set_session_key(config.session.storage_key.clone());
        if self.desktop.bounds().is_none() {
            if let Some(bounds) = config.initial_bounds() {
                self.desktop.set_bounds(bounds);
            }
        }
        if config.session.directory != self.config.session.directory {
            warn!("session.directory changed; restart the daemon to use it");
        }
        if config.server.address != self.config.server.address {
            warn!("server.address changed; restart the daemon to use it");
        }
        self.config = config;
        info!(
            "Configuration applied to desktop with {} windows",
            self.desktop.window_count()
        );
    }

    /// Reject commands aimed at a window that does not exist.
    fn require_window(&self, id: WindowId) -> Result<(), DesktopError> {
        match self.desktop.window(id) {
            Some(_) => Ok(()),
            None => Err(DesktopError::WindowNotFound(id)),
        }
    }

    /// Handle an IPC command and return a response.
    fn handle_command(&mut self, cmd: IpcCommand) -> IpcResponse {
        match cmd {
            IpcCommand::AddWindow { app_type } => {
                let id = self.desktop.add_window(app_type);
                IpcResponse::WindowAdded { id }
            }
            IpcCommand::CloseWindow { id } => {
                if self.desktop.close_window(id) {
                    IpcResponse::Ok
                } else {
                    IpcResponse::error(DesktopError::WindowNotFound(id).to_string())
                }
            }
            IpcCommand::ToggleWindow { id } => match self.require_window(id) {
                Ok(()) => {
                    self.desktop.toggle_window(id);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(e.to_string()),
            },
            IpcCommand::MinimizeWindow { id } => match self.require_window(id) {
                Ok(()) => {
                    self.desktop.minimize_window(id);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(e.to_string()),
            },
            IpcCommand::MaximizeWindow { id } => {
                match self
                    .require_window(id)
                    .and_then(|()| self.desktop.maximize_window(id))
                {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::FocusWindow { id } => match self.require_window(id) {
                Ok(()) => {
                    self.desktop.focus_window(id);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(e.to_string()),
            },
            IpcCommand::RenameWindow { id, title } => match self.require_window(id) {
                Ok(()) => {
                    self.desktop.rename_window(id, title);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(e.to_string()),
            },
            IpcCommand::ContentInput { id, input } => {
                match self.desktop.content_input(id, input) {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::PointerDown { id, target, x, y } => {
                match self.desktop.pointer_down(id, target, Point::new(x, y)) {
                    Ok(()) => IpcResponse::Ok,
                    Err(e) => IpcResponse::error(e.to_string()),
                }
            }
            IpcCommand::PointerMove { x, y } => {
                let moved = self.desktop.pointer_move(Point::new(x, y));
                debug!("Pointer move to ({}, {}) updated {} windows", x, y, moved);
                IpcResponse::Ok
            }
            IpcCommand::PointerUp => {
                self.desktop.pointer_up();
                IpcResponse::Ok
            }
            IpcCommand::SetBounds { width, height } => {
                let layout = self.desktop.layout();
                if width <= 0 || height <= layout.toolbar_height + layout.taskbar_height {
                    return IpcResponse::error(format!(
                        "Desktop {}x{} leaves no usable area",
                        width, height
                    ));
                }
                self.desktop.set_bounds(DesktopBounds::new(width, height));
                IpcResponse::Ok
            }
            IpcCommand::SaveSession => {
                if self.desktop.save_session() {
                    IpcResponse::Ok
                } else {
                    IpcResponse::error("Failed to save session")
                }
            }
            IpcCommand::LoadSession => {
                self.desktop.load_session();
                IpcResponse::WindowList {
                    windows: self.desktop.windows().to_vec(),
                }
            }
            IpcCommand::ClearSession => {
                self.desktop.clear_session();
                IpcResponse::Ok
            }
            IpcCommand::QueryWindows => IpcResponse::WindowList {
                windows: self.desktop.windows().to_vec(),
            },
            IpcCommand::QueryView => IpcResponse::View {
                view: self.desktop.render(),
            },
            IpcCommand::Reload => match Config::load() {
                Ok(mut new_config) => {
                    for w in new_config.validate() {
                        warn!("Config: {} - {}", w.field, w.message);
                    }
                    self.apply_config(new_config);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(format!("Failed to reload config: {}", e)),
            },
            IpcCommand::Stop => {
                // This is handled specially in the event loop
                IpcResponse::Ok
            }
        }
    }
}

/// Map a configured log level to a tracing level.
fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // default fallback for invalid values
    }
}

/// Accept IPC clients forever, one task per connection.
async fn run_ipc_server(listener: TcpListener, event_tx: mpsc::Sender<DaemonEvent>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept client connection: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        debug!("Client connected from {}", peer);

        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, event_tx).await {
                warn!("Client handler error: {}", e);
            }
        });
    }
}

/// Handle a single client connection.
async fn handle_client<S>(stream: S, event_tx: mpsc::Sender<DaemonEvent>) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let limited_reader = reader.take(MAX_IPC_MESSAGE_SIZE as u64);
    let mut reader = BufReader::new(limited_reader);
    let mut line = String::new();

    // Read command (single line of JSON) with timeout and size bound
    let read_result = tokio::time::timeout(IPC_READ_TIMEOUT, reader.read_line(&mut line)).await;
    let bytes_read = match read_result {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            // Timeout: client did not send in time, silently close
            return Ok(());
        }
    };
    if bytes_read == 0 {
        return Ok(()); // Client disconnected
    }

    let line = line.trim();
    debug!("Received command: {}", line);

    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            let response = IpcResponse::error(format!("Invalid command: {}", e));
            return write_response(&mut writer, &response).await;
        }
    };

    let is_stop = matches!(cmd, IpcCommand::Stop);

    let (resp_tx, resp_rx) = oneshot::channel();
    if event_tx
        .send(DaemonEvent::IpcCommand {
            cmd,
            responder: resp_tx,
        })
        .await
        .is_err()
    {
        let response = IpcResponse::error("Daemon is shutting down");
        return write_response(&mut writer, &response).await;
    }

    let response = match resp_rx.await {
        Ok(resp) => resp,
        Err(_) => IpcResponse::error("Failed to get response from daemon"),
    };
    write_response(&mut writer, &response).await?;

    // If this was a stop command, signal shutdown
    if is_stop {
        let _ = event_tx.send(DaemonEvent::Shutdown).await;
    }

    Ok(())
}

/// Write one response line.
async fn write_response<W>(writer: &mut W, response: &IpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response_json = match serde_json::to_string(response) {
        Ok(json) => json + "\n",
        Err(e) => {
            warn!("Failed to serialize IPC response: {}", e);
            SERIALIZATION_ERROR.to_string()
        }
    };
    writer.write_all(response_json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (needed for log level)
    let mut config = Config::load().unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {}. Using defaults.", e);
        Config::default()
    });

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_log_level(&config.behavior.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate and clamp config values
    for w in &config.validate() {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("WebDesk daemon starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .with_context(|| format!("Invalid server address: {}", config.server.address))?;
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind IPC server to {}: {}", addr, e);
            error!("Is another webdesk daemon already running?");
            return Err(e).context("Failed to start IPC server");
        }
    };

    info!(
        "Configuration loaded: toolbar={}, taskbar={}, snap_threshold={}, session_key={}, log_level={}",
        config.layout.toolbar_height,
        config.layout.taskbar_height,
        config.layout.snap_threshold,
        config.session.storage_key,
        config.behavior.log_level
    );

    let mut state = AppState::new_with_config(config);

    if state.config.session.restore_on_start {
        let restored = state.desktop.load_session();
        info!("Restored {} windows from previous session", restored);
    }

    // Create event channel
    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(100);

    // Spawn IPC server
    let ipc_tx = event_tx.clone();
    tokio::spawn(async move {
        run_ipc_server(listener, ipc_tx).await;
    });

    info!("IPC server listening on {}", addr);

    // Install Ctrl+C handler so terminal kill triggers graceful shutdown
    {
        let shutdown_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Ctrl+C received, initiating shutdown...");
                let _ = shutdown_tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }

    info!("Ready. Use webdesk-cli to send commands.");

    while let Some(event) = event_rx.recv().await {
        match event {
            DaemonEvent::IpcCommand { cmd, responder } => {
                let response = state.handle_command(cmd);
                if responder.send(response).is_err() {
                    debug!("IPC client went away before the response was sent");
                }
            }
            DaemonEvent::Shutdown => {
                info!("Shutdown signal received");
                if state.config.session.save_on_exit && !state.desktop.save_session() {
                    warn!("Failed to save session on exit");
                }
                break;
            }
        }
    }

    info!(
        "WebDesk daemon shutting down after {}s.",
        state.start_time.elapsed().as_secs()
    );
    Ok(())
}
