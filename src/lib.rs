pub mod chat;
pub mod config;
pub mod dispatch;
pub mod geo;
pub mod history;
pub mod intent;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use config::HistoryConfig;
use history::{MemoryHistoryStore, RouteHistory, SqliteHistoryStore};

/// Return the platform-standard data directory for Voice Router.
///
/// - macOS: `~/Library/Application Support/com.voice-router.app/`
/// - Windows: `{FOLDERID_RoamingAppData}\com.voice-router.app\`
/// - Linux: `$XDG_DATA_HOME/com.voice-router.app/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.voice-router/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("com.voice-router.app");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voice-router")
}

/// Initialize the tracing subscriber, writing structured logs to the data
/// directory. Returns the log file path.
///
/// On each startup:
/// 1. Rotates existing logs (router.log → router.log.1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh router.log with a line-flushing writer.
/// 3. Logs a startup banner with the data directory path.
pub fn init_tracing() -> io::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = data_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("router.log");
    rotate_log_file(&log_path, 3);

    let log_file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voice_router=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %log_dir.display(),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== Voice Router starting ==="
    );

    Ok(log_path)
}

/// `router.log.{n}` next to `base`.
fn rotated_path(base: &Path, n: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift `router.log` to `.1`, `.1` to `.2` and so on, dropping whatever
/// would land past `.{keep}`. Gaps in the chain are fine.
fn rotate_log_file(base: &Path, keep: u32) {
    let _ = std::fs::remove_file(rotated_path(base, keep));
    for n in (1..keep).rev() {
        let _ = std::fs::rename(rotated_path(base, n), rotated_path(base, n + 1));
    }
    if base.exists() {
        let _ = std::fs::rename(base, rotated_path(base, 1));
    }
}

/// Log sink that flushes after every write, so each line reaches disk even
/// if the process dies mid-session.
#[derive(Clone)]
struct FlushingWriter(Arc<Mutex<File>>);

impl FlushingWriter {
    fn new(file: File) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .0
            .lock()
            .map_err(|e| io::Error::other(format!("log file lock poisoned: {e}")))?;
        f(&mut *file)
    }
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| {
            let n = file.write(buf)?;
            file.flush()?;
            Ok(n)
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Resolve the history database path: the configured one (with `~`
/// expanded) or `history.db` in the data directory.
pub fn resolve_db_path(config: &HistoryConfig) -> String {
    if let Some(path) = &config.db_path {
        return config::expand_tilde(path);
    }
    let dir = data_dir();
    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }
    dir.join("history.db").to_string_lossy().into_owned()
}

/// Open the route history on SQLite, or in memory if the database cannot
/// be opened (the session still works, nothing is persisted).
pub fn open_history(config: &HistoryConfig) -> RouteHistory {
    let db_path = resolve_db_path(config);
    match SqliteHistoryStore::open(&db_path) {
        Ok(store) => {
            tracing::info!(db_path = %db_path, "history database initialized");
            RouteHistory::open(Box::new(store), config.capacity)
        }
        Err(e) => {
            tracing::warn!(
                db_path = %db_path,
                error = %e,
                "cannot open history database, keeping history in memory"
            );
            RouteHistory::open(Box::new(MemoryHistoryStore::new()), config.capacity)
        }
    }
}
