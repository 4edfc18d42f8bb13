//! Workbook watching for automatic data reload.
//!
//! Editors and sync tools tend to emit bursts of events for a single save,
//! so changes are debounced before the reload callback runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// How often a deferred reload is re-checked.
const PENDING_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for workbook watching and reload.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Minimum time between reloads (default: 2 seconds).
    pub debounce_duration: Duration,
    /// Number of reload attempts (default: 3).
    pub retry_attempts: u32,
    /// Delay between reload attempts (default: 500ms).
    pub retry_delay: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_secs(2),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Errors that can occur during workbook watching.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    Notify(#[from] notify::Error),

    #[error("Workbook does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Event channel closed unexpectedly")]
    ChannelClosed,
}

/// Collapses bursts of change events into single reloads.
///
/// An event that arrives inside the quiet period is remembered as pending
/// and fired once the period has elapsed.
struct Debouncer {
    last_event: Option<Instant>,
    quiet_period: Duration,
    pending: bool,
}

impl Debouncer {
    fn new(quiet_period: Duration) -> Self {
        Self {
            last_event: None,
            quiet_period,
            pending: false,
        }
    }

    fn quiet_since(&self, now: Instant) -> bool {
        self.last_event
            .is_none_or(|t| now.duration_since(t) >= self.quiet_period)
    }

    /// Records a change event. Returns true if the reload should run now.
    fn on_event(&mut self, now: Instant) -> bool {
        if self.quiet_since(now) {
            self.last_event = Some(now);
            self.pending = false;
            true
        } else {
            // Restart the quiet period and defer
            self.last_event = Some(now);
            self.pending = true;
            false
        }
    }

    /// Returns true if a deferred reload is now due.
    fn poll_pending(&mut self, now: Instant) -> bool {
        if self.pending && self.quiet_since(now) {
            self.last_event = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }
}

/// Returns true for event kinds that can change workbook contents.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Watches the workbook and calls `on_change` after debounced modifications.
///
/// The parent directory is watched so that editors replacing the file on
/// save are still noticed. Runs until the event channel closes.
pub async fn watch_workbook<F>(
    path: impl AsRef<Path>,
    config: WatcherConfig,
    on_change: F,
) -> Result<(), WatcherError>
where
    F: Fn() + Send + Sync + 'static,
{
    let path = path.as_ref();
    let workbook = path
        .canonicalize()
        .map_err(|_| WatcherError::PathNotFound(path.to_path_buf()))?;
    let watch_dir = workbook.parent().unwrap_or(&workbook).to_path_buf();
    let file_name = workbook.file_name().map(|s| s.to_owned());

    log::info!("Watching workbook: {}", workbook.display());
    log::debug!("Watch directory: {}", watch_dir.display());

    let (tx, mut rx) = mpsc::channel::<Event>(100);
    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| {
            if let Ok(event) = result {
                // Drop the event if the channel is full; a reload is coming anyway
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    let on_change = Arc::new(on_change);
    let debouncer = Arc::new(Mutex::new(Debouncer::new(config.debounce_duration)));

    let poll_debouncer = debouncer.clone();
    let poll_on_change = on_change.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(PENDING_POLL_INTERVAL).await;
            let due = poll_debouncer.lock().await.poll_pending(Instant::now());
            if due {
                log::info!("Deferred workbook change, reloading");
                poll_on_change();
            }
        }
    });

    while let Some(event) = rx.recv().await {
        let touches_workbook = event.paths.iter().any(|p| match &file_name {
            Some(name) => p.file_name() == Some(name.as_os_str()),
            None => p == &workbook,
        });

        if !touches_workbook || !is_content_change(&event.kind) {
            continue;
        }

        log::debug!("Workbook event: {:?}", event.kind);

        let fire = debouncer.lock().await.on_event(Instant::now());
        if fire {
            log::info!("Workbook changed, reloading");
            on_change();
        }
    }

    Err(WatcherError::ChannelClosed)
}
