//! Live tailing of the game's journal directory.
//!
//! The game appends JSON lines to `Journal.*.log` files and starts a fresh
//! file for every play session. [`LiveJournal`] follows the newest file,
//! decoding each complete line into a [`JournalEvent`]. A directory watcher
//! wakes the reader on writes; a slow fallback ticker covers platforms where
//! in-place appends produce no watcher event.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::error::SourceError;
use crate::events::JournalEvent;

/// Fallback poll period when the directory watcher stays quiet.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Decoded events buffered between the reader task and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Where to position the reader inside the newest journal file at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Read the newest file from its first line.
    Start,
    /// Skip existing history; only lines appended after open are yielded.
    End,
}

/// Options for [`LiveJournal::open`].
#[derive(Debug, Clone, Copy)]
pub struct JournalOptions {
    /// Keep following the directory for appends and new journal files.
    /// When false the stream ends at the end of the newest existing file.
    pub follow: bool,
    pub position: StartPosition,
}

/// Pull-based cursor over journal events.
///
/// The session driver consumes this; tests script it with an in-memory
/// double.
pub trait EventSource {
    /// The next event, awaiting live appends. `None` once the stream is
    /// closed or exhausted.
    async fn next(&mut self) -> Option<Result<JournalEvent, SourceError>>;

    /// Releases the underlying resources. Idempotent.
    fn close(&mut self);
}

/// [`EventSource`] over the live journal directory.
pub struct LiveJournal {
    events: mpsc::Receiver<Result<JournalEvent, SourceError>>,
    stop: mpsc::Sender<()>,
    closed: bool,
}

/// Clonable handle that ends a [`LiveJournal`] stream from another task
/// (the Ctrl+C handler). The stream then ends normally.
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: mpsc::Sender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.stop.try_send(());
    }
}

impl LiveJournal {
    /// Opens the journal directory per `options`, spawning the reader task.
    ///
    /// Fails if the directory cannot be scanned, the watcher cannot be
    /// installed, or (without follow) there is no journal file to read.
    /// With `position: End` the end-of-file offset is captured here, before
    /// returning, so nothing appended after open can be missed.
    pub fn open(dir: &Path, options: JournalOptions) -> Result<Self, SourceError> {
        let newest = newest_journal_file(dir)?;
        if newest.is_none() && !options.follow {
            return Err(SourceError::NoJournalFiles { dir: dir.to_path_buf() });
        }

        let offset = match (&newest, options.position) {
            (Some(path), StartPosition::End) => std::fs::metadata(path)?.len(),
            _ => 0,
        };

        let tail = Tail {
            dir: dir.to_path_buf(),
            current: newest,
            offset,
            partial: Vec::new(),
        };

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        if options.follow {
            let (watch_tx, watch_rx) = mpsc::channel::<notify::Event>(16);
            let mut watcher = RecommendedWatcher::new(
                move |res: notify::Result<notify::Event>| {
                    if let Ok(event) = res {
                        let _ = watch_tx.blocking_send(event);
                    }
                },
                NotifyConfig::default(),
            )?;
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            tokio::spawn(follow_journal(tail, watcher, watch_rx, stop_rx, event_tx));
        } else {
            tokio::spawn(drain_journal(tail, event_tx));
        }

        Ok(Self {
            events: event_rx,
            stop: stop_tx,
            closed: false,
        })
    }

    /// Handle for ending the stream from outside the consuming task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            stop: self.stop.clone(),
        }
    }
}

impl EventSource for LiveJournal {
    async fn next(&mut self) -> Option<Result<JournalEvent, SourceError>> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    fn close(&mut self) {
        self.closed = true;
        // Unblock a reader parked on a full event channel; it sees the send
        // fail and exits.
        self.events.close();
        let _ = self.stop.try_send(());
    }
}

// ── Reader tasks ──────────────────────────────────────────────────────────────

/// Follow-mode reader. Owns the directory watcher; wakes on watcher events
/// or the fallback ticker and pushes newly appended events to the consumer
/// until stopped or the stream fails.
async fn follow_journal(
    mut tail: Tail,
    _watcher: RecommendedWatcher,
    mut watch_rx: mpsc::Receiver<notify::Event>,
    mut stop_rx: mpsc::Receiver<()>,
    event_tx: mpsc::Sender<Result<JournalEvent, SourceError>>,
) {
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if !pump(&mut tail, &event_tx).await {
            return;
        }
        tokio::select! {
            _ = stop_rx.recv() => return,
            _ = ticker.tick() => {}
            event = watch_rx.recv() => {
                // The watcher outlives this loop, so `None` cannot happen;
                // the event payload itself is irrelevant — any wake triggers
                // a re-read.
                let _ = event;
            }
        }
    }
}

/// Non-follow reader: everything currently in the newest file, then end of
/// stream.
async fn drain_journal(mut tail: Tail, event_tx: mpsc::Sender<Result<JournalEvent, SourceError>>) {
    pump(&mut tail, &event_tx).await;
}

/// Pushes every newly readable event to the consumer. Returns false when the
/// session is over: the consumer hung up or the stream hit a terminal error.
async fn pump(tail: &mut Tail, event_tx: &mpsc::Sender<Result<JournalEvent, SourceError>>) -> bool {
    let lines = match tail.poll_lines() {
        Ok(lines) => lines,
        Err(e) => {
            let _ = event_tx.send(Err(e)).await;
            return false;
        }
    };

    for line in lines {
        let decoded = serde_json::from_str::<JournalEvent>(&line).map_err(SourceError::from);
        let terminal = decoded.is_err();
        if event_tx.send(decoded).await.is_err() {
            return false;
        }
        if terminal {
            return false;
        }
    }
    true
}

// ── File cursor ───────────────────────────────────────────────────────────────

/// Cursor over the journal directory: which file is being read, how far, and
/// any incomplete trailing line.
struct Tail {
    dir: PathBuf,
    /// Newest journal file, if any exists yet.
    current: Option<PathBuf>,
    /// Offset of the next unread byte in `current`.
    offset: u64,
    /// Bytes of an incomplete final line, kept until its newline arrives.
    partial: Vec<u8>,
}

impl Tail {
    /// Reads every complete line appended since the last call, rolling over
    /// to a newer journal file when one has appeared.
    fn poll_lines(&mut self) -> Result<Vec<String>, SourceError> {
        let mut lines = Vec::new();

        let newest = newest_journal_file(&self.dir)?;
        let rolled = match (&self.current, &newest) {
            (Some(current), Some(new)) => current != new,
            (None, Some(_)) => true,
            _ => false,
        };

        if rolled {
            // Finish the file we were on before jumping to the new one.
            if self.current.is_some() {
                self.read_available(&mut lines)?;
            }
            self.current = newest;
            self.offset = 0;
            self.partial.clear();
        }

        self.read_available(&mut lines)?;
        Ok(lines)
    }

    /// Appends all newly complete lines of `current` to `lines`, advancing
    /// the offset.
    fn read_available(&mut self, lines: &mut Vec<String>) -> Result<(), SourceError> {
        let Some(path) = &self.current else {
            return Ok(());
        };

        let mut file = match File::open(path) {
            Ok(file) => file,
            // The file can disappear between the directory scan and the
            // open (log rotation); the next poll re-scans.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            // The file shrank under us; the game only appends, so someone
            // replaced it in place. Start over from the top.
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        self.offset += buf.len() as u64;
        self.partial.extend_from_slice(&buf);

        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.partial.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(())
    }
}

/// Newest `Journal.*.log` in `dir`. The game's timestamped file names sort
/// chronologically, so the lexicographically largest name is the newest.
fn newest_journal_file(dir: &Path) -> Result<Option<PathBuf>, SourceError> {
    let mut newest: Option<PathBuf> = None;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with("Journal.") && name.ends_with(".log")) {
            continue;
        }
        match &newest {
            Some(current) if current.file_name() >= path.file_name() => {}
            _ => newest = Some(path),
        }
    }
    Ok(newest)
}
