mod classifier;
mod config;
mod error;
mod events;
mod journal;
mod notifier;
mod paths;
mod session;

use tokio::time::{timeout, Duration};

use crate::journal::{JournalOptions, LiveJournal, StartPosition};
use crate::notifier::{Notification, Notifier, PushoverNotifier};
use crate::session::SessionOutcome;

#[tokio::main]
async fn main() {
    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        eprintln!("Failed to create app data directory {}: {e}", app_dir.display());
        std::process::exit(1);
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    if !config_path.exists() {
        if let Err(e) = config::write_template(&config_path) {
            eprintln!("[config] Failed to write template: {e:#}");
            std::process::exit(1);
        }
        println!(
            "[config] Created {}. Fill in your Pushover credentials and run again.",
            config_path.display()
        );
        std::process::exit(1);
    }
    let config = match config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[config] Error: {e:#}");
            std::process::exit(1);
        }
    };
    if config.pushover.is_placeholder() {
        println!(
            "[config] Fill in the Pushover credentials at {} and run again.",
            config_path.display()
        );
        std::process::exit(1);
    }

    // ── Notifier + startup ping ───────────────────────────────────────────────
    let notifier = PushoverNotifier::new(
        config.pushover.token.clone(),
        config.pushover.user_key.clone(),
        config.pushover.device.clone(),
    );
    let startup = Notification::new("edwatch", "edwatch is running!");
    match timeout(Duration::from_secs(10), notifier.notify(&startup)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("[notify] Startup notification failed: {e}"),
        Err(_) => eprintln!("[notify] Startup notification timed out"),
    }

    // ── Journal source ────────────────────────────────────────────────────────
    let journal_dir = config
        .journal
        .dir
        .clone()
        .unwrap_or_else(paths::default_journal_dir);
    let mut journal = match LiveJournal::open(
        &journal_dir,
        JournalOptions { follow: true, position: StartPosition::End },
    ) {
        Ok(journal) => journal,
        Err(e) => {
            eprintln!("[journal] Failed to open {}: {e}", journal_dir.display());
            std::process::exit(1);
        }
    };

    println!(
        "edwatch-daemon v{} started — watching {}",
        env!("CARGO_PKG_VERSION"),
        journal_dir.display()
    );

    // Graceful shutdown on Ctrl+C: end the stream, letting the session
    // finish normally and release the source.
    {
        let handle = journal.shutdown_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("Shutting down");
                handle.shutdown();
            }
        });
    }

    // ── Session ───────────────────────────────────────────────────────────────
    match session::run(&mut journal, &notifier).await {
        SessionOutcome::Stopped => println!("Session ended"),
        SessionOutcome::Crashed => {
            eprintln!("Session crashed");
            std::process::exit(1);
        }
    }
}
