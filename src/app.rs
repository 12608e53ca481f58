// Application wiring - real platform collaborators around the engine
//
// Startup: logging → settings → phrase store → engine → phrase registration.
// The first Ctrl+C drains queued expansions and exits; a second one also
// cuts off any expansion still typing.

use crate::clipboard::ArboardClipboard;
use crate::engine::Engine;
use crate::input::{HotkeyError, InputSuppressor, RdevInputBackend};
use crate::keyboard::EnigoKeyboard;
use crate::phrase::{Phrase, PhraseStore, PhraseStoreError};
use crate::settings::{self, Settings, SettingsError};
use crate::shutdown;
use crate::window::platform_window_service;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Phrases(#[from] PhraseStoreError),
    #[error("Failed to register reserved hotkeys: {0}")]
    Hotkey(#[from] HotkeyError),
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn init_logging() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    if let Err(e) = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
    {
        eprintln!("Logger already initialized: {}", e);
    }
}

/// Run until Ctrl+C
pub fn run() -> Result<(), AppError> {
    init_logging();
    crate::info!("Starting xpander...");

    let settings_path = settings::default_path()?;
    let settings = Settings::load_or_default(&settings_path)?;
    crate::debug!("Settings loaded from {:?}", settings_path);

    let mut store = PhraseStore::new(settings.phrase_dir()?);
    let loaded = store.load()?;
    crate::info!("Loaded {} phrase(s) from {:?}", loaded, store.dir());

    let suppressor = InputSuppressor::new();
    let backend = Arc::new(RdevInputBackend::new(suppressor.clone()));
    let keyboard = Arc::new(EnigoKeyboard::new(settings.typing_delay()));

    let mut builder = Engine::builder(backend, keyboard, Arc::new(ArboardClipboard::new()))
        .with_suppressor(suppressor)
        .with_settings(settings)
        .on_show_editor(Arc::new(|| {
            crate::info!("No editor attached; edit the phrase files directly");
        }));
    match platform_window_service() {
        Some(service) => builder = builder.with_window_service(service),
        None => crate::info!("No window service on this platform; window filters always match"),
    }
    let engine = builder.build()?;

    let mut phrases: Vec<Phrase> = store.list().into_iter().cloned().collect();
    let mut registered = 0;
    for phrase in &mut phrases {
        match engine.register_phrase(phrase) {
            Ok(()) => registered += 1,
            Err(e) => crate::warn!("Skipping phrase '{}': {}", phrase.name, e),
        }
    }
    crate::info!("Registered {} of {} phrase(s)", registered, phrases.len());

    let (stop_tx, stop_rx) = mpsc::channel();
    let requested = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if requested.swap(true, Ordering::SeqCst) {
            shutdown::signal_shutdown();
        }
        let _ = stop_tx.send(());
    })?;

    crate::info!("Ready. Press Ctrl+C to quit.");
    let _ = stop_rx.recv();

    crate::info!("Shutting down...");
    for phrase in &mut phrases {
        engine.unregister_phrase(phrase);
    }
    engine.shutdown();
    Ok(())
}
