// Tests for Engine
// Test cases:
// - Hotstring trigger erases and types through the worker
// - Cancelled fill-in leaves no trace
// - Pause state (API and reserved hotkey) drops triggers
// - Window filter gates expansion
// - Tab cycles caret stops; passive backends erase the leaked tab
// - Reload re-registers reserved hotkeys
// - Update re-registers triggers; embedding reads registered phrases
#![cfg_attr(coverage_nightly, coverage(off))]

use super::*;
use crate::keyboard::KeyDirection;
use crate::phrase::Modifier;
use crate::testing::{FixedWindow, Injected, MemoryClipboard, MockInputBackend, RecordingKeyboard, ScriptedForm};
use chrono::TimeZone;
use std::sync::atomic::AtomicUsize;
use std::time::{Duration, Instant};

struct Harness {
    backend: Arc<MockInputBackend>,
    keyboard: Arc<RecordingKeyboard>,
    engine: Engine,
}

fn quiet_settings() -> Settings {
    Settings {
        key_delay_ms: 0,
        paste_settle_ms: 0,
        ..Settings::default()
    }
}

fn harness_with(backend: Arc<MockInputBackend>, configure: impl FnOnce(EngineBuilder) -> EngineBuilder) -> Harness {
    let keyboard = RecordingKeyboard::new();
    let builder = Engine::builder(backend.clone(), keyboard.clone(), MemoryClipboard::new(""))
        .with_settings(quiet_settings());
    let engine = configure(builder).build().unwrap();
    Harness {
        backend,
        keyboard,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(MockInputBackend::new(), |b| b)
}

/// Poll until `condition` holds or two seconds pass
fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn tab_handle(backend: &MockInputBackend) -> EventHandle {
    backend.hotkey_handle(&Hotkey::bare(Key::Tab)).unwrap()
}

#[test]
fn test_hotstring_expands_through_worker() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut phrase = Phrase::new("brb", "be right back").with_hotstring("brb", " ");
    engine.register_phrase(&mut phrase).unwrap();

    let handle = backend.hotstring_handle("brb").unwrap();
    backend.fire(handle, TriggerEvent::HotstringMatch(Some(' ')));
    engine.shutdown();

    assert_eq!(keyboard.count(Key::Backspace), 4);
    assert_eq!(keyboard.typed(), "be right back");
}

#[test]
fn test_cancelled_fillin_has_no_output() {
    let form = ScriptedForm::cancel();
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness_with(MockInputBackend::new(), |b| b.with_form_ui(form.clone()));
    let mut phrase = Phrase::new("greet", "Dear $fill(entry:name=who)$,").with_hotstring("dear", " ");
    engine.register_phrase(&mut phrase).unwrap();

    backend.fire(
        backend.hotstring_handle("dear").unwrap(),
        TriggerEvent::HotstringMatch(Some(' ')),
    );
    engine.shutdown();

    assert_eq!(form.prompts(), 1);
    assert!(keyboard.log().is_empty());
}

#[test]
fn test_submitted_fillin_is_typed() {
    let form = ScriptedForm::submit(&["Ada"]);
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness_with(MockInputBackend::new(), |b| b.with_form_ui(form.clone()));
    let mut phrase = Phrase::new("greet", "Dear $fill(entry:name=who)$,")
        .with_hotkey(Hotkey::new(Key::Char('g'), [Modifier::Ctrl]));
    engine.register_phrase(&mut phrase).unwrap();

    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.typed(), "Dear Ada,");
}

#[test]
fn test_paused_engine_drops_triggers() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut phrase = Phrase::new("sig", "Regards").with_hotkey(Hotkey::bare(Key::F(5)));
    engine.register_phrase(&mut phrase).unwrap();

    assert!(engine.toggle_pause());
    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    assert!(!engine.toggle_pause());
    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.typed(), "Regards");
}

#[test]
fn test_pause_hotkey_toggles() {
    let pause = Hotkey::new(Key::Char('p'), [Modifier::Ctrl, Modifier::Alt]);
    let settings = Settings {
        pause_hotkey: Some(pause.clone()),
        ..quiet_settings()
    };
    let Harness { backend, engine, .. } =
        harness_with(MockInputBackend::new(), |b| b.with_settings(settings));

    let handle = backend.hotkey_handle(&pause).unwrap();
    backend.fire(handle, TriggerEvent::HotkeyPress);
    assert!(engine.is_paused());
    backend.fire(handle, TriggerEvent::HotkeyPress);
    assert!(!engine.is_paused());
}

#[test]
fn test_editor_hotkey_calls_back() {
    let editor = Hotkey::bare(Key::F(12));
    let settings = Settings {
        editor_hotkey: Some(editor.clone()),
        ..quiet_settings()
    };
    let shown = Arc::new(AtomicUsize::new(0));
    let counter = shown.clone();
    let Harness { backend, .. } = harness_with(MockInputBackend::new(), |b| {
        b.with_settings(settings).on_show_editor(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    });

    backend.fire(backend.hotkey_handle(&editor).unwrap(), TriggerEvent::HotkeyPress);

    assert_eq!(shown.load(Ordering::SeqCst), 1);
}

#[test]
fn test_window_filter_gates_expansion() {
    let window = FixedWindow::new("xterm", "shell");
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness_with(MockInputBackend::new(), |b| b.with_window_service(window.clone()));
    let mut browser_only = Phrase::new("web", "browser text")
        .with_hotkey(Hotkey::bare(Key::F(6)))
        .with_window(&["firefox"], "");
    let mut shell_only = Phrase::new("sh", "shell text")
        .with_hotkey(Hotkey::bare(Key::F(7)))
        .with_window(&[], "she");
    engine.register_phrase(&mut browser_only).unwrap();
    engine.register_phrase(&mut shell_only).unwrap();

    backend.fire(browser_only.events[0], TriggerEvent::HotkeyPress);
    backend.fire(shell_only.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.typed(), "shell text");
}

#[test]
fn test_tab_cycles_caret_stops() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut phrase = Phrase::new("abc", "a$|b$|c").with_hotkey(Hotkey::bare(Key::F(8)));
    engine.register_phrase(&mut phrase).unwrap();

    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    assert!(wait_until(|| engine.pending_stops() == 1));
    assert_eq!(keyboard.typed(), "abc");
    assert_eq!(keyboard.count(Key::Left), 2);

    let tab = tab_handle(&backend);
    backend.fire(tab, TriggerEvent::HotkeyPress);
    assert_eq!(keyboard.count(Key::Right), 1);
    assert_eq!(engine.pending_stops(), 0);

    // No stops left: the consumed tab is handed back to the application
    backend.fire(tab, TriggerEvent::HotkeyPress);
    assert_eq!(keyboard.count(Key::Tab), 1);
    assert_eq!(keyboard.count(Key::Right), 1);
}

#[test]
fn test_passive_backend_erases_leaked_tab() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness_with(MockInputBackend::passive(), |b| b);
    let mut phrase = Phrase::new("abc", "a$|b$|c").with_hotkey(Hotkey::bare(Key::F(8)));
    engine.register_phrase(&mut phrase).unwrap();

    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    assert!(wait_until(|| engine.pending_stops() == 1));
    keyboard.clear();

    let tab = tab_handle(&backend);
    backend.fire(tab, TriggerEvent::HotkeyPress);
    assert_eq!(
        keyboard.log(),
        vec![
            Injected::Key(Key::Backspace, KeyDirection::Click),
            Injected::Key(Key::Right, KeyDirection::Click),
        ]
    );

    keyboard.clear();
    backend.fire(tab, TriggerEvent::HotkeyPress);
    assert!(keyboard.log().is_empty());
}

#[test]
fn test_new_expansion_replaces_stale_stops() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut stops = Phrase::new("stops", "$|x$|y$|z").with_hotkey(Hotkey::bare(Key::F(1)));
    let mut plain = Phrase::new("plain", "done").with_hotkey(Hotkey::bare(Key::F(2)));
    engine.register_phrase(&mut stops).unwrap();
    engine.register_phrase(&mut plain).unwrap();

    backend.fire(stops.events[0], TriggerEvent::HotkeyPress);
    assert!(wait_until(|| engine.pending_stops() == 2));
    backend.fire(plain.events[0], TriggerEvent::HotkeyPress);
    assert!(wait_until(|| keyboard.typed().ends_with("done")));

    assert_eq!(engine.pending_stops(), 0);
}

#[test]
fn test_reload_settings_reregisters_reserved() {
    let Harness { backend, engine, .. } = harness();
    assert!(backend.hotkey_handle(&Hotkey::bare(Key::Tab)).is_some());

    let pause = Hotkey::bare(Key::F(10));
    engine
        .reload_settings(Settings {
            use_tab: false,
            pause_hotkey: Some(pause.clone()),
            ..quiet_settings()
        })
        .unwrap();

    assert!(backend.hotkey_handle(&Hotkey::bare(Key::Tab)).is_none());
    assert!(backend.hotkey_handle(&pause).is_some());
    assert!(!engine.settings().use_tab);
}

#[test]
fn test_build_fails_when_reserved_hotkey_rejected() {
    let keyboard = RecordingKeyboard::new();
    let result = Engine::builder(MockInputBackend::rejecting_hotkeys(), keyboard, MemoryClipboard::new(""))
        .build();

    assert!(matches!(result, Err(HotkeyError::RegistrationFailed(_))));
}

#[test]
fn test_update_phrase_moves_triggers() {
    let Harness { backend, engine, .. } = harness();
    let mut phrase = Phrase::new("addr", "1 Main St").with_hotstring("adr", " ");
    engine.register_phrase(&mut phrase).unwrap();
    let old = phrase.events[0];

    let updated = Phrase::new("addr", "1 Main St").with_hotstring("addr", " \t");
    engine.update_phrase(&mut phrase, updated).unwrap();

    assert!(!backend.is_registered(old));
    assert_eq!(backend.hotstring_handle("addr"), Some(phrase.events[0]));
    assert_eq!(engine.registry().lookup(phrase.events[0]).map(|p| p.hotstring), Some("addr".to_string()));

    engine.unregister_phrase(&mut phrase);
    assert!(phrase.events.is_empty());
    assert!(backend.hotstring_handle("addr").is_none());
}

#[test]
fn test_embedding_uses_registered_phrases() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut sig = Phrase::new("sig", "Bob");
    let mut mail = Phrase::new("mail", "Thanks, $<sig>").with_hotkey(Hotkey::bare(Key::F(3)));
    engine.register_phrase(&mut sig).unwrap();
    engine.register_phrase(&mut mail).unwrap();

    backend.fire(mail.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.typed(), "Thanks, Bob");
}

#[test]
fn test_clock_drives_date_macros() {
    let fixed = Local.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness_with(MockInputBackend::new(), |b| b.with_clock(Arc::new(move || fixed)));
    let mut phrase = Phrase::new("next", "%@+1M%Y-%m-%d").with_hotkey(Hotkey::bare(Key::F(4)));
    engine.register_phrase(&mut phrase).unwrap();

    backend.fire(phrase.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.typed(), "2024-04-15");
}

#[test]
fn test_failed_job_does_not_stop_engine() {
    let Harness {
        backend,
        keyboard,
        engine,
    } = harness();
    let mut broken = Phrase::new("broken", "${KEY_NOPE}").with_hotkey(Hotkey::bare(Key::F(9)));
    let mut fine = Phrase::new("fine", "ok").with_hotkey(Hotkey::bare(Key::F(11)));
    engine.register_phrase(&mut broken).unwrap();
    engine.register_phrase(&mut fine).unwrap();

    backend.fire(broken.events[0], TriggerEvent::HotkeyPress);
    backend.fire(fine.events[0], TriggerEvent::HotkeyPress);
    engine.shutdown();

    assert_eq!(keyboard.log(), vec![Injected::Text("ok".to_string())]);
}
