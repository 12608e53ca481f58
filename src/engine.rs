// Expansion engine - wires triggers, resolver, worker and output together
//
// Trigger callbacks run on the input backend's listener thread. Reserved
// actions (next caret stop, pause toggle, show editor) run right there;
// phrase triggers are queued for the expansion worker.

use crate::clipboard::ClipboardService;
use crate::form::{DefaultsFormUi, FormUi};
use crate::input::{
    EventHandle, HotkeyError, InputBackend, InputSuppressor, TriggerCallback, TriggerEvent,
};
use crate::keyboard::{Key, Keyboard};
use crate::macros::{Resolution, ResolveContext, Resolver};
use crate::output::OutputDispatcher;
use crate::phrase::{Hotkey, Phrase};
use crate::registry::TriggerRegistry;
use crate::settings::Settings;
use crate::window::{WindowFilter, WindowService};
use crate::worker::{ExpansionError, ExpansionJob, ExpansionWorker, JobHandler, JobSender};
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Clock used for date macros
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Hotkeys the engine handles itself instead of expanding a phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservedAction {
    NextStop,
    TogglePause,
    ShowEditor,
}

/// State shared by the engine handle, listener callbacks and the worker
struct Shared {
    backend: Arc<dyn InputBackend>,
    registry: Arc<TriggerRegistry>,
    output: OutputDispatcher,
    reserved: RwLock<HashMap<EventHandle, ReservedAction>>,
    paused: AtomicBool,
    /// Right-press deltas for caret stops not yet visited
    stops: Mutex<VecDeque<usize>>,
    settings: RwLock<Settings>,
    on_show_editor: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Shared {
    fn run_reserved(&self, action: ReservedAction) {
        match action {
            ReservedAction::NextStop => self.next_stop(),
            ReservedAction::TogglePause => {
                self.toggle_pause();
            }
            ReservedAction::ShowEditor => match &self.on_show_editor {
                Some(show) => show(),
                None => crate::info!("Editor requested but none is attached"),
            },
        }
    }

    fn next_stop(&self) {
        let step = self.stops.lock().pop_front();
        let passive = self.backend.passes_through();

        let result = match step {
            Some(steps) => {
                // The Tab already reached the application; take it back out
                let erased = if passive {
                    self.output.press(Key::Backspace)
                } else {
                    Ok(())
                };
                erased.and_then(|()| self.output.advance(steps))
            }
            None if passive => Ok(()),
            None => self.output.press(Key::Tab),
        };

        if let Err(e) = result {
            crate::warn!("Failed to move to next caret stop: {}", e);
        }
    }

    fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::SeqCst);
        self.stops.lock().clear();
        crate::info!("Expansion {}", if paused { "paused" } else { "resumed" });
        paused
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Job handler running on the worker thread
struct Expander {
    shared: Arc<Shared>,
    clipboard: Arc<dyn ClipboardService>,
    form: Arc<dyn FormUi>,
    window: WindowFilter,
    clock: Clock,
}

impl JobHandler for Expander {
    fn handle(&mut self, job: ExpansionJob) -> Result<(), ExpansionError> {
        let ExpansionJob { phrase, event } = job;

        if self.shared.is_paused() {
            crate::debug!("Paused; dropping queued '{}'", phrase.name);
            return Ok(());
        }
        if !self.window.matches(&phrase) {
            return Ok(());
        }

        let settings = self.shared.settings.read().clone();
        let ctx = ResolveContext {
            trigger: event.trigger_char(),
            keep_trigger: settings.keep_trigger,
            now: (self.clock)(),
        };
        let resolver = Resolver::new(
            self.shared.registry.clone(),
            self.clipboard.clone(),
            self.form.clone(),
        )
        .with_command_timeout(settings.command_timeout());

        let expansion = match resolver.resolve(&phrase, &ctx)? {
            Resolution::Expanded(expansion) => expansion,
            Resolution::Cancelled => {
                crate::info!("Fill-in for '{}' cancelled", phrase.name);
                return Ok(());
            }
        };

        self.shared.stops.lock().clear();
        self.shared.output.dispatch(&phrase, event, &expansion)?;

        if let Some(plan) = &expansion.caret {
            *self.shared.stops.lock() = plan.remaining_stops();
        }
        crate::debug!("Expanded '{}'", phrase.name);
        Ok(())
    }
}

fn trigger_callback(shared: Weak<Shared>, jobs: JobSender) -> TriggerCallback {
    Arc::new(move |handle: EventHandle, event: TriggerEvent| {
        let Some(shared) = shared.upgrade() else {
            return;
        };

        let reserved = shared.reserved.read().get(&handle).copied();
        if let Some(action) = reserved {
            shared.run_reserved(action);
            return;
        }

        if shared.is_paused() {
            crate::trace!("Paused; ignoring trigger {}", handle);
            return;
        }

        match shared.registry.lookup(handle) {
            Some(phrase) => {
                if let Err(e) = jobs.enqueue(ExpansionJob { phrase, event }) {
                    crate::warn!("Dropping trigger {}: {}", handle, e);
                }
            }
            None => crate::debug!("Ignoring event from unknown handle {}", handle),
        }
    })
}

/// Builder for [`Engine`]
pub struct EngineBuilder {
    backend: Arc<dyn InputBackend>,
    keyboard: Arc<dyn Keyboard>,
    clipboard: Arc<dyn ClipboardService>,
    suppressor: InputSuppressor,
    settings: Settings,
    window_service: Option<Arc<dyn WindowService>>,
    form: Arc<dyn FormUi>,
    clock: Clock,
    on_show_editor: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl EngineBuilder {
    /// Suppressor shared with the input backend
    pub fn with_suppressor(mut self, suppressor: InputSuppressor) -> Self {
        self.suppressor = suppressor;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_window_service(mut self, service: Arc<dyn WindowService>) -> Self {
        self.window_service = Some(service);
        self
    }

    pub fn with_form_ui(mut self, form: Arc<dyn FormUi>) -> Self {
        self.form = form;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Called when the show-editor hotkey fires
    pub fn on_show_editor(mut self, callback: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.on_show_editor = Some(callback);
        self
    }

    /// Start the worker and register the reserved hotkeys
    pub fn build(self) -> Result<Engine, HotkeyError> {
        let registry = Arc::new(TriggerRegistry::new(self.backend.clone()));
        let output = OutputDispatcher::new(
            self.keyboard,
            self.clipboard.clone(),
            self.suppressor,
            self.settings.output_delays(),
        );

        let shared = Arc::new(Shared {
            backend: self.backend,
            registry,
            output,
            reserved: RwLock::new(HashMap::new()),
            paused: AtomicBool::new(false),
            stops: Mutex::new(VecDeque::new()),
            settings: RwLock::new(self.settings),
            on_show_editor: self.on_show_editor,
        });

        let worker = ExpansionWorker::spawn(Expander {
            shared: shared.clone(),
            clipboard: self.clipboard,
            form: self.form,
            window: WindowFilter::new(self.window_service),
            clock: self.clock,
        });
        let callback = trigger_callback(Arc::downgrade(&shared), worker.sender());

        let engine = Engine {
            shared,
            callback,
            worker: Some(worker),
        };
        engine.register_reserved()?;
        Ok(engine)
    }
}

/// Running expansion engine
pub struct Engine {
    shared: Arc<Shared>,
    callback: TriggerCallback,
    worker: Option<ExpansionWorker>,
}

impl Engine {
    pub fn builder(
        backend: Arc<dyn InputBackend>,
        keyboard: Arc<dyn Keyboard>,
        clipboard: Arc<dyn ClipboardService>,
    ) -> EngineBuilder {
        EngineBuilder {
            backend,
            keyboard,
            clipboard,
            suppressor: InputSuppressor::new(),
            settings: Settings::default(),
            window_service: None,
            form: Arc::new(DefaultsFormUi),
            clock: Arc::new(Local::now),
            on_show_editor: None,
        }
    }

    pub fn register_phrase(&self, phrase: &mut Phrase) -> Result<(), HotkeyError> {
        self.shared.registry.register(phrase, self.callback.clone())
    }

    pub fn unregister_phrase(&self, phrase: &mut Phrase) {
        self.shared.registry.unregister(phrase);
    }

    /// Replace `phrase` with `updated`, re-registering its triggers
    pub fn update_phrase(&self, phrase: &mut Phrase, updated: Phrase) -> Result<(), HotkeyError> {
        self.unregister_phrase(phrase);
        *phrase = updated;
        self.register_phrase(phrase)
    }

    /// Flip the pause state; returns true when now paused
    pub fn toggle_pause(&self) -> bool {
        self.shared.toggle_pause()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.is_paused()
    }

    /// Apply new settings and re-register the reserved hotkeys
    pub fn reload_settings(&self, settings: Settings) -> Result<(), HotkeyError> {
        self.shared.output.set_delays(settings.output_delays());
        *self.shared.settings.write() = settings;
        self.release_reserved();
        self.register_reserved()
    }

    pub fn settings(&self) -> Settings {
        self.shared.settings.read().clone()
    }

    /// Caret stops still waiting for an advance
    pub fn pending_stops(&self) -> usize {
        self.shared.stops.lock().len()
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.shared.registry
    }

    /// Release the reserved hotkeys, finish queued expansions and stop the worker
    pub fn shutdown(mut self) {
        self.release_reserved();
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
        crate::info!("Engine stopped");
    }

    fn register_reserved(&self) -> Result<(), HotkeyError> {
        let settings = self.settings();
        let mut wanted: Vec<(Hotkey, ReservedAction)> = Vec::new();
        if settings.use_tab {
            wanted.push((Hotkey::bare(Key::Tab), ReservedAction::NextStop));
        }
        if let Some(hotkey) = settings.pause_hotkey {
            wanted.push((hotkey, ReservedAction::TogglePause));
        }
        if let Some(hotkey) = settings.editor_hotkey {
            wanted.push((hotkey, ReservedAction::ShowEditor));
        }

        for (hotkey, action) in wanted {
            let handle = self
                .shared
                .backend
                .register_hotkey(&hotkey, self.callback.clone())?;
            crate::debug!("Reserved {} for {:?}", hotkey, action);
            self.shared.reserved.write().insert(handle, action);
        }
        Ok(())
    }

    fn release_reserved(&self) {
        let handles: Vec<EventHandle> = self.shared.reserved.write().drain().map(|(h, _)| h).collect();
        for handle in handles {
            if let Err(e) = self.shared.backend.unregister(handle) {
                crate::warn!("Failed to release reserved hotkey {}: {}", handle, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
