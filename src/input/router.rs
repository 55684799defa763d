//! Central input router.
//!
//! [`InputRouter`] receives sampled input once per tick, broadcasts each
//! sample on its category channel for passive listeners, then walks the
//! priority-ordered handler chain for the active context until a handler
//! consumes the input.
//!
//! The router is constructed once from a [`RelayConfig`] and passed by
//! reference to every producer and consumer that needs it; there is no
//! global access point. All methods take `&self`, so handlers may call back
//! into the router (changing context, registering or unregistering handlers)
//! from inside their own `handle_*` call.
//!
//! Failure containment: a panicking handler is caught at the router
//! boundary, logged, and treated as not-consumed; dispatch continues with
//! the next handler and no panic ever reaches the `process_*` caller.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use crate::channel::broadcast::Channel;
use crate::config::RelayConfig;
use crate::input::context::InputContext;
use crate::input::handler::{HandlerRef, HandlerRegistry, InputHandler};
use crate::input::sample::{
    ActionSample, CombatSample, InputCategory, InputSample, MovementSample, UiSample,
};
use crate::input::state::InputState;
use crate::telemetry::{DispatchReport, DispatchSink};

/// One broadcast channel per input category, plus the context-change channel.
///
/// The context channel replays the current context to late subscribers.
/// Movement, combat, and UI channels cache their last sample when
/// [`RelayConfig::replay_samples`] is set; the action channel never caches,
/// since replaying a stale discrete press would fabricate input.
pub struct RouterChannels {
    pub movement: Rc<Channel<MovementSample>>,
    pub combat: Rc<Channel<CombatSample>>,
    pub ui: Rc<Channel<UiSample>>,
    pub action: Rc<Channel<ActionSample>>,
    pub context_changed: Rc<Channel<InputContext>>,
}

struct ChainOutcome {
    consumed: bool,
    visited: usize,
}

/// Orchestrator multiplexing per-tick input samples to channels and handlers.
pub struct InputRouter {
    channels: RouterChannels,
    handlers: RefCell<HandlerRegistry>,
    context: Cell<InputContext>,
    enabled: Cell<bool>,
    state: RefCell<InputState>,
    sink: Option<Box<dyn DispatchSink>>,
    warn_threshold: Duration,
}

impl InputRouter {
    /// Create a router from `config`, without an observability sink.
    pub fn new(config: &RelayConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a router that reports every dispatch to `sink`.
    pub fn with_sink(config: &RelayConfig, sink: Box<dyn DispatchSink>) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: &RelayConfig, sink: Option<Box<dyn DispatchSink>>) -> Self {
        let start_context = config.start_context;
        let channels = RouterChannels {
            movement: Rc::new(if config.replay_samples {
                Channel::with_replay(MovementSample::default)
            } else {
                Channel::new()
            }),
            combat: Rc::new(if config.replay_samples {
                Channel::with_replay(CombatSample::default)
            } else {
                Channel::new()
            }),
            ui: Rc::new(if config.replay_samples {
                Channel::with_replay(UiSample::default)
            } else {
                Channel::new()
            }),
            action: Rc::new(Channel::new()),
            context_changed: Rc::new(Channel::with_replay(move || start_context)),
        };
        info!(
            "input router initialized (context: {start_context}, enabled: {})",
            config.enabled
        );
        Self {
            channels,
            handlers: RefCell::new(HandlerRegistry::new()),
            context: Cell::new(start_context),
            enabled: Cell::new(config.enabled),
            state: RefCell::new(InputState::new()),
            sink,
            warn_threshold: config.warn_threshold(),
        }
    }

    /// The category channels, for consumers that attach listeners directly.
    pub fn channels(&self) -> &RouterChannels {
        &self.channels
    }

    /// The currently active context.
    pub fn context(&self) -> InputContext {
        self.context.get()
    }

    /// Switch the active context.
    ///
    /// No-op when `new_context` is already active; otherwise exactly one
    /// notification is raised on the context-change channel.
    pub fn set_context(&self, new_context: InputContext) {
        let old_context = self.context.get();
        if old_context == new_context {
            return;
        }
        self.context.set(new_context);
        info!("input context changed: {old_context} -> {new_context}");
        self.channels.context_changed.raise(new_context);
    }

    /// Globally gate input processing. While disabled, `process_*` calls are
    /// accepted but produce no dispatch.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        debug!("input enabled: {enabled}");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Register an input handler. No-op on duplicates.
    pub fn register_handler(&self, handler: &HandlerRef) {
        self.handlers.borrow_mut().register(handler);
    }

    /// Unregister an input handler. No-op if absent.
    pub fn unregister_handler(&self, handler: &dyn InputHandler) {
        self.handlers.borrow_mut().unregister(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Copy of the last accepted sample per category.
    pub fn input_state(&self) -> InputState {
        *self.state.borrow()
    }

    /// Route a tagged sample to the matching `process_*` method.
    pub fn process(&self, sample: InputSample) {
        match sample {
            InputSample::Movement(s) => self.process_movement(s),
            InputSample::Combat(s) => self.process_combat(s),
            InputSample::Ui(s) => self.process_ui(s),
            InputSample::Action(s) => self.process_action(s),
        }
    }

    /// Process one movement sample: broadcast, then walk the handler chain.
    pub fn process_movement(&self, sample: MovementSample) {
        if !self.should_process() {
            return;
        }
        let context = self.context.get();
        let started = Instant::now();
        self.state.borrow_mut().movement = Some(sample);
        self.channels.movement.raise(sample);
        let outcome = self.run_chain(InputCategory::Movement, context, |handler| {
            handler.handle_movement(&sample)
        });
        self.finish_dispatch(InputCategory::Movement, context, started, outcome);
    }

    /// Process one combat sample: broadcast, then walk the handler chain.
    pub fn process_combat(&self, sample: CombatSample) {
        if !self.should_process() {
            return;
        }
        let context = self.context.get();
        let started = Instant::now();
        self.state.borrow_mut().combat = Some(sample);
        self.channels.combat.raise(sample);
        let outcome = self.run_chain(InputCategory::Combat, context, |handler| {
            handler.handle_combat(&sample)
        });
        self.finish_dispatch(InputCategory::Combat, context, started, outcome);
    }

    /// Process one UI sample: broadcast, then walk the handler chain.
    pub fn process_ui(&self, sample: UiSample) {
        if !self.should_process() {
            return;
        }
        let context = self.context.get();
        let started = Instant::now();
        self.state.borrow_mut().ui = Some(sample);
        self.channels.ui.raise(sample);
        let outcome = self.run_chain(InputCategory::Ui, context, |handler| {
            handler.handle_ui(&sample)
        });
        self.finish_dispatch(InputCategory::Ui, context, started, outcome);
    }

    /// Process one generic action sample: broadcast, then walk the handler
    /// chain.
    pub fn process_action(&self, sample: ActionSample) {
        if !self.should_process() {
            return;
        }
        let context = self.context.get();
        let started = Instant::now();
        self.state.borrow_mut().action = Some(sample);
        self.channels.action.raise(sample);
        let outcome = self.run_chain(InputCategory::Action, context, |handler| {
            handler.handle_action(&sample)
        });
        self.finish_dispatch(InputCategory::Action, context, started, outcome);
    }

    /// Human-readable routing statistics for diagnostics.
    pub fn debug_info(&self) -> String {
        let handlers = self.handlers.borrow();
        format!(
            "InputRouter: context={}, enabled={}, handlers={} ({} active), \
             listeners: movement={} combat={} ui={} action={}",
            self.context.get(),
            self.enabled.get(),
            handlers.len(),
            handlers.active_len(),
            self.channels.movement.listener_count(),
            self.channels.combat.listener_count(),
            self.channels.ui.listener_count(),
            self.channels.action.listener_count(),
        )
    }

    fn should_process(&self) -> bool {
        if !self.enabled.get() {
            return false;
        }
        let context = self.context.get();
        if !self.state.borrow().accepts(context) {
            trace!("input rejected by validity gate in context {context}");
            return false;
        }
        true
    }

    /// Walk the resolved handler chain until one consumes the input. A
    /// panicking handler is logged and counts as not-consumed.
    fn run_chain(
        &self,
        category: InputCategory,
        context: InputContext,
        mut call: impl FnMut(&dyn InputHandler) -> bool,
    ) -> ChainOutcome {
        // Owned chain; the registry borrow ends here so handlers may
        // (un)register handlers or switch context mid-dispatch.
        let chain = self.handlers.borrow().chain_for(context);
        let mut visited = 0;
        for handler in &chain {
            visited += 1;
            match catch_unwind(AssertUnwindSafe(|| call(handler.as_ref()))) {
                Ok(true) => {
                    debug!(
                        "{category:?} input consumed by handler (priority {})",
                        handler.priority()
                    );
                    return ChainOutcome {
                        consumed: true,
                        visited,
                    };
                }
                Ok(false) => {}
                Err(_) => {
                    error!(
                        "input handler panicked while handling {category:?} input; \
                         treated as not consumed"
                    );
                }
            }
        }
        ChainOutcome {
            consumed: false,
            visited,
        }
    }

    fn finish_dispatch(
        &self,
        category: InputCategory,
        context: InputContext,
        started: Instant,
        outcome: ChainOutcome,
    ) {
        let duration = started.elapsed();
        if duration > self.warn_threshold {
            warn!(
                "{category:?} input dispatch took {duration:?} (threshold: {:?})",
                self.warn_threshold
            );
        }
        if let Some(sink) = &self.sink {
            sink.record(&DispatchReport {
                category,
                context,
                duration,
                consumed: outcome.consumed,
                handlers_visited: outcome.visited,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::listener::{FnListener, Listener};
    use crate::input::sample::{Axis2, InputAction};
    use crate::telemetry::ChannelSink;
    use std::cell::RefCell;

    /// Handler that records its label and consumes according to a flag.
    struct ScriptedHandler {
        label: &'static str,
        context: InputContext,
        priority: i32,
        active: Cell<bool>,
        consume: Cell<bool>,
        panicking: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl ScriptedHandler {
        fn new(
            label: &'static str,
            context: InputContext,
            priority: i32,
            log: &Rc<RefCell<Vec<&'static str>>>,
        ) -> Rc<Self> {
            Rc::new(Self {
                label,
                context,
                priority,
                active: Cell::new(true),
                consume: Cell::new(false),
                panicking: false,
                log: Rc::clone(log),
            })
        }

        fn consuming(
            label: &'static str,
            context: InputContext,
            priority: i32,
            log: &Rc<RefCell<Vec<&'static str>>>,
        ) -> Rc<Self> {
            let handler = Self::new(label, context, priority, log);
            handler.consume.set(true);
            handler
        }

        fn panicking(
            label: &'static str,
            context: InputContext,
            priority: i32,
            log: &Rc<RefCell<Vec<&'static str>>>,
        ) -> Rc<Self> {
            Rc::new(Self {
                label,
                context,
                priority,
                active: Cell::new(true),
                consume: Cell::new(false),
                panicking: true,
                log: Rc::clone(log),
            })
        }

        fn touch(&self) -> bool {
            if self.panicking {
                panic!("handler fault");
            }
            self.log.borrow_mut().push(self.label);
            self.consume.get()
        }
    }

    impl InputHandler for ScriptedHandler {
        fn supported_context(&self) -> InputContext {
            self.context
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn is_active(&self) -> bool {
            self.active.get()
        }

        fn handle_movement(&self, _sample: &MovementSample) -> bool {
            self.touch()
        }

        fn handle_combat(&self, _sample: &CombatSample) -> bool {
            self.touch()
        }

        fn handle_ui(&self, _sample: &UiSample) -> bool {
            self.touch()
        }

        fn handle_action(&self, _sample: &ActionSample) -> bool {
            self.touch()
        }
    }

    fn handler_ref(handler: &Rc<ScriptedHandler>) -> HandlerRef {
        Rc::clone(handler) as HandlerRef
    }

    fn movement_sample(timestamp: f64) -> MovementSample {
        MovementSample::new(Axis2::new(0.0, 1.0), Axis2::ZERO, false, false, false, timestamp)
    }

    #[test]
    fn test_consumption_short_circuits_lower_priorities() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let a = ScriptedHandler::consuming("a", InputContext::Gameplay, 10, &log);
        let b = ScriptedHandler::new("b", InputContext::Gameplay, 5, &log);
        let c = ScriptedHandler::new("c", InputContext::Gameplay, 1, &log);
        router.register_handler(&handler_ref(&a));
        router.register_handler(&handler_ref(&b));
        router.register_handler(&handler_ref(&c));

        router.process_movement(movement_sample(1.0));
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_handler_panic_is_contained_and_chain_continues() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let a = ScriptedHandler::new("a", InputContext::Gameplay, 10, &log);
        let b = ScriptedHandler::panicking("b", InputContext::Gameplay, 5, &log);
        let c = ScriptedHandler::new("c", InputContext::Gameplay, 1, &log);
        router.register_handler(&handler_ref(&a));
        router.register_handler(&handler_ref(&b));
        router.register_handler(&handler_ref(&c));

        // Must not propagate the panic; a ran before the fault, c after.
        router.process_movement(movement_sample(1.0));
        assert_eq!(*log.borrow(), vec!["a", "c"]);
    }

    #[test]
    fn test_disabled_router_drops_input() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let handler = ScriptedHandler::new("h", InputContext::Gameplay, 0, &log);
        router.register_handler(&handler_ref(&handler));

        router.set_enabled(false);
        router.process_movement(movement_sample(1.0));
        assert!(log.borrow().is_empty());
        assert!(router.input_state().movement.is_none());

        router.set_enabled(true);
        router.process_movement(movement_sample(2.0));
        assert_eq!(*log.borrow(), vec!["h"]);
    }

    #[test]
    fn test_loading_context_rejects_input() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let handler = ScriptedHandler::new("h", InputContext::Gameplay, 0, &log);
        router.register_handler(&handler_ref(&handler));

        router.set_context(InputContext::Loading);
        router.process_movement(movement_sample(1.0));
        assert!(log.borrow().is_empty());

        router.set_context(InputContext::Gameplay);
        router.process_movement(movement_sample(2.0));
        assert_eq!(*log.borrow(), vec!["h"]);
    }

    #[test]
    fn test_context_change_notifies_once_and_dedups() {
        let router = InputRouter::new(&RelayConfig::new());
        let changes = Rc::new(RefCell::new(Vec::new()));
        let changes_clone = Rc::clone(&changes);
        let listener: Rc<dyn Listener<InputContext>> =
            FnListener::new(0, move |c: &InputContext| {
                changes_clone.borrow_mut().push(*c);
            });
        router.channels().context_changed.register(&listener);
        // Replay delivers the startup context on registration.
        assert_eq!(*changes.borrow(), vec![InputContext::Gameplay]);

        router.set_context(InputContext::Gameplay); // unchanged: no notification
        router.set_context(InputContext::Menu);
        router.set_context(InputContext::Menu); // unchanged: no notification
        assert_eq!(
            *changes.borrow(),
            vec![InputContext::Gameplay, InputContext::Menu]
        );
        assert_eq!(router.context(), InputContext::Menu);
    }

    #[test]
    fn test_fallback_handlers_serve_other_contexts() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let menu = ScriptedHandler::new("menu", InputContext::Menu, 1, &log);
        let fallback = ScriptedHandler::new("fallback", InputContext::Gameplay, 10, &log);
        router.register_handler(&handler_ref(&menu));
        router.register_handler(&handler_ref(&fallback));

        router.set_context(InputContext::Menu);
        router.process_ui(UiSample::new(Axis2::ZERO, true, false, false, 1.0));
        assert_eq!(*log.borrow(), vec!["fallback", "menu"]);
    }

    #[test]
    fn test_channel_listeners_hear_broadcast_before_handlers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let handler = ScriptedHandler::new("handler", InputContext::Gameplay, 0, &log);
        router.register_handler(&handler_ref(&handler));

        let log_clone = Rc::clone(&log);
        let listener: Rc<dyn Listener<MovementSample>> =
            FnListener::new(0, move |_: &MovementSample| {
                log_clone.borrow_mut().push("listener");
            });
        router.channels().movement.register(&listener);

        router.process_movement(movement_sample(1.0));
        assert_eq!(*log.borrow(), vec!["listener", "handler"]);
    }

    #[test]
    fn test_input_state_tracks_accepted_samples() {
        let router = InputRouter::new(&RelayConfig::new());
        router.process_movement(movement_sample(1.5));
        router.process_action(ActionSample::button(InputAction::Jump, true, 2.5));

        let state = router.input_state();
        assert_eq!(state.movement.map(|s| s.timestamp), Some(1.5));
        assert_eq!(state.action.map(|s| s.action), Some(InputAction::Jump));
        assert_eq!(state.latest_timestamp(), Some(2.5));
    }

    #[test]
    fn test_sink_receives_latency_and_outcome() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (sink, reports) = ChannelSink::new();
        let router = InputRouter::with_sink(&RelayConfig::new(), Box::new(sink));
        let consumer = ScriptedHandler::consuming("c", InputContext::Gameplay, 5, &log);
        router.register_handler(&handler_ref(&consumer));

        router.process_movement(movement_sample(1.0));
        router.process_combat(CombatSample::new(
            false,
            false,
            false,
            true,
            Axis2::ZERO,
            1.0,
        ));

        let collected: Vec<_> = reports.try_iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].category, InputCategory::Movement);
        assert!(collected[0].consumed);
        assert_eq!(collected[0].handlers_visited, 1);
        assert_eq!(collected[1].category, InputCategory::Combat);
        assert!(collected[1].consumed);
    }

    #[test]
    fn test_process_union_routes_by_category() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = InputRouter::new(&RelayConfig::new());
        let handler = ScriptedHandler::new("h", InputContext::Gameplay, 0, &log);
        router.register_handler(&handler_ref(&handler));

        router.process(InputSample::Ui(UiSample::new(
            Axis2::ZERO,
            false,
            true,
            false,
            3.0,
        )));
        assert_eq!(router.input_state().ui.map(|s| s.cancel), Some(true));
    }

    struct SelfRemovingHandler {
        router: Rc<InputRouter>,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl InputHandler for SelfRemovingHandler {
        fn supported_context(&self) -> InputContext {
            InputContext::Gameplay
        }

        fn priority(&self) -> i32 {
            10
        }

        fn handle_movement(&self, _sample: &MovementSample) -> bool {
            self.log.borrow_mut().push("remover");
            self.router.unregister_handler(self);
            false
        }
    }

    #[test]
    fn test_handler_may_unregister_itself_mid_dispatch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let router = Rc::new(InputRouter::new(&RelayConfig::new()));
        let remover = Rc::new(SelfRemovingHandler {
            router: Rc::clone(&router),
            log: Rc::clone(&log),
        });
        let remover_ref: HandlerRef = remover;
        let survivor = ScriptedHandler::new("survivor", InputContext::Gameplay, 1, &log);
        router.register_handler(&remover_ref);
        router.register_handler(&handler_ref(&survivor));

        router.process_movement(movement_sample(1.0));
        assert_eq!(*log.borrow(), vec!["remover", "survivor"]);
        assert_eq!(router.handler_count(), 1);

        log.borrow_mut().clear();
        router.process_movement(movement_sample(2.0));
        assert_eq!(*log.borrow(), vec!["survivor"]);
    }

    #[test]
    fn test_replay_samples_config_enables_channel_cache() {
        let mut config = RelayConfig::new();
        config.replay_samples = true;
        let router = InputRouter::new(&config);
        assert!(router.channels().movement.replay_enabled());
        assert!(!router.channels().action.replay_enabled());

        router.process_movement(movement_sample(4.0));
        assert_eq!(
            router.channels().movement.last_value().map(|s| s.timestamp),
            Some(4.0)
        );
    }

    #[test]
    fn test_debug_info_mentions_context_and_counts() {
        let router = InputRouter::new(&RelayConfig::new());
        let info = router.debug_info();
        assert!(info.contains("context=gameplay"));
        assert!(info.contains("handlers=0"));
    }
}
