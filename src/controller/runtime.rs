//! Effect executor for the form controller.
//!
//! [`Runtime`] owns the [`UiState`], the local storage and a predictor. It
//! feeds events through [`update`](super::update) and carries out the
//! resulting effects:
//!
//! - predictions run on their own worker thread, one per submission, and
//!   report back over a channel; a response that never arrives simply
//!   leaves that form waiting
//! - press-feedback timers are sleeping threads on the same channel
//! - theme writes and failure diagnostics happen inline and never fail the
//!   caller
//!
//! Completions are only applied when the owner calls [`Runtime::pump`],
//! [`Runtime::wait_next`] or [`Runtime::run_until_idle`], so state changes
//! stay on the owning thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::analytics::logger;
use crate::client::Predictor;
use crate::config::LoggingConfig;
use crate::storage::LocalStorage;
use crate::theme::{self, THEME_KEY};

use super::pipeline::execute_prediction;
use super::{Effect, Event, UiState, update};

pub struct Runtime {
    state: UiState,
    predictor: Arc<dyn Predictor>,
    storage: Box<dyn LocalStorage>,
    logging: LoggingConfig,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    /// Worker and timer threads that have not reported back yet.
    pending: usize,
}

impl Runtime {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        storage: Box<dyn LocalStorage>,
        logging: LoggingConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state: UiState::default(),
            predictor,
            storage,
            logging,
            tx,
            rx,
            pending: 0,
        }
    }

    /// Read the stored theme and deliver [`Event::Ready`].
    pub fn start(&mut self) {
        let stored_theme = match self.storage.get_item(THEME_KEY) {
            Ok(value) => value,
            Err(e) => {
                logger::log_diagnostic(&self.logging, &format!("theme read failed: {e:#}"));
                None
            }
        };
        self.dispatch(Event::Ready { stored_theme });
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Number of outstanding predictions and timers.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Apply one event and execute its effects.
    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, event);
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    /// Apply every completion that has already arrived. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.deliver(event);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for one completion and apply it. Returns `false`
    /// if nothing arrived in time.
    pub fn wait_next(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.deliver(event);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Block until every outstanding prediction and timer has reported back.
    ///
    /// Does not return while a backend request hangs.
    pub fn run_until_idle(&mut self) {
        while self.pending > 0 {
            match self.rx.recv() {
                Ok(event) => self.deliver(event),
                Err(_) => break,
            }
        }
    }

    fn deliver(&mut self, event: Event) {
        self.pending = self.pending.saturating_sub(1);
        self.dispatch(event);
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::PersistTheme(next) => {
                if !theme::persist_preference(self.storage.as_mut(), next) {
                    logger::log_diagnostic(
                        &self.logging,
                        &format!("theme write failed, keeping {next} for this session only"),
                    );
                }
            }
            Effect::Predict { form, payload, .. } => {
                let predictor = Arc::clone(&self.predictor);
                let logging = self.logging.clone();
                let tx = self.tx.clone();
                self.pending += 1;
                thread::spawn(move || {
                    let outcome = execute_prediction(predictor.as_ref(), form, &payload, &logging);
                    let _ = tx.send(Event::PredictionSettled { form, outcome });
                });
            }
            Effect::ReleasePress { form, after } => {
                let tx = self.tx.clone();
                self.pending += 1;
                thread::spawn(move || {
                    thread::sleep(after);
                    let _ = tx.send(Event::PressReleased(form));
                });
            }
            Effect::LogFailure { form, message } => {
                logger::log_diagnostic(
                    &self.logging,
                    &format!(
                        "prediction error form={form} model={} error={message}",
                        form.model_id()
                    ),
                );
            }
        }
    }
}
