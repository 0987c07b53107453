//! Engine - session orchestration shared by every frontend
//!
//! The Engine owns the TEA state, the message channel, the transport and the
//! shutdown signal. Frontends feed it commands through [`Engine::msg_sender`]
//! and observe it through [`Engine::subscribe`].

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use klinewatch_core::prelude::*;
use klinewatch_core::SessionEvent;
use klinewatch_net::{Fetch, HttpFetcher, ResultStore, Transport};

use crate::config::Settings;
use crate::message::Message;
use crate::process;
use crate::state::AppState;

/// Orchestration engine for klinewatch.
///
/// Encapsulates:
/// - TEA state management
/// - Message channel
/// - Transport and its result store
/// - Shutdown signaling
/// - Event broadcasting for external consumers
pub struct Engine<F> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, stdin reader).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Sender for the shutdown signal. Send `true` to initiate shutdown.
    pub shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Clone for background tasks.
    pub shutdown_rx: watch::Receiver<bool>,

    transport: Transport<F>,

    ticker: Option<JoinHandle<()>>,

    /// Subscribers receive SessionEvents after each message processing cycle.
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Engine<HttpFetcher> {
    /// Create an engine talking HTTP to the configured server
    pub fn connect(settings: &Settings) -> Result<Self> {
        let fetcher = HttpFetcher::new(settings.server.request_timeout())?;
        Self::new(settings, fetcher)
    }
}

impl<F> Engine<F>
where
    F: Fetch + Sync + 'static,
{
    /// Create an engine using `fetcher` for network access.
    ///
    /// Fails when the settings cannot start a session (bad URL, missing
    /// credentials).
    pub fn new(settings: &Settings, fetcher: F) -> Result<Self> {
        settings.validate()?;
        let base_url = settings.server_url()?;

        let store = Arc::new(ResultStore::new(settings.timing.retention()));
        let transport = Transport::new(fetcher, base_url, store);

        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            state: AppState::new(settings),
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            transport,
            ticker: None,
            event_tx,
        })
    }

    /// Subscribe to session events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Start the tick timer and send the first Login
    pub fn start(&mut self) {
        if self.ticker.is_none() {
            self.ticker = Some(self.spawn_ticker());
        }
        self.emit(SessionEvent::info(format!(
            "Connecting to {} as '{}'",
            self.transport.base_url(),
            self.state.account.user
        )));
        self.process_message(Message::Login);
    }

    /// Process a single message through the TEA update cycle and publish
    /// the events it produced.
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(
            &mut self.state,
            msg,
            &self.transport,
            &self.msg_tx,
            &self.shutdown_rx,
        );

        for event in self.state.take_events() {
            self.emit(event);
        }
    }

    /// Process messages until Quit is requested or every sender is gone
    pub async fn run(&mut self) {
        while !self.should_quit() {
            match self.msg_rx.recv().await {
                Some(msg) => self.process_message(msg),
                None => {
                    warn!("Message channel closed");
                    self.emit(SessionEvent::error("Message channel closed"));
                    break;
                }
            }
        }
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Emit `Shutdown`, stop the ticker and cancel scheduled messages
    pub async fn shutdown(&mut self) {
        self.emit(SessionEvent::Shutdown);

        let _ = self.shutdown_tx.send(true);

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            let _ = ticker.await;
        }

        info!(
            "Engine stopped with {} request(s) outstanding",
            self.state.sent.len()
        );
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let tx = self.msg_tx.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();
        let period = self.state.timing.tick_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tx.send(Message::Tick).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        })
    }

    /// send() returns Err only if there are no receivers, which is fine.
    fn emit(&self, event: SessionEvent) {
        trace!("Event: {}", event.event_type());
        let _ = self.event_tx.send(event);
    }
}
