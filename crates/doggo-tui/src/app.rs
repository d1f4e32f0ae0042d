use std::time::Instant;
use doggo_core::{
    cancel_pair, CancelHandle, ChatClient, ChatRequest, Config, Direction, StreamEvent, UiState,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::tui::AppEvent;

/// The request currently streaming, if any
struct ActiveRequest {
    cancel: CancelHandle,
    task: JoinHandle<()>,
}

pub struct App {
    pub should_quit: bool,
    pub state: UiState,
    pub config: Config,

    // Spinner frame, advanced on Tick while busy
    pub animation_frame: usize,

    // Largest valid log scroll offset, measured during the last draw
    pub max_scroll: u16,
    // Inner height of the log pane, for page scrolling
    pub log_height: u16,

    client: ChatClient,
    request: Option<ActiveRequest>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let client = ChatClient::new(config.endpoint(), config.framing())
            .with_idle_timeout(config.idle_timeout());
        let state = UiState::new(config.direction(), config.alert());

        Self {
            should_quit: false,
            state,
            config,
            animation_frame: 0,
            max_scroll: 0,
            log_height: 0,
            client,
            request: None,
            events,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Validate the input and, if it passes, start streaming the reply
    pub fn submit(&mut self) {
        if let Some(request) = self.state.submit(Instant::now()) {
            self.start_request(request);
        }
    }

    fn start_request(&mut self, request: ChatRequest) {
        let client = self.client.clone();
        let tx = self.events.clone();
        let (cancel, token) = cancel_pair();

        let task = tokio::spawn(async move {
            let fragment_tx = tx.clone();
            let outcome = client
                .stream_reply(&request, token, move |fragment| {
                    let _ = fragment_tx.send(AppEvent::Stream(StreamEvent::Fragment(fragment)));
                })
                .await;
            // The loop may already be gone if the user quit mid-request
            let _ = tx.send(AppEvent::Stream(StreamEvent::Finished(outcome)));
        });

        self.request = Some(ActiveRequest { cancel, task });
    }

    pub fn on_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Fragment(fragment) => self.state.push_fragment(&fragment),
            StreamEvent::Finished(outcome) => {
                if self.state.finish(&outcome, Instant::now()) {
                    tracing::info!("request finished: {:?}", outcome);
                }
                self.request = None;
                self.animation_frame = 0;
            }
        }
    }

    /// Ask the in-flight request to stop. Finalization still arrives through
    /// the normal `Finished` event.
    pub fn cancel_request(&mut self) {
        if let Some(active) = &self.request {
            active.cancel.cancel();
        }
    }

    pub fn tick(&mut self) {
        self.state.tick(Instant::now());
        if self.state.is_busy() {
            self.animation_frame = self.animation_frame.wrapping_add(1);
        }
    }

    pub fn toggle_direction(&mut self) {
        let direction = self.state.toggle_direction();
        self.remember_direction(direction);
    }

    fn remember_direction(&mut self, direction: Direction) {
        self.config.default_direction = Some(direction);
        if let Err(e) = Config::save_default_direction(direction) {
            tracing::warn!("could not save default direction: {}", e);
        }
    }

    pub fn scroll(&mut self, delta: i32) {
        self.state.scroll_by(delta, self.max_scroll);
    }

    pub fn page(&self) -> i32 {
        self.log_height.max(1) as i32
    }

    /// Stop any running request before the runtime goes away
    pub fn shutdown(&mut self) {
        if let Some(active) = self.request.take() {
            active.cancel.cancel();
            active.task.abort();
        }
    }
}
