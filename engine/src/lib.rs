//! Core engine for hwdiag - session state machine, visualization and configuration.
//!
//! This crate contains the [`App`] facade without TUI dependencies. The
//! presentation layer reads everything it draws from `App` and feeds user
//! intent back through it; it never touches the network directly.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

pub use hwdiag_client::{
    ClientError, DiagnosisBackend, DiagnosisClient, EndpointConfig, MapError, UpstreamPayload,
};
pub use hwdiag_types::{
    Confidence, DiagnosticResult, EmptyStringError, ErrorInfo, FailureKind, NonEmptyString, Phase,
    ReasoningStep, RequestSeq, Severity, Symptom, ui::UiOptions,
};

mod config;
mod input;
mod session;
pub mod visualization;

pub use config::{
    AppSection, ConfigError, ENDPOINT_URL_ENV, EndpointSection, HwdiagConfig, MAX_TIMEOUT_SECS,
    TIMEOUT_SECS_ENV, config_path, session_deadline,
};
pub use input::DraftInput;
pub use session::{
    PROCESSING_STAGE, PhaseSignal, SessionController, SessionSnapshot, SubmitOutcome,
};
pub use visualization::{CanvasSize, VisualizationEngine};

/// Descriptors shown under the visualization.
pub const ENGINE_INFO: [(&str, &str); 2] = [
    ("Neural Layer", "Gemini 2.0 Flash"),
    ("Symbolic Layer", "Forward Chaining"),
];

/// Mutable access to the draft, granted only while no request is in flight.
pub enum DraftMut<'a> {
    Active(&'a mut DraftInput),
    Locked,
}

pub struct App {
    input: DraftInput,
    session: SessionController,
    visualization: VisualizationEngine,
    ui_options: UiOptions,
    endpoint_url: String,
    frame: u64,
    should_quit: bool,
}

impl App {
    /// Build the app from an optional config file, with environment overrides.
    pub fn new(config: Option<HwdiagConfig>) -> anyhow::Result<Self> {
        let config = config.unwrap_or_default();
        let endpoint = config.endpoint_config();
        let deadline = session_deadline(&endpoint);
        let endpoint_url = endpoint.url().to_string();
        tracing::info!(endpoint = %endpoint_url, timeout = ?endpoint.timeout(), "Using diagnosis endpoint");

        let client = DiagnosisClient::new(endpoint).context("building diagnosis client")?;
        let mut app = Self::with_backend(Arc::new(client), deadline, config.ui_options());
        app.endpoint_url = endpoint_url;
        Ok(app)
    }

    /// Build the app around any backend. Used by tests and alternative transports.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn DiagnosisBackend>,
        deadline: Duration,
        ui_options: UiOptions,
    ) -> Self {
        Self {
            input: DraftInput::default(),
            session: SessionController::new(backend, deadline),
            visualization: VisualizationEngine::new(),
            ui_options,
            endpoint_url: String::new(),
            frame: 0,
            should_quit: false,
        }
    }

    /// Attach the visualization to this session. Call once the canvas size is known.
    pub fn mount_visualization(&mut self, size: CanvasSize) {
        self.visualization.mount(self.session.phase_signal(), size);
    }

    pub fn unmount_visualization(&mut self) -> bool {
        self.visualization.unmount()
    }

    /// Submit the current draft. The draft is kept so it can be refined.
    pub fn submit_input(&mut self) -> SubmitOutcome {
        let outcome = self.session.submit(self.input.text());
        if outcome == SubmitOutcome::IgnoredBlank {
            tracing::debug!("Ignoring blank description");
        }
        outcome
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.session.dismiss_error()
    }

    /// One frame of work: apply completed requests, then advance the animation.
    pub fn tick(&mut self) {
        self.session.process_completions();
        self.visualization.tick();
        self.frame = self.frame.wrapping_add(1);
    }

    /// Wait for the outstanding request to settle, then tick once.
    pub async fn settle(&mut self) -> Phase {
        let phase = self.session.settle().await;
        self.tick();
        phase
    }

    pub fn draft_mut(&mut self) -> DraftMut<'_> {
        if self.session.phase().is_processing() {
            DraftMut::Locked
        } else {
            DraftMut::Active(&mut self.input)
        }
    }

    #[must_use]
    pub fn draft(&self) -> &DraftInput {
        &self.input
    }

    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    #[must_use]
    pub fn result(&self) -> Option<&DiagnosticResult> {
        self.session.result()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.session.error()
    }

    #[must_use]
    pub fn processing_stage(&self) -> Option<&'static str> {
        self.session.processing_stage()
    }

    #[must_use]
    pub fn visualization(&self) -> &VisualizationEngine {
        &self.visualization
    }

    pub fn visualization_mut(&mut self) -> &mut VisualizationEngine {
        &mut self.visualization
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    /// Empty when the app was built around a custom backend.
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Frames ticked so far. Drives the spinner.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
