//! UI configuration shared by the engine (ownership) and the TUI (rendering).

/// UI configuration options derived from config/environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
    /// Freeze the spinner glyph. The visualization graph keeps animating.
    pub reduced_motion: bool,
}
