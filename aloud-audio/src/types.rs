/// Terminal result of one fragment's playback, reported by the backend.
#[derive(Debug, Clone)]
pub enum PlaybackOutcome {
    /// The fragment played through to its end.
    Completed,
    /// The audio subsystem gave up partway through the fragment.
    Failed(String),
}
