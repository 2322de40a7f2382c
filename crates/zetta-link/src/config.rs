use std::time::Duration;

use zetta_frame::FrameConfig;

/// Protocol instance configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkConfig {
    /// Wire format settings.
    pub frame: FrameConfig,
    /// Discard a partial frame when no byte arrives for this long.
    ///
    /// `None` disables the check; frames may then stay half assembled
    /// indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl LinkConfig {
    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = Some(idle);
        self
    }
}
