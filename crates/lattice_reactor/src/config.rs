//! Configuration for the build reactor.

/// Configuration for a build.
///
/// Controls the fixpoint kill switches. The defaults are far above anything
/// a well-formed module set reaches; they exist to turn a runaway plugin
/// into a structured failure instead of a hang.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReactorConfig {
    /// Maximum fixpoint passes per phase before the build is aborted.
    pub max_passes: u32,
    /// Maximum inference actions one source may register.
    pub max_actions: usize,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            max_passes: 1000,
            max_actions: 100_000,
        }
    }
}

impl ReactorConfig {
    /// Creates a configuration with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the per-phase fixpoint pass limit.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Builder method to set the per-source inference action limit.
    #[must_use]
    pub fn with_max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }
}
