use serde::{Deserialize, Serialize};

/// Tuning for the generic record binder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Allow lossy cross-type assignment when binding records, e.g. an
    /// integer column into a `String` field or "42" into an `i64` field.
    /// Default: false
    #[serde(default)]
    pub weakly_typed_input: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weakly_typed_input(mut self, enabled: bool) -> Self {
        self.weakly_typed_input = enabled;
        self
    }
}
