use crate::config::JsConfig;

/// Configuration for one JavaScript engine
///
/// A limit of 0 leaves the QuickJS default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsEngineConfig {
    memory_limit: usize,
    max_stack_size: usize,
}

impl JsEngineConfig {
    /// Create a new JavaScript engine configuration
    ///
    /// # Arguments
    /// * `memory_limit` - Heap limit in bytes (0 = unlimited)
    /// * `max_stack_size` - Native stack limit in bytes (0 = unlimited)
    pub fn new(memory_limit: usize, max_stack_size: usize) -> Self {
        Self {
            memory_limit,
            max_stack_size,
        }
    }

    /// Heap limit in bytes, `None` when unlimited
    pub fn memory_limit(&self) -> Option<usize> {
        (self.memory_limit > 0).then_some(self.memory_limit)
    }

    /// Stack limit in bytes, `None` when unlimited
    pub fn max_stack_size(&self) -> Option<usize> {
        (self.max_stack_size > 0).then_some(self.max_stack_size)
    }
}

impl From<&JsConfig> for JsEngineConfig {
    fn from(config: &JsConfig) -> Self {
        Self::new(config.memory_limit.0, config.max_stack_size.0)
    }
}

impl Default for JsEngineConfig {
    fn default() -> Self {
        Self::from(&JsConfig::default())
    }
}
