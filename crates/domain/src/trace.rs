use serde::Serialize;

/// Structured trace events emitted across all sllmi crates.
///
/// Key material never appears here; credentials are identified by their
/// position in the configured list.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        streaming: bool,
        duration_ms: u64,
        attempts: usize,
        key_index: usize,
    },
    KeyFailover {
        provider: String,
        model: String,
        key_index: usize,
        attempt: usize,
        streaming: bool,
        error: String,
    },
    KeysExhausted {
        provider: String,
        model: String,
        streaming: bool,
        attempts: usize,
    },
    StreamCancelled {
        provider: String,
        model: String,
        chunks_sent: usize,
    },
    RegistryBuilt {
        factories: usize,
        models: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sl_event");
    }
}
