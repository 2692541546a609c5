//! Run event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AgentToolCall, AgentToolResult};

/// Unique run identifier.
pub type RunId = Uuid;

/// Concrete event payloads emitted by the agent loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEventPayload {
    Started,
    AssistantDelta { text: String },
    ToolCallStarted { call: AgentToolCall },
    ToolResult { result: AgentToolResult },
    Completed { answer: String },
    Failed { error: String },
}

/// Envelope for streaming run events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: AgentEventPayload,
}

/// Callback receiving events while a run progresses.
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// Stamps payloads with the run id and a sequence number before
/// handing them to the sink.
pub(crate) struct EventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<AgentEventSink>,
}

impl EventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<AgentEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: AgentEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(AgentEvent {
            run_id: self.run_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emitter_numbers_events_from_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink: AgentEventSink =
            Arc::new(move |event: AgentEvent| captured.lock().unwrap().push(event));
        let run_id = Uuid::new_v4();
        let emitter = EventEmitter::new(run_id, Some(sink));

        emitter.emit(AgentEventPayload::Started);
        emitter.emit(AgentEventPayload::AssistantDelta { text: "hi".into() });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2]);
        assert!(seen.iter().all(|e| e.run_id == run_id));
    }

    #[test]
    fn emitter_without_sink_is_silent() {
        let emitter = EventEmitter::new(Uuid::new_v4(), None);
        emitter.emit(AgentEventPayload::Started);
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let json = serde_json::to_value(AgentEventPayload::Completed {
            answer: "done".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["answer"], "done");
    }
}
