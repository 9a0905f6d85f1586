//! Event types for reporting build session activity
//!
//! Events are sent from a build session to any consumer (a transport
//! adapter, a log, a test) as each mutation is accepted.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// Trait for receiving graph events
///
/// This abstracts over the transport mechanism (channel, socket, log)
/// so sessions can be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: GraphEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted by a build session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A node was added to the graph
    #[serde(rename_all = "camelCase")]
    NodeCreated {
        session_id: String,
        name: String,
        node_type: String,
        path: String,
    },

    /// An input was wired (or deferred until its source exists)
    #[serde(rename_all = "camelCase")]
    NodesWired {
        session_id: String,
        source: String,
        target: String,
        input_index: u32,
        deferred: bool,
    },

    /// A parameter value was set
    #[serde(rename_all = "camelCase")]
    ParameterSet {
        session_id: String,
        node: String,
        parameter: String,
        value: ParamValue,
    },

    /// The session handed off its graph and was cleared
    #[serde(rename_all = "camelCase")]
    SessionFinished { session_id: String, node_count: usize },
}

/// Event sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: GraphEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Event sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<GraphEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all events received so far
    pub fn drain(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for CollectingEventSink {
    fn send(&self, event: GraphEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GraphEvent::NodesWired {
            session_id: "s1".to_string(),
            source: "box1".to_string(),
            target: "xform1".to_string(),
            input_index: 0,
            deferred: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "nodesWired");
        assert_eq!(json["inputIndex"], 0);
        assert_eq!(json["sessionId"], "s1");
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        sink.send(GraphEvent::SessionFinished {
            session_id: "s1".to_string(),
            node_count: 2,
        })
        .unwrap();
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.events().is_empty());
    }
}
