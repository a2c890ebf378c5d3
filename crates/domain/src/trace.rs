use serde::Serialize;

/// Structured trace events emitted across all stationlink crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CloudCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    CredentialRefreshed {
        station: String,
        expires_at: i64,
    },
    SessionConnecting {
        station: String,
        generation: u64,
    },
    SessionConnected {
        station: String,
        address: String,
    },
    SessionDisconnected {
        station: String,
        explicit: bool,
    },
    ReconnectScheduled {
        station: String,
        delay_ms: u64,
    },
    CommandRouted {
        station: String,
        intent: String,
        command: u32,
        channel: u8,
    },
    CommandRejected {
        station: String,
        intent: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sl_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let ev = TraceEvent::ReconnectScheduled {
            station: "T8010N".into(),
            delay_ms: 5000,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "ReconnectScheduled");
        assert_eq!(json["delay_ms"], 5000);
    }
}
