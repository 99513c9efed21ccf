//! Outbound dispatch of a reading to the IoT endpoint.
//!
//! One synchronous POST of the serialized reading. Non-success statuses and
//! transport faults are reported as outcomes, never propagated as panics or
//! process exits.

use std::time::Duration;

use crate::core::reading::SensorReading;

/// Upper bound for one outbound request, connect included
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 2xx response; body echoed to the operator
    Accepted { status: u16, body: String },
    /// Completed request with a non-success status
    Rejected { status: u16, body: String },
    /// The request never completed (bad URL, DNS, connect, I/O)
    Transport(String),
}

/// POST the reading to `endpoint` as JSON and classify the outcome.
pub fn dispatch(endpoint: &str, reading: &SensorReading) -> DispatchOutcome {
    let endpoint = match url::Url::parse(endpoint) {
        Ok(parsed) => parsed,
        Err(err) => return DispatchOutcome::Transport(format!("Invalid endpoint URL: {err}")),
    };

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(DISPATCH_TIMEOUT))
        .build()
        .new_agent();

    match agent.post(endpoint.as_str()).send_json(reading) {
        Ok(mut response) => {
            let status = response.status();
            let body = response
                .body_mut()
                .read_to_string()
                .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
            if status.is_success() {
                DispatchOutcome::Accepted {
                    status: status.as_u16(),
                    body,
                }
            } else {
                DispatchOutcome::Rejected {
                    status: status.as_u16(),
                    body,
                }
            }
        }
        Err(err) => DispatchOutcome::Transport(err.to_string()),
    }
}
