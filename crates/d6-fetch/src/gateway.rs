//! Fetch gateway

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::payload::ResponsePayload;
use crate::request::{FetchRequest, RawResponse};
use crate::transport::Transport;

pub struct FetchGateway {
    transport: Arc<dyn Transport>,
    /// Requests sent but not yet completed
    in_flight: Arc<AtomicUsize>,
}

impl FetchGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of requests still waiting for a response, so hosts can back off
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request data for `url`; `on_complete` runs once with the decoded
    /// payload whatever the outcome.
    pub fn fetch<F>(&self, url: &str, body: Option<String>, on_complete: F)
    where
        F: FnOnce(ResponsePayload) + Send + 'static,
    {
        let request = FetchRequest::data(url, body);
        let request_url = url.to_string();
        let in_flight = Arc::clone(&self.in_flight);
        let waiting = in_flight.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            url = %request.url,
            method = %request.method,
            in_flight = waiting,
            "Sending data request"
        );

        self.transport.send(
            request,
            Box::new(move |raw: RawResponse| {
                let waiting = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;

                let payload = match raw.error {
                    Some(message) => {
                        tracing::warn!(url = %request_url, error = %message, "Data request failed");
                        ResponsePayload::transport_failure(&request_url, raw.status, &message)
                    }
                    None => ResponsePayload::decode(&request_url, raw.status, &raw.text),
                };

                tracing::debug!(
                    url = %request_url,
                    status = payload.status,
                    in_flight = waiting,
                    "Received data response"
                );

                on_complete(payload);
            }),
        );
    }
}

impl Clone for FetchGateway {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use crate::transport::QueuedTransport;
    use parking_lot::Mutex;
    use serde_json::json;

    fn gateway() -> (FetchGateway, Arc<QueuedTransport>) {
        let transport = Arc::new(QueuedTransport::new());
        (FetchGateway::new(transport.clone()), transport)
    }

    fn collect() -> (
        Arc<Mutex<Vec<ResponsePayload>>>,
        impl FnOnce(ResponsePayload) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |payload| sink.lock().push(payload))
    }

    #[test]
    fn test_get_and_decode() {
        let (gateway, transport) = gateway();
        let (seen, on_complete) = collect();

        gateway.fetch("http://a.com/u", None, on_complete);
        assert_eq!(gateway.in_flight(), 1);

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.url, "http://a.com/u?d6=1");
        assert_eq!(request.method, Method::Get);

        transport.complete("http://a.com/u", RawResponse::ok(200, r#"{"d6":"home"}"#));
        assert_eq!(gateway.in_flight(), 0);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].request_url, "http://a.com/u");
        assert_eq!(seen[0].data, json!({"d6": "home"}));
    }

    #[test]
    fn test_post_with_body() {
        let (gateway, transport) = gateway();
        let (_, on_complete) = collect();

        gateway.fetch("http://a.com/save?d6=5", Some("a=1".to_string()), on_complete);

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_deref(), Some("a=1"));
        assert_eq!(request.url, "http://a.com/save?d6=5&d6=1");
    }

    #[test]
    fn test_failures_use_completion_path() {
        let (gateway, transport) = gateway();
        let (seen, first) = collect();
        let second = {
            let sink = Arc::clone(&seen);
            move |payload| sink.lock().push(payload)
        };

        gateway.fetch("http://a.com/broken", None, first);
        gateway.fetch("http://a.com/down", None, second);
        assert_eq!(gateway.in_flight(), 2);

        transport.complete("http://a.com/broken", RawResponse::ok(500, "oops"));
        transport.complete("http://a.com/down", RawResponse::failed("connection reset"));
        assert_eq!(gateway.in_flight(), 0);

        let seen = seen.lock();
        assert_eq!(seen[0].status, 500);
        assert_eq!(seen[0].data, json!("oops"));
        assert!(seen[0].error.is_some());
        assert_eq!(seen[1].error.as_deref(), Some("connection reset"));
    }
}
