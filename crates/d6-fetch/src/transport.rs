//! Network transports

use parking_lot::Mutex;
use std::time::Duration;

use d6_navigation::cache_key;

use crate::error::FetchError;
use crate::request::{FetchRequest, Method, RawResponse};
use crate::Result;

pub type Completion = Box<dyn FnOnce(RawResponse) + Send + 'static>;

/// Sends a request and reports its outcome exactly once.
pub trait Transport: Send + Sync {
    fn send(&self, request: FetchRequest, on_complete: Completion);
}

/// Transport backed by reqwest on a tokio runtime
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
}

impl HttpTransport {
    pub fn new(runtime: tokio::runtime::Handle, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, runtime })
    }

    /// Use the runtime the caller is running on
    pub fn current(user_agent: &str) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FetchError::NoRuntime(e.to_string()))?;
        Self::new(runtime, user_agent)
    }

    async fn execute(client: reqwest::Client, request: FetchRequest) -> RawResponse {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = match builder.send().await {
            Ok(r) => r,
            Err(e) => return RawResponse::failed(&e.to_string()),
        };

        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(text) => RawResponse {
                status,
                text,
                error: None,
            },
            Err(e) => RawResponse {
                status,
                text: String::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: FetchRequest, on_complete: Completion) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let response = Self::execute(client, request).await;
            on_complete(response);
        });
    }
}

/// Transport that holds requests until the host completes them.
///
/// Requests can be completed in any order, which makes out-of-order
/// arrivals reproducible.
#[derive(Default)]
pub struct QueuedTransport {
    queue: Mutex<Vec<(FetchRequest, Completion)>>,
    sent: Mutex<Vec<FetchRequest>>,
}

impl QueuedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request ever sent, in send order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.sent.lock().clone()
    }

    /// Requests still waiting for a response
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Complete the oldest waiting request for `url` (with or without the
    /// data marker). Returns false when nothing matched.
    pub fn complete(&self, url: &str, response: RawResponse) -> bool {
        let key = cache_key(url);
        let entry = {
            let mut queue = self.queue.lock();
            let index = queue
                .iter()
                .position(|(request, _)| request.url == url || cache_key(&request.url) == key);
            index.map(|i| queue.remove(i))
        };

        // The queue lock is released before the completion runs
        match entry {
            Some((_, on_complete)) => {
                on_complete(response);
                true
            }
            None => false,
        }
    }

    /// Complete the oldest waiting request
    pub fn complete_next(&self, response: RawResponse) -> bool {
        let entry = {
            let mut queue = self.queue.lock();
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };

        match entry {
            Some((_, on_complete)) => {
                on_complete(response);
                true
            }
            None => false,
        }
    }
}

impl Transport for QueuedTransport {
    fn send(&self, request: FetchRequest, on_complete: Completion) {
        self.sent.lock().push(request.clone());
        self.queue.lock().push((request, on_complete));
    }
}
