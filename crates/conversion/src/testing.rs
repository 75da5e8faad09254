//! Test doubles for the conversion pipeline.
//!
//! Enabled for this crate's own tests and, via the `testing` feature, for
//! downstream crates that exercise the pipeline end-to-end.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use pdfrelay_attachments::{Attachment, Folder};

use crate::client::{ClientError, ConversionClient, ConversionRequest, ServiceResponse};
use crate::query::ContainerRenderer;
use crate::scheduler::{ScheduledTask, TaskScheduler};

/// A conversion client that answers from a script.
///
/// Responses are served from a queue; once the queue is empty the
/// configured default answer repeats. Every request is recorded for
/// inspection.
pub struct ScriptedClient {
    default: Result<ServiceResponse, ClientError>,
    queue: Mutex<VecDeque<Result<ServiceResponse, ClientError>>>,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl ScriptedClient {
    /// A client whose default answer is an acceptance ("ok").
    pub fn accepting() -> Self {
        Self {
            default: Ok(ServiceResponse {
                status: 200,
                body: "ok".to_string(),
            }),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose default answer is a transport error.
    pub fn failing() -> Self {
        Self {
            default: Err(ClientError::Transport("connection refused".to_string())),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-shot response served before the default kicks in.
    pub fn push_response(&self, response: Result<ServiceResponse, ClientError>) {
        self.queue.lock().unwrap().push_back(response);
    }

    /// All requests submitted so far, in order.
    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversionClient for ScriptedClient {
    async fn submit(&self, request: ConversionRequest) -> Result<ServiceResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        let scripted = self.queue.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.default.clone())
    }
}

/// A scheduler that only collects; tests crank it by hand.
///
/// This makes retry chains fully deterministic: each `run_next` call runs
/// exactly one scheduled attempt inline and reports the delay it was
/// scheduled with.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(Duration, ScheduledTask)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Delay of the next task without running it.
    pub fn next_delay(&self) -> Option<Duration> {
        self.queue.lock().unwrap().front().map(|(delay, _)| *delay)
    }

    /// Run the next task inline; returns the delay it was scheduled with.
    pub async fn run_next(&self) -> Option<Duration> {
        let entry = self.queue.lock().unwrap().pop_front();
        match entry {
            Some((delay, task)) => {
                task.await;
                Some(delay)
            }
            None => None,
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) {
        self.queue.lock().unwrap().push_back((delay, task));
    }
}

/// Renderer producing a recognizable placeholder fragment.
pub struct FakeRenderer;

impl ContainerRenderer for FakeRenderer {
    fn render(&self, attachment: &Attachment, folder: &Folder) -> String {
        format!("<container attachment=\"{}\" folder=\"{}\"/>", attachment.id, folder.id)
    }
}
