#![allow(dead_code)]

use async_trait::async_trait;
use connectors::{error::TransportError, http::client::HttpClient};
use model::http::{request::HttpRequest, response::HttpResponse};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub mod integration;
pub mod utils;

/// One scripted answer of a [`ScriptedClient`].
pub enum Step {
    Respond(HttpResponse),
    /// Answers only after `delay`, long enough to trip the request timeout.
    Stall(Duration),
    Fail(TransportError),
}

impl Step {
    pub fn json(body: &str) -> Self {
        Step::Respond(HttpResponse::new(200, body))
    }
}

/// HTTP backend replaying a fixed script. Once the script runs out it
/// answers with an empty page and, when given a token, stops the run.
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
    cancel_when_done: Option<CancellationToken>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
            cancel_when_done: None,
        })
    }

    pub fn cancelling(steps: Vec<Step>, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
            cancel_when_done: Some(cancel),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        debug!(url = %request.url, "Scripted request");

        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse::new(200, "[]"))
            }
            Some(Step::Fail(err)) => Err(err),
            None => {
                if let Some(cancel) = &self.cancel_when_done {
                    cancel.cancel();
                }
                Ok(HttpResponse::new(200, "[]"))
            }
        }
    }
}
