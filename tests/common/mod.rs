//! Shared harness: a wiremock server driven from plain (blocking) tests.
//!
//! The server runs on its own thread; the runtime here is only used to
//! start it, mount mocks and inspect received requests. Test bodies call the
//! blocking `ApiClient` from the test thread, outside any async context.

#![allow(dead_code)]

use serde_json::Value;
use solvebio::Session;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

// Field order matters: the server is dropped before the runtime.
pub struct TestServer {
    pub server: MockServer,
    pub rt: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let rt = Runtime::new().expect("tokio runtime");
        let server = rt.block_on(MockServer::start());
        TestServer { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }

    pub fn session(&self, api_key: Option<&str>) -> Session {
        Session::new(&self.uri(), api_key.map(str::to_string))
    }
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("json body")
}
