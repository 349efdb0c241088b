#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for depot
//!
//! This crate talks to the package service: it fetches and resolves the
//! build catalog, streams artifacts into a sink with optional resume and
//! progress output, and verifies downloaded data against published MD5
//! checksums. Nothing is retried internally; callers decide whether to run
//! an operation again.

mod catalog;
mod client;
mod download;
mod error_body;
mod service;
mod verify;

pub use client::{NetClient, NetConfig, Transport};
pub use download::{DownloadOptions, DownloadResult};
pub use error_body::summarize_error_body;
pub use service::{PackageService, API_KEY_HEADER};
pub use verify::{verify_artifact_checksum, verify_checksum, ChecksumOutcome};

#[cfg(test)]
pub(crate) mod testing {
    use crate::{PackageService, Transport};
    use depot_types::{Artifact, Build};
    use reqwest::header::HeaderMap;
    use reqwest::{Method, Request, Response};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::io;
    use std::sync::{Arc, Mutex};
    use url::Url;

    /// A request as seen by [`StubTransport`]
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: String,
        pub headers: HeaderMap,
        pub body: Option<Vec<u8>>,
    }

    type Canned = (u16, Vec<(String, String)>, Vec<u8>);

    #[derive(Default)]
    struct StubState {
        responses: Mutex<VecDeque<Canned>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    /// Transport double replaying canned responses in order
    #[derive(Clone, Default)]
    pub struct StubTransport {
        state: Arc<StubState>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, headers: &[(&str, &str)], body: &[u8]) -> Self {
            let headers = headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            self.state
                .responses
                .lock()
                .unwrap()
                .push_back((status, headers, body.to_vec()));
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.state.requests.lock().unwrap().clone()
        }
    }

    impl Transport for StubTransport {
        fn execute(
            &self,
            request: Request,
        ) -> impl Future<Output = Result<Response, reqwest::Error>> + Send {
            self.state.requests.lock().unwrap().push(RecordedRequest {
                method: request.method().clone(),
                url: request.url().to_string(),
                headers: request.headers().clone(),
                body: request
                    .body()
                    .and_then(reqwest::Body::as_bytes)
                    .map(<[u8]>::to_vec),
            });

            let (status, headers, body) = self
                .state
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no canned response left");
            let mut builder = http::Response::builder().status(status);
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
            let response = builder.body(body).unwrap();
            std::future::ready(Ok(Response::from(response)))
        }
    }

    pub fn service(stub: &StubTransport) -> PackageService<StubTransport> {
        PackageService::new(
            stub.clone(),
            Url::parse("http://depot.test").unwrap(),
            "secret",
        )
    }

    pub fn sample_build() -> Build {
        Build {
            version: "1.42.1".to_string(),
            date: "2025-05-01T00:00:00Z".parse().unwrap(),
            hash: "lastBuild".to_string(),
            artifacts: vec![Artifact {
                md5sum: String::new(),
                filename: "editor-1.42.1.tar.gz".to_string(),
                name: "Editor".to_string(),
            }],
            internal: false,
        }
    }

    pub fn catalog_json() -> String {
        serde_json::json!({
            "builds": [
                {
                    "version": "1.42.1",
                    "date": "2025-05-01T00:00:00Z",
                    "hash": "lastBuild",
                    "artifacts": [{"md5sum": "", "filename": "editor-1.42.1.tar.gz", "name": "Editor"}],
                    "internal": false
                },
                {
                    "version": "1.42.0",
                    "date": "2025-04-02T00:00:00Z",
                    "hash": "firstBuild",
                    "artifacts": [{"md5sum": "", "filename": "editor-1.42.0.tar.gz", "name": "Editor"}],
                    "internal": false
                }
            ]
        })
        .to_string()
    }

    /// Progress output that tests can read back
    #[derive(Clone, Default)]
    pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        pub fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
