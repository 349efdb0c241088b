//! Shared fixtures: archives built in memory and a mocked package service

use depot_config::Config;
use depot_events::{AppEvent, EventReceiver};
use depot_hash::Md5Digest;
use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use httpmock::Mock;

/// In-memory tar builder for test artifacts
pub struct ArchiveBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    pub fn file(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, &[][..])
            .unwrap();
        self
    }

    /// Regular file whose header name is written verbatim, bypassing the
    /// checks `tar::Builder` applies to paths
    pub fn raw_file(mut self, name: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_old();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    pub fn tar(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }

    pub fn tar_gz(self) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        std::io::Write::write_all(&mut encoder, &self.tar()).unwrap();
        encoder.finish().unwrap()
    }
}

/// A single-build package service
pub struct MockService {
    pub server: MockServer,
}

impl MockService {
    pub fn start() -> Self {
        Self {
            server: MockServer::start(),
        }
    }

    /// Serve a catalog with `builds` as `(version, date, hash, filename, md5)`
    pub fn catalog(&self, product: &str, builds: &[(&str, &str, &str, &str, &str)]) -> Mock<'_> {
        let builds: Vec<_> = builds
            .iter()
            .map(|(version, date, hash, filename, md5sum)| {
                serde_json::json!({
                    "version": version,
                    "date": date,
                    "hash": hash,
                    "artifacts": [{"md5sum": md5sum, "filename": filename, "name": product}],
                    "internal": false
                })
            })
            .collect();
        let body = serde_json::json!({ "builds": builds }).to_string();
        let path = format!("/packages/{product}");
        self.server.mock(move |when, then| {
            when.method(GET).path(path).header("x-api-key", "e2e-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
    }

    /// Serve `artifact` for any download request naming `hash`
    pub fn artifact(&self, product: &str, hash: &str, artifact: &[u8]) -> Mock<'_> {
        let path = format!("/packages/{product}/download");
        let needle = format!("\"hash\":\"{hash}\"");
        let artifact = artifact.to_vec();
        self.server.mock(move |when, then| {
            when.method(GET)
                .path(path)
                .header("x-api-key", "e2e-key")
                .body_contains(needle);
            then.status(200).body(artifact);
        })
    }

    /// Configuration pointing at this server, loaded the way a user would write it
    pub fn config(&self) -> Config {
        let toml = format!(
            r#"
            [service]
            base_url = "{}"
            api_key = "e2e-key"

            [network]
            timeout = 10

            [download]
            quiet = true
            "#,
            self.server.base_url()
        );
        Config::from_toml(&toml).unwrap()
    }
}

pub fn md5_hex(data: &[u8]) -> String {
    Md5Digest::from_data(data).to_hex()
}

/// Everything sent on the channel so far
pub fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
