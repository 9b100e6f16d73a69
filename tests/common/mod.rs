#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use retro::error::RemoteError;
use retro::model::{SystemDefinition, Systems};
use retro::remote::{Remote, RemoteBody};

/// In-memory stand-in for the listing servers.
#[derive(Default)]
pub struct FakeRemote {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    pub ignore_range: bool,
    truncate_at: Mutex<Option<usize>>,
    offsets: Mutex<Vec<u64>>,
    requests: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_file(mut self, url: &str, data: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), data);
        self
    }

    /// Cut the next body short after `bytes` bytes.
    pub fn truncate_next(&self, bytes: usize) {
        *self.truncate_at.lock().unwrap() = Some(bytes);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }

    fn missing(url: &str) -> RemoteError {
        RemoteError::Status { url: url.to_string(), status: 404 }
    }
}

impl Remote for FakeRemote {
    fn fetch_text(&self, url: &str) -> Result<String, RemoteError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| Self::missing(url))
    }

    fn content_length(&self, url: &str) -> Result<u64, RemoteError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.files.get(url).map(|data| data.len() as u64).ok_or_else(|| Self::missing(url))
    }

    fn open(&self, url: &str, offset: u64) -> Result<RemoteBody, RemoteError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.offsets.lock().unwrap().push(offset);
        let data = self.files.get(url).ok_or_else(|| Self::missing(url))?;

        let resumed = offset > 0 && !self.ignore_range;
        let mut body = if resumed { data[offset as usize..].to_vec() } else { data.clone() };
        if let Some(limit) = self.truncate_at.lock().unwrap().take() {
            body.truncate(limit);
        }
        Ok(RemoteBody { resumed, reader: Box::new(Cursor::new(body)) })
    }
}

pub fn system(id: &str, formats: &[&str]) -> SystemDefinition {
    SystemDefinition {
        id: id.to_string(),
        name: id.to_uppercase(),
        urls: vec![format!("https://example.org/{id}/")],
        formats: formats.iter().map(|format| format.to_string()).collect(),
    }
}

pub fn systems(definitions: Vec<SystemDefinition>) -> Systems {
    definitions.into_iter().collect()
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
