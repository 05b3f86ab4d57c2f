#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use opcode_testgen::{Config, Remote, Result};

/// In-memory corpus that records every path requested from it.
#[derive(Default)]
pub struct FakeRemote {
    files: HashMap<String, Vec<u8>>,
    calls: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(metadata: &str) -> Self {
        let mut remote = Self::new();
        remote.insert("metadata.json", metadata.as_bytes().to_vec());
        remote
    }

    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.files.insert(path.to_string(), bytes);
    }

    /// Serve `{name}.json.gz` containing a small vector document for `name`.
    pub fn insert_vectors(&mut self, name: &str) {
        self.insert(&format!("{name}.json.gz"), gzip(vectors_json(name).as_bytes()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Remote for FakeRemote {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.calls.borrow_mut().push(path.to_string());
        Ok(self.files.get(path).cloned())
    }
}

pub fn vectors_json(name: &str) -> String {
    format!(r#"[{{"name": "{name} test 0", "bytes": [0]}}]"#)
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn config_in(dir: &Path) -> Config {
    Config {
        base_url: "http://corpus.invalid/v2".to_string(),
        testdata_dir: dir.to_path_buf(),
        output_path: dir.join("opcodes.odin"),
        ..Config::default()
    }
}
