//! Generates the emulator's opcode unit-test suite from the 8088 single-step test corpus.
//!
//! A run fetches the corpus `metadata.json`, picks every opcode worth testing, makes sure its
//! test-vector JSON is present locally (downloading and unpacking the `.json.gz` on first use) and
//! writes one Odin `@(test)` procedure per opcode into a generated source file.

pub mod emit;
pub mod error;
pub mod fetch;
pub mod index;
pub mod select;

use std::path::PathBuf;

pub use crate::emit::{render_case, symbol_name, Emitter, TEST_HEADER};
pub use crate::error::{Result, TestgenError};
pub use crate::fetch::{Cache, HttpRemote, Remote};
pub use crate::index::{LeafEntry, OpcodeEntry, OpcodeIndex, QualifiedName, Status, INDEX_FILE};
pub use crate::select::{is_eligible, select, Selection, SkipRule, QUIRK_OPCODES, SKIP_RULES};

pub const DEFAULT_BASE_URL: &str = "https://github.com/virtualxt/8088/raw/main/v2";
pub const DEFAULT_TESTDATA_DIR: &str = ".";
pub const DEFAULT_OUTPUT_PATH: &str = "../opcodes.odin";
pub const DEFAULT_TESTDATA_PREFIX: &str = "src/tests/testdata";

/// Where a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Corpus root; relative corpus paths are appended to it.
    pub base_url: String,
    /// Directory holding `metadata.json` and the downloaded/unpacked test vectors.
    pub testdata_dir: PathBuf,
    /// Generated Odin test file.
    pub output_path: PathBuf,
    /// Prefix of the test-vector paths referenced from the generated file.
    pub testdata_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            testdata_dir: PathBuf::from(DEFAULT_TESTDATA_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            testdata_prefix: DEFAULT_TESTDATA_PREFIX.to_string(),
        }
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Qualified names that got a test, in emission order.
    pub emitted: Vec<QualifiedName>,
    pub excluded: usize,
    pub dropped: Vec<QualifiedName>,
}

/// Run the whole pipeline against `remote`.
///
/// The output file is only touched once the index is available; a missing index is an error.
pub fn generate<R: Remote>(config: &Config, remote: R) -> Result<GenerateReport> {
    let cache = Cache::new(&config.testdata_dir, remote);

    if !cache.ensure_local(INDEX_FILE)? {
        return Err(TestgenError::MissingIndex {
            path: cache.dir().join(INDEX_FILE),
        });
    }
    let index = OpcodeIndex::load(&cache.dir().join(INDEX_FILE))?;

    let emitter = Emitter::create(&config.output_path, config.testdata_prefix.as_str())?;
    let Selection {
        selected: emitted,
        excluded,
        dropped,
    } = select(&index, &cache, |name, entry| emitter.append(name, entry))?;

    tracing::info!(
        emitted = emitted.len(),
        excluded,
        dropped = dropped.len(),
        "wrote {}",
        emitter.path().display()
    );

    Ok(GenerateReport {
        emitted,
        excluded,
        dropped,
    })
}
