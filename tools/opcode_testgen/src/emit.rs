//! Renders the generated Odin test file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TestgenError};
use crate::index::{LeafEntry, QualifiedName};

pub const TEST_HEADER: &str = "// This file is generated!
package tests

import \"core:testing\"
";

/// Test procedure name suffix for `name`; `f6.7` becomes `f6_7`.
pub fn symbol_name(name: &QualifiedName) -> String {
    name.as_str().replace('.', "_")
}

/// One `@(test)` declaration, including its leading blank line.
pub fn render_case(testdata_prefix: &str, name: &QualifiedName, entry: &LeafEntry) -> String {
    format!(
        "
@(test)
opcode_{sym} :: proc(t: ^testing.T) {{
\trun_opcode_tests(t, \"{prefix}/{file}.json\", transmute(Flags)u16({mask}))
}}
",
        sym = symbol_name(name),
        prefix = testdata_prefix.trim_end_matches('/'),
        file = name,
        mask = entry.flags_mask(),
    )
}

/// Sole writer of the generated test file.
pub struct Emitter {
    path: PathBuf,
    testdata_prefix: String,
}

impl Emitter {
    /// Truncate `path` and write [`TEST_HEADER`].
    pub fn create(path: impl Into<PathBuf>, testdata_prefix: impl Into<String>) -> Result<Self> {
        let path = path.into();
        fs::write(&path, TEST_HEADER).map_err(|e| TestgenError::io(&path, e))?;
        Ok(Self {
            path,
            testdata_prefix: testdata_prefix.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, name: &QualifiedName, entry: &LeafEntry) -> Result<()> {
        let case = render_case(&self.testdata_prefix, name, entry);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| TestgenError::io(&self.path, e))?;
        file.write_all(case.as_bytes())
            .map_err(|e| TestgenError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_declaration_block_verbatim() {
        let name = QualifiedName::parse("04").unwrap();
        let entry = LeafEntry::new("normal", Some(63));
        assert_eq!(
            render_case("src/tests/testdata", &name, &entry),
            "\n@(test)\nopcode_04 :: proc(t: ^testing.T) {\n\trun_opcode_tests(t, \"src/tests/testdata/04.json\", transmute(Flags)u16(63))\n}\n"
        );
    }

    #[test]
    fn sub_entries_get_underscored_symbols_and_default_mask() {
        let name = QualifiedName::parse("f6.3").unwrap();
        let entry = LeafEntry::new("normal", None);
        let case = render_case("src/tests/testdata/", &name, &entry);
        assert!(case.contains("opcode_f6_3 :: proc"));
        assert!(case.contains("\"src/tests/testdata/f6.3.json\""));
        assert!(case.contains("u16(65535)"));
    }

    #[test]
    fn create_truncates_and_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("opcodes.odin");
        fs::write(&out, "stale contents").unwrap();

        let emitter = Emitter::create(&out, "td").unwrap();
        for n in ["01", "00"] {
            emitter
                .append(&QualifiedName::parse(n).unwrap(), &LeafEntry::new("normal", Some(1)))
                .unwrap();
        }

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with(TEST_HEADER));
        assert!(!text.contains("stale"));
        let first = text.find("opcode_01").unwrap();
        let second = text.find("opcode_00").unwrap();
        assert!(first < second);
    }
}
