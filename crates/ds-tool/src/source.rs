use std::fs;
use std::path::Path;

use crate::{DsToolError, TestCase, TESTCASE_SCHEMA_V1};

const SCRIPT_FILE: &str = "script.json";

/// Reads `script.json` from a demo directory.
pub fn read_script(demo_dir: &Path) -> Result<String, DsToolError> {
    let path = demo_dir.join(SCRIPT_FILE);
    fs::read_to_string(&path).map_err(|source| DsToolError::ReadFile { path, source })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DsToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| DsToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| DsToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DsToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod source_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("ds-tool-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn read_script_loads_script_json() {
        let root = temp_dir("script");
        write_file(&root.join("script.json"), "{\"start\":\"s\",\"nodes\":[]}");

        let raw = read_script(&root).expect("script should be read");
        assert!(raw.contains("\"nodes\""));
    }

    #[test]
    fn read_script_reports_missing_file() {
        let root = temp_dir("no-script");
        fs::create_dir_all(&root).expect("root should be created");

        let error = read_script(&root).expect_err("missing script should fail");
        assert!(matches!(error, DsToolError::ReadFile { .. }));
    }

    #[test]
    fn read_test_case_parses_valid_json() {
        let root = temp_dir("case-ok");
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"ds-tool-case.v1",
  "actions":[],
  "expectedEvents":[{"kind":"end"}]
}"#,
        );

        let parsed = read_test_case(&case_path).expect("case should parse");
        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.expected_events.len(), 1);
    }

    #[test]
    fn read_test_case_reports_read_error() {
        let root = temp_dir("case-read-error");
        fs::create_dir_all(&root).expect("root should be created");
        let error = read_test_case(&root.join("missing.json")).expect_err("missing case should fail");
        assert!(matches!(error, DsToolError::ReadFile { .. }));
    }

    #[test]
    fn read_test_case_reports_parse_and_schema_errors() {
        let root = temp_dir("case-errors");

        let bad_json_path = root.join("bad.json");
        write_file(&bad_json_path, "{");
        let parse_error = read_test_case(&bad_json_path).expect_err("parse should fail");
        assert!(matches!(parse_error, DsToolError::ParseCase { .. }));

        let bad_schema_path = root.join("bad-schema.json");
        write_file(
            &bad_schema_path,
            r#"{
  "schemaVersion":"v0",
  "expectedEvents":[{"kind":"end"}]
}"#,
        );
        let schema_error = read_test_case(&bad_schema_path).expect_err("schema should fail");
        assert!(matches!(
            schema_error,
            DsToolError::InvalidSchemaVersion { .. }
        ));
    }
}
