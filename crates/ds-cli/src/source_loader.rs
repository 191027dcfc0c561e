use std::fs;
use std::path::{Path, PathBuf};

use ds_core::DialogueError;

use crate::{map_cli_source_path, map_cli_source_read, LoadedScript};

const SCRIPT_REF_PREFIX: &str = "script-file:";
const DIRECTORY_SCRIPT_NAME: &str = "script.json";

/// Loads a JSON script. A directory is accepted when it holds a
/// `script.json`, which is how the demos are laid out.
pub(crate) fn load_script_by_path(script: &str) -> Result<LoadedScript, DialogueError> {
    let path = resolve_script_path(script)?;
    let script_json = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    let title = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(LoadedScript {
        id: make_script_id(&path),
        title,
        script_json,
    })
}

pub(crate) fn load_script_by_ref(script_ref: &str) -> Result<LoadedScript, DialogueError> {
    let Some(raw) = script_ref.strip_prefix(SCRIPT_REF_PREFIX) else {
        return Err(DialogueError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported script ref: {}", script_ref),
        ));
    };
    load_script_by_path(raw)
}

pub(crate) fn resolve_script_path(script: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(script);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("script does not exist: {}", absolute.display()),
        ));
    }

    if absolute.is_dir() {
        let inner = absolute.join(DIRECTORY_SCRIPT_NAME);
        if !inner.is_file() {
            return Err(DialogueError::new(
                "CLI_SOURCE_NOT_FILE",
                format!(
                    "directory has no {}: {}",
                    DIRECTORY_SCRIPT_NAME,
                    absolute.display()
                ),
            ));
        }
        return Ok(inner);
    }

    Ok(absolute)
}

pub(crate) fn make_script_id(path: &Path) -> String {
    format!("{}{}", SCRIPT_REF_PREFIX, path.display())
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn load_script_by_ref_validates_ref_prefix() {
        let error = load_script_by_ref("unknown:main").expect_err("invalid ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");

        let error = load_script_by_ref("").expect_err("empty ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
    }

    #[test]
    fn resolve_script_path_validates_existence_and_directory() {
        let missing = temp_path("missing-script.json");
        let error = resolve_script_path(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FOUND");

        let empty_dir = temp_path("empty-script-dir");
        fs::create_dir_all(&empty_dir).expect("dir");
        let error = resolve_script_path(empty_dir.to_string_lossy().as_ref())
            .expect_err("directory without script should fail");
        assert_eq!(error.code, "CLI_SOURCE_NOT_FILE");

        let demo = demo_dir("01-greeting");
        let resolved = resolve_script_path(&demo).expect("demo dir should resolve");
        assert!(resolved.ends_with("script.json"));
    }

    #[test]
    fn load_script_by_path_and_ref_agree() {
        let loaded = load_script_by_path(&demo_dir("01-greeting")).expect("load should pass");
        assert!(loaded.id.starts_with("script-file:"));
        assert_eq!(loaded.title, "01-greeting");
        assert!(loaded.script_json.contains("\"nodes\""));

        let by_ref = load_script_by_ref(&loaded.id).expect("load by ref should pass");
        assert_eq!(by_ref.id, loaded.id);
        assert_eq!(by_ref.script_json, loaded.script_json);
    }

    #[test]
    fn make_script_id_is_stable() {
        let path = temp_path("id-script.json");
        assert_eq!(make_script_id(&path), make_script_id(&path));
    }
}
