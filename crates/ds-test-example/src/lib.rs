use std::path::PathBuf;

use walkdir::WalkDir;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos")
}

pub fn demo_dir(name: &str) -> PathBuf {
    demos_root().join(name)
}

pub fn script_path(name: &str) -> PathBuf {
    demo_dir(name).join("script.json")
}

pub fn testcase_path(name: &str) -> PathBuf {
    demo_dir(name).join("testcase.json")
}

/// Demo directory names in sorted order.
pub fn demo_names() -> Vec<String> {
    let mut names = WalkDir::new(demos_root())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn demos_root_points_to_demos_directory() {
        assert!(demos_root().is_dir());
    }

    #[test]
    fn demo_dir_joins_name() {
        assert!(demo_dir("01-greeting").is_dir());
    }

    #[test]
    fn script_and_testcase_paths_use_default_filenames() {
        assert!(script_path("01-greeting").ends_with("script.json"));
        assert!(testcase_path("01-greeting").ends_with("testcase.json"));
    }

    #[test]
    fn demo_names_are_sorted_and_complete() {
        let names = demo_names();
        assert!(names.contains(&"01-greeting".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        for name in names {
            assert!(script_path(&name).is_file(), "{} has no script.json", name);
        }
    }
}
