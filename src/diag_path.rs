use std::path::Path;

/// Path of a source file as shown in diagnostics.
///
/// Relative paths are kept. Absolute paths under `base` become relative to
/// it; any other absolute path is reduced to its file name, so generated
/// scripts and error output never carry build-machine directories.
pub fn display_path(raw: &str, base: Option<&Path>) -> String {
    let path = Path::new(raw);

    let shown = if path.is_relative() {
        raw.to_string()
    } else {
        match base.and_then(|b| path.strip_prefix(b).ok()) {
            Some(rel) => rel.to_string_lossy().to_string(),
            None => path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| raw.to_string()),
        }
    };

    shown.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_path_is_kept() {
        assert_eq!(display_path("demo/loop.shb", None), "demo/loop.shb");
    }

    #[test]
    fn backslashes_become_slashes() {
        assert_eq!(display_path("demo\\loop.shb", None), "demo/loop.shb");
    }

    #[test]
    fn absolute_under_base_is_relativized() {
        let base = PathBuf::from("/work/project");
        assert_eq!(
            display_path("/work/project/src/main.shb", Some(&base)),
            "src/main.shb"
        );
    }

    #[test]
    fn absolute_outside_base_keeps_file_name() {
        let base = PathBuf::from("/work/project");
        assert_eq!(display_path("/opt/other/lib.shb", Some(&base)), "lib.shb");
        assert_eq!(display_path("/opt/other/lib.shb", None), "lib.shb");
    }
}
