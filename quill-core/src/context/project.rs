//! Project type hints for the configured project root

use std::path::Path;

/// Describe the project rooted at `root`; empty when nothing is recognized
pub fn project_hint(root: &str) -> String {
    let root_path = Path::new(root);
    if !root_path.is_dir() {
        return String::new();
    }

    let mut out = String::new();
    let separator = if root.contains('\\') { '\\' } else { '/' };
    let base = root.trim_end_matches(['/', '\\']);

    if root_path.join("Assets").is_dir() {
        out.push_str(&format!(
            "PROJECT TYPE: Unity\nASSETS: {base}{separator}Assets\n"
        ));
        if root_path.join("Packages").is_dir() {
            out.push_str("PACKAGES DETECTED\n");
        }
        out.push('\n');
    }

    let markers = [
        ("Cargo.toml", "Rust (Cargo)"),
        ("package.json", "Node.js"),
        ("CMakeLists.txt", "CMake"),
    ];
    for (file, kind) in markers {
        if root_path.join(file).is_file() {
            out.push_str(&format!("PROJECT TYPE: {kind}\n\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn detects_unity_with_packages() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("Assets")).unwrap();
        fs::create_dir(temp.path().join("Packages")).unwrap();
        let root = temp.path().to_str().unwrap();

        let hint = project_hint(root);
        assert!(hint.starts_with("PROJECT TYPE: Unity\nASSETS: "));
        assert!(hint.contains("Assets\nPACKAGES DETECTED\n\n"));
    }

    #[test]
    fn detects_cargo_and_cmake() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Cargo.toml"), "[package]").unwrap();
        fs::write(temp.path().join("CMakeLists.txt"), "project(x)").unwrap();
        let hint = project_hint(temp.path().to_str().unwrap());
        assert_eq!(
            hint,
            "PROJECT TYPE: Rust (Cargo)\n\nPROJECT TYPE: CMake\n\n"
        );
    }

    #[test]
    fn unknown_or_missing_roots_yield_nothing() {
        let temp = tempdir().unwrap();
        assert_eq!(project_hint(temp.path().to_str().unwrap()), "");
        assert_eq!(project_hint("/definitely/not/here"), "");
    }
}
