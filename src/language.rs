//! Maps file names to the language identifier sent to the tokenizer.

use std::path::Path;

/// Language identifier for a file, or `None` when it should stay unstyled.
///
/// The identifier is what syntect resolves by token: usually the extension.
pub fn detect_language(file_name: &str) -> Option<String> {
    // Renames display as "old → new"; the new name decides
    let name = file_name.rsplit(" → ").next().unwrap_or(file_name);
    let path = Path::new(name);
    let base = path.file_name().and_then(|n| n.to_str()).unwrap_or(name);

    match base {
        "Dockerfile" | "Containerfile" => return Some("dockerfile".to_string()),
        "Makefile" | "GNUmakefile" | "makefile" => return Some("make".to_string()),
        "CMakeLists.txt" => return Some("cmake".to_string()),
        _ => {}
    }

    let ext = path.extension().and_then(|e| e.to_str())?;
    let lang = match ext {
        "mjs" | "cjs" => "js",
        "mts" | "cts" => "ts",
        "yml" => "yaml",
        "h" | "hpp" | "hh" | "cc" | "cxx" => "cpp",
        "bash" | "zsh" => "sh",
        "markdown" => "md",
        other => other,
    };
    Some(lang.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language_rust() {
        assert_eq!(detect_language("src/main.rs").as_deref(), Some("rs"));
    }

    #[test]
    fn test_detect_language_aliases() {
        assert_eq!(detect_language("a/b.mjs").as_deref(), Some("js"));
        assert_eq!(detect_language("ci.yml").as_deref(), Some("yaml"));
        assert_eq!(detect_language("x.hpp").as_deref(), Some("cpp"));
    }

    #[test]
    fn test_detect_language_well_known_names() {
        assert_eq!(detect_language("docker/Dockerfile").as_deref(), Some("dockerfile"));
        assert_eq!(detect_language("Makefile").as_deref(), Some("make"));
    }

    #[test]
    fn test_detect_language_no_extension() {
        assert_eq!(detect_language("LICENSE"), None);
    }

    #[test]
    fn test_detect_language_rename_uses_new_name() {
        assert_eq!(detect_language("notes.txt → notes.md").as_deref(), Some("md"));
    }
}
