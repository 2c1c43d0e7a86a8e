//! File classification by extension: category and language tag.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Coarse file category used for splitter selection and query-time filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileCategory {
    Code,
    Document,
    Config,
    Other,
}

impl FileCategory {
    /// Identifier stored in the vector payload's `file_type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "CODE",
            Self::Document => "DOCUMENT",
            Self::Config => "CONFIG",
            Self::Other => "OTHER",
        }
    }

}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CODE_EXTENSIONS: &[&str] = &[
    "java", "kt", "scala", "groovy", "py", "rb", "php", "go", "rs", "c", "cpp", "cc", "cxx", "h",
    "hpp", "cs", "vb", "js", "jsx", "ts", "tsx", "vue", "svelte", "sh", "bash", "sql",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "text", "rst", "adoc", "asciidoc", "pdf", "doc", "docx",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "json",
    "yaml",
    "yml",
    "toml",
    "ini",
    "xml",
    "properties",
    "conf",
    "config",
    "env",
    "gitignore",
    "dockerignore",
];

const EXTENSION_TO_LANGUAGE: &[(&str, &str)] = &[
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("groovy", "Groovy"),
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("c", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("h", "C/C++"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("sql", "SQL"),
];

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Classify a file path into its category.
#[must_use]
pub fn classify(path: &str) -> FileCategory {
    let ext = extension(path);
    if CODE_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Code
    } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Document
    } else if CONFIG_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Config
    } else {
        FileCategory::Other
    }
}

/// Human-readable language tag for a file path; `"Unknown"` when unmapped.
#[must_use]
pub fn detect_language(path: &str) -> &'static str {
    let ext = extension(path);
    EXTENSION_TO_LANGUAGE
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or("Unknown", |(_, lang)| lang)
}
