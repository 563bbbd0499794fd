/*!
 * Code-fence language hints keyed by file extension
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::error::{Result, ResultExt};
use crate::matcher::suffix;

/// Built-in extension to fence-tag table
static BUILTIN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".py", "python"),
        (".rs", "rust"),
        (".js", "javascript"),
        (".mjs", "javascript"),
        (".jsx", "jsx"),
        (".ts", "typescript"),
        (".tsx", "tsx"),
        (".java", "java"),
        (".kt", "kotlin"),
        (".c", "c"),
        (".h", "c"),
        (".cpp", "cpp"),
        (".cc", "cpp"),
        (".hpp", "cpp"),
        (".cs", "csharp"),
        (".go", "go"),
        (".rb", "ruby"),
        (".php", "php"),
        (".swift", "swift"),
        (".scala", "scala"),
        (".lua", "lua"),
        (".sh", "bash"),
        (".bash", "bash"),
        (".zsh", "bash"),
        (".ps1", "powershell"),
        (".bat", "batch"),
        (".sql", "sql"),
        (".html", "html"),
        (".htm", "html"),
        (".css", "css"),
        (".scss", "scss"),
        (".json", "json"),
        (".yaml", "yaml"),
        (".yml", "yaml"),
        (".toml", "toml"),
        (".xml", "xml"),
        (".md", "markdown"),
        (".ini", "ini"),
        (".cfg", "ini"),
        (".dockerfile", "dockerfile"),
        (".r", "r"),
        (".dart", "dart"),
        (".vue", "vue"),
    ])
});

/// Extension lookup table for fence tags
#[derive(Debug, Clone, Default)]
pub struct LanguageMap {
    overrides: HashMap<String, String>,
}

impl LanguageMap {
    /// Table with only the built-in entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the built-in table with a JSON object of `".ext": "tag"` pairs
    pub fn with_overrides_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading language map {}", path.display()))?;
        let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
        let overrides = entries
            .into_iter()
            .map(|(ext, tag)| {
                let ext = ext.to_lowercase();
                let ext = if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                };
                (ext, tag)
            })
            .collect();

        Ok(Self { overrides })
    }

    /// Fence tag for a path, empty when unknown
    pub fn hint_for(&self, rel_path: &str) -> &str {
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        let Some(ext) = suffix(name).map(|ext| ext.to_lowercase()) else {
            return "";
        };
        if let Some(tag) = self.overrides.get(&ext) {
            return tag;
        }
        BUILTIN.get(ext.as_str()).copied().unwrap_or("")
    }
}
