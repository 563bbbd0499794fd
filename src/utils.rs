/*!
 * Utility functions for treedump
 */

use std::path::Path;

use once_cell::sync::Lazy;

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Display name of a directory, `root` when it has none (e.g. `/`)
pub fn dir_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

/// Default names and relative paths to ignore
pub static DEFAULT_IGNORE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git",
        ".svn",
        ".hg",
        ".bzr",
        // OS Files
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
        // Dependencies
        "node_modules",
        "bower_components",
        ".npm",
        ".yarn",
        ".pnpm-store",
        "package-lock.json",
        "yarn.lock",
        // Build & Dist
        "dist",
        "build",
        "out",
        "target",
        // Python
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        ".venv",
        "venv",
        // IDEs & Editors
        ".idea",
        ".vscode",
        ".vs",
        // Caches & Temp
        ".cache",
        ".sass-cache",
        ".eslintcache",
        // Other Build Tools
        ".gradle",
        // JavaScript/TypeScript
        "coverage",
        ".nyc_output",
        ".next",
        ".nuxt",
        // Terraform
        ".terraform",
    ]
});

/// Default extensions to ignore
pub static DEFAULT_IGNORE_EXTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        ".pyc", ".pyo", ".class", ".o", ".obj", ".so", ".dll", ".exe", ".log", ".tmp", ".swp",
        ".zip", ".tar", ".gz", ".tgz", ".rar", ".7z", ".jar", ".png", ".jpg", ".jpeg", ".gif",
        ".ico", ".pdf", ".sqlite", ".sqlite3", ".db",
    ]
});
