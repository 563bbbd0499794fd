/*!
 * Tests for treedump functionality
 */

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::{tempdir, TempDir};

use crate::cancel::CancellationToken;
use crate::config::{Config, Mode};
use crate::error::Result;
use crate::matcher::{FilterSet, TargetSet};
use crate::pipeline::{Generator, RunStatus, INTERRUPTED_MARKER};
use crate::progress::{NullProgress, ProgressSink};
use crate::scanner::{ExcludePolicy, ExclusionWalker, IncludePolicy, InclusionWalker};
use crate::types::{Node, ScanResult, Tree, WarningKind};
use crate::writer::STOP_MARKER;

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())
}

// A project tree with a bit of everything: nested folders, ignorable
// directories, log files, an empty folder
fn setup_test_directory() -> io::Result<TempDir> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("proj");

    write_file(&root.join("README.md"), "# Project\n")?;
    write_file(&root.join("notes.log"), "started\n")?;
    write_file(&root.join(".git").join("config"), "[core]\n")?;
    write_file(&root.join(".git").join("objects").join("ab"), "blob")?;
    write_file(&root.join("src").join("main.py"), "print('main')\n")?;
    write_file(&root.join("src").join("util.py"), "X = 1\n")?;
    write_file(&root.join("src").join("gen").join("out.py"), "# generated\n")?;
    write_file(&root.join("src").join("core").join("a.rs"), "fn a() {}\n")?;
    write_file(
        &root.join("src").join("core").join("deep").join("b.rs"),
        "fn b() {}\n",
    )?;
    write_file(&root.join("docs").join("guide.md"), "guide\n")?;
    fs::create_dir_all(root.join("docs").join("empty"))?;
    write_file(&root.join("build").join("out").join("app.o"), "\u{0}")?;
    write_file(&root.join("tests").join("test_main.py"), "assert True\n")?;

    Ok(temp_dir)
}

// The three-file project used for the end-to-end report checks
fn setup_small_project() -> io::Result<TempDir> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("proj");

    write_file(&root.join("README.md"), "hi")?;
    write_file(&root.join("src").join("main.py"), "print(1)")?;
    write_file(&root.join("src").join("util.py"), "x = 2")?;
    write_file(&root.join(".git").join("HEAD"), "ref: refs/heads/main")?;
    write_file(&root.join("debug.log"), "noise")?;

    Ok(temp_dir)
}

fn exclusion_scan(root: &Path, ignore: &str) -> Result<ScanResult> {
    let walker = ExclusionWalker::new(
        root,
        ExcludePolicy::new(FilterSet::parse(ignore)),
        CancellationToken::new(),
        Arc::new(NullProgress),
    )?;
    Ok(walker.scan(true)?)
}

fn inclusion_scan(root: &Path, items: &str, exts: &str) -> Result<ScanResult> {
    let walker = InclusionWalker::new(
        root,
        IncludePolicy::new(TargetSet::parse(items, exts)),
        CancellationToken::new(),
        Arc::new(NullProgress),
    )?;
    Ok(walker.scan(true)?)
}

fn tree_files(tree: &Tree) -> BTreeSet<String> {
    tree.file_paths().into_iter().collect()
}

fn listed_files(result: &ScanResult) -> BTreeSet<String> {
    result
        .files
        .iter()
        .flatten()
        .map(|file| file.rel.clone())
        .collect()
}

fn generator(config: Config) -> Generator {
    Generator::new(config, CancellationToken::new(), Arc::new(NullProgress))
}

// Tree leaves and the flat list agree for every kind of ignore token
#[test]
fn test_exclusion_tree_matches_file_list() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");

    for ignore in [
        "",
        ".git",
        ".git|*.log",
        "src/gen|build",
        ".py",
        "src|docs/guide.md",
        "core",
        "README.md|tests",
    ] {
        let result = exclusion_scan(&root, ignore)?;
        assert_eq!(
            tree_files(&result.tree),
            listed_files(&result),
            "ignore set {:?}",
            ignore
        );
    }
    Ok(())
}

// Target item and extension strings covering folders, paths, files and
// extensions alone or combined
const TARGET_COMBOS: [(&str, &str); 8] = [
    ("src", ""),
    ("", "py"),
    ("src|README.md", "md"),
    ("src/core", ""),
    ("docs/guide.md", ""),
    ("tests", "py"),
    ("docs", ""),
    ("", ""),
];

// Same agreement for the target-driven walk
#[test]
fn test_inclusion_tree_matches_file_list() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");

    for (items, exts) in TARGET_COMBOS {
        let result = inclusion_scan(&root, items, exts)?;
        assert_eq!(
            tree_files(&result.tree),
            listed_files(&result),
            "targets {:?} / {:?}",
            items,
            exts
        );
    }
    Ok(())
}

#[test]
fn test_file_list_is_sorted() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let result = exclusion_scan(&temp_dir.path().join("proj"), ".git")?;
    let files = result.files.unwrap_or_default();

    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);

    let nested = files
        .iter()
        .find(|file| file.rel == "src/core/deep/b.rs")
        .map(|file| file.path.clone());
    assert_eq!(
        nested.map(fs::canonicalize).transpose()?,
        Some(fs::canonicalize(
            temp_dir.path().join("proj/src/core/deep/b.rs")
        )?)
    );
    Ok(())
}

#[test]
fn test_scan_is_repeatable() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");

    let first = exclusion_scan(&root, ".git|*.log")?;
    let second = exclusion_scan(&root, ".git|*.log")?;
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.files, second.files);
    Ok(())
}

#[test]
fn test_include_scan_is_repeatable() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");

    for (items, exts) in TARGET_COMBOS {
        let first = inclusion_scan(&root, items, exts)?;
        let second = inclusion_scan(&root, items, exts)?;
        assert_eq!(first.tree, second.tree, "targets {:?} / {:?}", items, exts);
        assert_eq!(first.files, second.files, "targets {:?} / {:?}", items, exts);
    }
    Ok(())
}

#[test]
fn test_ignored_directory_is_empty_node() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let result = exclusion_scan(&temp_dir.path().join("proj"), ".git")?;

    assert_eq!(result.tree.get(".git"), Some(&Node::Directory(Tree::new())));
    assert!(result
        .files
        .unwrap_or_default()
        .iter()
        .all(|file| !file.rel.starts_with(".git/")));
    Ok(())
}

#[test]
fn test_directories_sort_before_files() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let result = exclusion_scan(&temp_dir.path().join("proj"), "")?;

    let names: Vec<&str> = result.tree.iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec![".git", "build", "docs", "src", "tests", "notes.log", "README.md"]
    );
    Ok(())
}

#[test]
fn test_cancel_before_scan() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let token = CancellationToken::new();
    token.cancel();

    let root = temp_dir.path().join("proj");
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let record = Arc::clone(&seen);
    let sink: Arc<dyn ProgressSink> =
        Arc::new(move |msg: &str| record.lock().unwrap().push(msg.to_string()));

    let mut walker = ExclusionWalker::new(&root, ExcludePolicy::default(), token, sink)?;
    assert_eq!(walker.root(), fs::canonicalize(&root)?.as_path());

    assert!(walker.scan_tree().is_err());
    assert!(walker.list_files().is_err());
    assert!(walker.warnings().is_empty());
    assert!(seen.lock().unwrap().is_empty());
    assert!(walker.scan(true).is_err());
    Ok(())
}

#[test]
fn test_include_prunes_unmatched_branches() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let result = inclusion_scan(&temp_dir.path().join("proj"), "src", "")?;

    let names: Vec<&str> = result.tree.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["src"]);
    assert!(listed_files(&result).contains("src/gen/out.py"));
    assert!(!listed_files(&result).contains("README.md"));
    Ok(())
}

#[test]
fn test_include_keeps_targeted_empty_directory() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");
    fs::create_dir_all(root.join("assets"))?;

    let result = inclusion_scan(&root, "assets", "")?;
    assert_eq!(
        result.tree.get("assets"),
        Some(&Node::Directory(Tree::new()))
    );
    assert!(listed_files(&result).is_empty());

    // untargeted empty folders below a target are dropped
    let result = inclusion_scan(&root, "docs", "")?;
    match result.tree.get("docs") {
        Some(Node::Directory(docs)) => assert!(docs.get("empty").is_none()),
        other => panic!("unexpected docs node: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_include_by_extension_only() -> Result<()> {
    let temp_dir = setup_test_directory()?;
    let result = inclusion_scan(&temp_dir.path().join("proj"), "", "md")?;

    let expected: BTreeSet<String> = ["README.md", "docs/guide.md"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(listed_files(&result), expected);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_contained() -> Result<()> {
    use std::os::unix::fs::symlink;

    let temp_dir = setup_test_directory()?;
    let root = temp_dir.path().join("proj");
    write_file(&temp_dir.path().join("outside.txt"), "secret")?;

    symlink(temp_dir.path().join("outside.txt"), root.join("escape.txt"))?;
    symlink(root.join("missing.txt"), root.join("dangling.txt"))?;
    symlink(root.join("README.md"), root.join("readme-link.md"))?;
    symlink(root.join("src"), root.join("src-link"))?;

    let result = exclusion_scan(&root, ".git")?;
    let files = listed_files(&result);

    assert!(!files.contains("escape.txt"));
    assert!(!files.contains("dangling.txt"));
    assert!(files.contains("readme-link.md"));
    assert!(files.iter().all(|path| !path.starts_with("src-link/")));
    assert_eq!(
        result.tree.get("src-link"),
        Some(&Node::Directory(Tree::new()))
    );
    assert_eq!(tree_files(&result.tree), files);

    let kinds: Vec<&WarningKind> = result.warnings.iter().map(|w| &w.kind).collect();
    assert!(kinds.contains(&&WarningKind::EscapesRoot));
    assert!(kinds.contains(&&WarningKind::BrokenSymlink));
    Ok(())
}

#[test]
fn test_generate_report_end_to_end() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let out_dir = temp_dir.path().join("outputs");

    let mut config = Config::new(temp_dir.path().join("proj"), Mode::Exclude, &out_dir);
    config.ignore = FilterSet::parse(".git|*.log");

    let outcome = generator(config).run()?;
    let output = out_dir.join("proj_hierarchy_exclude.txt");
    assert_eq!(outcome.status, RunStatus::Completed(output.clone()));
    assert_eq!(outcome.files_written, 3);

    let expected = "Hierarchy of folders and files:\n\n\
                    proj\n\
                    ├── .git\n\
                    ├── src\n\
                    │   ├── main.py\n\
                    │   └── util.py\n\
                    └── README.md\n\
                    \n\
                    Contents of files:\n\n\
                    README.md:\n```markdown\nhi\n```\n\n\
                    src/main.py:\n```python\nprint(1)\n```\n\n\
                    src/util.py:\n```python\nx = 2\n```\n\n";
    assert_eq!(fs::read_to_string(&output)?, expected);
    Ok(())
}

#[test]
fn test_hierarchy_only_report() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let out_dir = temp_dir.path().join("outputs");

    let config = Config::new(temp_dir.path().join("proj"), Mode::HierarchyOnly, &out_dir);
    let outcome = generator(config).run()?;

    let output = out_dir.join("proj_hierarchy_hierarchy-only.txt");
    assert_eq!(outcome.status.output(), Some(output.as_path()));
    assert_eq!(outcome.files_written, 0);

    let report = fs::read_to_string(&output)?;
    assert!(report.contains("└── README.md"));
    assert!(report.ends_with("File contents skipped in 'hierarchy-only' mode.\n"));
    assert!(!report.contains("Contents of files:"));
    Ok(())
}

#[test]
fn test_no_matches_placeholders() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let out_dir = temp_dir.path().join("outputs");

    let mut config = Config::new(temp_dir.path().join("proj"), Mode::Include, &out_dir);
    config.targets = TargetSet::parse("nothing_here", "");
    generator(config).run()?;

    let report = fs::read_to_string(out_dir.join("proj_hierarchy_include.txt"))?;
    assert!(report.contains("proj\n(No items to display based on filters)\n"));
    assert!(report.contains("(No files selected or found to include content)"));
    Ok(())
}

#[test]
fn test_stop_during_scan_leaves_no_report() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let out_dir = temp_dir.path().join("outputs");
    let token = CancellationToken::new();

    let trigger = token.clone();
    let sink: Arc<dyn ProgressSink> = Arc::new(move |msg: &str| {
        if msg.starts_with("Building tree") {
            trigger.cancel();
        }
    });

    let config = Config::new(temp_dir.path().join("proj"), Mode::Exclude, &out_dir);
    let outcome = Generator::new(config, token, sink).run()?;

    assert_eq!(outcome.status, RunStatus::Stopped(None));
    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn test_stop_during_write_marks_report() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let out_dir = temp_dir.path().join("outputs");
    let token = CancellationToken::new();

    let trigger = token.clone();
    let sink: Arc<dyn ProgressSink> = Arc::new(move |msg: &str| {
        if msg.starts_with("Writing content: src/main.py") {
            trigger.cancel();
        }
    });

    let mut config = Config::new(temp_dir.path().join("proj"), Mode::Exclude, &out_dir);
    config.ignore = FilterSet::parse(".git|*.log");
    let outcome = Generator::new(config, token, sink).run()?;

    let output = out_dir.join("proj_hierarchy_exclude.txt");
    assert_eq!(outcome.status, RunStatus::Stopped(Some(output.clone())));
    assert_eq!(outcome.files_written, 2);

    let report = fs::read_to_string(&output)?;
    assert!(report.contains("src/main.py:\n"));
    assert!(!report.contains("src/util.py:\n"));
    assert!(report.ends_with(&format!("{}{}", STOP_MARKER, INTERRUPTED_MARKER)));
    Ok(())
}

#[test]
fn test_repeated_runs_do_not_overwrite() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let root = temp_dir.path().join("proj");
    let out_dir = root.join("outputs");

    let first = generator(Config::new(&root, Mode::Exclude, &out_dir)).run()?;
    let second = generator(Config::new(&root, Mode::Exclude, &out_dir)).run()?;

    let first = first.status.output().map(Path::to_path_buf);
    let second = second.status.output().map(Path::to_path_buf);
    assert_eq!(first, Some(out_dir.join("proj_hierarchy_exclude.txt")));
    assert_ne!(first, second);

    // earlier reports inside the root are not scanned back in
    let report = fs::read_to_string(second.unwrap_or_default())?;
    assert!(!report.contains("outputs/proj_hierarchy_exclude.txt:"));
    Ok(())
}

#[test]
fn test_repeated_include_runs_skip_earlier_reports() -> Result<()> {
    let temp_dir = setup_small_project()?;
    let root = temp_dir.path().join("proj");
    let out_dir = root.join("outputs");

    let config = || {
        let mut config = Config::new(&root, Mode::Include, &out_dir);
        config.targets = TargetSet::parse("", "txt|md|py");
        config
    };
    let first = generator(config()).run()?;
    let second = generator(config()).run()?;

    assert_eq!(
        first.status.output(),
        Some(out_dir.join("proj_hierarchy_include.txt").as_path())
    );
    assert_eq!(second.files_written, 3);

    let report = fs::read_to_string(second.status.output().unwrap_or(Path::new("")))?;
    assert!(!report.contains("outputs"));
    assert!(!report.contains("proj_hierarchy_include.txt:"));
    assert!(report.contains("src/util.py:\n"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name_keeps_content() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("proj");
    let out_dir = temp_dir.path().join("outputs");
    write_file(
        &root.join(OsStr::from_bytes(b"caf\xe9.txt")),
        "latin name",
    )?;

    let outcome = generator(Config::new(&root, Mode::Exclude, &out_dir)).run()?;
    assert_eq!(outcome.files_written, 1);

    let report = fs::read_to_string(out_dir.join("proj_hierarchy_exclude.txt"))?;
    assert!(report.contains("caf\u{FFFD}.txt:\n```\nlatin name\n```"));
    assert!(!report.contains("File not found"));
    Ok(())
}

#[test]
fn test_invalid_root_fails_before_output() {
    let temp_dir = tempdir().unwrap();
    let out_dir = temp_dir.path().join("outputs");

    let config = Config::new(temp_dir.path().join("absent"), Mode::Exclude, &out_dir);
    let err = generator(config).run().unwrap_err();
    assert!(matches!(err, crate::error::TreeDumpError::Validation(_)));
    assert!(!out_dir.exists());
}
