use std::path::{Path, PathBuf};
use std::process::Command;

const MAX_LINES: usize = 750;

const CHECKED_EXTENSIONS: &[&str] = &["rs", "md", "yaml", "toml"];

const EXCLUDED_DIRS: &[&str] = &["target", ".git", "examples"];

const EXCLUDED_FILES: &[&str] = &["Cargo.lock"];

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/packed-refs");

    let sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=DOCKET_GIT_SHA={}", sha);

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set");
    let root = PathBuf::from(&manifest_dir);
    let files = collect_files_to_check(&root);
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    let sources: Vec<&PathBuf> = files
        .iter()
        .filter(|p| {
            p.extension().and_then(|e| e.to_str()) == Some("rs")
                && p.file_name().and_then(|n| n.to_str()) != Some("build.rs")
        })
        .collect();

    enforce_line_limits(&root, &files);
    enforce_no_dead_code_allows(&root, &sources);
    enforce_no_test_skips(&root, &sources);
    enforce_serial_for_env_mutations(&root, &sources);
}

type Violations = Vec<(PathBuf, Vec<(usize, String)>)>;

fn fail(title: &str, violations: &Violations, advice: &[&str]) -> ! {
    let total: usize = violations.iter().map(|(_, v)| v.len()).sum();
    eprintln!("\n========================================");
    eprintln!("{}", title);
    eprintln!("========================================");
    for (path, lines) in violations {
        for (line_num, msg) in lines {
            eprintln!("  {}:{}", path.display(), line_num);
            eprintln!("    {}", msg.trim());
        }
    }
    eprintln!("========================================");
    for line in advice {
        eprintln!("{}", line);
    }
    eprintln!();
    panic!("Build failed: {} ({} occurrence(s))", title, total);
}

fn enforce_line_limits(root: &Path, files: &[PathBuf]) {
    let mut violations: Violations = Vec::new();
    for file in files {
        match std::fs::read_to_string(file) {
            Ok(content) => {
                let count = content.lines().filter(|l| !l.trim().is_empty()).count();
                if count > MAX_LINES {
                    violations.push((
                        relative(root, file),
                        vec![(count, format!("{} non-empty lines", count))],
                    ));
                }
            }
            Err(e) => println!(
                "cargo:warning=Could not read file {}: {}",
                relative(root, file).display(),
                e
            ),
        }
    }

    if !violations.is_empty() {
        fail(
            &format!("FILE LINE LIMIT EXCEEDED (max {} lines)", MAX_LINES),
            &violations,
            &["Split these files into smaller modules."],
        );
    }
}

fn enforce_no_dead_code_allows(root: &Path, sources: &[&PathBuf]) {
    let mut violations: Violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let hits: Vec<(usize, String)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                    && trimmed.contains("dead_code")
            })
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect();
        if !hits.is_empty() {
            violations.push((relative(root, file), hits));
        }
    }

    if !violations.is_empty() {
        fail(
            "#[allow(dead_code)] IS NOT ALLOWED",
            &violations,
            &[
                "Delete unused code entirely.",
                "If the code is only for tests, gate it with #[cfg(test)].",
            ],
        );
    }
}

/// Walks every test function body in `content`, calling `inspect` with the
/// test name, its start line, the current line, and the brace depth.
/// `inspect` returns a violation message to stop scanning that test.
fn scan_tests(
    content: &str,
    mut inspect: impl FnMut(&str, bool, &str, i32) -> Option<String>,
) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.lines().collect();
    let mut hits = Vec::new();
    let mut in_test_fn = false;
    let mut has_serial = false;
    let mut test_fn_start = 0;
    let mut test_fn_name = String::new();
    let mut brace_depth = 0;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed == "#[serial]" || trimmed == "#[serial_test::serial]" {
            has_serial = true;
        }

        if trimmed == "#[test]" || trimmed.starts_with("#[tokio::test") {
            if let Some(sig) = lines.iter().skip(i + 1).take(4).find(|l| l.contains("fn ")) {
                test_fn_start = i + 1;
                test_fn_name = sig
                    .split("fn ")
                    .nth(1)
                    .and_then(|rest| rest.split('(').next())
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                in_test_fn = true;
                brace_depth = 0;
            }
        }

        if !in_test_fn {
            continue;
        }

        for c in line.chars() {
            match c {
                '{' => brace_depth += 1,
                '}' => {
                    brace_depth -= 1;
                    if brace_depth == 0 {
                        in_test_fn = false;
                    }
                }
                _ => {}
            }
        }

        if let Some(msg) = inspect(line, has_serial, trimmed, brace_depth) {
            hits.push((test_fn_start, format!("test `{}` {}", test_fn_name, msg)));
            in_test_fn = false;
        }
        if !in_test_fn {
            has_serial = false;
        }
    }

    hits
}

/// Bans tests that silently skip instead of failing.
fn enforce_no_test_skips(root: &Path, sources: &[&PathBuf]) {
    let skip_patterns = ["Skipping test", "skipping test", "Test skipped", "test skipped"];
    let mut violations: Violations = Vec::new();

    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let hits = scan_tests(&content, |line, _, trimmed, depth| {
            if let Some(pattern) = skip_patterns.iter().find(|p| line.contains(**p)) {
                return Some(format!("contains skip pattern: {}", pattern));
            }
            if trimmed == "return;" && depth > 1 {
                return Some("has conditional early return (silent skip)".to_string());
            }
            None
        });
        if !hits.is_empty() {
            violations.push((relative(root, file), hits));
        }
    }

    if !violations.is_empty() {
        fail(
            "SILENT TEST SKIPS ARE NOT ALLOWED",
            &violations,
            &["Tests must FAIL if they cannot run, not silently pass."],
        );
    }
}

fn enforce_serial_for_env_mutations(root: &Path, sources: &[&PathBuf]) {
    let mut violations: Violations = Vec::new();

    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let hits = scan_tests(&content, |_, has_serial, trimmed, _| {
            let mutates = !trimmed.starts_with("//")
                && (trimmed.contains("env::set_var") || trimmed.contains("env::remove_var"));
            (mutates && !has_serial).then(|| "mutates env without #[serial]".to_string())
        });
        if !hits.is_empty() {
            violations.push((relative(root, file), hits));
        }
    }

    if !violations.is_empty() {
        fail(
            "ENV MUTATIONS REQUIRE #[serial]",
            &violations,
            &["Add #[serial] from the serial_test crate to the test."],
        );
    }
}

fn relative(root: &Path, file: &Path) -> PathBuf {
    file.strip_prefix(root).unwrap_or(file).to_path_buf()
}

fn collect_files_to_check(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(output) = Command::new("git")
        .args(["ls-files"])
        .current_dir(root)
        .output()
    {
        if output.status.success() {
            if let Ok(stdout) = String::from_utf8(output.stdout) {
                files.extend(
                    stdout
                        .lines()
                        .map(|line| root.join(line))
                        .filter(|path| should_check_file(path, root)),
                );
                return files;
            }
        }
    }

    walk_directory(root, root, &mut files);
    files
}

fn walk_directory(dir: &Path, root: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let excluded = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| EXCLUDED_DIRS.contains(&name));
            if !excluded {
                walk_directory(&path, root, files);
            }
        } else if should_check_file(&path, root) {
            files.push(path);
        }
    }
}

fn should_check_file(path: &Path, root: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !CHECKED_EXTENSIONS.contains(&ext) {
        return false;
    }

    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };
    if EXCLUDED_FILES.iter().any(|f| rel_path.to_string_lossy() == *f) {
        return false;
    }
    !rel_path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
    })
}
