//! Project detection: tsconfig path aliases, Tailwind version, framework,
//! CSS entry file and layout file

use semver::VersionReq;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Tailwind major versions the transforms know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TailwindVersion {
    V3,
    V4,
}

impl TailwindVersion {
    pub fn from_major(major: u64) -> Option<Self> {
        match major {
            0..=3 => Some(TailwindVersion::V3),
            4 => Some(TailwindVersion::V4),
            _ => None,
        }
    }
}

impl fmt::Display for TailwindVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailwindVersion::V3 => write!(f, "v3"),
            TailwindVersion::V4 => write!(f, "v4"),
        }
    }
}

/// Directories never searched when looking for project files
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", ".next", "dist", "build", "out"];

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: HashMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: HashMap<String, String>,
}

/// Detect the Tailwind major version from `package.json`
pub fn detect_tailwind_version(root: &Path) -> Option<TailwindVersion> {
    let package = read_package_json(root)?;
    let spec = package
        .dependencies
        .get("tailwindcss")
        .or_else(|| package.dev_dependencies.get("tailwindcss"))?;
    tailwind_version_from_spec(spec)
}

/// Major version of a package.json version spec (`^4.1.0`, `~3.4`, `4`)
fn tailwind_version_from_spec(spec: &str) -> Option<TailwindVersion> {
    let req = VersionReq::parse(spec.trim()).ok()?;
    let major = req.comparators.first()?.major;
    TailwindVersion::from_major(major)
}

/// Frameworks that change how fonts are installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    /// Next.js with the `app/` router
    NextApp,
    NextPages,
    Other,
}

impl Framework {
    pub fn is_next(self) -> bool {
        matches!(self, Framework::NextApp | Framework::NextPages)
    }
}

fn read_package_json(root: &Path) -> Option<PackageJson> {
    let content = std::fs::read_to_string(root.join("package.json")).ok()?;
    serde_json::from_str(&content).ok()
}

/// Detect the framework from `package.json` and the directory layout
pub fn detect_framework(root: &Path) -> Framework {
    let Some(package) = read_package_json(root) else {
        return Framework::Other;
    };
    if !package.dependencies.contains_key("next") && !package.dev_dependencies.contains_key("next") {
        return Framework::Other;
    }
    if root.join("app").is_dir() || root.join("src/app").is_dir() {
        Framework::NextApp
    } else {
        Framework::NextPages
    }
}

/// The root layout of a Next.js app router project
pub fn find_layout_file(root: &Path, tsx: bool) -> Option<PathBuf> {
    let ext = if tsx { "tsx" } else { "jsx" };
    ["src/app", "app"]
        .iter()
        .map(|dir| root.join(dir).join(format!("layout.{}", ext)))
        .find(|path| path.is_file())
}

/// Path alias table from tsconfig/jsconfig `compilerOptions.paths`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsPaths {
    /// Directory the targets are relative to (`baseUrl`)
    pub base_dir: PathBuf,
    /// `(pattern, first target)` pairs in declaration order
    pub paths: Vec<(String, String)>,
}

#[derive(Debug, Default, Deserialize)]
struct TsConfig {
    #[serde(default, rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Default, Deserialize)]
struct CompilerOptions {
    #[serde(default, rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<indexmap::IndexMap<String, Vec<String>>>,
}

/// Load path aliases from `tsconfig.json` or `jsconfig.json`
pub fn load_ts_paths(root: &Path) -> Option<TsPaths> {
    ["tsconfig.json", "jsconfig.json"].iter().find_map(|file| {
        let content = std::fs::read_to_string(root.join(file)).ok()?;
        let cleaned = strip_json_comments(&content);
        let config: TsConfig = serde_json::from_str(&cleaned).ok()?;
        let options = config.compiler_options?;
        let base_dir = root.join(options.base_url.as_deref().unwrap_or("."));
        let paths = options
            .paths?
            .into_iter()
            .filter_map(|(pattern, targets)| targets.into_iter().next().map(|t| (pattern, t)))
            .collect();
        Some(TsPaths { base_dir, paths })
    })
}

impl TsPaths {
    /// Resolve an import specifier through the alias table
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        for (pattern, target) in &self.paths {
            if let Some(prefix) = pattern.strip_suffix('*') {
                if let Some(rest) = specifier.strip_prefix(prefix) {
                    let target = target.replace('*', rest);
                    return Some(normalize(&self.base_dir.join(target)));
                }
            } else if pattern == specifier {
                return Some(normalize(&self.base_dir.join(target)));
            }
        }
        None
    }
}

/// Find the CSS file that imports Tailwind, relative to `root`
pub fn find_tailwind_css(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !IGNORED_DIRS
                    .iter()
                    .any(|ignored| entry.file_name() == std::ffi::OsStr::new(ignored))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().map(|e| e == "css").unwrap_or(false)
        })
        .find(|entry| {
            std::fs::read_to_string(entry.path())
                .map(|content| {
                    content.contains("@tailwind base") || content.contains("@import \"tailwindcss\"")
                })
                .unwrap_or(false)
        })
        .and_then(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
}

/// Whether the project keeps its sources under `src/`
pub fn has_src_dir(root: &Path) -> bool {
    root.join("src").is_dir()
}

/// Remove `//` and `/* */` comments and trailing commas from JSON-with-comments
pub fn strip_json_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_string = false;
    let mut start = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            b'"' => {
                in_string = true;
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&input[start..i]);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                start = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&input[start..i]);
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                start = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&input[start.min(input.len())..]);
    remove_trailing_commas(&out)
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Lexically normalize `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
