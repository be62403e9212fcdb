//! Source transform toolchains.
//!
//! A [`Toolchain`] turns an entry source into one self-contained script. The
//! builtin toolchain bundles side-effect imports (`import './language/go';`)
//! depth-first, wraps the result in an IIFE that publishes the entry's main
//! binding as a global, optionally strips comments and indentation, and can
//! embed a line-level inline source map. Projects with
//! richer module graphs configure an external bundler instead.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::build::BuildConfig;
use crate::config::{ToolchainConfig, ToolchainKind};

/// Options for a single compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Strip comments, indentation and blank lines
    pub minify: bool,
    /// Append an inline source map
    pub source_map: bool,
    /// Wrap the bundle in a function scope
    pub wrap: bool,
    /// Binding the wrapped bundle publishes on the global object
    pub export: Option<String>,
}

impl CompileOptions {
    /// Options for the primary entry of a build.
    pub fn primary(config: &BuildConfig) -> Self {
        Self {
            minify: config.minify(),
            source_map: config.embed_source_map(),
            wrap: true,
            export: None,
        }
    }

    /// Options for the generated module manifest (always minified, no map).
    pub fn manifest() -> Self {
        Self { minify: true, source_map: false, wrap: false, export: None }
    }

    /// Publish `name` from the wrapped bundle.
    pub fn with_export(mut self, name: Option<&str>) -> Self {
        self.export = name.map(str::to_string);
        self
    }
}

/// Error raised by a toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: cannot resolve import '{specifier}'", path.display())]
    UnresolvedImport { path: PathBuf, line: usize, specifier: String },
    #[error("{}:{line}: unsupported import form; the builtin toolchain only bundles side-effect imports", path.display())]
    UnsupportedImport { path: PathBuf, line: usize },
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed { program: String, status: std::process::ExitStatus, stderr: String },
    #[error("'{program}' produced output that is not valid UTF-8")]
    NonUtf8Output { program: String },
    #[error("failed to encode source map: {0}")]
    SourceMap(#[from] serde_json::Error),
}

/// Compiles an entry file into bundle text.
pub trait Toolchain {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Compile `entry` and return the bundle.
    fn compile(&self, entry: &Path, options: &CompileOptions) -> Result<String, ToolchainError>;
}

/// Create the toolchain selected by configuration.
pub fn toolchain_for(config: &ToolchainConfig) -> Box<dyn Toolchain> {
    match config.kind {
        ToolchainKind::Builtin => Box::new(BuiltinToolchain::new()),
        ToolchainKind::Command => Box::new(CommandToolchain::from_config(config)),
    }
}

const SOURCE_MAP_PREFIX: &str = "//# sourceMappingURL=data:application/json;charset=utf-8;base64,";

fn side_effect_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]\s*;?\s*$"#).expect("valid import regex")
    })
}

fn binding_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*import\s[^'"]*\bfrom\s*['"]"#).expect("valid import regex"))
}

/// One output line and the source line it came from.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    origin: Option<(usize, usize)>,
}

impl Line {
    fn synthetic(text: &str) -> Self {
        Self { text: text.to_string(), origin: None }
    }
}

#[derive(Debug, Default)]
struct Bundle {
    sources: Vec<PathBuf>,
    contents: Vec<String>,
    seen: HashSet<PathBuf>,
    lines: Vec<Line>,
}

/// In-process bundler for side-effect-only module graphs.
#[derive(Debug, Clone, Default)]
pub struct BuiltinToolchain;

impl BuiltinToolchain {
    pub fn new() -> Self {
        Self
    }

    fn collect(&self, path: &Path, bundle: &mut Bundle) -> Result<(), ToolchainError> {
        let io_error = |source| ToolchainError::Io { path: path.to_path_buf(), source };

        // Each file is evaluated once, like an ES module
        let key = fs::canonicalize(path).map_err(io_error)?;
        if !bundle.seen.insert(key) {
            return Ok(());
        }

        let text = fs::read_to_string(path).map_err(io_error)?;
        let index = bundle.sources.len();
        bundle.sources.push(path.to_path_buf());
        bundle.contents.push(text.clone());

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for (n, line) in text.lines().enumerate() {
            if let Some(caps) = side_effect_import().captures(line) {
                let specifier = &caps[1];
                let target = resolve_specifier(dir, specifier).ok_or_else(|| {
                    ToolchainError::UnresolvedImport {
                        path: path.to_path_buf(),
                        line: n + 1,
                        specifier: specifier.to_string(),
                    }
                })?;
                self.collect(&target, bundle)?;
            } else if binding_import().is_match(line) {
                return Err(ToolchainError::UnsupportedImport {
                    path: path.to_path_buf(),
                    line: n + 1,
                });
            } else {
                bundle.lines.push(Line { text: line.to_string(), origin: Some((index, n)) });
            }
        }

        Ok(())
    }
}

impl Toolchain for BuiltinToolchain {
    fn name(&self) -> &str {
        "builtin"
    }

    fn compile(&self, entry: &Path, options: &CompileOptions) -> Result<String, ToolchainError> {
        let mut bundle = Bundle::default();
        self.collect(entry, &mut bundle)?;

        let mut lines = std::mem::take(&mut bundle.lines);
        if options.minify {
            lines = minify(lines);
        }
        if options.wrap {
            wrap(&mut lines, options.export.as_deref());
        }

        let mut output = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
        if options.source_map {
            let map = source_map(entry, &bundle, &lines)?;
            output.push('\n');
            output.push_str(SOURCE_MAP_PREFIX);
            output.push_str(&base64::engine::general_purpose::STANDARD.encode(map));
        }
        output.push('\n');

        tracing::debug!(
            entry = %entry.display(),
            files = bundle.sources.len(),
            bytes = output.len(),
            "bundled with builtin toolchain"
        );
        Ok(output)
    }
}

/// Enclose the bundle in a function scope.
///
/// With an export name the scope receives the global object and assigns the
/// binding to it, so scripts concatenated after the bundle can use it.
fn wrap(lines: &mut Vec<Line>, export: Option<&str>) {
    match export {
        Some(name) => {
            lines.insert(0, Line::synthetic("(function (root) {"));
            lines.push(Line {
                text: format!("if (typeof {0} !== 'undefined') {{ root.{0} = {0}; }}", name),
                origin: None,
            });
            lines.push(Line::synthetic("}(typeof globalThis !== 'undefined' ? globalThis : this));"));
        }
        None => {
            lines.insert(0, Line::synthetic("(function () {"));
            lines.push(Line::synthetic("}());"));
        }
    }
}

/// Resolve a relative import specifier, trying a `.js` extension.
fn resolve_specifier(dir: &Path, specifier: &str) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }

    let candidate = dir.join(specifier);
    if candidate.is_file() {
        return Some(candidate);
    }

    let mut with_ext = OsString::from(candidate.as_os_str());
    with_ext.push(".js");
    let with_ext = PathBuf::from(with_ext);
    with_ext.is_file().then_some(with_ext)
}

/// Drop whole-line comments, indentation and blank lines.
///
/// Only comments that start a line are removed, so comment-like text inside
/// strings and regular expressions survives. `/*!` comments are kept.
fn minify(lines: Vec<Line>) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    let mut in_block = false;

    for line in lines {
        let mut text = line.text.trim();

        if in_block {
            match text.find("*/") {
                Some(end) => {
                    in_block = false;
                    text = text[end + 2..].trim();
                }
                None => continue,
            }
        } else if text.starts_with("/*") && !text.starts_with("/*!") {
            match text[2..].find("*/") {
                Some(end) => text = text[end + 4..].trim(),
                None => {
                    in_block = true;
                    continue;
                }
            }
        }

        if text.is_empty() || text.starts_with("//") {
            continue;
        }
        out.push(Line { text: text.to_string(), origin: line.origin });
    }

    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceMap<'a> {
    version: u8,
    file: String,
    sources: Vec<String>,
    sources_content: &'a [String],
    names: Vec<String>,
    mappings: String,
}

fn source_map(entry: &Path, bundle: &Bundle, lines: &[Line]) -> Result<String, ToolchainError> {
    let root = entry.parent().unwrap_or_else(|| Path::new(""));
    let sources = bundle
        .sources
        .iter()
        .map(|p| {
            let relative = p.strip_prefix(root).unwrap_or(p);
            relative.to_string_lossy().replace('\\', "/")
        })
        .collect();

    let map = SourceMap {
        version: 3,
        file: entry.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        sources,
        sources_content: &bundle.contents,
        names: Vec::new(),
        mappings: line_mappings(lines),
    };
    Ok(serde_json::to_string(&map)?)
}

/// Encode one segment per generated line pointing at column 0 of its source line.
fn line_mappings(lines: &[Line]) -> String {
    let mut mappings = String::new();
    let mut prev_source = 0i64;
    let mut prev_line = 0i64;

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            mappings.push(';');
        }
        if let Some((source, original_line)) = line.origin {
            let (source, original_line) = (source as i64, original_line as i64);
            encode_vlq(0, &mut mappings);
            encode_vlq(source - prev_source, &mut mappings);
            encode_vlq(original_line - prev_line, &mut mappings);
            encode_vlq(0, &mut mappings);
            prev_source = source;
            prev_line = original_line;
        }
    }

    mappings
}

fn encode_vlq(value: i64, out: &mut String) {
    const DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = vlq & 31;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 32;
        }
        out.push(DIGITS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Runs an external bundler and captures the bundle from stdout.
///
/// The entry path is passed as the last argument. Wrapping is left to the
/// bundler's own arguments.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    program: String,
    args: Vec<String>,
    minify_args: Vec<String>,
    sourcemap_args: Vec<String>,
}

impl CommandToolchain {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            minify_args: Vec::new(),
            sourcemap_args: Vec::new(),
        }
    }

    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self {
            program: config.command.clone().unwrap_or_default(),
            args: config.args.clone(),
            minify_args: config.minify_args.clone(),
            sourcemap_args: config.sourcemap_args.clone(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Arguments for one compilation, entry last.
    pub fn command_line(&self, entry: &Path, options: &CompileOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        if options.minify {
            args.extend(self.minify_args.iter().map(OsString::from));
        }
        if options.source_map {
            args.extend(self.sourcemap_args.iter().map(OsString::from));
        }
        args.push(entry.as_os_str().to_os_string());
        args
    }
}

impl Toolchain for CommandToolchain {
    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, entry: &Path, options: &CompileOptions) -> Result<String, ToolchainError> {
        let args = self.command_line(entry, options);
        tracing::debug!(program = %self.program, ?args, "running external toolchain");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolchainError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(ToolchainError::CommandFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ToolchainError::NonUtf8Output { program: self.program.clone() })
    }
}
