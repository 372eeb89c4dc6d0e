//! Java-style properties file store
//!
//! Line-oriented `key=value` format with backslash escapes, `#`/`!` comment
//! lines, and backslash line continuations. The default store for any file
//! whose extension is neither JSON nor YAML.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::Result;
use crate::filestore::{assert_file_readable, assert_file_writable, FileStore};

/// Header comment written at the top of every saved file.
const HEADER: &str = "# Saved from SSM";

pub struct PropertiesFileStore {
    file: PathBuf,
    bindings: IndexMap<String, String>,
}

impl PropertiesFileStore {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            bindings: IndexMap::new(),
        }
    }
}

/// Collapse physical lines into logical ones: strip comment and blank lines,
/// and join lines ending in an odd number of backslashes with the next line
/// (its leading whitespace dropped).
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        if continuing {
            current.push_str(raw.trim_start());
        } else {
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            current.push_str(trimmed);
        }

        if ends_with_odd_backslashes(&current) {
            current.pop();
            continuing = true;
        } else {
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if continuing && !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:`, space or tab.
fn split_entry(line: &str) -> (String, String) {
    let mut key_end = None;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' => {
                key_end = Some(idx);
                break;
            }
            _ => {}
        }
    }

    match key_end {
        None => (unescape(line), String::new()),
        Some(idx) => {
            let key = unescape(&line[..idx]);
            let mut rest = line[idx..].trim_start_matches([' ', '\t']);
            if let Some(stripped) = rest.strip_prefix(['=', ':']) {
                rest = stripped.trim_start_matches([' ', '\t']);
            }
            (key, unescape(rest))
        }
    }
}

fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Escape an entry component for writing. Keys escape every space; values
/// only a leading one, so embedded spaces stay readable.
fn escape(input: &str, escape_all_spaces: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for (idx, c) in input.char_indices() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000C}' => out.push_str("\\f"),
            ' ' if escape_all_spaces || idx == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}

impl FileStore for PropertiesFileStore {
    fn load(&mut self) -> Result<()> {
        self.bindings.clear();
        if !self.file.exists() {
            return Ok(());
        }
        assert_file_readable(&self.file)?;

        let text = fs::read_to_string(&self.file)?;
        for line in logical_lines(&text) {
            let (key, value) = split_entry(&line);
            self.bindings.insert(key, value);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        assert_file_writable(&self.file)?;
        let mut out = String::from(HEADER);
        out.push('\n');
        for (key, value) in &self.bindings {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        fs::write(&self.file, out)?;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    fn value(&self, key: &str) -> Option<String> {
        self.bindings.get(key).cloned()
    }

    fn put_param(&mut self, key: &str, value: &str) {
        self.bindings.insert(key.to_string(), value.to_string());
    }

    fn path(&self) -> &Path {
        &self.file
    }
}
