#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use watchrun::config::{ProjectFile, RawProjectFile};
use watchrun::errors::Result;

/// Builder for project files, either in memory or written to disk as TOML.
#[derive(Debug, Clone, Default)]
pub struct ProjectFileBuilder {
    raw: RawProjectFile,
}

impl ProjectFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.raw.run.cmd = Some(cmd);
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw.run.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.raw.run.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.raw.watch.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.raw.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn list_cmd(mut self, cmd: Vec<String>) -> Self {
        self.raw.watch.list_cmd = Some(cmd);
        self
    }

    pub fn diagnostic_pattern(mut self, pattern: &str) -> Self {
        self.raw.watch.diagnostic_pattern = Some(pattern.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.watch.debounce_ms = Some(ms);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.raw.watch.poll_interval_ms = Some(ms);
        self
    }

    pub fn use_polling(mut self, on: bool) -> Self {
        self.raw.watch.use_polling = Some(on);
        self
    }

    pub fn wait_on_error(mut self, on: bool) -> Self {
        self.raw.watch.wait_on_error = Some(on);
        self
    }

    /// Validate as if the file lived at `path`.
    pub fn build_at(self, path: impl Into<PathBuf>) -> Result<ProjectFile> {
        ProjectFile::try_from((path.into(), self.raw))
    }

    pub fn to_toml(&self) -> String {
        let run = &self.raw.run;
        let watch = &self.raw.watch;
        let mut out = String::from("[run]\n");

        if let Some(cmd) = &run.cmd {
            out.push_str(&format!("cmd = {}\n", toml_array(cmd)));
        }
        if let Some(dir) = &run.workdir {
            out.push_str(&format!("workdir = {:?}\n", dir.to_string_lossy()));
        }

        out.push_str("\n[watch]\n");
        if !watch.include.is_empty() {
            out.push_str(&format!("include = {}\n", toml_array(&watch.include)));
        }
        if !watch.exclude.is_empty() {
            out.push_str(&format!("exclude = {}\n", toml_array(&watch.exclude)));
        }
        if let Some(cmd) = &watch.list_cmd {
            out.push_str(&format!("list_cmd = {}\n", toml_array(cmd)));
        }
        if let Some(p) = &watch.diagnostic_pattern {
            out.push_str(&format!("diagnostic_pattern = {}\n", toml_literal(p)));
        }
        if let Some(ms) = watch.debounce_ms {
            out.push_str(&format!("debounce_ms = {ms}\n"));
        }
        if let Some(ms) = watch.poll_interval_ms {
            out.push_str(&format!("poll_interval_ms = {ms}\n"));
        }
        if let Some(on) = watch.use_polling {
            out.push_str(&format!("use_polling = {on}\n"));
        }
        if let Some(on) = watch.wait_on_error {
            out.push_str(&format!("wait_on_error = {on}\n"));
        }

        if !run.env.is_empty() {
            out.push_str("\n[run.env]\n");
            for (k, v) in &run.env {
                out.push_str(&format!("{k} = {v:?}\n"));
            }
        }
        out
    }

    /// Write `Watchrun.toml` into `dir` and return its path.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        self.write_as(dir, "Watchrun.toml")
    }

    pub fn write_as(&self, dir: &Path, file_name: &str) -> io::Result<PathBuf> {
        let path = dir.join(file_name);
        fs::write(&path, self.to_toml())?;
        Ok(path)
    }
}

fn toml_array(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Literal string, so regex backslashes survive.
fn toml_literal(s: &str) -> String {
    format!("'{s}'")
}

/// Convenience for env maps in assertions.
pub fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
