use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::binary::{Dependency, TargetInfo, Version};
use crate::error::Error;
use crate::number::parse_with_prefix;

// ----------------------------------------------------------------------------
// Project descriptor

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub host: Option<Host>,
    pub sources: Vec<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub options: IndexMap<String, String>,
    #[serde(default)]
    pub defines: IndexMap<String, String>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base: PathBuf,
}

impl Project {
    pub fn load(path: &str) -> Result<Project, Error> {
        let file = File::open(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
        let mut project: Project = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Project(path.to_string(), e))?;
        project.base = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(project)
    }

    pub fn from_json(text: &str, base: &Path) -> Result<Project, Error> {
        let mut project: Project =
            serde_json::from_str(text).map_err(|e| Error::Project("<inline>".to_string(), e))?;
        project.base = base.to_path_buf();
        Ok(project)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| self.resolve(s)).collect()
    }

    pub fn output(&self) -> PathBuf {
        match &self.output {
            Some(out) => self.resolve(out),
            None => self.resolve(&format!("{}.bin", self.name)),
        }
    }

    pub fn options(&self) -> Result<Options, Error> {
        Options::from_map(&self.options)
    }

    /// Dependency list for the target info chunk: the target itself, then
    /// the host it runs on when executable.
    pub fn target(&self) -> Result<TargetInfo, Error> {
        let mut dependencies = vec![Dependency {
            name: self.name.clone(),
            version: Version::parse(&self.version)?,
        }];
        if self.executable {
            let host = self.host.as_ref().ok_or_else(|| {
                Error::InvalidOption("host".to_string(), "executable targets need a host".into())
            })?;
            dependencies.push(Dependency {
                name: host.name.clone(),
                version: Version::parse(&host.version)?,
            });
        }
        Ok(TargetInfo {
            executable: self.executable,
            dependencies,
        })
    }
}

// ----------------------------------------------------------------------------
// Options

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub log_label_add: bool,
    pub log_branch_resolve: bool,
    pub log_code_fold: bool,
    pub log_pad_size: bool,
    pub log_imports: bool,
    pub log_exports: bool,
    pub stack_size: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            log_label_add: false,
            log_branch_resolve: false,
            log_code_fold: false,
            log_pad_size: false,
            log_imports: false,
            log_exports: false,
            stack_size: 65536,
        }
    }
}

fn parse_switch(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::InvalidOption(
            key.to_string(),
            format!("`{value}` is not a switch value"),
        )),
    }
}

impl Options {
    pub fn from_map(map: &IndexMap<String, String>) -> Result<Options, Error> {
        let mut options = Options::default();
        for (key, value) in map {
            match key.as_str() {
                "log_label_add" => options.log_label_add = parse_switch(key, value)?,
                "log_branch_resolve" => options.log_branch_resolve = parse_switch(key, value)?,
                "log_code_fold" => options.log_code_fold = parse_switch(key, value)?,
                "log_pad_size" => options.log_pad_size = parse_switch(key, value)?,
                "log_imports" => options.log_imports = parse_switch(key, value)?,
                "log_exports" => options.log_exports = parse_switch(key, value)?,
                "stack_size" => {
                    let size = parse_with_prefix(value.trim()).map_err(|e| {
                        Error::InvalidOption(key.to_string(), format!("`{value}`: {e}"))
                    })?;
                    if size == 0 || size % 8 != 0 {
                        return Err(Error::InvalidOption(
                            key.to_string(),
                            format!("{size} is not a non-zero multiple of 8"),
                        ));
                    }
                    options.stack_size = size;
                }
                _ => {
                    return Err(Error::InvalidOption(
                        key.to_string(),
                        "unknown option".to_string(),
                    ))
                }
            }
        }
        Ok(options)
    }

    /// Every log category on.
    pub fn verbose(self) -> Options {
        Options {
            log_label_add: true,
            log_branch_resolve: true,
            log_code_fold: true,
            log_pad_size: true,
            log_imports: true,
            log_exports: true,
            ..self
        }
    }
}
