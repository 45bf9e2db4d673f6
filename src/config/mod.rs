
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::errors::{Error, Result, require_config_item};
use crate::module::{ModuleClass, Resolver};

/// Environment variable naming the production config file.
pub const CONFIG_ENV: &str = "MODARGS_CONFIG_FILE";

type Section = BTreeMap<String, String>;
type ConfigLayer = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Where [`ExtendedConfig::load`] looks for files.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Must exist when given.
    pub default: Option<PathBuf>,
    pub production: Option<PathBuf>,
    /// Overrides [`CONFIG_ENV`].
    pub env_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolOrString {
    Bool(bool),
    Str(String),
}

/// Layered sectioned configuration read from JSON files of the form
/// `{ "Section": { "option": value } }`. Later files override earlier
/// options; option names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedConfig {
    sections: BTreeMap<String, Section>,
    configfiles: Vec<PathBuf>,
    modules_from_file: bool,
}

impl ExtendedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules_from_file(mut self, allowed: bool) -> Self {
        self.modules_from_file = allowed;
        self
    }

    /// Default file, then the production file: explicit, else
    /// `productionconfig.configpath` from the defaults, with the environment
    /// variable taking precedence over both.
    pub fn load(sources: &ConfigSources) -> Result<Self> {
        let mut config = Self::new();
        if let Some(default) = &sources.default {
            if !default.is_file() {
                return Err(Error::DefaultConfigNotFound(default.clone()));
            }
            debug!(file = %default.display(), "using default config");
            config.append(default);
        }

        let mut production = sources.production.clone();
        if production.is_none() && config.has_option("productionconfig", "configpath") {
            production = Some(PathBuf::from(config.get("productionconfig", "configpath")?));
        }
        let env_name = sources.env_name.as_deref().unwrap_or(CONFIG_ENV);
        if let Some(path) = std::env::var_os(env_name) {
            production = Some(PathBuf::from(path));
        }
        if let Some(production) = production {
            config.append(production);
        }
        Ok(config)
    }

    /// Record `path` and layer it on top; missing or broken files are
    /// logged and skipped.
    pub fn append(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.configfiles.push(path.to_path_buf());
        if path.as_os_str().is_empty() {
            return;
        }
        if !path.is_file() {
            warn!(
                file = %path.display(),
                "config file does not exist or is not readable"
            );
            return;
        }
        debug!(file = %path.display(), "using config file");
        let layered = fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|text| self.read_str(&text));
        if let Err(err) = layered {
            error!(file = %path.display(), %err, "error reading config file");
        }
    }

    /// Layer JSON text on top of the current values.
    pub fn read_str(&mut self, text: &str) -> Result<()> {
        let layer: ConfigLayer = serde_json::from_str(text)?;
        for (name, options) in layer {
            let section = self.sections.entry(name).or_default();
            for (option, value) in options {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                section.insert(option.to_lowercase(), value);
            }
        }
        Ok(())
    }

    pub fn configfiles(&self) -> &[PathBuf] {
        &self.configfiles
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|s| s.contains_key(&option.to_lowercase()))
    }

    pub fn get(&self, section: &str, option: &str) -> Result<&str> {
        let value = self
            .sections
            .get(section)
            .and_then(|s| s.get(&option.to_lowercase()));
        require_config_item(value, section, option).map(String::as_str)
    }

    pub fn getint(&self, section: &str, option: &str) -> Result<i64> {
        let raw = self.get(section, option)?;
        raw.trim().parse().map_err(|_| {
            Error::config(format!("[{section}] {option}: '{raw}' is not an integer"))
        })
    }

    /// `1/yes/true/on` and `0/no/false/off`, case-insensitive.
    pub fn getboolean(&self, section: &str, option: &str) -> Result<bool> {
        let raw = self.get(section, option)?;
        parse_boolean(raw)
            .ok_or_else(|| Error::config(format!("[{section}] {option}: not a boolean: '{raw}'")))
    }

    pub fn getlist(&self, section: &str, option: &str, sep: char) -> Result<Vec<String>> {
        Ok(self
            .get(section, option)?
            .split(sep)
            .map(|chunk| chunk.trim().to_string())
            .collect())
    }

    pub fn getboolean_or_string(&self, section: &str, option: &str) -> Result<BoolOrString> {
        let raw = self.get(section, option)?;
        Ok(match parse_boolean(raw) {
            Some(b) => BoolOrString::Bool(b),
            None => BoolOrString::Str(raw.to_string()),
        })
    }

    /// With an option, the class named by it. Without, the section must be
    /// a module section (`enabled` and `class`); disabled yields `None`.
    pub fn getmodule(&self, section: &str, option: Option<&str>) -> Result<Option<ModuleClass>> {
        if let Some(option) = option {
            return self.module_option(section, option).map(Some);
        }
        if !self.has_section(section) {
            return Err(Error::config(format!(
                "config section '{section}' does not exist, module not loaded"
            )));
        }
        if !self.has_option(section, "enabled") || !self.has_option(section, "class") {
            return Err(Error::config(format!(
                "section '{section}' is not a module section, missing option enabled or class"
            )));
        }
        if !self.getboolean(section, "enabled")? {
            return Ok(None);
        }
        self.module_option(section, "class").map(Some)
    }

    fn module_option(&self, section: &str, option: &str) -> Result<ModuleClass> {
        let identifier = self.get(section, option)?;
        Resolver::new()
            .with_modules_from_file(self.modules_from_file)
            .resolve(&[identifier])?
            .pop()
            .ok_or_else(|| {
                Error::config(format!(
                    "not a valid module class, section: {section}, option: {option}, value: {identifier}"
                ))
            })
    }

    /// Enabled module classes of every `"{prefix}:*"` section.
    pub fn getplugins(&self, prefix: &str) -> Result<Vec<ModuleClass>> {
        let marker = format!("{prefix}:");
        let mut plugins = Vec::new();
        for section in self.sections().filter(|s| s.starts_with(&marker)) {
            if self.getboolean(section, "enabled")? {
                plugins.push(self.module_option(section, "class")?);
            }
        }
        Ok(plugins)
    }

    /// [`ExtendedConfig::getplugins`] keyed by the class's config prefix.
    pub fn getplugins_for(&self, class: &ModuleClass) -> Result<Vec<ModuleClass>> {
        let prefix = class.config_prefix().ok_or_else(|| {
            Error::config(format!("{class} has no config prefix"))
        })?;
        self.getplugins(prefix)
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
