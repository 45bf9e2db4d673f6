use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::class::{BaseModule, ModuleClass, ModuleType};
use super::registry::{self, Package};
use crate::arg::Value;
use crate::errors::{Error, Result};

/// Rewrites identifiers before they are split into location and symbol.
pub type PathMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Something that names a module class.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleRef {
    Name(String),
    Class(ModuleClass),
}

impl From<&str> for ModuleRef {
    fn from(value: &str) -> Self {
        ModuleRef::Name(value.to_string())
    }
}

impl From<String> for ModuleRef {
    fn from(value: String) -> Self {
        ModuleRef::Name(value)
    }
}

impl From<ModuleClass> for ModuleRef {
    fn from(value: ModuleClass) -> Self {
        ModuleRef::Class(value)
    }
}

impl From<&ModuleClass> for ModuleRef {
    fn from(value: &ModuleClass) -> Self {
        ModuleRef::Class(value.clone())
    }
}

/// Split on the last `:` if there is one, else on the last `.`.
pub fn split_module_string(identifier: &str) -> Result<(String, String)> {
    let (location, symbol) = identifier
        .rsplit_once(':')
        .or_else(|| identifier.rsplit_once('.'))
        .ok_or_else(|| {
            Error::resolution(format!(
                "'{identifier}' is not a module identifier; expected 'package.Class' or 'file:Class'"
            ))
        })?;
    if location.is_empty() || symbol.is_empty() {
        return Err(Error::resolution(format!(
            "'{identifier}' has an empty location or class name"
        )));
    }
    Ok((location.to_string(), symbol.to_string()))
}

/// Turns module identifiers into classes.
#[derive(Clone, Default)]
pub struct Resolver {
    modules_from_file: bool,
    path_mapper: Option<PathMapper>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("modules_from_file", &self.modules_from_file)
            .field("path_mapper", &self.path_mapper.is_some())
            .finish()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules_from_file(mut self, allowed: bool) -> Self {
        self.modules_from_file = allowed;
        self
    }

    pub fn with_path_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.path_mapper = Some(Arc::new(mapper));
        self
    }

    pub fn modules_from_file(&self) -> bool {
        self.modules_from_file
    }

    /// Resolve every reference as a `BaseModule` subclass.
    pub fn resolve<R>(&self, refs: &[R]) -> Result<Vec<ModuleClass>>
    where
        R: Clone + Into<ModuleRef>,
    {
        self.resolve_as(refs, &BaseModule::class())
    }

    /// Resolve every reference as a subclass of `base`. The first failure
    /// aborts the whole list.
    pub fn resolve_as<R>(&self, refs: &[R], base: &ModuleClass) -> Result<Vec<ModuleClass>>
    where
        R: Clone + Into<ModuleRef>,
    {
        refs.iter()
            .map(|r| match r.clone().into() {
                ModuleRef::Name(identifier) => self.resolve_one(&identifier, base),
                ModuleRef::Class(class) => expect_subclass(class, base),
            })
            .collect()
    }

    pub fn resolve_one(&self, identifier: &str, base: &ModuleClass) -> Result<ModuleClass> {
        let mapped;
        let identifier = match &self.path_mapper {
            Some(mapper) => {
                mapped = mapper(identifier);
                mapped.as_str()
            }
            None => identifier,
        };
        let (location, symbol) = split_module_string(identifier)?;
        let package = self.load_location(&location)?;
        let class = package.get(&symbol).cloned().ok_or_else(|| {
            Error::resolution(format!("module '{location}' has no class '{symbol}'"))
        })?;
        expect_subclass(class, base)
    }

    /// Resolve a command-line value: entry point names of the `bases` first,
    /// then any resolvable identifier.
    pub fn resolve_selection(&self, value: &str, bases: &[ModuleClass]) -> Result<ModuleClass> {
        let entry_points: Vec<_> = bases
            .iter()
            .flat_map(|base| registry::entry_points(base.name()))
            .collect();
        if let Some(ep) = entry_points.iter().find(|ep| ep.name == value) {
            return Ok(ep.class.clone());
        }
        match self.resolve_one(value, &BaseModule::class()) {
            Err(Error::ModuleResolution(reason)) => {
                debug!(value, %reason, "module selection not resolvable");
                Err(Error::UnknownModule {
                    value: value.to_string(),
                    choices: entry_points.into_iter().map(|ep| ep.name).collect(),
                })
            }
            other => other,
        }
    }

    /// A registered package, or a module manifest when `location` is a file.
    pub fn load_location(&self, location: &str) -> Result<Package> {
        let path = Path::new(location);
        if path.is_file() {
            if !self.modules_from_file {
                return Err(Error::ModuleFromFileDisallowed(path.to_path_buf()));
            }
            let key = format!("modargs_file_loader_{location}");
            if let Some(package) = registry::cached_file(&key) {
                debug!(%key, "module file already loaded");
                return Ok(package);
            }
            warn!(
                file = location,
                "loading modules from files is not recommended, register a package instead"
            );
            let package = load_manifest(path, &key)?;
            return Ok(registry::cache_file(&key, package));
        }
        registry::package(location)
            .ok_or_else(|| Error::resolution(format!("no module package named '{location}'")))
    }
}

fn expect_subclass(class: ModuleClass, base: &ModuleClass) -> Result<ModuleClass> {
    if class.is_subclass_of(base) {
        Ok(class)
    } else {
        Err(Error::resolution(format!(
            "'{class}' is not a subclass of {base}"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct ModuleManifest {
    classes: BTreeMap<String, ManifestClass>,
}

#[derive(Debug, Deserialize)]
struct ManifestClass {
    extends: String,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    config_prefix: Option<String>,
    #[serde(default)]
    defaults: BTreeMap<String, serde_json::Value>,
}

/// Read a JSON manifest declaring classes that extend registered ones.
fn load_manifest(path: &Path, package_name: &str) -> Result<Package> {
    let text = fs::read_to_string(path)?;
    let manifest: ModuleManifest = serde_json::from_str(&text).map_err(|source| Error::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    // parents come from registered packages only
    let parents = Resolver::new();
    let mut package = Package::new(package_name);
    for (name, decl) in &manifest.classes {
        let parent = parents.resolve_one(&decl.extends, &BaseModule::class())?;
        let arguments = parent.parser()?;
        let mut defaults = Vec::new();
        for (dest, json) in &decl.defaults {
            let spec = arguments
                .find(dest)
                .ok_or_else(|| Error::UnknownKeyword(dest.clone()))?;
            let value = Value::from_json(spec.value_kind(), json).ok_or_else(|| {
                Error::WrongValueType {
                    key: dest.clone(),
                    value: json.to_string(),
                    expected: spec.value_kind().to_string(),
                }
            })?;
            defaults.push((dest.clone(), value));
        }
        package.insert(ModuleClass::declared(
            name,
            package_name,
            parent,
            decl.doc.as_deref(),
            decl.config_prefix.as_deref(),
            defaults,
        ));
    }
    debug!(file = %path.display(), classes = manifest.classes.len(), "module manifest loaded");
    Ok(package)
}
