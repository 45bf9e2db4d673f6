//! Process-wide table of importable module packages and entry points.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use tracing::debug;

use super::class::{BaseModule, ModuleClass, ModuleType};
use crate::demos::{ExampleModule, HexDump};
use crate::errors::Result;
use crate::plugins::{ConfigModule, ModuleParserPlugin};

/// A named set of module classes addressable as `package.Symbol`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    name: String,
    classes: BTreeMap<String, ModuleClass>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Add a class under its own name.
    pub fn with(mut self, class: ModuleClass) -> Self {
        self.insert(class);
        self
    }

    pub fn with_type<T: ModuleType>(self) -> Self {
        self.with(T::class())
    }

    pub fn insert(&mut self, class: ModuleClass) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn get(&self, symbol: &str) -> Option<&ModuleClass> {
        self.classes.get(symbol)
    }
    pub fn classes(&self) -> impl Iterator<Item = &ModuleClass> {
        self.classes.values()
    }
}

/// A short name published for a base capability.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub name: String,
    pub class: ModuleClass,
}

impl EntryPoint {
    /// Help line: `"\t* name -> doc"`.
    pub fn description(&self) -> String {
        if self.class.doc().is_empty() {
            format!("\t* {}", self.name)
        } else {
            format!("\t* {} -> {}", self.name, self.class.doc())
        }
    }
}

#[derive(Default)]
struct Registry {
    packages: HashMap<String, Package>,
    entry_points: BTreeMap<String, BTreeMap<String, ModuleClass>>,
    file_cache: HashMap<String, Package>,
    file_loads: HashMap<String, usize>,
}

impl Registry {
    fn with_builtins() -> Self {
        let mut registry = Registry::default();
        for package in [
            Package::new("modargs.module").with_type::<BaseModule>(),
            Package::new("modargs.plugins")
                .with_type::<ModuleParserPlugin>()
                .with_type::<ConfigModule>(),
            Package::new("modargs.demos")
                .with_type::<ExampleModule>()
                .with_type::<HexDump>(),
        ] {
            registry.packages.insert(package.name().to_string(), package);
        }
        registry
            .entry_points
            .entry(ExampleModule::NAME.to_string())
            .or_default()
            .insert("hexdump".to_string(), HexDump::class());
        registry
    }
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::with_builtins()));

fn read() -> RwLockReadGuard<'static, Registry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, Registry> {
    REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

/// Make `package` importable. Every class must be a module.
pub fn register_package(package: Package) -> Result<()> {
    for class in package.classes() {
        BaseModule::check(class)?;
    }
    debug!(package = package.name(), "registered module package");
    write().packages.insert(package.name().to_string(), package);
    Ok(())
}

/// Publish `class` as `name` in `group`, conventionally a base class name.
pub fn register_entry_point(group: &str, name: &str, class: ModuleClass) -> Result<()> {
    BaseModule::check(&class)?;
    write()
        .entry_points
        .entry(group.to_string())
        .or_default()
        .insert(name.to_string(), class);
    Ok(())
}

pub fn package(name: &str) -> Option<Package> {
    read().packages.get(name).cloned()
}

/// Entry points of `group`, ordered by name.
pub fn entry_points(group: &str) -> Vec<EntryPoint> {
    read()
        .entry_points
        .get(group)
        .map(|eps| {
            eps.iter()
                .map(|(name, class)| EntryPoint {
                    name: name.clone(),
                    class: class.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// How many module files were actually read since start.
pub fn file_loads() -> usize {
    read().file_loads.values().sum()
}

/// How many times the file behind package `key` was read.
pub fn file_loads_for(key: &str) -> usize {
    read().file_loads.get(key).copied().unwrap_or(0)
}

pub(crate) fn cached_file(key: &str) -> Option<Package> {
    read().file_cache.get(key).cloned()
}

/// Cache a freshly loaded file package; a concurrent load of the same key
/// keeps the first one.
pub(crate) fn cache_file(key: &str, package: Package) -> Package {
    let mut registry = write();
    *registry.file_loads.entry(key.to_string()).or_default() += 1;
    registry
        .file_cache
        .entry(key.to_string())
        .or_insert(package)
        .clone()
}
