use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use super::instance::{Module, ModuleArgs};
use crate::arg::{ArgumentSet, OptionSpec, SubModuleSlot, Value};
use crate::errors::{Error, Result};
use crate::plugins::ModuleParserPlugin;

/// Populates a class's fresh argument set.
pub type ArgumentsHook = fn(&mut ArgumentSet) -> Result<()>;
pub type Constructor = fn(ModuleArgs) -> Result<Box<dyn Module>>;

struct ClassDef {
    name: String,
    package: String,
    doc: String,
    parent: Option<ModuleClass>,
    config_prefix: Option<String>,
    arguments: Option<ArgumentsHook>,
    defaults: Vec<(String, Value)>,
    constructor: Constructor,
    state: OnceCell<Mutex<ArgumentSet>>,
}

/// Cheap handle to a module class. Two handles are equal only when they
/// point at the same class.
#[derive(Clone)]
pub struct ModuleClass {
    def: Arc<ClassDef>,
}

static CLASSES: Lazy<Mutex<HashMap<TypeId, ModuleClass>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn construct<T: ModuleType>(args: ModuleArgs) -> Result<Box<dyn Module>> {
    Ok(Box::new(T::from_args(args)?))
}

fn first_line(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

impl ModuleClass {
    /// The class token of `T`, created once per type.
    pub fn of<T: ModuleType>() -> ModuleClass {
        let id = TypeId::of::<T>();
        if let Some(class) = lock(&CLASSES).get(&id) {
            return class.clone();
        }
        // built outside the lock: resolving the parent takes it again
        let class = ModuleClass {
            def: Arc::new(ClassDef {
                name: T::NAME.to_string(),
                package: T::PACKAGE.to_string(),
                doc: first_line(T::DOC),
                parent: T::parent(),
                config_prefix: T::CONFIG_PREFIX.map(String::from),
                arguments: T::arguments(),
                defaults: Vec::new(),
                constructor: construct::<T>,
                state: OnceCell::new(),
            }),
        };
        lock(&CLASSES).entry(id).or_insert(class).clone()
    }

    /// A class declared at runtime (module manifests) that reuses its
    /// parent's constructor and arguments hook.
    pub(crate) fn declared(
        name: &str,
        package: &str,
        parent: ModuleClass,
        doc: Option<&str>,
        config_prefix: Option<&str>,
        defaults: Vec<(String, Value)>,
    ) -> ModuleClass {
        ModuleClass {
            def: Arc::new(ClassDef {
                name: name.to_string(),
                package: package.to_string(),
                doc: doc.map(first_line).unwrap_or_default(),
                constructor: parent.def.constructor,
                parent: Some(parent),
                config_prefix: config_prefix.map(String::from),
                arguments: None,
                defaults,
                state: OnceCell::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
    pub fn package(&self) -> &str {
        &self.def.package
    }
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.def.package, self.def.name)
    }
    /// First line of the class documentation.
    pub fn doc(&self) -> &str {
        &self.def.doc
    }
    pub fn parent(&self) -> Option<&ModuleClass> {
        self.def.parent.as_ref()
    }

    /// This class followed by its parents, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &ModuleClass> {
        std::iter::successors(Some(self), |c| c.parent())
    }

    pub fn is_subclass_of(&self, other: &ModuleClass) -> bool {
        self.ancestors().any(|c| c == other)
    }
    pub fn is_strict_subclass_of(&self, other: &ModuleClass) -> bool {
        self != other && self.is_subclass_of(other)
    }
    pub fn is_module(&self) -> bool {
        self.is_subclass_of(&BaseModule::class())
    }
    pub fn is_plugin(&self) -> bool {
        self.is_subclass_of(&ModuleParserPlugin::class())
    }

    /// Nearest configured prefix in the ancestry.
    pub fn config_prefix(&self) -> Option<&str> {
        self.ancestors().find_map(|c| c.def.config_prefix.as_deref())
    }

    /// `"{prefix}:{Name}"`, or just the name without a prefix.
    pub fn config_section_name(&self) -> String {
        match self.config_prefix() {
            Some(prefix) => format!("{prefix}:{}", self.name()),
            None => self.name().to_string(),
        }
    }

    fn arguments_hook(&self) -> Option<ArgumentsHook> {
        self.ancestors().find_map(|c| c.def.arguments)
    }

    fn state(&self) -> Result<&Mutex<ArgumentSet>> {
        self.def.state.get_or_try_init(|| {
            let mut set = ArgumentSet::new(self.qualified_name());
            if let Some(hook) = self.arguments_hook() {
                hook(&mut set)?;
            }
            for (dest, value) in &self.def.defaults {
                set.set_default(dest, value.clone())?;
            }
            debug!(class = %self, options = set.options().len(), "argument set created");
            Ok(Mutex::new(set))
        })
    }

    /// Run `f` against this class's own argument set, creating it first.
    pub fn with_arguments<R>(&self, f: impl FnOnce(&mut ArgumentSet) -> R) -> Result<R> {
        let state = self.state()?;
        let mut guard = lock(state);
        Ok(f(&mut guard))
    }

    /// Snapshot of the class's argument set.
    pub fn parser(&self) -> Result<ArgumentSet> {
        self.with_arguments(|set| set.clone())
    }

    /// Declared sub-module slots.
    pub fn modules(&self) -> Result<Vec<SubModuleSlot>> {
        self.with_arguments(|set| set.modules().to_vec())
    }

    pub fn add_argument(&self, spec: OptionSpec) -> Result<()> {
        self.with_arguments(|set| set.add_argument(spec))?
    }

    /// Declare an option selecting a sub-module that extends `baseclass`.
    pub fn declare_sub_module(&self, spec: OptionSpec, baseclass: ModuleClass) -> Result<()> {
        self.with_arguments(|set| set.add_module(spec, baseclass))?
    }

    /// Build an instance from tokens and keyword overrides.
    pub fn instantiate(&self, tokens: &[String], overrides: &[(&str, Value)]) -> Result<Box<dyn Module>> {
        let args = ModuleArgs::parse(self, tokens, overrides)?;
        (self.def.constructor)(args)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PartialEq for ModuleClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}
impl Eq for ModuleClass {}

impl Hash for ModuleClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.def) as usize).hash(state);
    }
}

impl fmt::Debug for ModuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.qualified_name())
    }
}

impl fmt::Display for ModuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// A Rust type that is a module class.
pub trait ModuleType: Module + Sized {
    const NAME: &'static str;
    const PACKAGE: &'static str;
    const DOC: &'static str = "";
    const CONFIG_PREFIX: Option<&'static str> = None;

    /// `None` only for the root of the hierarchy.
    fn parent() -> Option<ModuleClass>;

    /// Adds the class's own options; inherited by subclasses that define none.
    fn arguments() -> Option<ArgumentsHook> {
        None
    }

    fn from_args(args: ModuleArgs) -> Result<Self>;

    fn class() -> ModuleClass {
        ModuleClass::of::<Self>()
    }

    fn new(tokens: &[String], overrides: &[(&str, Value)]) -> Result<Self> {
        Self::from_args(ModuleArgs::parse(&Self::class(), tokens, overrides)?)
    }
}

/// Root of all modules. Owns no arguments.
pub struct BaseModule {
    args: ModuleArgs,
}

impl Module for BaseModule {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for BaseModule {
    const NAME: &'static str = "BaseModule";
    const PACKAGE: &'static str = "modargs.module";
    const DOC: &'static str = "Base class for modules that bring their own arguments.";

    fn parent() -> Option<ModuleClass> {
        None
    }
    fn from_args(args: ModuleArgs) -> Result<Self> {
        Ok(Self { args })
    }
}

impl BaseModule {
    /// Fail unless `class` extends `BaseModule`.
    pub fn check(class: &ModuleClass) -> Result<()> {
        if class.is_module() {
            Ok(())
        } else {
            Err(Error::NotAModule(class.qualified_name()))
        }
    }
}
