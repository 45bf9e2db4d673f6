//! Class-scoped computed properties for module classes.
//!
//! A [`ClassProperty`] is read with the owning [`ModuleClass`] as receiver;
//! writing one without a setter fails with
//! [`Error::AttributeNotSettable`].


use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::arg::{ArgumentSet, SubModuleSlot};
use crate::errors::{Error, Result};
use crate::module::ModuleClass;
use crate::module::class::lock;

pub struct ClassProperty<V> {
    name: &'static str,
    getter: fn(&ModuleClass) -> V,
    setter: Option<fn(&ModuleClass, V)>,
}

impl<V> ClassProperty<V> {
    pub const fn new(name: &'static str, getter: fn(&ModuleClass) -> V) -> Self {
        Self {
            name,
            getter,
            setter: None,
        }
    }

    pub const fn with_setter(mut self, setter: fn(&ModuleClass, V)) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, class: &ModuleClass) -> V {
        (self.getter)(class)
    }

    pub fn set(&self, class: &ModuleClass, value: V) -> Result<()> {
        let setter = self
            .setter
            .ok_or_else(|| Error::AttributeNotSettable(self.name.to_string()))?;
        setter(class, value);
        Ok(())
    }
}

type Store<V> = Mutex<HashMap<ModuleClass, V>>;

fn empty_store<V>() -> Store<V> {
    Mutex::new(HashMap::new())
}

/// Per-class values backing settable properties; usable as a `static`.
pub struct ClassStore<V> {
    values: Lazy<Store<V>>,
}

impl<V: Clone> ClassStore<V> {
    pub const fn new() -> Self {
        Self {
            values: Lazy::new(empty_store::<V>),
        }
    }

    /// The value stored for exactly this class; subclasses do not inherit.
    pub fn get(&self, class: &ModuleClass) -> Option<V> {
        lock(&self.values).get(class).cloned()
    }

    pub fn set(&self, class: &ModuleClass, value: V) {
        lock(&self.values).insert(class.clone(), value);
    }
}

impl<V: Clone> Default for ClassStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The class's argument set.
pub static PARSER: ClassProperty<Result<ArgumentSet>> =
    ClassProperty::new("PARSER", |class| class.parser());

/// The class's declared sub-module slots.
pub static MODULES: ClassProperty<Result<Vec<SubModuleSlot>>> =
    ClassProperty::new("MODULES", |class| class.modules());

/// The config section the class reads, see
/// [`ModuleClass::config_section_name`].
pub static CONFIG_SECTION: ClassProperty<String> =
    ClassProperty::new("config_section", |class| class.config_section_name());
