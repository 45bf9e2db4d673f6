use std::any::Any;

use tracing::debug;

use super::class::ModuleClass;
use super::resolver::Resolver;
use crate::arg::{Namespace, Value};
use crate::errors::{Error, Result};

/// A constructed module: its class plus the values it was built with.
pub trait Module: Any {
    fn args(&self) -> &ModuleArgs;
    fn as_any(&self) -> &dyn Any;

    fn module_class(&self) -> &ModuleClass {
        self.args().class()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleArgs {
    class: ModuleClass,
    namespace: Namespace,
}

impl ModuleArgs {
    /// Parse the known `tokens` against the class's own argument set, then
    /// apply keyword `overrides` on top.
    pub fn parse(class: &ModuleClass, tokens: &[String], overrides: &[(&str, Value)]) -> Result<Self> {
        let set = class.parser()?;
        let (mut namespace, leftovers) = set
            .parse_known(tokens, &Resolver::new())
            .map_err(|err| match err {
                Error::InvalidValue { .. } | Error::UnknownModule { .. } => {
                    Error::InvalidModuleArguments(err.to_string())
                }
                other => other,
            })?;
        if !leftovers.is_empty() {
            debug!(class = %class, ?leftovers, "tokens not owned by the module");
        }
        for (key, value) in overrides {
            let spec = set
                .find(key)
                .ok_or_else(|| Error::UnknownKeyword(key.to_string()))?;
            if !spec.accepts(value) {
                return Err(Error::WrongValueType {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: spec.value_kind().to_string(),
                });
            }
            namespace.set(*key, value.clone());
        }
        Ok(Self {
            class: class.clone(),
            namespace,
        })
    }

    pub fn class(&self) -> &ModuleClass {
        &self.class
    }
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.namespace.get(dest)
    }
}
