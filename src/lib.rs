//! Pluggable modules that bring their own command-line arguments, and a
//! parser that composes them.

#[cfg(test)]
#[macro_use]
mod test_support;

pub mod arg;
pub mod classproperty;
pub mod config;
pub mod demos;
pub mod errors;
pub mod extensions;
pub mod logging;
pub mod module;
pub mod parser;
pub mod plugins;
pub mod returncode;

pub use arg::{Namespace, OptionSpec, Value};
pub use errors::{Error, Result};
pub use module::{BaseModule, Module, ModuleArgs, ModuleClass, ModuleType, Resolver};
pub use parser::ModuleParser;
