
pub mod class;
pub mod instance;
pub mod registry;
pub mod resolver;

pub use class::{ArgumentsHook, BaseModule, Constructor, ModuleClass, ModuleType};
pub use instance::{Module, ModuleArgs};
pub use registry::{EntryPoint, Package};
pub use resolver::{ModuleRef, PathMapper, Resolver, split_module_string};
