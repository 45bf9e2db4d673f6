
use std::any::Any;
use std::path::PathBuf;

use tracing::debug;

use crate::arg::{ArgumentSet, OptionSpec};
use crate::classproperty::{ClassProperty, ClassStore};
use crate::config::{ConfigSources, ExtendedConfig};
use crate::errors::Result;
use crate::module::{BaseModule, Module, ModuleArgs, ModuleClass, ModuleType};

/// Base of modules that a [`crate::parser::ModuleParser`] always loads,
/// independent of `-m` selections.
pub struct ModuleParserPlugin {
    args: ModuleArgs,
}

impl Module for ModuleParserPlugin {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for ModuleParserPlugin {
    const NAME: &'static str = "ModuleParserPlugin";
    const PACKAGE: &'static str = "modargs.plugins";
    const DOC: &'static str = "Base class for parser plugins.";

    fn parent() -> Option<ModuleClass> {
        Some(BaseModule::class())
    }
    fn from_args(args: ModuleArgs) -> Result<Self> {
        Ok(Self { args })
    }
}

static CONFIGFILES: ClassStore<Option<PathBuf>> = ClassStore::new();
static DEFAULT_CONFIGS: ClassStore<Option<PathBuf>> = ClassStore::new();

fn inherited(store: &ClassStore<Option<PathBuf>>, class: &ModuleClass) -> Option<PathBuf> {
    class.ancestors().find_map(|c| store.get(c)).flatten()
}

/// File a [`ConfigModule`] class reads when no `-c/--config` is given.
/// Subclasses inherit it; `None` on a subclass clears it.
pub static CONFIGFILE: ClassProperty<Option<PathBuf>> =
    ClassProperty::new("CONFIGFILE", |class| inherited(&CONFIGFILES, class))
        .with_setter(|class, path| CONFIGFILES.set(class, path));

/// Packaged defaults a [`ConfigModule`] class loads before any other file,
/// through [`ExtendedConfig::load`]. The file must exist.
pub static DEFAULT_CONFIG: ClassProperty<Option<PathBuf>> =
    ClassProperty::new("DEFAULT_CONFIG", |class| inherited(&DEFAULT_CONFIGS, class))
        .with_setter(|class, path| DEFAULT_CONFIGS.set(class, path));

/// Reads the files given with `-c/--config` into an [`ExtendedConfig`].
///
/// The class's [`DEFAULT_CONFIG`] is loaded first. Without `-c` the class's
/// [`CONFIGFILE`] is read instead.
pub struct ConfigModule {
    args: ModuleArgs,
    config: ExtendedConfig,
}

fn config_arguments(parser: &mut ArgumentSet) -> Result<()> {
    parser.add_argument(
        OptionSpec::new(["-c", "--config"])
            .path()
            .append()
            .metavar("CONFIG")
            .help("path to a configuration file, repeatable"),
    )
}

impl Module for ConfigModule {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for ConfigModule {
    const NAME: &'static str = "ConfigModule";
    const PACKAGE: &'static str = "modargs.plugins";
    const DOC: &'static str = "Loads configuration files given on the command line.";

    fn parent() -> Option<ModuleClass> {
        Some(ModuleParserPlugin::class())
    }
    fn arguments() -> Option<crate::module::ArgumentsHook> {
        Some(config_arguments)
    }
    fn from_args(args: ModuleArgs) -> Result<Self> {
        let class = args.class();
        let mut config = match DEFAULT_CONFIG.get(class) {
            Some(default) => ExtendedConfig::load(&ConfigSources {
                default: Some(default),
                ..ConfigSources::default()
            })?,
            None => ExtendedConfig::new(),
        };

        let given: Vec<PathBuf> = args
            .namespace()
            .list("config")
            .iter()
            .filter_map(|v| v.as_path())
            .map(PathBuf::from)
            .collect();
        if given.is_empty() {
            if let Some(fallback) = CONFIGFILE.get(class) {
                debug!(class = %class, file = %fallback.display(), "no -c given, using class config file");
                config.append(fallback);
            }
        }
        for path in given {
            config.append(path);
        }
        Ok(Self { args, config })
    }
}

impl ConfigModule {
    pub fn config(&self) -> &ExtendedConfig {
        &self.config
    }
}
