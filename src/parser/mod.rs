//! Argument parser that pulls in the options of every selected module.

#[cfg(test)]
mod tests;

pub mod grammar;

pub use grammar::Grammar;

use tracing::{debug, error};

use crate::arg::{ArgumentSet, Namespace, OptionSpec, Value, tokens};
use crate::errors::{Error, Result};
use crate::module::{Module, ModuleClass, ModuleType, Resolver, registry};

struct PluginEntry {
    class: ModuleClass,
    instance: Option<Box<dyn Module>>,
}

pub struct ModuleParserBuilder {
    prog: String,
    description: Option<String>,
    baseclasses: Vec<ModuleClass>,
    default: Option<Vec<ModuleClass>>,
    baseclass_as_default: bool,
    resolver: Resolver,
}

impl ModuleParserBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Allow `-m` selections extending `class`; repeatable.
    pub fn baseclass(mut self, class: ModuleClass) -> Self {
        self.baseclasses.push(class);
        self
    }

    /// Preselect `class`; repeatable. Replaces the baseclass default.
    pub fn default_module(mut self, class: ModuleClass) -> Self {
        self.default.get_or_insert_with(Vec::new).push(class);
        self
    }

    pub fn baseclass_as_default(mut self, enabled: bool) -> Self {
        self.baseclass_as_default = enabled;
        self
    }

    pub fn modules_from_file(mut self, allowed: bool) -> Self {
        self.resolver = self.resolver.with_modules_from_file(allowed);
        self
    }

    /// Rewrite module identifiers before they are resolved.
    pub fn module_path<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.resolver = self.resolver.with_path_mapper(mapper);
        self
    }

    pub fn build(self) -> Result<ModuleParser> {
        for base in &self.baseclasses {
            if !base.is_module() {
                error!(class = %base, "baseclass must extend BaseModule");
                return Err(Error::InvalidBaseclass(base.qualified_name()));
            }
        }
        if self.baseclasses.is_empty() {
            debug!("modules are not supported");
        }
        let defaults = match self.default {
            Some(defaults) => defaults,
            None if self.baseclass_as_default => self.baseclasses.clone(),
            None => Vec::new(),
        };
        for module in &defaults {
            if !self.baseclasses.iter().any(|base| module.is_subclass_of(base)) {
                error!(module = %module, "default module is not an instance of baseclass");
                return Err(Error::NotSubclass {
                    module: module.qualified_name(),
                    expected: self
                        .baseclasses
                        .iter()
                        .map(ModuleClass::qualified_name)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }

        let mut arguments = ArgumentSet::new(self.prog.clone());
        if !self.baseclasses.is_empty() {
            let entry_points: Vec<_> = self
                .baseclasses
                .iter()
                .flat_map(|base| registry::entry_points(base.name()))
                .collect();
            let mut help = "Modules to parse and modify data".to_string();
            if !entry_points.is_empty() {
                help.push_str("\navailable modules:\n");
                help.push_str(
                    &entry_points
                        .iter()
                        .map(|ep| ep.description())
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
            }
            arguments.add_argument(
                OptionSpec::new(["-m", "--module"])
                    .dest("modules")
                    .module(self.baseclasses.clone())
                    .append()
                    .default(Value::List(defaults.iter().cloned().map(Value::Module).collect()))
                    .choices(entry_points.into_iter().map(|ep| ep.name))
                    .metavar("MODULE")
                    .help(help),
            )?;
        }

        Ok(ModuleParser {
            prog: self.prog,
            description: self.description,
            baseclasses: self.baseclasses,
            defaults,
            arguments,
            plugins: Vec::new(),
            resolver: self.resolver,
        })
    }
}

/// Parses `-m` module selections, discovers the options of every selected
/// module (and their sub-modules), then parses all tokens against the
/// merged grammar.
pub struct ModuleParser {
    prog: String,
    description: Option<String>,
    baseclasses: Vec<ModuleClass>,
    defaults: Vec<ModuleClass>,
    arguments: ArgumentSet,
    plugins: Vec<PluginEntry>,
    resolver: Resolver,
}

impl ModuleParser {
    pub fn builder(prog: impl Into<String>) -> ModuleParserBuilder {
        ModuleParserBuilder {
            prog: prog.into(),
            description: None,
            baseclasses: Vec::new(),
            default: None,
            baseclass_as_default: true,
            resolver: Resolver::new(),
        }
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }
    pub fn baseclasses(&self) -> &[ModuleClass] {
        &self.baseclasses
    }
    pub fn default_classes(&self) -> &[ModuleClass] {
        &self.defaults
    }
    pub fn arguments(&self) -> &ArgumentSet {
        &self.arguments
    }
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn add_argument(&mut self, spec: OptionSpec) -> Result<()> {
        self.arguments.add_argument(spec)
    }

    /// Add an option selecting one module that extends `baseclass`.
    pub fn add_module(&mut self, spec: OptionSpec, baseclass: ModuleClass) -> Result<()> {
        if baseclass.is_plugin() {
            error!(class = %baseclass, "plugin used as module baseclass, use add_plugin instead");
            return Err(Error::PluginAsModule(baseclass.qualified_name()));
        }
        debug!(baseclass = %baseclass, "adding module option");
        self.arguments.add_module(spec, baseclass)
    }

    /// Always load `class` and instantiate it on every parse.
    pub fn add_plugin(&mut self, class: ModuleClass) -> Result<()> {
        if !class.is_plugin() {
            return Err(Error::NotAPlugin(class.qualified_name()));
        }
        if !self.plugins.iter().any(|p| p.class == class) {
            self.plugins.push(PluginEntry {
                class,
                instance: None,
            });
        }
        Ok(())
    }

    pub fn plugins(&self) -> impl Iterator<Item = &ModuleClass> {
        self.plugins.iter().map(|p| &p.class)
    }

    /// The instance created for `class` by the last parse, if construction
    /// succeeded.
    pub fn plugin_instance(&self, class: &ModuleClass) -> Option<&dyn Module> {
        self.plugins
            .iter()
            .find(|p| &p.class == class)
            .and_then(|p| p.instance.as_deref())
    }

    pub fn plugin<P: ModuleType>(&self) -> Option<&P> {
        self.plugin_instance(&P::class())?.as_any().downcast_ref::<P>()
    }

    fn check_selection(&self, module: &ModuleClass, allow_base: bool) -> Result<()> {
        if !self.baseclasses.iter().any(|base| module.is_subclass_of(base)) {
            error!(module = %module, "module is not an instance of baseclass");
            return Err(Error::NotSubclass {
                module: module.qualified_name(),
                expected: self.baseclass_names(),
            });
        }
        if !allow_base && self.baseclasses.contains(module) {
            error!(module = %module, "module must not be baseclass");
            return Err(Error::ModuleIsBaseclass(module.qualified_name()));
        }
        Ok(())
    }

    fn baseclass_names(&self) -> String {
        self.baseclasses
            .iter()
            .map(ModuleClass::qualified_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn discover_module(&self, grammar: &mut Grammar, module: &ModuleClass, tokens: &[String]) -> Result<()> {
        let set = module.parser()?;
        if !grammar.add(set.clone()) {
            return Ok(());
        }
        self.discover_slots(grammar, &set, tokens)
    }

    fn discover_slots(&self, grammar: &mut Grammar, owner: &ArgumentSet, tokens: &[String]) -> Result<()> {
        if owner.modules().is_empty() {
            return Ok(());
        }
        let namespace = match owner.parse_known(tokens, &self.resolver) {
            Ok((namespace, _)) => namespace,
            Err(err) if err.is_value_error() => {
                debug!(%err, set = owner.description(), "left for the final parse");
                owner.defaults()
            }
            Err(err) => return Err(err),
        };
        for (slot, module) in owner.selected_modules(&namespace) {
            if !module.is_subclass_of(&slot.baseclass) {
                error!(module = %module, "module is not an instance of baseclass");
                return Err(Error::NotSubclass {
                    module: module.qualified_name(),
                    expected: slot.baseclass.qualified_name(),
                });
            }
            if module == slot.baseclass {
                error!(module = %module, "module must not be baseclass");
                return Err(Error::ModuleIsBaseclass(module.qualified_name()));
            }
            self.discover_module(grammar, &module, tokens)?;
        }
        Ok(())
    }

    /// Collect the argument sets of the parser, every selected module with
    /// its sub-modules, and the plugins; then instantiate the plugins.
    pub fn compose(&mut self, tokens: &[String]) -> Result<Grammar> {
        let mut grammar = Grammar::new(self.arguments.clone());

        if !self.baseclasses.is_empty() {
            let raw = self.arguments.scan(tokens);
            let selected = raw
                .values("modules")
                .iter()
                .map(|value| self.resolver.resolve_selection(value, &self.baseclasses))
                .collect::<Result<Vec<_>>>()?;
            for module in &self.defaults {
                self.check_selection(module, true)?;
            }
            for module in &selected {
                self.check_selection(module, false)?;
            }
            for module in self.defaults.iter().chain(&selected) {
                self.discover_module(&mut grammar, module, tokens)?;
            }
        }

        self.discover_slots(&mut grammar, &self.arguments, tokens)?;

        for plugin in &self.plugins {
            grammar.add(plugin.class.parser()?);
        }
        for plugin in &mut self.plugins {
            plugin.instance = match plugin.class.instantiate(tokens, &[]) {
                Ok(instance) => Some(instance),
                Err(Error::InvalidModuleArguments(reason)) => {
                    debug!(plugin = %plugin.class, %reason, "plugin not initialized");
                    None
                }
                Err(err) => return Err(err),
            };
        }
        Ok(grammar)
    }

    /// clap command for the grammar these tokens select.
    pub fn command<I, S>(&mut self, raw: I) -> Result<clap::Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grammar = self.compose(&tokens(raw))?;
        grammar
            .merged()?
            .command(&self.prog, self.description.as_deref())
    }

    /// Strict parse: unknown options, bad values and missing required
    /// options are [`Error::Usage`].
    pub fn parse_args<I, S>(&mut self, raw: I) -> Result<Namespace>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens(raw);
        let merged = self.compose(&tokens)?.merged()?;
        let command = merged.command(&self.prog, self.description.as_deref())?;
        let argv = std::iter::once(self.prog.clone()).chain(tokens.iter().cloned());
        let matches = command.try_get_matches_from(argv)?;
        merged.namespace_from_matches(&matches, &self.resolver)
    }

    /// Like [`ModuleParser::parse_args`], but usage errors print the message
    /// and exit the process (2, or 0 for `--help`).
    pub fn parse_args_or_exit<I, S>(&mut self, raw: I) -> Result<Namespace>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.parse_args(raw) {
            Err(Error::Usage(err)) => err.exit(),
            other => other,
        }
    }

    /// Lenient parse returning unrecognized tokens instead of failing.
    pub fn parse_known_args<I, S>(&mut self, raw: I) -> Result<(Namespace, Vec<String>)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens(raw);
        let merged = self.compose(&tokens)?.merged()?;
        merged.parse_known(&tokens, &self.resolver)
    }
}
