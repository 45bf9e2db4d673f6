use clap::ArgMatches;
use tracing::debug;

use super::option_spec::{Action, OptionSpec};
use super::token_stream::{RawMatches, TokenStream};
use super::values::{Namespace, Value};
use crate::errors::{Error, Result};
use crate::module::{ModuleClass, Resolver, registry};

/// A sub-module option: its value names a class extending `baseclass`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubModuleSlot {
    pub dest: String,
    pub baseclass: ModuleClass,
}

/// Options and sub-module slots owned by one module class or parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSet {
    description: String,
    options: Vec<OptionSpec>,
    modules: Vec<SubModuleSlot>,
}

impl ArgumentSet {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            options: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }
    pub fn modules(&self) -> &[SubModuleSlot] {
        &self.modules
    }
    pub fn find(&self, dest: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.dest_name() == dest)
    }

    /// Add an option. Re-adding an identical definition is a no-op; a
    /// different definition for a used dest or flag is a conflict.
    pub fn add_argument(&mut self, spec: OptionSpec) -> Result<()> {
        spec.validate()?;
        let dest = spec.dest_name();
        for existing in &self.options {
            if existing.dest_name() == dest {
                if existing.same_definition(&spec) {
                    return Ok(());
                }
                return Err(Error::OptionConflict(format!(
                    "{dest} is already defined in {}",
                    self.description
                )));
            }
            let short_clash = spec.short().is_some() && spec.short() == existing.short();
            let long_clash = spec.long().is_some() && spec.long() == existing.long();
            if short_clash || long_clash {
                return Err(Error::OptionConflict(format!(
                    "{} of {dest} is already used by {} in {}",
                    spec.flags().join("/"),
                    existing.dest_name(),
                    self.description
                )));
            }
        }
        self.options.push(spec);
        Ok(())
    }

    /// Add an option whose value must name a subclass of `baseclass`. Entry
    /// points published for the baseclass become choices and help lines.
    pub fn add_module(&mut self, spec: OptionSpec, baseclass: ModuleClass) -> Result<()> {
        if !baseclass.is_module() {
            return Err(Error::InvalidBaseclass(baseclass.qualified_name()));
        }
        let entry_points = registry::entry_points(baseclass.name());
        let mut spec = spec.module(vec![baseclass.clone()]);
        if !entry_points.is_empty() {
            let mut help = spec.help_text().unwrap_or_default().to_string();
            help.push_str("\navailable modules:\n");
            help.push_str(
                &entry_points
                    .iter()
                    .map(|ep| ep.description())
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            spec = spec
                .choices(entry_points.iter().map(|ep| ep.name.clone()))
                .help(help);
        }
        let dest = spec.dest_name();
        self.add_argument(spec)?;
        if !self.modules.iter().any(|slot| slot.dest == dest) {
            self.modules.push(SubModuleSlot { dest, baseclass });
        }
        Ok(())
    }

    /// Replace the default of an existing option, checking its type.
    pub fn set_default(&mut self, dest: &str, value: Value) -> Result<()> {
        let spec = self
            .options
            .iter_mut()
            .find(|o| o.dest_name() == dest)
            .ok_or_else(|| Error::UnknownKeyword(dest.to_string()))?;
        if !spec.accepts(&value) {
            return Err(Error::WrongValueType {
                key: dest.to_string(),
                value: value.to_string(),
                expected: spec.value_kind().to_string(),
            });
        }
        spec.set_default(value);
        Ok(())
    }

    /// Every option at its default.
    pub fn defaults(&self) -> Namespace {
        let mut ns = Namespace::new();
        for spec in &self.options {
            ns.set(spec.dest_name(), spec.default_value());
        }
        ns
    }

    fn match_flag(&self, tok: &str) -> Option<(&OptionSpec, Option<String>)> {
        if let Some(body) = tok.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };
            let spec = self.options.iter().find(|o| o.long() == Some(name))?;
            return Some((spec, inline));
        }
        let body = tok.strip_prefix('-')?;
        let mut chars = body.chars();
        let c = chars.next()?;
        let spec = self.options.iter().find(|o| o.short() == Some(c))?;
        let rest: String = chars.collect();
        Some((spec, (!rest.is_empty()).then_some(rest)))
    }

    /// Lenient scan: collect tokens of known options, send everything else
    /// to the leftovers. Nothing here fails.
    pub fn scan(&self, tokens: &[String]) -> RawMatches {
        let mut ts = TokenStream::new(tokens);
        let mut raw = RawMatches::default();
        while let Some(tok) = ts.next_token() {
            if tok == "--" {
                raw.push_leftover(tok);
                for rest in ts.rest() {
                    raw.push_leftover(rest);
                }
                break;
            }
            let Some((spec, inline)) = self.match_flag(&tok) else {
                raw.push_leftover(tok);
                continue;
            };
            let dest = spec.dest_name();
            if spec.action() == Action::StoreTrue {
                match inline {
                    // `-vq`: the rest of a short cluster is another flag
                    Some(rest) if !tok.starts_with("--") => {
                        raw.push(&dest, "true");
                        ts.push_front(format!("-{rest}"));
                    }
                    Some(_) => raw.push_leftover(tok),
                    None => raw.push(&dest, "true"),
                }
                continue;
            }
            match inline.or_else(|| ts.next_value()) {
                Some(value) => raw.push(&dest, value),
                None => {
                    debug!(option = %tok, "option expects a value, ignored");
                    raw.push_leftover(tok);
                }
            }
        }
        raw
    }

    /// Convert scanned tokens to typed values, defaults for absent options.
    pub fn namespace_from_raw(&self, raw: &RawMatches, resolver: &Resolver) -> Result<Namespace> {
        let mut ns = Namespace::new();
        for spec in &self.options {
            let dest = spec.dest_name();
            let value = spec.value_from_strings(raw.values(&dest), resolver)?;
            ns.set(dest, value);
        }
        Ok(ns)
    }

    /// Lenient parse returning the namespace and the unconsumed tokens.
    pub fn parse_known(&self, tokens: &[String], resolver: &Resolver) -> Result<(Namespace, Vec<String>)> {
        let raw = self.scan(tokens);
        let ns = self.namespace_from_raw(&raw, resolver)?;
        Ok((ns, raw.into_leftovers()))
    }

    /// Strict clap command for this set, with the usual `-h/--help`.
    pub fn command(&self, prog: &str, about: Option<&str>) -> Result<clap::Command> {
        let mut command = clap::Command::new(prog.to_string()).args_override_self(true);
        if let Some(about) = about {
            command = command.about(about.to_string());
        }
        for spec in &self.options {
            if spec.short() == Some('h') || spec.long() == Some("help") {
                return Err(Error::OptionConflict(format!(
                    "{} collides with -h/--help",
                    spec.flags().join("/")
                )));
            }
            command = command.arg(spec.to_clap());
        }
        Ok(command)
    }

    pub fn namespace_from_matches(&self, matches: &ArgMatches, resolver: &Resolver) -> Result<Namespace> {
        let mut ns = Namespace::new();
        for spec in &self.options {
            ns.set(spec.dest_name(), spec.value_from_matches(matches, resolver)?);
        }
        Ok(ns)
    }

    /// Module classes selected for every sub-module slot in `ns`.
    pub fn selected_modules(&self, ns: &Namespace) -> Vec<(SubModuleSlot, ModuleClass)> {
        self.modules
            .iter()
            .filter_map(|slot| {
                ns.module(&slot.dest)
                    .map(|class| (slot.clone(), class.clone()))
            })
            .collect()
    }
}
