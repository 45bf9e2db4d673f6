use std::path::PathBuf;

use clap::builder::{BoolishValueParser, ValueParser};
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches};

use super::values::{Value, ValueKind};
use crate::errors::{Error, Result};
use crate::module::{ModuleClass, Resolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep the last given value.
    Store,
    /// Presence sets `true`; takes no value.
    StoreTrue,
    /// Every occurrence is appended after the default items.
    Append,
}

/// One option definition: flags, destination, value kind and action.
///
/// Only flag-style options exist; positionals would make the merge of
/// several argument sets ambiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    flags: Vec<String>,
    dest: Option<String>,
    kind: ValueKind,
    action: Action,
    default: Option<Value>,
    help: Option<String>,
    choices: Vec<String>,
    required: bool,
    metavar: Option<String>,
}

impl OptionSpec {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            dest: None,
            kind: ValueKind::Str,
            action: Action::Store,
            default: None,
            help: None,
            choices: Vec::new(),
            required: false,
            metavar: None,
        }
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }
    pub fn int(self) -> Self {
        self.kind(ValueKind::Int)
    }
    pub fn path(self) -> Self {
        self.kind(ValueKind::Path)
    }
    pub fn module(self, bases: Vec<ModuleClass>) -> Self {
        self.kind(ValueKind::Module(bases))
    }
    /// A store-true switch.
    pub fn flag(mut self) -> Self {
        self.kind = ValueKind::Bool;
        self.action = Action::StoreTrue;
        self
    }
    pub fn append(mut self) -> Self {
        self.action = Action::Append;
        self
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }
    pub fn value_kind(&self) -> &ValueKind {
        &self.kind
    }
    pub fn action(&self) -> Action {
        self.action
    }
    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }
    pub fn choice_names(&self) -> &[String] {
        &self.choices
    }
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn short(&self) -> Option<char> {
        self.flags.iter().find_map(|f| {
            let rest = f.strip_prefix('-')?;
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '-' => Some(c),
                _ => None,
            }
        })
    }

    pub fn long(&self) -> Option<&str> {
        self.flags
            .iter()
            .find_map(|f| f.strip_prefix("--").filter(|rest| !rest.is_empty()))
    }

    /// Explicit dest, else the first long flag with `-` mapped to `_`, else
    /// the short flag.
    pub fn dest_name(&self) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        if let Some(long) = self.long() {
            return long.replace('-', "_");
        }
        self.short().map(String::from).unwrap_or_default()
    }

    /// Value used when the option is absent from the tokens.
    pub fn default_value(&self) -> Value {
        if let Some(value) = &self.default {
            return value.clone();
        }
        match self.action {
            Action::StoreTrue => Value::Bool(false),
            Action::Append => Value::List(Vec::new()),
            Action::Store => Value::None,
        }
    }

    pub fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }

    /// `true` when `value` fits this option's kind and action.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.action, value) {
            (_, Value::None) => self.action == Action::Store,
            (Action::Append, Value::List(items)) => items.iter().all(|v| self.kind.accepts(v)),
            (Action::Append, _) => false,
            (Action::StoreTrue, v) => matches!(v, Value::Bool(_)),
            (Action::Store, v) => self.kind.accepts(v),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.flags.is_empty() {
            return Err(Error::invalid_option("an option needs at least one flag"));
        }
        for flag in &self.flags {
            let well_formed = match flag.strip_prefix("--") {
                Some(long) => {
                    !long.is_empty() && !long.contains('=') && !long.starts_with('-')
                }
                None => flag.starts_with('-') && flag.chars().count() == 2,
            };
            if !well_formed {
                return Err(Error::invalid_option(format!(
                    "'{flag}' is not a valid flag; use -x or --name"
                )));
            }
        }
        if self.dest_name().is_empty() {
            return Err(Error::invalid_option("option has no destination"));
        }
        if let Some(default) = &self.default {
            if !self.accepts(default) {
                return Err(Error::invalid_option(format!(
                    "default {default} of {} is not an instance of {}",
                    self.dest_name(),
                    self.kind
                )));
            }
        }
        Ok(())
    }

    /// Clap definition; defaults are applied when matches are converted.
    pub fn to_clap(&self) -> clap::Arg {
        let mut arg = clap::Arg::new(self.dest_name());
        if let Some(c) = self.short() {
            arg = arg.short(c);
        }
        if let Some(long) = self.long() {
            arg = arg.long(long.to_string());
        }
        arg = match self.action {
            Action::StoreTrue => arg.action(ArgAction::SetTrue),
            Action::Store => arg.action(ArgAction::Set),
            Action::Append => arg.action(ArgAction::Append),
        };
        if self.action != Action::StoreTrue {
            arg = arg.value_parser(self.value_parser());
            if self.kind == ValueKind::Int {
                arg = arg.allow_negative_numbers(true);
            }
            if let Some(metavar) = &self.metavar {
                arg = arg.value_name(metavar.clone());
            }
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        arg.required(self.required)
    }

    fn value_parser(&self) -> ValueParser {
        match self.kind {
            ValueKind::Int => ValueParser::new(clap::value_parser!(i64)),
            ValueKind::Bool => ValueParser::new(BoolishValueParser::new()),
            ValueKind::Path => ValueParser::path_buf(),
            ValueKind::Str | ValueKind::Module(_) => ValueParser::string(),
        }
    }

    /// Convert one raw token to this option's kind.
    pub fn convert(&self, raw: &str, resolver: &Resolver) -> Result<Value> {
        let invalid = || Error::InvalidValue {
            dest: self.dest_name(),
            value: raw.to_string(),
            expected: self.kind.to_string(),
        };
        match &self.kind {
            ValueKind::Int => raw.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid()),
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                // Same spellings as clap's `BoolishValueParser`.
                "y" | "yes" | "t" | "true" | "on" | "1" => Ok(Value::Bool(true)),
                "n" | "no" | "f" | "false" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::Str => Ok(Value::Str(raw.to_string())),
            ValueKind::Path => Ok(Value::Path(PathBuf::from(raw))),
            ValueKind::Module(bases) => resolver.resolve_selection(raw, bases).map(Value::Module),
        }
    }

    /// Final value from the tokens seen for this option (possibly none).
    pub fn value_from_strings(&self, raw: &[String], resolver: &Resolver) -> Result<Value> {
        if raw.is_empty() {
            return Ok(self.default_value());
        }
        if self.action == Action::StoreTrue {
            return Ok(Value::Bool(true));
        }
        let items = raw
            .iter()
            .map(|tok| self.convert(tok, resolver))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.finish(items))
    }

    /// Final value from strict clap matches built by [`OptionSpec::to_clap`].
    pub fn value_from_matches(&self, matches: &ArgMatches, resolver: &Resolver) -> Result<Value> {
        let id = self.dest_name();
        if matches.value_source(&id) != Some(ValueSource::CommandLine) {
            return Ok(self.default_value());
        }
        if self.action == Action::StoreTrue {
            return Ok(Value::Bool(true));
        }
        let items: Vec<Value> = match &self.kind {
            ValueKind::Int => matches
                .get_many::<i64>(&id)
                .into_iter()
                .flatten()
                .map(|v| Value::Int(*v))
                .collect(),
            ValueKind::Bool => matches
                .get_many::<bool>(&id)
                .into_iter()
                .flatten()
                .map(|v| Value::Bool(*v))
                .collect(),
            ValueKind::Path => matches
                .get_many::<PathBuf>(&id)
                .into_iter()
                .flatten()
                .map(|v| Value::Path(v.clone()))
                .collect(),
            ValueKind::Str => matches
                .get_many::<String>(&id)
                .into_iter()
                .flatten()
                .map(|v| Value::Str(v.clone()))
                .collect(),
            ValueKind::Module(bases) => matches
                .get_many::<String>(&id)
                .into_iter()
                .flatten()
                .map(|v| resolver.resolve_selection(v, bases).map(Value::Module))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(self.finish(items))
    }

    fn finish(&self, mut items: Vec<Value>) -> Value {
        match self.action {
            Action::Append => {
                let mut all = self.default_value().as_list().to_vec();
                all.append(&mut items);
                Value::List(all)
            }
            _ => items.pop().unwrap_or_else(|| self.default_value()),
        }
    }

    /// Two specs are interchangeable when a merge may keep either.
    pub fn same_definition(&self, other: &OptionSpec) -> bool {
        self.dest_name() == other.dest_name()
            && self.short() == other.short()
            && self.long() == other.long()
            && self.kind == other.kind
            && self.action == other.action
    }
}
