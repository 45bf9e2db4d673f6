//! Ranked return codes: the "worst" of several results wins.


use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::config::ExtendedConfig;
use crate::errors::{Error, Result};
use crate::extensions::enums::valid_csv;

/// Which of two result values ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Greater,
    Less,
}

impl Comparator {
    /// `true` if `a` outranks `b`.
    pub fn prefers(self, a: i64, b: i64) -> bool {
        match self {
            Comparator::Greater => a > b,
            Comparator::Less => a < b,
        }
    }
}

/// Implemented by `strum` enums whose variants are the possible results.
///
/// ```ignore
/// #[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, AsRefStr)]
/// #[strum(serialize_all = "lowercase")]
/// enum ScanResult { Success, Skip, Error }
/// ```
pub trait ReturnCode: IntoEnumIterator + AsRef<str> + Copy + PartialEq {
    const COMPARATOR: Comparator = Comparator::Greater;

    fn value(self) -> i64;

    /// Skipped results never change a score without force.
    fn skip(self) -> bool {
        false
    }

    /// Starting point of [`ReturnCode::get_score`].
    fn initial() -> Option<Self> {
        Self::min()
    }

    /// Results keyed by value; a later variant shadows an earlier one with
    /// the same value.
    fn results() -> BTreeMap<i64, Self> {
        Self::iter().map(|r| (r.value(), r)).collect()
    }

    fn result_types() -> Vec<String> {
        Self::iter().map(|r| r.as_ref().to_string()).collect()
    }

    fn from_code(code: i64) -> Result<Self> {
        Self::results()
            .remove(&code)
            .ok_or_else(|| Error::InvalidReturnCode(code.to_string()))
    }

    /// Case-insensitive lookup by name.
    fn from_name(name: &str) -> Result<Self> {
        Self::iter()
            .find(|r| r.as_ref().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::InvalidReturnCode(format!(
                    "{name}. Valid return codes: {}",
                    valid_csv::<Self>()
                ))
            })
    }

    fn min() -> Option<Self> {
        Self::results().into_values().next()
    }

    fn max() -> Option<Self> {
        Self::results().into_values().next_back()
    }

    /// The highest ranked non-skipped value, starting from
    /// [`ReturnCode::initial`].
    fn get_score(values: &[Self]) -> Option<Self> {
        let mut result = Self::initial()?;
        for &value in values {
            if !value.skip() && Self::COMPARATOR.prefers(value.value(), result.value()) {
                result = value;
            }
        }
        Some(result)
    }
}

/// Holds the current result of a run and only lets it get worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnCodeTracker<R> {
    result: R,
}

impl<R: ReturnCode> ReturnCodeTracker<R> {
    pub fn new(result: R) -> Self {
        Self { result }
    }

    pub fn result(&self) -> R {
        self.result
    }

    /// Replace the result if `value` outranks it, or unconditionally with
    /// `force`. Skipped values only apply with `force`.
    pub fn set_result(&mut self, value: R, force: bool) -> bool {
        if !force && !R::COMPARATOR.prefers(value.value(), self.result.value()) {
            return false;
        }
        if value.skip() && !force {
            return false;
        }
        self.result = value;
        true
    }
}

/// A result declared in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCode {
    pub name: String,
    pub value: i64,
    pub skip: bool,
}

/// Return codes declared at runtime by `Result:<name>` config sections
/// (`value`, `skip`), with an optional `[Result] initial`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCodeTable {
    results: Vec<ResultCode>,
    comparator: Comparator,
    initial: Option<String>,
}

impl ReturnCodeTable {
    pub fn from_config(config: &ExtendedConfig, comparator: Comparator) -> Result<Self> {
        let mut results = Vec::new();
        for section in config.sections() {
            let Some(name) = section.strip_prefix("Result:") else {
                continue;
            };
            let skip = config.has_option(section, "skip") && config.getboolean(section, "skip")?;
            results.push(ResultCode {
                name: name.to_lowercase(),
                value: config.getint(section, "value")?,
                skip,
            });
        }
        results.sort_by_key(|r| r.value);
        let initial = if config.has_option("Result", "initial") {
            Some(config.get("Result", "initial")?.to_string())
        } else {
            None
        };
        let table = Self {
            results,
            comparator,
            initial,
        };
        if let Some(initial) = &table.initial {
            table.from_name(initial)?;
        }
        Ok(table)
    }

    pub fn results(&self) -> &[ResultCode] {
        &self.results
    }

    pub fn result_types(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn from_code(&self, code: i64) -> Result<&ResultCode> {
        self.results
            .iter()
            .find(|r| r.value == code)
            .ok_or_else(|| Error::InvalidReturnCode(code.to_string()))
    }

    pub fn from_name(&self, name: &str) -> Result<&ResultCode> {
        self.results
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::InvalidReturnCode(format!(
                    "{name}. Valid return codes: {}",
                    self.result_types().join(", ")
                ))
            })
    }

    pub fn min(&self) -> Option<&ResultCode> {
        self.results.first()
    }

    pub fn max(&self) -> Option<&ResultCode> {
        self.results.last()
    }

    pub fn get_score<'a>(&'a self, values: &[&'a ResultCode]) -> Option<&'a ResultCode> {
        let mut result = match &self.initial {
            Some(initial) => self.from_name(initial).ok()?,
            None => self.min()?,
        };
        for &value in values {
            if !value.skip && self.comparator.prefers(value.value, result.value) {
                result = value;
            }
        }
        Some(result)
    }
}
