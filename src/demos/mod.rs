//! Demo modules used by the `modargs` binary and the tests.


use std::any::Any;
use std::io::Write;

use crate::arg::{ArgumentSet, OptionSpec, Value};
use crate::errors::{Error, Result};
use crate::module::{ArgumentsHook, BaseModule, Module, ModuleArgs, ModuleClass, ModuleType};

/// A module that transforms input data.
pub trait Execute {
    /// Write any report to `out`; `Some` replaces the data handed to the
    /// next module.
    fn execute(&self, data: &[u8], out: &mut dyn Write) -> Result<Option<Vec<u8>>>;
}

/// Base of the demo modules; does nothing with the data.
pub struct ExampleModule {
    args: ModuleArgs,
}

impl Module for ExampleModule {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for ExampleModule {
    const NAME: &'static str = "ExampleModule";
    const PACKAGE: &'static str = "modargs.demos";
    const DOC: &'static str = "Base of the demo modules that process input data.";

    fn parent() -> Option<ModuleClass> {
        Some(BaseModule::class())
    }
    fn from_args(args: ModuleArgs) -> Result<Self> {
        Ok(Self { args })
    }
}

impl Execute for ExampleModule {
    fn execute(&self, _data: &[u8], _out: &mut dyn Write) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Widest row `--hexwidth` accepts.
pub const MAX_HEXWIDTH: usize = 4096;

/// Prints a hexdump of the received data.
pub struct HexDump {
    args: ModuleArgs,
    width: usize,
}

fn hexdump_arguments(parser: &mut ArgumentSet) -> Result<()> {
    parser.add_argument(
        OptionSpec::new(["--hexwidth"])
            .int()
            .default(Value::Int(16))
            .help("width of the hexdump in chars"),
    )
}

impl Module for HexDump {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for HexDump {
    const NAME: &'static str = "HexDump";
    const PACKAGE: &'static str = "modargs.demos";
    const DOC: &'static str = "Print a hexdump of the received data";

    fn parent() -> Option<ModuleClass> {
        Some(ExampleModule::class())
    }
    fn arguments() -> Option<ArgumentsHook> {
        Some(hexdump_arguments)
    }
    fn from_args(args: ModuleArgs) -> Result<Self> {
        let raw = args.namespace().int("hexwidth").unwrap_or(16);
        let width = usize::try_from(raw)
            .ok()
            .filter(|w| (1..=MAX_HEXWIDTH).contains(w))
            .ok_or_else(|| {
                Error::InvalidModuleArguments(format!(
                    "hexwidth must be between 1 and {MAX_HEXWIDTH}, got {raw}"
                ))
            })?;
        Ok(Self { args, width })
    }
}

impl HexDump {
    pub fn width(&self) -> usize {
        self.width
    }

    /// `"{offset:04X}:    {hex bytes}    {ascii}"`, one line per row.
    pub fn dump(&self, data: &[u8]) -> String {
        data.chunks(self.width)
            .enumerate()
            .map(|(row, chunk)| {
                let mut hexa: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
                hexa.resize(self.width, "  ".to_string());
                let text: String = chunk
                    .iter()
                    .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
                    .collect();
                format!("{:04X}:    {}    {}", row * self.width, hexa.join(" "), text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Execute for HexDump {
    fn execute(&self, data: &[u8], out: &mut dyn Write) -> Result<Option<Vec<u8>>> {
        if !data.is_empty() {
            writeln!(out, "{}", self.dump(data))?;
        }
        Ok(Some(data.to_vec()))
    }
}

/// The [`Execute`] side of a constructed demo module, if it has one.
pub fn executor(module: &dyn Module) -> Option<&dyn Execute> {
    let any = module.as_any();
    if let Some(m) = any.downcast_ref::<HexDump>() {
        return Some(m);
    }
    if let Some(m) = any.downcast_ref::<ExampleModule>() {
        return Some(m);
    }
    None
}
