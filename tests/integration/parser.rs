use tempfile::TempDir;

use modargs::demos::{ExampleModule, HexDump};
use modargs::{Error, ModuleParser, ModuleType, Value};

use crate::common::{NARROW_MANIFEST, write_file};

fn demo_parser(modules_from_file: bool) -> ModuleParser {
    ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .modules_from_file(modules_from_file)
        .build()
        .unwrap()
}

#[test]
fn selecting_hexdump_adds_its_options() {
    let mut parser = demo_parser(false);
    let args = parser.parse_args(["-m", "modargs.demos.HexDump"]).unwrap();
    let modules = args.modules("modules");
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[1], HexDump::class());
    assert_eq!(args.get("hexwidth"), Some(&Value::Int(16)));
}

#[test]
fn unknown_option_is_usage_error() {
    let mut parser = demo_parser(false);
    let err = parser.parse_args(["--notvalid"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn repeated_selection_is_merged_once() {
    let mut parser = demo_parser(false);
    let args = parser
        .parse_args(["-m", "hexdump", "-m", "modargs.demos:HexDump", "--hexwidth", "5"])
        .unwrap();
    assert_eq!(args.modules("modules").len(), 3);
    assert_eq!(args.int("hexwidth"), Some(5));
}

#[test]
fn manifest_modules_need_file_loading() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "mods.json", NARROW_MANIFEST);
    let selection = format!("{}:NarrowDump", manifest.display());

    let err = demo_parser(false).parse_args(["-m", selection.as_str()]).unwrap_err();
    assert!(matches!(err, Error::ModuleFromFileDisallowed(_)));

    let args = demo_parser(true).parse_args(["-m", selection.as_str()]).unwrap();
    let modules = args.modules("modules");
    let narrow = &modules[1];
    assert_eq!(narrow.name(), "NarrowDump");
    assert!(narrow.is_strict_subclass_of(&HexDump::class()));
    assert_eq!(args.int("hexwidth"), Some(2));
}

#[test]
fn parse_known_args_tolerates_foreign_tokens() {
    let mut parser = demo_parser(false);
    let (args, rest) = parser
        .parse_known_args(["positional", "-m", "hexdump", "--other=1"])
        .unwrap();
    assert_eq!(args.modules("modules")[1], HexDump::class());
    assert_eq!(rest, vec!["positional".to_string(), "--other=1".to_string()]);
}
