use std::fs;

use tempfile::TempDir;

use super::{Grammar, ModuleParser};
use crate::arg::{ArgumentSet, OptionSpec, Value, tokens};
use crate::demos::{ExampleModule, HexDump};
use crate::errors::{Error, Result};
use crate::module::registry::{self, Package};
use crate::module::{BaseModule, ModuleType};
use crate::plugins::{ConfigModule, ModuleParserPlugin};

fn scanner_arguments(parser: &mut ArgumentSet) -> Result<()> {
    parser.add_argument(OptionSpec::new(["--depth"]).int().default(Value::Int(1)))?;
    parser.add_module(
        OptionSpec::new(["--demo"]).help("demo module run per match"),
        ExampleModule::class(),
    )
}

fn clashing_arguments(parser: &mut ArgumentSet) -> Result<()> {
    parser.add_argument(OptionSpec::new(["--text"]).int())
}

fn retry_arguments(parser: &mut ArgumentSet) -> Result<()> {
    parser.add_argument(OptionSpec::new(["--retries"]).int().default(Value::Int(3)))
}

test_module!(Scanner, "Scanner", parent: Some(ExampleModule::class()), hook: scanner_arguments);
test_module!(Clashing, "Clashing", parent: Some(ExampleModule::class()), hook: clashing_arguments);
test_module!(RetryPlugin, "RetryPlugin", parent: Some(ModuleParserPlugin::class()), hook: retry_arguments);
test_module!(Standalone, "Standalone", parent: Some(BaseModule::class()));
test_module!(Detached, "Detached", parent: None);

fn register_parser_modules() {
    registry::register_package(
        Package::new("modargs.tests.parser")
            .with_type::<Scanner>()
            .with_type::<Clashing>(),
    )
    .unwrap();
}

fn demo_parser() -> ModuleParser {
    ModuleParser::builder("demo")
        .description("demo parser")
        .baseclass(ExampleModule::class())
        .build()
        .unwrap()
}

#[test]
fn selected_module_options_are_parsed() {
    let mut parser = demo_parser();
    let args = parser.parse_args(["-m", "modargs.demos.HexDump"]).unwrap();
    let modules = args.modules("modules");
    assert_eq!(modules, vec![ExampleModule::class(), HexDump::class()]);
    assert_eq!(args.int("hexwidth"), Some(16));
}

#[test]
fn entry_point_names_select_modules() {
    let mut parser = demo_parser();
    let args = parser.parse_args(["-m", "hexdump", "--hexwidth", "4"]).unwrap();
    assert_eq!(args.modules("modules")[1], HexDump::class());
    assert_eq!(args.int("hexwidth"), Some(4));
}

#[test]
fn unselected_module_options_are_unknown() {
    let mut parser = demo_parser();
    let err = parser.parse_args(["--hexwidth", "4"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
}

#[test]
fn unknown_options_are_usage_errors() {
    let mut parser = demo_parser();
    let err = parser.parse_args(["--notvalid"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn bad_values_are_usage_errors() {
    let mut parser = demo_parser();
    let err = parser
        .parse_args(["-m", "hexdump", "--hexwidth", "wide"])
        .unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
}

#[test]
fn help_is_reported_with_success_code() {
    let mut parser = demo_parser();
    let err = parser.parse_args(["-m", "hexdump", "--help"]).unwrap_err();
    assert_eq!(err.exit_code(), 0);
    let help = parser.command(["-m", "hexdump"]).unwrap().render_help().to_string();
    assert!(help.contains("--hexwidth"));
    assert!(help.contains("hexdump -> Print a hexdump of the received data"));
}

#[test]
fn unknown_selection_lists_choices() {
    let mut parser = demo_parser();
    let err = parser.parse_args(["-m", "nosuchmodule"]).unwrap_err();
    match err {
        Error::UnknownModule { value, choices } => {
            assert_eq!(value, "nosuchmodule");
            assert!(choices.contains(&"hexdump".to_string()));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn selection_must_be_strict_subclass() {
    let mut parser = demo_parser();
    let err = parser
        .parse_args(["-m", "modargs.demos.ExampleModule"])
        .unwrap_err();
    assert!(matches!(err, Error::ModuleIsBaseclass(_)));

    let err = parser
        .parse_args(["-m", "modargs.plugins.ConfigModule"])
        .unwrap_err();
    assert!(matches!(err, Error::NotSubclass { .. }));
}

#[test]
fn sub_modules_are_discovered() {
    register_parser_modules();
    let mut parser = demo_parser();
    let args = parser
        .parse_args([
            "-m",
            "modargs.tests.parser.Scanner",
            "--demo",
            "hexdump",
            "--hexwidth",
            "2",
            "--depth",
            "5",
        ])
        .unwrap();
    assert_eq!(args.modules("modules")[1], Scanner::class());
    assert_eq!(args.module("demo"), Some(&HexDump::class()));
    assert_eq!(args.int("hexwidth"), Some(2));
    assert_eq!(args.int("depth"), Some(5));
}

#[test]
fn unselected_sub_module_contributes_nothing() {
    register_parser_modules();
    let mut parser = demo_parser();
    let args = parser
        .parse_args(["-m", "modargs.tests.parser.Scanner"])
        .unwrap();
    assert_eq!(args.get("demo"), Some(&Value::None));
    assert!(!args.contains("hexwidth"));
}

#[test]
fn sub_module_must_not_be_its_baseclass() {
    register_parser_modules();
    let mut parser = demo_parser();
    let err = parser
        .parse_args([
            "-m",
            "modargs.tests.parser.Scanner",
            "--demo",
            "modargs.demos.ExampleModule",
        ])
        .unwrap_err();
    assert!(matches!(err, Error::ModuleIsBaseclass(_)));
}

#[test]
fn parser_level_module_slots() {
    let mut parser = ModuleParser::builder("slots").build().unwrap();
    parser
        .add_module(OptionSpec::new(["--dumper"]), ExampleModule::class())
        .unwrap();
    let args = parser
        .parse_args(["--dumper", "hexdump", "--hexwidth", "8"])
        .unwrap();
    assert_eq!(args.module("dumper"), Some(&HexDump::class()));
    assert_eq!(args.int("hexwidth"), Some(8));
    assert!(!args.contains("modules"));
}

#[test]
fn conflicting_module_options_fail() {
    register_parser_modules();
    let mut parser = demo_parser();
    parser.add_argument(OptionSpec::new(["--text"])).unwrap();
    let err = parser
        .parse_args(["-m", "modargs.tests.parser.Clashing"])
        .unwrap_err();
    assert!(matches!(err, Error::OptionConflict(_)));
}

#[test]
fn help_flags_are_reserved() {
    let mut parser = demo_parser();
    parser
        .add_argument(OptionSpec::new(["-h", "--host"]))
        .unwrap();
    let err = parser.parse_args(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, Error::OptionConflict(_)));
}

#[test]
fn plugins_are_instantiated_on_parse() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{ "Scanner": { "depth": 7 } }"#).unwrap();

    let mut parser = demo_parser();
    parser.add_plugin(ConfigModule::class()).unwrap();
    assert!(parser.plugin::<ConfigModule>().is_none());

    let args = parser
        .parse_args(["-c", path.to_str().unwrap()])
        .unwrap();
    assert_eq!(args.list("config"), &[Value::Path(path.clone())]);
    let plugin = parser.plugin::<ConfigModule>().unwrap();
    assert_eq!(plugin.config().getint("Scanner", "depth").unwrap(), 7);
}

#[test]
fn plugins_with_bad_arguments_are_skipped() {
    let mut parser = demo_parser();
    parser.add_plugin(RetryPlugin::class()).unwrap();
    parser.add_plugin(RetryPlugin::class()).unwrap();
    assert_eq!(parser.plugins().count(), 1);

    parser.compose(&tokens(["--retries", "many"])).unwrap();
    assert!(parser.plugin_instance(&RetryPlugin::class()).is_none());

    parser.compose(&tokens(["--retries", "2"])).unwrap();
    let plugin = parser.plugin::<RetryPlugin>().unwrap();
    assert_eq!(plugin.args.namespace().int("retries"), Some(2));
}

#[test]
fn plugin_and_module_registration_are_checked() {
    let mut parser = demo_parser();
    let err = parser.add_plugin(HexDump::class()).unwrap_err();
    assert!(matches!(err, Error::NotAPlugin(_)));

    let err = parser
        .add_module(OptionSpec::new(["--cfg"]), ConfigModule::class())
        .unwrap_err();
    assert!(matches!(err, Error::PluginAsModule(_)));

    let err = parser
        .add_module(OptionSpec::new(["--detached"]), Detached::class())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBaseclass(_)));
}

#[test]
fn baseclass_must_be_a_module() {
    let err = ModuleParser::builder("bad")
        .baseclass(Detached::class())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidBaseclass(_)));
}

#[test]
fn parse_known_args_keeps_leftovers() {
    let mut parser = demo_parser();
    let (args, rest) = parser
        .parse_known_args(["-m", "hexdump", "--hexwidth", "3", "--unknown", "x"])
        .unwrap();
    assert_eq!(args.int("hexwidth"), Some(3));
    assert_eq!(rest, vec!["--unknown".to_string(), "x".to_string()]);
}

#[test]
fn baseclass_default_can_be_disabled() {
    let mut parser = ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .baseclass_as_default(false)
        .build()
        .unwrap();
    assert!(parser.default_classes().is_empty());
    let args = parser.parse_args(["-m", "hexdump"]).unwrap();
    assert_eq!(args.modules("modules"), vec![HexDump::class()]);
}

#[test]
fn default_modules_are_discovered_without_selection() {
    let mut parser = ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .default_module(HexDump::class())
        .build()
        .unwrap();
    let args = parser.parse_args(["--hexwidth", "6"]).unwrap();
    assert_eq!(args.modules("modules"), vec![HexDump::class()]);
    assert_eq!(args.int("hexwidth"), Some(6));
}

#[test]
fn default_modules_must_fit_the_baseclass() {
    let err = ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .default_module(Standalone::class())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, Error::NotSubclass { .. }));
}

#[test]
fn module_path_rewrites_selections() {
    let mut parser = ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .module_path(|s| format!("modargs.demos.{s}"))
        .build()
        .unwrap();
    let args = parser.parse_args(["-m", "HexDump"]).unwrap();
    assert_eq!(args.modules("modules")[1], HexDump::class());
}

#[test]
fn grammar_merges_each_set_once() {
    let mut grammar = Grammar::new(ArgumentSet::new("top"));
    assert!(grammar.add(HexDump::class().parser().unwrap()));
    assert!(!grammar.add(HexDump::class().parser().unwrap()));
    assert!(grammar.contains("modargs.demos.HexDump"));
    assert_eq!(grammar.sets().len(), 2);
    let merged = grammar.merged().unwrap();
    assert_eq!(merged.description(), "top");
    assert!(merged.find("hexwidth").is_some());
}
