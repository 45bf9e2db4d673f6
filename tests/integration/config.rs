use tempfile::TempDir;

use modargs::config::{ConfigSources, ExtendedConfig};
use modargs::demos::{ExampleModule, HexDump};
use modargs::plugins::ConfigModule;
use modargs::returncode::{Comparator, ReturnCodeTable};
use modargs::{ModuleParser, ModuleType};

use crate::common::{NARROW_MANIFEST, write_file};

#[test]
fn config_plugin_reads_files_given_on_command_line() {
    let dir = TempDir::new().unwrap();
    let cfg = write_file(
        dir.path(),
        "modules.json",
        r#"{
  "Dumps:hex": { "enabled": "yes", "class": "modargs.demos.HexDump" },
  "Dumps:plain": { "enabled": "no", "class": "modargs.demos.ExampleModule" }
}"#,
    );
    let mut parser = ModuleParser::builder("demo")
        .baseclass(ExampleModule::class())
        .build()
        .unwrap();
    parser.add_plugin(ConfigModule::class()).unwrap();
    parser
        .parse_args(["--config", cfg.to_str().unwrap()])
        .unwrap();

    let plugin = parser.plugin::<ConfigModule>().unwrap();
    assert_eq!(plugin.config().getplugins("Dumps").unwrap(), vec![HexDump::class()]);
}

#[test]
fn config_modules_from_manifest_need_opt_in() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "mods.json", NARROW_MANIFEST);
    let cfg = write_file(
        dir.path(),
        "default.json",
        &format!(
            r#"{{ "Output": {{ "dumper": {} }} }}"#,
            serde_json::to_string(&format!("{}:NarrowDump", manifest.display())).unwrap()
        ),
    );
    let sources = ConfigSources {
        default: Some(cfg),
        production: None,
        env_name: Some("MODARGS_IT_UNSET".to_string()),
    };

    let config = ExtendedConfig::load(&sources).unwrap();
    assert!(config.getmodule("Output", Some("dumper")).is_err());

    let config = config.with_modules_from_file(true);
    let class = config.getmodule("Output", Some("dumper")).unwrap().unwrap();
    assert_eq!(class.name(), "NarrowDump");
}

#[test]
fn return_codes_from_config() {
    let dir = TempDir::new().unwrap();
    let cfg = write_file(
        dir.path(),
        "codes.json",
        r#"{
  "Result:ok": { "value": 0 },
  "Result:warning": { "value": 1 },
  "Result:failed": { "value": 2 }
}"#,
    );
    let mut config = ExtendedConfig::new();
    config.append(&cfg);
    let table = ReturnCodeTable::from_config(&config, Comparator::Greater).unwrap();
    let warning = table.from_name("warning").unwrap();
    let ok = table.from_code(0).unwrap();
    assert_eq!(table.get_score(&[ok, warning]).unwrap().name, "warning");
}
