use std::any::Any;

use modargs::arg::ArgumentSet;
use modargs::module::registry::{self, Package};
use modargs::module::ArgumentsHook;
use modargs::{
    BaseModule, Error, Module, ModuleArgs, ModuleClass, ModuleParser, ModuleType, OptionSpec,
    Resolver, Value,
};

/// Base of text transforms.
pub struct Transform {
    args: ModuleArgs,
}

impl Module for Transform {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for Transform {
    const NAME: &'static str = "Transform";
    const PACKAGE: &'static str = "it.transforms";
    const CONFIG_PREFIX: Option<&'static str> = Some("Transforms");

    fn parent() -> Option<ModuleClass> {
        Some(BaseModule::class())
    }
    fn from_args(args: ModuleArgs) -> modargs::Result<Self> {
        Ok(Self { args })
    }
}

pub struct Repeat {
    args: ModuleArgs,
    times: usize,
}

fn repeat_arguments(parser: &mut ArgumentSet) -> modargs::Result<()> {
    parser.add_argument(
        OptionSpec::new(["--repeat-times"])
            .int()
            .default(Value::Int(2))
            .help("how often to repeat the text"),
    )
}

impl Module for Repeat {
    fn args(&self) -> &ModuleArgs {
        &self.args
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModuleType for Repeat {
    const NAME: &'static str = "Repeat";
    const PACKAGE: &'static str = "it.transforms";
    const DOC: &'static str = "Repeat the text\n\nLonger description.";

    fn parent() -> Option<ModuleClass> {
        Some(Transform::class())
    }
    fn arguments() -> Option<ArgumentsHook> {
        Some(repeat_arguments)
    }
    fn from_args(args: ModuleArgs) -> modargs::Result<Self> {
        let times = args.namespace().int("repeat_times").unwrap_or(2);
        let times = usize::try_from(times)
            .map_err(|_| Error::InvalidModuleArguments(format!("negative repeat: {times}")))?;
        Ok(Self { args, times })
    }
}

impl Repeat {
    fn apply(&self, text: &str) -> String {
        text.repeat(self.times)
    }
}

fn register() {
    registry::register_package(
        Package::new("it.transforms")
            .with_type::<Transform>()
            .with_type::<Repeat>(),
    )
    .unwrap();
    registry::register_entry_point("Transform", "repeat", Repeat::class()).unwrap();
}

fn transform_parser() -> ModuleParser {
    register();
    ModuleParser::builder("transform")
        .baseclass(Transform::class())
        .baseclass_as_default(false)
        .build()
        .unwrap()
}

#[test]
fn external_packages_resolve() {
    register();
    let classes = Resolver::new()
        .resolve(&["it.transforms.Repeat", "it.transforms:Transform"])
        .unwrap();
    assert_eq!(classes, vec![Repeat::class(), Transform::class()]);
    assert_eq!(Repeat::class().doc(), "Repeat the text");
    assert_eq!(Repeat::class().config_section_name(), "Transforms:Repeat");
}

#[test]
fn external_entry_points_select_modules() {
    let mut parser = transform_parser();
    let args = parser.parse_args(["-m", "repeat", "--repeat-times", "3"]).unwrap();
    let modules = args.modules("modules");
    assert_eq!(modules, vec![Repeat::class()]);

    let module = modules[0]
        .instantiate(&modargs::arg::tokens(["--repeat-times", "3"]), &[])
        .unwrap();
    let repeat = module.as_any().downcast_ref::<Repeat>().unwrap();
    assert_eq!(repeat.apply("ab"), "ababab");
}

#[test]
fn keyword_overrides_win_over_tokens() {
    register();
    let repeat = Repeat::new(
        &modargs::arg::tokens(["--repeat-times", "3"]),
        &[("repeat_times", Value::Int(1))],
    )
    .unwrap();
    assert_eq!(repeat.apply("ab"), "ab");
}

#[test]
fn negative_values_reach_the_module() {
    register();
    let err = Repeat::new(&modargs::arg::tokens(["--repeat-times", "-1"]), &[])
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidModuleArguments(_)));
}

#[test]
fn demo_modules_are_not_transforms() {
    let mut parser = transform_parser();
    let err = parser.parse_args(["-m", "modargs.demos.HexDump"]).unwrap_err();
    assert!(matches!(err, Error::NotSubclass { .. }));
}
