use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use modargs::demos::{ExampleModule, executor};
use modargs::plugins::ConfigModule;
use modargs::{ModuleParser, ModuleType, Namespace, OptionSpec, logging};

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("{err}");
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<modargs::Error>()
                .map(modargs::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn build_parser() -> Result<ModuleParser> {
    let mut parser = ModuleParser::builder("modargs")
        .description("Run demo modules over some input data")
        .baseclass(ExampleModule::class())
        .modules_from_file(true)
        .build()?;
    parser.add_argument(
        OptionSpec::new(["-i", "--input"])
            .path()
            .metavar("FILE")
            .help("file to read, stdin when omitted"),
    )?;
    parser.add_argument(OptionSpec::new(["--text"]).help("use this text as input"))?;
    parser.add_argument(
        OptionSpec::new(["--show-args"])
            .flag()
            .help("print the parsed arguments as JSON and exit"),
    )?;
    parser.add_plugin(ConfigModule::class())?;
    Ok(parser)
}

fn read_input(args: &Namespace) -> Result<Vec<u8>> {
    if let Some(text) = args.str("text") {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(path) = args.path("input") {
        return fs::read(path).with_context(|| format!("failed to read {}", path.display()));
    }
    let mut data = Vec::new();
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        stdin.lock().read_to_end(&mut data).context("failed to read stdin")?;
    }
    Ok(data)
}

fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut parser = build_parser()?;
    let args = parser.parse_args_or_exit(&argv)?;

    if args.flag("show_args") {
        println!("{}", serde_json::to_string_pretty(&args)?);
        return Ok(());
    }
    if let Some(plugin) = parser.plugin::<ConfigModule>() {
        for section in plugin.config().sections() {
            debug!(section, "config section loaded");
        }
    }

    let mut data = read_input(&args)?;
    let mut out = io::stdout().lock();
    for class in args.modules("modules") {
        let module = class
            .instantiate(&argv, &[])
            .with_context(|| format!("failed to initialize {class}"))?;
        let Some(exec) = executor(module.as_ref()) else {
            warn!(module = %class, "module cannot process data");
            continue;
        };
        if let Some(next) = exec.execute(&data, &mut out)? {
            data = next;
        }
    }
    Ok(())
}
