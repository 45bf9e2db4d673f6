use std::path::PathBuf;

use thiserror::Error;

// Re-export a simple Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the module system, the composing parser and the helper
/// collaborators can report.
#[derive(Error, Debug)]
pub enum Error {
    // ---- Resolution ---------------------------------------------------------
    /// Identifier could not be split, package or symbol missing, or the symbol
    /// does not extend the expected base capability.
    #[error("Module resolution error: {0}")]
    ModuleResolution(String),

    /// A module location named a file but file loading was not enabled.
    #[error("loading a module from a file is not allowed: {0}")]
    ModuleFromFileDisallowed(PathBuf),

    /// A `-m` or sub-module value that neither an entry point nor the
    /// resolver could locate.
    #[error("Module '{value}' not found! Valid modules are: {}", choices.join(", "))]
    UnknownModule { value: String, choices: Vec<String> },

    /// Selected module is not related to the required base capability.
    #[error("Module '{module}' is not a subclass of {expected}")]
    NotSubclass { module: String, expected: String },

    /// Selected module is the base capability itself.
    #[error("Module '{0}' must not be the baseclass itself")]
    ModuleIsBaseclass(String),

    /// Class does not descend from `BaseModule`.
    #[error("'{0}' is not a module; it does not extend BaseModule")]
    NotAModule(String),

    /// Baseclass given to a sub-module declaration or to the parser is unusable.
    #[error("Invalid baseclass: {0}")]
    InvalidBaseclass(String),

    /// `add_plugin` received a class that is not a plugin.
    #[error("'{0}' is not a plugin; plugins must extend ModuleParserPlugin")]
    NotAPlugin(String),

    /// `add_module` received a plugin class.
    #[error("'{0}' is a plugin; register it with add_plugin instead")]
    PluginAsModule(String),

    /// A module manifest file could not be decoded.
    #[error("Invalid module manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ---- Module arguments ---------------------------------------------------
    /// Tokens could not be parsed against a module's own definitions.
    #[error("Invalid module arguments: {0}")]
    InvalidModuleArguments(String),

    /// Keyword override that matches no declared option.
    #[error("keyword argument {0} has no param")]
    UnknownKeyword(String),

    /// Keyword override whose value does not match the declared kind.
    #[error("Value {value} for parameter {key} is not an instance of {expected}")]
    WrongValueType {
        key: String,
        value: String,
        expected: String,
    },

    // ---- Grammar ------------------------------------------------------------
    /// Malformed option definition (bad flag spelling, missing dest, ...).
    #[error("Invalid option definition: {0}")]
    InvalidOption(String),

    /// Two merged argument sets define the same flag differently.
    #[error("Conflicting option: {0}")]
    OptionConflict(String),

    /// A token could not be converted to the option's value kind.
    #[error("Invalid value '{value}' for {dest}: expected {expected}")]
    InvalidValue {
        dest: String,
        value: String,
        expected: String,
    },

    /// Hard command-line failure from the final grammar (exit code 2).
    #[error(transparent)]
    Usage(#[from] clap::Error),

    // ---- Class properties ---------------------------------------------------
    #[error("can't set attribute {0}")]
    AttributeNotSettable(String),

    // ---- Config -------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing configuration item: [{section}] {option}")]
    ConfigItemMissing { section: String, option: String },

    #[error("Default configuration '{}' not found", .0.display())]
    DefaultConfigNotFound(PathBuf),

    // ---- Return codes -------------------------------------------------------
    #[error("Not a valid return code: {0}")]
    InvalidReturnCode(String),

    // ---- Plumbing -----------------------------------------------------------
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ----------------------- Convenience constructors ----------------------------

impl Error {
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        Error::ModuleResolution(msg.into())
    }
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
    pub fn invalid_option<S: Into<String>>(msg: S) -> Self {
        Error::InvalidOption(msg.into())
    }

    /// Errors that only describe a bad token value; discovery passes tolerate
    /// these and leave reporting to the final strict parse.
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidValue { .. } | Error::InvalidModuleArguments(_)
        )
    }

    /// Process exit code the command-line surface uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(err) => err.exit_code(),
            _ => 2,
        }
    }
}

/// Map an `Option<T>` into `Result<T, Error::ConfigItemMissing>`.
pub fn require_config_item<T>(opt: Option<T>, section: &str, option: &str) -> Result<T> {
    opt.ok_or_else(|| Error::ConfigItemMissing {
        section: section.to_string(),
        option: option.to_string(),
    })
}
