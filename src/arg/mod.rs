
pub mod argument_set;
pub mod option_spec;
pub mod token_stream;
pub mod values;

pub use argument_set::{ArgumentSet, SubModuleSlot};
pub use option_spec::{Action, OptionSpec};
pub use token_stream::{RawMatches, TokenStream};
pub use values::{Namespace, Value, ValueKind};

/// Collect anything string-like into owned tokens.
pub fn tokens<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    raw.into_iter().map(Into::into).collect()
}
