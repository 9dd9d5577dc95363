//! Various utilities shared by the kscene crates

use std::fmt::{self, Display};

mod escape_display;
pub use escape_display::*;

mod result_ext;
pub use result_ext::AnyhowResultExt;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;

/// Shorthand for `Ok(())`, cause it looks ugly
pub const fn ok<E>() -> Result<(), E> {
    Ok(())
}

/// Used by the [`kscene_proc::Keyword`] derive macro
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected `{}`, expected {}", EscapeDisplay(.input), OneOf(.expected))]
pub struct KeywordParseError {
    /// The string that didn't match any keyword
    pub input: String,
    /// Every keyword accepted by the target type
    pub expected: &'static [&'static str],
}

/// Formats a keyword list as "`a`", "`a` or `b`", or "one of `a`, `b`, `c`".
///
/// ## Example
/// ```
/// use kscene_utils::OneOf;
/// assert_eq!(OneOf(&["a"]).to_string(), "`a`");
/// assert_eq!(OneOf(&["a", "b"]).to_string(), "`a` or `b`");
/// assert_eq!(OneOf(&["a", "b", "c"]).to_string(), "one of `a`, `b`, `c`");
/// ```
pub struct OneOf<'a>(pub &'a [&'a str]);

impl Display for OneOf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => write!(f, "nothing"),
            [single] => write!(f, "`{single}`"),
            [a, b] => write!(f, "`{a}` or `{b}`"),
            all => {
                write!(f, "one of ")?;
                for (i, keyword) in all.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{keyword}`")?;
                }
                ok()
            }
        }
    }
}
