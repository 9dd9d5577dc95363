use crate::ok;
use std::fmt::{self, Display};

/// Wrapper type for displaying user-provided text inside diagnostics. Control characters are
/// displayed as their Rust escape sequences (`\n`, `\t`, `\u{1b}`), and backticks as `` \` ``, so
/// the text can't break out of the surrounding quoting. Its behavior is implemented through the
/// [`Display`] trait.
///
/// ## Example
/// ```
/// # use kscene_utils::EscapeDisplay;
/// let a = EscapeDisplay("dragon");
/// assert_eq!(a.to_string(), "dragon");
///
/// let b = EscapeDisplay("a\nb`c");
/// assert_eq!(b.to_string(), "a\\nb\\`c");
/// ```
pub struct EscapeDisplay<'a>(pub &'a str);

impl<'a> Display for EscapeDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c == '`' {
                write!(f, "\\`")?;
            } else if c.is_control() {
                write!(f, "{}", c.escape_default())?;
            } else {
                write!(f, "{c}")?;
            }
        }
        ok()
    }
}
