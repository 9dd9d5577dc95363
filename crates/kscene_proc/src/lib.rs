use proc_macro::TokenStream;

mod m_keyword;

/// Derives string keyword conversions for a fieldless enum. It creates the following items:
///  * `KEYWORDS` - an associated constant listing the canonical keyword of every variant
///  * `as_str` - returns the variant's canonical keyword
///  * [`TryFrom<&str>`] and [`std::str::FromStr`], accepting canonical keywords and aliases
///  * [`std::fmt::Display`], writing the canonical keyword
///
/// By default the keyword is the variant's name in `snake_case`. It can be overridden with
/// `#[keyword("name")]`; any further strings in the attribute are accepted aliases.
///
/// **Note:** The macro assumes that `kscene_utils` is present and usable.
///
/// ## Example
/// ```norun
/// use kscene_proc::Keyword;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
/// enum Projection {
///     Perspective,
///     #[keyword("ortho", "orthographic")]
///     Orthographic,
/// }
///
/// assert_eq!(Projection::try_from("perspective"), Ok(Projection::Perspective));
/// assert_eq!("orthographic".parse(), Ok(Projection::Orthographic));
/// assert_eq!(Projection::Orthographic.as_str(), "ortho");
/// assert_eq!(Projection::KEYWORDS, &["perspective", "ortho"]);
/// ```
#[proc_macro_derive(Keyword, attributes(keyword))]
pub fn keyword_derive(input: TokenStream) -> TokenStream {
    m_keyword::keyword_derive(input)
}
