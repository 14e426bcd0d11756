//! Crate-wide macros.

/// Declare `static` regexes that compile on first use.
///
/// Each entry names the static and its pattern; a pattern that fails to
/// compile panics with the static's name.
///
/// # Examples
///
/// ```
/// wrap::lazy_regex! {
///     FOOTNOTE = r"^\[\^[^]]+\]:";
///     ABBR = r"^\*\[[^]]+\]:";
/// }
///
/// assert!(FOOTNOTE.is_match("[^1]: note"));
/// assert!(!ABBR.is_match("[^1]: note"));
/// ```
#[macro_export]
macro_rules! lazy_regex {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $pattern:expr;)+) => {
        $(
            $(#[$meta])*
            $vis static $name: ::std::sync::LazyLock<::regex::Regex> =
                ::std::sync::LazyLock::new(|| {
                    ::regex::Regex::new($pattern)
                        .expect(concat!("regex ", stringify!($name), " should compile"))
                });
        )+
    };
}
