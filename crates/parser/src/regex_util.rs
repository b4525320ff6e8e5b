//! Lazily compiled static regex patterns.
//!
//! Patterns are compiled once and shared read-only. Callers always start a
//! fresh `captures_iter`/`find_iter`, so no match cursor is ever shared
//! between scans.

/// Declare a module-private function returning `&'static regex::Regex`,
/// backed by a `std::sync::OnceLock`.
///
/// The calling module must have `use regex::Regex;` in scope.
///
/// # Panics
///
/// Panics on first call if `$pattern` is not a valid regex; the message
/// carries the pattern text.
macro_rules! static_regex {
    (fn $fname:ident, $pattern:expr) => {
        fn $fname() -> &'static Regex {
            static STORE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
            STORE.get_or_init(|| {
                Regex::new($pattern).expect(concat!("BUG: invalid static regex: ", $pattern))
            })
        }
    };
}
pub(crate) use static_regex;
