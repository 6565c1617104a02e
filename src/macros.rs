/// Lazily compiled `'static` regex for the fixed-algorithm rules.
///
/// Patterns are string literals checked by the rule tests, so a compile
/// failure is a programming error.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
