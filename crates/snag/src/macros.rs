// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Creates a [`Snag`](crate::Snag) with a stack captured where the macro is invoked.
///
/// The macro accepts:
/// - A string literal, with inline format arguments: `snag!("user {id} not found")`
/// - A format string with arguments: `snag!("retry {} of {}", n, max)`
/// - An error expression: `snag!(io_error)`
///
/// # Examples
///
/// ```rust
/// use snag::{Snag, snag};
///
/// fn find_user(id: u32) -> Result<String, Snag> {
///     Err(snag!("user {id} not found"))
/// }
///
/// let err = find_user(3).unwrap_err();
/// assert_eq!(err.to_string(), "user 3 not found");
/// assert!(err.stack().is_some());
/// ```
///
/// ```rust
/// use snag::snag;
///
/// let err = snag!(std::io::Error::other("socket closed"));
/// assert!(err.find_cause::<std::io::Error>().is_some());
/// ```
#[macro_export]
macro_rules! snag {
    ($msg:literal $(,)?) => {
        $crate::Snag::new(format!($msg)).with_stack_skip(0)
    };
    ($err:expr $(,)?) => {
        $crate::Snag::new($err).with_stack_skip(0)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Snag::new(format!($fmt, $($arg)*)).with_stack_skip(0)
    };
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    #[test]
    fn literal_with_inline_arguments() {
        let id = 7;
        assert_eq!(snag!("item {id} missing").to_string(), "item 7 missing");
        assert_eq!(snag!("trailing comma",).to_string(), "trailing comma");
    }

    #[test]
    fn format_string_with_arguments() {
        assert_eq!(snag!("{} of {}", 2, 3).to_string(), "2 of 3");
    }

    #[test]
    fn error_expression() {
        let err = snag!(std::fmt::Error);
        assert!(err.find_cause::<std::fmt::Error>().is_some());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn stack_starts_at_invocation() {
        let err = snag!("here");
        let top = err.stack().unwrap().frames()[0].function_name().unwrap();
        assert!(top.ends_with("stack_starts_at_invocation"), "got {top}");
    }
}
