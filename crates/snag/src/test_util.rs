// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test utilities for the snag crate.
//!
//! This module is only available when the `test-util` feature is enabled.

/// Asserts that a [`Snag`](crate::Snag) carries an annotation line equal to the expected text.
///
/// On failure, the full report of the error is printed.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # {
/// use snag::{Snag, assert_annotated};
///
/// let err = Snag::new("timeout").annotate("calling billing").annotate("attempt 2");
/// assert_annotated!(err, "attempt 2");
/// # }
/// ```
#[macro_export]
#[cfg_attr(coverage_nightly, coverage(off))] // coverage doesn't handle panics well
macro_rules! assert_annotated {
    ($snag:expr, $expected:expr) => {{
        let snag: &$crate::Snag = &$snag;
        let expected: &str = $expected;

        let found = snag
            .annotations()
            .iter()
            .any(|(_, text)| text.lines().any(|line| line == expected));
        if !found {
            panic!("no annotation `{expected}` in:\n{}", $crate::render(snag));
        }
    }};
}
