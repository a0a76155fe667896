// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Snag;

/// Returns the first error present, if any.
///
/// # Examples
///
/// ```rust
/// use snag::{Snag, first_err};
///
/// let err = first_err([None, Some(Snag::new("first")), Some(Snag::new("second"))]);
/// assert_eq!(err.unwrap().to_string(), "first");
/// ```
#[must_use]
pub fn first_err(errors: impl IntoIterator<Item = Option<Snag>>) -> Option<Snag> {
    errors.into_iter().flatten().next()
}

/// Runs `steps` in order, stopping at the first one that fails.
///
/// # Errors
///
/// Returns the error of the first failing step; later steps do not run.
///
/// # Examples
///
/// ```rust
/// use snag::first_failure;
///
/// let mut ran = Vec::new();
/// let steps: [fn() -> Result<(), &'static str>; 3] = [
///     || Ok(()),
///     || Err("second step failed"),
///     || Err("third step never runs"),
/// ];
///
/// let err = first_failure(steps.into_iter().inspect(|_| ran.push(()))).unwrap_err();
/// assert_eq!(err.to_string(), "second step failed");
/// assert_eq!(ran.len(), 2);
/// ```
pub fn first_failure<F, E>(steps: impl IntoIterator<Item = F>) -> Result<(), Snag>
where
    F: FnOnce() -> Result<(), E>,
    E: Into<Snag>,
{
    for step in steps {
        step().map_err(Into::into)?;
    }
    Ok(())
}
