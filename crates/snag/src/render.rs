// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Human-readable reports of decorated errors.
//!
//! A report has up to four kinds of sections, each present only when there is something to show:
//!
//! ```text
//! ERROR:
//! <cause message>
//! caused by: <source of the cause>
//!
//! STACK:
//! <function>
//! 	<file>:<line>
//! 	ANNOTATION:
//! 		<text attached by that function>
//!
//! ELSE ANNOTATIONS:
//! <function missing from the stack>:
//! 	<text>
//!
//! SUPPRESSED:
//! <nested report>
//! ```
//!
//! Output is deterministic: annotations follow stack order, and the leftovers follow the order in
//! which their functions first annotated the chain.

use std::error::Error as StdError;
use std::fmt;
use std::iter;

use crate::Snag;
use crate::stack::ResolvedFrame;

/// Renders the full report of `snag`.
///
/// # Examples
///
/// ```rust
/// use snag::Snag;
///
/// let err = Snag::new("primary failure").with_suppressed(Snag::new("rollback failed"));
///
/// assert_eq!(
///     snag::render(&err),
///     "ERROR:\nprimary failure\n\nSUPPRESSED:\nERROR:\nrollback failed\n"
/// );
/// ```
#[must_use]
pub fn render(snag: &Snag) -> String {
    snag.report().to_string()
}

/// Display adapter printing the full report of a [`Snag`].
///
/// Created by [`Snag::report`].
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    snag: &'a Snag,
}

impl<'a> Report<'a> {
    pub(crate) fn new(snag: &'a Snag) -> Self {
        Self { snag }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snag = self.snag;

        writeln!(f, "ERROR:")?;
        let cause: &(dyn StdError + 'static) = snag.cause();
        writeln!(f, "{cause:#}")?;
        for source in iter::successors(cause.source(), |error| (*error).source()) {
            writeln!(f, "caused by: {source}")?;
        }

        let annotations = snag.annotations();
        let mut pending: Vec<_> = annotations.iter().map(Some).collect();

        if let Some(stack) = snag.stack() {
            write!(f, "\nSTACK:\n")?;
            for frame in stack.frames() {
                let resolved = frame.resolve();
                match &resolved {
                    Some(resolved) => writeln!(f, "{resolved}")?,
                    None => writeln!(f, "unknown")?,
                }

                let Some(function) = resolved.as_ref().map(ResolvedFrame::function) else {
                    continue;
                };
                let matching = pending
                    .iter()
                    .position(|entry| matches!(entry, Some((origin, _)) if *origin == function));
                if let Some((_, text)) = matching.and_then(|index| pending[index].take()) {
                    writeln!(f, "\tANNOTATION:")?;
                    write_lines(f, "\t\t", text)?;
                }
            }
        }

        let leftovers: Vec<_> = pending.into_iter().flatten().collect();
        if !leftovers.is_empty() {
            write!(f, "\nELSE ANNOTATIONS:\n")?;
            for (origin, text) in leftovers {
                writeln!(f, "{origin}:")?;
                write_lines(f, "\t", text)?;
            }
        }

        for suppressed in snag.suppressed() {
            write!(f, "\nSUPPRESSED:\n")?;
            fmt::Display::fmt(&suppressed.report(), f)?;
        }

        Ok(())
    }
}

fn write_lines(f: &mut fmt::Formatter<'_>, indent: &str, text: &str) -> fmt::Result {
    for line in text.lines() {
        writeln!(f, "{indent}{line}")?;
    }
    Ok(())
}
