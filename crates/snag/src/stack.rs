// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded call-stack capture with deferred symbol resolution.

use std::ffi::c_void;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Maximum number of frames recorded by [`StackCapture::new`].
pub const DEFAULT_MAX_DEPTH: usize = 32;

const UNKNOWN: &str = "unknown";

/// Configuration for capturing call stacks.
///
/// The configuration is an ordinary value handed to whoever captures a stack, so different
/// components may use different limits without touching global state.
///
/// # Examples
///
/// ```rust
/// use snag::{Opt, Snag, StackCapture};
///
/// let shallow = StackCapture::new().max_depth(4);
/// let err = Snag::new("disk full").wrap([Opt::stack_with(shallow)]);
///
/// assert!(err.stack().is_some_and(|stack| stack.len() <= 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackCapture {
    max_depth: usize,
}

impl StackCapture {
    /// Creates a configuration recording at most [`DEFAULT_MAX_DEPTH`] frames.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum number of frames to record.
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the maximum number of frames recorded.
    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Captures the current call stack.
    ///
    /// With `skip == 0` the first recorded frame is the caller of this method; every
    /// increment drops one more frame from the top. Symbols are not resolved here.
    #[inline(never)]
    #[must_use]
    pub fn capture(&self, skip: usize) -> StackSnapshot {
        let frames = walk(skip + 1, self.max_depth).into_iter().map(Frame::new).collect();
        StackSnapshot { frames }
    }
}

impl Default for StackCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable, ordered snapshot of instruction pointers, innermost frame first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSnapshot {
    frames: Arc<[Frame]>,
}

impl StackSnapshot {
    /// Returns the captured frames, innermost first.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of captured frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for StackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, frame) in self.frames.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

/// A single captured frame, identified by its return address.
///
/// Displays as `"<function>\n\t<file>:<line>"`, or `"unknown"` when the address cannot be
/// resolved to a symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    ip: usize,
}

impl Frame {
    const fn new(ip: usize) -> Self {
        Self { ip }
    }

    /// Returns the raw instruction pointer of this frame.
    #[must_use]
    pub const fn ip(&self) -> usize {
        self.ip
    }

    /// Resolves the function name, file and line of this frame.
    ///
    /// Inlined call sites resolve to the innermost function.
    #[must_use]
    pub fn resolve(&self) -> Option<ResolvedFrame> {
        let mut resolved = None;
        backtrace::resolve(std::ptr::without_provenance_mut::<c_void>(self.ip), |symbol| {
            if resolved.is_some() {
                return;
            }
            if let Some(name) = symbol.name() {
                resolved = Some(ResolvedFrame {
                    function: format!("{name:#}"),
                    file: symbol.filename().map(PathBuf::from),
                    line: symbol.lineno(),
                });
            }
        });
        resolved
    }

    /// Resolves only the demangled function name of this frame.
    #[must_use]
    pub fn function_name(&self) -> Option<String> {
        self.resolve().map(|resolved| resolved.function)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:#x})", self.ip)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Some(resolved) => fmt::Display::fmt(&resolved, f),
            None => f.write_str(UNKNOWN),
        }
    }
}

/// Symbol information for a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    function: String,
    file: Option<PathBuf>,
    line: Option<u32>,
}

impl ResolvedFrame {
    /// Returns the demangled function name, without the symbol hash.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the source file, if debug information is available.
    #[must_use]
    pub fn file(&self) -> Option<&std::path::Path> {
        self.file.as_deref()
    }

    /// Returns the source line, if debug information is available.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for ResolvedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\t", self.function)?;
        match &self.file {
            Some(file) => write!(f, "{}", file.display())?,
            None => f.write_str(UNKNOWN)?,
        }
        write!(f, ":{}", self.line.unwrap_or(0))
    }
}

/// Resolves the name of the function `skip` frames above the caller.
#[inline(never)]
pub(crate) fn caller_name(skip: usize) -> String {
    walk(skip + 1, 1)
        .first()
        .and_then(|&ip| Frame::new(ip).function_name())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

/// Collects up to `limit` return addresses, starting `skip` frames above the caller.
///
/// Frames belonging to the unwinder itself are located by finding this function's own
/// activation. If the platform cannot report symbol addresses, counting starts at the top.
#[inline(never)]
#[cfg_attr(test, mutants::skip)] // stopping the walk early is not observable
fn walk(skip: usize, limit: usize) -> Vec<usize> {
    let anchor = (walk as *const ()).addr();
    let mut ips = Vec::new();
    let mut anchored_at = None;

    backtrace::trace(|frame| {
        if anchored_at.is_none() && frame.symbol_address().addr() == anchor {
            anchored_at = Some(ips.len());
        }
        ips.push(frame.ip().addr());
        anchored_at.is_none_or(|at| ips.len() < at + 1 + skip + limit)
    });

    let start = anchored_at.map_or(0, |at| at + 1) + skip;
    ips.into_iter().skip(start).take(limit).collect()
}
