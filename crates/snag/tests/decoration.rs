// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(missing_docs, reason = "Test code")]

use std::io;

use snag::{Context, Decorate, Opt, Snag, StackCapture, render, same_cause};

#[derive(Debug, thiserror::Error)]
#[error("request failed")]
struct RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>);

#[inline(never)]
fn read_block() -> Result<Vec<u8>, Snag> {
    Err(Snag::new(io::Error::new(io::ErrorKind::UnexpectedEof, "short read")).with_stack())
}

#[inline(never)]
fn read_header() -> Result<Vec<u8>, Snag> {
    read_block().wrap([Opt::stack(), Opt::annotation("reading header"), Opt::value("offset", 512_u64)])
}

#[inline(never)]
fn annotate_later(err: Snag) -> Snag {
    err.annotate("outside the stack")
}

#[test]
fn absent_error_stays_absent() {
    let none: Option<Snag> = None;
    assert!(none.clone().with_stack().is_none());
    assert!(none.clone().annotate("a").is_none());
    assert!(none.clone().with_suppressed("s").is_none());
    assert!(none.clone().with_value("k", "v").is_none());
    assert!(none.wrap([Opt::stack(), Opt::annotation("a")]).is_none());

    let ok: Result<(), Snag> = Ok(());
    assert!(ok.with_stack().annotate("a").with_suppressed("s").with_value("k", 1).is_ok());
}

#[test]
#[cfg_attr(miri, ignore)]
fn first_stack_wins() {
    let first = Snag::new("e").with_stack();
    let stack = first.stack().unwrap().clone();

    let again = first.with_stack().wrap([Opt::stack_with(StackCapture::new().max_depth(1))]);
    assert_eq!(again.stack(), Some(&stack));

    let err = read_header().unwrap_err();
    let top = err.stack().unwrap().frames()[0].function_name().unwrap();
    assert!(top.ends_with("read_block"), "deepest stack should win, got {top}");
}

#[test]
fn first_value_wins() {
    let err = Snag::new("e").with_value("k", "a").with_value("k", "b");
    assert_eq!(err.find_value::<_, &str>(&"k"), Some(&"a"));

    let err = Snag::new("e").with_value("k", "a").wrap([Opt::value("k", "b"), Opt::value("other", "c")]);
    assert_eq!(err.find_value::<_, &str>(&"k"), Some(&"a"));
    assert_eq!(err.find_value::<_, &str>(&"other"), Some(&"c"));
}

#[test]
#[cfg_attr(miri, ignore)]
fn annotations_from_one_call_site_accumulate() {
    let err = Snag::new("e").annotate("first").annotate("second");
    let annotations = err.annotations();
    assert_eq!(annotations.len(), 1);

    let (origin, text) = annotations.iter().next().unwrap();
    assert!(origin.ends_with("annotations_from_one_call_site_accumulate"), "got {origin}");
    assert_eq!(text, "first\nsecond");
}

#[test]
fn cause_is_stable_under_decoration() {
    let err = Snag::new(io::Error::other("root"));
    let decorated = err
        .clone()
        .with_stack()
        .annotate("a")
        .with_suppressed("s")
        .with_value(1_u32, "one")
        .wrap([Opt::annotation("b"), Opt::stack()]);

    assert!(same_cause(&err, &decorated));
    assert!(std::ptr::addr_eq(err.cause(), decorated.cause()));
    assert_eq!(decorated.to_string(), "root");
}

#[test]
fn suppressed_errors_are_listed_most_recent_first() {
    let s1 = Snag::new("s1");
    let s2 = Snag::new("s2");
    let err = Snag::new("e").with_suppressed(s1.clone()).with_suppressed(s2.clone());

    let suppressed = err.suppressed();
    assert_eq!(suppressed.len(), 2);
    assert!(suppressed[0].is_same_cause(&s2));
    assert!(suppressed[1].is_same_cause(&s1));
}

#[test]
#[cfg_attr(miri, ignore)]
fn rendering_is_stable_and_follows_stack_order() {
    let err = annotate_later(read_header().unwrap_err())
        .with_suppressed(Snag::new("cleanup failed").annotate("closing file"));

    let first = render(&err);
    assert_eq!(first, render(&err));

    let header = first.find("\t\treading header").unwrap();
    let stack = first.find("\nSTACK:\n").unwrap();
    let leftovers = first.find("\nELSE ANNOTATIONS:\n").unwrap();
    let suppressed = first.find("\nSUPPRESSED:\n").unwrap();
    assert!(stack < header && header < leftovers && leftovers < suppressed);
    assert!(first[leftovers..suppressed].contains("\toutside the stack\n"));
    assert!(first[suppressed..].contains("closing file"));
}

#[test]
fn foreign_wrappers_keep_context_reachable() {
    let inner = Snag::new("timeout").with_value("attempt", 3_u8).annotate("calling upstream");
    let outer = Snag::new(RequestFailed(inner.clone().into_std_error()))
        .with_value("route", "/orders")
        .with_value("attempt", 9_u8);

    assert_eq!(outer.to_string(), "request failed");
    assert_eq!(outer.find_value::<_, &str>(&"route"), Some(&"/orders"));
    // the value recorded deeper in the chain was written first
    assert_eq!(outer.find_value::<_, u8>(&"attempt"), Some(&3));
    assert_eq!(outer.annotations().len(), 1);
    assert!(!outer.is_same_cause(&inner));

    let contexts: Vec<_> = outer.contexts().collect();
    assert_eq!(contexts.len(), 3);
    assert!(matches!(contexts[0], Context::Value(_)));
    assert!(matches!(contexts[1], Context::Annotation(_)));
    assert!(matches!(contexts[2], Context::Value(_)));
}

#[test]
fn find_value_needs_matching_key_type() {
    let err = Snag::new("e").with_value(String::from("k"), 1_u8);
    assert_eq!(err.find_value::<_, u8>(&String::from("k")), Some(&1));
    assert!(err.find_value::<_, u8>(&"k").is_none());
}
