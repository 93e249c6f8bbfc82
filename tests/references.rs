//! Integration tests for mention and smart-link resolution.

#[macro_use]
mod prelude;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use prelude::*;
use wikimark::{
    Converter, ConverterOptions, Dialect, DirectoryLookup, LookupError, ReferenceResolver, StaticDirectory,
    UserIdentifier, segment_blocks,
};

#[rstest]
#[case::known("[~accountid:42]", "@Ada Lovelace")]
#[case::unknown("[~accountid:7]", "@user_7")]
#[case::username("[~grace]", "@user_grace")]
fn mentions_use_directory_names(#[case] input: &str, #[case] expected: &str) {
    let converter = converter_with_users(&[("42", "Ada Lovelace")]);
    assert_eq!(converter.jira_markup_to_markdown(input), expected);
}

#[test]
fn missing_users_fall_back_to_identifiers() {
    let converter = Converter::default().with_directory(Arc::new(EmptyDirectory));
    assert_eq!(converter.jira_markup_to_markdown("[~accountid:42]"), "@user_42");
}

#[test]
fn failing_directory_does_not_fail_conversion() {
    let converter = Converter::default().with_directory(Arc::new(OfflineDirectory));
    assert_eq!(
        converter.jira_markup_to_markdown("*Owner*: [~accountid:42]"),
        "**Owner**: @user_42"
    );
}

#[rstest]
#[case::issue(
    "[ignored|https://site.atlassian.net/browse/PROJ-123?focusedComment=1|smart-link]",
    "[PROJ-123](https://site.atlassian.net/browse/PROJ-123)"
)]
#[case::page(
    "[x|https://site.atlassian.net/wiki/spaces/ENG/pages/42/PROJ-7+Design+Notes|smart-link]",
    "[Design Notes](https://site.atlassian.net/wiki/spaces/ENG/pages/42/PROJ-7+Design+Notes)"
)]
#[case::other(
    "[Spec|https://docs.example.com/spec?utm=1#sec|smart-link]",
    "[Spec](https://docs.example.com/spec)"
)]
fn smart_links_become_plain_links(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(Converter::default().jira_markup_to_markdown(input), expected);
}

#[test]
fn issue_links_use_configured_base_url() {
    let converter = Converter::new(ConverterOptions::default().with_base_url("https://jira.example/"));
    assert_eq!(
        converter.jira_markup_to_markdown("[x|https://other.net/browse/OPS-9|smart-link]"),
        "[OPS-9](https://jira.example/browse/OPS-9)"
    );
}

struct CountingDirectory {
    calls: AtomicUsize,
}

impl DirectoryLookup for CountingDirectory {
    fn lookup_user_display_name(&self, id: &UserIdentifier) -> Result<Option<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("User {id}")))
    }
}

#[test]
fn each_user_is_looked_up_once_per_call() {
    let directory = Arc::new(CountingDirectory {
        calls: AtomicUsize::new(0),
    });
    let converter = Converter::default().with_directory(directory.clone());
    let out = converter.jira_markup_to_markdown("[~accountid:1] [~accountid:1]\n* [~accountid:2] [~accountid:1]");
    assert_eq!(out, "@User 1 @User 1\n- @User 2 @User 1");
    assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn resolving_twice_changes_nothing() {
    let directory = StaticDirectory::new().with_user("42", "Ada");
    let mut blocks = segment_blocks(
        "[~accountid:42] and [~accountid:9] see [t|https://a.net/browse/X-1|smart-link]",
        Dialect::JiraMarkup,
    );
    ReferenceResolver::new(Some(&directory), None).resolve_blocks(&mut blocks);
    let once = blocks.clone();
    ReferenceResolver::new(Some(&directory), None).resolve_blocks(&mut blocks);
    assert_eq!(blocks, once);
}

#[test]
fn converter_is_shared_across_threads() {
    let converter = Arc::new(converter_with_users(&[("1", "Ada"), ("2", "Grace")]));
    thread::scope(|scope| {
        let handles: Vec<_> = ["1", "2", "3"]
            .iter()
            .map(|id| {
                let converter = Arc::clone(&converter);
                scope.spawn(move || converter.jira_markup_to_markdown(&format!("[~accountid:{id}]")))
            })
            .collect();
        let outputs: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();
        assert_eq!(outputs, ["@Ada", "@Grace", "@user_3"]);
    });
}
