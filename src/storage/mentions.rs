//! User references embedded in storage XML.

use markup5ever_rcdom::Handle;
use tracing::debug;

use super::dom::{attr, child, elements, find_all, find_first, is_tag, replace_with_text};
use crate::{
    ast::UserIdentifier,
    references::{MALFORMED_PROFILE, ReferenceResolver},
};

/// Identifier carried by an `ri:user` element. Account ids take precedence
/// over server user keys and names.
pub(crate) fn user_identifier(user: &Handle) -> Option<UserIdentifier> {
    let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);
    if let Some(id) = attr(user, "ri:account-id").and_then(non_empty) {
        return Some(UserIdentifier::AccountId(id));
    }
    attr(user, "ri:userkey")
        .and_then(non_empty)
        .or_else(|| attr(user, "ri:username").and_then(non_empty))
        .map(UserIdentifier::Username)
}

/// Replace user links and profile macros under `root` with resolved text.
///
/// Each reference is handled on its own; one unresolvable user never
/// affects the others.
pub(crate) fn rewrite_user_references(root: &Handle, resolver: &mut ReferenceResolver<'_>) {
    let mut links = Vec::new();
    find_all(root, "ac:link", &mut links);
    for link in links {
        let Some(id) = find_first(&link, "ri:user").and_then(|u| user_identifier(&u)) else {
            continue;
        };
        let resolved = resolver.resolve_user(&id);
        replace_with_text(&link, &resolved.display_text);
    }

    let mut macros = Vec::new();
    find_all(root, "ac:structured-macro", &mut macros);
    for profile in macros
        .into_iter()
        .filter(|m| attr(m, "ac:name").is_some_and(|n| n.eq_ignore_ascii_case("profile")))
    {
        let text = profile_text(&profile, resolver);
        replace_with_text(&profile, &text);
    }
}

fn profile_text(profile: &Handle, resolver: &mut ReferenceResolver<'_>) -> String {
    let param = elements(profile).into_iter().find(|p| {
        is_tag(p, "ac:parameter") && attr(p, "ac:name").is_some_and(|n| n.eq_ignore_ascii_case("user"))
    });
    let Some(param) = param else {
        debug!("profile macro without a user parameter");
        return MALFORMED_PROFILE.to_string();
    };
    let Some(user) = child(&param, "ri:user") else {
        debug!("profile macro user parameter without ri:user");
        return MALFORMED_PROFILE.to_string();
    };
    resolver.resolve_profile(user_identifier(&user).as_ref()).display_text
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        references::StaticDirectory,
        storage::dom::{body, parse, serialize_children},
    };

    fn rewrite(xml: &str) -> String {
        let dir = StaticDirectory::new().with_user("1", "Ada").with_user("srv", "Bob");
        let mut resolver = ReferenceResolver::new(Some(&dir), None);
        let dom = parse(xml);
        let root = body(&dom);
        rewrite_user_references(&root, &mut resolver);
        serialize_children(&root).expect("serialize")
    }

    #[rstest]
    #[case(r#"<p><ac:link><ri:user ri:account-id="1"/></ac:link></p>"#, "<p>@Ada</p>")]
    #[case(r#"<p><ac:link><ri:user ri:account-id="2"/></ac:link></p>"#, "<p>@user_2</p>")]
    #[case(r#"<p><ac:link><ri:user ri:userkey="srv"/></ac:link></p>"#, "<p>@Bob</p>")]
    #[case(
        r#"<p><ac:link><ri:page ri:content-title="Home"/></ac:link></p>"#,
        r#"<p><ac:link><ri:page ri:content-title="Home"></ri:page></ac:link></p>"#
    )]
    fn user_links(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(rewrite(xml), expected);
    }

    #[rstest]
    #[case(
        r#"<ac:structured-macro ac:name="profile"><ac:parameter ac:name="user"><ri:user ri:account-id="1"/></ac:parameter></ac:structured-macro>"#,
        "@Ada"
    )]
    #[case(
        r#"<ac:structured-macro ac:name="profile"><ac:parameter ac:name="user"><ri:user ri:account-id="9"/></ac:parameter></ac:structured-macro>"#,
        "[User Profile: 9]"
    )]
    #[case(
        r#"<ac:structured-macro ac:name="profile"><ac:parameter ac:name="user"><ri:user/></ac:parameter></ac:structured-macro>"#,
        "[User Profile: unknown_user]"
    )]
    #[case(
        r#"<ac:structured-macro ac:name="profile"><ac:parameter ac:name="user"></ac:parameter></ac:structured-macro>"#,
        "[User Profile Macro (Malformed)]"
    )]
    #[case(r#"<ac:structured-macro ac:name="profile"></ac:structured-macro>"#, "[User Profile Macro (Malformed)]")]
    fn profile_macros(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(rewrite(xml), expected);
    }
}
