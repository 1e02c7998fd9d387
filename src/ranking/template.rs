use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::params::RowParams;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"%([a-z0-9_]+)%").expect("static placeholder regex"))
}

/// Replace every `%name%` whose name is a key of `params`. Unknown tokens are
/// left verbatim so a later pass (or the reader) can see them.
pub fn substitute(template: &str, params: &RowParams) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures<'_>| match params.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names used by a template.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    placeholder_re()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
