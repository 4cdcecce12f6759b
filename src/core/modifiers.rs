/// Text modifiers and the indefinite-article pass.

use crate::schema::ast::Modifier;

/// Placeholder emitted for `{a}` until the surrounding output is known.
pub const ARTICLE_PLACEHOLDER: &str = "{a}";

/// Apply one modifier. `Markov` is not a string transform (it replaces
/// selection itself) and passes its input through unchanged here.
pub fn apply(modifier: Modifier, input: &str) -> String {
    match modifier {
        Modifier::Capitalize => capitalize(input),
        Modifier::Lowercase => input.to_lowercase(),
        Modifier::PluralForm => plural_form(input),
        Modifier::Markov => input.to_string(),
    }
}

/// Apply a modifier chain left to right.
pub fn apply_all(modifiers: &[Modifier], input: String) -> String {
    modifiers
        .iter()
        .fold(input, |text, modifier| apply(*modifier, &text))
}

/// First character uppercase, the rest lowercase.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Heuristic English plural of the last word.
pub fn plural_form(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    if ends_with_ignore_case(input, "fe") {
        return format!("{}ves", &input[..input.len() - 2]);
    }
    if ends_with_ignore_case(input, "f") {
        return format!("{}ves", &input[..input.len() - 1]);
    }
    if ends_with_ignore_case(input, "y") {
        let stem = &input[..input.len() - 1];
        if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "sh", "ch", "x", "z"]
        .iter()
        .any(|end| ends_with_ignore_case(input, end))
    {
        return format!("{}es", input);
    }
    format!("{}s", input)
}

fn ends_with_ignore_case(input: &str, suffix: &str) -> bool {
    input.len() >= suffix.len()
        && input.is_char_boundary(input.len() - suffix.len())
        && input[input.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Replace each `{a}` placeholder with `a ` or `an ` depending on the
/// word that follows it. A placeholder with no following word is
/// dropped together with its trailing whitespace.
pub fn resolve_articles(input: &str) -> String {
    if !input.contains(ARTICLE_PLACEHOLDER) {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(ARTICLE_PLACEHOLDER) {
        out.push_str(&rest[..pos]);
        let after = rest[pos + ARTICLE_PLACEHOLDER.len()..].trim_start();
        // A doubled placeholder defers to the next one.
        if !after.starts_with(ARTICLE_PLACEHOLDER) {
            if let Some(c) = after.chars().next().filter(|c| c.is_alphanumeric()) {
                out.push_str(if is_vowel(c) { "an " } else { "a " });
            }
        }
        rest = after;
    }
    out.push_str(rest);
    out
}
