/// Weighted selection over raw list items carrying an optional `^N` suffix.

use rand::{Rng, RngCore};

/// A raw list item split into its value and selection weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedItem<'a> {
    pub value: &'a str,
    pub weight: f64,
}

/// Split `"sword ^2"` into `("sword", 2.0)`. Items without a well-formed
/// suffix keep their full text and weight 1.0.
pub fn parse_weight(raw: &str) -> WeightedItem<'_> {
    let trimmed = raw.trim_end();
    if let Some(caret) = trimmed.rfind('^') {
        let before = &trimmed[..caret];
        let number = &trimmed[caret + 1..];
        let preceded_by_space = before.chars().last().is_some_and(char::is_whitespace);
        if preceded_by_space && is_decimal(number) {
            if let Ok(weight) = number.parse::<f64>() {
                return WeightedItem {
                    value: before.trim_end(),
                    weight,
                };
            }
        }
    }
    WeightedItem {
        value: raw,
        weight: 1.0,
    }
}

/// The item text with any weight suffix removed.
pub fn strip_weight(raw: &str) -> &str {
    parse_weight(raw).value
}

pub fn parse_weighted<S: AsRef<str>>(items: &[S]) -> Vec<WeightedItem<'_>> {
    items.iter().map(|item| parse_weight(item.as_ref())).collect()
}

/// Pick one item with probability proportional to its weight.
///
/// Draws `r` in `[0, total)` and walks the list subtracting weights until
/// `r <= 0`. Returns `None` only for an empty list; a zero or negative
/// total, or a walk that never crosses zero, falls back to the last item.
pub fn choose<'a, 'b>(
    items: &'b [WeightedItem<'a>],
    rng: &mut dyn RngCore,
) -> Option<&'b WeightedItem<'a>> {
    let last = items.last()?;
    let total: f64 = items.iter().map(|item| item.weight).sum();
    if total.is_nan() || total <= 0.0 || total.is_infinite() {
        return Some(last);
    }

    let mut remaining = rng.gen::<f64>() * total;
    for item in items {
        remaining -= item.weight;
        if remaining <= 0.0 {
            return Some(item);
        }
    }
    Some(last)
}

/// Parse weights and choose in one step, returning the stripped value.
pub fn choose_weighted<'a, S: AsRef<str>>(
    items: &'a [S],
    rng: &mut dyn RngCore,
) -> Option<&'a str> {
    let parsed = parse_weighted(items);
    choose(&parsed, rng).map(|item| item.value)
}

fn is_decimal(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
