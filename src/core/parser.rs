/// Template parser — turns a template string into a `Node` tree.
///
/// Syntax:
/// - `[path.to.table]` → `TableRef`, with optional trailing modifiers
///   (`.capitalize`, `.lowercase`, `.pluralForm`, `.markov`) and clauses
///   `!exclude`, `*3`, `*{1-3}`, `?` inside the brackets
/// - `{A&B}` → `And`, `{A|B}` → `Or`, `{(A&B)|C}` → `Group`
/// - `{2-8}` → `NumberRange`
/// - `{a}` → `IndefiniteArticle`
/// - Everything else → `Text`
///
/// Parsing is total: malformed regions degrade to literal text.

use crate::schema::ast::{Modifier, Node, Repetition, TableRef};

/// Characters that end the path part of a table reference.
const CLAUSE_CHARS: &[char] = &['!', '?', '*', '^'];

/// Regions nested deeper than this are kept as literal text.
const MAX_NESTING: usize = 64;

/// Repetition counts above this are clamped, so `[t*4000000000]` stays cheap.
pub const MAX_REPETITION: u32 = 1000;

/// Parse a full template: text interleaved with `[...]` and `{...}` regions.
pub fn parse(template: &str) -> Node {
    parse_template(template, 0)
}

/// Parse the content of a `{...}` region (braces already stripped).
pub fn parse_inline(content: &str) -> Node {
    parse_expression(content, 0)
}

fn parse_template(template: &str, depth: usize) -> Node {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let open = bytes[i];
        if open != b'[' && open != b'{' {
            let next = next_char_boundary(template, i);
            literal.push_str(&template[i..next]);
            i = next;
            continue;
        }

        let Some(close) = find_matching(template, i) else {
            // Unmatched: the bracket is literal text
            literal.push(open as char);
            i += 1;
            continue;
        };

        let inner = &template[i + 1..close];
        let node = if open == b'[' {
            parse_table_ref(inner)
                .map(Node::TableRef)
                .unwrap_or_else(|| Node::text(&template[i..=close]))
        } else if depth >= MAX_NESTING {
            Node::text(&template[i..=close])
        } else {
            parse_expression(inner, depth + 1)
        };

        match node {
            Node::Text(text) => literal.push_str(&text),
            other => {
                if !literal.is_empty() {
                    nodes.push(Node::Text(std::mem::take(&mut literal)));
                }
                nodes.push(other);
            }
        }
        i = close + 1;
    }

    if !literal.is_empty() || nodes.is_empty() {
        nodes.push(Node::Text(literal));
    }

    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::Mixed(nodes)
    }
}

fn parse_expression(content: &str, depth: usize) -> Node {
    let mut content = content.trim();
    if depth >= MAX_NESTING {
        return Node::text(content);
    }

    let parts = split_top_level(content, '&');
    if parts.len() > 1 {
        return Node::And(
            parts
                .into_iter()
                .map(|part| parse_expression(part, depth + 1))
                .collect(),
        );
    }
    if let Some(only) = parts.first() {
        content = only;
    }

    let parts = split_top_level(content, '|');
    if parts.len() > 1 {
        return Node::Or(
            parts
                .into_iter()
                .map(|part| parse_expression(part, depth + 1))
                .collect(),
        );
    }
    if let Some(only) = parts.first() {
        content = only;
    }

    if content.starts_with('(') && find_matching(content, 0) == Some(content.len() - 1) {
        let inner = parse_expression(&content[1..content.len() - 1], depth + 1);
        return Node::Group(Box::new(inner));
    }

    if let Some((min, max)) = parse_number_range(content) {
        return Node::NumberRange {
            min: min.min(max),
            max: min.max(max),
        };
    }

    if content == "a" {
        return Node::IndefiniteArticle;
    }

    if content.contains(['[', '{']) {
        return parse_operand(content, depth);
    }
    Node::text(content)
}

/// Parse an operand that still holds sigil regions. A lone table
/// reference may carry its clauses after the closing bracket: `[b]?`.
fn parse_operand(part: &str, depth: usize) -> Node {
    if part.starts_with('[') {
        if let Some(close) = find_matching(part, 0) {
            let suffix = &part[close + 1..];
            if is_clause_suffix(suffix) {
                let merged = format!("{}{}", &part[1..close], suffix);
                if let Some(table_ref) = parse_table_ref(&merged) {
                    return Node::TableRef(table_ref);
                }
            }
        }
    }
    parse_template(part, depth + 1)
}

/// True when `suffix` is only clauses. The one place a brace may appear
/// is a `*{min-max}` count.
pub(crate) fn is_clause_suffix(suffix: &str) -> bool {
    if !suffix.starts_with(CLAUSE_CHARS) {
        return false;
    }
    let mut rest = suffix;
    while let Some(pos) = rest.find(['[', ']', '{', '}']) {
        if !rest[pos..].starts_with('{') || !rest[..pos].ends_with('*') {
            return false;
        }
        match rest[pos..].find('}') {
            Some(close) => rest = &rest[pos + close + 1..],
            None => return false,
        }
    }
    true
}

/// Parse the content of a `[...]` region. Returns `None` when there is
/// no usable path, in which case the caller keeps the region as text.
pub fn parse_table_ref(content: &str) -> Option<TableRef> {
    let content = content.trim();
    let clause_start = find_top_level(content, CLAUSE_CHARS).unwrap_or(content.len());
    let (path_part, clauses) = content.split_at(clause_start);

    let mut table_ref = TableRef::new("");
    apply_clauses(&mut table_ref, clauses);

    let path_part = path_part.trim();
    if path_part.contains(['[', '{']) {
        // Nested references are not resolved; the path stays verbatim.
        table_ref.path = path_part.to_string();
        return Some(table_ref);
    }

    let mut segments: Vec<&str> = path_part.split('.').collect();
    let mut peeled = Vec::new();
    while segments.len() > 1 {
        match segments.last().and_then(|name| Modifier::from_name(name.trim())) {
            Some(modifier) => {
                peeled.push(modifier);
                segments.pop();
            }
            None => break,
        }
    }
    peeled.reverse();

    let path = segments.join(".");
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    table_ref.path = path.to_string();
    table_ref.modifiers = peeled;
    Some(table_ref)
}

/// Read `!word`, `*N`, `*{min-max}`, `?` clauses in any order. A `^`
/// ends clause parsing; malformed clauses are skipped.
fn apply_clauses(table_ref: &mut TableRef, clauses: &str) {
    let mut rest = clauses;
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '?' => table_ref.is_optional = true,
            '!' => {
                let end = rest.find(CLAUSE_CHARS).unwrap_or(rest.len());
                let word = rest[..end].trim();
                if !word.is_empty() {
                    table_ref.exclusions.push(word.to_string());
                }
                rest = &rest[end..];
            }
            '*' => {
                let (repetition, consumed) = parse_repetition(rest);
                if let Some(repetition) = repetition {
                    table_ref.repetition = repetition;
                }
                rest = &rest[consumed..];
            }
            '^' => break,
            _ => {}
        }
    }
}

/// Parse the text after `*`. Returns the repetition (if well formed) and
/// how many bytes were consumed. Counts are clamped to `MAX_REPETITION`.
pub(crate) fn parse_repetition(input: &str) -> (Option<Repetition>, usize) {
    if input.starts_with('{') {
        if let Some(close) = input.find('}') {
            let range = parse_number_range(&input[1..close]).map(|(min, max)| Repetition::Range {
                min: clamp_count(min),
                max: clamp_count(max),
            });
            return (range, close + 1);
        }
        return (None, 0);
    }

    let digits = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return (None, 0);
    }
    // Too many digits for u64 is still just "very many"
    let count = input[..digits].parse::<u64>().map_or(MAX_REPETITION, clamp_count);
    (Some(Repetition::Fixed(count)), digits)
}

fn clamp_count(count: u64) -> u32 {
    u32::try_from(count.min(u64::from(MAX_REPETITION))).unwrap_or(MAX_REPETITION)
}

/// Match `^\d+-\d+$`.
pub(crate) fn parse_number_range(content: &str) -> Option<(u64, u64)> {
    let (min, max) = content.split_once('-')?;
    if min.is_empty() || max.is_empty() {
        return None;
    }
    if !min.bytes().all(|b| b.is_ascii_digit()) || !max.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((min.parse().ok()?, max.parse().ok()?))
}

/// Split on `sep` outside any `[]`, `{}`, `()` nesting. Parts are trimmed
/// and empty parts dropped.
pub(crate) fn split_top_level(content: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in content.char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            _ if c == sep && depth == 0 => {
                parts.push(&content[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&content[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Byte index of the first of `targets` outside any bracket nesting.
fn find_top_level(content: &str, targets: &[char]) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in content.char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            _ if depth <= 0 && targets.contains(&c) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Given the byte index of an opening `[`, `{` or `(`, return the index
/// of its matching closer. Only brackets of the same kind count toward
/// the nesting depth.
pub(crate) fn find_matching(text: &str, open_at: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let open = *bytes.get(open_at)?;
    let close = match open {
        b'[' => b']',
        b'{' => b'}',
        b'(' => b')',
        _ => return None,
    };

    let mut depth = 0usize;
    for (offset, &b) in bytes[open_at..].iter().enumerate() {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_at + offset);
            }
        }
    }
    None
}

fn next_char_boundary(text: &str, i: usize) -> usize {
    let mut next = i + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}
