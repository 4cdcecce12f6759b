/// Template inspection — reference listing and structural validation.
///
/// Neither operation evaluates anything or touches randomness; they exist
/// for host tools such as editors and linters.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

use crate::core::parser::{
    self, find_matching, is_clause_suffix, parse_number_range, parse_repetition, split_top_level,
};
use crate::schema::ast::{Modifier, Repetition, TableRef};

/// One `[...]` reference found in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub path: String,
    pub modifiers: Vec<Modifier>,
    pub optional: bool,
    pub exclusions: Vec<String>,
    pub repetition: Repetition,
    /// The source text of the reference, brackets included.
    pub raw: String,
    /// Character (not byte) offsets into the template, end exclusive.
    pub span: Range<usize>,
}

/// Anything that names a table: a dotted path or a parsed reference.
pub trait TablePath {
    fn table_path(&self) -> &str;
}

impl TablePath for str {
    fn table_path(&self) -> &str {
        self
    }
}

impl TablePath for String {
    fn table_path(&self) -> &str {
        self
    }
}

impl TablePath for TokenDescriptor {
    fn table_path(&self) -> &str {
        &self.path
    }
}

impl TablePath for TableRef {
    fn table_path(&self) -> &str {
        &self.path
    }
}

/// A structural problem in a template. Character positions are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateIssue {
    #[error("unclosed '{bracket}' at position {position}")]
    Unclosed { bracket: char, position: usize },
    #[error("unexpected '{bracket}' at position {position}")]
    UnexpectedClose { bracket: char, position: usize },
    #[error("empty table reference at position {position}")]
    EmptyReference { position: usize },
    #[error("nested table reference inside '{raw}' is not supported")]
    NestedReference { raw: String },
    #[error("repetition without a count in '{raw}'")]
    MissingRepetitionCount { raw: String },
    #[error("empty exclusion in '{raw}'")]
    EmptyExclusion { raw: String },
    #[error("number range '{{{min}-{max}}}' is reversed")]
    ReversedRange { min: u64, max: u64 },
    #[error("empty operand in '{{{raw}}}'")]
    EmptyOperand { raw: String },
}

/// Result of `validate_template`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// List every balanced `[...]` reference in source order. Inside `{...}`
/// a reference that opens an operand takes its trailing clauses with it
/// (`{[a]|[b]?}`), matching how the expression is evaluated.
pub fn parse_tokens(template: &str) -> Vec<TokenDescriptor> {
    let mut tokens = Vec::new();
    let bytes = template.as_bytes();
    // Closing indices of the `{...}` regions the scan is inside
    let mut open_braces: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        while open_braces.last().is_some_and(|&close| close < i) {
            open_braces.pop();
        }
        if bytes[i] == b'{' {
            if let Some(close) = find_matching(template, i) {
                open_braces.push(close);
            }
        }
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        let Some(close) = find_matching(template, i) else {
            i += 1;
            continue;
        };

        let mut inner = template[i + 1..close].to_string();
        let mut end = close + 1;
        if !open_braces.is_empty() && starts_operand(&template[..i]) {
            let suffix = template[end..operand_end(template, end)].trim_end();
            if is_clause_suffix(suffix) {
                inner.push_str(suffix);
                end += suffix.len();
            }
        }

        if let Some(table_ref) = parser::parse_table_ref(&inner) {
            let start = char_offset(template, i);
            let raw = &template[i..end];
            tokens.push(TokenDescriptor {
                path: table_ref.path,
                modifiers: table_ref.modifiers,
                optional: table_ref.is_optional,
                exclusions: table_ref.exclusions,
                repetition: table_ref.repetition,
                raw: raw.to_string(),
                span: start..start + raw.chars().count(),
            });
        }
        i = end;
    }
    tokens
}

/// Whether text ending here leaves the next character at the start of an
/// expression operand.
fn starts_operand(before: &str) -> bool {
    before.trim_end().ends_with(['{', '&', '|', '('])
}

/// Byte index where the operand running from `from` ends: the next
/// top-level `&`/`|` or the closer of the enclosing region.
fn operand_end(template: &str, from: usize) -> usize {
    let mut depth = 0usize;
    for (offset, c) in template[from..].char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' | '&' | '|' if depth == 0 => return from + offset,
            ']' | '}' | ')' => depth -= 1,
            _ => {}
        }
    }
    template.len()
}

/// Check a template for structural problems without evaluating it.
pub fn validate_template(template: &str) -> ValidationReport {
    let issues = find_issues(template);
    ValidationReport {
        valid: issues.is_empty(),
        errors: issues.iter().map(ToString::to_string).collect(),
    }
}

/// The typed form of `validate_template`.
pub fn find_issues(template: &str) -> Vec<TemplateIssue> {
    let mut issues = Vec::new();
    check_balance(template, &mut issues);
    check_regions(template, &mut issues);
    issues
}

fn check_balance(template: &str, issues: &mut Vec<TemplateIssue>) {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (position, c) in template.chars().enumerate() {
        match c {
            '[' | '{' | '(' => stack.push((c, position)),
            // Parentheses are only syntax inside `{...}`; stray ones in
            // prose are not a problem.
            ')' => {
                if matches!(stack.last(), Some(('(', _))) {
                    stack.pop();
                }
            }
            ']' | '}' => {
                while matches!(stack.last(), Some(('(', _))) {
                    stack.pop();
                }
                let expected = if c == ']' { '[' } else { '{' };
                match stack.last() {
                    Some((open, _)) if *open == expected => {
                        stack.pop();
                    }
                    _ => issues.push(TemplateIssue::UnexpectedClose {
                        bracket: c,
                        position,
                    }),
                }
            }
            _ => {}
        }
    }
    for (bracket, position) in stack {
        if bracket != '(' {
            issues.push(TemplateIssue::Unclosed { bracket, position });
        }
    }
}

fn check_regions(template: &str, issues: &mut Vec<TemplateIssue>) {
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let open = bytes[i];
        if open != b'[' && open != b'{' {
            i += 1;
            continue;
        }
        let Some(close) = find_matching(template, i) else {
            i += 1;
            continue;
        };
        let inner = &template[i + 1..close];
        if open == b'[' {
            check_reference(inner, char_offset(template, i), issues);
            i = close + 1;
        } else {
            check_expression(inner, issues);
            // Step inside so nested references are checked too.
            i += 1;
        }
    }
}

fn check_reference(inner: &str, position: usize, issues: &mut Vec<TemplateIssue>) {
    let raw = format!("[{}]", inner);
    if inner.contains('[') {
        issues.push(TemplateIssue::NestedReference { raw });
        return;
    }
    if parser::parse_table_ref(inner).is_none() {
        issues.push(TemplateIssue::EmptyReference { position });
        return;
    }

    let mut rest = inner;
    while let Some(pos) = rest.find(['*', '!']) {
        let marker = rest.as_bytes()[pos];
        rest = &rest[pos + 1..];
        if marker == b'*' {
            if parse_repetition(rest).0.is_none() {
                issues.push(TemplateIssue::MissingRepetitionCount { raw: raw.clone() });
            }
        } else {
            let end = rest.find(['!', '?', '*', '^']).unwrap_or(rest.len());
            if rest[..end].trim().is_empty() {
                issues.push(TemplateIssue::EmptyExclusion { raw: raw.clone() });
            }
        }
    }
}

fn check_expression(inner: &str, issues: &mut Vec<TemplateIssue>) {
    for sep in ['&', '|'] {
        let raw_parts = count_top_level_parts(inner, sep);
        if raw_parts > 1 && split_top_level(inner, sep).len() < raw_parts {
            issues.push(TemplateIssue::EmptyOperand {
                raw: inner.to_string(),
            });
            return;
        }
    }
    if let Some((min, max)) = parse_number_range(inner.trim()) {
        if min > max {
            issues.push(TemplateIssue::ReversedRange { min, max });
        }
    }
}

fn count_top_level_parts(content: &str, sep: char) -> usize {
    let mut depth = 0i32;
    let mut parts = 1;
    for c in content.chars() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            _ if c == sep && depth == 0 => parts += 1,
            _ => {}
        }
    }
    parts
}

fn char_offset(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}
