//! Bullet and numbered list sub-parsers.
//!
//! Both share the degenerate fallback: non-empty text with zero recognized
//! markers yields a single-element list holding the whole trimmed block.
//! Non-empty input never produces an empty list.

/// The text after a `-`, `*`, or `+` marker followed by whitespace, if any.
fn bullet_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('*'))
        .or_else(|| trimmed.strip_prefix('+'))?;
    if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest.trim())
    } else {
        None
    }
}

/// The text after a `<digits>.` or `<digits>)` marker followed by
/// whitespace, if any.
fn numbered_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &trimmed[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest.trim())
    } else {
        None
    }
}

fn collect(text: &str, item: impl Fn(&str) -> Option<&str>) -> Vec<String> {
    let items: Vec<String> = text
        .lines()
        .filter_map(|line| item(line))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        }
    } else {
        items
    }
}

/// Collect `-`/`*`/`+` bullet lines, ignoring everything else.
pub fn parse_bullets(text: &str) -> Vec<String> {
    collect(text, bullet_item)
}

/// Collect `1.` / `1)` numbered lines in line order, ignoring everything
/// else. Order comes from position in the text, not the written numbers.
pub fn parse_numbered(text: &str) -> Vec<String> {
    collect(text, numbered_item)
}
