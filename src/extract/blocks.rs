//! Heading-bounded block splitting.
//!
//! A block spans from the end of a classified heading line at exactly the
//! requested depth to the next heading at that depth or shallower (or end
//! of text). Headings the classifier rejects are skipped together with
//! their content; whitespace-only spans are omitted.

/// Parse a Markdown ATX heading: returns `(depth, title)` when the line is
/// a run of `#` followed by whitespace.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let depth = trimmed.chars().take_while(|c| *c == '#').count();
    if depth == 0 {
        return None;
    }
    let rest = &trimmed[depth..];
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        Some((depth, rest.trim()))
    } else {
        None
    }
}

/// Split `text` into ordered `(key, span)` pairs at the given heading depth.
///
/// `classify` decides whether a heading at that depth opens a block; deeper
/// headings are block content, same-or-shallower headings terminate the
/// current block.
pub fn split_blocks<K>(
    text: &str,
    depth: usize,
    classify: impl Fn(&str) -> Option<K>,
) -> Vec<(K, String)> {
    let mut out = Vec::new();
    let mut current: Option<K> = None;
    let mut buf = String::new();

    let mut flush = |key: &mut Option<K>, buf: &mut String, out: &mut Vec<(K, String)>| {
        if let Some(k) = key.take() {
            if !buf.trim().is_empty() {
                out.push((k, std::mem::take(buf)));
            }
        }
        buf.clear();
    };

    for line in text.lines() {
        if let Some((line_depth, title)) = parse_heading(line) {
            if line_depth <= depth {
                flush(&mut current, &mut buf, &mut out);
                if line_depth == depth {
                    current = classify(title);
                }
                continue;
            }
        }
        if current.is_some() {
            buf.push_str(line);
            buf.push('\n');
        }
    }
    flush(&mut current, &mut buf, &mut out);

    out
}
