//! Lenient word splitter for callers that only need quote-aware words.
//!
//! Unlike [`assemble`](super::assemble), it knows nothing about pipes,
//! variables or backquotes and never fails.

/// Split a line into words using only spaces, quotes and backslashes.
///
/// This is the lenient front-end: no variables, pipes or substitutions, and
/// no errors. A quote without a matching closer is ordinary text, quoted text
/// is taken verbatim (backslashes included), and empty words are dropped.
/// Only the ASCII space separates words.
pub fn split(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();

    // Byte index of the last character consumed by a quoted section.
    let mut skip_to: Option<usize> = None;
    let mut prev = '\0';
    let mut prev_special = false;

    for (i, c) in line.char_indices() {
        if skip_to.is_some_and(|end| i <= end) {
            continue;
        }

        let escaped = prev == '\\' && prev_special;
        let mut special = false;
        if !escaped {
            match c {
                '"' | '\'' => {
                    let body = i + c.len_utf8();
                    if let Some(len) = line[body..].find(c) {
                        special = true;
                        skip_to = Some(body + len);
                        word.push_str(&line[body..body + len]);
                    }
                }
                '\\' => special = true,
                ' ' => {
                    special = true;
                    if !word.is_empty() {
                        words.push(std::mem::take(&mut word));
                    }
                }
                _ => {}
            }
        }
        if !special {
            word.push(c);
        }
        prev = c;
        prev_special = special;
    }

    if !word.is_empty() {
        words.push(word);
    }
    words
}
