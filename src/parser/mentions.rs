//! Mention-chain extraction.
//!
//! Sigils:
//! - `/name` - command
//! - `@name` - agent, `@path/` - folder, `@name.ext` or `@dir/name` - file
//! - `$name` - service
//!
//! A sigil only starts a mention at the start of the text or after a
//! separator, so `user@example.com`, `a/b` and `US$5` yield nothing.

use crate::models::{Mention, MentionType};

/// Punctuation that may directly follow a mention without being part of it.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];

/// Extract mentions left to right.
pub fn extract_mentions(text: &str) -> Vec<Mention> {
    let mut mentions = Vec::new();
    let mut prev: Option<char> = None;
    let mut skip_until = 0;

    for (idx, c) in text.char_indices() {
        if idx < skip_until {
            prev = Some(c);
            continue;
        }
        if matches!(c, '/' | '@' | '$')
            && prev.is_none_or(is_separator)
            && let Some(mention) = match_mention(c, &text[idx + c.len_utf8()..])
        {
            skip_until = idx + mention.raw.len();
            mentions.push(mention);
        }
        prev = Some(c);
    }

    mentions
}

/// Whether `c` can precede a sigil.
fn is_separator(c: char) -> bool {
    !(c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '/' | '@' | '$' | '\\'))
}

fn match_mention(sigil: char, rest: &str) -> Option<Mention> {
    match sigil {
        '/' => match_command(rest),
        '@' => match_at(rest),
        '$' => match_service(rest),
        _ => None,
    }
}

/// Leading identifier: ASCII letter, then alphanumerics, `-` or `_`.
pub(crate) fn identifier(rest: &str) -> Option<&str> {
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn match_command(rest: &str) -> Option<Mention> {
    let name = identifier(rest)?;
    let next = rest[name.len()..].chars().next();
    if next.is_some_and(|c| !c.is_whitespace() && !TRAILING_PUNCTUATION.contains(&c)) {
        return None;
    }
    Some(Mention::new(MentionType::Command, name, format!("/{}", name)))
}

fn match_service(rest: &str) -> Option<Mention> {
    let name = identifier(rest)?;
    Some(Mention::new(MentionType::Service, name, format!("${}", name)))
}

fn match_at(rest: &str) -> Option<Mention> {
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')))
        .unwrap_or(rest.len());
    let token = rest[..end].trim_end_matches('.');
    if token.is_empty() {
        return None;
    }

    let raw = format!("@{}", token);
    if token.ends_with('/') {
        let value = token.trim_end_matches('/');
        if value.is_empty() {
            return None;
        }
        return Some(Mention::new(MentionType::Folder, value, raw));
    }
    if token.contains('/') || has_file_extension(token) {
        return Some(Mention::new(MentionType::File, token, raw));
    }
    Some(Mention::new(MentionType::Agent, token, raw))
}

/// `name.ext` where `ext` is 1-10 ASCII alphanumerics starting with a letter.
fn has_file_extension(token: &str) -> bool {
    match token.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && (1..=10).contains(&ext.len())
                && ext.starts_with(|c: char| c.is_ascii_alphabetic())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}
