//! Tokenizer for workout notation.
//!
//! Produces a flat token stream for the parser. Relative-pace arithmetic
//! (`@2k+18`) is lexed as part of a single guidance token, so `+` outside
//! guidance is always a segment separator.

use crate::{Modality, ParseError, ReferencePace};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A number with its alphabetic suffix: `500m`, `1:00r`, `4x`, `20cal`
    Quantity { number: String, suffix: String },
    /// Bare letters not attached to a number (`x` in `4 x 500m`)
    Word(String),
    Plus,
    Slash,
    LParen,
    RParen,
    /// Contents of a `[..]` block prefix
    BlockTag(String),
    /// Text after `#`
    Tag(String),
    /// Text after `@`
    Guidance(String),
    Modality(Modality),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset in the input
    pub pos: usize,
}

impl Token {
    /// Source-like rendering for error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Quantity { number, suffix } => format!("{}{}", number, suffix),
            TokenKind::Word(w) => w.clone(),
            TokenKind::Plus => "+".into(),
            TokenKind::Slash => "/".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::BlockTag(t) => format!("[{}]", t),
            TokenKind::Tag(t) => format!("#{}", t),
            TokenKind::Guidance(g) => format!("@{}", g),
            TokenKind::Modality(m) => format!("{}:", m.prefix()),
        }
    }
}

/// Split notation text into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = match ch {
            '+' => {
                i += 1;
                TokenKind::Plus
            }
            '/' => {
                i += 1;
                TokenKind::Slash
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            '×' => {
                i += 1;
                TokenKind::Word("x".into())
            }
            '[' => {
                let start = i + 1;
                let end = (start..chars.len())
                    .find(|&j| chars[j].1 == ']')
                    .ok_or(ParseError::UnexpectedEnd)?;
                let body: String = chars[start..end].iter().map(|(_, c)| *c).collect();
                i = end + 1;
                TokenKind::BlockTag(body.trim().to_string())
            }
            '#' => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && is_tag_char(chars[j].1) {
                    j += 1;
                }
                if j == start {
                    return Err(ParseError::UnexpectedChar { ch, pos });
                }
                let body: String = chars[start..j].iter().map(|(_, c)| *c).collect();
                i = j;
                TokenKind::Tag(body)
            }
            '@' => {
                let (body, next) = lex_guidance(&chars, i + 1);
                i = next;
                TokenKind::Guidance(body)
            }
            c if c.is_ascii_digit() => {
                let mut j = i;
                while j < chars.len() && (chars[j].1.is_ascii_digit() || matches!(chars[j].1, ':' | '.')) {
                    j += 1;
                }
                let number: String = chars[i..j].iter().map(|(_, c)| *c).collect();
                let suffix_start = j;
                while j < chars.len() && chars[j].1.is_ascii_alphabetic() {
                    j += 1;
                }
                let suffix: String = chars[suffix_start..j]
                    .iter()
                    .map(|(_, c)| c.to_ascii_lowercase())
                    .collect();
                i = j;
                TokenKind::Quantity { number, suffix }
            }
            c if c.is_ascii_alphabetic() => {
                let mut j = i;
                while j < chars.len() && chars[j].1.is_ascii_alphabetic() {
                    j += 1;
                }
                let word: String = chars[i..j].iter().map(|(_, c)| *c).collect();
                let modality = if j < chars.len() && chars[j].1 == ':' {
                    Modality::from_prefix(&word)
                } else {
                    None
                };
                match modality {
                    Some(m) => {
                        i = j + 1;
                        TokenKind::Modality(m)
                    }
                    None => {
                        i = j;
                        TokenKind::Word(word.to_ascii_lowercase())
                    }
                }
            }
            _ => return Err(ParseError::UnexpectedChar { ch, pos }),
        };

        tokens.push(Token { kind, pos });
    }

    Ok(tokens)
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Consume a guidance body starting just after `@`.
///
/// `+`/`-` followed by a number belong to the guidance only when they
/// follow a reference pace and are not a repeat count (`2k+5x500m`).
fn lex_guidance(chars: &[(usize, char)], start: usize) -> (String, usize) {
    let mut j = start;
    while j < chars.len() && chars[j].1 == ' ' {
        j += 1;
    }

    let mut body = String::new();
    while j < chars.len() {
        let c = chars[j].1;
        if c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '-') {
            body.push(c);
            j += 1;
        } else if c == '+' && ends_with_reference(&body) && is_offset_at(chars, j + 1) {
            body.push(c);
            j += 1;
        } else {
            break;
        }
    }

    (body, j)
}

fn ends_with_reference(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    ReferencePace::ALL
        .iter()
        .any(|r| lower.ends_with(r.as_str()))
}

fn is_offset_at(chars: &[(usize, char)], start: usize) -> bool {
    let digit_at = |j: usize| matches!(chars.get(j), Some((_, c)) if c.is_ascii_digit());

    let mut j = start;
    while digit_at(j) {
        j += 1;
    }
    if j == start {
        return false;
    }
    // Optional single fraction digit run (`2k+2.5`), but not a `..` range
    if matches!(chars.get(j), Some((_, '.'))) && digit_at(j + 1) {
        j += 1;
        while digit_at(j) {
            j += 1;
        }
    }
    !matches!(chars.get(j), Some((_, c)) if c.is_ascii_alphabetic())
}

/// Parse `m:ss`, `h:mm:ss` or `s` with an optional `.d` fraction into
/// deciseconds.
pub fn parse_clock_tenths(text: &str) -> Option<u32> {
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text, None),
    };

    let tenths = match fraction {
        None => 0,
        Some(f) if f.len() == 1 => f.parse::<u32>().ok()?,
        Some(f) if !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()) => {
            // Round extra precision to the nearest tenth
            let scaled = format!("0.{}", f).parse::<f64>().ok()?;
            (scaled * 10.0).round() as u32
        }
        _ => return None,
    };

    let parts: Vec<&str> = whole.split(':').collect();
    if parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let seconds: u32 = match parts.as_slice() {
        [s] => s.parse().ok()?,
        [m, s] => {
            let secs: u32 = s.parse().ok()?;
            if s.len() != 2 || secs >= 60 {
                return None;
            }
            m.parse::<u32>().ok()?.checked_mul(60)?.checked_add(secs)?
        }
        [h, m, s] => {
            let mins: u32 = m.parse().ok()?;
            let secs: u32 = s.parse().ok()?;
            if m.len() != 2 || s.len() != 2 || mins >= 60 || secs >= 60 {
                return None;
            }
            h.parse::<u32>().ok()?.checked_mul(3600)?.checked_add(mins * 60 + secs)?
        }
        _ => return None,
    };

    seconds.checked_mul(10)?.checked_add(tenths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn quantity(number: &str, suffix: &str) -> TokenKind {
        TokenKind::Quantity {
            number: number.into(),
            suffix: suffix.into(),
        }
    }

    #[test]
    fn test_tokenize_simple_interval() {
        assert_eq!(
            kinds("4x500m/1:00r"),
            vec![
                quantity("4", "x"),
                quantity("500", "m"),
                TokenKind::Slash,
                quantity("1:00", "r"),
            ]
        );
    }

    #[test]
    fn test_relative_pace_plus_is_one_token() {
        assert_eq!(
            kinds("2000m@2k+18 + 5:00"),
            vec![
                quantity("2000", "m"),
                TokenKind::Guidance("2k+18".into()),
                TokenKind::Plus,
                quantity("5:00", ""),
            ]
        );
    }

    #[test]
    fn test_plus_after_reference_before_repeat_splits() {
        assert_eq!(
            kinds("2000m@2k+4x500m"),
            vec![
                quantity("2000", "m"),
                TokenKind::Guidance("2k".into()),
                TokenKind::Plus,
                quantity("4", "x"),
                quantity("500", "m"),
            ]
        );
    }

    #[test]
    fn test_relative_range_and_fractional_offset() {
        assert_eq!(
            kinds("2000m@2k+18..2k+20/5:00r"),
            vec![
                quantity("2000", "m"),
                TokenKind::Guidance("2k+18..2k+20".into()),
                TokenKind::Slash,
                quantity("5:00", "r"),
            ]
        );
        assert_eq!(
            kinds("@6k+2.5"),
            vec![TokenKind::Guidance("6k+2.5".into())]
        );
    }

    #[test]
    fn test_modality_block_tags_and_hash() {
        assert_eq!(
            kinds("Row: [w]10:00 #easy"),
            vec![
                TokenKind::Modality(Modality::Rowing),
                TokenKind::BlockTag("w".into()),
                quantity("10:00", ""),
                TokenKind::Tag("easy".into()),
            ]
        );
    }

    #[test]
    fn test_unknown_character_is_error() {
        assert_eq!(
            tokenize("4x500m!"),
            Err(ParseError::UnexpectedChar { ch: '!', pos: 6 })
        );
    }

    #[test]
    fn test_parse_clock_tenths() {
        assert_eq!(parse_clock_tenths("1:00"), Some(600));
        assert_eq!(parse_clock_tenths("2:05.5"), Some(1255));
        assert_eq!(parse_clock_tenths("1:00:00"), Some(36000));
        assert_eq!(parse_clock_tenths("90:00"), Some(54000));
        assert_eq!(parse_clock_tenths("30"), Some(300));
        assert_eq!(parse_clock_tenths("1:75"), None);
        assert_eq!(parse_clock_tenths("1:5"), None);
        assert_eq!(parse_clock_tenths("1::00"), None);
    }
}
