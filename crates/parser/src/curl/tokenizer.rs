//! Shell-style word splitting for pasted `curl` commands
//!
//! Handles quoting and escaping only. Nothing is expanded: `$VAR` and
//! globs stay literal text.

use apiport_common::{ApiportError, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Split a command line into words
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    // distinguishes an empty quoted word ('') from no word at all
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                read_single_quoted(&mut chars, &mut current)?;
            }
            '"' => {
                in_word = true;
                read_double_quoted(&mut chars, &mut current)?;
            }
            '$' if chars.peek() == Some(&'\'') => {
                chars.next();
                in_word = true;
                read_ansi_c_quoted(&mut chars, &mut current)?;
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                Some(next) => {
                    in_word = true;
                    current.push(next);
                }
                None => {}
            },
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn read_single_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<()> {
    for c in chars.by_ref() {
        if c == '\'' {
            return Ok(());
        }
        out.push(c);
    }
    Err(unterminated("single"))
}

fn read_double_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<()> {
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(()),
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\' | '$' | '`')) => out.push(escaped),
                Some('\n') => {}
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(unterminated("double"))
}

fn read_ansi_c_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<()> {
    while let Some(c) = chars.next() {
        match c {
            '\'' => return Ok(()),
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(escaped @ ('\\' | '\'' | '"')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(unterminated("ANSI-C"))
}

fn unterminated(kind: &str) -> ApiportError {
    ApiportError::Validation(format!(
        "Invalid cURL command: unterminated {} quote",
        kind
    ))
}
