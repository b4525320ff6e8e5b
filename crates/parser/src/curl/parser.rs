//! `curl` option parsing and command splitting

use super::converter::convert_command;
use super::tokenizer::tokenize;
use crate::importer::{FormatParser, ImportData, ImportResult, ParserId};
use apiport_common::{ApiportError, Collection, Result};
use std::collections::BTreeSet;
use tracing::debug;

/// Name of the collection that holds imported commands
pub const COLLECTION_NAME: &str = "cURL Import";

/// Which flag supplied a data part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// `-d`, `--data`, `--data-ascii`
    Ascii,
    /// `--data-raw`
    Raw,
    /// `--data-binary`
    Binary,
    /// `--data-urlencode`
    Urlencode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPart {
    pub kind: DataKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// `name=value` as given
    pub value: String,
    /// `--form-string`: `@` and `<` carry no special meaning
    pub literal: bool,
}

/// Options collected from one `curl` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurlCommand {
    /// Method from `-X`/`--request`
    pub method: Option<String>,
    pub url: Option<String>,
    /// Raw `-H` values (`Name: value`)
    pub headers: Vec<String>,
    pub data: Vec<DataPart>,
    pub form: Vec<FormPart>,
    /// `-u user[:password]`
    pub user: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    /// `-b` values; only `name=value` forms are used
    pub cookies: Vec<String>,
    /// `--oauth2-bearer` token
    pub bearer: Option<String>,
    /// `-G`
    pub get: bool,
    /// `-I`
    pub head: bool,
    /// Recognised options that have no place in a request definition
    pub dropped: BTreeSet<&'static str>,
}

/// What a recognised flag does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Request,
    Header,
    Data(DataKind),
    Form { literal: bool },
    User,
    UserAgent,
    Referer,
    Cookie,
    OAuth2Bearer,
    Get,
    Head,
    Url,
    /// Accepted and reported as ignored; `true` when it takes a value
    Dropped(&'static str, bool),
    /// Accepted silently; `true` when it takes a value
    NoOp(bool),
}

impl Flag {
    fn takes_value(self) -> bool {
        match self {
            Flag::Get | Flag::Head => false,
            Flag::Dropped(_, value) | Flag::NoOp(value) => value,
            _ => true,
        }
    }
}

fn short_flag(c: char) -> Option<Flag> {
    let flag = match c {
        'X' => Flag::Request,
        'H' => Flag::Header,
        'd' => Flag::Data(DataKind::Ascii),
        'F' => Flag::Form { literal: false },
        'u' => Flag::User,
        'A' => Flag::UserAgent,
        'e' => Flag::Referer,
        'b' => Flag::Cookie,
        'G' => Flag::Get,
        'I' => Flag::Head,
        'c' => Flag::Dropped("--cookie-jar", true),
        'L' => Flag::Dropped("--location", false),
        'k' => Flag::Dropped("--insecure", false),
        'm' => Flag::Dropped("--max-time", true),
        'x' => Flag::Dropped("--proxy", true),
        'U' => Flag::Dropped("--proxy-user", true),
        'o' | 'w' | 'D' | 'E' | 'K' | 'C' | 'r' | 'T' | 'Y' | 'y' | 'z' => Flag::NoOp(true),
        's' | 'S' | 'v' | 'i' | 'f' | 'g' | 'N' | 'q' | 'O' | 'J' | 'n' | 'l' | 'j' | 'R'
        | '0' | '1' | '2' | '3' | '4' | '6' | '#' => Flag::NoOp(false),
        _ => return None,
    };
    Some(flag)
}

fn long_flag(name: &str) -> Option<Flag> {
    let flag = match name {
        "request" => Flag::Request,
        "header" => Flag::Header,
        "data" | "data-ascii" => Flag::Data(DataKind::Ascii),
        "data-raw" => Flag::Data(DataKind::Raw),
        "data-binary" => Flag::Data(DataKind::Binary),
        "data-urlencode" => Flag::Data(DataKind::Urlencode),
        "form" => Flag::Form { literal: false },
        "form-string" => Flag::Form { literal: true },
        "user" => Flag::User,
        "user-agent" => Flag::UserAgent,
        "referer" => Flag::Referer,
        "cookie" => Flag::Cookie,
        "oauth2-bearer" => Flag::OAuth2Bearer,
        "get" => Flag::Get,
        "head" => Flag::Head,
        "url" => Flag::Url,
        "cookie-jar" => Flag::Dropped("--cookie-jar", true),
        "location" => Flag::Dropped("--location", false),
        "max-redirs" => Flag::Dropped("--max-redirs", true),
        "insecure" => Flag::Dropped("--insecure", false),
        "compressed" => Flag::Dropped("--compressed", false),
        "connect-timeout" => Flag::Dropped("--connect-timeout", true),
        "max-time" => Flag::Dropped("--max-time", true),
        "proxy" => Flag::Dropped("--proxy", true),
        "proxy-user" => Flag::Dropped("--proxy-user", true),
        "output" | "write-out" | "retry" | "retry-delay" | "retry-max-time" | "cacert"
        | "capath" | "cert" | "key" | "config" | "dump-header" | "limit-rate" | "resolve"
        | "interface" | "range" | "continue-at" | "upload-file" | "trace" | "trace-ascii"
        | "stderr" | "speed-limit" | "speed-time" | "expect100-timeout" | "proto"
        | "proto-redir" | "cert-type" | "key-type" => Flag::NoOp(true),
        "silent" | "show-error" | "verbose" | "include" | "fail" | "globoff" | "no-buffer"
        | "progress-bar" | "no-progress-meter" | "http1.0" | "http1.1" | "http2"
        | "http2-prior-knowledge" | "http3" | "ipv4" | "ipv6" | "remote-name"
        | "remote-header-name" | "location-trusted" | "raw" | "tr-encoding" | "fail-with-body"
        | "path-as-is" | "tcp-nodelay" | "tlsv1" | "tlsv1.2" | "tlsv1.3" | "ssl" | "netrc" => {
            Flag::NoOp(false)
        }
        _ => return None,
    };
    Some(flag)
}

/// Parse one command's words (the leading `curl` included)
pub fn parse_words(words: &[String]) -> Result<CurlCommand> {
    let mut iter = words.iter();
    match iter.next() {
        Some(first) if first.eq_ignore_ascii_case("curl") => {}
        _ => {
            return Err(ApiportError::Validation(
                "Invalid cURL command: must start with 'curl'".to_string(),
            ))
        }
    }

    let mut command = CurlCommand::default();
    let mut positional: Vec<&str> = Vec::new();

    while let Some(word) = iter.next() {
        if let Some(long) = word.strip_prefix("--") {
            if long.is_empty() {
                positional.extend(iter.by_ref().map(String::as_str));
                break;
            }
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            let Some(flag) = long_flag(name) else {
                debug!("Ignoring unknown curl option --{}", name);
                continue;
            };
            let value = if flag.takes_value() {
                inline.or_else(|| iter.next().cloned())
            } else {
                None
            };
            apply(&mut command, flag, value, word)?;
        } else if word.len() > 1 && word.starts_with('-') {
            for (offset, c) in word[1..].char_indices() {
                let Some(flag) = short_flag(c) else {
                    debug!("Ignoring unknown curl option -{}", c);
                    continue;
                };
                if flag.takes_value() {
                    let rest = &word[1 + offset + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        iter.next().cloned()
                    } else {
                        Some(rest.to_string())
                    };
                    apply(&mut command, flag, value, word)?;
                    break;
                }
                apply(&mut command, flag, None, word)?;
            }
        } else {
            positional.push(word.as_str());
        }
    }

    if command.url.is_none() {
        command.url = positional.first().map(|url| url.to_string());
    }
    Ok(command)
}

fn apply(command: &mut CurlCommand, flag: Flag, value: Option<String>, word: &str) -> Result<()> {
    if flag.takes_value() && value.is_none() {
        return Err(ApiportError::Validation(format!(
            "Invalid cURL command: option {} requires a value",
            word
        )));
    }
    let value = value.unwrap_or_default();

    match flag {
        Flag::Request => command.method = Some(value.to_uppercase()),
        Flag::Header => command.headers.push(value),
        Flag::Data(kind) => command.data.push(DataPart { kind, value }),
        Flag::Form { literal } => command.form.push(FormPart { value, literal }),
        Flag::User => command.user = Some(value),
        Flag::UserAgent => command.user_agent = Some(value),
        Flag::Referer => command.referer = Some(value),
        Flag::Cookie => command.cookies.push(value),
        Flag::OAuth2Bearer => command.bearer = Some(value),
        Flag::Get => command.get = true,
        Flag::Head => command.head = true,
        Flag::Url => command.url = Some(value),
        Flag::Dropped(name, _) => {
            command.dropped.insert(name);
        }
        Flag::NoOp(_) => {}
    }
    Ok(())
}

/// Parse a single `curl` command
pub fn parse_command(text: &str) -> Result<CurlCommand> {
    parse_words(&tokenize(text.trim())?)
}

/// Byte offsets where a `curl` command starts
///
/// A command starts at the beginning of the input or after a newline,
/// `;`, `&&`, `||` or `|`, outside quotes.
fn command_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut quote: Option<char> = None;
    let mut at_boundary = true;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                }
            }
            Some(_) => {
                if c == '\\' {
                    chars.next();
                } else if (c == '\'' && quote == Some('$')) || (c == '"' && quote == Some('"')) {
                    quote = None;
                }
            }
            None => {
                if c == '\\' {
                    chars.next();
                    at_boundary = false;
                    continue;
                }
                if matches!(c, '\n' | ';' | '&' | '|') {
                    at_boundary = true;
                    continue;
                }
                if c.is_whitespace() {
                    continue;
                }
                if at_boundary && starts_with_curl_word(&text[pos..]) {
                    starts.push(pos);
                }
                at_boundary = false;
                match c {
                    '\'' | '"' => quote = Some(c),
                    '$' if chars.peek().map(|&(_, next)| next) == Some('\'') => {
                        chars.next();
                        quote = Some('$');
                    }
                    _ => {}
                }
            }
        }
    }
    starts
}

fn starts_with_curl_word(text: &str) -> bool {
    let Some(word) = text.get(..4) else {
        return false;
    };
    word.eq_ignore_ascii_case("curl")
        && text[4..].chars().next().map_or(true, char::is_whitespace)
}

/// Number of `curl` commands in `text`
pub fn count_commands(text: &str) -> usize {
    command_starts(text).len()
}

/// Split `text` into one string per `curl` command
pub fn split_commands(text: &str) -> Vec<String> {
    let starts = command_starts(text);
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end]
                .trim_end()
                .trim_end_matches([';', '&', '|'])
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Parser for a single `curl` command
pub struct CurlParser {
    command: CurlCommand,
}

impl CurlParser {
    pub fn from_command(text: &str) -> Result<Self> {
        Ok(Self {
            command: parse_command(text)?,
        })
    }

    pub fn command(&self) -> &CurlCommand {
        &self.command
    }

    /// Convert into a one-request collection
    pub fn parse(&self) -> Result<ImportResult> {
        let (request, warnings) = convert_command(&self.command)?;
        let mut collection = Collection::new(COLLECTION_NAME);
        collection.requests.push(request);
        Ok(ImportResult::new(ImportData::Collection(collection)).with_warnings(warnings))
    }
}

/// Parse every command in `text` into one collection
pub fn parse_multi(text: &str) -> Result<ImportResult> {
    let commands = split_commands(text);
    if commands.is_empty() {
        return Err(ApiportError::Validation(
            "No cURL commands found".to_string(),
        ));
    }

    let mut collection = Collection::new(COLLECTION_NAME);
    let mut warnings = Vec::new();
    for (index, command) in commands.iter().enumerate() {
        let parsed = parse_command(command).map_err(|e| {
            ApiportError::Validation(format!("Command {}: {}", index + 1, e))
        })?;
        let (request, notes) = convert_command(&parsed)?;
        collection.requests.push(request);
        warnings.extend(notes);
    }
    debug!("Parsed {} curl command(s)", collection.requests.len());
    Ok(ImportResult::new(ImportData::Collection(collection)).with_warnings(warnings))
}

/// Registry entry for a single command
pub struct CurlFormat;

impl FormatParser for CurlFormat {
    fn id(&self) -> ParserId {
        ParserId::Curl
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        CurlParser::from_command(text)?.parse()
    }
}

/// Registry entry for several commands
pub struct CurlMultiFormat;

impl FormatParser for CurlMultiFormat {
    fn id(&self) -> ParserId {
        ParserId::CurlMulti
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        parse_multi(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags_attached_and_combined() {
        let command = parse_command("curl -sSL -XPOST -HAccept:text/plain https://x.test").unwrap();
        assert_eq!(command.method.as_deref(), Some("POST"));
        assert_eq!(command.headers, vec!["Accept:text/plain"]);
        assert_eq!(command.url.as_deref(), Some("https://x.test"));
        assert!(command.dropped.contains("--location"));
    }

    #[test]
    fn test_noop_flags_consume_their_argument() {
        let command =
            parse_command("curl -o out.json -w '%{http_code}' --retry 3 https://x.test/a").unwrap();
        assert_eq!(command.url.as_deref(), Some("https://x.test/a"));
        assert!(command.dropped.is_empty());
    }

    #[test]
    fn test_long_flag_with_equals_and_url_flag() {
        let command = parse_command("curl --request=PUT --url https://x.test/b --data=a").unwrap();
        assert_eq!(command.method.as_deref(), Some("PUT"));
        assert_eq!(command.url.as_deref(), Some("https://x.test/b"));
        assert_eq!(command.data[0].value, "a");
    }

    #[test]
    fn test_missing_value_is_an_error() {
        assert!(parse_command("curl https://x.test -H").is_err());
    }

    #[test]
    fn test_must_start_with_curl() {
        assert!(parse_command("wget https://x.test").is_err());
    }

    #[test]
    fn test_split_commands() {
        let text = "curl https://x.test/a;\ncurl -d 'curl inside' https://x.test/b && curl x.test/c | jq .";
        assert_eq!(count_commands(text), 3);
        let parts = split_commands(text);
        assert_eq!(parts[0], "curl https://x.test/a");
        assert_eq!(parts[1], "curl -d 'curl inside' https://x.test/b");
        assert_eq!(parts[2], "curl x.test/c | jq .");
    }

    #[test]
    fn test_continuation_lines_stay_one_command() {
        let text = "curl \\\n  -H 'A: b' \\\n  https://x.test";
        assert_eq!(count_commands(text), 1);
    }
}
