//! Delimiter matching for math fragments.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::converter::MathMode;

static DISPLAY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(?P<body>.+?)\\\]").expect("valid regex"));

static INLINE_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\((?P<body>.+?)\\\)").expect("valid regex"));

static DISPLAY_DOLLARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(?P<body>.+?)\$\$").expect("valid regex"));

/// A supported delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `\[ ... \]`, may span lines
    Brackets,

    /// `\( ... \)`, single line
    Parens,

    /// `$$ ... $$`, may span lines
    DoubleDollar,

    /// `$ ... $`, single line, not touching another `$`
    Dollar,
}

/// A matched fragment: the full delimited span and the body inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub outer: Range<usize>,
    pub body: Range<usize>,
}

impl Delimiter {
    pub fn mode(self) -> MathMode {
        match self {
            Delimiter::Brackets | Delimiter::DoubleDollar => MathMode::Block,
            Delimiter::Parens | Delimiter::Dollar => MathMode::Inline,
        }
    }

    /// Find every non-overlapping fragment, left to right, shortest body first.
    pub fn find_spans(self, text: &str) -> Vec<Span> {
        match self {
            Delimiter::Brackets => regex_spans(&DISPLAY_BRACKETS, text),
            Delimiter::Parens => regex_spans(&INLINE_PARENS, text),
            Delimiter::DoubleDollar => regex_spans(&DISPLAY_DOLLARS, text),
            Delimiter::Dollar => dollar_spans(text),
        }
    }
}

fn regex_spans(re: &Regex, text: &str) -> Vec<Span> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let outer = caps.get(0)?;
            let body = caps.name("body")?;
            Some(Span {
                outer: outer.range(),
                body: body.range(),
            })
        })
        .collect()
}

/// Single `$` pairs. The `regex` crate has no lookaround, so the "not next to
/// another `$`" rule is checked by hand against the unmodified text.
fn dollar_spans(text: &str) -> Vec<Span> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let opens = bytes[i] == b'$' && (i == 0 || bytes[i - 1] != b'$');
        if opens {
            let body_start = i + 1;
            if let Some(offset) = text[body_start..].find(['$', '\n']) {
                let close = body_start + offset;
                let closes = bytes[close] == b'$'
                    && close > body_start
                    && bytes.get(close + 1) != Some(&b'$');
                if closes {
                    spans.push(Span {
                        outer: i..close + 1,
                        body: body_start..close,
                    });
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    spans
}
