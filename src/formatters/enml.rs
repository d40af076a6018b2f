//! ENML Formatter
//!
//! Converts a chat transcript written in light markdown into an Evernote
//! Markup Language document. One pass over the lines:
//!
//! - fenced code blocks become monospace blocks (unterminated fences are
//!   closed at end of input)
//! - `Human:`/`User:` and `Assistant:`/`Claude:` lines become coloured
//!   speaker blocks, prefix removed
//! - `#`..`######` headings, `-`/`*` and `1.` lists, everything else paragraphs
//! - inline `` `code` ``, `**bold**` and `*italic*`
//!
//! Conversion never fails; anything unrecognised is kept as escaped text.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const ENML_DOCTYPE: &str =
    r#"<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd">"#;

/// Inline styles used in the generated markup
pub mod styles {
    pub const CODE_BLOCK: &str = "font-family: monospace; background-color: #f5f5f5; padding: 10px; margin: 10px 0; white-space: pre-wrap;";
    pub const INLINE_CODE: &str =
        "font-family: monospace; background-color: #f0f0f0; padding: 2px 4px;";
    pub const HUMAN: &str = "color: #0066cc; font-weight: bold; margin-top: 15px;";
    pub const ASSISTANT: &str = "color: #009933; font-weight: bold; margin-top: 15px;";
}

const FENCE: &str = "```";

static SPEAKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Human|User|Assistant|Claude):\s*(.*)$").expect("valid speaker regex")
});
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").expect("valid heading regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s+(\S.*)$").expect("valid bullet regex"));
static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,9})\.\s+(\S.*)$").expect("valid ordered-item regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid inline code regex"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid italic regex"));

/// A complete ENML document: declaration, doctype and one `<en-note>` root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnmlDocument(String);

impl EnmlDocument {
    fn wrap(body: &str) -> Self {
        Self(format!(
            "{}{}<en-note>{}</en-note>",
            XML_DECLARATION, ENML_DOCTYPE, body
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Markup between `<en-note>` and `</en-note>`
    pub fn body(&self) -> &str {
        let start = XML_DECLARATION.len() + ENML_DOCTYPE.len() + "<en-note>".len();
        let end = self.0.len() - "</en-note>".len();
        &self.0[start..end]
    }
}

impl fmt::Display for EnmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EnmlDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Converts a chat transcript into an ENML document
pub fn chat_to_enml(chat: &str) -> EnmlDocument {
    let mut builder = BodyBuilder::default();
    for line in chat.lines() {
        builder.push_line(line);
    }
    builder.finish()
}

/// Escapes XML-reserved characters and drops characters XML 1.0 forbids
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Heading level and text of a markdown heading line (`# Title`)
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING_RE.captures(line.trim())?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2)?.as_str().trim_end();
    Some((level, text))
}

/// Inline markdown: code spans first, then bold, then italic
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for span in INLINE_CODE_RE.find_iter(text) {
        out.push_str(&emphasis(&text[last..span.start()]));
        let code = &span.as_str()[1..span.len() - 1];
        out.push_str(&format!(
            r#"<span style="{}">{}</span>"#,
            styles::INLINE_CODE,
            escape_xml(code)
        ));
        last = span.end();
    }
    out.push_str(&emphasis(&text[last..]));
    out
}

fn emphasis(text: &str) -> String {
    let escaped = escape_xml(text);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>${1}</strong>");
    ITALIC_RE.replace_all(&bold, "<em>${1}</em>").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    Human,
    Assistant,
}

impl Speaker {
    fn style(self) -> &'static str {
        match self {
            Self::Human => styles::HUMAN,
            Self::Assistant => styles::ASSISTANT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Bullet => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Classification of one non-blank line outside a code block
enum Line<'a> {
    Speaker(Speaker, &'a str),
    Heading(usize, &'a str),
    Item(ListKind, Option<u32>, &'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if let Some(caps) = SPEAKER_RE.captures(line) {
        let speaker = match caps.get(1).map(|m| m.as_str()) {
            Some("Human" | "User") => Speaker::Human,
            _ => Speaker::Assistant,
        };
        let text = caps.get(2).map_or("", |m| m.as_str().trim());
        return Line::Speaker(speaker, text);
    }
    if let Some((level, text)) = parse_heading(line) {
        return Line::Heading(level, text);
    }
    if let Some(text) = BULLET_RE.captures(line).and_then(|caps| caps.get(1)) {
        return Line::Item(ListKind::Bullet, None, text.as_str());
    }
    if let Some(caps) = ORDERED_RE.captures(line) {
        let number = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let text = caps.get(2).map_or("", |m| m.as_str());
        return Line::Item(ListKind::Ordered, number, text);
    }
    Line::Text(line)
}

struct OpenList {
    kind: ListKind,
    start: Option<u32>,
    items: Vec<String>,
}

/// Accumulates rendered blocks; at most one paragraph, list or code block open
#[derive(Default)]
struct BodyBuilder {
    body: String,
    paragraph: Vec<String>,
    list: Option<OpenList>,
    code: Option<Vec<String>>,
}

impl BodyBuilder {
    fn push_line(&mut self, line: &str) {
        if let Some(code) = self.code.as_mut() {
            if is_closing_fence(line) {
                self.close_code();
            } else {
                code.push(line.to_string());
            }
            return;
        }

        let trimmed = line.trim();
        if is_opening_fence(trimmed) {
            self.close_blocks();
            self.code = Some(Vec::new());
            return;
        }
        if trimmed.is_empty() {
            self.close_blocks();
            return;
        }

        match classify(trimmed) {
            Line::Speaker(speaker, text) => {
                self.close_blocks();
                self.body.push_str(&format!(
                    r#"<div style="{}">{}</div>"#,
                    speaker.style(),
                    render_inline(text)
                ));
            }
            Line::Heading(level, text) => {
                self.close_blocks();
                self.body
                    .push_str(&format!("<h{0}>{1}</h{0}>", level, render_inline(text)));
            }
            Line::Item(kind, number, text) => {
                self.close_paragraph();
                self.push_item(kind, number, render_inline(text));
            }
            Line::Text(text) => {
                self.close_list();
                self.paragraph.push(render_inline(text));
            }
        }
    }

    fn push_item(&mut self, kind: ListKind, number: Option<u32>, item: String) {
        let continues = matches!(&self.list, Some(list) if list.kind == kind);
        if !continues {
            self.close_list();
            self.list = Some(OpenList {
                kind,
                start: number,
                items: Vec::new(),
            });
        }
        if let Some(list) = self.list.as_mut() {
            list.items.push(item);
        }
    }

    fn close_blocks(&mut self) {
        self.close_paragraph();
        self.close_list();
    }

    fn close_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        self.body
            .push_str(&format!("<p>{}</p>", self.paragraph.join("<br/>")));
        self.paragraph.clear();
    }

    fn close_list(&mut self) {
        let Some(list) = self.list.take() else {
            return;
        };
        let tag = list.kind.tag();
        match list.start {
            Some(start) if list.kind == ListKind::Ordered && start != 1 => {
                self.body.push_str(&format!(r#"<ol start="{}">"#, start));
            }
            _ => self.body.push_str(&format!("<{}>", tag)),
        }
        for item in &list.items {
            self.body.push_str(&format!("<li>{}</li>", item));
        }
        self.body.push_str(&format!("</{}>", tag));
    }

    fn close_code(&mut self) {
        let Some(lines) = self.code.take() else {
            return;
        };
        let text = lines
            .iter()
            .map(|line| escape_xml(line))
            .collect::<Vec<_>>()
            .join("<br/>");
        self.body.push_str(&format!(
            r#"<div style="{}">{}</div>"#,
            styles::CODE_BLOCK,
            text
        ));
    }

    fn finish(mut self) -> EnmlDocument {
        if self.code.is_some() {
            debug!("Closing unterminated code block at end of content");
            self.close_code();
        }
        self.close_blocks();
        EnmlDocument::wrap(&self.body)
    }
}

/// Three or more backticks, optionally followed by a language tag.
/// A tag never contains a backtick, so ```` ```code``` ```` is inline code.
fn is_opening_fence(line: &str) -> bool {
    line.starts_with(FENCE) && !line.trim_start_matches('`').contains('`')
}

/// A closing fence is a line of three or more backticks and nothing else
fn is_closing_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= FENCE.len() && trimmed.chars().all(|c| c == '`')
}
