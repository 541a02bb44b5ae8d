//! Markdown-subset renderer for chat messages
//!
//! Turns message text into a flat list of display blocks, one per source
//! line, so any front end (TUI, desktop, web) can lay them out without
//! re-parsing. Only bullets, numbered items and `**bold**` are recognised;
//! everything else degrades to plain paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)\.\s").expect("numbered list pattern is valid"));

// Bold text never spans a carriage return or a Unicode line/paragraph separator
static BOLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([^\r\x{2028}\x{2029}]*?)\*\*").expect("bold pattern is valid")
});

/// How much of the Markdown subset the renderer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownSubset {
    /// Line splitting only; every non-blank line is a plain paragraph
    None,
    /// Bullets, numbered items and bold spans
    #[default]
    Basic,
}

impl MarkdownSubset {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkdownSubset::None => "none",
            MarkdownSubset::Basic => "basic",
        }
    }
}

/// A run of inline text within a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineSpan {
    PlainText(String),
    Bold(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::PlainText(text) | InlineSpan::Bold(text) => text,
        }
    }
}

/// One rendered source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderedBlock {
    /// A blank line
    Break,
    BulletItem(Vec<InlineSpan>),
    NumberedItem {
        /// Digits exactly as written, leading zeros included
        number: String,
        content: Vec<InlineSpan>,
    },
    Paragraph(Vec<InlineSpan>),
}

impl RenderedBlock {
    /// Inline content of the block (empty for `Break`)
    pub fn spans(&self) -> &[InlineSpan] {
        match self {
            RenderedBlock::Break => &[],
            RenderedBlock::BulletItem(content)
            | RenderedBlock::NumberedItem { content, .. }
            | RenderedBlock::Paragraph(content) => content,
        }
    }
}

/// Render a message with the full Markdown subset.
///
/// The block at index `i` always comes from line `i` of `message` split on
/// `'\n'`, so the index doubles as a stable key for the presentation layer.
pub fn render(message: &str) -> Vec<RenderedBlock> {
    render_with(message, MarkdownSubset::Basic)
}

/// Render a message with an explicit capability level
pub fn render_with(message: &str, subset: MarkdownSubset) -> Vec<RenderedBlock> {
    message
        .split('\n')
        .map(|line| match subset {
            MarkdownSubset::Basic => classify_line(line.trim()),
            MarkdownSubset::None => plain_line(line.trim()),
        })
        .collect()
}

fn classify_line(line: &str) -> RenderedBlock {
    if line.is_empty() {
        return RenderedBlock::Break;
    }

    if let Some(content) = line.strip_prefix("- ") {
        return RenderedBlock::BulletItem(parse_inline(content));
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        let prefix_len = caps[0].len();
        return RenderedBlock::NumberedItem {
            number: caps[1].to_string(),
            content: parse_inline(&line[prefix_len..]),
        };
    }

    RenderedBlock::Paragraph(parse_inline(line))
}

fn plain_line(line: &str) -> RenderedBlock {
    if line.is_empty() {
        RenderedBlock::Break
    } else {
        RenderedBlock::Paragraph(vec![InlineSpan::PlainText(line.to_string())])
    }
}

/// Split a line into plain and `**bold**` spans.
///
/// Markers are matched left to right and never nest; an unmatched `**` stays
/// in the plain text.
pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for caps in BOLD_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last_end {
            spans.push(InlineSpan::PlainText(text[last_end..whole.start()].to_string()));
        }
        spans.push(InlineSpan::Bold(inner.as_str().to_string()));
        last_end = whole.end();
    }

    if last_end < text.len() {
        spans.push(InlineSpan::PlainText(text[last_end..].to_string()));
    }

    if spans.is_empty() {
        spans.push(InlineSpan::PlainText(text.to_string()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> InlineSpan {
        InlineSpan::PlainText(s.to_string())
    }

    fn bold(s: &str) -> InlineSpan {
        InlineSpan::Bold(s.to_string())
    }

    #[test]
    fn test_empty_message_is_single_break() {
        assert_eq!(render(""), vec![RenderedBlock::Break]);
    }

    #[test]
    fn test_bullet_item() {
        assert_eq!(
            render("- item one"),
            vec![RenderedBlock::BulletItem(vec![plain("item one")])]
        );
    }

    #[test]
    fn test_numbered_item() {
        assert_eq!(
            render("3. third item"),
            vec![RenderedBlock::NumberedItem {
                number: "3".to_string(),
                content: vec![plain("third item")],
            }]
        );
    }

    #[test]
    fn test_numbered_item_keeps_leading_zeros() {
        let blocks = render("007. bond");
        match &blocks[0] {
            RenderedBlock::NumberedItem { number, content } => {
                assert_eq!(number, "007");
                assert_eq!(content, &vec![plain("bond")]);
            }
            other => panic!("expected numbered item, got {:?}", other),
        }
    }

    #[test]
    fn test_numbered_item_consumes_single_whitespace() {
        let blocks = render("2.  spaced");
        assert_eq!(
            blocks,
            vec![RenderedBlock::NumberedItem {
                number: "2".to_string(),
                content: vec![plain(" spaced")],
            }]
        );
    }

    #[test]
    fn test_number_without_space_is_paragraph() {
        assert_eq!(
            render("3.14 is pi"),
            vec![RenderedBlock::Paragraph(vec![plain("3.14 is pi")])]
        );
    }

    #[test]
    fn test_non_ascii_digits_are_not_numbered() {
        assert_eq!(
            render("٣. three"),
            vec![RenderedBlock::Paragraph(vec![plain("٣. three")])]
        );
    }

    #[test]
    fn test_bold_in_paragraph() {
        assert_eq!(
            render("Hello **world**!"),
            vec![RenderedBlock::Paragraph(vec![
                plain("Hello "),
                bold("world"),
                plain("!"),
            ])]
        );
    }

    #[test]
    fn test_blank_line_between_paragraphs() {
        assert_eq!(
            render("line one\n\nline two"),
            vec![
                RenderedBlock::Paragraph(vec![plain("line one")]),
                RenderedBlock::Break,
                RenderedBlock::Paragraph(vec![plain("line two")]),
            ]
        );
    }

    #[test]
    fn test_consecutive_breaks_are_kept() {
        let blocks = render("a\n\n\nb");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1], RenderedBlock::Break);
        assert_eq!(blocks[2], RenderedBlock::Break);
    }

    #[test]
    fn test_trailing_newline_becomes_break() {
        assert_eq!(
            render("done\n"),
            vec![RenderedBlock::Paragraph(vec![plain("done")]), RenderedBlock::Break]
        );
    }

    #[test]
    fn test_unterminated_bold_is_plain() {
        assert_eq!(
            render("a **b"),
            vec![RenderedBlock::Paragraph(vec![plain("a **b")])]
        );
    }

    #[test]
    fn test_odd_markers_leave_trailing_literal() {
        assert_eq!(
            parse_inline("**a** and **b"),
            vec![bold("a"), plain(" and **b")]
        );
    }

    #[test]
    fn test_empty_bold_span() {
        assert_eq!(parse_inline("****"), vec![bold("")]);
    }

    #[test]
    fn test_parse_inline_without_markers() {
        assert_eq!(parse_inline(""), vec![plain("")]);
        assert_eq!(parse_inline("just text"), vec![plain("just text")]);
    }

    #[test]
    fn test_indentation_is_trimmed_before_classifying() {
        assert_eq!(
            render("   - nested **bold**  "),
            vec![RenderedBlock::BulletItem(vec![plain("nested "), bold("bold")])]
        );
    }

    #[test]
    fn test_dash_without_space_is_paragraph() {
        assert_eq!(
            render("-dash"),
            vec![RenderedBlock::Paragraph(vec![plain("-dash")])]
        );
    }

    #[test]
    fn test_one_block_per_line() {
        let inputs = ["", "\n", "a\nb\nc", "- x\n1. y\n\n**z**\n", "\r\n\r\n"];
        for input in inputs {
            assert_eq!(render(input).len(), input.split('\n').count(), "input {:?}", input);
        }
    }

    #[test]
    fn test_render_is_repeatable() {
        let message = "Intro **bold**\n- one\n2. two\n\nend";
        assert_eq!(render(message), render(message));
    }

    #[test]
    fn test_plain_subset_skips_markup() {
        assert_eq!(
            render_with("- item\n\n**b**", MarkdownSubset::None),
            vec![
                RenderedBlock::Paragraph(vec![plain("- item")]),
                RenderedBlock::Break,
                RenderedBlock::Paragraph(vec![plain("**b**")]),
            ]
        );
    }

    #[test]
    fn test_spans_accessor() {
        assert!(RenderedBlock::Break.spans().is_empty());
        let blocks = render("1. **a**");
        assert_eq!(blocks[0].spans(), &[bold("a")]);
        assert_eq!(blocks[0].spans()[0].text(), "a");
    }

    #[test]
    fn test_bold_does_not_cross_line_separators() {
        assert_eq!(
            parse_inline("**a\rb**"),
            vec![InlineSpan::PlainText("**a\rb**".to_string())]
        );
        assert_eq!(
            parse_inline("**a\u{2028}b**"),
            vec![InlineSpan::PlainText("**a\u{2028}b**".to_string())]
        );
        assert_eq!(
            parse_inline("x **a\tb**"),
            vec![
                InlineSpan::PlainText("x ".to_string()),
                InlineSpan::Bold("a\tb".to_string()),
            ]
        );
    }
}
