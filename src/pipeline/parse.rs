//! Markdown parsing: body text → comrak AST → ordered `Vec<Block>`.
//!
//! ## Why lower into our own blocks?
//!
//! comrak's AST describes all of CommonMark + GFM. The renderer only knows
//! seven block kinds, so everything is lowered here, once, into the closed
//! [`Block`] enum. The renderer then dispatches with an exhaustive `match`
//! and never sees a comrak node.
//!
//! Lowering is a set of pure recursive functions over the tree; no state is
//! threaded through except the output vector.

use crate::error::FrontmatterError;
use crate::model::{Block, Metadata, Run};
use crate::pipeline::frontmatter::extract_frontmatter;
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};
use tracing::debug;

/// Parse a Markdown document (optionally with frontmatter) into metadata and
/// blocks.
///
/// Malformed Markdown never fails: unrecognised structure simply yields fewer
/// blocks. An empty result is the caller's empty-document condition.
pub fn parse_markdown(text: &str) -> Result<(Metadata, Vec<Block>), FrontmatterError> {
    let (metadata, body) = extract_frontmatter(text)?;
    let blocks = parse_blocks(body);
    debug!("Parsed {} blocks from {} bytes", blocks.len(), text.len());
    Ok((metadata, blocks))
}

/// Parse a Markdown body (no frontmatter handling) into blocks.
pub fn parse_blocks(body: &str) -> Vec<Block> {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, body, &options);

    let mut blocks = Vec::new();
    lower_children(root, &mut blocks);
    blocks
}

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options
}

// ── Block lowering ───────────────────────────────────────────────────────────

fn lower_children<'a>(node: &'a AstNode<'a>, blocks: &mut Vec<Block>) {
    for child in node.children() {
        lower_node(child, blocks);
    }
}

fn lower_node<'a>(node: &'a AstNode<'a>, blocks: &mut Vec<Block>) {
    let ast = node.data.borrow();

    match &ast.value {
        NodeValue::Heading(heading) => {
            blocks.push(Block::Heading {
                level: heading.level.max(1),
                text: plain_text(node),
            });
        }

        NodeValue::Paragraph => {
            if let Some(image) = standalone_image(node) {
                blocks.push(image);
            } else {
                let runs = inline_runs(node);
                if !runs.is_empty() {
                    blocks.push(Block::Paragraph { runs });
                }
            }
        }

        NodeValue::List(list) => {
            let ordered = list.list_type == ListType::Ordered;
            let items: Vec<Vec<Run>> = node.children().map(list_item_runs).collect();
            if !items.is_empty() {
                blocks.push(Block::List { ordered, items });
            }
        }

        NodeValue::CodeBlock(code_block) => {
            blocks.push(Block::CodeBlock {
                language: code_block.info.trim().to_string(),
                code: code_block.literal.trim_end_matches('\n').to_string(),
            });
        }

        NodeValue::Table(..) => {
            if let Some(table) = lower_table(node) {
                blocks.push(table);
            }
        }

        NodeValue::BlockQuote => {
            let runs = blockquote_runs(node);
            if !runs.is_empty() {
                blocks.push(Block::Blockquote { runs });
            }
        }

        NodeValue::ThematicBreak => {}

        _ => lower_children(node, blocks),
    }
}

/// A paragraph whose only child is an image becomes an [`Block::Image`].
fn standalone_image<'a>(paragraph: &'a AstNode<'a>) -> Option<Block> {
    let mut children = paragraph.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    let ast = only.data.borrow();
    match &ast.value {
        NodeValue::Image(link) => Some(Block::Image {
            alt: plain_text(only),
            url: link.url.clone(),
        }),
        _ => None,
    }
}

fn list_item_runs<'a>(item: &'a AstNode<'a>) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in item.children() {
        let ast = child.data.borrow();
        match &ast.value {
            NodeValue::Text(text) => push_text(&mut runs, text),
            _ => runs.extend(inline_runs(child)),
        }
    }
    merge_runs(runs)
}

fn lower_table<'a>(table: &'a AstNode<'a>) -> Option<Block> {
    let mut headers = Vec::new();
    let mut rows = Vec::new();

    for row in table.children() {
        let is_header = match &row.data.borrow().value {
            NodeValue::TableRow(header) => *header,
            _ => continue,
        };
        let cells: Vec<String> = row
            .children()
            .filter(|cell| matches!(cell.data.borrow().value, NodeValue::TableCell))
            .map(plain_text)
            .collect();

        if is_header {
            headers.extend(cells);
        } else if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if headers.is_empty() && rows.is_empty() {
        None
    } else {
        Some(Block::Table { headers, rows })
    }
}

fn blockquote_runs<'a>(quote: &'a AstNode<'a>) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in quote.children() {
        if child.first_child().is_none() {
            continue;
        }
        if !runs.is_empty() {
            runs.push(Run::line_break());
        }
        runs.extend(inline_runs(child));
    }
    merge_runs(runs)
}

// ── Inline conversion ────────────────────────────────────────────────────────

/// Convert the inline children of `parent` into runs.
fn inline_runs<'a>(parent: &'a AstNode<'a>) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in parent.children() {
        push_inline(child, &mut runs);
    }
    merge_runs(runs)
}

fn push_inline<'a>(node: &'a AstNode<'a>, runs: &mut Vec<Run>) {
    let ast = node.data.borrow();

    match &ast.value {
        NodeValue::Text(text) => push_text(runs, text),

        NodeValue::Code(code) => {
            if !code.literal.is_empty() {
                runs.push(Run::code(code.literal.clone()));
            }
        }

        NodeValue::Strong => runs.extend(inline_runs(node).into_iter().map(|mut r| {
            r.bold = true;
            r
        })),

        NodeValue::Emph => runs.extend(inline_runs(node).into_iter().map(|mut r| {
            r.italic = true;
            r
        })),

        NodeValue::Link(link) => {
            runs.extend(inline_runs(node));
            if !link.url.is_empty() {
                runs.push(Run::plain(format!(" ({})", link.url)));
            }
        }

        NodeValue::Image(_) => {
            let alt = plain_text(node);
            if !alt.is_empty() {
                runs.push(Run::plain(format!("[{alt}]")));
            }
        }

        NodeValue::SoftBreak | NodeValue::LineBreak => runs.push(Run::line_break()),

        other => match literal_text(other) {
            Some(raw) => push_text(runs, raw),
            None => runs.extend(inline_runs(node)),
        },
    }
}

fn push_text(runs: &mut Vec<Run>, text: &str) {
    if !text.is_empty() {
        runs.push(Run::plain(text));
    }
}

/// Raw text carried by nodes that have no inline children of their own.
fn literal_text(value: &NodeValue) -> Option<&str> {
    match value {
        NodeValue::HtmlInline(raw) => Some(raw.as_str()),
        NodeValue::HtmlBlock(html) => Some(html.literal.as_str()),
        _ => None,
    }
}

/// Merge neighbouring runs that share every flag. Line-break runs are kept
/// on their own so the renderer can turn them into `<w:br/>`.
fn merge_runs(runs: Vec<Run>) -> Vec<Run> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(last) = merged.last_mut() {
            if !last.is_line_break()
                && !run.is_line_break()
                && last.bold == run.bold
                && last.italic == run.italic
                && last.code == run.code
            {
                last.text.push_str(&run.text);
                continue;
            }
        }
        merged.push(run);
    }
    merged
}

// ── Plain text ───────────────────────────────────────────────────────────────

/// Concatenate text and inline-code content below `node`, ignoring formatting.
pub(crate) fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for child in node.children() {
        collect_plain_text(child, &mut out);
    }
    out
}

fn collect_plain_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    let ast = node.data.borrow();
    match &ast.value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        other => {
            if node.first_child().is_some() {
                for child in node.children() {
                    collect_plain_text(child, out);
                }
            } else if let Some(raw) = literal_text(other) {
                out.push_str(raw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, bold: bool, italic: bool, code: bool) -> Run {
        Run {
            text: text.into(),
            bold,
            italic,
            code,
        }
    }

    #[test]
    fn heading_and_paragraph() {
        let blocks = parse_blocks("# Title\n\nSome **bold** text.");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Paragraph {
                    runs: vec![
                        Run::plain("Some "),
                        run("bold", true, false, false),
                        Run::plain(" text."),
                    ]
                },
            ]
        );
    }

    #[test]
    fn heading_text_drops_formatting() {
        let blocks = parse_blocks("## Работа с `cargo` и **tokio**");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 2,
                text: "Работа с cargo и tokio".into()
            }]
        );
    }

    #[test]
    fn bold_italic_is_one_run_with_both_flags() {
        let blocks = parse_blocks("**_text_**");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![run("text", true, true, false)]
            }]
        );
    }

    #[test]
    fn inline_code_link_and_break() {
        let blocks = parse_blocks("Use `ls` see [docs](https://x.org)\nnext");
        let Block::Paragraph { runs } = &blocks[0] else {
            panic!("expected paragraph, got {blocks:?}");
        };
        assert_eq!(
            runs,
            &vec![
                Run::plain("Use "),
                Run::code("ls"),
                Run::plain(" see docs (https://x.org)"),
                Run::line_break(),
                Run::plain("next"),
            ]
        );
    }

    #[test]
    fn inline_image_becomes_bracketed_alt() {
        let blocks = parse_blocks("See ![диаграмма](d.png) here");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![Run::plain("See [диаграмма] here")]
            }]
        );
    }

    #[test]
    fn standalone_image_is_promoted() {
        let blocks = parse_blocks("![Схема сети](https://example.org/net.png)");
        assert_eq!(
            blocks,
            vec![Block::Image {
                alt: "Схема сети".into(),
                url: "https://example.org/net.png".into()
            }]
        );
    }

    #[test]
    fn lists() {
        let blocks = parse_blocks("1. first\n2. **second**\n\n- a\n- b\n");
        assert_eq!(
            blocks,
            vec![
                Block::List {
                    ordered: true,
                    items: vec![
                        vec![Run::plain("first")],
                        vec![run("second", true, false, false)]
                    ]
                },
                Block::List {
                    ordered: false,
                    items: vec![vec![Run::plain("a")], vec![Run::plain("b")]]
                },
            ]
        );
    }

    #[test]
    fn fenced_code_keeps_language_and_strips_trailing_newlines() {
        let blocks = parse_blocks("```python\nprint(1)\n\nx = 2\n```\n\n```\nraw\n```");
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: "python".into(),
                    code: "print(1)\n\nx = 2".into()
                },
                Block::CodeBlock {
                    language: String::new(),
                    code: "raw".into()
                },
            ]
        );
    }

    #[test]
    fn table_with_rows() {
        let blocks = parse_blocks("| A | **B** |\n|---|---|\n| 1 | `2` |\n| 3 | 4 |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                headers: vec!["A".into(), "B".into()],
                rows: vec![
                    vec!["1".into(), "2".into()],
                    vec!["3".into(), "4".into()]
                ]
            }]
        );
    }

    #[test]
    fn header_only_table_has_empty_rows() {
        let blocks = parse_blocks("| A | B |\n|---|---|\n");
        assert_eq!(
            blocks,
            vec![Block::Table {
                headers: vec!["A".into(), "B".into()],
                rows: vec![]
            }]
        );
    }

    #[test]
    fn blockquote_joins_paragraphs_with_breaks() {
        let blocks = parse_blocks("> first **part**\n>\n> second");
        assert_eq!(
            blocks,
            vec![Block::Blockquote {
                runs: vec![
                    Run::plain("first "),
                    run("part", true, false, false),
                    Run::line_break(),
                    Run::plain("second"),
                ]
            }]
        );
    }

    #[test]
    fn thematic_breaks_and_blank_lines_are_dropped() {
        let blocks = parse_blocks("one\n\n---\n\n\n\ntwo");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    runs: vec![Run::plain("one")]
                },
                Block::Paragraph {
                    runs: vec![Run::plain("two")]
                },
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("\n\n   \n").is_empty());
        assert!(parse_blocks("***\n").is_empty());
    }

    #[test]
    fn parse_markdown_splits_frontmatter() {
        let (meta, blocks) = parse_markdown("---\ntitle: X\nauthor: Y\n---\nBody").unwrap();
        assert_eq!(meta.title, "X");
        assert_eq!(meta.author, "Y");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                runs: vec![Run::plain("Body")]
            }]
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "---\ntitle: T\n---\n# A\n\n- x\n- y\n\n> q\n\n| h |\n|---|\n| c |\n";
        assert_eq!(parse_markdown(text).unwrap(), parse_markdown(text).unwrap());
    }

    #[test]
    fn malformed_frontmatter_stops_parsing() {
        assert!(parse_markdown("---\n: : :\n---\nBody").is_err());
    }
}
