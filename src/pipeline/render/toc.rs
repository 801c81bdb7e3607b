//! Static table of contents built from the heading blocks.
//!
//! Entries carry section numbers and a dot-leader tab to the right margin but
//! no page numbers: those are only known after Word lays the document out.

use super::numbering::SectionCounter;
use super::xml::{Body, Justify, Paragraph, ParagraphProps, RunStyle};
use crate::model::Block;
use crate::style;

pub(crate) fn write_toc(body: &mut Body, blocks: &[Block]) {
    body.push(
        Paragraph::new(ParagraphProps::centered().single_spaced().spacing(0.0, 12.0))
            .run(style::TOC_TITLE, &RunStyle::sized(style::FONT_SIZE_PT).bold()),
    );

    let headings: Vec<(u8, &str)> = blocks.iter().filter_map(Block::as_heading).collect();
    if headings.is_empty() {
        let props = ParagraphProps {
            first_line_cm: Some(0.0),
            ..ParagraphProps::default()
        };
        body.push(Paragraph::new(props).run(
            style::TOC_EMPTY,
            &RunStyle::sized(style::TABLE_FONT_SIZE_PT).italic(),
        ));
        return;
    }

    let mut counter = SectionCounter::new();
    for (level, text) in headings {
        let number = counter.next(level);
        let indent = f64::from(level.saturating_sub(1)) * style::TOC_LEVEL_INDENT_CM;
        let props = ParagraphProps {
            justify: Some(Justify::Left),
            right_tab_twips: Some(style::TOC_TAB_POS_TWIPS),
            ..ParagraphProps::default()
                .indent(indent, 0.0)
                .spacing(2.0, 2.0)
        };

        let (entry, run_style) = if level <= 1 {
            (
                format!("{number} {}", text.to_uppercase()),
                RunStyle::sized(style::FONT_SIZE_PT).bold(),
            )
        } else {
            (format!("{number} {text}"), RunStyle::sized(style::FONT_SIZE_PT))
        };
        body.push(Paragraph::new(props).run(&entry, &run_style).tab());
    }
}
