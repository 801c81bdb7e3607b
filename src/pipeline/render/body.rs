//! Main content: one exhaustive dispatch over [`Block`].

use super::images::{drawing_run_xml, FetchedImage};
use super::numbering::SectionCounter;
use super::xml::{Body, Paragraph, ParagraphProps, RunStyle};
use crate::config::RenderConfig;
use crate::model::{Block, Run};
use crate::style;
use std::collections::HashMap;

pub(crate) fn write_body(
    body: &mut Body,
    blocks: &[Block],
    mut images: HashMap<usize, FetchedImage>,
    config: &RenderConfig,
) {
    let mut counter = SectionCounter::new();

    for (index, block) in blocks.iter().enumerate() {
        match block {
            Block::Heading { level, text } => {
                let number = counter.next(*level);
                write_heading(body, *level, &number, text);
            }
            Block::Paragraph { runs } => {
                let mut p = Paragraph::new(ParagraphProps::default());
                push_runs(&mut p, runs);
                body.push(p);
            }
            Block::List { ordered, items } => write_list(body, *ordered, items),
            Block::CodeBlock { language, code } => write_code(body, language, code),
            Block::Table { headers, rows } => write_table(body, headers, rows),
            Block::Image { alt, url } => {
                write_image(body, alt, url, images.remove(&index), config.image_width_cm)
            }
            Block::Blockquote { runs } => write_blockquote(body, runs),
        }
    }
}

fn write_heading(body: &mut Body, level: u8, number: &str, text: &str) {
    let (props, content, size) = match level {
        0 | 1 => (
            ParagraphProps {
                outline_level: Some(0),
                ..ParagraphProps::centered().spacing(24.0, 12.0)
            },
            format!("{number} {}", text.to_uppercase()),
            style::HEADING1_FONT_SIZE_PT,
        ),
        2 => (
            ParagraphProps {
                first_line_cm: Some(style::PARAGRAPH_INDENT_CM),
                outline_level: Some(1),
                ..ParagraphProps::default().spacing(18.0, 6.0)
            },
            format!("{number} {text}"),
            style::FONT_SIZE_PT,
        ),
        deeper => (
            ParagraphProps {
                first_line_cm: Some(style::PARAGRAPH_INDENT_CM),
                outline_level: Some((deeper - 1).min(8)),
                ..ParagraphProps::default().spacing(12.0, 6.0)
            },
            format!("{number} {text}"),
            style::FONT_SIZE_PT,
        ),
    };
    body.push(Paragraph::new(props).run(&content, &RunStyle::sized(size).bold()));
}

fn run_style(run: &Run) -> RunStyle {
    if run.code {
        RunStyle::code()
    } else {
        RunStyle {
            bold: run.bold,
            italic: run.italic,
            ..RunStyle::default()
        }
    }
}

fn push_runs(p: &mut Paragraph, runs: &[Run]) {
    for run in runs {
        p.push_run(&run.text, &run_style(run));
    }
}

fn write_list(body: &mut Body, ordered: bool, items: &[Vec<Run>]) {
    for (i, item) in items.iter().enumerate() {
        let prefix = if ordered {
            format!("{}. ", i + 1)
        } else {
            style::UNORDERED_BULLET.to_string()
        };
        let mut p = Paragraph::new(
            ParagraphProps::default().indent(style::PARAGRAPH_INDENT_CM, 0.0),
        )
        .run(&prefix, &RunStyle::default());
        push_runs(&mut p, item);
        body.push(p);
    }
}

fn write_code(body: &mut Body, language: &str, code: &str) {
    let has_label = !language.is_empty();
    if has_label {
        let props = ParagraphProps {
            line: Some(1.0),
            ..ParagraphProps::default()
                .indent(style::PARAGRAPH_INDENT_CM, 0.0)
                .spacing(6.0, 0.0)
        };
        body.push(Paragraph::new(props).run(
            &format!("Листинг ({language}):"),
            &RunStyle::sized(style::CAPTION_FONT_SIZE_PT).italic(),
        ));
    }

    let props = ParagraphProps {
        line: Some(1.0),
        border: Some(style::CODE_BORDER_COLOR),
        shading: Some(style::CODE_SHADING),
        ..ParagraphProps::default()
            .indent(style::PARAGRAPH_INDENT_CM, 0.0)
            .spacing(if has_label { 3.0 } else { 6.0 }, 6.0)
    };
    body.push(Paragraph::new(props).run(code, &RunStyle::code()));
}

fn write_table(body: &mut Body, headers: &[String], rows: &[Vec<String>]) {
    let columns = if headers.is_empty() {
        rows.first().map_or(0, Vec::len)
    } else {
        headers.len()
    };
    if columns == 0 {
        return;
    }
    let column_width = style::text_width_twips() / columns as u32;

    let mut xml = String::from("<w:tbl><w:tblPr>");
    xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/><w:jc w:val="center"/><w:tblBorders>"#);
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        xml.push_str(&format!(
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="{}"/>"#,
            style::TABLE_BORDER_COLOR
        ));
    }
    xml.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
    for _ in 0..columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{column_width}"/>"#));
    }
    xml.push_str("</w:tblGrid>");

    if !headers.is_empty() {
        table_row(&mut xml, headers, columns, column_width, true);
    }
    for row in rows {
        table_row(&mut xml, row, columns, column_width, false);
    }
    xml.push_str("</w:tbl>");
    body.push_raw(&xml);
}

fn table_row(xml: &mut String, cells: &[String], columns: usize, width: u32, header: bool) {
    xml.push_str("<w:tr>");
    for col in 0..columns {
        let text = cells.get(col).map_or("", String::as_str);
        let mut p = Paragraph::new(ParagraphProps::centered());
        if !text.is_empty() {
            let mut run_style = RunStyle::sized(style::TABLE_FONT_SIZE_PT);
            run_style.bold = header;
            p.push_run(text, &run_style);
        }
        xml.push_str(&format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>{}</w:tc>"#,
            p.to_xml()
        ));
    }
    xml.push_str("</w:tr>");
}

fn write_image(
    body: &mut Body,
    alt: &str,
    url: &str,
    fetched: Option<FetchedImage>,
    width_cm: f64,
) {
    match fetched {
        Some(image) => {
            let (cx, cy) = image.extent_emu(width_cm);
            let rel_id = body.add_media(image.extension, image.bytes);
            let id = body.media().len();
            let mut p = Paragraph::new(ParagraphProps::centered());
            p.push_raw(&drawing_run_xml(&rel_id, id, alt, cx, cy));
            body.push(p);
        }
        None => {
            let label = if alt.is_empty() { url } else { alt };
            body.push(
                Paragraph::new(ParagraphProps::centered())
                    .run(&format!("[Изображение: {label}]"), &RunStyle::default().italic()),
            );
        }
    }

    if !alt.is_empty() {
        body.push(
            Paragraph::new(ParagraphProps::centered().spacing(2.0, 6.0))
                .run(alt, &RunStyle::sized(style::TABLE_FONT_SIZE_PT).italic()),
        );
    }
}

fn write_blockquote(body: &mut Body, runs: &[Run]) {
    let mut p = Paragraph::new(
        ParagraphProps::default()
            .indent(style::QUOTE_INDENT_CM, 0.0)
            .spacing(6.0, 6.0),
    );
    for run in runs {
        let run_style = RunStyle {
            bold: run.bold,
            ..RunStyle::default().italic()
        };
        p.push_run(&run.text, &run_style);
    }
    body.push(p);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::images::decode_image;
    use quick_xml::escape::escape;

    /// Escaped text as it appears inside `<w:t>`.
    fn t(text: &str) -> String {
        format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(text))
    }

    fn render(blocks: &[Block]) -> Body {
        let mut body = Body::default();
        write_body(&mut body, blocks, HashMap::new(), &RenderConfig::default());
        body
    }

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    #[test]
    fn headings_are_numbered_and_styled_per_level() {
        let body = render(&[
            heading(1, "Введение"),
            heading(2, "Цель"),
            heading(2, "Задачи"),
            heading(1, "Ход"),
            heading(3, "Шаг"),
        ]);
        let xml = body.xml();
        for text in ["1 ВВЕДЕНИЕ", "1.1 Цель", "1.2 Задачи", "2 ХОД", "2.0.1 Шаг"] {
            assert!(xml.contains(&t(text)), "missing {text}");
        }
        assert_eq!(xml.matches(r#"<w:outlineLvl w:val="0"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:outlineLvl w:val="1"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:outlineLvl w:val="2"/>"#).count(), 1);
        assert!(xml.contains(r#"<w:spacing w:before="480" w:after="240"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="32"/>"#));
    }

    #[test]
    fn deep_heading_outline_level_is_capped() {
        let body = render(&[heading(12, "Deep")]);
        assert!(body.xml().contains(r#"<w:outlineLvl w:val="8"/>"#));
    }

    #[test]
    fn paragraph_runs_keep_their_formatting() {
        let body = render(&[Block::Paragraph {
            runs: vec![
                Run::plain("Some "),
                Run {
                    text: "bold".into(),
                    bold: true,
                    ..Run::default()
                },
                Run::code("x < y"),
                Run::line_break(),
            ],
        }]);
        let xml = body.xml();
        assert!(xml.contains(&format!("<w:r><w:rPr><w:b/><w:bCs/></w:rPr>{}</w:r>", t("bold"))));
        assert!(xml.contains(&t("x < y")));
        assert!(xml.contains(r#"w:ascii="Courier New""#));
        assert!(xml.contains("<w:r><w:br/></w:r>"));
    }

    #[test]
    fn list_items_get_prefixes() {
        let body = render(&[
            Block::List {
                ordered: true,
                items: vec![vec![Run::plain("a")], vec![Run::plain("b")]],
            },
            Block::List {
                ordered: false,
                items: vec![vec![Run::plain("c")]],
            },
        ]);
        let xml = body.xml();
        assert!(xml.contains(&t("1. ")));
        assert!(xml.contains(&t("2. ")));
        assert!(xml.contains(&t("– ")));
        assert_eq!(xml.matches(r#"<w:ind w:left="709" w:firstLine="0"/>"#).count(), 3);
    }

    #[test]
    fn code_block_with_label() {
        let body = render(&[Block::CodeBlock {
            language: "rust".into(),
            code: "fn main() {\n    println!();\n}".into(),
        }]);
        let xml = body.xml();
        assert!(xml.contains(&t("Листинг (rust):")));
        assert!(xml.contains(r#"w:fill="F2F2F2""#));
        assert!(xml.contains(r#"w:color="808080""#));
        assert_eq!(xml.matches("<w:br/>").count(), 2);
        assert!(xml.contains(r#"<w:spacing w:before="60" w:after="120" w:line="240" w:lineRule="auto"/>"#));
    }

    #[test]
    fn code_block_without_label() {
        let body = render(&[Block::CodeBlock {
            language: String::new(),
            code: "x".into(),
        }]);
        assert!(!body.xml().contains("Листинг"));
        assert!(body.xml().contains(r#"w:before="120" w:after="120""#));
    }

    #[test]
    fn table_pads_and_truncates_cells() {
        let body = render(&[Block::Table {
            headers: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into()], vec!["2".into(), "3".into(), "extra".into()]],
        }]);
        let xml = body.xml();
        assert_eq!(xml.matches("<w:tr>").count(), 3);
        assert_eq!(xml.matches("<w:tc>").count(), 6);
        assert_eq!(xml.matches("<w:gridCol ").count(), 2);
        assert!(!xml.contains("extra"));
        assert!(xml.contains(r#"<w:gridCol w:w="4677"/>"#));
        assert_eq!(xml.matches("<w:insideV ").count(), 1);
    }

    #[test]
    fn headerless_table_uses_first_row_width() {
        let body = render(&[Block::Table {
            headers: vec![],
            rows: vec![vec!["1".into(), "2".into(), "3".into()]],
        }]);
        assert_eq!(body.xml().matches("<w:gridCol ").count(), 3);
    }

    #[test]
    fn missing_image_renders_placeholder_and_caption() {
        let body = render(&[
            Block::Image {
                alt: "Схема".into(),
                url: "https://example.org/s.png".into(),
            },
            Block::Image {
                alt: String::new(),
                url: "https://example.org/t.png".into(),
            },
        ]);
        let xml = body.xml();
        assert!(xml.contains(&t("[Изображение: Схема]")));
        assert!(xml.contains(&t("[Изображение: https://example.org/t.png]")));
        assert_eq!(xml.matches(&t("Схема")).count(), 1);
        assert!(body.media().is_empty());
    }

    #[test]
    fn fetched_image_is_embedded() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 1))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let fetched = decode_image("a.png", png).unwrap();
        let blocks = vec![Block::Image {
            alt: "Фото".into(),
            url: "https://example.org/a.png".into(),
        }];
        let images = HashMap::from([(0, fetched)]);

        let mut body = Body::default();
        write_body(&mut body, &blocks, images, &RenderConfig::default());
        let xml = body.xml();
        assert!(xml.contains(r#"r:embed="rIdImage1""#));
        assert!(xml.contains(r#"<wp:extent cx="5040000" cy="2520000"/>"#));
        assert!(!xml.contains("Изображение:"));
        assert!(xml.contains(&t("Фото")));
        assert_eq!(body.media().len(), 1);
    }

    #[test]
    fn blockquote_is_italic_and_keeps_bold() {
        let body = render(&[Block::Blockquote {
            runs: vec![
                Run::plain("q"),
                Run::line_break(),
                Run {
                    text: "b".into(),
                    bold: true,
                    ..Run::default()
                },
            ],
        }]);
        let xml = body.xml();
        assert!(xml.contains(&format!("<w:r><w:rPr><w:i/><w:iCs/></w:rPr>{}</w:r>", t("q"))));
        assert!(xml.contains(&format!(
            "<w:r><w:rPr><w:b/><w:bCs/><w:i/><w:iCs/></w:rPr>{}</w:r>",
            t("b")
        )));
        assert!(xml.contains(r#"<w:ind w:left="1134" w:firstLine="0"/>"#));
    }
}
