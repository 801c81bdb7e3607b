//! The title page: institution header, work description, signature block.

use super::xml::{Body, Justify, Paragraph, ParagraphProps, RunStyle};
use crate::config::TitleDefaults;
use crate::model::{Metadata, WorkType};
use crate::style;

/// Metadata merged with configured fallbacks, as printed on the page.
struct TitleFields<'a> {
    university: &'a str,
    institute: &'a str,
    department: &'a str,
    city: &'a str,
    group: &'a str,
    year: &'a str,
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

pub(crate) fn write_title_page(
    body: &mut Body,
    meta: &Metadata,
    work_type: WorkType,
    defaults: &TitleDefaults,
) {
    let fields = TitleFields {
        university: or_default(&meta.university, &defaults.university),
        institute: or_default(&meta.institute, &defaults.institute),
        department: or_default(&meta.department, &defaults.department),
        city: or_default(&meta.city, &defaults.city),
        group: or_default(&meta.group, &defaults.group),
        year: or_default(&meta.year, &defaults.year),
    };
    let size = style::TITLE_FONT_SIZE_PT;

    centered(body, fields.university, size);
    centered(body, &"–".repeat(style::TITLE_SEPARATOR_LEN), size);
    centered(body, fields.institute, size);
    blank_centered(body, 1);
    centered(body, fields.department, size);
    blank_centered(body, 2);

    centered(body, style::REPORT_HEADLINE, style::HEADLINE_FONT_SIZE_PT);

    let mut work_line = format!("по {}", work_type.genitive());
    if !meta.work_number.is_empty() {
        work_line.push_str(&format!(" №{}", meta.work_number));
    }
    centered(body, &work_line, style::FONT_SIZE_PT);

    if !meta.subject.is_empty() {
        centered(body, &format!("по дисциплине «{}»", meta.subject), size);
    }
    if !meta.title.is_empty() {
        let props = ParagraphProps::centered().single_spaced().spacing(6.0, 0.0);
        body.push(Paragraph::new(props).run(&format!("«{}»", meta.title), &RunStyle::sized(size).bold()));
    }
    blank_centered(body, 3);

    right_block(body, &format!("Выполнил: студент группы {}", fields.group), true, size);
    right_block(body, "", false, size);
    signature(body, &meta.author);
    right_block(body, "", false, size);
    right_block(body, "Руководитель:", true, size);
    right_block(body, "", false, size);
    signature(body, &meta.teacher);
    right_block(body, "", false, size);
    right_block(
        body,
        &format!(
            "Представлена на кафедру:   «___» _____________ {} г.",
            fields.year
        ),
        true,
        size,
    );

    blank_centered(body, 1);
    centered(body, fields.city, size);
    centered(body, fields.year, size);
}

fn centered(body: &mut Body, text: &str, size_pt: f64) {
    let mut p = Paragraph::new(ParagraphProps::centered().single_spaced());
    if !text.is_empty() {
        p.push_run(text, &RunStyle::sized(size_pt).bold());
    }
    body.push(p);
}

fn blank_centered(body: &mut Body, count: usize) {
    for _ in 0..count {
        centered(body, "", style::TITLE_FONT_SIZE_PT);
    }
}

fn right_block(body: &mut Body, text: &str, bold: bool, size_pt: f64) {
    let props = ParagraphProps {
        justify: Some(Justify::Left),
        ..ParagraphProps::default()
            .single_spaced()
            .indent(style::TITLE_BLOCK_INDENT_CM, 0.0)
    };
    let mut p = Paragraph::new(props);
    if !text.is_empty() {
        let mut run_style = RunStyle::sized(size_pt);
        run_style.bold = bold;
        p.push_run(text, &run_style);
    }
    body.push(p);
}

/// Name (or a blank line to fill in by hand) followed by the signature
/// line and its caption.
fn signature(body: &mut Body, name: &str) {
    let name = if name.is_empty() {
        "_".repeat(style::NAME_PLACEHOLDER_LEN)
    } else {
        name.to_string()
    };
    right_block(
        body,
        &format!("{name}   {}", style::SIGNATURE_LINE),
        false,
        style::TITLE_FONT_SIZE_PT,
    );
    right_block(
        body,
        style::SIGNATURE_CAPTION,
        false,
        style::CAPTION_FONT_SIZE_PT,
    );
}
