//! Small WordprocessingML builders.
//!
//! Paragraph and run properties are written in the element order the
//! schema requires (`pPr`: pBdr, shd, tabs, spacing, ind, jc, outlineLvl;
//! `rPr`: rFonts, b, i, sz, szCs). Word refuses files that get the order
//! wrong, so all property XML is produced here and nowhere else.

use crate::style;
use quick_xml::escape::escape;

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Justify {
    Left,
    Center,
}

impl Justify {
    fn val(self) -> &'static str {
        match self {
            Justify::Left => "left",
            Justify::Center => "center",
        }
    }
}

/// Paragraph-level overrides of the document default style.
///
/// `None` means "inherit from the default style" (justified, 1.25 cm first
/// line, 1.5 line spacing, no spacing before/after).
#[derive(Debug, Clone, Default)]
pub(crate) struct ParagraphProps {
    pub justify: Option<Justify>,
    pub before_pt: Option<f64>,
    pub after_pt: Option<f64>,
    pub line: Option<f64>,
    pub left_cm: Option<f64>,
    pub first_line_cm: Option<f64>,
    pub outline_level: Option<u8>,
    /// Single-line box border in this colour.
    pub border: Option<&'static str>,
    /// Solid background fill.
    pub shading: Option<&'static str>,
    /// Right-aligned dot-leader tab stop at this position.
    pub right_tab_twips: Option<u32>,
}

impl ParagraphProps {
    /// Centered, no first-line indent.
    pub fn centered() -> Self {
        Self {
            justify: Some(Justify::Center),
            first_line_cm: Some(0.0),
            ..Self::default()
        }
    }

    /// Tight single-spaced line, used on the title page.
    pub fn single_spaced(mut self) -> Self {
        self.line = Some(1.0);
        self.before_pt = Some(0.0);
        self.after_pt = Some(0.0);
        self
    }

    pub fn spacing(mut self, before_pt: f64, after_pt: f64) -> Self {
        self.before_pt = Some(before_pt);
        self.after_pt = Some(after_pt);
        self
    }

    pub fn indent(mut self, left_cm: f64, first_line_cm: f64) -> Self {
        self.left_cm = Some(left_cm);
        self.first_line_cm = Some(first_line_cm);
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();

        if let Some(color) = self.border {
            xml.push_str("<w:pBdr>");
            for side in ["top", "left", "bottom", "right"] {
                xml.push_str(&format!(
                    r#"<w:{side} w:val="single" w:sz="4" w:space="4" w:color="{color}"/>"#
                ));
            }
            xml.push_str("</w:pBdr>");
        }
        if let Some(fill) = self.shading {
            xml.push_str(&format!(
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#
            ));
        }
        if let Some(pos) = self.right_tab_twips {
            xml.push_str(&format!(
                r#"<w:tabs><w:tab w:val="right" w:leader="dot" w:pos="{pos}"/></w:tabs>"#
            ));
        }

        if self.before_pt.is_some() || self.after_pt.is_some() || self.line.is_some() {
            xml.push_str("<w:spacing");
            if let Some(pt) = self.before_pt {
                xml.push_str(&format!(r#" w:before="{}""#, style::pt_to_twips(pt)));
            }
            if let Some(pt) = self.after_pt {
                xml.push_str(&format!(r#" w:after="{}""#, style::pt_to_twips(pt)));
            }
            if let Some(multiplier) = self.line {
                xml.push_str(&format!(
                    r#" w:line="{}" w:lineRule="auto""#,
                    style::line_spacing_value(multiplier)
                ));
            }
            xml.push_str("/>");
        }

        if self.left_cm.is_some() || self.first_line_cm.is_some() {
            xml.push_str("<w:ind");
            if let Some(cm) = self.left_cm {
                xml.push_str(&format!(r#" w:left="{}""#, style::cm_to_twips(cm)));
            }
            if let Some(cm) = self.first_line_cm {
                xml.push_str(&format!(r#" w:firstLine="{}""#, style::cm_to_twips(cm)));
            }
            xml.push_str("/>");
        }

        if let Some(justify) = self.justify {
            xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, justify.val()));
        }
        if let Some(level) = self.outline_level {
            xml.push_str(&format!(r#"<w:outlineLvl w:val="{level}"/>"#));
        }

        if xml.is_empty() {
            xml
        } else {
            format!("<w:pPr>{xml}</w:pPr>")
        }
    }
}

/// Character formatting of one run. `None` inherits the default style.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub font: Option<&'static str>,
    pub size_pt: Option<f64>,
}

impl RunStyle {
    pub fn sized(size_pt: f64) -> Self {
        Self {
            size_pt: Some(size_pt),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Monospace style for inline code and code blocks.
    pub fn code() -> Self {
        Self {
            font: Some(style::CODE_FONT_NAME),
            size_pt: Some(style::CODE_FONT_SIZE_PT),
            ..Self::default()
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();
        if let Some(font) = self.font {
            xml.push_str(&format!(
                r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#
            ));
        }
        if self.bold {
            xml.push_str("<w:b/><w:bCs/>");
        }
        if self.italic {
            xml.push_str("<w:i/><w:iCs/>");
        }
        if let Some(pt) = self.size_pt {
            let half = style::pt_to_half_points(pt);
            xml.push_str(&format!(r#"<w:sz w:val="{half}"/><w:szCs w:val="{half}"/>"#));
        }
        if xml.is_empty() {
            xml
        } else {
            format!("<w:rPr>{xml}</w:rPr>")
        }
    }
}

/// One `<w:r>`: `\n` becomes `<w:br/>` and `\t` becomes `<w:tab/>`.
pub(crate) fn run_xml(text: &str, run_style: &RunStyle) -> String {
    let mut xml = format!("<w:r>{}", run_style.to_xml());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                xml.push_str("<w:tab/>");
            }
            let clean = strip_control_chars(piece);
            if !clean.is_empty() {
                xml.push_str(r#"<w:t xml:space="preserve">"#);
                xml.push_str(&escape(clean.as_str()));
                xml.push_str("</w:t>");
            }
        }
    }
    xml.push_str("</w:r>");
    xml
}

/// XML 1.0 forbids most C0 control characters even when escaped.
pub(crate) fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// A paragraph under construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct Paragraph {
    props: ParagraphProps,
    content: String,
}

impl Paragraph {
    pub fn new(props: ParagraphProps) -> Self {
        Self {
            props,
            content: String::new(),
        }
    }

    pub fn run(mut self, text: &str, run_style: &RunStyle) -> Self {
        self.push_run(text, run_style);
        self
    }

    pub fn push_run(&mut self, text: &str, run_style: &RunStyle) {
        self.content.push_str(&run_xml(text, run_style));
    }

    /// Append pre-built run XML (drawings, fields).
    pub fn push_raw(&mut self, xml: &str) {
        self.content.push_str(xml);
    }

    pub fn tab(mut self) -> Self {
        self.content.push_str("<w:r><w:tab/></w:r>");
        self
    }

    pub fn to_xml(&self) -> String {
        format!("<w:p>{}{}</w:p>", self.props.to_xml(), self.content)
    }
}

/// The growing `<w:body>` content plus the media it references.
#[derive(Debug, Default)]
pub(crate) struct Body {
    xml: String,
    media: Vec<Media>,
}

/// An embedded binary part under `word/media/`.
#[derive(Debug, Clone)]
pub(crate) struct Media {
    pub rel_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Body {
    pub fn push(&mut self, paragraph: Paragraph) {
        self.xml.push_str(&paragraph.to_xml());
    }

    pub fn push_raw(&mut self, xml: &str) {
        self.xml.push_str(xml);
    }

    pub fn page_break(&mut self) {
        self.xml
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    /// Register an image part and return its relationship id.
    pub fn add_media(&mut self, extension: &str, bytes: Vec<u8>) -> String {
        let n = self.media.len() + 1;
        let rel_id = format!("rIdImage{n}");
        self.media.push(Media {
            rel_id: rel_id.clone(),
            file_name: format!("image{n}.{extension}"),
            bytes,
        });
        rel_id
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn into_parts(self) -> (String, Vec<Media>) {
        (self.xml, self.media)
    }
}
