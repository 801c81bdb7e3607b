//! GOST 7.32-2017 layout constants.
//!
//! WordprocessingML measures lengths in twentieths of a point ("twips"),
//! font sizes in half-points and drawing extents in EMU. Everything here is
//! expressed in human units (mm, cm, pt) and converted at the edge with the
//! helpers at the bottom of the file.

// ── Page setup ───────────────────────────────────────────────────────────

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_LEFT_MM: f64 = 30.0;
pub const MARGIN_RIGHT_MM: f64 = 15.0;
pub const MARGIN_TOP_MM: f64 = 20.0;
pub const MARGIN_BOTTOM_MM: f64 = 20.0;

// ── Fonts ────────────────────────────────────────────────────────────────

pub const FONT_NAME: &str = "Times New Roman";
pub const FONT_SIZE_PT: f64 = 14.0;
pub const CODE_FONT_NAME: &str = "Courier New";
pub const CODE_FONT_SIZE_PT: f64 = 12.0;
pub const TABLE_FONT_SIZE_PT: f64 = 12.0;
pub const TITLE_FONT_SIZE_PT: f64 = 12.0;
pub const CAPTION_FONT_SIZE_PT: f64 = 10.0;
pub const HEADLINE_FONT_SIZE_PT: f64 = 16.0;
pub const HEADING1_FONT_SIZE_PT: f64 = 16.0;

// ── Spacing ──────────────────────────────────────────────────────────────

/// Line spacing multiplier for body text.
pub const LINE_SPACING: f64 = 1.5;
pub const PARAGRAPH_INDENT_CM: f64 = 1.25;
pub const TITLE_BLOCK_INDENT_CM: f64 = 10.0;
pub const QUOTE_INDENT_CM: f64 = 2.0;
/// Per-level indent of table-of-contents entries.
pub const TOC_LEVEL_INDENT_CM: f64 = 1.0;
/// Right-aligned dot-leader tab stop of table-of-contents entries (≈16.5 cm).
pub const TOC_TAB_POS_TWIPS: u32 = 9356;
/// Width of embedded images.
pub const IMAGE_WIDTH_CM: f64 = 14.0;

pub const CODE_SHADING: &str = "F2F2F2";
pub const CODE_BORDER_COLOR: &str = "808080";
pub const TABLE_BORDER_COLOR: &str = "000000";

// ── Fixed labels ─────────────────────────────────────────────────────────

pub const REPORT_HEADLINE: &str = "ОТЧЕТ";
pub const TOC_TITLE: &str = "СОДЕРЖАНИЕ";
pub const TOC_EMPTY: &str = "(Содержание пусто — нет заголовков)";
pub const TITLE_SEPARATOR_LEN: usize = 56;
pub const SIGNATURE_LINE: &str = "______________";
pub const NAME_PLACEHOLDER_LEN: usize = 40;
pub const SIGNATURE_CAPTION: &str =
    "          (фамилия, имя, отчество)                    (подпись)";
pub const UNORDERED_BULLET: &str = "– ";

// ── Default title page values ────────────────────────────────────────────

pub const DEFAULT_UNIVERSITY: &str = "Федеральное агентство морского и речного транспорта\n\
Федеральное государственное бюджетное образовательное учреждение\n\
высшего образования\n\
«Государственный университет морского и речного флота\n\
имени адмирала С.О. Макарова»";
pub const DEFAULT_INSTITUTE: &str = "ИНСТИТУТ ВОДНОГО ТРАНСПОРТА";
pub const DEFAULT_DEPARTMENT: &str =
    "КАФЕДРА «КОМПЛЕКСНОЕ ОБЕСПЕЧЕНИЕ ИНФОРМАЦИОННОЙ БЕЗОПАСНОСТИ»";
pub const DEFAULT_CITY: &str = "Санкт – Петербург";
pub const DEFAULT_GROUP: &str = "ИЗ–41";

// ── Unit conversion ──────────────────────────────────────────────────────

pub fn mm_to_twips(mm: f64) -> u32 {
    (mm * 1440.0 / 25.4).round() as u32
}

pub fn cm_to_twips(cm: f64) -> u32 {
    mm_to_twips(cm * 10.0)
}

pub fn pt_to_twips(pt: f64) -> u32 {
    (pt * 20.0).round() as u32
}

pub fn pt_to_half_points(pt: f64) -> u32 {
    (pt * 2.0).round() as u32
}

/// Line spacing multiplier → `w:spacing/@w:line` with `lineRule="auto"`.
pub fn line_spacing_value(multiplier: f64) -> u32 {
    (multiplier * 240.0).round() as u32
}

pub fn cm_to_emu(cm: f64) -> u64 {
    (cm * 360_000.0).round() as u64
}

/// Usable text width between the left and right margins.
pub fn text_width_twips() -> u32 {
    mm_to_twips(PAGE_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_geometry_in_twips() {
        assert_eq!(mm_to_twips(PAGE_WIDTH_MM), 11906);
        assert_eq!(mm_to_twips(PAGE_HEIGHT_MM), 16838);
        assert_eq!(mm_to_twips(MARGIN_LEFT_MM), 1701);
        assert_eq!(mm_to_twips(MARGIN_RIGHT_MM), 850);
        assert_eq!(mm_to_twips(MARGIN_TOP_MM), 1134);
    }

    #[test]
    fn paragraph_metrics() {
        assert_eq!(cm_to_twips(PARAGRAPH_INDENT_CM), 709);
        assert_eq!(pt_to_half_points(FONT_SIZE_PT), 28);
        assert_eq!(line_spacing_value(LINE_SPACING), 360);
        assert_eq!(pt_to_twips(24.0), 480);
    }

    #[test]
    fn text_width_is_165mm() {
        assert_eq!(text_width_twips(), 9354);
    }

    #[test]
    fn image_width_in_emu() {
        assert_eq!(cm_to_emu(IMAGE_WIDTH_CM), 5_040_000);
    }
}
