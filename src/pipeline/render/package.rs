//! OPC packaging: wrap the body XML and media into a `.docx` zip.

use super::xml::{strip_control_chars, Body, Paragraph, ParagraphProps, RunStyle};
use crate::error::Md2GostError;
use crate::model::Metadata;
use crate::style;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const FOOTER_DEFAULT_REL: &str = "rIdFooterDefault";
const FOOTER_FIRST_REL: &str = "rIdFooterFirst";

/// Serialise the whole package into memory. Nothing is returned unless
/// every part was written.
pub(crate) fn assemble(body: Body, meta: &Metadata) -> Result<Vec<u8>, Md2GostError> {
    let (body_xml, media) = body.into_parts();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut put = |name: &str, bytes: &[u8], options: SimpleFileOptions| -> Result<(), Md2GostError> {
        zip.start_file(name, options)?;
        zip.write_all(bytes).map_err(|e| Md2GostError::RenderFailed {
            detail: format!("writing {name}: {e}"),
        })
    };

    put("[Content_Types].xml", content_types_xml().as_bytes(), deflated)?;
    put("_rels/.rels", package_rels_xml().as_bytes(), deflated)?;
    put("docProps/core.xml", core_xml(meta).as_bytes(), deflated)?;
    put("word/document.xml", document_xml(&body_xml).as_bytes(), deflated)?;
    put("word/styles.xml", styles_xml().as_bytes(), deflated)?;
    put("word/settings.xml", SETTINGS_XML.as_bytes(), deflated)?;
    put("word/footer1.xml", page_number_footer_xml().as_bytes(), deflated)?;
    put("word/footer2.xml", EMPTY_FOOTER_XML.as_bytes(), deflated)?;

    let mut rels = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        r#"<Relationship Id="rIdSettings" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>"#,
    ));
    for (rel_id, target) in [(FOOTER_DEFAULT_REL, "footer1.xml"), (FOOTER_FIRST_REL, "footer2.xml")] {
        rels.push_str(&format!(
            r#"<Relationship Id="{rel_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="{target}"/>"#
        ));
    }
    for item in &media {
        rels.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
            item.rel_id, item.file_name
        ));
    }
    rels.push_str("</Relationships>");
    put("word/_rels/document.xml.rels", rels.as_bytes(), deflated)?;

    for item in &media {
        put(&format!("word/media/{}", item.file_name), &item.bytes, stored)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn content_types_xml() -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    ));
    for (ext, mime) in [
        ("png", "image/png"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
    ] {
        xml.push_str(&format!(
            r#"<Default Extension="{ext}" ContentType="{mime}"/>"#
        ));
    }
    for (part, kind) in [
        ("/word/document.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"),
        ("/word/styles.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"),
        ("/word/settings.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"),
        ("/word/footer1.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"),
        ("/word/footer2.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
    ] {
        xml.push_str(&format!(
            r#"<Override PartName="{part}" ContentType="{kind}"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels_xml() -> &'static str {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
        r#"</Relationships>"#,
    )
}

fn core_xml(meta: &Metadata) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>{title}</dc:title><dc:creator>{creator}</dc:creator><dc:language>ru-RU</dc:language>"#,
            r#"</cp:coreProperties>"#,
        ),
        title = escape(strip_control_chars(&meta.title).as_str()),
        creator = escape(strip_control_chars(&meta.author).as_str()),
    )
}

fn document_xml(body_xml: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
            r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
            r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<w:body>{body}{sect}</w:body></w:document>"#,
        ),
        body = body_xml,
        sect = section_properties_xml(),
    )
}

/// A4 portrait, GOST margins, page-number footer except on the title page.
fn section_properties_xml() -> String {
    format!(
        concat!(
            r#"<w:sectPr>"#,
            r#"<w:footerReference w:type="default" r:id="{default_rel}"/>"#,
            r#"<w:footerReference w:type="first" r:id="{first_rel}"/>"#,
            r#"<w:pgSz w:w="{w}" w:h="{h}"/>"#,
            r#"<w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="709" w:footer="709" w:gutter="0"/>"#,
            r#"<w:titlePg/>"#,
            r#"</w:sectPr>"#,
        ),
        default_rel = FOOTER_DEFAULT_REL,
        first_rel = FOOTER_FIRST_REL,
        w = style::mm_to_twips(style::PAGE_WIDTH_MM),
        h = style::mm_to_twips(style::PAGE_HEIGHT_MM),
        top = style::mm_to_twips(style::MARGIN_TOP_MM),
        right = style::mm_to_twips(style::MARGIN_RIGHT_MM),
        bottom = style::mm_to_twips(style::MARGIN_BOTTOM_MM),
        left = style::mm_to_twips(style::MARGIN_LEFT_MM),
    )
}

/// Document defaults: the body-text style every paragraph inherits.
fn styles_xml() -> String {
    let font = style::FONT_NAME;
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#,
            r#"<w:color w:val="000000"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
            r#"<w:lang w:val="ru-RU" w:eastAsia="en-US" w:bidi="ar-SA"/>"#,
            r#"</w:rPr></w:rPrDefault>"#,
            r#"<w:pPrDefault><w:pPr>"#,
            r#"<w:spacing w:before="0" w:after="0" w:line="{line}" w:lineRule="auto"/>"#,
            r#"<w:ind w:firstLine="{indent}"/><w:jc w:val="both"/>"#,
            r#"</w:pPr></w:pPrDefault></w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/>"#,
            r#"<w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar>"#,
            r#"<w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/>"#,
            r#"<w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/>"#,
            r#"</w:tblCellMar></w:tblPr></w:style>"#,
            r#"</w:styles>"#,
        ),
        font = font,
        size = style::pt_to_half_points(style::FONT_SIZE_PT),
        line = style::line_spacing_value(style::LINE_SPACING),
        indent = style::cm_to_twips(style::PARAGRAPH_INDENT_CM),
    )
}

const SETTINGS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:defaultTabStop w:val="708"/><w:characterSpacingControl w:val="doNotCompress"/>"#,
    r#"</w:settings>"#,
);

const EMPTY_FOOTER_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p/></w:ftr>"#,
);

/// Centered `PAGE` field.
fn page_number_footer_xml() -> String {
    let mut p = Paragraph::new(ParagraphProps::centered());
    p.push_raw(r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>"#);
    p.push_raw(r#"<w:r><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r>"#);
    p.push_raw(r#"<w:r><w:fldChar w:fldCharType="separate"/></w:r>"#);
    p.push_run("1", &RunStyle::sized(style::FONT_SIZE_PT));
    p.push_raw(r#"<w:r><w:fldChar w:fldCharType="end"/></w:r>"#);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{}</w:ftr>"#,
        ),
        p.to_xml()
    )
}
