//! HTML → DOCX packaging.
//!
//! The package carries the HTML verbatim as an `altChunk` (an MHT part) that
//! Word converts on open. Word's HTML importer ignores CSS `direction`, which
//! is why RTL output also gets explicit `dir`/`align` attributes on blocks.

use std::io::{Cursor, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::html::{extract_body, force_rtl_blocks};
use crate::export::ExportError;
use crate::gateway::strip_code_fences;
use crate::i18n::TextDirection;

pub const DOCX_FILENAME: &str = "optimized-resume.docx";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Letter portrait, in twips.
const PAGE_WIDTH: u32 = 12240;
const PAGE_HEIGHT: u32 = 15840;
const PAGE_MARGIN: u32 = 1000;

const MHT_BOUNDARY: &str = "----=mhtDocumentPart";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="mht" ContentType="message/rfc822"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rDocument" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="htmlChunk" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="/word/afchunk.mht"/>
</Relationships>"#;

/// Full HTML document handed to Word, with direction baked into styles and,
/// for RTL, into every block element.
pub fn render_docx_html(html: &str, direction: TextDirection) -> String {
    let html = strip_code_fences(html);
    let body = extract_body(&html);
    let body = match direction {
        TextDirection::Rtl => force_rtl_blocks(body),
        TextDirection::Ltr => body.into(),
    };
    let dir = direction.as_str();
    let align = direction.alignment();

    format!(
        r#"<!DOCTYPE html>
<html dir="{dir}">
<head>
  <meta charset="utf-8">
  <title>Resume</title>
  <style>
    body {{ font-family: Arial, Helvetica, sans-serif; font-size: 11pt; line-height: 1.5; color: #000; text-align: {align}; }}
    h1 {{ color: #4D2B8C; font-size: 24pt; margin-top: 0; margin-bottom: 8pt; text-align: {align}; direction: {dir}; }}
    h2 {{ color: #4D2B8C; font-size: 14pt; border-bottom: 2px solid #eee; padding-bottom: 4px; margin-top: 16pt; margin-bottom: 8pt; text-transform: uppercase; text-align: {align}; direction: {dir}; }}
    h3 {{ font-size: 12pt; font-weight: bold; margin-bottom: 4px; margin-top: 12pt; text-align: {align}; direction: {dir}; }}
    p, ul, li {{ text-align: {align}; direction: {dir}; }}
    p, ul {{ margin-top: 4px; margin-bottom: 8px; }}
    li {{ margin-bottom: 4px; }}
  </style>
</head>
<body style="direction: {dir}; text-align: {align};">
{body}
</body>
</html>
"#
    )
}

fn document_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:altChunk r:id="htmlChunk"/>
    <w:sectPr>
      <w:pgSz w:w="{PAGE_WIDTH}" w:h="{PAGE_HEIGHT}" w:orient="portrait"/>
      <w:pgMar w:top="{PAGE_MARGIN}" w:right="{PAGE_MARGIN}" w:bottom="{PAGE_MARGIN}" w:left="{PAGE_MARGIN}" w:header="720" w:footer="720" w:gutter="0"/>
    </w:sectPr>
  </w:body>
</w:document>"#
    )
}

/// Single-part MHT message wrapping the HTML, base64 encoded in 76-column lines.
fn mht_part(document_html: &str) -> String {
    let encoded = STANDARD.encode(document_html.as_bytes());
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / 76 + 1);
    for line in encoded.as_bytes().chunks(76) {
        // base64 output is ASCII
        wrapped.push_str(std::str::from_utf8(line).unwrap_or_default());
        wrapped.push_str("\r\n");
    }

    format!(
        "MIME-Version: 1.0\r\n\
         Content-Type: multipart/related; type=\"text/html\"; boundary=\"{MHT_BOUNDARY}\"\r\n\
         \r\n\
         --{MHT_BOUNDARY}\r\n\
         Content-Type: text/html; charset=\"utf-8\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         Content-Location: file:///C:/fake/document.html\r\n\
         \r\n\
         {wrapped}\r\n\
         --{MHT_BOUNDARY}--\r\n"
    )
}

/// Packages a complete HTML document as a DOCX file.
pub fn build_docx(document_html: &str) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let document = document_xml();
    let mht = mht_part(document_html);
    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/afchunk.mht", mht.as_bytes()),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Canonical HTML → DOCX bytes for the given surface direction.
pub fn render_docx(html: &str, direction: TextDirection) -> Result<Vec<u8>, ExportError> {
    build_docx(&render_docx_html(html, direction))
}
