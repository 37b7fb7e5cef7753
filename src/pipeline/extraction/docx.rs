//! Plain text of a Word (.docx) document.
//!
//! Only the body-level paragraphs of the main part are read, the way Word's
//! own object model lists them. Paragraph text is the concatenation of its
//! direct runs; tabs and line breaks inside those runs are kept. Text boxes,
//! drawings and table cells nested below a paragraph or the body are skipped.
//! Namespace prefixes are ignored.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

const BODY_PART: &str = "word/document.xml";

/// Paragraph texts of the document, in order, empty paragraphs included.
pub fn docx_paragraphs(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut part = archive
        .by_name(BODY_PART)
        .map_err(|e| ExtractionError::Docx(format!("{BODY_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|_| ExtractionError::EncodingError)?;

    paragraphs_from_xml(&xml)
}

/// Paragraphs joined by a single space.
pub fn docx_text(path: &Path) -> Result<String, ExtractionError> {
    Ok(docx_paragraphs(path)?.join(" "))
}

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    // Local names of the currently open elements.
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && ends_with(&open, &["body"]) {
                    current = Some(String::new());
                }
                open.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if name.as_ref() == b"p" && ends_with(&open, &["body"]) {
                    paragraphs.push(String::new());
                } else if ends_with(&open, &["body", "p", "r"]) {
                    if let Some(text) = current.as_mut() {
                        match name.as_ref() {
                            b"tab" => text.push('\t'),
                            b"br" | b"cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(t) => {
                if ends_with(&open, &["body", "p", "r", "t"]) {
                    if let Some(text) = current.as_mut() {
                        text.push_str(&t.unescape().map_err(docx_error)?);
                    }
                }
            }
            Event::End(_) => {
                if let Some(name) = open.pop() {
                    if name == b"p" && ends_with(&open, &["body"]) {
                        if let Some(text) = current.take() {
                            paragraphs.push(text);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn ends_with(open: &[Vec<u8>], tail: &[&str]) -> bool {
    open.len() >= tail.len()
        && open[open.len() - tail.len()..]
            .iter()
            .zip(tail)
            .all(|(name, expected)| name.as_slice() == expected.as_bytes())
}

fn docx_error(e: quick_xml::Error) -> ExtractionError {
    ExtractionError::Docx(e.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::write_docx;
    use super::*;

    fn body(paragraphs: &str) -> String {
        format!("<w:document><w:body>{paragraphs}</w:body></w:document>")
    }

    #[test]
    fn paragraphs_joined_with_space() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.docx");
        write_docx(&path, &["Age: 52", "Sex: Male", "Glucose: 88"]);

        assert_eq!(docx_text(&path).unwrap(), "Age: 52 Sex: Male Glucose: 88");
    }

    #[test]
    fn empty_paragraphs_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gaps.docx");
        write_docx(&path, &["A", "", "B"]);

        assert_eq!(docx_paragraphs(&path).unwrap(), vec!["A", "", "B"]);
        assert_eq!(docx_text(&path).unwrap(), "A  B");
    }

    #[test]
    fn runs_are_concatenated() {
        let xml = body(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>Total </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>Cholesterol</w:t></w:r>\
             <w:r><w:tab/><w:t>210</w:t><w:br/></w:r></w:p>",
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Total Cholesterol\t210\n"]);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = body("<w:p><w:r><w:t>BP &lt; 120 &amp; HR &gt; 60 &#65;&#x42;</w:t></w:r></w:p>");
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["BP < 120 & HR > 60 AB"]);
    }

    #[test]
    fn paragraph_props_element_is_not_a_paragraph() {
        let xml = body("<w:p><w:pPr><w:pStyle w:val=\"Title\"/></w:pPr><w:r><w:t>Hi</w:t></w:r></w:p>");
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Hi"]);
    }

    #[test]
    fn text_box_inside_a_run_does_not_cut_the_paragraph() {
        let xml = body(
            "<w:p><w:r><w:t>Glucose:</w:t></w:r>\
             <w:r><w:pict><v:shape><v:textbox><w:txbxContent>\
             <w:p><w:r><w:t>Logo</w:t></w:r></w:p>\
             </w:txbxContent></v:textbox></v:shape></w:pict></w:r>\
             <w:r><w:t xml:space=\"preserve\"> 120</w:t></w:r></w:p>",
        );
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Glucose: 120"]);

        let fields = crate::pipeline::extraction::extract_fields(&paragraphs.join(" "));
        assert!(fields.contains_key(&crate::pipeline::extraction::ClinicalField::Glucose));
    }

    #[test]
    fn self_closing_text_element_is_empty() {
        let xml = body(
            "<w:p><w:r><w:t xml:space=\"preserve\"/></w:r><w:r><w:t>Age: 52</w:t></w:r></w:p>",
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Age: 52"]);
    }

    #[test]
    fn table_cells_are_not_body_paragraphs() {
        let xml = body(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Before", "After"]);
    }

    #[test]
    fn malformed_xml_is_docx_error() {
        let xml = body("<w:p><w:r><w:t>open</w:r></w:p>");
        assert!(matches!(paragraphs_from_xml(&xml), Err(ExtractionError::Docx(_))));
    }

    #[test]
    fn not_a_zip_is_docx_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fake.docx");
        std::fs::write(&path, b"plain bytes").unwrap();
        assert!(matches!(docx_text(&path), Err(ExtractionError::Docx(_))));
    }

    #[test]
    fn zip_without_body_is_docx_error() {
        use std::io::Write;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.docx");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap();

        assert!(matches!(docx_text(&path), Err(ExtractionError::Docx(_))));
    }
}
