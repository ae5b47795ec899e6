use crate::error::IngestError;
use crate::models::PageDocument;
use lopdf::Document;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct PageText {
    /// One-based page number as reported by the PDF page tree.
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        // Pages without a text layer are kept so the page count survives extraction.
        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(format!("page {page_no}: {error}")))?;

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        if pages.is_empty() {
            return Err(IngestError::PdfParse(format!(
                "pdf has no pages: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

/// Loads a PDF into one [`PageDocument`] per page, tagged with the file path.
pub fn load_documents(path: &Path) -> Result<Vec<PageDocument>, IngestError> {
    load_documents_as(path, &path.to_string_lossy())
}

/// Same as [`load_documents`] but records `source` as provenance, which lets
/// uploads keep the client's file name instead of a temporary path.
pub fn load_documents_as(path: &Path, source: &str) -> Result<Vec<PageDocument>, IngestError> {
    load_with(&LopdfExtractor, path, source)
}

pub fn load_with<X: PdfExtractor + ?Sized>(
    extractor: &X,
    path: &Path,
    source: &str,
) -> Result<Vec<PageDocument>, IngestError> {
    if !path.is_file() {
        error!(path = %path.display(), "pdf not found");
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    info!(path = %path.display(), "loading pdf");
    let pages = extractor.extract_pages(path).map_err(|err| {
        error!(path = %path.display(), error = %err, "pdf extraction failed");
        err
    })?;

    let documents = pages
        .into_iter()
        .map(|page| PageDocument {
            source: source.to_string(),
            page: page.number.saturating_sub(1),
            text: page.text,
        })
        .collect::<Vec<_>>();

    info!(path = %path.display(), pages = documents.len(), "pdf loaded");
    Ok(documents)
}

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::path::Path;

    /// Writes a minimal PDF with one Courier text line per page.
    pub fn write_pdf(path: &Path, pages: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_pdf;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn one_document_per_page_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("three.pdf");
        write_pdf(&path, &["first page", "second page", "third page"])?;

        let documents = load_documents(&path)?;

        assert_eq!(documents.len(), 3);
        assert_eq!(
            documents.iter().map(|doc| doc.page).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(documents[0].text.contains("first page"));
        assert!(documents[2].text.contains("third page"));
        assert_eq!(documents[1].source, path.to_string_lossy());
        Ok(())
    }

    #[test]
    fn source_label_overrides_path() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("upload.tmp");
        write_pdf(&path, &["Mike is a teacher in Paris."])?;

        let documents = load_documents_as(&path, "mike.pdf")?;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source, "mike.pdf");
        Ok(())
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_documents(Path::new("/definitely/not/here.pdf"));
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }

    #[test]
    fn unreadable_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = load_documents(&path);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }
}
