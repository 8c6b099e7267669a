use anyhow::{Context, Result};
use async_trait::async_trait;

/// The `extract_text` step's external dependency: turn PDF bytes into
/// 1-indexed page text — `DocumentPage` numbers pages starting at 1.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    async fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>>;
}

/// Extracts text per page with `lopdf`. PDF parsing is synchronous and
/// CPU-bound, so it runs on a blocking thread rather than the async
/// executor's worker.
pub struct LopdfExtractor;

#[async_trait]
impl PdfExtractor for LopdfExtractor {
    async fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>> {
        let bytes = pdf_bytes.to_vec();
        tokio::task::spawn_blocking(move || extract_pages_blocking(&bytes))
            .await
            .context("pdf extraction task panicked")?
    }
}

fn extract_pages_blocking(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(pdf_bytes).context("failed to parse PDF")?;

    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let pages = page_numbers
        .into_iter()
        .map(|page_no| doc.extract_text(&[page_no]).unwrap_or_default())
        .collect();

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    fn single_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 24 Tf 72 712 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        });
        doc.objects
            .get_mut(&page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Parent", pages_id);
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn extracts_single_page_text() {
        let bytes = single_page_pdf("Revenue grew 12%");
        let pages = LopdfExtractor.extract_pages(&bytes).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Revenue"));
    }
}
