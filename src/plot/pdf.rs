//! Multi-page PDF output
//!
//! Every page is rendered to SVG first, converted into a PDF form
//! XObject and then placed on its own page.
use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref};
use svg2pdf::usvg;
use svg2pdf::ConversionOptions;

use super::{render_svg, Page};
use crate::error::{Error, Result};

// SVG user units are CSS pixels at 96 dpi, PDF units are points at 72 dpi
const PT_PER_PX: f32 = 0.75;

#[derive(Clone, Debug, Default)]
pub struct Document {
    pages: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, page: &Page) -> Result<()> {
        debug!("Rendering page {}: {}", self.pages.len() + 1, page.title);
        self.pages.push(render_svg(page)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The SVG sources of all pages
    pub fn svg_pages(&self) -> &[String] {
        &self.pages
    }

    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let mut pdf = Pdf::new();
        let mut page_ids = Vec::with_capacity(self.pages.len());

        for (n, svg) in self.pages.iter().enumerate() {
            let tree = usvg::Tree::from_str(svg, &options)
                .map_err(|err| Error::Pdf(format!("page {}: {err}", n + 1)))?;
            let (chunk, svg_id) = svg2pdf::to_chunk(&tree, ConversionOptions::default())
                .map_err(|err| Error::Pdf(format!("page {}: {err}", n + 1)))?;
            let mut refs = HashMap::new();
            let chunk = chunk.renumber(|old| *refs.entry(old).or_insert_with(|| alloc.bump()));
            let svg_id = refs
                .get(&svg_id)
                .copied()
                .ok_or_else(|| Error::Pdf(format!("page {}: missing SVG object", n + 1)))?;

            let page_id = alloc.bump();
            let content_id = alloc.bump();
            let size = tree.size();
            let (width, height) = (size.width() * PT_PER_PX, size.height() * PT_PER_PX);
            let name = format!("S{}", n + 1);

            let mut content = Content::new();
            content.transform([width, 0., 0., height, 0., 0.]);
            content.x_object(Name(name.as_bytes()));
            pdf.stream(content_id, &content.finish());

            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0., 0., width, height));
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources()
                .x_objects()
                .pair(Name(name.as_bytes()), svg_id);
            page.finish();

            pdf.extend(&chunk);
            page_ids.push(page_id);
        }

        pdf.pages(page_tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);
        pdf.catalog(catalog_id).pages(page_tree_id);
        Ok(pdf.finish())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_pdf()?;
        std::fs::write(path, bytes).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        info!("Wrote {} pages to {path:?}", self.len());
        Ok(())
    }
}
