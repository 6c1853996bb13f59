// src/report/pdf.rs
//! [`ReportDocument`] over `lopdf`. Each page's content stream is replayed
//! into positioned text (see [`super::layout`]) and tables are rebuilt from
//! those positions.

use lopdf::{content::Content, Document, Object, ObjectId};
use std::path::Path;
use tracing::debug;

use super::document::ReportDocument;
use super::layout::{group_lines, group_tables, text_runs, Line};
use crate::error::{ExtractError, Result};
use crate::table::RawGrid;

pub struct PdfReport {
    doc: Document,
    /// Page number and page object, in page order.
    pages: Vec<(u32, ObjectId)>,
}

impl PdfReport {
    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ExtractError::MissingResource(format!(
                "report {} does not exist",
                path.display()
            )));
        }
        Self::from_document(Document::load(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_document(Document::load_mem(bytes)?)
    }

    fn from_document(mut doc: Document) -> Result<Self> {
        let _ = doc.decompress();
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        if pages.is_empty() {
            return Err(ExtractError::EmptyInput("report has no pages".into()));
        }
        debug!(pages = pages.len(), "opened report");
        Ok(PdfReport { doc, pages })
    }

    fn page(&self, index: usize) -> Result<(u32, ObjectId)> {
        self.pages.get(index).copied().ok_or_else(|| {
            ExtractError::MissingResource(format!(
                "page index {index} is outside a {}-page report",
                self.pages.len()
            ))
        })
    }

    /// Text lines of a page, top first.
    pub fn lines(&self, index: usize) -> Result<Vec<Line>> {
        let (_, id) = self.page(index)?;
        let content = Content::decode(&self.doc.get_page_content(id)?)?;
        Ok(group_lines(text_runs(&content)))
    }
}

impl ReportDocument for PdfReport {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let lines = self.lines(index)?;
        if lines.is_empty() {
            // fonts whose bytes only lopdf's own decoder understands
            let (number, _) = self.page(index)?;
            return Ok(self.doc.extract_text(&[number])?);
        }
        Ok(lines.iter().map(Line::text).collect::<Vec<_>>().join("\n"))
    }

    fn extract_table(&self, index: usize) -> Result<Option<RawGrid>> {
        let mut largest: Option<RawGrid> = None;
        for table in self.extract_tables(index)? {
            if largest.as_ref().map_or(true, |l| table.len() > l.len()) {
                largest = Some(table);
            }
        }
        Ok(largest)
    }

    fn extract_tables(&self, index: usize) -> Result<Vec<RawGrid>> {
        let tables = group_tables(&self.lines(index)?);
        debug!(page = index + 1, tables = tables.len(), "rebuilt tables");
        Ok(tables)
    }

    fn creation_date(&self) -> Option<String> {
        let info = match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.doc.get_dictionary(*id).ok()?,
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        match info.get(b"CreationDate").ok()? {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::macro_view::extract_macro_view;
    use lopdf::{dictionary, Stream};

    /// One content stream per page.
    fn make_report(pages: &[String]) -> anyhow::Result<Vec<u8>> {
        let mut doc = Document::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for content in pages {
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.clone().into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "CreationDate" => Object::string_literal("D:20240123153000+05'00'"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }

    /// Each row in its own text object, cells moved into place with `Td`.
    fn positioned_rows(top: i64, rows: &[&[&str]]) -> String {
        let mut content = String::new();
        for (i, row) in rows.iter().enumerate() {
            content.push_str(&format!("BT /F1 10 Tf 40 {} Td", top - 14 * i as i64));
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    content.push_str(" 120 0 Td");
                }
                content.push_str(&format!(" ({cell}) Tj"));
            }
            content.push_str(" ET\n");
        }
        content
    }

    #[test]
    fn reads_pages_text_and_metadata() -> anyhow::Result<()> {
        let bytes = make_report(&[
            positioned_rows(760, &[&["DAILY QUOTATIONS"]]),
            positioned_rows(
                760,
                &[
                    &["SECTION 5: BOARD MEETINGS"],
                    &["Symbol", "Date", "Time"],
                    &["HBL", "23-Jan-2024", "10:30"],
                ],
            ),
        ])?;
        let report = PdfReport::from_bytes(&bytes)?;
        assert_eq!(report.page_count(), 2);
        assert!(report.page_text(1)?.contains("SECTION 5: BOARD MEETINGS"));
        assert!(!report.page_text(0)?.contains("SECTION 5"));
        assert_eq!(
            report.creation_date().as_deref(),
            Some("D:20240123153000+05'00'")
        );
        assert!(report.page_text(2).is_err());
        Ok(())
    }

    #[test]
    fn rebuilds_cells_placed_with_td() -> anyhow::Result<()> {
        let rows: &[&[&str]] = &[
            &["Listed Companies", "530", "Nos.", "10"],
            &["Turnover", "300", "Shares", "50"],
        ];
        let bytes = make_report(&[positioned_rows(700, rows)])?;
        let report = PdfReport::from_bytes(&bytes)?;
        let table = report.extract_table(0)?.expect("a table");
        assert_eq!(table, crate::report::fake::grid(rows));
        Ok(())
    }

    #[test]
    fn one_text_object_for_the_whole_table() -> anyhow::Result<()> {
        let content = "BT /F1 10 Tf 40 700 Td (Listed Companies) Tj 200 0 Td (530) Tj \
                       100 0 Td (Nos.) Tj 100 0 Td (10) Tj \
                       -400 -14 Td (Turnover) Tj 200 0 Td (300) Tj \
                       100 0 Td (Shares) Tj 100 0 Td (50) Tj ET"
            .to_string();
        let report = PdfReport::from_bytes(&make_report(&[content])?)?;
        let tables = report.extract_tables(0)?;
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            crate::report::fake::grid(&[
                &["Listed Companies", "530", "Nos.", "10"],
                &["Turnover", "300", "Shares", "50"],
            ])
        );
        Ok(())
    }

    #[test]
    fn vertical_gap_separates_tables() -> anyhow::Result<()> {
        let mut content = positioned_rows(740, &[&["Code", "Name"], &["0801", "AUTOMOBILE"]]);
        content.push_str(&positioned_rows(600, &[&["A", "1"], &["B", "2"], &["C", "3"]]));
        let report = PdfReport::from_bytes(&make_report(&[content])?)?;
        let tables = report.extract_tables(0)?;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][1][0].as_deref(), Some("0801"));
        // the largest one is the page's main table
        assert_eq!(report.extract_table(0)?.map(|t| t.len()), Some(3));
        Ok(())
    }

    #[test]
    fn macro_view_from_positioned_page() -> anyhow::Result<()> {
        let bytes = make_report(&[
            positioned_rows(760, &[&["DAILY QUOTATIONS"]]),
            positioned_rows(760, &[&[crate::report::Section::MacroView.header()]]),
            positioned_rows(
                700,
                &[
                    &["Listed Companies", "530", "Nos.", "10"],
                    &["Turnover", "300,450", "Shares", "50"],
                ],
            ),
        ])?;
        let report = PdfReport::from_bytes(&bytes)?;
        let t = extract_macro_view(&report, &[3], "1")?;
        assert_eq!(t.len(), 2);
        assert_eq!(
            t.rows[0],
            crate::table::row_of(&["Main Board", "1", "2024-01-23", "530", "300450"])
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_missing_resource() {
        assert!(matches!(
            PdfReport::open("/no/such/quote.pdf"),
            Err(ExtractError::MissingResource(_))
        ));
    }
}
