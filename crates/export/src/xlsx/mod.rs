//! Hand-assembled OOXML spreadsheet renderer.
//!
//! The first sheet describes the report; every included section follows on
//! its own sheet, laid out exactly like its CSV counterpart.

pub mod cell;
pub mod package;
pub mod sheet_name;
pub mod validate;

use std::io::{Cursor, Seek, Write};

use domain::models::{Report, ReportMetadata};
use tracing::debug;
use zip::write::FileOptions;

use crate::csv::entry_time;
use crate::error::RenderError;
use crate::layout::{metadata_layout, section_layout, Cell, Layout, Table};
use package::{CellValue, Package, PackageBuilder, Style, Worksheet};

pub use validate::validate;

/// Name of the metadata sheet.
pub const INFORMATION_SHEET: &str = "Information";

fn cell_value(cell: &Cell) -> CellValue {
    match cell {
        Cell::Text(s) => CellValue::Text(s.clone()),
        Cell::Int(n) => CellValue::Integer(*n),
        Cell::Float(f) => CellValue::Number(*f),
    }
}

/// Converts a layout into a worksheet: title, blank row, then each table
/// with a styled header row, tables separated by a blank row.
pub fn layout_to_worksheet(layout: &Layout) -> Worksheet {
    let mut sheet = Worksheet::new();
    sheet.push_row(vec![(Style::Header, CellValue::Text(layout.title.clone()))]);
    sheet.push_row(vec![]);

    for (i, table) in layout.tables.iter().enumerate() {
        if i > 0 {
            sheet.push_row(vec![]);
        }
        sheet.push_row(
            table
                .header
                .iter()
                .map(|h| (Style::Header, CellValue::Text(h.clone())))
                .collect(),
        );
        for row in &table.rows {
            sheet.push_row(row.iter().map(|c| (Style::Body, cell_value(c))).collect());
        }
    }
    sheet
}

fn section_index(metadata: &ReportMetadata) -> Table {
    let mut index = Table::new(["#", "Section"]);
    for id in &metadata.sections {
        index.push(vec![Cell::Int(id.ordinal() as i64), Cell::text(id.display_name())]);
    }
    index
}

/// Renders reports as `.xlsx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetRenderer;

impl SpreadsheetRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Builds and validates the part graph for `report`.
    pub fn package(&self, report: &Report) -> Result<Package, RenderError> {
        let metadata = report.metadata();
        let mut builder = PackageBuilder::new();

        let info = metadata_layout(metadata, Some(section_index(metadata)));
        builder.add_sheet(INFORMATION_SHEET, layout_to_worksheet(&info));

        for section in report.sections() {
            let layout = section_layout(&section.data);
            builder.add_sheet(section.name(), layout_to_worksheet(&layout));
        }

        let package = builder.build();
        validate(&package)?;
        Ok(package)
    }

    /// Renders the package into memory.
    pub fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let cursor = self.render_to(report, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Renders the package into `writer`, returning it once the archive is complete.
    pub fn render_to<W: Write + Seek>(&self, report: &Report, writer: W) -> Result<W, RenderError> {
        let package = self.package(report)?;
        let options = FileOptions::default().last_modified_time(entry_time(report.metadata()));
        let writer = package.write_to(writer, options)?;

        debug!(sheets = package.worksheets.len(), "Spreadsheet rendered");
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_report, report_with, sample_report, sample_sections};
    use domain::models::{CategoryCount, Section, SectionData};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], path: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(path).unwrap();
        let mut xml = String::new();
        file.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_package_lists_information_then_sections() {
        let package = SpreadsheetRenderer::new().package(&sample_report()).unwrap();
        let names: Vec<&str> = package
            .workbook
            .sheets
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "Information");
        assert_eq!(names[1], "Executive Summary");
        assert_eq!(names[5], "Tickets by SectorEntity");
        assert_eq!(names[9], "Overdue Tickets (SLA)");
    }

    #[test]
    fn test_archive_contains_every_part() {
        let report = report_with(sample_sections().into_iter().take(2).collect());
        let bytes = SpreadsheetRenderer::new().render(&report).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();

        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/styles.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
                "xl/worksheets/sheet2.xml",
                "xl/worksheets/sheet3.xml",
            ]
        );
    }

    #[test]
    fn test_workbook_relationships_resolve() {
        let bytes = SpreadsheetRenderer::new().render(&sample_report()).unwrap();
        let rels = read_part(&bytes, "xl/_rels/workbook.xml.rels");
        let workbook = read_part(&bytes, "xl/workbook.xml");

        assert!(rels.contains(
            "Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\""
        ));
        for n in 1..=11 {
            assert!(rels.contains(&format!(
                "Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"",
                n + 1,
                n
            )));
            assert!(workbook.contains(&format!("sheetId=\"{}\" r:id=\"rId{}\"", n, n + 1)));
        }
    }

    #[test]
    fn test_numbers_are_typed_and_text_escaped() {
        let bytes = SpreadsheetRenderer::new().render(&sample_report()).unwrap();
        let technicians = read_part(&bytes, "xl/worksheets/sheet8.xml");
        assert!(technicians.contains("<c r=\"B4\" s=\"2\"><v>18</v></c>"));
        assert!(technicians.contains("<c r=\"E4\" s=\"2\"><v>83.3</v></c>"));

        let overdue = read_part(&bytes, "xl/worksheets/sheet10.xml");
        assert!(overdue.contains("VPN drops &lt;every&gt; 5 minutes &amp; more"));
    }

    #[test]
    fn test_empty_report_is_still_valid() {
        let bytes = SpreadsheetRenderer::new().render(&empty_report()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 16);
    }

    #[test]
    fn test_illegal_text_fails_validation() {
        let report = report_with(vec![Section::new(SectionData::CategoryBreakdown(vec![
            CategoryCount {
                category: "Broken\u{0}name".into(),
                total: 1,
            },
        ]))]);
        let err = SpreadsheetRenderer::new().render(&report).unwrap_err();
        assert!(matches!(err, RenderError::InvalidCell { .. }));
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = sample_report();
        let a = SpreadsheetRenderer::new().render(&report).unwrap();
        let b = SpreadsheetRenderer::new().render(&report).unwrap();
        assert_eq!(a, b);
    }
}
