//! Zipped CSV bundle renderer.
//!
//! One `;`-delimited, BOM-prefixed UTF-8 file per section plus a metadata
//! file. Text fields never contain the delimiter or a line break, so every
//! data row has as many fields as its header row.

use std::io::{Cursor, Seek, Write};

use chrono::{Datelike, Timelike};
use domain::models::{Report, ReportMetadata, SectionId};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::RenderError;
use crate::layout::{metadata_layout, section_layout, Cell, Layout, Table};

pub const BOM: &str = "\u{feff}";
pub const DELIMITER: char = ';';
pub const METADATA_FILE: &str = "00_metadata.csv";

/// Bundle entry name of a section.
pub fn section_file_name(id: SectionId) -> &'static str {
    match id {
        SectionId::Summary => "01_summary.csv",
        SectionId::StatusBreakdown => "02_chamados_status.csv",
        SectionId::PriorityBreakdown => "03_chamados_prioridade.csv",
        SectionId::CategoryBreakdown => "04_chamados_categoria.csv",
        SectionId::SectorBreakdown => "05_chamados_setores.csv",
        SectionId::MonthlyTrend => "06_tendencia_mensal.csv",
        SectionId::TechnicianRanking => "07_indicadores_tecnicos.csv",
        SectionId::ResolutionTime => "08_tempo_resolucao.csv",
        SectionId::OverdueTickets => "09_chamados_atrasados.csv",
        SectionId::Satisfaction => "10_satisfaction.csv",
    }
}

/// Replaces the delimiter with a comma and line breaks with spaces.
pub fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            DELIMITER => ',',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

fn field(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => sanitize_field(s),
        other => other.display(),
    }
}

fn write_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let row: Vec<String> = fields.collect();
    out.push_str(&row.join(&DELIMITER.to_string()));
    out.push('\n');
}

/// Serializes a layout as one CSV document.
pub fn layout_to_csv(layout: &Layout) -> String {
    let mut out = String::from(BOM);
    out.push_str(&sanitize_field(&layout.title));
    out.push_str("\n\n");

    for (i, table) in layout.tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_row(&mut out, table.header.iter().map(|h| sanitize_field(h)));
        for row in &table.rows {
            write_row(&mut out, row.iter().map(field));
        }
    }
    out
}

fn section_index(metadata: &ReportMetadata) -> Table {
    let mut index = Table::new(["Section", "File"]);
    for id in &metadata.sections {
        index.pair(id.display_name(), section_file_name(*id));
    }
    index
}

/// Archive entry timestamp taken from the report's generation time.
pub(crate) fn entry_time(metadata: &ReportMetadata) -> zip::DateTime {
    let at = metadata.generated_at;
    zip::DateTime::from_date_and_time(
        u16::try_from(at.year()).unwrap_or(1980),
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .unwrap_or_default()
}

/// Renders reports as zipped CSV bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl CsvRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Entry names and contents, in bundle order.
    pub fn entries(&self, report: &Report) -> Vec<(&'static str, String)> {
        let metadata = report.metadata();
        let mut entries = Vec::with_capacity(report.sections().len() + 1);
        entries.push((
            METADATA_FILE,
            layout_to_csv(&metadata_layout(metadata, Some(section_index(metadata)))),
        ));
        for section in report.sections() {
            entries.push((
                section_file_name(section.id),
                layout_to_csv(&section_layout(&section.data)),
            ));
        }
        entries
    }

    /// Renders the bundle into memory.
    pub fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let cursor = self.render_to(report, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    /// Renders the bundle into `writer`, returning it once the archive is complete.
    pub fn render_to<W: Write + Seek>(&self, report: &Report, writer: W) -> Result<W, RenderError> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(entry_time(report.metadata()));

        let mut zip = ZipWriter::new(writer);
        for (name, content) in self.entries(report) {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }
        let writer = zip.finish()?;

        debug!(sections = report.sections().len(), "CSV bundle rendered");
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_report, report_with, sample_report, sample_sections};
    use fake::faker::name::en::Name;
    use fake::Fake;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_entries(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = String::new();
                file.read_to_string(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    fn assert_delimiter_consistent(content: &str) {
        let body = content.strip_prefix(BOM).expect("missing BOM");
        let mut lines = body.lines();
        lines.next();
        assert_eq!(lines.next(), Some(""));

        let mut expected: Option<usize> = None;
        for line in lines {
            if line.is_empty() {
                expected = None;
                continue;
            }
            let count = line.matches(DELIMITER).count();
            match expected {
                None => expected = Some(count),
                Some(n) => assert_eq!(count, n, "line {:?}", line),
            }
        }
    }

    #[test]
    fn test_bundle_contains_requested_sections_only() {
        let sections = sample_sections().into_iter().take(2).collect();
        let bytes = CsvRenderer::new().render(&report_with(sections)).unwrap();

        let names: Vec<String> = read_entries(bytes).into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["00_metadata.csv", "01_summary.csv", "02_chamados_status.csv"]
        );
    }

    #[test]
    fn test_every_entry_is_delimiter_consistent() {
        let bytes = CsvRenderer::new().render(&sample_report()).unwrap();
        let entries = read_entries(bytes);
        assert_eq!(entries.len(), 11);
        for (_, content) in &entries {
            assert_delimiter_consistent(content);
        }
    }

    #[test]
    fn test_empty_sections_still_render_headers() {
        let bytes = CsvRenderer::new().render(&empty_report()).unwrap();
        for (_, content) in read_entries(bytes) {
            assert_delimiter_consistent(&content);
        }
    }

    #[test]
    fn test_summary_entry_content() {
        let entries = CsvRenderer::new().entries(&sample_report());
        let (name, summary) = &entries[1];
        assert_eq!(*name, "01_summary.csv");
        assert!(summary.starts_with("\u{feff}EXECUTIVE SUMMARY\n\nMetric;Value\n"));
        assert!(summary.contains("Tickets created;42\n"));
        assert!(summary.contains("Average resolution time;1d 3h\n"));
        assert!(summary.contains("Average satisfaction (%);84\n"));
    }

    #[test]
    fn test_free_text_delimiters_are_replaced() {
        let entries = CsvRenderer::new().entries(&sample_report());
        let category = &entries[4].1;
        assert!(category.contains("Hardware, Printers;11\n"));
        let technicians = &entries[7].1;
        assert!(technicians.contains("Souza, Ana;18;15;3;83.3\n"));
    }

    #[test]
    fn test_generated_names_keep_alignment() {
        for _ in 0..20 {
            let name: String = Name().fake();
            let line = format!("{};{}", sanitize_field(&format!("{};x\ny", name)), 1);
            assert_eq!(line.matches(DELIMITER).count(), 1);
        }
    }

    #[test]
    fn test_metadata_lists_sections_and_files() {
        let entries = CsvRenderer::new().entries(&sample_report());
        let (name, metadata) = &entries[0];
        assert_eq!(*name, METADATA_FILE);
        assert!(metadata.contains("Field;Value\n"));
        assert!(metadata.contains("Period;2024-01-01 to 2024-01-31\n"));
        assert!(metadata.contains("Generated at;01/02/2024 09:30:05\n"));
        assert!(metadata.contains("Section;File\n"));
        assert!(metadata.contains("Overdue Tickets (SLA);09_chamados_atrasados.csv\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = sample_report();
        let a = CsvRenderer::new().render(&report).unwrap();
        let b = CsvRenderer::new().render(&report).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.zip");
        let file = std::fs::File::create(&path).unwrap();

        CsvRenderer::new().render_to(&sample_report(), file).unwrap();

        let archive = ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 11);
    }
}
