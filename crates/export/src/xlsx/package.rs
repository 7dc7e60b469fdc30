//! Typed OOXML part graph.
//!
//! Each part knows its package path and serializes itself. The graph is built
//! by [`PackageBuilder`], which keeps relationship ids, sheet ids, part paths
//! and content-type overrides in step.

use std::fmt::Write as _;
use std::io::{Seek, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::cell::{cell_ref, escape_xml};
use super::sheet_name::SheetNames;
use crate::error::RenderError;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const NS_DOC_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";
pub const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const ROOT_RELS_PATH: &str = "_rels/.rels";
pub const WORKBOOK_PATH: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
pub const STYLES_PATH: &str = "xl/styles.xml";

/// Content-type override for one part.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    /// Absolute part name, e.g. `/xl/workbook.xml`.
    pub part_name: String,
    pub content_type: &'static str,
}

/// `[Content_Types].xml`.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    pub overrides: Vec<Override>,
}

impl ContentTypes {
    pub fn add(&mut self, path: &str, content_type: &'static str) {
        self.overrides.push(Override {
            part_name: format!("/{}", path),
            content_type,
        });
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(xml, "<Types xmlns=\"{}\">", NS_CONTENT_TYPES);
        let _ = write!(
            xml,
            "<Default Extension=\"rels\" ContentType=\"{}\"/>",
            CT_RELATIONSHIPS
        );
        let _ = write!(xml, "<Default Extension=\"xml\" ContentType=\"{}\"/>", CT_XML);
        for o in &self.overrides {
            let _ = write!(
                xml,
                "<Override PartName=\"{}\" ContentType=\"{}\"/>",
                escape_xml(&o.part_name),
                o.content_type
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    /// Target relative to the owning part's folder.
    pub target: String,
}

/// A `.rels` part.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Package path of the `.rels` part itself.
    pub path: &'static str,
    /// Folder that relative targets resolve against.
    pub base: &'static str,
    pub items: Vec<Relationship>,
}

impl Relationships {
    pub fn new(path: &'static str, base: &'static str) -> Self {
        Self {
            path,
            base,
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, id: String, rel_type: &'static str, target: String) {
        self.items.push(Relationship {
            id,
            rel_type,
            target,
        });
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Package path a relationship target points at.
    pub fn resolve(&self, rel: &Relationship) -> String {
        format!("{}{}", self.base, rel.target)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(xml, "<Relationships xmlns=\"{}\">", NS_RELATIONSHIPS);
        for r in &self.items {
            let _ = write!(
                xml,
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
                escape_xml(&r.id),
                r.rel_type,
                escape_xml(&r.target)
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// One `<sheet>` entry of the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
}

/// `xl/workbook.xml`.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetEntry>,
}

impl Workbook {
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(
            xml,
            "<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
            NS_SPREADSHEET, NS_DOC_RELATIONSHIPS
        );
        for s in &self.sheets {
            let _ = write!(
                xml,
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"{}\"/>",
                escape_xml(&s.name),
                s.sheet_id,
                escape_xml(&s.rel_id)
            );
        }
        xml.push_str("</sheets></workbook>");
        xml
    }
}

/// Cell format index into `cellXfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Default = 0,
    /// Bold on a solid fill with thin borders.
    Header = 1,
    /// Thin borders.
    Body = 2,
}

/// `xl/styles.xml`: two fonts, three fills, two borders, three cell formats.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    /// ARGB colour of the header fill.
    pub header_fill: &'static str,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            header_fill: "FF4CAF50",
        }
    }
}

impl Stylesheet {
    /// Number of entries in `cellXfs`.
    pub const CELL_FORMATS: usize = 3;

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(xml, "<styleSheet xmlns=\"{}\">", NS_SPREADSHEET);
        xml.push_str(
            "<fonts count=\"2\">\
             <font><sz val=\"11\"/><name val=\"Calibri\"/></font>\
             <font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>\
             </fonts>",
        );
        let _ = write!(
            xml,
            "<fills count=\"3\">\
             <fill><patternFill patternType=\"none\"/></fill>\
             <fill><patternFill patternType=\"gray125\"/></fill>\
             <fill><patternFill patternType=\"solid\"><fgColor rgb=\"{}\"/><bgColor indexed=\"64\"/></patternFill></fill>\
             </fills>",
            self.header_fill
        );
        xml.push_str(
            "<borders count=\"2\">\
             <border><left/><right/><top/><bottom/><diagonal/></border>\
             <border><left style=\"thin\"/><right style=\"thin\"/><top style=\"thin\"/><bottom style=\"thin\"/><diagonal/></border>\
             </borders>",
        );
        let _ = write!(
            xml,
            "<cellXfs count=\"{}\">\
             <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>\
             <xf numFmtId=\"0\" fontId=\"1\" fillId=\"2\" borderId=\"1\" applyFont=\"1\" applyFill=\"1\" applyBorder=\"1\"/>\
             <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"1\" applyBorder=\"1\"/>\
             </cellXfs>",
            Self::CELL_FORMATS
        );
        xml.push_str("</styleSheet>");
        xml
    }
}

/// Value of a worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Integer(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub reference: String,
    pub style: Style,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number.
    pub number: u32,
    pub cells: Vec<SheetCell>,
}

/// A `xl/worksheets/sheetN.xml` part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    pub rows: Vec<SheetRow>,
}

impl Worksheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row after the last one, returning its number.
    pub fn push_row(&mut self, values: Vec<(Style, CellValue)>) -> u32 {
        let number = self.rows.last().map(|r| r.number + 1).unwrap_or(1);
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(col, (style, value))| SheetCell {
                reference: cell_ref(col, number),
                style,
                value,
            })
            .collect();
        self.rows.push(SheetRow { number, cells });
        number
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        let _ = write!(xml, "<worksheet xmlns=\"{}\"><sheetData>", NS_SPREADSHEET);
        for row in &self.rows {
            let _ = write!(xml, "<row r=\"{}\">", row.number);
            for cell in &row.cells {
                let style = cell.style as u8;
                match &cell.value {
                    CellValue::Number(n) => {
                        let _ = write!(
                            xml,
                            "<c r=\"{}\" s=\"{}\"><v>{}</v></c>",
                            cell.reference, style, n
                        );
                    }
                    CellValue::Integer(n) => {
                        let _ = write!(
                            xml,
                            "<c r=\"{}\" s=\"{}\"><v>{}</v></c>",
                            cell.reference, style, n
                        );
                    }
                    CellValue::Text(s) => {
                        let _ = write!(
                            xml,
                            "<c r=\"{}\" s=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                            cell.reference,
                            style,
                            escape_xml(s)
                        );
                    }
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// A worksheet part together with its package path.
#[derive(Debug, Clone)]
pub struct WorksheetPart {
    pub path: String,
    pub name: String,
    pub sheet: Worksheet,
}

/// The complete spreadsheet package.
#[derive(Debug, Clone)]
pub struct Package {
    pub content_types: ContentTypes,
    pub root_rels: Relationships,
    pub workbook_rels: Relationships,
    pub workbook: Workbook,
    pub styles: Stylesheet,
    pub worksheets: Vec<WorksheetPart>,
}

impl Package {
    /// Every part as `(path, xml)` in archive order.
    pub fn parts(&self) -> Vec<(String, String)> {
        let mut parts = vec![
            (CONTENT_TYPES_PATH.to_string(), self.content_types.to_xml()),
            (self.root_rels.path.to_string(), self.root_rels.to_xml()),
            (WORKBOOK_PATH.to_string(), self.workbook.to_xml()),
            (self.workbook_rels.path.to_string(), self.workbook_rels.to_xml()),
            (STYLES_PATH.to_string(), self.styles.to_xml()),
        ];
        parts.extend(
            self.worksheets
                .iter()
                .map(|w| (w.path.clone(), w.sheet.to_xml())),
        );
        parts
    }

    /// Writes the package as a zip archive.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        options: FileOptions,
    ) -> Result<W, RenderError> {
        let options = options.compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);
        for (path, xml) in self.parts() {
            zip.start_file(path, options)?;
            zip.write_all(xml.as_bytes())?;
        }
        Ok(zip.finish()?)
    }
}

/// Assembles a [`Package`], one worksheet at a time.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    names: SheetNames,
    worksheets: Vec<WorksheetPart>,
    styles: Stylesheet,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a worksheet, returning the unique name it was given.
    pub fn add_sheet(&mut self, name: &str, sheet: Worksheet) -> String {
        let position = self.worksheets.len() + 1;
        let name = self.names.claim(name, position);
        self.worksheets.push(WorksheetPart {
            path: format!("xl/worksheets/sheet{}.xml", position),
            name: name.clone(),
            sheet,
        });
        name
    }

    pub fn build(self) -> Package {
        let mut content_types = ContentTypes::default();
        content_types.add(WORKBOOK_PATH, CT_WORKBOOK);
        content_types.add(STYLES_PATH, CT_STYLES);

        let mut root_rels = Relationships::new(ROOT_RELS_PATH, "");
        root_rels.add("rId1".into(), REL_OFFICE_DOCUMENT, WORKBOOK_PATH.into());

        let mut workbook_rels = Relationships::new(WORKBOOK_RELS_PATH, "xl/");
        workbook_rels.add("rId1".into(), REL_STYLES, "styles.xml".into());

        let mut workbook = Workbook::default();
        for (i, part) in self.worksheets.iter().enumerate() {
            let n = i + 1;
            let rel_id = format!("rId{}", n + 1);
            content_types.add(&part.path, CT_WORKSHEET);
            workbook_rels.add(
                rel_id.clone(),
                REL_WORKSHEET,
                format!("worksheets/sheet{}.xml", n),
            );
            workbook.sheets.push(SheetEntry {
                name: part.name.clone(),
                sheet_id: n as u32,
                rel_id,
            });
        }

        Package {
            content_types,
            root_rels,
            workbook_rels,
            workbook,
            styles: self.styles,
            worksheets: self.worksheets,
        }
    }
}
