//! Structural checks run before a package is written.

use std::collections::HashSet;

use super::cell::first_illegal_char;
use super::package::{CellValue, Package, Stylesheet, CT_WORKSHEET, REL_WORKSHEET};
use super::sheet_name::is_valid_sheet_name;
use crate::error::RenderError;

fn invalid(message: impl Into<String>) -> RenderError {
    RenderError::InvalidPackage(message.into())
}

/// Verifies the part graph and every cell of every worksheet.
pub fn validate(package: &Package) -> Result<(), RenderError> {
    check_relationship_ids(package)?;
    check_sheet_links(package)?;
    check_content_types(package)?;
    check_sheet_names(package)?;
    for part in &package.worksheets {
        check_cells(&part.name, part)?;
    }
    Ok(())
}

fn check_relationship_ids(package: &Package) -> Result<(), RenderError> {
    for rels in [&package.root_rels, &package.workbook_rels] {
        let mut seen = HashSet::new();
        for rel in &rels.items {
            if !seen.insert(rel.id.as_str()) {
                return Err(invalid(format!(
                    "duplicate relationship id {} in {}",
                    rel.id, rels.path
                )));
            }
        }
    }
    Ok(())
}

fn check_sheet_links(package: &Package) -> Result<(), RenderError> {
    let written: HashSet<&str> = package.worksheets.iter().map(|w| w.path.as_str()).collect();

    if package.workbook.sheets.len() != package.worksheets.len() {
        return Err(invalid(format!(
            "workbook lists {} sheets but {} worksheet parts exist",
            package.workbook.sheets.len(),
            package.worksheets.len()
        )));
    }

    let mut sheet_ids = HashSet::new();
    for sheet in &package.workbook.sheets {
        if !sheet_ids.insert(sheet.sheet_id) {
            return Err(invalid(format!("duplicate sheetId {}", sheet.sheet_id)));
        }
        let rel = package
            .workbook_rels
            .get(&sheet.rel_id)
            .ok_or_else(|| {
                invalid(format!("sheet '{}' has dangling {}", sheet.name, sheet.rel_id))
            })?;
        if rel.rel_type != REL_WORKSHEET {
            return Err(invalid(format!(
                "{} of sheet '{}' is not a worksheet relationship",
                sheet.rel_id, sheet.name
            )));
        }
        let target = package.workbook_rels.resolve(rel);
        if !written.contains(target.as_str()) {
            return Err(invalid(format!(
                "{} targets {} which is not written",
                sheet.rel_id, target
            )));
        }
    }
    Ok(())
}

fn check_content_types(package: &Package) -> Result<(), RenderError> {
    let declared: Vec<&str> = package
        .content_types
        .overrides
        .iter()
        .filter(|o| o.content_type == CT_WORKSHEET)
        .map(|o| o.part_name.trim_start_matches('/'))
        .collect();
    let declared_set: HashSet<&str> = declared.iter().copied().collect();
    let written: HashSet<&str> = package.worksheets.iter().map(|w| w.path.as_str()).collect();

    if declared.len() != declared_set.len() || declared_set != written {
        return Err(invalid(
            "worksheet content-type overrides do not match worksheet parts",
        ));
    }
    Ok(())
}

fn check_sheet_names(package: &Package) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for sheet in &package.workbook.sheets {
        if !is_valid_sheet_name(&sheet.name) {
            return Err(invalid(format!("invalid sheet name '{}'", sheet.name)));
        }
        if !seen.insert(sheet.name.to_lowercase()) {
            return Err(invalid(format!("duplicate sheet name '{}'", sheet.name)));
        }
    }
    Ok(())
}

fn check_cells(sheet: &str, part: &super::package::WorksheetPart) -> Result<(), RenderError> {
    for row in &part.sheet.rows {
        for cell in &row.cells {
            if cell.style as usize >= Stylesheet::CELL_FORMATS {
                return Err(cell_error(sheet, &cell.reference, "unknown style"));
            }
            match &cell.value {
                CellValue::Number(n) if !n.is_finite() => {
                    return Err(cell_error(sheet, &cell.reference, "non-finite number"));
                }
                CellValue::Text(s) => {
                    if let Some(c) = first_illegal_char(s) {
                        return Err(cell_error(
                            sheet,
                            &cell.reference,
                            &format!("character U+{:04X} is not allowed in XML", c as u32),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn cell_error(sheet: &str, reference: &str, reason: &str) -> RenderError {
    RenderError::InvalidCell {
        sheet: sheet.to_string(),
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
