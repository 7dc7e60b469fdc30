//! HTML templates for the PDF document.

use std::fmt::Write;

use domain::models::{ExecutiveSummary, SectionData, SectionId};

use crate::layout::{section_layout, Table};

/// Placeholder rendered in place of an empty dataset.
pub const NO_DATA: &str = "No data available for this period";

/// Background of section title bars.
pub const TITLE_BAR_COLOR: &str = "rgb(52, 152, 219)";

/// Alternating body row backgrounds.
pub const ZEBRA_COLORS: [&str; 2] = ["#f0f0f0", "#ffffff"];

/// Heading of the index page.
pub const INDEX_TITLE: &str = "INDEX";

const STYLESHEET: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; font-size: 10pt; color: #222; margin: 0; }
h1.index-title { font-size: 14pt; margin: 0 0 12px 0; }
table.index { width: 100%; border-collapse: collapse; font-size: 11pt; }
table.index td { padding: 4px 0; }
table.index td.page { text-align: right; }
.section { page-break-before: always; }
.section-title { color: #fff; font-size: 13pt; font-weight: bold; padding: 6px 10px; margin: 0 0 10px 0; }
table.data { width: 100%; border-collapse: collapse; margin-bottom: 12px; }
table.data th { color: #fff; font-weight: bold; text-align: left; padding: 5px 8px; }
table.data td { padding: 4px 8px; }
table.data td.num { text-align: right; }
.cards { width: 100%; border-collapse: separate; border-spacing: 8px; }
.card { border: 2px solid; padding: 8px; text-align: center; width: 25%; }
.card .value { font-size: 16pt; font-weight: bold; }
.card .label { font-size: 8pt; color: #555; }
p.no-data { color: #777; font-style: italic; padding: 8px; }
"#;

/// Escapes text for interpolation into HTML content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Table header colour of each section.
pub fn section_color(id: SectionId) -> &'static str {
    match id {
        SectionId::Summary => "#4CAF50",
        SectionId::StatusBreakdown => "#2196F3",
        SectionId::PriorityBreakdown => "#FF9800",
        SectionId::CategoryBreakdown => "#9C27B0",
        SectionId::SectorBreakdown => "#607D8B",
        SectionId::MonthlyTrend => "#00BCD4",
        SectionId::TechnicianRanking => "#3F51B5",
        SectionId::ResolutionTime => "#009688",
        SectionId::OverdueTickets => "#F44336",
        SectionId::Satisfaction => "#FFC107",
    }
}

/// One line of the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: &'static str,
    pub page: usize,
}

/// The index page listing every section with its page number.
pub fn index_page(entries: &[IndexEntry]) -> String {
    let mut html = String::new();
    let _ = write!(html, r#"<div class="index"><h1 class="index-title">{}</h1>"#, INDEX_TITLE);
    html.push_str(r#"<table class="index">"#);
    for entry in entries {
        let _ = write!(
            html,
            r#"<tr><td class="name">{}</td><td class="page">{}</td></tr>"#,
            escape_html(entry.name),
            entry.page
        );
    }
    html.push_str("</table></div>");
    html
}

/// A section on its own page: title bar, then its template or the placeholder.
pub fn section_page(data: &SectionData) -> String {
    let id = data.id();
    let layout = section_layout(data);

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="section" id="section-{}"><h2 class="section-title" style="background-color: {};">{}</h2>"#,
        id.as_str(),
        TITLE_BAR_COLOR,
        escape_html(&layout.title)
    );

    if data.is_empty() {
        let _ = write!(html, r#"<p class="no-data">{}</p>"#, NO_DATA);
    } else if let SectionData::Summary(summary) = data {
        html.push_str(&summary_cards(summary, section_color(id)));
    } else {
        for table in &layout.tables {
            html.push_str(&data_table(table, section_color(id)));
        }
    }

    html.push_str("</div>");
    html
}

fn summary_cards(summary: &ExecutiveSummary, color: &str) -> String {
    let cards = [
        ("Tickets created", summary.total_created.to_string()),
        ("Open tickets", summary.total_open.to_string()),
        ("Resolved tickets", summary.total_resolved.to_string()),
        ("Closed tickets", summary.total_closed.to_string()),
        ("Average resolution time", summary.average_resolution.clone()),
        ("Average satisfaction", format!("{} / 5", summary.satisfaction_stars)),
        ("Satisfaction", format!("{}%", summary.satisfaction_percent)),
        ("Overdue tickets", summary.total_overdue.to_string()),
    ];

    let mut html = String::from(r#"<table class="cards">"#);
    for row in cards.chunks(4) {
        html.push_str("<tr>");
        for (label, value) in row {
            let _ = write!(
                html,
                r#"<td class="card" style="border-color: {};"><div class="value">{}</div><div class="label">{}</div></td>"#,
                color,
                escape_html(value),
                escape_html(label)
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn data_table(table: &Table, color: &str) -> String {
    let mut html = String::from(r#"<table class="data"><thead>"#);
    let _ = write!(html, r#"<tr style="background-color: {};">"#, color);
    for header in &table.header {
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr></thead><tbody>");

    for (i, row) in table.rows.iter().enumerate() {
        let _ = write!(
            html,
            r#"<tr style="background-color: {};">"#,
            ZEBRA_COLORS[i % ZEBRA_COLORS.len()]
        );
        for cell in row {
            let class = if cell.is_numeric() { r#" class="num""# } else { "" };
            let _ = write!(html, "<td{}>{}</td>", class, escape_html(&cell.display()));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

/// Running header: optional logo, title and period.
pub fn header_html(title: &str, period: &str, logo: Option<&str>) -> String {
    let logo = logo
        .map(|uri| {
            format!(
                r#"<img src="{}" style="position: absolute; left: 15mm; top: 8mm; height: 14mm;" alt="">"#,
                escape_html(uri)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><head><style>body {{ font-family: Helvetica, Arial, sans-serif; width: 100%; margin: 0 15mm; }}</style></head><body>{}<div style="text-align: center; border-bottom: 1px solid #333; padding-bottom: 4px;"><div style="font-size: 16px; font-weight: bold;">{}</div><div style="font-size: 10px;">Period: {}</div></div></body></html>"#,
        logo,
        escape_html(title),
        escape_html(period)
    )
}

/// Running footer: page counter and generation timestamp.
pub fn footer_html(generated_at: &str) -> String {
    format!(
        r#"<html><head><style>body {{ font-family: Helvetica, Arial, sans-serif; width: 100%; margin: 0 15mm; }}</style></head><body><div style="text-align: center; font-size: 8px; font-style: italic; border-top: 1px solid #999; padding-top: 4px;">Page <span class="pageNumber"></span> of <span class="totalPages"></span> - Generated at {}</div></body></html>"#,
        escape_html(generated_at)
    )
}

/// Full body document: index page followed by every section page.
pub fn document_html(title: &str, index: &[IndexEntry], sections: &[String]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>{}</title><style>{}</style></head><body>"#,
        escape_html(title),
        STYLESHEET
    );
    html.push_str(&index_page(index));
    for section in sections {
        html.push_str(section);
    }
    html.push_str("</body></html>");
    html
}
