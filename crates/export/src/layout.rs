//! Tabular layout of report sections.
//!
//! The CSV bundle, the spreadsheet and the PDF document all render the same
//! layout, so a section has one header/value shape across every format.

use domain::models::{
    ExecutiveSummary, OverdueTickets, ReportMetadata, ResolutionTime, SatisfactionStats,
    SectionData, SectionId, StatusBreakdown,
};

/// A single value in a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Whether the value is written as a number in spreadsheets.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Plain rendering of the value.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => f.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

/// A header row followed by data rows of the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<const N: usize>(header: [&str; N]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded and long rows cut to the header width.
    pub fn push(&mut self, row: Vec<Cell>) {
        let mut row = row;
        row.resize(self.header.len(), Cell::Text(String::new()));
        self.rows.push(row);
    }

    /// Appends a `label; value` row.
    pub fn pair(&mut self, label: &str, value: impl Into<Cell>) {
        self.push(vec![Cell::text(label), value.into()]);
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }
}

/// Title and tables of one rendered block.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: String,
    pub tables: Vec<Table>,
}

/// Lays out a section dataset.
pub fn section_layout(data: &SectionData) -> Layout {
    let id = data.id();
    let tables = match data {
        SectionData::Summary(summary) => vec![summary_table(summary)],
        SectionData::StatusBreakdown(status) => vec![status_table(status)],
        SectionData::PriorityBreakdown(rows) => {
            let mut table = Table::new(["Priority", "Tickets"]);
            for row in rows {
                table.pair(&row.name, row.total);
            }
            vec![table]
        }
        SectionData::CategoryBreakdown(rows) => {
            let mut table = Table::new(["Category", "Tickets"]);
            for row in rows {
                table.pair(&row.category, row.total);
            }
            vec![table]
        }
        SectionData::SectorBreakdown(rows) => {
            let mut table = Table::new(["Sector/Entity", "Tickets"]);
            for row in rows {
                table.pair(&row.sector, row.total);
            }
            vec![table]
        }
        SectionData::MonthlyTrend(rows) => {
            let mut table = Table::new(["Month", "Tickets"]);
            for row in rows {
                table.pair(&row.label, row.total);
            }
            vec![table]
        }
        SectionData::TechnicianRanking(rows) => {
            let mut table = Table::new([
                "Technician",
                "Total tickets",
                "Closed",
                "Open",
                "Resolution rate (%)",
            ]);
            for row in rows {
                table.push(vec![
                    Cell::text(&row.technician),
                    Cell::Int(row.total_tickets),
                    Cell::Int(row.closed),
                    Cell::Int(row.open),
                    Cell::Float(row.resolution_rate),
                ]);
            }
            vec![table]
        }
        SectionData::ResolutionTime(resolution) => vec![resolution_table(resolution)],
        SectionData::OverdueTickets(overdue) => overdue_tables(overdue),
        SectionData::Satisfaction(stats) => vec![satisfaction_table(stats)],
    };

    Layout {
        title: section_title(id),
        tables,
    }
}

/// All-caps heading of a section.
pub fn section_title(id: SectionId) -> String {
    id.display_name().to_uppercase()
}

/// Lays out the report metadata, followed by `index` when given.
pub fn metadata_layout(metadata: &ReportMetadata, index: Option<Table>) -> Layout {
    let mut info = Table::new(["Field", "Value"]);
    info.pair("Period", metadata.period.as_str());
    info.pair("Start date", metadata.date_from_label());
    info.pair("End date", metadata.date_to_label());
    info.pair("Generated at", metadata.generated_at_label());
    info.pair("Included sections", metadata.section_count as i64);
    info.pair("Entity filter", metadata.entity_label());
    info.pair("Technician filter", metadata.technician_label());

    let mut tables = vec![info];
    tables.extend(index);

    Layout {
        title: metadata.title.to_uppercase(),
        tables,
    }
}

fn summary_table(summary: &ExecutiveSummary) -> Table {
    let mut table = Table::new(["Metric", "Value"]);
    table.pair("Tickets created", summary.total_created);
    table.pair("Open tickets", summary.total_open);
    table.pair("Resolved tickets", summary.total_resolved);
    table.pair("Closed tickets", summary.total_closed);
    table.pair("Average resolution time", summary.average_resolution.as_str());
    table.pair("Average satisfaction (stars)", summary.satisfaction_stars);
    table.pair("Average satisfaction (%)", summary.satisfaction_percent);
    table.pair("Overdue tickets", summary.total_overdue);
    table
}

fn status_table(status: &StatusBreakdown) -> Table {
    let mut table = Table::new(["Status", "Tickets"]);
    table.pair("Total created", status.total_created);
    table.pair("New", status.new);
    table.pair("Assigned", status.assigned);
    table.pair("Planned", status.planned);
    table.pair("Pending", status.pending);
    table.pair("Resolved", status.resolved);
    table.pair("Closed", status.closed);
    table.pair("Total open", status.total_open);
    table
}

fn resolution_table(resolution: &ResolutionTime) -> Table {
    let mut table = Table::new(["Metric", "Value"]);
    table.pair("Average time", resolution.average_formatted.as_str());
    table.pair("Minimum time (hours)", resolution.min_hours);
    table.pair("Maximum time (hours)", resolution.max_hours);
    table.pair("Resolved tickets", resolution.total_resolved);
    table
}

fn overdue_tables(overdue: &OverdueTickets) -> Vec<Table> {
    let mut totals = Table::new(["Metric", "Value"]);
    totals.pair("Overdue tickets", overdue.total);

    let mut list = Table::new(["Ticket", "Title"]);
    for ticket in &overdue.tickets {
        list.push(vec![Cell::Int(ticket.id), Cell::text(&ticket.title)]);
    }

    vec![totals, list]
}

fn satisfaction_table(stats: &SatisfactionStats) -> Table {
    let mut table = Table::new(["Metric", "Value"]);
    table.pair("Average rating (stars)", stats.stars);
    table.pair("Average rating (%)", stats.percent);
    table.pair("Total ratings", stats.total_ratings);
    table
}
