//! Report section catalogue.
//!
//! Every slice of a report is identified by a [`SectionId`]. The set is closed:
//! fetch, CSV, spreadsheet and document rules all match on it exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an independently fetchable and renderable report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Summary,
    StatusBreakdown,
    PriorityBreakdown,
    CategoryBreakdown,
    SectorBreakdown,
    MonthlyTrend,
    TechnicianRanking,
    ResolutionTime,
    OverdueTickets,
    Satisfaction,
}

impl SectionId {
    /// All sections in canonical order.
    pub const ALL: [SectionId; 10] = [
        SectionId::Summary,
        SectionId::StatusBreakdown,
        SectionId::PriorityBreakdown,
        SectionId::CategoryBreakdown,
        SectionId::SectorBreakdown,
        SectionId::MonthlyTrend,
        SectionId::TechnicianRanking,
        SectionId::ResolutionTime,
        SectionId::OverdueTickets,
        SectionId::Satisfaction,
    ];

    /// Wire identifier, as accepted in the `sections` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Summary => "summary",
            SectionId::StatusBreakdown => "status_breakdown",
            SectionId::PriorityBreakdown => "priority_breakdown",
            SectionId::CategoryBreakdown => "category_breakdown",
            SectionId::SectorBreakdown => "sector_breakdown",
            SectionId::MonthlyTrend => "monthly_trend",
            SectionId::TechnicianRanking => "technician_ranking",
            SectionId::ResolutionTime => "resolution_time",
            SectionId::OverdueTickets => "overdue_tickets",
            SectionId::Satisfaction => "satisfaction",
        }
    }

    /// Human-readable name used for index entries, sheet names and headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionId::Summary => "Executive Summary",
            SectionId::StatusBreakdown => "Tickets by Status",
            SectionId::PriorityBreakdown => "Tickets by Priority",
            SectionId::CategoryBreakdown => "Tickets by Category",
            SectionId::SectorBreakdown => "Tickets by Sector/Entity",
            SectionId::MonthlyTrend => "Monthly Trend",
            SectionId::TechnicianRanking => "Technician Ranking",
            SectionId::ResolutionTime => "Resolution Time",
            SectionId::OverdueTickets => "Overdue Tickets (SLA)",
            SectionId::Satisfaction => "Satisfaction Ratings",
        }
    }

    /// 1-based position in the canonical order.
    pub fn ordinal(&self) -> usize {
        SectionId::ALL
            .iter()
            .position(|s| s == self)
            .map(|i| i + 1)
            .unwrap_or_default()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        SectionId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| format!("Unknown report section: {}", s))
    }
}

/// Catalogue entry returned to clients that build export forms.
#[derive(Debug, Clone, Serialize)]
pub struct SectionInfo {
    pub id: SectionId,
    pub name: &'static str,
}

impl SectionInfo {
    /// The full catalogue in canonical order.
    pub fn catalogue() -> Vec<SectionInfo> {
        SectionId::ALL
            .iter()
            .map(|id| SectionInfo {
                id: *id,
                name: id.display_name(),
            })
            .collect()
    }
}
