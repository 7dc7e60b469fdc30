//! Ticket metrics datasets.
//!
//! One type per report section, as produced by the metrics source.

use serde::{Deserialize, Serialize};

/// Ticket counts by lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub total_created: i64,
    pub new: i64,
    pub assigned: i64,
    pub planned: i64,
    pub pending: i64,
    pub resolved: i64,
    pub closed: i64,
    /// New, assigned and planned tickets.
    pub total_open: i64,
}

/// Ticket count for one priority level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityCount {
    pub priority: i32,
    pub name: String,
    pub total: i64,
}

impl PriorityCount {
    /// Label for a GLPI priority level.
    pub fn label_for(priority: i32) -> &'static str {
        match priority {
            1 => "Very Low",
            2 => "Low",
            3 => "Medium",
            4 => "High",
            5 => "Very High",
            6 => "Critical",
            _ => "Undefined",
        }
    }
}

/// Ticket count for one ITIL category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub total: i64,
}

/// Ticket count for one entity (sector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCount {
    pub sector: String,
    pub total: i64,
}

/// Tickets created in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Sortable key, `YYYY-MM`.
    pub month: String,
    /// Display label, `MM/YYYY`.
    pub label: String,
    pub total: i64,
}

/// Workload and resolution figures for one technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianStats {
    pub technician: String,
    pub total_tickets: i64,
    pub closed: i64,
    pub open: i64,
    /// Share of tickets solved or closed, in percent with one decimal.
    pub resolution_rate: f64,
}

/// Resolution time statistics over solved tickets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTime {
    pub average_hours: f64,
    pub average_formatted: String,
    pub min_hours: f64,
    pub max_hours: f64,
    pub total_resolved: i64,
}

impl ResolutionTime {
    /// Builds the statistics, deriving the formatted average.
    pub fn new(average_hours: f64, min_hours: f64, max_hours: f64, total_resolved: i64) -> Self {
        Self {
            average_hours,
            average_formatted: format_hours(average_hours),
            min_hours,
            max_hours,
            total_resolved,
        }
    }

    /// Statistics for a period without solved tickets.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0)
    }
}

/// Longest ticket title kept in overdue listings.
pub const OVERDUE_TITLE_MAX_CHARS: usize = 50;

/// An open ticket past its time-to-resolve deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueTicket {
    pub id: i64,
    pub title: String,
}

impl OverdueTicket {
    /// Creates an entry, truncating the title to fifty characters.
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.chars().take(OVERDUE_TITLE_MAX_CHARS).collect(),
        }
    }
}

/// Overdue tickets: total count plus the oldest entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverdueTickets {
    pub total: i64,
    pub tickets: Vec<OverdueTicket>,
}

/// Satisfaction survey statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionStats {
    /// Average rating on the 0-5 scale, one decimal.
    pub stars: f64,
    /// Average rating as a percentage of five stars, one decimal.
    pub percent: f64,
    pub total_ratings: i64,
}

impl SatisfactionStats {
    /// Builds the statistics from the raw average rating.
    pub fn from_average(average: Option<f64>, total_ratings: i64) -> Self {
        match average {
            Some(avg) => Self {
                stars: round1(avg),
                percent: round1(avg / 5.0 * 100.0),
                total_ratings,
            },
            None => Self {
                stars: 0.0,
                percent: 0.0,
                total_ratings,
            },
        }
    }
}

/// Headline figures combining status, resolution, satisfaction and SLA data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_created: i64,
    pub total_open: i64,
    pub total_resolved: i64,
    pub total_closed: i64,
    pub average_resolution: String,
    pub satisfaction_stars: f64,
    pub satisfaction_percent: f64,
    pub total_overdue: i64,
}

impl ExecutiveSummary {
    /// Assembles the summary from its four source datasets.
    pub fn compose(
        status: &StatusBreakdown,
        resolution: &ResolutionTime,
        satisfaction: &SatisfactionStats,
        overdue: &OverdueTickets,
    ) -> Self {
        Self {
            total_created: status.total_created,
            total_open: status.total_open,
            total_resolved: status.resolved,
            total_closed: status.closed,
            average_resolution: resolution.average_formatted.clone(),
            satisfaction_stars: satisfaction.stars,
            satisfaction_percent: satisfaction.percent,
            total_overdue: overdue.total,
        }
    }
}

/// An (id, name) pair offered as an export filter choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: i64,
    pub name: String,
}

/// Filter choices for entity and technician pickers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub entities: Vec<FilterOption>,
    pub technicians: Vec<FilterOption>,
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Formats a duration in hours for humans.
///
/// Under an hour prints minutes (`45min`), under a day prints hours with one
/// decimal (`5.5h`), otherwise days and whole hours (`2d 3h`). Zero prints `0h`;
/// the day form drops the fraction so the hour part stays within 0..=23.
pub fn format_hours(hours: f64) -> String {
    if hours == 0.0 {
        "0h".to_string()
    } else if hours < 1.0 {
        format!("{}min", (hours * 60.0).round() as i64)
    } else if hours < 24.0 {
        format!("{}h", round1(hours))
    } else {
        let whole = hours as i64;
        format!("{}d {}h", whole / 24, whole % 24)
    }
}
