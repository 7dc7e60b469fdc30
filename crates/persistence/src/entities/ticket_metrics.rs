//! Row mappings for GLPI ticket aggregate queries.

use domain::models::{
    CategoryCount, FilterOption, MonthlyCount, OverdueTicket, PriorityCount, ResolutionTime,
    SectorCount, StatusBreakdown, TechnicianStats,
};
use domain::models::ticket_metrics::round1;
use sqlx::FromRow;

/// Ticket counts by status.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCountsRow {
    pub total_created: i64,
    pub new: i64,
    pub assigned: i64,
    pub planned: i64,
    pub pending: i64,
    pub resolved: i64,
    pub closed: i64,
    pub total_open: i64,
}

impl From<StatusCountsRow> for StatusBreakdown {
    fn from(row: StatusCountsRow) -> Self {
        StatusBreakdown {
            total_created: row.total_created,
            new: row.new,
            assigned: row.assigned,
            planned: row.planned,
            pending: row.pending,
            resolved: row.resolved,
            closed: row.closed,
            total_open: row.total_open,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PriorityCountRow {
    pub priority: i64,
    pub total: i64,
}

impl From<PriorityCountRow> for PriorityCount {
    fn from(row: PriorityCountRow) -> Self {
        let priority = i32::try_from(row.priority).unwrap_or_default();
        PriorityCount {
            priority,
            name: PriorityCount::label_for(priority).to_string(),
            total: row.total,
        }
    }
}

/// A label with a ticket count, used for categories and entities.
#[derive(Debug, Clone, FromRow)]
pub struct NamedCountRow {
    pub name: String,
    pub total: i64,
}

impl From<NamedCountRow> for CategoryCount {
    fn from(row: NamedCountRow) -> Self {
        CategoryCount {
            category: row.name,
            total: row.total,
        }
    }
}

impl From<NamedCountRow> for SectorCount {
    fn from(row: NamedCountRow) -> Self {
        SectorCount {
            sector: row.name,
            total: row.total,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthlyCountRow {
    pub month: String,
    pub label: String,
    pub total: i64,
}

impl From<MonthlyCountRow> for MonthlyCount {
    fn from(row: MonthlyCountRow) -> Self {
        MonthlyCount {
            month: row.month,
            label: row.label,
            total: row.total,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TechnicianStatsRow {
    pub technician: String,
    pub total_tickets: i64,
    pub closed: i64,
    pub open: i64,
}

impl From<TechnicianStatsRow> for TechnicianStats {
    fn from(row: TechnicianStatsRow) -> Self {
        let resolution_rate = if row.total_tickets > 0 {
            round1(row.closed as f64 / row.total_tickets as f64 * 100.0)
        } else {
            0.0
        };
        TechnicianStats {
            technician: row.technician,
            total_tickets: row.total_tickets,
            closed: row.closed,
            open: row.open,
            resolution_rate,
        }
    }
}

/// Resolution time aggregates. Averages are `NULL` when nothing was solved.
#[derive(Debug, Clone, FromRow)]
pub struct ResolutionTimeRow {
    pub average_hours: Option<f64>,
    pub min_hours: Option<i64>,
    pub max_hours: Option<i64>,
    pub total_resolved: i64,
}

impl From<ResolutionTimeRow> for ResolutionTime {
    fn from(row: ResolutionTimeRow) -> Self {
        match row.average_hours {
            Some(average) => ResolutionTime::new(
                round1(average),
                row.min_hours.unwrap_or_default() as f64,
                row.max_hours.unwrap_or_default() as f64,
                row.total_resolved,
            ),
            None => ResolutionTime::empty(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OverdueTicketRow {
    pub id: i64,
    pub name: String,
}

impl From<OverdueTicketRow> for OverdueTicket {
    fn from(row: OverdueTicketRow) -> Self {
        OverdueTicket::new(row.id, &row.name)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SatisfactionRow {
    pub average: Option<f64>,
    pub total_ratings: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct FilterOptionRow {
    pub id: i64,
    pub name: String,
}

impl From<FilterOptionRow> for FilterOption {
    fn from(row: FilterOptionRow) -> Self {
        FilterOption {
            id: row.id,
            name: row.name,
        }
    }
}
