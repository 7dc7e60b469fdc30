//! Database entity definitions.
//!
//! Entities are direct mappings to aggregate query rows.

pub mod ticket_metrics;

pub use ticket_metrics::{
    FilterOptionRow, MonthlyCountRow, NamedCountRow, OverdueTicketRow, PriorityCountRow,
    ResolutionTimeRow, SatisfactionRow, StatusCountsRow, TechnicianStatsRow,
};
