//! Domain models for ticket reports.

pub mod report;
pub mod section;
pub mod ticket_metrics;

pub use report::{Report, ReportFilter, ReportMetadata, Section, SectionData};
pub use section::{SectionId, SectionInfo};
pub use ticket_metrics::{
    format_hours, CategoryCount, ExecutiveSummary, FilterOption, FilterOptions, MonthlyCount,
    OverdueTicket, OverdueTickets, PriorityCount, ResolutionTime, SatisfactionStats,
    SectorCount, StatusBreakdown, TechnicianStats,
};
