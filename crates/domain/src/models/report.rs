//! Report value assembled by the report builder.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::section::SectionId;
use super::ticket_metrics::{
    CategoryCount, ExecutiveSummary, MonthlyCount, OverdueTickets, PriorityCount,
    ResolutionTime, SatisfactionStats, SectorCount, StatusBreakdown, TechnicianStats,
};

/// Sentinel printed in place of a missing period bound.
pub const UNBOUNDED: &str = "unbounded";

/// Display format of the generation timestamp.
pub const GENERATED_AT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Filters applied to every metrics query of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub entity_id: Option<i64>,
    pub technician_id: Option<i64>,
}

impl ReportFilter {
    /// Human-readable description of the period.
    pub fn period(&self) -> String {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => format!("{} to {}", from, to),
            (Some(from), None) => format!("from {}", from),
            (None, Some(to)) => format!("until {}", to),
            (None, None) => "entire period".to_string(),
        }
    }
}

/// Dataset of a single section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "snake_case")]
pub enum SectionData {
    Summary(ExecutiveSummary),
    StatusBreakdown(StatusBreakdown),
    PriorityBreakdown(Vec<PriorityCount>),
    CategoryBreakdown(Vec<CategoryCount>),
    SectorBreakdown(Vec<SectorCount>),
    MonthlyTrend(Vec<MonthlyCount>),
    TechnicianRanking(Vec<TechnicianStats>),
    ResolutionTime(ResolutionTime),
    OverdueTickets(OverdueTickets),
    Satisfaction(SatisfactionStats),
}

impl SectionData {
    /// Section this dataset belongs to.
    pub fn id(&self) -> SectionId {
        match self {
            SectionData::Summary(_) => SectionId::Summary,
            SectionData::StatusBreakdown(_) => SectionId::StatusBreakdown,
            SectionData::PriorityBreakdown(_) => SectionId::PriorityBreakdown,
            SectionData::CategoryBreakdown(_) => SectionId::CategoryBreakdown,
            SectionData::SectorBreakdown(_) => SectionId::SectorBreakdown,
            SectionData::MonthlyTrend(_) => SectionId::MonthlyTrend,
            SectionData::TechnicianRanking(_) => SectionId::TechnicianRanking,
            SectionData::ResolutionTime(_) => SectionId::ResolutionTime,
            SectionData::OverdueTickets(_) => SectionId::OverdueTickets,
            SectionData::Satisfaction(_) => SectionId::Satisfaction,
        }
    }

    /// Whether the dataset holds nothing worth rendering. The summary always renders.
    pub fn is_empty(&self) -> bool {
        match self {
            SectionData::Summary(_) => false,
            SectionData::StatusBreakdown(s) => s.total_created == 0,
            SectionData::PriorityBreakdown(rows) => rows.is_empty(),
            SectionData::CategoryBreakdown(rows) => rows.is_empty(),
            SectionData::SectorBreakdown(rows) => rows.is_empty(),
            SectionData::MonthlyTrend(rows) => rows.is_empty(),
            SectionData::TechnicianRanking(rows) => rows.is_empty(),
            SectionData::ResolutionTime(r) => r.total_resolved == 0,
            SectionData::OverdueTickets(o) => o.total == 0 && o.tickets.is_empty(),
            SectionData::Satisfaction(s) => s.total_ratings == 0,
        }
    }
}

/// A section of the report together with its dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub data: SectionData,
}

impl Section {
    pub fn new(data: SectionData) -> Self {
        Self {
            id: data.id(),
            data,
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }
}

/// Descriptive header of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub title: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub entity_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub sections: Vec<SectionId>,
    pub section_count: usize,
}

impl ReportMetadata {
    /// Start date as `YYYY-MM-DD`, or the unbounded sentinel.
    pub fn date_from_label(&self) -> String {
        date_label(self.date_from)
    }

    /// End date as `YYYY-MM-DD`, or the unbounded sentinel.
    pub fn date_to_label(&self) -> String {
        date_label(self.date_to)
    }

    /// Generation timestamp as printed in documents.
    pub fn generated_at_label(&self) -> String {
        self.generated_at.format(GENERATED_AT_FORMAT).to_string()
    }

    /// Entity filter as printed in documents.
    pub fn entity_label(&self) -> String {
        filter_label(self.entity_id)
    }

    /// Technician filter as printed in documents.
    pub fn technician_label(&self) -> String {
        filter_label(self.technician_id)
    }
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| UNBOUNDED.to_string(), |d| d.to_string())
}

fn filter_label(id: Option<i64>) -> String {
    id.map_or_else(|| "All".to_string(), |id| id.to_string())
}

/// Immutable assembled report: metadata plus ordered sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    metadata: ReportMetadata,
    sections: Vec<Section>,
}

impl Report {
    /// Assembles a report. Section ids in the metadata follow `sections`.
    pub fn new(
        title: impl Into<String>,
        filter: ReportFilter,
        generated_at: DateTime<Utc>,
        sections: Vec<Section>,
    ) -> Self {
        let ids: Vec<SectionId> = sections.iter().map(|s| s.id).collect();
        let metadata = ReportMetadata {
            title: title.into(),
            date_from: filter.date_from,
            date_to: filter.date_to,
            period: filter.period(),
            generated_at,
            entity_id: filter.entity_id,
            technician_id: filter.technician_id,
            section_count: ids.len(),
            sections: ids,
        };
        Self { metadata, sections }
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    /// Sections in report order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Looks up the dataset of a section, if included.
    pub fn get(&self, id: SectionId) -> Option<&SectionData> {
        self.sections.iter().find(|s| s.id == id).map(|s| &s.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_period_strings() {
        let mut filter = ReportFilter {
            date_from: Some(date("2024-01-01")),
            date_to: Some(date("2024-01-31")),
            ..Default::default()
        };
        assert_eq!(filter.period(), "2024-01-01 to 2024-01-31");

        filter.date_to = None;
        assert_eq!(filter.period(), "from 2024-01-01");

        filter.date_from = None;
        filter.date_to = Some(date("2024-03-15"));
        assert_eq!(filter.period(), "until 2024-03-15");

        filter.date_to = None;
        assert_eq!(filter.period(), "entire period");
    }

    #[test]
    fn test_section_data_emptiness() {
        assert!(SectionData::PriorityBreakdown(vec![]).is_empty());
        assert!(SectionData::ResolutionTime(ResolutionTime::empty()).is_empty());
        assert!(SectionData::Satisfaction(SatisfactionStats::default()).is_empty());
        assert!(SectionData::OverdueTickets(OverdueTickets::default()).is_empty());

        let overdue = OverdueTickets {
            total: 1,
            tickets: vec![],
        };
        assert!(!SectionData::OverdueTickets(overdue).is_empty());

        let rows = vec![CategoryCount {
            category: "Network".into(),
            total: 3,
        }];
        assert!(!SectionData::CategoryBreakdown(rows).is_empty());
    }

    #[test]
    fn test_summary_without_created_tickets_still_renders() {
        assert!(!SectionData::Summary(ExecutiveSummary::default()).is_empty());

        let backlog_only = ExecutiveSummary {
            total_created: 0,
            total_overdue: 7,
            ..ExecutiveSummary::default()
        };
        assert!(!SectionData::Summary(backlog_only).is_empty());
    }

    #[test]
    fn test_report_metadata_follows_sections() {
        let generated_at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 5).unwrap();
        let report = Report::new(
            "Ticket Report",
            ReportFilter {
                date_from: Some(date("2024-01-01")),
                date_to: None,
                entity_id: Some(4),
                technician_id: None,
            },
            generated_at,
            vec![
                Section::new(SectionData::Satisfaction(SatisfactionStats::default())),
                Section::new(SectionData::MonthlyTrend(vec![])),
            ],
        );

        let meta = report.metadata();
        assert_eq!(
            meta.sections,
            vec![SectionId::Satisfaction, SectionId::MonthlyTrend]
        );
        assert_eq!(meta.section_count, 2);
        assert_eq!(meta.period, "from 2024-01-01");
        assert_eq!(meta.date_to_label(), UNBOUNDED);
        assert_eq!(meta.generated_at_label(), "01/02/2024 09:30:05");
        assert_eq!(meta.entity_label(), "4");
        assert_eq!(meta.technician_label(), "All");
        assert!(report.get(SectionId::MonthlyTrend).is_some());
        assert!(report.get(SectionId::Summary).is_none());
    }
}
