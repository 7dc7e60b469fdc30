//! Fixed reports shared by renderer tests.

use chrono::{NaiveDate, TimeZone, Utc};
use domain::models::{
    CategoryCount, ExecutiveSummary, MonthlyCount, OverdueTicket, OverdueTickets, PriorityCount,
    Report, ReportFilter, ResolutionTime, SatisfactionStats, Section, SectionData, SectorCount,
    StatusBreakdown, TechnicianStats,
};

pub fn january() -> ReportFilter {
    ReportFilter {
        date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
        date_to: NaiveDate::from_ymd_opt(2024, 1, 31),
        entity_id: None,
        technician_id: None,
    }
}

/// Every section with realistic data, including text that needs escaping.
pub fn sample_sections() -> Vec<Section> {
    let status = StatusBreakdown {
        total_created: 42,
        new: 6,
        assigned: 5,
        planned: 1,
        pending: 3,
        resolved: 17,
        closed: 10,
        total_open: 12,
    };
    let resolution = ResolutionTime::new(26.5, 0.0, 140.0, 27);
    let satisfaction = SatisfactionStats::from_average(Some(4.2), 14);
    let overdue = OverdueTickets {
        total: 2,
        tickets: vec![
            OverdueTicket::new(1031, "Printer offline; 3rd floor"),
            OverdueTicket::new(1044, "VPN drops <every> 5 minutes & more"),
        ],
    };

    vec![
        Section::new(SectionData::Summary(ExecutiveSummary::compose(
            &status,
            &resolution,
            &satisfaction,
            &overdue,
        ))),
        Section::new(SectionData::StatusBreakdown(status)),
        Section::new(SectionData::PriorityBreakdown(vec![
            PriorityCount {
                priority: 5,
                name: "Very High".into(),
                total: 4,
            },
            PriorityCount {
                priority: 3,
                name: "Medium".into(),
                total: 20,
            },
        ])),
        Section::new(SectionData::CategoryBreakdown(vec![
            CategoryCount {
                category: "Hardware; Printers".into(),
                total: 11,
            },
            CategoryCount {
                category: "No category".into(),
                total: 4,
            },
        ])),
        Section::new(SectionData::SectorBreakdown(vec![SectorCount {
            sector: "Root entity > Finance".into(),
            total: 21,
        }])),
        Section::new(SectionData::MonthlyTrend(vec![
            MonthlyCount {
                month: "2024-01".into(),
                label: "01/2024".into(),
                total: 42,
            },
        ])),
        Section::new(SectionData::TechnicianRanking(vec![TechnicianStats {
            technician: "Souza; Ana".into(),
            total_tickets: 18,
            closed: 15,
            open: 3,
            resolution_rate: 83.3,
        }])),
        Section::new(SectionData::ResolutionTime(resolution)),
        Section::new(SectionData::OverdueTickets(overdue)),
        Section::new(SectionData::Satisfaction(satisfaction)),
    ]
}

pub fn report_with(sections: Vec<Section>) -> Report {
    let generated_at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 5).unwrap();
    Report::new("Ticket Report", january(), generated_at, sections)
}

/// A report with every section populated.
pub fn sample_report() -> Report {
    report_with(sample_sections())
}

/// A report with every section present and empty.
pub fn empty_report() -> Report {
    report_with(vec![
        Section::new(SectionData::Summary(ExecutiveSummary::default())),
        Section::new(SectionData::StatusBreakdown(StatusBreakdown::default())),
        Section::new(SectionData::PriorityBreakdown(vec![])),
        Section::new(SectionData::CategoryBreakdown(vec![])),
        Section::new(SectionData::SectorBreakdown(vec![])),
        Section::new(SectionData::MonthlyTrend(vec![])),
        Section::new(SectionData::TechnicianRanking(vec![])),
        Section::new(SectionData::ResolutionTime(ResolutionTime::empty())),
        Section::new(SectionData::OverdueTickets(OverdueTickets::default())),
        Section::new(SectionData::Satisfaction(SatisfactionStats::default())),
    ])
}
