//! Metrics collaborator consumed by the report builder.

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::models::{
    CategoryCount, FilterOption, MonthlyCount, OverdueTicket, OverdueTickets, PriorityCount,
    ReportFilter, ResolutionTime, SatisfactionStats, SectorCount, StatusBreakdown,
    TechnicianStats,
};

/// Failure reported by a metrics source.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metrics query failed: {0}")]
    Query(String),

    #[error("Metrics source unavailable: {0}")]
    Unavailable(String),
}

/// Source of aggregated ticket metrics.
///
/// Every fetch honours the date bounds of the filter. The sector fetch also
/// honours the entity filter and the technician fetch the technician filter.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    async fn status_counts(&self, filter: &ReportFilter) -> Result<StatusBreakdown, MetricsError>;

    /// Counts per priority, highest priority first.
    async fn priority_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<PriorityCount>, MetricsError>;

    /// Top ten categories by ticket count.
    async fn category_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<CategoryCount>, MetricsError>;

    /// Top ten entities by ticket count.
    async fn sector_counts(&self, filter: &ReportFilter)
        -> Result<Vec<SectorCount>, MetricsError>;

    /// Tickets per month, ascending.
    async fn monthly_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<MonthlyCount>, MetricsError>;

    /// Top fifteen technicians by assigned tickets.
    async fn technician_ranking(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<TechnicianStats>, MetricsError>;

    async fn resolution_time(&self, filter: &ReportFilter)
        -> Result<ResolutionTime, MetricsError>;

    async fn overdue_tickets(&self, filter: &ReportFilter)
        -> Result<OverdueTickets, MetricsError>;

    async fn satisfaction(&self, filter: &ReportFilter) -> Result<SatisfactionStats, MetricsError>;

    /// Active entities available as filter choices.
    async fn entities(&self) -> Result<Vec<FilterOption>, MetricsError>;

    /// Active technicians available as filter choices.
    async fn technicians(&self) -> Result<Vec<FilterOption>, MetricsError>;

    /// Cheap connectivity check used by readiness probes.
    async fn ping(&self) -> Result<(), MetricsError>;
}

/// Mock metrics source returning a fixed, small dataset.
///
/// Counts every fetch so callers can assert whether the source was reached.
#[derive(Debug, Default)]
pub struct MockMetricsSource {
    /// Whether every fetch fails with [`MetricsError::Unavailable`].
    pub simulate_failure: bool,
    /// Whether every dataset comes back empty.
    pub empty: bool,
    calls: AtomicUsize,
}

impl MockMetricsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose fetches all fail.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// A source with no tickets at all.
    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) -> Result<(), MetricsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.simulate_failure {
            tracing::warn!("Mock metrics source simulating failure");
            return Err(MetricsError::Unavailable("Simulated failure".to_string()));
        }
        Ok(())
    }

    fn rows<T>(&self, rows: Vec<T>) -> Vec<T> {
        if self.empty {
            Vec::new()
        } else {
            rows
        }
    }
}

#[async_trait::async_trait]
impl MetricsSource for MockMetricsSource {
    async fn status_counts(&self, _filter: &ReportFilter) -> Result<StatusBreakdown, MetricsError> {
        self.hit()?;
        if self.empty {
            return Ok(StatusBreakdown::default());
        }
        Ok(StatusBreakdown {
            total_created: 42,
            new: 6,
            assigned: 5,
            planned: 1,
            pending: 3,
            resolved: 17,
            closed: 10,
            total_open: 12,
        })
    }

    async fn priority_counts(
        &self,
        _filter: &ReportFilter,
    ) -> Result<Vec<PriorityCount>, MetricsError> {
        self.hit()?;
        let rows = [(5, 4), (4, 9), (3, 20), (2, 9)]
            .into_iter()
            .map(|(priority, total)| PriorityCount {
                priority,
                name: PriorityCount::label_for(priority).to_string(),
                total,
            })
            .collect();
        Ok(self.rows(rows))
    }

    async fn category_counts(
        &self,
        _filter: &ReportFilter,
    ) -> Result<Vec<CategoryCount>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            CategoryCount {
                category: "Network > VPN".to_string(),
                total: 15,
            },
            CategoryCount {
                category: "Hardware; Printers".to_string(),
                total: 11,
            },
            CategoryCount {
                category: "No category".to_string(),
                total: 4,
            },
        ]))
    }

    async fn sector_counts(
        &self,
        _filter: &ReportFilter,
    ) -> Result<Vec<SectorCount>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            SectorCount {
                sector: "Root entity > Finance".to_string(),
                total: 21,
            },
            SectorCount {
                sector: "Root entity > HR".to_string(),
                total: 13,
            },
        ]))
    }

    async fn monthly_counts(
        &self,
        _filter: &ReportFilter,
    ) -> Result<Vec<MonthlyCount>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            MonthlyCount {
                month: "2024-01".to_string(),
                label: "01/2024".to_string(),
                total: 19,
            },
            MonthlyCount {
                month: "2024-02".to_string(),
                label: "02/2024".to_string(),
                total: 23,
            },
        ]))
    }

    async fn technician_ranking(
        &self,
        _filter: &ReportFilter,
    ) -> Result<Vec<TechnicianStats>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            TechnicianStats {
                technician: "Ana Souza".to_string(),
                total_tickets: 18,
                closed: 15,
                open: 3,
                resolution_rate: 83.3,
            },
            TechnicianStats {
                technician: "Bruno Lima".to_string(),
                total_tickets: 9,
                closed: 6,
                open: 3,
                resolution_rate: 66.7,
            },
        ]))
    }

    async fn resolution_time(
        &self,
        _filter: &ReportFilter,
    ) -> Result<ResolutionTime, MetricsError> {
        self.hit()?;
        if self.empty {
            return Ok(ResolutionTime::empty());
        }
        Ok(ResolutionTime::new(26.5, 0.5, 140.0, 27))
    }

    async fn overdue_tickets(
        &self,
        _filter: &ReportFilter,
    ) -> Result<OverdueTickets, MetricsError> {
        self.hit()?;
        if self.empty {
            return Ok(OverdueTickets::default());
        }
        Ok(OverdueTickets {
            total: 2,
            tickets: vec![
                OverdueTicket::new(1031, "Printer offline on 3rd floor"),
                OverdueTicket::new(1044, "VPN drops <every> 5 minutes"),
            ],
        })
    }

    async fn satisfaction(
        &self,
        _filter: &ReportFilter,
    ) -> Result<SatisfactionStats, MetricsError> {
        self.hit()?;
        if self.empty {
            return Ok(SatisfactionStats::default());
        }
        Ok(SatisfactionStats::from_average(Some(4.2), 14))
    }

    async fn entities(&self) -> Result<Vec<FilterOption>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            FilterOption {
                id: 1,
                name: "Root entity > Finance".to_string(),
            },
            FilterOption {
                id: 2,
                name: "Root entity > HR".to_string(),
            },
        ]))
    }

    async fn technicians(&self) -> Result<Vec<FilterOption>, MetricsError> {
        self.hit()?;
        Ok(self.rows(vec![
            FilterOption {
                id: 7,
                name: "Ana Souza".to_string(),
            },
            FilterOption {
                id: 9,
                name: "Bruno Lima".to_string(),
            },
        ]))
    }

    async fn ping(&self) -> Result<(), MetricsError> {
        if self.simulate_failure {
            return Err(MetricsError::Unavailable("Simulated failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let source = MockMetricsSource::new();
        let filter = ReportFilter::default();

        source.status_counts(&filter).await.unwrap();
        source.category_counts(&filter).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let source = MockMetricsSource::failing();
        let result = source.satisfaction(&ReportFilter::default()).await;
        assert!(matches!(result, Err(MetricsError::Unavailable(_))));
        assert!(source.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_empty() {
        let source = MockMetricsSource::empty();
        let filter = ReportFilter::default();
        assert!(source.monthly_counts(&filter).await.unwrap().is_empty());
        assert_eq!(source.status_counts(&filter).await.unwrap().total_created, 0);
    }
}
