//! Report model builder.
//!
//! Resolves requested section identifiers, fetches one dataset per section from
//! a [`MetricsSource`] and assembles an immutable [`Report`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::metrics_source::{MetricsError, MetricsSource};
use crate::models::{
    ExecutiveSummary, FilterOptions, Report, ReportFilter, Section, SectionData, SectionId,
};

/// Report build errors.
#[derive(Error, Debug)]
pub enum ReportBuildError {
    /// A dataset fetch failed. The whole build is aborted.
    #[error("Failed to fetch {section} data: {source}")]
    DataFetch {
        section: &'static str,
        #[source]
        source: MetricsError,
    },
}

impl ReportBuildError {
    fn fetch(section: SectionId) -> impl Fn(MetricsError) -> Self + Copy {
        move |source| ReportBuildError::DataFetch {
            section: section.as_str(),
            source,
        }
    }
}

/// Resolves requested identifiers into known sections.
///
/// An empty request selects every section in canonical order. Unknown
/// identifiers are skipped and duplicates collapse to their first occurrence.
pub fn resolve_sections<S: AsRef<str>>(requested: &[S]) -> Vec<SectionId> {
    if requested.is_empty() {
        return SectionId::ALL.to_vec();
    }

    let mut resolved = Vec::with_capacity(requested.len());
    for raw in requested {
        match raw.as_ref().parse::<SectionId>() {
            Ok(id) if !resolved.contains(&id) => resolved.push(id),
            Ok(id) => debug!(section = %id, "Duplicate report section ignored"),
            Err(_) => debug!(section = %raw.as_ref(), "Unknown report section skipped"),
        }
    }
    resolved
}

/// Builds reports from a metrics source.
#[derive(Clone)]
pub struct ReportBuilder {
    source: Arc<dyn MetricsSource>,
    title: String,
}

impl ReportBuilder {
    pub fn new(source: Arc<dyn MetricsSource>, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
        }
    }

    /// Builds a report stamped with the current time.
    pub async fn build<S: AsRef<str>>(
        &self,
        filter: ReportFilter,
        requested: &[S],
    ) -> Result<Report, ReportBuildError> {
        self.build_at(filter, requested, Utc::now()).await
    }

    /// Builds a report stamped with `generated_at`.
    pub async fn build_at<S: AsRef<str>>(
        &self,
        filter: ReportFilter,
        requested: &[S],
        generated_at: DateTime<Utc>,
    ) -> Result<Report, ReportBuildError> {
        let ids = resolve_sections(requested);
        let mut sections = Vec::with_capacity(ids.len());

        for id in &ids {
            let data = self.fetch(*id, &filter).await.map_err(|e| {
                warn!(section = %id, error = %e, "Report section fetch failed");
                e
            })?;
            sections.push(Section::new(data));
        }

        let report = Report::new(self.title.clone(), filter, generated_at, sections);
        info!(
            period = %report.metadata().period,
            sections = report.metadata().section_count,
            entity_id = ?filter.entity_id,
            technician_id = ?filter.technician_id,
            "Report built"
        );
        Ok(report)
    }

    async fn fetch(
        &self,
        id: SectionId,
        filter: &ReportFilter,
    ) -> Result<SectionData, ReportBuildError> {
        let source = self.source.as_ref();
        let err = ReportBuildError::fetch(id);

        let data = match id {
            SectionId::Summary => {
                let status = source.status_counts(filter).await.map_err(err)?;
                let resolution = source.resolution_time(filter).await.map_err(err)?;
                let satisfaction = source.satisfaction(filter).await.map_err(err)?;
                let overdue = source.overdue_tickets(filter).await.map_err(err)?;
                SectionData::Summary(ExecutiveSummary::compose(
                    &status,
                    &resolution,
                    &satisfaction,
                    &overdue,
                ))
            }
            SectionId::StatusBreakdown => {
                SectionData::StatusBreakdown(source.status_counts(filter).await.map_err(err)?)
            }
            SectionId::PriorityBreakdown => {
                SectionData::PriorityBreakdown(source.priority_counts(filter).await.map_err(err)?)
            }
            SectionId::CategoryBreakdown => {
                SectionData::CategoryBreakdown(source.category_counts(filter).await.map_err(err)?)
            }
            SectionId::SectorBreakdown => {
                SectionData::SectorBreakdown(source.sector_counts(filter).await.map_err(err)?)
            }
            SectionId::MonthlyTrend => {
                SectionData::MonthlyTrend(source.monthly_counts(filter).await.map_err(err)?)
            }
            SectionId::TechnicianRanking => SectionData::TechnicianRanking(
                source.technician_ranking(filter).await.map_err(err)?,
            ),
            SectionId::ResolutionTime => {
                SectionData::ResolutionTime(source.resolution_time(filter).await.map_err(err)?)
            }
            SectionId::OverdueTickets => {
                SectionData::OverdueTickets(source.overdue_tickets(filter).await.map_err(err)?)
            }
            SectionId::Satisfaction => {
                SectionData::Satisfaction(source.satisfaction(filter).await.map_err(err)?)
            }
        };
        Ok(data)
    }

    /// Entity and technician lists for export forms.
    pub async fn filter_options(&self) -> Result<FilterOptions, MetricsError> {
        let entities = self.source.entities().await?;
        let technicians = self.source.technicians().await?;
        Ok(FilterOptions {
            entities,
            technicians,
        })
    }
}
