//! Ticket metrics repository over the GLPI MySQL schema.
//!
//! Every aggregate excludes deleted tickets and is bounded by the requested
//! period: `from 00:00:00` inclusive to `to 23:59:59` inclusive.

use chrono::{NaiveDate, NaiveDateTime};
use domain::models::{
    CategoryCount, FilterOption, MonthlyCount, OverdueTicket, OverdueTickets, PriorityCount,
    ReportFilter, ResolutionTime, SatisfactionStats, SectorCount, StatusBreakdown,
    TechnicianStats,
};
use domain::services::{MetricsError, MetricsSource};
use sqlx::MySqlPool;

use crate::entities::{
    FilterOptionRow, MonthlyCountRow, NamedCountRow, OverdueTicketRow, PriorityCountRow,
    ResolutionTimeRow, SatisfactionRow, StatusCountsRow, TechnicianStatsRow,
};
use crate::metrics::QueryTimer;

/// GLPI actor type of an assigned technician in `glpi_tickets_users`.
const ASSIGNED_ACTOR_TYPE: i64 = 2;

const OVERDUE_LIST_LIMIT: i64 = 10;

/// Helper for building the dynamic WHERE clause of a ticket aggregate.
/// Tracks which optional bounds are present so binding follows the same order.
struct TicketFilterBuilder {
    conditions: Vec<String>,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
    entity_id: Option<i64>,
    technician_id: Option<i64>,
}

impl TicketFilterBuilder {
    /// Date bounds on `date_column`, starting from the given fixed conditions.
    fn dates(base: &[&str], date_column: &str, filter: &ReportFilter) -> Self {
        let mut conditions: Vec<String> = base.iter().map(|c| c.to_string()).collect();

        let from = filter.date_from.map(start_of_day);
        if from.is_some() {
            conditions.push(format!("{} >= ?", date_column));
        }

        let to = filter.date_to.map(end_of_day);
        if to.is_some() {
            conditions.push(format!("{} <= ?", date_column));
        }

        Self {
            conditions,
            from,
            to,
            entity_id: None,
            technician_id: None,
        }
    }

    /// Restricts to one entity when the filter names it.
    fn with_entity(mut self, column: &str, entity_id: Option<i64>) -> Self {
        if entity_id.is_some() {
            self.conditions.push(format!("{} = ?", column));
            self.entity_id = entity_id;
        }
        self
    }

    /// Restricts to one technician when the filter names it.
    fn with_technician(mut self, column: &str, technician_id: Option<i64>) -> Self {
        if technician_id.is_some() {
            self.conditions.push(format!("{} = ?", column));
            self.technician_id = technician_id;
        }
        self
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }
}

/// Binds the optional bounds of a [`TicketFilterBuilder`] in clause order.
macro_rules! bind_ticket_filters {
    ($builder:expr, $filters:expr) => {{
        let mut b = $builder;
        if let Some(from) = $filters.from {
            b = b.bind(from);
        }
        if let Some(to) = $filters.to {
            b = b.bind(to);
        }
        if let Some(entity_id) = $filters.entity_id {
            b = b.bind(entity_id);
        }
        if let Some(technician_id) = $filters.technician_id {
            b = b.bind(technician_id);
        }
        b
    }};
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(date))
}

/// Maps driver errors onto the metrics collaborator contract.
fn metrics_error(err: sqlx::Error) -> MetricsError {
    tracing::warn!(error = %err, "Ticket metrics query failed");
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            MetricsError::Unavailable(err.to_string())
        }
        other => MetricsError::Query(other.to_string()),
    }
}

/// Repository for ticket metrics queries.
#[derive(Clone)]
pub struct MetricsRepository {
    pool: MySqlPool,
}

impl MetricsRepository {
    /// Create a new repository instance.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Get ticket counts per status for tickets created in the period.
    pub async fn get_status_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<StatusBreakdown, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["t.is_deleted = 0"], "t.date_creation", filter);
        let query = format!(
            r#"
            SELECT
                COUNT(*) AS total_created,
                COUNT(CASE WHEN t.status = 1 THEN 1 END) AS new,
                COUNT(CASE WHEN t.status = 2 THEN 1 END) AS assigned,
                COUNT(CASE WHEN t.status = 3 THEN 1 END) AS planned,
                COUNT(CASE WHEN t.status = 4 THEN 1 END) AS pending,
                COUNT(CASE WHEN t.status = 5 THEN 1 END) AS resolved,
                COUNT(CASE WHEN t.status = 6 THEN 1 END) AS closed,
                COUNT(CASE WHEN t.status IN (1, 2, 3) THEN 1 END) AS total_open
            FROM glpi_tickets t
            WHERE {}
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_status_counts");
        let builder = sqlx::query_as::<_, StatusCountsRow>(&query);
        let result = bind_ticket_filters!(builder, filters)
            .fetch_one(&self.pool)
            .await;
        timer.finish(&result);

        Ok(result?.into())
    }

    /// Get ticket counts per priority, highest priority first.
    pub async fn get_priority_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<PriorityCount>, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["t.is_deleted = 0"], "t.date_creation", filter);
        let query = format!(
            r#"
            SELECT CAST(t.priority AS SIGNED) AS priority, COUNT(*) AS total
            FROM glpi_tickets t
            WHERE {}
            GROUP BY t.priority
            ORDER BY t.priority DESC
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_priority_counts");
        let builder = sqlx::query_as::<_, PriorityCountRow>(&query);
        let rows = bind_ticket_filters!(builder, filters)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Get the ten categories with most tickets.
    pub async fn get_category_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<CategoryCount>, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["t.is_deleted = 0"], "t.date_creation", filter);
        let query = format!(
            r#"
            SELECT COALESCE(ic.completename, 'No category') AS name, COUNT(t.id) AS total
            FROM glpi_tickets t
            LEFT JOIN glpi_itilcategories ic ON t.itilcategories_id = ic.id
            WHERE {}
            GROUP BY COALESCE(ic.completename, 'No category')
            ORDER BY total DESC
            LIMIT 10
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_category_counts");
        let builder = sqlx::query_as::<_, NamedCountRow>(&query);
        let rows = bind_ticket_filters!(builder, filters)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Get the ten entities with most tickets, optionally a single entity.
    pub async fn get_sector_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<SectorCount>, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["t.is_deleted = 0"], "t.date_creation", filter)
                .with_entity("t.entities_id", filter.entity_id);
        let query = format!(
            r#"
            SELECT COALESCE(e.completename, 'No entity') AS name, COUNT(t.id) AS total
            FROM glpi_tickets t
            LEFT JOIN glpi_entities e ON t.entities_id = e.id
            WHERE {}
            GROUP BY COALESCE(e.completename, 'No entity')
            ORDER BY total DESC
            LIMIT 10
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_sector_counts");
        let builder = sqlx::query_as::<_, NamedCountRow>(&query);
        let rows = bind_ticket_filters!(builder, filters)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Get tickets created per calendar month, oldest first.
    pub async fn get_monthly_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<MonthlyCount>, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["t.is_deleted = 0"], "t.date_creation", filter);
        let query = format!(
            r#"
            SELECT
                DATE_FORMAT(t.date_creation, '%Y-%m') AS month,
                DATE_FORMAT(t.date_creation, '%m/%Y') AS label,
                COUNT(t.id) AS total
            FROM glpi_tickets t
            WHERE {}
            GROUP BY month, label
            ORDER BY month ASC
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_monthly_counts");
        let builder = sqlx::query_as::<_, MonthlyCountRow>(&query);
        let rows = bind_ticket_filters!(builder, filters)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Get the fifteen technicians with most closed tickets.
    pub async fn get_technician_ranking(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<TechnicianStats>, sqlx::Error> {
        let filters = TicketFilterBuilder::dates(
            &["tu.type = ?", "t.is_deleted = 0"],
            "t.date_creation",
            filter,
        )
        .with_technician("u.id", filter.technician_id);
        let query = format!(
            r#"
            SELECT
                COALESCE(NULLIF(TRIM(CONCAT(COALESCE(u.firstname, ''), ' ', COALESCE(u.realname, ''))), ''), u.name) AS technician,
                COUNT(DISTINCT t.id) AS total_tickets,
                COUNT(DISTINCT CASE WHEN t.status IN (5, 6) THEN t.id END) AS closed,
                COUNT(DISTINCT CASE WHEN t.status IN (1, 2, 3, 4) THEN t.id END) AS open
            FROM glpi_tickets t
            INNER JOIN glpi_tickets_users tu ON t.id = tu.tickets_id
            INNER JOIN glpi_users u ON tu.users_id = u.id
            WHERE {}
            GROUP BY u.id, u.firstname, u.realname, u.name
            ORDER BY closed DESC, total_tickets DESC
            LIMIT 15
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_technician_ranking");
        let builder = sqlx::query_as::<_, TechnicianStatsRow>(&query).bind(ASSIGNED_ACTOR_TYPE);
        let rows = bind_ticket_filters!(builder, filters)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Get resolution time statistics for tickets solved in the period.
    pub async fn get_resolution_time(
        &self,
        filter: &ReportFilter,
    ) -> Result<ResolutionTime, sqlx::Error> {
        let filters = TicketFilterBuilder::dates(
            &[
                "t.status IN (5, 6)",
                "t.is_deleted = 0",
                "t.solvedate IS NOT NULL",
            ],
            "t.solvedate",
            filter,
        );
        let query = format!(
            r#"
            SELECT
                AVG(TIMESTAMPDIFF(HOUR, t.date_creation, t.solvedate) + 0e0) AS average_hours,
                MIN(TIMESTAMPDIFF(HOUR, t.date_creation, t.solvedate)) AS min_hours,
                MAX(TIMESTAMPDIFF(HOUR, t.date_creation, t.solvedate)) AS max_hours,
                COUNT(*) AS total_resolved
            FROM glpi_tickets t
            WHERE {}
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_resolution_time");
        let builder = sqlx::query_as::<_, ResolutionTimeRow>(&query);
        let row = bind_ticket_filters!(builder, filters)
            .fetch_one(&self.pool)
            .await;
        timer.finish(&row);

        Ok(row?.into())
    }

    /// Get open tickets past their deadline: the total and the ten oldest.
    pub async fn get_overdue_tickets(
        &self,
        filter: &ReportFilter,
    ) -> Result<OverdueTickets, sqlx::Error> {
        let filters = TicketFilterBuilder::dates(
            &[
                "t.status IN (1, 2, 3)",
                "t.is_deleted = 0",
                "t.time_to_resolve IS NOT NULL",
                "t.time_to_resolve < NOW()",
            ],
            "t.date_creation",
            filter,
        );

        let count_query = format!(
            "SELECT COUNT(*) FROM glpi_tickets t WHERE {}",
            filters.where_clause()
        );
        let list_query = format!(
            r#"
            SELECT CAST(t.id AS SIGNED) AS id, COALESCE(t.name, '') AS name
            FROM glpi_tickets t
            WHERE {}
            ORDER BY t.date_creation ASC
            LIMIT ?
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_overdue");
        let count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        let total = bind_ticket_filters!(count_builder, filters)
            .fetch_one(&self.pool)
            .await;
        let list_builder = sqlx::query_as::<_, OverdueTicketRow>(&list_query);
        let rows = bind_ticket_filters!(list_builder, filters)
            .bind(OVERDUE_LIST_LIMIT)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&total.as_ref().and(rows.as_ref()));

        Ok(OverdueTickets {
            total: total?,
            tickets: rows?.into_iter().map(OverdueTicket::from).collect(),
        })
    }

    /// Get satisfaction survey statistics for answers given in the period.
    pub async fn get_satisfaction(
        &self,
        filter: &ReportFilter,
    ) -> Result<SatisfactionStats, sqlx::Error> {
        let filters =
            TicketFilterBuilder::dates(&["s.satisfaction IS NOT NULL"], "s.date_answered", filter);
        let query = format!(
            r#"
            SELECT AVG(s.satisfaction + 0e0) AS average, COUNT(*) AS total_ratings
            FROM glpi_ticketsatisfactions s
            WHERE {}
            "#,
            filters.where_clause()
        );

        let timer = QueryTimer::start("ticket_satisfaction");
        let builder = sqlx::query_as::<_, SatisfactionRow>(&query);
        let row = bind_ticket_filters!(builder, filters)
            .fetch_one(&self.pool)
            .await;
        timer.finish(&row);

        let row = row?;
        Ok(SatisfactionStats::from_average(row.average, row.total_ratings))
    }

    /// List entities that own at least one ticket.
    pub async fn list_entities(&self) -> Result<Vec<FilterOption>, sqlx::Error> {
        let timer = QueryTimer::start("ticket_entities");
        let rows = sqlx::query_as::<_, FilterOptionRow>(
            r#"
            SELECT DISTINCT CAST(e.id AS SIGNED) AS id, e.completename AS name
            FROM glpi_entities e
            INNER JOIN glpi_tickets t ON t.entities_id = e.id
            WHERE t.is_deleted = 0
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// List users that were ever assigned a ticket.
    pub async fn list_technicians(&self) -> Result<Vec<FilterOption>, sqlx::Error> {
        let timer = QueryTimer::start("ticket_technicians");
        let rows = sqlx::query_as::<_, FilterOptionRow>(
            r#"
            SELECT DISTINCT
                CAST(u.id AS SIGNED) AS id,
                COALESCE(NULLIF(TRIM(CONCAT(COALESCE(u.firstname, ''), ' ', COALESCE(u.realname, ''))), ''), u.name) AS name
            FROM glpi_users u
            INNER JOIN glpi_tickets_users tu ON tu.users_id = u.id
            WHERE tu.type = ?
            ORDER BY name ASC
            "#,
        )
        .bind(ASSIGNED_ACTOR_TYPE)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Check database connectivity.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetricsSource for MetricsRepository {
    async fn status_counts(&self, filter: &ReportFilter) -> Result<StatusBreakdown, MetricsError> {
        self.get_status_counts(filter).await.map_err(metrics_error)
    }

    async fn priority_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<PriorityCount>, MetricsError> {
        self.get_priority_counts(filter).await.map_err(metrics_error)
    }

    async fn category_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<CategoryCount>, MetricsError> {
        self.get_category_counts(filter).await.map_err(metrics_error)
    }

    async fn sector_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<SectorCount>, MetricsError> {
        self.get_sector_counts(filter).await.map_err(metrics_error)
    }

    async fn monthly_counts(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<MonthlyCount>, MetricsError> {
        self.get_monthly_counts(filter).await.map_err(metrics_error)
    }

    async fn technician_ranking(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<TechnicianStats>, MetricsError> {
        self.get_technician_ranking(filter)
            .await
            .map_err(metrics_error)
    }

    async fn resolution_time(
        &self,
        filter: &ReportFilter,
    ) -> Result<ResolutionTime, MetricsError> {
        self.get_resolution_time(filter).await.map_err(metrics_error)
    }

    async fn overdue_tickets(
        &self,
        filter: &ReportFilter,
    ) -> Result<OverdueTickets, MetricsError> {
        self.get_overdue_tickets(filter).await.map_err(metrics_error)
    }

    async fn satisfaction(
        &self,
        filter: &ReportFilter,
    ) -> Result<SatisfactionStats, MetricsError> {
        self.get_satisfaction(filter).await.map_err(metrics_error)
    }

    async fn entities(&self) -> Result<Vec<FilterOption>, MetricsError> {
        self.list_entities().await.map_err(metrics_error)
    }

    async fn technicians(&self) -> Result<Vec<FilterOption>, MetricsError> {
        self.list_technicians().await.map_err(metrics_error)
    }

    async fn ping(&self) -> Result<(), MetricsError> {
        MetricsRepository::ping(self).await.map_err(metrics_error)
    }
}
