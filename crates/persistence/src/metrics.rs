//! Query and connection pool metrics for the GLPI database.

use metrics::{counter, gauge, histogram};
use sqlx::MySqlPool;
use std::time::Instant;

/// Record how long one named query took.
pub fn record_query_duration(query: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query).record(duration_secs);
}

/// Refresh the pool gauges. Called periodically from the binary.
pub fn record_pool_metrics(pool: &MySqlPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::start("ticket_status_counts");
/// let result = query.fetch_one(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn start(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Record the duration, and count the query as failed when `result` is an error.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        record_query_duration(self.query, self.start.elapsed().as_secs_f64());
        if result.is_err() {
            counter!("database_query_errors_total", "query" => self.query).increment(1);
        }
    }
}
