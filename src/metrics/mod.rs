//! Pure aggregations over the daily ridership table

pub mod comparison;
pub mod correlation;
pub mod kpi;
pub mod recovery;
pub mod resample;
pub mod summary;
pub mod trend;
pub mod variability;

pub use comparison::{comparison_table, ComparisonRow};
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use kpi::{create_kpis, KpiBundle};
pub use recovery::{recovery_percentage, total_recovery, ServiceRecovery};
pub use resample::{resample, to_thousands, AggregatedPeriod, Granularity};
pub use summary::{create_metrics, percent_change, MetricsSummary, PeriodMetric};
pub use trend::{trend_lines, TrendLine};
pub use variability::{daily_variability, BoxStats};
