//! Shared dashboard logic for the HTTP handlers
//!
//! Every request reruns the metric pipeline from the loaded table. Only the
//! KPI bundle, which does not depend on the selection, is cached.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::charts::{self, Figure};
use crate::config::{Calendar, DARK_BLUE, DARK_ORANGE, DASHBOARD_TITLE};
use crate::error::MetricError;
use crate::loader;
use crate::metrics::comparison::{comparison_table, ComparisonCells, ComparisonRow};
use crate::metrics::correlation::correlation_matrix;
use crate::metrics::kpi::{create_kpis, KpiBundle, KpiDisplay};
use crate::metrics::recovery::{ranked_recoveries, window_totals};
use crate::metrics::resample::{resample, to_thousands, AggregatedPeriod, Granularity};
use crate::metrics::summary::{create_metrics, MetricsSummary, PeriodMetric};
use crate::metrics::trend::trend_lines;
use crate::metrics::variability::daily_variability;
use crate::models::{DateWindow, RidershipTable, Service};

/// Value of the services control that selects every service
pub const ALL_SERVICES: &str = "all_services";

/// Most ridership cards shown above the tabs
pub const MAX_CARDS: usize = 5;

/// Services that get a card: all of them when five or fewer are picked,
/// otherwise the first four plus the sixth
pub fn card_services(services: &[Service]) -> Vec<Service> {
    if services.len() > MAX_CARDS {
        let mut shown = services[..MAX_CARDS - 1].to_vec();
        shown.push(services[MAX_CARDS]);
        shown
    } else {
        services.to_vec()
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Granularity and services chosen on the dashboard controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub granularity: Granularity,
    pub services: Vec<Service>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            services: Service::ALL.to_vec(),
        }
    }
}

impl Selection {
    /// Parse the raw query values. Missing granularity means monthly; a
    /// missing or empty list means every service, as does any list naming
    /// `all_services`.
    pub fn parse(granularity: Option<&str>, services: Option<&str>) -> Result<Self, MetricError> {
        let granularity = match granularity.map(str::trim).filter(|g| !g.is_empty()) {
            None => Granularity::Month,
            Some(raw) => {
                let parsed: Granularity = raw.parse()?;
                if !parsed.is_exposed() {
                    return Err(MetricError::UnknownGranularity(raw.to_string()));
                }
                parsed
            }
        };

        let names: Vec<&str> = services
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        let services = if names.is_empty() || names.contains(&ALL_SERVICES) {
            Service::ALL.to_vec()
        } else {
            let mut picked: Vec<Service> = Vec::new();
            for name in names {
                let service: Service = name.parse()?;
                if !picked.contains(&service) {
                    picked.push(service);
                }
            }
            picked
        };

        Ok(Self { granularity, services })
    }
}

// ============================================================================
// Charts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    ServiceLine,
    DualAxis,
    Correlation,
    RecoveryHeatmap,
    RecoveryBar,
    RidershipPie,
    BeforeAfter,
    Scatter,
    Variability,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::ServiceLine,
        ChartKind::DualAxis,
        ChartKind::Correlation,
        ChartKind::RecoveryHeatmap,
        ChartKind::RecoveryBar,
        ChartKind::RidershipPie,
        ChartKind::BeforeAfter,
        ChartKind::Scatter,
        ChartKind::Variability,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::ServiceLine => "service_line",
            ChartKind::DualAxis => "dual_axis",
            ChartKind::Correlation => "correlation",
            ChartKind::RecoveryHeatmap => "recovery_heatmap",
            ChartKind::RecoveryBar => "recovery_bar",
            ChartKind::RidershipPie => "ridership_pie",
            ChartKind::BeforeAfter => "before_after",
            ChartKind::Scatter => "scatter",
            ChartKind::Variability => "variability",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

// ============================================================================
// Response bundles
// ============================================================================

/// Headline card for one selected service
#[derive(Debug, Clone, Serialize)]
pub struct RidershipCard {
    pub service: Service,
    pub heading: String,
    pub value: String,
    pub change: String,
    /// Text colour of the value and change lines, if any
    pub colour: Option<&'static str>,
    pub sparkline: Figure,
}

impl RidershipCard {
    fn new(metric: &PeriodMetric, periods: &[AggregatedPeriod], granularity: Granularity) -> Self {
        let (change, colour) = match metric.percent_change {
            Some(pct) if pct > 0.0 => (format!("% Change: {:.1}% \u{2191}", pct), Some(DARK_BLUE)),
            Some(pct) if pct < 0.0 => (format!("% Change: {:.1}% \u{2193}", pct), Some(DARK_ORANGE)),
            Some(pct) => (format!("% Change: {:.1}%", pct), None),
            None => ("% Change: n/a".to_string(), None),
        };
        Self {
            service: metric.service,
            heading: format!("Avg {} Ridership", granularity.adjective()),
            value: metric.ridership_last_period.clone(),
            change,
            colour,
            sparkline: charts::sparkline(periods, granularity, metric),
        }
    }
}

/// Everything the page needs to redraw after a control change
#[derive(Debug, Clone, Serialize)]
pub struct DashboardBundle {
    pub title: &'static str,
    pub selection: Selection,
    /// `None` when the KPIs could not be computed; the page leaves them blank
    pub kpis: Option<KpiDisplay>,
    pub cards: Vec<RidershipCard>,
    pub charts: BTreeMap<&'static str, Figure>,
    pub comparison: Vec<ComparisonCells>,
}

// ============================================================================
// Dashboard Service
// ============================================================================

pub struct DashboardService {
    table: Arc<RidershipTable>,
    thousands: Arc<RidershipTable>,
    calendar: Calendar,
    cached_kpis: Arc<RwLock<Option<KpiBundle>>>,
}

impl DashboardService {
    pub fn new(table: RidershipTable, calendar: Calendar) -> Self {
        let thousands = to_thousands(&table);
        Self {
            table: Arc::new(table),
            thousands: Arc::new(thousands),
            calendar,
            cached_kpis: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_csv(path: impl AsRef<Path>, calendar: Calendar) -> Result<Self> {
        let path = path.as_ref();
        let table = loader::load_csv(path).with_context(|| format!("Failed to load ridership from {}", path.display()))?;
        Ok(Self::new(table, calendar))
    }

    pub fn table(&self) -> &RidershipTable {
        &self.table
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Headline KPIs, computed on first use and cached for the life of the service
    pub async fn kpis(&self) -> Result<KpiBundle, MetricError> {
        {
            let cache = self.cached_kpis.read().await;
            if let Some(kpis) = cache.as_ref() {
                return Ok(kpis.clone());
            }
        }

        let kpis = create_kpis(&self.table, &self.calendar)?;
        info!(peak = %kpis.peak_date, recovery = kpis.total_recovery, "Computed KPIs");

        let mut cache = self.cached_kpis.write().await;
        *cache = Some(kpis.clone());
        Ok(kpis)
    }

    /// Thousands table resampled to `granularity`
    pub fn periods(&self, granularity: Granularity) -> Vec<AggregatedPeriod> {
        resample(&self.thousands, granularity)
    }

    pub fn metrics(&self, selection: &Selection) -> Result<MetricsSummary, MetricError> {
        create_metrics(&self.periods(selection.granularity), &selection.services)
    }

    pub fn comparison(&self) -> Vec<ComparisonRow> {
        comparison_table(&self.table, &self.calendar)
    }

    fn full_range(&self) -> (NaiveDate, NaiveDate) {
        let first = self.table.first_date().unwrap_or(NaiveDate::MIN);
        let last = self.table.last_date().unwrap_or(NaiveDate::MAX);
        (first, last)
    }

    fn build_chart(&self, kind: ChartKind, selection: &Selection, periods: &[AggregatedPeriod]) -> Figure {
        let granularity = selection.granularity;
        let services = &selection.services;
        match kind {
            ChartKind::ServiceLine => charts::service_line_chart(periods, granularity, services, &self.calendar),
            ChartKind::DualAxis => charts::dual_axis_chart(periods, granularity, services),
            ChartKind::Correlation => {
                charts::correlation_heatmap(&correlation_matrix(periods, &Service::ALL), granularity)
            }
            ChartKind::RecoveryHeatmap => charts::recovery_heatmap(periods, granularity),
            ChartKind::RecoveryBar => charts::recovery_bar_chart(&ranked_recoveries(
                &self.table,
                &self.calendar.baseline(),
                &self.calendar.current,
            )),
            ChartKind::RidershipPie => charts::ridership_pie_chart(
                &window_totals(&self.table, &self.calendar.baseline()),
                &window_totals(&self.table, &self.calendar.current),
            ),
            ChartKind::BeforeAfter => charts::before_after_chart(
                &window_totals(&self.table, &self.calendar.baseline()),
                &window_totals(&self.table, &self.calendar.current),
                &Service::ALL,
            ),
            ChartKind::Scatter => {
                charts::scatter_with_trend(&self.table, services, &trend_lines(&self.table, services))
            }
            ChartKind::Variability => {
                let (start, end) = self.full_range();
                let stats = daily_variability(&self.table, &DateWindow::between(start, end), &Service::ALL);
                charts::variability_box_plot(&stats, start, end)
            }
        }
    }

    pub fn chart(&self, kind: ChartKind, selection: &Selection) -> Result<Figure, MetricError> {
        let periods = self.periods(selection.granularity);
        if periods.is_empty() {
            return Err(MetricError::NoPeriods);
        }
        debug!(chart = kind.slug(), periods = periods.len(), "Building chart");
        Ok(self.build_chart(kind, selection, &periods))
    }

    /// Cards for the services picked by [`card_services`]
    pub fn cards(&self, selection: &Selection, periods: &[AggregatedPeriod]) -> Result<Vec<RidershipCard>, MetricError> {
        let metrics = create_metrics(periods, &card_services(&selection.services))?;
        Ok(metrics
            .entries
            .iter()
            .map(|m| RidershipCard::new(m, periods, selection.granularity))
            .collect())
    }

    pub async fn dashboard(&self, selection: &Selection) -> Result<DashboardBundle, MetricError> {
        let periods = self.periods(selection.granularity);
        if periods.is_empty() {
            return Err(MetricError::NoPeriods);
        }

        let kpis = match self.kpis().await {
            Ok(kpis) => Some(kpis.display()),
            Err(e) => {
                warn!(error = %e, "KPIs unavailable");
                None
            }
        };

        let charts = ChartKind::ALL
            .into_iter()
            .map(|kind| (kind.slug(), self.build_chart(kind, selection, &periods)))
            .collect();

        Ok(DashboardBundle {
            title: DASHBOARD_TITLE,
            selection: selection.clone(),
            kpis,
            cards: self.cards(selection, &periods)?,
            charts,
            comparison: self.comparison().iter().map(ComparisonRow::cells).collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::fixtures::{daily_table, date};
    use chrono::Datelike;

    /// Service over 2019-2024 with the default calendar windows populated
    pub fn sample_service() -> DashboardService {
        let table = daily_table(
            date(2019, 1, 1),
            date(2024, 10, 31),
            |d, s| {
                let level = match d.year() {
                    2019 => 1_000_000.0,
                    2020 if d < date(2020, 3, 11) => 1_000_000.0,
                    2020 => 250_000.0,
                    2021 => 500_000.0,
                    2022 | 2023 => 700_000.0,
                    _ => 840_000.0,
                };
                level / (s.index() as f64 + 1.0) + d.ordinal() as f64 * 10.0
            },
            80.0,
        );
        DashboardService::new(table, Calendar::default())
    }

    /// Service whose data stops before the pandemic declaration, so the
    /// post-pandemic KPI windows are empty
    pub fn pre_pandemic_service() -> DashboardService {
        let table = daily_table(
            date(2018, 1, 1),
            date(2020, 2, 29),
            |d, s| 900_000.0 / (s.index() as f64 + 1.0) + d.ordinal() as f64 * 10.0,
            100.0,
        );
        DashboardService::new(table, Calendar::default())
    }
}
