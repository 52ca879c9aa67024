use serde::Serialize;

use crate::format::round_to;
use crate::metrics::resample::AggregatedPeriod;
use crate::models::Service;

/// Pairwise Pearson coefficients between service ridership columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub services: Vec<Service>,
    /// Row-major, rounded to two decimals; `None` where a column has no variance
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Service, b: Service) -> Option<f64> {
        let i = self.services.iter().position(|s| *s == a)?;
        let j = self.services.iter().position(|s| *s == b)?;
        self.values[i][j]
    }

    /// Smallest defined coefficient, used as the colour scale floor
    pub fn min_value(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .copied()
            .reduce(f64::min)
    }
}

/// Cell text: exactly 1 prints as "1", everything else with two decimals
pub fn display_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v == 1.0 => "1".to_string(),
        Some(v) => format!("{:.2}", v),
        None => String::new(),
    }
}

/// Pearson correlation of two equally long series
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Correlation of the ridership counts of `services` across the aggregated
/// periods. Percentage columns never take part.
pub fn correlation_matrix(periods: &[AggregatedPeriod], services: &[Service]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = services
        .iter()
        .map(|s| periods.iter().map(|p| p.count(*s) as f64).collect())
        .collect();

    let n = services.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let coefficient = if i == j {
                pearson(&columns[i], &columns[i]).map(|_| 1.0)
            } else {
                pearson(&columns[i], &columns[j]).map(|r| round_to(r, 2))
            };
            values[i][j] = coefficient;
            values[j][i] = coefficient;
        }
    }

    CorrelationMatrix {
        services: services.to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::resample::{resample, Granularity};
    use crate::models::fixtures::{daily_table, date};
    use chrono::Datelike;

    fn varied_table() -> crate::models::RidershipTable {
        daily_table(
            date(2019, 1, 1),
            date(2023, 12, 31),
            |d, s| {
                let trend = (d.year() - 2018) as f64 * 100.0 + d.month() as f64 * 7.0;
                match s {
                    Service::Buses => 5000.0 - trend,
                    Service::Lirr => trend * 2.0 + ((d.ordinal() * 13) % 17) as f64,
                    _ => trend + (s.index() as f64) * ((d.ordinal() % 11) as f64),
                }
            },
            0.0,
        )
    }

    #[test]
    fn test_pearson() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), Some(1.0));
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), Some(-1.0));
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[3.0, 2.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let table = varied_table();
        for granularity in Granularity::EXPOSED {
            let periods = resample(&table, granularity);
            let matrix = correlation_matrix(&periods, &Service::ALL);
            for a in Service::ALL {
                assert_eq!(matrix.get(a, a), Some(1.0));
                assert_eq!(display_value(matrix.get(a, a)), "1");
                for b in Service::ALL {
                    assert_eq!(matrix.get(a, b), matrix.get(b, a));
                }
            }
            assert_eq!(matrix.get(Service::Subways, Service::Buses).map(f64::signum), Some(-1.0));
        }
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let table = daily_table(
            date(2020, 1, 1),
            date(2020, 12, 31),
            |d, s| if s == Service::Subways { 10.0 } else { d.ordinal() as f64 },
            0.0,
        );
        let periods = resample(&table, Granularity::Month);
        let matrix = correlation_matrix(&periods, &Service::ALL);
        assert_eq!(matrix.get(Service::Subways, Service::Buses), None);
        assert_eq!(matrix.get(Service::Subways, Service::Subways), None);
        assert_eq!(matrix.get(Service::Buses, Service::Lirr), Some(1.0));
        assert_eq!(display_value(Some(0.5)), "0.50");
        assert_eq!(matrix.min_value(), Some(1.0));
    }
}
