//! Shared reference data: service colours and the business calendar.
//!
//! Both are built once and never mutated. The calendar windows are tied to the
//! pandemic timeline and the reporting period of the dashboard; tests construct
//! their own `Calendar` to move them.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use crate::models::{DateWindow, Service, SERVICE_COUNT};

pub const DEFAULT_DATA_PATH: &str = "data/MTA_Daily_Ridership.csv";

/// Ports probed when no port is configured
pub const DEFAULT_PORT_RANGE: Range<u16> = 8700..8800;

pub const DASHBOARD_TITLE: &str = "MTA Ridership Dashboard";

// Font colours
pub const DARK_BLUE: &str = "#134770";
pub const DARK_ORANGE: &str = "#D35940";

/// Background of every hover label
pub const HOVER_BACKGROUND: &str = "#0A1128";

const FULL_COLOURS: [&str; SERVICE_COUNT] = [
    "#012A4A", "#01497C", "#2A6F97", "#2C7DA0", "#61A5C2", "#89C2D9", "#A9D6E5",
];

#[derive(Debug, Clone, Serialize)]
pub struct ServiceColour {
    pub colour: String,
    pub tinted_colour: String,
}

/// Per-service colour lookup used by every chart
pub static PALETTE: LazyLock<HashMap<Service, ServiceColour>> = LazyLock::new(|| {
    Service::ALL
        .into_iter()
        .zip(FULL_COLOURS)
        .map(|(service, hex)| {
            (
                service,
                ServiceColour {
                    colour: hex.to_string(),
                    tinted_colour: tinted_colour(hex, 0.5),
                },
            )
        })
        .collect()
});

pub fn colour(service: Service) -> &'static str {
    PALETTE.get(&service).map(|c| c.colour.as_str()).unwrap_or(DARK_BLUE)
}

pub fn tinted(service: Service) -> &'static str {
    PALETTE.get(&service).map(|c| c.tinted_colour.as_str()).unwrap_or(DARK_BLUE)
}

/// `#RRGGBB` to `rgba(r,g,b,alpha)`; malformed input falls back to black
pub fn tinted_colour(hex: &str, alpha: f64) -> String {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    format!("rgba({},{},{},{})", channel(0), channel(2), channel(4), alpha)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Fixed calendar windows behind the KPIs and comparison figures
#[derive(Debug, Clone, Serialize)]
pub struct Calendar {
    /// WHO pandemic declaration; the baseline window ends the day before
    pub pandemic_declared: NaiveDate,
    pub current: DateWindow,
    pub first_post_pandemic: DateWindow,
    pub yoy_baseline: DateWindow,
    pub yoy_current: DateWindow,
    pub lockdown: DateWindow,
    pub post_lockdown_start: NaiveDate,
}

impl Calendar {
    pub fn baseline(&self) -> DateWindow {
        DateWindow::before(self.pandemic_declared)
    }

    pub fn post_pandemic(&self) -> DateWindow {
        DateWindow::from(self.pandemic_declared)
    }

    pub fn post_lockdown(&self) -> DateWindow {
        DateWindow::from(self.post_lockdown_start)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            pandemic_declared: ymd(2020, 3, 11),
            current: DateWindow::between(ymd(2024, 10, 1), ymd(2024, 10, 10)),
            first_post_pandemic: DateWindow::between(ymd(2021, 10, 1), ymd(2021, 10, 10)),
            yoy_baseline: DateWindow::between(ymd(2023, 10, 1), ymd(2023, 10, 31)),
            yoy_current: DateWindow::between(ymd(2024, 10, 1), ymd(2024, 10, 31)),
            lockdown: DateWindow::between(ymd(2020, 3, 11), ymd(2020, 6, 8)),
            post_lockdown_start: ymd(2020, 6, 9),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tinted_colour() {
        assert_eq!(tinted_colour("#012A4A", 0.5), "rgba(1,42,74,0.5)");
        assert_eq!(tinted_colour("#A9D6E5", 0.5), "rgba(169,214,229,0.5)");
    }

    #[test]
    fn test_palette_covers_every_service() {
        assert_eq!(PALETTE.len(), SERVICE_COUNT);
        assert_eq!(colour(Service::Subways), "#012A4A");
        assert_eq!(tinted(Service::StatenIslandRailway), "rgba(169,214,229,0.5)");
    }

    #[test]
    fn test_default_calendar() {
        let calendar = Calendar::default();
        let baseline = calendar.baseline();
        assert!(baseline.contains(ymd(2020, 3, 10)));
        assert!(!baseline.contains(ymd(2020, 3, 11)));
        assert!(calendar.current.contains(ymd(2024, 10, 10)));
        assert!(!calendar.current.contains(ymd(2024, 10, 11)));
        assert_eq!(DateWindow::month(2023, 10), Some(calendar.yoy_baseline));
    }
}
