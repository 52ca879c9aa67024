//! Display formatting shared by the cards, tables and hover text

/// Whole number with comma thousands separators (e.g. "1,234,568").
/// Halves round to even.
pub fn with_commas(value: f64) -> String {
    let rounded = value.round_ties_even();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Whole millions with one decimal place (e.g. 8,412,345 gives "8.0M").
/// The fraction is floored away, not rounded.
pub fn millions(value: f64) -> String {
    format!("{:.1}M", (value / 1_000_000.0).floor())
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Round to `decimals` places, halves to even
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_commas() {
        assert_eq!(with_commas(0.0), "0");
        assert_eq!(with_commas(999.0), "999");
        assert_eq!(with_commas(1000.0), "1,000");
        assert_eq!(with_commas(1234567.6), "1,234,568");
        assert_eq!(with_commas(-45000.0), "-45,000");
    }

    #[test]
    fn test_halves_round_to_even() {
        assert_eq!(with_commas(2.5), "2");
        assert_eq!(with_commas(3.5), "4");
        assert_eq!(with_commas(1_000_000.5), "1,000,000");
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn test_millions_and_percent() {
        assert_eq!(millions(8_412_345.0), "8.0M");
        assert_eq!(millions(8_999_999.0), "8.0M");
        assert_eq!(millions(12_000_000.0), "12.0M");
        assert_eq!(percent(84.04), "84.0%");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(-16.666666, 2), -16.67);
        assert_eq!(round_to(0.974, 2), 0.97);
    }
}
