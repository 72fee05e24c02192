/// Format a float as a currency amount with thousands separators: £1,234.56
pub fn money(val: f64, symbol: &str) -> String {
    if !val.is_finite() {
        return "n/a".to_string();
    }
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

pub fn round_to(val: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (val * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "£"), "£1,234.56");
        assert_eq!(money(-500.00, "£"), "-£500.00");
        assert_eq!(money(0.0, "$"), "$0.00");
        assert_eq!(money(1000000.99, "£"), "£1,000,000.99");
        assert_eq!(money(42.1, "€"), "€42.10");
    }

    #[test]
    fn test_money_non_finite() {
        assert_eq!(money(f64::NAN, "£"), "n/a");
        assert_eq!(money(f64::INFINITY, "£"), "n/a");
        assert_eq!(money(f64::NEG_INFINITY, "$"), "n/a");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(33.333333, 1), 33.3);
        assert_eq!(round_to(66.666666, 1), 66.7);
        assert_eq!(round_to(12.0, 1), 12.0);
    }
}
