/// Format a price rounded to the nearest cent with two decimals ("10.50")
pub fn format_price(value: f64) -> String {
    // Adding zero turns -0.0 (an empty f64 sum) into 0.0
    let rounded = (value * 100.0).round() / 100.0 + 0.0;
    format!("{:.2}", rounded)
}

/// Price with currency sign, as shown next to dishes and cart lines
pub fn format_euro(value: f64) -> String {
    format!("€{}", format_price(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_number_gets_two_decimals() {
        assert_eq!(format_price(2.0), "2.00");
        assert_eq!(format_price(0.0), "0.00");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(format_price(-0.0), "0.00");
        assert_eq!(format_price(-0.001), "0.00");
        let empty: f64 = std::iter::empty::<f64>().sum();
        assert_eq!(format_euro(empty), "€0.00");
    }

    #[test]
    fn test_rounds_to_nearest_cent() {
        // 1.005 is 1.00499999... in binary
        assert_eq!(format_price(1.005), "1.00");
        assert_eq!(format_price(10.499), "10.50");
        assert_eq!(format_price(9.8), "9.80");
        assert_eq!(format_price(3.333), "3.33");
    }

    #[test]
    fn test_euro_prefix() {
        assert_eq!(format_euro(10.5), "€10.50");
    }
}
