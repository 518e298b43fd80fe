/// Placeholder for values that cannot be shown.
pub const DASH: &str = "—";

/// Groups the integer part with commas (`1234567.5` → `"1,234,567.5"`).
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let negative = value < 0.0;
    let text = format!("{}", value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Annual amount rounded to whole thousands: `"$146K"`, or a dash.
pub fn format_annual_to_k(value: f64) -> String {
    if !value.is_finite() {
        return DASH.to_string();
    }
    let thousands = (value / 1000.0).round();
    format!("${}K", format_currency(thousands))
}

/// `"$150,000/yr"`, or a dash when the salary is cleared.
pub fn format_salary_per_year(salary: Option<f64>) -> String {
    match salary {
        Some(s) if s.is_finite() => format!("${}/yr", format_currency(s)),
        _ => DASH.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{format_annual_to_k, format_currency, format_salary_per_year};

    #[test]
    fn groups_thousands() {
        assert_eq!(format_currency(0.0), "0");
        assert_eq!(format_currency(999.0), "999");
        assert_eq!(format_currency(150_000.0), "150,000");
        assert_eq!(format_currency(1_234_567.5), "1,234,567.5");
        assert_eq!(format_currency(-2500.0), "-2,500");
        assert_eq!(format_currency(f64::NAN), "");
    }

    #[test]
    fn annual_floor_in_thousands() {
        assert_eq!(format_annual_to_k(40.0 * 2080.0), "$83K");
        assert_eq!(format_annual_to_k(90.0 * 2080.0), "$187K");
        assert_eq!(format_annual_to_k(600.0 * 2080.0), "$1,248K");
        assert_eq!(format_annual_to_k(f64::INFINITY), "—");
    }

    #[test]
    fn salary_summary_text() {
        assert_eq!(format_salary_per_year(Some(150_000.0)), "$150,000/yr");
        assert_eq!(format_salary_per_year(None), "—");
    }
}
