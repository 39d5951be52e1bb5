/// Placeholder shown wherever a value is absent
pub const PLACEHOLDER: &str = "—";

const COMPACT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Formats a price with precision chosen by its magnitude, so sub-cent
/// assets stay distinguishable instead of collapsing to `$0.00`.
/// - For prices >= 1: 2 decimal places
/// - For prices >= 0.01: 2 to 4 decimal places
/// - For prices >= 0.0001: 4 to 6 decimal places
/// - Anything else: 6 to 10 decimal places
///
/// Buckets compare the value itself, not its absolute value, so zero and
/// negative values land in the most precise bucket.
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let (min_frac, max_frac) = match v {
                v if v >= 1.0 => (2, 2),
                v if v >= 0.01 => (2, 4),
                v if v >= 0.0001 => (4, 6),
                _ => (6, 10),
            };
            format_currency_with(v, min_frac, max_frac)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a dollar amount rounded to `max_frac` digits, keeping at least
/// `min_frac` of them after trailing zeros are dropped
/// Returns "—" for NaN and infinities
pub fn format_currency_with(value: f64, min_frac: usize, max_frac: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}", sign, format_decimal(value.abs(), min_frac, max_frac))
}

/// Formats a dollar amount with K/M/B/T suffixes and at most one decimal
/// Returns "—" if the value is None
pub fn format_compact_currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{}${}", sign, compact_body(v.abs()))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a plain magnitude (supply, counts) with K/M/B/T suffixes
/// Returns "—" if the value is None
pub fn format_compact(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{}{}", sign, compact_body(v.abs()))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a percentage change with an explicit sign, e.g. `+2.10%`
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:+.2}%", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats supply as `circulating / total`, appending `/ max` for capped assets
pub fn format_supply(circulating: Option<f64>, total: Option<f64>, max: Option<f64>) -> String {
    let mut out = format!("{} / {}", format_compact(circulating), format_compact(total));
    if let Some(max) = max.filter(|m| *m > 0.0) {
        out.push_str(&format!(" / {}", format_compact(Some(max))));
    }
    out
}

/// Inserts comma separators into a run of integer digits
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    digits
        .chars()
        .enumerate()
        .fold(String::with_capacity(len + len / 3), |mut out, (i, c)| {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
            out
        })
}

fn format_decimal(abs: f64, min_frac: usize, max_frac: usize) -> String {
    let max_frac = max_frac.max(min_frac);
    let raw = format!("{:.*}", max_frac, abs);
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

    let keep = frac_part
        .trim_end_matches('0')
        .len()
        .max(min_frac)
        .min(frac_part.len());
    let frac = &frac_part[..keep];

    if frac.is_empty() {
        group_thousands(int_part)
    } else {
        format!("{}.{}", group_thousands(int_part), frac)
    }
}

fn compact_body(abs: f64) -> String {
    let mut exp = 0;
    while exp < COMPACT_SUFFIXES.len() - 1 && abs >= 1000f64.powi(exp as i32 + 1) {
        exp += 1;
    }

    let mut scaled = abs / 1000f64.powi(exp as i32);
    // 999.96K rounds to 1000.0K; promote it to 1M
    if (scaled * 10.0).round() / 10.0 >= 1000.0 && exp < COMPACT_SUFFIXES.len() - 1 {
        exp += 1;
        scaled = abs / 1000f64.powi(exp as i32);
    }

    let text = format!("{:.1}", scaled);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}{}", text, COMPACT_SUFFIXES[exp])
}
