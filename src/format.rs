use chrono::Month;

pub const NO_DATA: &str = "—";

/// en-US grouping: `1,234`.
pub fn format_integer(value: f64) -> String {
    let rounded = value.round();
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    group_thousands(&format!("{rounded:.0}"))
}

pub fn format_one_decimal(value: f64) -> String {
    let text = format!("{value:.1}");
    let text = if text == "-0.0" { "0.0".to_string() } else { text };
    match text.split_once('.') {
        Some((whole, fraction)) => format!("{}.{}", group_thousands(whole), fraction),
        None => group_thousands(&text),
    }
}

pub fn format_percent(ratio: f64) -> String {
    format!("{}%", format_one_decimal(ratio * 100.0))
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

fn month_name(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok()?;
    Month::try_from(month).ok().map(|m| m.name())
}

/// Short month name ("Jan"); out-of-range months fall back to the number.
pub fn month_label(month: u32) -> String {
    month_name(month)
        .map(|name| name[..3].to_string())
        .unwrap_or_else(|| month.to_string())
}

pub fn month_year_label(year: i32, month: u32) -> String {
    match month_name(month) {
        Some(name) => format!("{name} {year}"),
        None => format!("{month}/{year}"),
    }
}

/// The current year and the three before it, newest first.
pub fn selectable_years(current_year: i32) -> Vec<i32> {
    (0..4).map(|offset| current_year - offset).collect()
}
