use crate::models::Value;

/// Format an amount the way Uruguayan statements print it: 1.234,56
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative && abs >= 0.005 {
        format!("-{grouped},{dec_part}")
    } else {
        format!("{grouped},{dec_part}")
    }
}

/// Terminal rendering of a table cell: day-first dates, locale amounts.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => s.clone(),
        Value::Number(n) => amount(*n),
        Value::Date(d) => d.format("%d/%m/%Y").to_string(),
        Value::Bool(true) => "Sí".to_string(),
        Value::Bool(false) => "No".to_string(),
    }
}

pub fn percent(val: f64) -> String {
    format!("{}%", format!("{val:.1}").replace('.', ","))
}
