//! The filter registry type and the built-in filters.
//!
//! A filter is a pure function from a value plus evaluated arguments to a
//! new value. Returning `Err` aborts the render (it means the filter
//! itself is defective, not that data was missing); the built-ins below
//! are total and never do.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};

use crate::value::Value;

pub type FilterResult = std::result::Result<Value, String>;

/// Shared so a compiled template can hold a snapshot of the registry it
/// was compiled with while the engine's own registry keeps evolving.
pub type FilterFn = Arc<dyn Fn(&Value, &[Value]) -> FilterResult + Send + Sync>;

/// The default registry: `upper`, `lower`, `truncate`, `formatDate`,
/// `formatUSD`.
pub fn defaults() -> HashMap<String, FilterFn> {
    let mut map: HashMap<String, FilterFn> = HashMap::new();
    map.insert("upper".into(), Arc::new(upper));
    map.insert("lower".into(), Arc::new(lower));
    map.insert("truncate".into(), Arc::new(truncate));
    map.insert("formatDate".into(), Arc::new(format_date));
    map.insert("formatUSD".into(), Arc::new(format_usd));
    map
}

fn upper(value: &Value, _args: &[Value]) -> FilterResult {
    Ok(Value::String(value.to_string().to_uppercase()))
}

fn lower(value: &Value, _args: &[Value]) -> FilterResult {
    Ok(Value::String(value.to_string().to_lowercase()))
}

/// Cut to at most N characters (default 50), appending `…` when anything
/// was removed.
fn truncate(value: &Value, args: &[Value]) -> FilterResult {
    let limit = args
        .first()
        .and_then(Value::as_number)
        .filter(|n| *n >= 0.0)
        .map_or(50, |n| n as usize);

    let s = value.to_string();
    if s.chars().count() > limit {
        let cut: String = s.chars().take(limit).collect();
        Ok(Value::String(cut + "…"))
    } else {
        Ok(Value::String(s))
    }
}

/// Render an RFC 3339 timestamp or `YYYY-MM-DD` date as `Mon D, YYYY`.
/// Unparseable input passes through unchanged. A locale argument is
/// accepted for compatibility and ignored; month names are English.
fn format_date(value: &Value, _args: &[Value]) -> FilterResult {
    let Value::String(s) = value else {
        return Ok(value.clone());
    };

    let date = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"));

    match date {
        Ok(d) => Ok(Value::String(d.format("%b %-d, %Y").to_string())),
        Err(_) => Ok(value.clone()),
    }
}

/// Format a number as US dollars: `$1,234.56`. Non-numeric input passes
/// through unchanged.
fn format_usd(value: &Value, _args: &[Value]) -> FilterResult {
    let Some(n) = value.as_number() else {
        return Ok(value.clone());
    };
    if !n.is_finite() {
        return Ok(value.clone());
    }

    let negative = n < 0.0;
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').expect("{:.2} always has a dot");

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    Ok(Value::String(format!("{sign}${grouped}.{frac_part}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_and_lower() {
        assert_eq!(
            upper(&Value::String("ada".into()), &[]).unwrap(),
            Value::String("ADA".into())
        );
        assert_eq!(
            lower(&Value::String("ADA".into()), &[]).unwrap(),
            Value::String("ada".into())
        );
        // Null stringifies to empty before casing.
        assert_eq!(upper(&Value::Null, &[]).unwrap(), Value::String("".into()));
    }

    #[test]
    fn truncate_respects_limit_and_default() {
        let long = Value::String("x".repeat(60));
        let Value::String(s) = truncate(&long, &[]).unwrap() else {
            panic!("expected string");
        };
        assert_eq!(s.chars().count(), 51); // 50 kept + ellipsis
        assert!(s.ends_with('…'));

        assert_eq!(
            truncate(&Value::String("hello".into()), &[Value::Number(3.0)]).unwrap(),
            Value::String("hel…".into())
        );
        assert_eq!(
            truncate(&Value::String("hi".into()), &[Value::Number(10.0)]).unwrap(),
            Value::String("hi".into())
        );
    }

    #[test]
    fn format_date_parses_common_shapes() {
        assert_eq!(
            format_date(&Value::String("2024-01-05".into()), &[]).unwrap(),
            Value::String("Jan 5, 2024".into())
        );
        assert_eq!(
            format_date(&Value::String("2024-12-31T08:30:00Z".into()), &[]).unwrap(),
            Value::String("Dec 31, 2024".into())
        );
        // Garbage passes through.
        assert_eq!(
            format_date(&Value::String("soon".into()), &[]).unwrap(),
            Value::String("soon".into())
        );
    }

    #[test]
    fn format_usd_groups_thousands() {
        assert_eq!(
            format_usd(&Value::Number(1234567.891), &[]).unwrap(),
            Value::String("$1,234,567.89".into())
        );
        assert_eq!(
            format_usd(&Value::Number(5.0), &[]).unwrap(),
            Value::String("$5.00".into())
        );
        assert_eq!(
            format_usd(&Value::Number(-42.5), &[]).unwrap(),
            Value::String("-$42.50".into())
        );
        assert_eq!(
            format_usd(&Value::String("n/a".into()), &[]).unwrap(),
            Value::String("n/a".into())
        );
    }
}
