use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number regex must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

/// Leading decimal number of a cell, so `64%` reads as 64 and `1.2Gi` as 1.2.
pub fn leading_number(cell: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(cell.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Sorts rows by `column`; numeric when both cells are numbers, otherwise
/// lexicographic. Ties keep their original order. Missing cells sort as "".
pub fn sort_rows(rows: &mut [Vec<String>], column: usize, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let left = a.get(column).map(String::as_str).unwrap_or("");
        let right = b.get(column).map(String::as_str).unwrap_or("");
        let ordering = compare_cells(left, right);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[(&str, &str)]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|(a, b)| vec![a.to_string(), b.to_string()])
            .collect()
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("64%"), Some(64.0));
        assert_eq!(leading_number(" 1.5Gi"), Some(1.5));
        assert_eq!(leading_number("-3"), Some(-3.0));
        assert_eq!(leading_number("root"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_numeric_sort_not_lexicographic() {
        let mut data = rows(&[("a", "10"), ("b", "9"), ("c", "100")]);
        sort_rows(&mut data, 1, SortDirection::Ascending);
        let order: Vec<&str> = data.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_descending_is_stable_for_ties() {
        let mut data = rows(&[("first", "5"), ("second", "7"), ("third", "5")]);
        sort_rows(&mut data, 1, SortDirection::Descending);
        let order: Vec<&str> = data.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["second", "first", "third"]);
    }

    #[test]
    fn test_lexicographic_fallback() {
        let mut data = rows(&[("redis", "x"), ("nginx", "y"), ("postgres", "z")]);
        sort_rows(&mut data, 0, SortDirection::Ascending);
        let order: Vec<&str> = data.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["nginx", "postgres", "redis"]);
    }

    #[test]
    fn test_out_of_range_column_keeps_order() {
        let mut data = rows(&[("b", "1"), ("a", "2")]);
        sort_rows(&mut data, 7, SortDirection::Ascending);
        assert_eq!(data[0][0], "b");
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
