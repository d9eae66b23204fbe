use chrono::NaiveDate;

/// Rounds to `places` decimal places, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    // `+ 0.0` folds a negative zero into zero.
    (value * factor).round() / factor + 0.0
}

/// Finds the first `YYYY-MM-DD` date embedded anywhere in `text`.
pub fn find_iso_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    (0..=bytes.len() - 10).find_map(|start| {
        let window = &bytes[start..start + 10];
        let shaped = window.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shaped {
            return None;
        }
        // The window is pure ASCII, so this slice is on char boundaries.
        NaiveDate::parse_from_str(&text[start..start + 10], "%Y-%m-%d").ok()
    })
}

/// `2024년 5월 1일` style label used in alert titles.
pub fn korean_date_label(date: NaiveDate) -> String {
    date.format("%Y년 %-m월 %-d일").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_three_places() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.0004, 3), 0.0);
        assert_eq!(round_to(0.6, 3), 0.6);
    }

    #[test]
    fn test_find_iso_date_embedded() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(find_iso_date("2024-05-01 23:00:00"), expected);
        assert_eq!(find_iso_date("측정일 2024-05-01(수)"), expected);
        assert_eq!(find_iso_date("05/01/2024"), None);
        assert_eq!(find_iso_date("2024-13-01"), None);
        assert_eq!(find_iso_date(""), None);
    }

    #[test]
    fn test_korean_date_label_drops_leading_zeros() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(korean_date_label(date), "2024년 5월 1일");
    }
}
