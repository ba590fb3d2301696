use chrono::NaiveDate;

fn digit_runs(raw: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in raw.char_indices() {
        if c.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            runs.push(&raw[s..i]);
        }
    }
    if let Some(s) = start {
        runs.push(&raw[s..]);
    }
    runs
}

fn format_date(year: i32, month: u32, day: u32) -> Option<String> {
    // Gregorian round-trip validation: 2/30 and friends are rejected here
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Sentence dates must carry three numbers, read as year/month/day.
pub fn parse_sentence_date(raw: &str) -> Option<String> {
    let runs = digit_runs(raw);
    if runs.len() != 3 {
        return None;
    }
    let year: i32 = runs[0].parse().ok()?;
    let month: u32 = runs[1].parse().ok()?;
    let day: u32 = runs[2].parse().ok()?;
    format_date(year, month, day)
}

/// Vocabulary dates may omit the year. Two numbers are month/day with the
/// caller-supplied fallback year; with three numbers, the position of the
/// 4-digit run decides whether the order is y/m/d or m/d/y.
pub fn parse_vocab_date(raw: &str, fallback_year: i32) -> Option<String> {
    let runs = digit_runs(raw);
    match runs.len() {
        2 => {
            let month: u32 = runs[0].parse().ok()?;
            let day: u32 = runs[1].parse().ok()?;
            format_date(fallback_year, month, day)
        }
        3 => {
            if runs[0].len() == 4 {
                let year: i32 = runs[0].parse().ok()?;
                let month: u32 = runs[1].parse().ok()?;
                let day: u32 = runs[2].parse().ok()?;
                format_date(year, month, day)
            } else if runs[2].len() == 4 {
                let month: u32 = runs[0].parse().ok()?;
                let day: u32 = runs[1].parse().ok()?;
                let year: i32 = runs[2].parse().ok()?;
                format_date(year, month, day)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_dates_require_three_numbers() {
        assert_eq!(parse_sentence_date("2026-02-09"), Some("2026-02-09".to_string()));
        assert_eq!(parse_sentence_date("2026年2月9日"), Some("2026-02-09".to_string()));
        assert_eq!(parse_sentence_date("2026/2/9 around noon"), Some("2026-02-09".to_string()));
        assert_eq!(parse_sentence_date("2-9"), None);
        assert_eq!(parse_sentence_date("2026-02-09 10:30"), None); // five numbers
        assert_eq!(parse_sentence_date("no digits"), None);
    }

    #[test]
    fn invalid_calendar_dates_are_rejected() {
        assert_eq!(parse_sentence_date("2026-02-30"), None);
        assert_eq!(parse_sentence_date("2026-13-01"), None);
        assert_eq!(parse_vocab_date("2-30", 2026), None);
        // 2024 was a leap year, 2026 is not
        assert_eq!(parse_vocab_date("2-29-2024", 0), Some("2024-02-29".to_string()));
        assert_eq!(parse_vocab_date("2-29", 2026), None);
    }

    #[test]
    fn vocab_dates_use_fallback_year() {
        assert_eq!(parse_vocab_date("2-9", 2026), Some("2026-02-09".to_string()));
        assert_eq!(parse_vocab_date("12/31", 2025), Some("2025-12-31".to_string()));
    }

    #[test]
    fn four_digit_position_decides_order() {
        assert_eq!(parse_vocab_date("2026-2-9", 0), Some("2026-02-09".to_string()));
        assert_eq!(parse_vocab_date("2/9/2026", 0), Some("2026-02-09".to_string()));
        assert_eq!(parse_vocab_date("2-9-26", 2026), None);
    }
}
