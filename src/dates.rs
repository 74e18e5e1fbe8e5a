/// Normalise a race date to `YYYY-MM-DD`.
///
/// Accepts `DD.MM.YYYY`, a multi-day range `DD.-DD.MM.YYYY` (only the first
/// day is kept) and an already canonical `YYYY-MM-DD`. Dashes of any width
/// are treated as a plain hyphen.
///
/// Only the shape is checked: month 1-12, day 1-31. Whether the day exists
/// in that month is left to the database.
pub fn normalize_date(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| if matches!(c, '\u{2013}' | '\u{2014}') { '-' } else { c })
        .collect();
    let cleaned = cleaned.trim();

    let date = parse_dotted(cleaned)
        .or_else(|| parse_dotted_range(cleaned))
        .or_else(|| parse_iso(cleaned))?;

    Some(date.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShapeDate {
    year: u32,
    month: u32,
    day: u32,
}

impl ShapeDate {
    fn new(year: u32, month: u32, day: u32) -> Option<Self> {
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { year, month, day })
    }
}

impl std::fmt::Display for ShapeDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// `DD.MM.YYYY`, day and month one or two digits.
fn parse_dotted(s: &str) -> Option<ShapeDate> {
    let mut parts = s.split('.');
    let day = digits(parts.next()?, 1, 2)?;
    let month = digits(parts.next()?, 1, 2)?;
    let year = digits(parts.next()?, 4, 4)?;
    if parts.next().is_some() {
        return None;
    }
    ShapeDate::new(year, month, day)
}

/// `DD.-DD.MM.YYYY`: the first day combined with the trailing month and year.
fn parse_dotted_range(s: &str) -> Option<ShapeDate> {
    let (first, rest) = s.split_once('-')?;
    let first_day = digits(first.trim().strip_suffix('.')?, 1, 2)?;

    let end = parse_dotted(rest.trim())?;
    ShapeDate::new(end.year, end.month, first_day)
}

fn parse_iso(s: &str) -> Option<ShapeDate> {
    let mut parts = s.split('-');
    let year = digits(parts.next()?, 4, 4)?;
    let month = digits(parts.next()?, 2, 2)?;
    let day = digits(parts.next()?, 2, 2)?;
    if parts.next().is_some() {
        return None;
    }
    ShapeDate::new(year, month, day)
}

fn digits(s: &str, min: usize, max: usize) -> Option<u32> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
