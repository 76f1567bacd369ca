//! Number formatting services.
//!
//! The builder and the tooltip only depend on [`FormatterFactory`] and [`ValueFormatter`];
//! [`DefaultFormatterFactory`] is a locale-neutral (en-US separators) implementation that
//! understands the common Excel/.NET numeric pattern subset carried in column metadata.

use std::fmt::Write as _;

pub trait ValueFormatter {
    fn format(&self, value: f64) -> String;
}

/// Creates formatters from a column format hint and a reference magnitude (typically the
/// largest value that will be formatted).
pub trait FormatterFactory {
    fn create(&self, format: Option<&str>, value: f64) -> Box<dyn ValueFormatter>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatterFactory;

impl FormatterFactory for DefaultFormatterFactory {
    fn create(&self, format: Option<&str>, value: f64) -> Box<dyn ValueFormatter> {
        match format.map(str::trim).filter(|f| !is_general(f)) {
            Some(pattern) => Box::new(PatternFormatter::parse(pattern)),
            None => Box::new(DisplayUnitFormatter::for_magnitude(value)),
        }
    }
}

fn is_general(format: &str) -> bool {
    format.is_empty() || format.eq_ignore_ascii_case("general") || format.eq_ignore_ascii_case("g")
}

/// d3 `format(",.2f")`: grouped thousands, exactly two decimals.
pub fn format_fallback(value: f64) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    let mut out = String::new();
    if value < 0.0 && value.abs() >= 0.005 {
        // d3-format uses U+2212 for the minus sign.
        out.push('\u{2212}');
    }
    push_fixed(&mut out, value.abs(), 2, 2, true);
    out
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Writes `value` (non-negative) with `max_decimals` digits, trimming trailing zeros down to
/// `min_decimals`.
fn push_fixed(out: &mut String, value: f64, min_decimals: usize, max_decimals: usize, group: bool) {
    let mut digits = String::new();
    let _ = write!(&mut digits, "{:.*}", max_decimals, value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits.as_str(), ""),
    };

    if group {
        push_grouped(out, int_part);
    } else {
        out.push_str(int_part);
    }

    let mut frac = frac_part.to_string();
    while frac.len() > min_decimals && frac.ends_with('0') {
        frac.pop();
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
}

fn push_grouped(out: &mut String, int_part: &str) {
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayUnit {
    None,
    Thousands,
    Millions,
    Billions,
    Trillions,
}

impl DisplayUnit {
    fn for_magnitude(value: f64) -> Self {
        let v = value.abs();
        if !v.is_finite() || v < 1e4 {
            Self::None
        } else if v < 1e6 {
            Self::Thousands
        } else if v < 1e9 {
            Self::Millions
        } else if v < 1e12 {
            Self::Billions
        } else {
            Self::Trillions
        }
    }

    fn divisor(self) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Thousands => 1e3,
            Self::Millions => 1e6,
            Self::Billions => 1e9,
            Self::Trillions => 1e12,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Thousands => "K",
            Self::Millions => "M",
            Self::Billions => "bn",
            Self::Trillions => "T",
        }
    }
}

/// General formatting: display units chosen once from the reference magnitude, up to two
/// decimals.
#[derive(Debug, Clone, Copy)]
pub struct DisplayUnitFormatter {
    unit: DisplayUnit,
}

impl DisplayUnitFormatter {
    pub fn for_magnitude(value: f64) -> Self {
        Self {
            unit: DisplayUnit::for_magnitude(value),
        }
    }
}

impl ValueFormatter for DisplayUnitFormatter {
    fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return non_finite(value);
        }
        let scaled = value / self.unit.divisor();
        let mut out = String::new();
        if scaled < 0.0 && scaled.abs() >= 0.005 {
            out.push('-');
        }
        push_fixed(&mut out, scaled.abs(), 0, 2, true);
        out.push_str(self.unit.suffix());
        out
    }
}

/// A single-section numeric pattern such as `$#,0.00`, `0.0%` or `#,0 "units"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFormatter {
    prefix: String,
    suffix: String,
    grouping: bool,
    min_decimals: usize,
    max_decimals: usize,
    percent: bool,
}

impl PatternFormatter {
    pub fn parse(pattern: &str) -> Self {
        // Only the positive section is honored; negatives reuse it with a leading sign.
        let section = pattern.split(';').next().unwrap_or_default();

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut grouping = false;
        let mut min_decimals = 0;
        let mut max_decimals = 0;
        let mut percent = false;

        #[derive(PartialEq)]
        enum Part {
            Prefix,
            Integer,
            Fraction,
            Suffix,
        }
        let mut part = Part::Prefix;
        let mut chars = section.chars().peekable();
        while let Some(ch) = chars.next() {
            let literal = match ch {
                '"' => {
                    let mut lit = String::new();
                    for c in chars.by_ref() {
                        if c == '"' {
                            break;
                        }
                        lit.push(c);
                    }
                    Some(lit)
                }
                '\\' => chars.next().map(|c| c.to_string()),
                '#' | '0' if part == Part::Prefix || part == Part::Integer => {
                    part = Part::Integer;
                    None
                }
                ',' if part == Part::Integer => {
                    grouping = true;
                    None
                }
                '.' if part == Part::Integer
                    || (part == Part::Prefix
                        && chars.peek().is_some_and(|c| *c == '0' || *c == '#')) =>
                {
                    part = Part::Fraction;
                    None
                }
                '0' if part == Part::Fraction => {
                    min_decimals += 1;
                    max_decimals += 1;
                    None
                }
                '#' if part == Part::Fraction => {
                    max_decimals += 1;
                    None
                }
                '%' => {
                    percent = true;
                    Some("%".to_string())
                }
                other => Some(other.to_string()),
            };

            if let Some(lit) = literal {
                if part == Part::Prefix {
                    prefix.push_str(&lit);
                } else {
                    part = Part::Suffix;
                    suffix.push_str(&lit);
                }
            }
        }

        Self {
            prefix,
            suffix,
            grouping,
            min_decimals,
            max_decimals,
            percent,
        }
    }
}

impl ValueFormatter for PatternFormatter {
    fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return non_finite(value);
        }
        let v = if self.percent { value * 100.0 } else { value };
        let threshold = 0.5 * 10f64.powi(-(self.max_decimals as i32));
        let mut out = String::new();
        if v < 0.0 && v.abs() >= threshold {
            out.push('-');
        }
        out.push_str(&self.prefix);
        push_fixed(
            &mut out,
            v.abs(),
            self.min_decimals,
            self.max_decimals,
            self.grouping,
        );
        out.push_str(&self.suffix);
        out
    }
}
