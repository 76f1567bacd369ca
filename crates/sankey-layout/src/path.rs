//! Link path generation (`d3.sankeyLinkHorizontal`).

use crate::LinkLayout;
use std::fmt::Write as _;

/// Cubic horizontal link from the source node's right edge to the target node's left edge,
/// with both control points at the horizontal midpoint.
pub fn link_horizontal(link: &LinkLayout) -> String {
    let (sx, tx) = (link.source_x, link.target_x);
    let mx = (sx + tx) / 2.0;
    let mut out = String::new();
    out.push('M');
    fmt_path_into(&mut out, sx);
    out.push(',');
    fmt_path_into(&mut out, link.y0);
    out.push('C');
    for (i, v) in [mx, link.y0, mx, link.y1, tx, link.y1].into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        fmt_path_into(&mut out, v);
    }
    out
}

/// d3-path number formatting: at most 3 fractional digits, `Math.round(x * 1000) / 1000`.
pub fn fmt_path_into(out: &mut String, v: f64) {
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }

    let k = (v * 1000.0 + 0.5).floor() as i64;
    if k == 0 {
        out.push('0');
        return;
    }

    let neg = k.is_negative();
    let abs = k.unsigned_abs();
    let int_part = abs / 1000;
    let mut frac = abs % 1000;

    if neg {
        out.push('-');
    }
    let _ = write!(out, "{int_part}");
    if frac == 0 {
        return;
    }

    let mut width = 3;
    while frac % 10 == 0 {
        frac /= 10;
        width -= 1;
    }
    let _ = write!(out, ".{frac:0width$}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(v: f64) -> String {
        let mut out = String::new();
        fmt_path_into(&mut out, v);
        out
    }

    #[test]
    fn path_numbers_use_three_decimals() {
        assert_eq!(fmt(0.0), "0");
        assert_eq!(fmt(12.0), "12");
        assert_eq!(fmt(1.23456), "1.235");
        assert_eq!(fmt(0.1), "0.1");
        assert_eq!(fmt(-2.5), "-2.5");
        assert_eq!(fmt(0.0004), "0");
        assert_eq!(fmt(f64::NAN), "0");
    }

    #[test]
    fn link_path_is_a_horizontal_cubic() {
        let link = LinkLayout {
            index: 0,
            source: "a".into(),
            target: "b".into(),
            value: 1.0,
            width: 4.0,
            y0: 10.0,
            y1: 30.5,
            source_x: 20.0,
            target_x: 100.0,
        };
        assert_eq!(link_horizontal(&link), "M20,10C60,10,60,30.5,100,30.5");
    }
}
