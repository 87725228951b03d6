use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Single-column ellipsis appended to truncated cells.
const ELLIPSIS: char = '…';

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters count as two columns, combining marks as zero.
///
/// # Examples
///
/// ```
/// use trailfeed::util::display_width;
///
/// assert_eq!(display_width("City Walk"), 9);
/// assert_eq!(display_width("武功山"), 6);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fit `s` into exactly `width` terminal columns for table output.
///
/// Text that is too wide is cut at a character boundary and ends with `…`;
/// text that is too narrow is padded with spaces. A wide character that
/// would straddle the cut is dropped and replaced by padding, so the result
/// is always exactly `width` columns.
///
/// # Examples
///
/// ```
/// use trailfeed::util::fit_to_width;
///
/// assert_eq!(fit_to_width("4.5km", 7), "4.5km  ");
/// assert_eq!(fit_to_width("武功山云海徒步挑战", 9), "武功山云…");
/// ```
pub fn fit_to_width(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let full = display_width(s);
    if full <= width {
        let mut out = String::with_capacity(s.len() + (width - full));
        out.push_str(s);
        out.extend(std::iter::repeat(' ').take(width - full));
        return out;
    }

    // Leave one column for the ellipsis
    let budget = width - 1;
    let mut out = String::with_capacity(s.len());
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    used += 1;
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Flatten text for a single table row: control characters (including line
/// breaks and escape sequences' ESC byte) become nothing, tabs become spaces.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn sanitize_line(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .filter_map(|c| match c {
                '\t' => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_short_text() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("", 2), "  ");
    }

    #[test]
    fn test_fit_exact_width_is_unchanged() {
        assert_eq!(fit_to_width("abcde", 5), "abcde");
    }

    #[test]
    fn test_fit_truncates_with_ellipsis() {
        assert_eq!(fit_to_width("City Walk", 6), "City …");
        assert_eq!(display_width(&fit_to_width("City Walk", 6)), 6);
    }

    #[test]
    fn test_fit_wide_char_straddling_cut_is_padded() {
        // Budget of 3 columns fits one CJK char (2), the next would need 4
        let out = fit_to_width("徒步登山", 4);
        assert_eq!(out, "徒… ");
        assert_eq!(display_width(&out), 4);
    }

    #[test]
    fn test_fit_width_one() {
        assert_eq!(fit_to_width("long", 1), "…");
        assert_eq!(fit_to_width("x", 1), "x");
    }

    #[test]
    fn test_fit_zero_width() {
        assert_eq!(fit_to_width("anything", 0), "");
    }

    #[test]
    fn test_fit_always_exact_width() {
        let samples = ["", "a", "京都深处的秘密茶室徒步", "Hi 🎉 there", "e\u{301}tude"];
        for s in samples {
            for width in 1..16 {
                assert_eq!(display_width(&fit_to_width(s, width)), width, "{s:?} @ {width}");
            }
        }
    }

    #[test]
    fn test_sanitize_line_borrows_clean_text() {
        assert!(matches!(sanitize_line("厦门：海岸线漫步"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_sanitize_line_strips_controls() {
        assert_eq!(sanitize_line("a\nb\tc\x1b[31m"), "ab c[31m");
    }
}
