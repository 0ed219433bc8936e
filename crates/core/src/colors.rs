//! Per-application node colors for module-granularity diagrams.

use crate::graph::NodeColors;

const CHAR_FACTOR: u64 = 0x75_4321;
const CEILING: u64 = 0xff_ffff;
const FONT_PIVOT: i64 = 0x7f_ffff;

/// Derive the fill and font colors for an application.
///
/// Pure function of the name: every module of `app` gets the same pair, in
/// every run.
pub fn app_colors(app: &str) -> NodeColors {
    let sum: u64 = app
        .chars()
        .map(|ch| u64::from(ch) * CHAR_FACTOR)
        .fold(0u64, u64::wrapping_add);
    let fill = sum % CEILING;
    let font = (fill as i64 - FONT_PIVOT).unsigned_abs();

    NodeColors {
        fill: format!("#{:06x}", fill),
        font: format!("#{:06x}", font),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_colors() {
        assert_eq!(app_colors("shop"), app_colors("shop"));
    }

    #[test]
    fn test_known_value() {
        let expected_fill = (97u64 * 0x754321) % 0xffffff;
        let colors = app_colors("a");
        assert_eq!(colors.fill, format!("#{:06x}", expected_fill));

        let expected_font = (expected_fill as i64 - 0x7fffff).unsigned_abs();
        assert_eq!(colors.font, format!("#{:06x}", expected_font));
    }

    #[test]
    fn test_colors_are_hex_triplets() {
        for app in ["blog", "shop", "shop.payments", "accounts", ""] {
            let colors = app_colors(app);
            for color in [&colors.fill, &colors.font] {
                assert_eq!(color.len(), 7, "{} -> {}", app, color);
                assert!(color.starts_with('#'));
                assert!(u32::from_str_radix(&color[1..], 16).is_ok());
            }
        }
    }

    #[test]
    fn test_empty_name() {
        let colors = app_colors("");
        assert_eq!(colors.fill, "#000000");
        assert_eq!(colors.font, "#7fffff");
    }

    #[test]
    fn test_anagrams_collide() {
        // The hash is a plain character sum.
        assert_eq!(app_colors("blog"), app_colors("glob"));
    }
}
