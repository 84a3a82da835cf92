//! Millisecond <-> `MM:SS.mmm` / `MM:SS.cc` conversions (component A).

/// Render `ms` as `MM:SS.mmm` (digits=3) or `MM:SS.cc` (digits=2). Negative
/// values clamp to zero. Minutes are zero-padded to at least 2 digits but are
/// not themselves bounded to 99.
pub fn ms_to_formatted(ms: i64, digits: u8) -> String {
    let ms = ms.max(0);
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let millis = ms % 1000;
    match digits {
        2 => {
            let centis = millis / 10;
            format!("{minutes:02}:{seconds:02}.{centis:02}")
        }
        _ => format!("{minutes:02}:{seconds:02}.{millis:03}"),
    }
}

/// Parse a `(minutes, seconds, fractional)` triple back to milliseconds. A
/// 2-digit fractional field is centiseconds (`*10`); anything else is taken
/// as literal milliseconds.
pub fn formatted_to_ms(minutes: i64, seconds: i64, frac: &str) -> i64 {
    let frac_ms: i64 = if frac.len() == 2 {
        frac.parse::<i64>().unwrap_or(0) * 10
    } else {
        frac.parse::<i64>().unwrap_or(0)
    };
    (minutes * 60 + seconds) * 1000 + frac_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_three_digit_milliseconds() {
        assert_eq!(ms_to_formatted(61_234, 3), "01:01.234");
    }

    #[test]
    fn formats_two_digit_centiseconds() {
        assert_eq!(ms_to_formatted(61_239, 2), "01:01.23");
    }

    #[test]
    fn clamps_negative_to_zero() {
        assert_eq!(ms_to_formatted(-500, 3), "00:00.000");
    }

    #[test]
    fn minutes_can_exceed_99() {
        assert_eq!(ms_to_formatted(100 * 60 * 1000, 3), "100:00.000");
    }

    #[test]
    fn round_trip_three_digit_is_identity() {
        let ms = 543_210;
        let formatted = ms_to_formatted(ms, 3);
        let (m, s, f) = split(&formatted);
        assert_eq!(formatted_to_ms(m, s, f), ms);
    }

    #[test]
    fn two_digit_round_trip_rounds_down_to_10ms() {
        let ms = 61_239;
        let formatted = ms_to_formatted(ms, 2);
        let (m, s, f) = split(&formatted);
        assert_eq!(formatted_to_ms(m, s, f), 61_230);
    }

    fn split(formatted: &str) -> (i64, i64, &str) {
        let (mm, rest) = formatted.split_once(':').unwrap();
        let (ss, frac) = rest.split_once('.').unwrap();
        (mm.parse().unwrap(), ss.parse().unwrap(), frac)
    }
}
