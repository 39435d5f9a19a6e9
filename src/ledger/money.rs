/// Requests carry whole major units; lines store minor units (cents).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

pub fn to_minor_units(major: i64) -> Option<i64> {
    major.checked_mul(MINOR_UNITS_PER_MAJOR)
}

/// Renders minor units as a major-unit decimal string, e.g. `20000` -> `"200.00"`.
pub fn format_major_units(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let per = MINOR_UNITS_PER_MAJOR as u64;
    format!("{sign}{}.{:02}", abs / per, abs % per)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_major_to_minor() {
        assert_eq!(to_minor_units(200), Some(20_000));
        assert_eq!(to_minor_units(1458), Some(145_800));
        assert_eq!(to_minor_units(i64::MAX), None);
    }

    #[test]
    fn formats_minor_as_major() {
        assert_eq!(format_major_units(0), "0.00");
        assert_eq!(format_major_units(1458), "14.58");
        assert_eq!(format_major_units(20_000), "200.00");
        assert_eq!(format_major_units(-150), "-1.50");
        assert_eq!(format_major_units(-5), "-0.05");
        assert_eq!(format_major_units(i64::MIN), "-92233720368547758.08");
    }
}
