/// Compact rank for display: lakhs with two decimals from 1,00,000,
/// thousands with one decimal from 1,000, the plain number below that.
pub fn format_rank(rank: u32) -> String {
    if rank >= 100_000 {
        format!("{:.2}L", f64::from(rank) / 100_000.0)
    } else if rank >= 1_000 {
        format!("{:.1}K", f64::from(rank) / 1_000.0)
    } else {
        rank.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lakhs_thousands_and_small_ranks() {
        assert_eq!(format_rank(125_000), "1.25L");
        assert_eq!(format_rank(1_400_000), "14.00L");
        assert_eq!(format_rank(3_400), "3.4K");
        assert_eq!(format_rank(1_000), "1.0K");
        assert_eq!(format_rank(999), "999");
        assert_eq!(format_rank(1), "1");
    }
}
