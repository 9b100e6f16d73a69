use retro::size::{format, parse};

#[test]
fn parse_accepts_listing_spellings() {
    assert_eq!(parse("512B"), 512);
    assert_eq!(parse("1.5K"), 1536);
    assert_eq!(parse("2GiB"), 2 * 1024 * 1024 * 1024);
    assert_eq!(parse("2.0MiB"), 2 * 1024 * 1024);
    assert_eq!(parse("3GB"), 3 * 1024 * 1024 * 1024);
    assert_eq!(parse("1.2 gib"), (1.2 * (1u64 << 30) as f64) as u64);
    assert_eq!(parse("4096"), 4096);
}

#[test]
fn parse_is_permissive() {
    assert_eq!(parse(""), 0);
    assert_eq!(parse("-"), 0);
    assert_eq!(parse("-5K"), 0);
    assert_eq!(parse("big"), 0);
    assert_eq!(parse("K"), 0);
}

#[test]
fn format_uses_binary_units() {
    assert_eq!(format(0), "0.00B");
    assert_eq!(format(1023), "1023.00B");
    assert_eq!(format(1536), "1.50KiB");
    assert_eq!(format(3 * 1024 * 1024 * 1024), "3.00GiB");
    assert_eq!(format(2048 * (1u64 << 40)), "2048.00TiB");
}

#[test]
fn formatted_sizes_parse_back() {
    for bytes in [0, 1, 999, 1536, 5_000_000, 7 * (1u64 << 30) + 12345, 3 * (1u64 << 40)] {
        let parsed = parse(&format(bytes));
        let tolerance = (bytes / 100).max(1);
        assert!(
            parsed.abs_diff(bytes) <= tolerance,
            "{bytes} formatted as {} parsed back as {parsed}",
            format(bytes)
        );
    }
}
