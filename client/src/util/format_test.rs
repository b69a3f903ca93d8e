use super::*;

#[test]
fn file_size_uses_one_decimal_kilobytes() {
    assert_eq!(file_size(0), "0.0 KB");
    assert_eq!(file_size(1024), "1.0 KB");
    assert_eq!(file_size(1536), "1.5 KB");
}

#[test]
fn clock_time_formats_in_given_zone() {
    let ts = DateTime::from_timestamp(1_714_558_830, 0);
    assert_eq!(clock_time(ts, &Utc), "10:20");
    let plus_two = chrono::FixedOffset::east_opt(2 * 3600).expect("offset");
    assert_eq!(clock_time(ts, &plus_two), "12:20");
    assert_eq!(clock_time(None, &Utc), "");
}

#[test]
fn member_since_falls_back_to_unknown() {
    assert_eq!(member_since(NaiveDate::from_ymd_opt(2024, 1, 5)), "Jan 5, 2024");
    assert_eq!(member_since(None), "Unknown");
}

#[test]
fn amount_renders_minor_units() {
    assert_eq!(amount(100, "INR"), "INR 1.00");
    assert_eq!(amount(49_905, "USD"), "USD 499.05");
    assert_eq!(amount(5, ""), "INR 0.05");
}
