use super::*;

#[test]
fn roster_heading_counts_users() {
    assert_eq!(roster_heading(0), "Online Users (0)");
    assert_eq!(roster_heading(3), "Online Users (3)");
}
