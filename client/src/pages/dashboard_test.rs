use super::*;

#[test]
fn profile_update_trims_and_rejects_blank_names() {
    assert_eq!(profile_update("  Ann  "), Ok(UpdateProfileRequest { name: "Ann".to_owned() }));
    assert_eq!(profile_update("   "), Err("Name is required"));
}

#[test]
fn payment_row_label_shows_amount_status_and_date() {
    let record = PaymentRecord {
        order_id: "order_1".to_owned(),
        amount: 100,
        currency: "INR".to_owned(),
        status: "completed".to_owned(),
        created_at: Some("2024-05-01T10:20:30.000Z".to_owned()),
    };
    assert_eq!(payment_row_label(&record), "INR 1.00 · completed · 2024-05-01");
}

#[test]
fn payment_row_label_omits_missing_date() {
    let record = PaymentRecord { amount: 2500, status: "created".to_owned(), ..PaymentRecord::default() };
    assert_eq!(payment_row_label(&record), "INR 25.00 · created");
}
