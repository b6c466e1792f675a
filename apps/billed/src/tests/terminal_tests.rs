use super::*;
use shared::domain::{Bill, BillId};

fn row(name: &str, date: &str, status: BillStatus) -> BillRow {
    BillRow::from_bill(Bill {
        id: BillId::new(name),
        expense_type: "Restaurants et bars".into(),
        name: name.into(),
        amount: 42.5,
        date: date.into(),
        vat: None,
        pct: 20,
        commentary: None,
        file_url: None,
        file_name: None,
        status,
        email: None,
        comment_admin: None,
    })
}

#[test]
fn table_shows_french_dates_and_labels() {
    let rendered = bills_table(&[
        row("déjeuner", "2004-04-04", BillStatus::Pending),
        row("dîner", "2003-03-03", BillStatus::Refused),
    ])
    .to_string();

    assert!(rendered.contains("4 Avr. 04"), "{rendered}");
    assert!(rendered.contains("En attente"), "{rendered}");
    assert!(rendered.contains("Refusé"), "{rendered}");
    assert!(rendered.contains("42.5 €"), "{rendered}");
}

#[test]
fn mount_resets_previous_page_state() {
    let view = TerminalView::default();
    view.mount(Page::Bills);
    view.render_bills(&RenderState::Data(vec![row(
        "taxi",
        "2001-01-01",
        BillStatus::Accepted,
    )]));
    view.render_bills(&RenderState::Error("Erreur 500".into()));
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.error().as_deref(), Some("Erreur 500"));

    view.mount(Page::NewBill);
    assert_eq!(view.page(), Some(Page::NewBill));
    assert!(view.rows().is_empty());
    assert_eq!(view.error(), None);
}

#[test]
fn preset_form_is_returned_as_is() {
    let form = NewBillForm {
        expense_type: "Transports".into(),
        amount: "12,5".into(),
        ..NewBillForm::default()
    };
    let view = TerminalView::with_form(form.clone());
    assert_eq!(view.form_values(), form);
}
