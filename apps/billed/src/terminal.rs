//! Terminal rendition of the Billed pages.

use std::sync::{Mutex, MutexGuard};

use client_core::{
    bills::MISSING_RECEIPT_TEXT,
    view::{BillRow, BillsView, NewBillForm, NewBillView, Page, ReceiptPreview, RenderState, ViewHandle},
    NavIcon,
};
use comfy_table::{Attribute, Cell, Color, Table};
use shared::domain::BillStatus;
use tracing::debug;

#[derive(Default)]
struct Screen {
    page: Option<Page>,
    rows: Vec<BillRow>,
    error: Option<String>,
}

/// Prints every page to stdout. Form values are fixed up front from the
/// command line since there is nothing to type into.
#[derive(Default)]
pub struct TerminalView {
    form: Mutex<NewBillForm>,
    screen: Mutex<Screen>,
}

impl TerminalView {
    pub fn with_form(form: NewBillForm) -> Self {
        Self {
            form: Mutex::new(form),
            screen: Mutex::default(),
        }
    }

    /// Rows of the last rendered bill table.
    pub fn rows(&self) -> Vec<BillRow> {
        self.screen().rows.clone()
    }

    pub fn page(&self) -> Option<Page> {
        self.screen().page
    }

    /// Last error shown on the current page.
    pub fn error(&self) -> Option<String> {
        self.screen().error.clone()
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn bills_table(rows: &[BillRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Type"),
        Cell::new("Nom"),
        Cell::new("Date"),
        Cell::new("Montant"),
        Cell::new("Statut"),
    ]);
    for (index, row) in rows.iter().enumerate() {
        let status = Cell::new(row.status_label);
        let status = match row.bill.status {
            BillStatus::Accepted => status.fg(Color::Green),
            BillStatus::Refused => status.fg(Color::Red),
            BillStatus::Pending => status,
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&row.bill.expense_type),
            Cell::new(&row.bill.name),
            Cell::new(&row.display_date),
            Cell::new(format!("{} €", row.bill.amount)),
            status,
        ]);
    }
    table
}

impl ViewHandle for TerminalView {
    fn mount(&self, page: Page) {
        {
            let mut screen = self.screen();
            *screen = Screen {
                page: Some(page),
                ..Screen::default()
            };
        }
        let mut heading = Table::new();
        heading.add_row(vec![Cell::new(page.heading()).add_attribute(Attribute::Bold)]);
        println!("{heading}");
    }

    fn set_active_icon(&self, icon: Option<NavIcon>) {
        if let Some(icon) = icon {
            debug!(icon = icon.test_id(), "active icon");
        }
    }
}

impl BillsView for TerminalView {
    fn render_bills(&self, state: &RenderState) {
        match state {
            RenderState::Loading => println!("Loading..."),
            RenderState::Error(message) => {
                self.screen().error = Some(message.clone());
                eprintln!("Erreur\n{message}");
            }
            RenderState::Data(rows) => {
                self.screen().rows = rows.clone();
                if rows.is_empty() {
                    println!("Aucune note de frais.");
                } else {
                    println!("{}", bills_table(rows));
                }
            }
        }
    }

    fn show_receipt_modal(&self, preview: &ReceiptPreview) {
        match &preview.image_url {
            Some(url) => println!("Justificatif ({}px): {url}", preview.width),
            None => println!("{MISSING_RECEIPT_TEXT}"),
        }
    }
}

impl NewBillView for TerminalView {
    fn form_values(&self) -> NewBillForm {
        self.form
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn clear_file_input(&self) {
        debug!("receipt selection cleared");
    }

    fn show_submission_error(&self, message: &str) {
        self.screen().error = Some(message.to_string());
        eprintln!("Erreur\n{message}");
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
