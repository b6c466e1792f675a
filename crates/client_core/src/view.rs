//! Capabilities controllers use to reach the screen. Implementations decide
//! how a state is drawn; controllers only decide which state to hand over.

use shared::domain::Bill;
use tracing::warn;

use crate::{format::format_date, navigation::NavIcon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Bills,
    NewBill,
    Dashboard,
}

impl Page {
    pub fn heading(self) -> &'static str {
        match self {
            Page::Login => "Billed",
            Page::Bills => "Mes notes de frais",
            Page::NewBill => "Envoyer une note de frais",
            Page::Dashboard => "Validations",
        }
    }
}

/// One line of the employee's bill table.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRow {
    pub bill: Bill,
    pub display_date: String,
    pub status_label: &'static str,
}

impl BillRow {
    pub fn from_bill(bill: Bill) -> Self {
        let display_date = match format_date(&bill.date) {
            Ok(formatted) => formatted,
            Err(err) => {
                warn!(bill_id = %bill.id, error = %err, "showing bill date unformatted");
                bill.date.clone()
            }
        };
        Self {
            status_label: bill.status.label(),
            display_date,
            bill,
        }
    }

    pub fn eye_icon(&self) -> EyeIcon {
        EyeIcon {
            bill_url: self.bill.file_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    Loading,
    Error(String),
    Data(Vec<BillRow>),
}

impl RenderState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RenderState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn rows(&self) -> &[BillRow] {
        match self {
            RenderState::Data(rows) => rows,
            _ => &[],
        }
    }
}

/// The eye control of a bill row; carries the receipt URL the way the
/// markup carries it in its `data-bill-url` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EyeIcon {
    pub bill_url: Option<String>,
}

impl EyeIcon {
    pub fn new(bill_url: impl Into<String>) -> Self {
        Self {
            bill_url: Some(bill_url.into()),
        }
    }

    /// The attribute is rendered from a nullable field, so the literal text
    /// `null` means no receipt.
    pub fn receipt_url(&self) -> Option<&str> {
        self.bill_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != "null" && *url != "undefined")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptPreview {
    pub image_url: Option<String>,
    pub width: u32,
    pub markup: String,
}

impl ReceiptPreview {
    pub fn is_placeholder(&self) -> bool {
        self.image_url.is_none()
    }
}

/// Raw values of the new-bill form fields, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBillForm {
    pub expense_type: String,
    pub name: String,
    pub amount: String,
    pub date: String,
    pub vat: String,
    pub pct: String,
    pub commentary: String,
}

/// Page-level operations shared by every screen.
pub trait ViewHandle: Send + Sync {
    fn mount(&self, page: Page);
    /// `None` clears the marker; at most one icon is active.
    fn set_active_icon(&self, icon: Option<NavIcon>);
}

pub trait BillsView: Send + Sync {
    fn render_bills(&self, state: &RenderState);
    fn show_receipt_modal(&self, preview: &ReceiptPreview);
}

pub trait NewBillView: Send + Sync {
    fn form_values(&self) -> NewBillForm;
    /// Blocking user-facing alert.
    fn alert(&self, message: &str);
    fn clear_file_input(&self);
    fn show_submission_error(&self, message: &str);
}

/// Everything the router needs from the application shell.
pub trait AppView: ViewHandle + BillsView + NewBillView {}

impl<T> AppView for T where T: ViewHandle + BillsView + NewBillView {}
