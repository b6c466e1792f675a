use std::{cmp::Ordering, sync::Arc};

use chrono::NaiveDate;
use shared::domain::Bill;
use tracing::{debug, error, info};

use crate::{
    format::parse_bill_date,
    navigation::{MountToken, NavigationContext, Route},
    view::{BillRow, BillsView, EyeIcon, ReceiptPreview, RenderState},
    RemoteStore,
};

/// Bootstrap's large modal is 800px wide.
pub const DEFAULT_MODAL_WIDTH: u32 = 800;

pub const MISSING_RECEIPT_TEXT: &str = "Aucun justificatif disponible";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub modal_width: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            modal_width: DEFAULT_MODAL_WIDTH,
        }
    }
}

impl PreviewOptions {
    pub fn image_width(&self) -> u32 {
        self.modal_width / 2
    }
}

pub struct BillsController {
    store: Arc<dyn RemoteStore>,
    view: Arc<dyn BillsView>,
    navigation: NavigationContext,
    mount: MountToken,
    preview: PreviewOptions,
}

impl BillsController {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        view: Arc<dyn BillsView>,
        navigation: NavigationContext,
        mount: MountToken,
        preview: PreviewOptions,
    ) -> Self {
        Self {
            store,
            view,
            navigation,
            mount,
            preview,
        }
    }

    /// Loads the bills and renders them newest first, or the store's failure.
    /// Returns the state that settled, rendered or not.
    pub async fn retrieve_and_render(&self) -> RenderState {
        self.render(&RenderState::Loading);

        let state = match self.store.bills().list().await {
            Ok(bills) => {
                info!(count = bills.len(), "bills retrieved");
                RenderState::Data(
                    sort_by_date_desc(bills)
                        .into_iter()
                        .map(BillRow::from_bill)
                        .collect(),
                )
            }
            Err(err) => {
                error!(error = %err, status = ?err.status(), "failed to retrieve bills");
                RenderState::Error(err.to_string())
            }
        };

        self.render(&state);
        state
    }

    pub fn handle_click_new_bill(&self) {
        self.navigation.on_navigate(Route::NewBill);
    }

    pub fn handle_click_icon_eye(&self, icon: &EyeIcon) -> ReceiptPreview {
        let preview = receipt_preview(icon, self.preview);
        if self.mount.is_current() {
            self.view.show_receipt_modal(&preview);
        }
        preview
    }

    fn render(&self, state: &RenderState) {
        if !self.mount.is_current() {
            debug!("bills page no longer mounted; dropping render");
            return;
        }
        self.view.render_bills(state);
    }
}

/// Newest first. Dates that do not parse go last; equal keys keep the
/// store's order.
pub fn sort_by_date_desc(bills: Vec<Bill>) -> Vec<Bill> {
    let mut keyed: Vec<(Option<NaiveDate>, Bill)> = bills
        .into_iter()
        .map(|bill| (parse_bill_date(&bill.date), bill))
        .collect();
    keyed.sort_by(|(left, _), (right, _)| match (left, right) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, bill)| bill).collect()
}

pub fn receipt_preview(icon: &EyeIcon, options: PreviewOptions) -> ReceiptPreview {
    let width = options.image_width();
    match icon.receipt_url() {
        Some(url) => ReceiptPreview {
            image_url: Some(url.to_string()),
            width,
            markup: format!(
                "<div style='text-align: center;' class=\"bill-proof-container\"><img width={width} src=\"{}\" alt=\"Bill\" /></div>",
                escape_attribute(url)
            ),
        },
        None => ReceiptPreview {
            image_url: None,
            width,
            markup: format!(
                "<div style='text-align: center;' class=\"bill-proof-container\"><p class=\"bill-proof-missing\" style=\"width: {width}px;\">{MISSING_RECEIPT_TEXT}</p></div>"
            ),
        },
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/bills_tests.rs"]
mod tests;
