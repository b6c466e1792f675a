use serde::{Deserialize, Serialize};

use crate::domain::{BillId, BillStatus};

/// Receipt picked in the new-bill form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReceiptFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// First step of a bill submission: registers the bill and its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBillRequest {
    pub email: String,
    pub receipt: Option<ReceiptFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBill {
    pub key: BillId,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Body of the second submission step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    pub email: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub vat: String,
    pub pct: u32,
    pub commentary: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub status: BillStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBillRequest {
    pub selector: BillId,
    pub data: BillPayload,
}
