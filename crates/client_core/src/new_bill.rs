use std::sync::Arc;

use shared::{
    domain::{BillStatus, DEFAULT_PCT},
    error::StoreError,
    protocol::{BillPayload, CreateBillRequest, CreatedBill, ReceiptFile, UpdateBillRequest},
};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use crate::{
    navigation::{MountToken, NavigationContext, Route},
    view::{NewBillForm, NewBillView},
    RemoteStore,
};

pub const INVALID_FILE_ALERT: &str =
    "Veuillez télécharger un fichier avec une extension jpg, jpeg ou png.";

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileValidationError {
    #[error("file '{file_name}' has no extension")]
    MissingExtension { file_name: String },
    #[error("extension '{extension}' of '{file_name}' is not an accepted image type")]
    UnsupportedExtension {
        file_name: String,
        extension: String,
    },
}

/// Checks the receipt name only; the content is never inspected. Returns the
/// lowercased extension.
pub fn validate_receipt_name(file_name: &str) -> Result<String, FileValidationError> {
    let extension = match base_name(file_name).rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            extension.to_ascii_lowercase()
        }
        _ => {
            return Err(FileValidationError::MissingExtension {
                file_name: file_name.to_string(),
            })
        }
    };
    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(FileValidationError::UnsupportedExtension {
            file_name: file_name.to_string(),
            extension,
        })
    }
}

/// Last path segment; browsers report `C:\fakepath\name.jpg` for inputs.
fn base_name(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NewBillState {
    #[default]
    Idle,
    FileSelected {
        valid: bool,
    },
    Submitting,
    NavigatedToList,
    SubmissionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChangeOutcome {
    /// The change event carried no file.
    Ignored,
    Accepted { uploaded: bool },
    Rejected(FileValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Navigated,
    Failed(StoreError),
    /// Another submission is still in flight; nothing was sent.
    AlreadySubmitting,
    /// The bill was already sent and the list requested; nothing was sent.
    AlreadySubmitted,
}

type UploadResult = Result<CreatedBill, StoreError>;

#[derive(Debug, Clone)]
struct PendingUpload {
    file: ReceiptFile,
    file_name: String,
    /// Settled once by whichever of the file change or the submit runs
    /// `create` first; the other waits on it.
    created: Arc<OnceCell<UploadResult>>,
}

#[derive(Debug, Default)]
struct FormState {
    state: NewBillState,
    submitting: bool,
    upload: Option<PendingUpload>,
    /// Result of the `create` step, kept so a retry only repeats `update`.
    registered: Option<CreatedBill>,
    /// Bumped on every file selection; stale uploads compare against it.
    selection: u64,
}

impl FormState {
    fn is_locked(&self) -> bool {
        self.submitting || self.state == NewBillState::NavigatedToList
    }
}

pub struct NewBillController {
    store: Arc<dyn RemoteStore>,
    view: Arc<dyn NewBillView>,
    navigation: NavigationContext,
    mount: MountToken,
    form: Mutex<FormState>,
}

impl NewBillController {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        view: Arc<dyn NewBillView>,
        navigation: NavigationContext,
        mount: MountToken,
    ) -> Self {
        Self {
            store,
            view,
            navigation,
            mount,
            form: Mutex::new(FormState::default()),
        }
    }

    pub async fn state(&self) -> NewBillState {
        self.form.lock().await.state.clone()
    }

    pub async fn file_name(&self) -> Option<String> {
        let form = self.form.lock().await;
        form.upload.as_ref().map(|upload| upload.file_name.clone())
    }

    pub async fn file_url(&self) -> Option<String> {
        let form = self.form.lock().await;
        form.registered
            .as_ref()
            .and_then(|created| created.file_url.clone())
    }

    /// File input `change` handler. Only the first selected file counts.
    /// Changes arriving while the form is submitting or already sent are
    /// ignored.
    pub async fn handle_change_file(&self, files: Vec<ReceiptFile>) -> FileChangeOutcome {
        let Some(file) = files.into_iter().next() else {
            return FileChangeOutcome::Ignored;
        };

        let (selection, created) = {
            let mut form = self.form.lock().await;
            if form.is_locked() {
                warn!(file_name = %file.file_name, state = ?form.state, "file change ignored; form is locked");
                return FileChangeOutcome::Ignored;
            }
            form.selection += 1;
            form.registered = None;

            if let Err(err) = validate_receipt_name(&file.file_name) {
                warn!(file_name = %file.file_name, error = %err, "receipt rejected");
                form.upload = None;
                form.state = NewBillState::FileSelected { valid: false };
                drop(form);
                if self.mount.is_current() {
                    self.view.alert(INVALID_FILE_ALERT);
                    self.view.clear_file_input();
                }
                return FileChangeOutcome::Rejected(err);
            }

            let created = Arc::new(OnceCell::new());
            form.upload = Some(PendingUpload {
                file_name: base_name(&file.file_name).to_string(),
                file: file.clone(),
                created: created.clone(),
            });
            form.state = NewBillState::FileSelected { valid: true };
            (form.selection, created)
        };

        let result = created
            .get_or_init(|| self.create(Some(file)))
            .await
            .clone();
        match result {
            Ok(created) => {
                let mut form = self.form.lock().await;
                if form.selection != selection {
                    info!(bill_id = %created.key, "discarding upload of a replaced receipt");
                    return FileChangeOutcome::Accepted { uploaded: false };
                }
                info!(bill_id = %created.key, "receipt uploaded");
                form.registered = Some(created);
                FileChangeOutcome::Accepted { uploaded: true }
            }
            Err(err) => {
                error!(error = %err, "receipt upload failed; will retry on submit");
                FileChangeOutcome::Accepted { uploaded: false }
            }
        }
    }

    /// Form `submit` handler: `create` (unless the receipt upload already
    /// registered the bill), then `update`, then back to the list.
    pub async fn handle_submit(&self) -> SubmitOutcome {
        let (upload, registered) = {
            let mut form = self.form.lock().await;
            if form.submitting {
                warn!("submit ignored; a submission is already in flight");
                return SubmitOutcome::AlreadySubmitting;
            }
            if form.state == NewBillState::NavigatedToList {
                warn!("submit ignored; the bill was already sent");
                return SubmitOutcome::AlreadySubmitted;
            }
            form.submitting = true;
            form.state = NewBillState::Submitting;
            (form.upload.clone(), form.registered.clone())
        };

        let values = self.view.form_values();
        let email = self.navigation.session_email();

        let created = match registered {
            Some(created) => created,
            None => match self.register(upload.as_ref()).await {
                Ok(created) => {
                    self.form.lock().await.registered = Some(created.clone());
                    created
                }
                Err(err) => return self.fail(err).await,
            },
        };

        let payload = build_payload(
            &values,
            email,
            created.file_url.clone(),
            upload.map(|upload| upload.file_name),
        );
        let request = UpdateBillRequest {
            selector: created.key.clone(),
            data: payload,
        };
        if let Err(err) = self.store.bills().update(request).await {
            return self.fail(err).await;
        }

        info!(bill_id = %created.key, "bill submitted");
        {
            let mut form = self.form.lock().await;
            form.submitting = false;
            form.state = NewBillState::NavigatedToList;
        }
        self.navigation.on_navigate(Route::Bills);
        SubmitOutcome::Navigated
    }

    /// Reuses the receipt upload, waiting for it when still in flight. A
    /// failed upload is sent again.
    async fn register(&self, upload: Option<&PendingUpload>) -> UploadResult {
        let Some(upload) = upload else {
            return self.create(None).await;
        };
        match upload
            .created
            .get_or_init(|| self.create(Some(upload.file.clone())))
            .await
        {
            Ok(created) => Ok(created.clone()),
            Err(err) => {
                debug!(error = %err, "retrying failed receipt upload");
                self.create(Some(upload.file.clone())).await
            }
        }
    }

    async fn create(&self, receipt: Option<ReceiptFile>) -> UploadResult {
        let request = CreateBillRequest {
            email: self.navigation.session_email(),
            receipt,
        };
        self.store.bills().create(request).await
    }

    async fn fail(&self, err: StoreError) -> SubmitOutcome {
        error!(error = %err, status = ?err.status(), "bill submission failed");
        let message = err.to_string();
        {
            let mut form = self.form.lock().await;
            form.submitting = false;
            form.state = NewBillState::SubmissionFailed(message.clone());
        }
        if self.mount.is_current() {
            self.view.show_submission_error(&message);
        }
        SubmitOutcome::Failed(err)
    }
}

/// Maps raw form text to the stored bill. Unparseable amounts become `0` and
/// a missing or unparseable percentage falls back to the default.
pub fn build_payload(
    values: &NewBillForm,
    email: String,
    file_url: Option<String>,
    file_name: Option<String>,
) -> BillPayload {
    BillPayload {
        email,
        expense_type: values.expense_type.trim().to_string(),
        name: values.name.trim().to_string(),
        amount: parse_amount(&values.amount),
        date: values.date.trim().to_string(),
        vat: values.vat.trim().to_string(),
        pct: parse_pct(&values.pct),
        commentary: values.commentary.clone(),
        file_url,
        file_name,
        status: BillStatus::Pending,
    }
}

fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .unwrap_or_default()
}

/// Leading digits only, so `"15.5"` and `"15 %"` read as 15.
fn parse_pct(raw: &str) -> u32 {
    let raw = raw.trim();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits
        .parse::<u32>()
        .ok()
        .filter(|pct| *pct > 0)
        .unwrap_or(DEFAULT_PCT)
}

#[cfg(test)]
#[path = "tests/new_bill_tests.rs"]
mod tests;
