#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::{
    domain::{Bill, BillId, BillStatus, Session, StoredUser, UserRole},
    error::StoreError,
    protocol::{CreateBillRequest, CreatedBill, UpdateBillRequest},
};

use crate::{
    navigation::NavIcon,
    session::{sign_in, MemoryStorage},
    view::{BillsView, NewBillForm, NewBillView, Page, ReceiptPreview, RenderState, ViewHandle},
    BillsResource, RemoteStore,
};

pub fn bill(id: &str, date: &str) -> Bill {
    Bill {
        id: BillId::new(id),
        expense_type: "Transports".into(),
        name: format!("bill {id}"),
        amount: 100.0,
        date: date.into(),
        vat: Some(20.0),
        pct: 20,
        commentary: None,
        file_url: Some(format!("https://test.storage.tld/{id}.jpg")),
        file_name: Some(format!("{id}.jpg")),
        status: BillStatus::Pending,
        email: Some("a@a".into()),
        comment_admin: None,
    }
}

/// The four bills of the front-end fixtures, in store order.
pub fn fixture_bills() -> Vec<Bill> {
    let mut refused = bill("BeKy5Mo4jkmdfPGYpTxZ", "2003-03-03");
    refused.status = BillStatus::Refused;
    let mut accepted = bill("UIUZtnPQvnbFnB0ozvJh", "2001-01-01");
    accepted.status = BillStatus::Accepted;
    vec![
        bill("47qAXb6fIm2zOKkLzMro", "2004-04-04"),
        bill("qcCK3SzECmaZAGRrHjaC", "2002-02-02"),
        accepted,
        refused,
    ]
}

pub fn sessions_for(role: Option<UserRole>) -> Arc<MemoryStorage> {
    let store = Arc::new(MemoryStorage::new());
    if let Some(role) = role {
        sign_in(
            store.as_ref(),
            &StoredUser {
                role,
                email: "a@a".into(),
            },
        )
        .expect("sign in");
    }
    store
}

pub fn employee_session() -> Session {
    Session::Employee {
        email: "a@a".into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List,
    Create(CreateBillRequest),
    Update(UpdateBillRequest),
}

pub struct FakeBills {
    list_result: Mutex<Result<Vec<Bill>, StoreError>>,
    create_result: Mutex<Result<CreatedBill, StoreError>>,
    update_error: Mutex<Option<StoreError>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl FakeBills {
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn count(&self, predicate: fn(&StoreCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn creates(&self) -> usize {
        self.count(|call| matches!(call, StoreCall::Create(_)))
    }

    pub fn updates(&self) -> Vec<UpdateBillRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Update(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("calls").push(call);
    }
}

#[async_trait]
impl BillsResource for FakeBills {
    async fn list(&self) -> Result<Vec<Bill>, StoreError> {
        self.record(StoreCall::List);
        tokio::task::yield_now().await;
        self.list_result.lock().expect("list").clone()
    }

    async fn create(&self, request: CreateBillRequest) -> Result<CreatedBill, StoreError> {
        self.record(StoreCall::Create(request));
        tokio::task::yield_now().await;
        self.create_result.lock().expect("create").clone()
    }

    async fn update(&self, request: UpdateBillRequest) -> Result<Bill, StoreError> {
        let selector = request.selector.clone();
        let data = request.data.clone();
        self.record(StoreCall::Update(request));
        tokio::task::yield_now().await;
        if let Some(err) = self.update_error.lock().expect("update").clone() {
            return Err(err);
        }
        Ok(Bill {
            id: selector,
            expense_type: data.expense_type,
            name: data.name,
            amount: data.amount,
            date: data.date,
            vat: data.vat.parse().ok(),
            pct: data.pct,
            commentary: Some(data.commentary),
            file_url: data.file_url,
            file_name: data.file_name,
            status: data.status,
            email: Some(data.email),
            comment_admin: None,
        })
    }
}

pub struct FakeStore {
    pub bills: Arc<FakeBills>,
}

impl FakeStore {
    pub fn ok(bills: Vec<Bill>) -> Arc<Self> {
        Arc::new(Self {
            bills: Arc::new(FakeBills {
                list_result: Mutex::new(Ok(bills)),
                create_result: Mutex::new(Ok(CreatedBill {
                    key: BillId::new("1234"),
                    file_url: Some("https://localhost:3456/images/test.jpg".into()),
                })),
                update_error: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn failing_list(err: StoreError) -> Arc<Self> {
        let store = Self::ok(Vec::new());
        *store.bills.list_result.lock().expect("list") = Err(err);
        store
    }

    pub fn failing_create(err: StoreError) -> Arc<Self> {
        let store = Self::ok(fixture_bills());
        *store.bills.create_result.lock().expect("create") = Err(err);
        store
    }

    pub fn failing_update(err: StoreError) -> Arc<Self> {
        let store = Self::ok(fixture_bills());
        *store.bills.update_error.lock().expect("update") = Some(err);
        store
    }

    pub fn set_create_result(&self, result: Result<CreatedBill, StoreError>) {
        *self.bills.create_result.lock().expect("create") = result;
    }

    pub fn set_update_error(&self, err: Option<StoreError>) {
        *self.bills.update_error.lock().expect("update") = err;
    }
}

impl RemoteStore for FakeStore {
    fn bills(&self) -> Arc<dyn BillsResource> {
        self.bills.clone()
    }
}

/// Headless screen that records everything drawn on it.
#[derive(Default)]
pub struct RecordingView {
    pages: Mutex<Vec<Page>>,
    active_icon: Mutex<Option<NavIcon>>,
    renders: Mutex<Vec<RenderState>>,
    modals: Mutex<Vec<ReceiptPreview>>,
    alerts: Mutex<Vec<String>>,
    cleared_inputs: Mutex<usize>,
    submission_errors: Mutex<Vec<String>>,
    form: Mutex<NewBillForm>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fill_form(&self, form: NewBillForm) {
        *self.form.lock().expect("form") = form;
    }

    pub fn current_page(&self) -> Option<Page> {
        self.pages.lock().expect("pages").last().copied()
    }

    pub fn pages(&self) -> Vec<Page> {
        self.pages.lock().expect("pages").clone()
    }

    pub fn active_icon(&self) -> Option<NavIcon> {
        *self.active_icon.lock().expect("icon")
    }

    pub fn renders(&self) -> Vec<RenderState> {
        self.renders.lock().expect("renders").clone()
    }

    pub fn last_render(&self) -> Option<RenderState> {
        self.renders.lock().expect("renders").last().cloned()
    }

    pub fn modals(&self) -> Vec<ReceiptPreview> {
        self.modals.lock().expect("modals").clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts").clone()
    }

    pub fn cleared_inputs(&self) -> usize {
        *self.cleared_inputs.lock().expect("cleared")
    }

    pub fn submission_errors(&self) -> Vec<String> {
        self.submission_errors.lock().expect("errors").clone()
    }

    /// Text a user would see on the current page.
    pub fn screen_text(&self) -> String {
        let mut text = Vec::new();
        if let Some(page) = self.current_page() {
            text.push(page.heading().to_string());
        }
        match self.last_render() {
            Some(RenderState::Loading) => text.push("Loading...".into()),
            Some(RenderState::Error(message)) => {
                text.push("Erreur".into());
                text.push(message);
            }
            Some(RenderState::Data(rows)) => {
                for row in rows {
                    text.push(format!(
                        "{} {} {} {}",
                        row.bill.expense_type, row.bill.name, row.display_date, row.status_label
                    ));
                }
            }
            None => {}
        }
        text.extend(self.submission_errors());
        text.join("\n")
    }
}

impl ViewHandle for RecordingView {
    fn mount(&self, page: Page) {
        self.pages.lock().expect("pages").push(page);
        self.renders.lock().expect("renders").clear();
        self.submission_errors.lock().expect("errors").clear();
    }

    fn set_active_icon(&self, icon: Option<NavIcon>) {
        *self.active_icon.lock().expect("icon") = icon;
    }
}

impl BillsView for RecordingView {
    fn render_bills(&self, state: &RenderState) {
        self.renders.lock().expect("renders").push(state.clone());
    }

    fn show_receipt_modal(&self, preview: &ReceiptPreview) {
        self.modals.lock().expect("modals").push(preview.clone());
    }
}

impl NewBillView for RecordingView {
    fn form_values(&self) -> NewBillForm {
        self.form.lock().expect("form").clone()
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().expect("alerts").push(message.to_string());
    }

    fn clear_file_input(&self) {
        *self.cleared_inputs.lock().expect("cleared") += 1;
    }

    fn show_submission_error(&self, message: &str) {
        self.submission_errors
            .lock()
            .expect("errors")
            .push(message.to_string());
    }
}
