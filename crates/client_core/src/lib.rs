use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::Bill,
    error::StoreError,
    protocol::{CreateBillRequest, CreatedBill, UpdateBillRequest},
};

pub mod bills;
pub mod format;
pub mod http_store;
pub mod navigation;
pub mod new_bill;
pub mod router;
pub mod session;
pub mod view;

pub use bills::{BillsController, PreviewOptions};
pub use http_store::HttpStore;
pub use navigation::{NavIcon, NavigationContext, Route};
pub use new_bill::{NewBillController, NewBillState, SubmitOutcome};
pub use router::Router;

/// The `bills` resource of the remote store.
#[async_trait]
pub trait BillsResource: Send + Sync {
    async fn list(&self) -> Result<Vec<Bill>, StoreError>;
    async fn create(&self, request: CreateBillRequest) -> Result<CreatedBill, StoreError>;
    async fn update(&self, request: UpdateBillRequest) -> Result<Bill, StoreError>;
}

pub trait RemoteStore: Send + Sync {
    fn bills(&self) -> Arc<dyn BillsResource>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
