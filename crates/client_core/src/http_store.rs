use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Bill,
    error::StoreError,
    protocol::{CreateBillRequest, CreatedBill, UpdateBillRequest},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    session::{KeyValueStore, TOKEN_STORAGE_KEY},
    BillsResource, RemoteStore,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5678/";

#[derive(Debug, Error)]
pub enum HttpStoreError {
    #[error("invalid API url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpStore {
    bills: Arc<HttpBills>,
}

impl HttpStore {
    pub fn new(
        api_url: &str,
        timeout: Duration,
        sessions: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, HttpStoreError> {
        let base_url = parse_base_url(api_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            bills: Arc::new(HttpBills {
                http,
                base_url,
                sessions,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.bills.base_url
    }
}

impl RemoteStore for HttpStore {
    fn bills(&self) -> Arc<dyn BillsResource> {
        self.bills.clone()
    }
}

/// `Url::join` drops the last segment of a base without a trailing slash.
fn parse_base_url(api_url: &str) -> Result<Url, HttpStoreError> {
    let trimmed = api_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).map_err(|source| HttpStoreError::InvalidUrl {
        url: api_url.to_string(),
        source,
    })
}

struct HttpBills {
    http: Client,
    base_url: Url,
    sessions: Option<Arc<dyn KeyValueStore>>,
}

impl HttpBills {
    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|err| StoreError::network(format!("invalid endpoint '{path}': {err}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .sessions
            .as_ref()
            .and_then(|sessions| sessions.get_item(TOKEN_STORAGE_KEY));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| StoreError::network(format!("requête impossible: {err}")))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "store response");
    if !status.is_success() {
        return Err(StoreError::from_status(status.as_u16()));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| StoreError::network(format!("réponse illisible: {err}")))
}

#[async_trait]
impl BillsResource for HttpBills {
    async fn list(&self) -> Result<Vec<Bill>, StoreError> {
        let url = self.endpoint("bills")?;
        self.send(self.http.get(url)).await
    }

    async fn create(&self, request: CreateBillRequest) -> Result<CreatedBill, StoreError> {
        let url = self.endpoint("bills")?;
        let mut form = multipart::Form::new().text("email", request.email);
        if let Some(receipt) = request.receipt {
            let mut part = multipart::Part::bytes(receipt.bytes).file_name(receipt.file_name);
            if let Some(content_type) = receipt.content_type {
                part = part.mime_str(&content_type).map_err(|err| {
                    StoreError::network(format!("type de fichier invalide: {err}"))
                })?;
            }
            form = form.part("file", part);
        }
        self.send(self.http.post(url).multipart(form)).await
    }

    async fn update(&self, request: UpdateBillRequest) -> Result<Bill, StoreError> {
        let url = self.endpoint(&format!("bills/{}", request.selector))?;
        self.send(self.http.patch(url).json(&request.data)).await
    }
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
