// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of [`RemoteApi`] using reqwest.

use std::time::Duration;

use fieldsync_core::{Asset, Inspection, InspectionItem, MediaKind};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::json;

use super::remote::{RemoteApi, RemoteError, RemoteFuture, RemoteResult, UploadRequest, UploadTarget};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the field API over HTTP(S).
///
/// Routes, relative to the base URL:
/// - `POST /assets`
/// - `POST /inspections`, `PUT /inspections/:id`
/// - `POST /inspection-items`, `PUT /inspection-items/:id`
/// - `POST /uploads/:kind`, `POST /uploads/:kind/:key/confirm`
///
/// The signed upload target is hit with a bare `PUT`; it carries its own
/// authorization in the URL.
pub struct HttpRemote {
    client: Client,
    base_url: Url,
}

impl HttpRemote {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: Url) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(HttpRemote { client, base_url })
    }

    /// Build an endpoint URL from path segments. Segments are
    /// percent-encoded, so ids and keys may contain any characters.
    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Network(format!("invalid api url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.bearer_auth(token)
    }
}

/// Send a request and turn non-success statuses into [`RemoteError::Http`].
async fn send(request: RequestBuilder) -> RemoteResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| RemoteError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        return Err(RemoteError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

impl RemoteApi for HttpRemote {
    fn create_asset<'a>(&'a self, token: &'a str, asset: &'a Asset) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["assets"])?;
            send(self.authorized(self.client.post(url), token).json(asset)).await?;
            Ok(())
        })
    }

    fn create_inspection<'a>(
        &'a self,
        token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["inspections"])?;
            send(self.authorized(self.client.post(url), token).json(inspection)).await?;
            Ok(())
        })
    }

    fn update_inspection<'a>(
        &'a self,
        token: &'a str,
        inspection: &'a Inspection,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["inspections", &inspection.id])?;
            send(self.authorized(self.client.put(url), token).json(inspection)).await?;
            Ok(())
        })
    }

    fn create_item<'a>(
        &'a self,
        token: &'a str,
        item: &'a InspectionItem,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["inspection-items"])?;
            send(self.authorized(self.client.post(url), token).json(item)).await?;
            Ok(())
        })
    }

    fn update_item<'a>(
        &'a self,
        token: &'a str,
        item: &'a InspectionItem,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["inspection-items", &item.id])?;
            send(self.authorized(self.client.put(url), token).json(item)).await?;
            Ok(())
        })
    }

    fn request_upload<'a>(
        &'a self,
        token: &'a str,
        kind: MediaKind,
        request: &'a UploadRequest,
    ) -> RemoteFuture<'a, UploadTarget> {
        Box::pin(async move {
            let url = self.endpoint(&["uploads", kind.as_str()])?;
            let response =
                send(self.authorized(self.client.post(url), token).json(request)).await?;
            response
                .json::<UploadTarget>()
                .await
                .map_err(|e| RemoteError::Decode(e.to_string()))
        })
    }

    fn upload_bytes<'a>(
        &'a self,
        target: &'a UploadTarget,
        mime_type: &'a str,
        bytes: &'a [u8],
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = Url::parse(&target.url)
                .map_err(|e| RemoteError::Decode(format!("invalid upload url: {e}")))?;
            send(
                self.client
                    .put(url)
                    .header(reqwest::header::CONTENT_TYPE, mime_type)
                    .body(bytes.to_vec()),
            )
            .await?;
            Ok(())
        })
    }

    fn confirm_upload<'a>(
        &'a self,
        token: &'a str,
        kind: MediaKind,
        key: &'a str,
        inspection_item_id: &'a str,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["uploads", kind.as_str(), key, "confirm"])?;
            let body = json!({ "inspection_item_id": inspection_item_id });
            send(self.authorized(self.client.post(url), token).json(&body)).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
