//! # Zipkin Span Uploader
use crate::exporter::model::Span;
use crate::exporter::transport::{send_blocking, Transport};
use crate::exporter::Error;
use http::{header::CONTENT_TYPE, Method, Request};
use url::Url;

#[derive(Debug)]
pub(crate) enum Uploader {
    Http(JsonV2Client),
}

impl Uploader {
    /// Create a new http uploader
    pub(crate) fn new(transport: Box<dyn Transport>) -> Self {
        Uploader::Http(JsonV2Client { transport })
    }

    /// Upload spans to Zipkin
    pub(crate) fn upload(&self, url: &Url, spans: &[Span]) -> Result<(), Error> {
        match self {
            Uploader::Http(client) => client.upload(url, spans),
        }
    }
}

#[derive(Debug)]
pub(crate) struct JsonV2Client {
    transport: Box<dyn Transport>,
}

impl JsonV2Client {
    fn upload(&self, url: &Url, spans: &[Span]) -> Result<(), Error> {
        let body = serde_json::to_vec(spans)?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)?;
        // any completed response counts, the status code is not inspected
        let _ = send_blocking(self.transport.as_ref(), req)?;
        Ok(())
    }
}
