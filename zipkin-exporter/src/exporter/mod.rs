mod env;
pub mod model;
mod resolver;
pub mod transport;
mod uploader;

use futures_core::future::BoxFuture;
use model::{Endpoint, Span};
use opentelemetry::ExportError;
use opentelemetry_http::{HttpClient, HttpError};
use opentelemetry_sdk::export::trace::{self, SpanData};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use transport::{HttpClientTransport, Transport};
use url::Url;

pub use resolver::{AddressDiscovery, EndpointResolver};

/// Coarse outcome of an export call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportResult {
    /// The collector request completed without a transport error.
    Success,
    /// The batch was not delivered.
    Failure,
}

impl ExportResult {
    /// Returns `true` for [`ExportResult::Success`].
    pub fn is_success(self) -> bool {
        self == ExportResult::Success
    }
}

/// Function turning one span record into a Zipkin span, given the
/// exporter's local endpoint as the default origin.
pub type ConvertSpanFn<S> = Arc<dyn Fn(S, &Endpoint) -> Span + Send + Sync>;

/// Immutable exporter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExporterOptions {
    collector_endpoint: String,
}

impl ExporterOptions {
    /// Creates options targeting `collector_endpoint`.
    pub fn new<T: Into<String>>(collector_endpoint: T) -> Self {
        ExporterOptions {
            collector_endpoint: collector_endpoint.into(),
        }
    }

    /// The collector endpoint, as configured.
    pub fn collector_endpoint(&self) -> &str {
        &self.collector_endpoint
    }

    /// Parses the collector endpoint.
    pub fn collector_url(&self) -> Result<Url, Error> {
        Url::parse(&self.collector_endpoint).map_err(|source| Error::InvalidEndpoint {
            endpoint: self.collector_endpoint.clone(),
            source,
        })
    }
}

/// Zipkin span exporter
///
/// Every call to [`export`](ZipkinExporter::export) sends one HTTP request
/// and blocks the calling thread until the transport reports completion.
pub struct ZipkinExporter<S = SpanData> {
    options: ExporterOptions,
    local_endpoint: Arc<Endpoint>,
    convert: ConvertSpanFn<S>,
    uploader: uploader::Uploader,
}

impl ZipkinExporter {
    /// Get a builder to configure a [ZipkinExporter].
    pub fn builder() -> ZipkinExporterBuilder {
        ZipkinExporterBuilder::default()
    }
}

impl<S> fmt::Debug for ZipkinExporter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipkinExporter")
            .field("options", &self.options)
            .field("local_endpoint", &self.local_endpoint)
            .field("uploader", &self.uploader)
            .finish_non_exhaustive()
    }
}

impl<S> ZipkinExporter<S> {
    /// Export spans to the Zipkin collector.
    ///
    /// The batch is sent as a single JSON array. Any response that arrives
    /// without a transport error counts as [`ExportResult::Success`], whatever
    /// its status code.
    pub fn export(&self, batch: Vec<S>) -> ExportResult {
        match self.try_export(batch) {
            Ok(()) => ExportResult::Success,
            Err(err) => {
                tracing::debug!(
                    name: "ZipkinExporter.ExportFailed",
                    kind = err.kind(),
                    error = %err
                );
                ExportResult::Failure
            }
        }
    }

    fn try_export(&self, batch: Vec<S>) -> Result<(), Error> {
        let url = self.options.collector_url()?;
        let local_endpoint: &Endpoint = &self.local_endpoint;
        let zipkin_spans: Vec<Span> = batch
            .into_iter()
            .map(|span| (self.convert)(span, local_endpoint))
            .collect();

        tracing::debug!(
            name: "ZipkinExporter.Export",
            endpoint = %url,
            span_count = zipkin_spans.len()
        );
        self.uploader.upload(&url, &zipkin_spans)
    }

    /// Nothing is buffered, so flushing always succeeds.
    pub fn flush(&self) -> ExportResult {
        ExportResult::Success
    }

    /// No resources are held between calls; this is a no-op and may be called
    /// any number of times.
    pub fn shutdown(&self) {}

    /// The endpoint attached to spans that do not carry their own.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local_endpoint
    }

    /// The configuration of this exporter.
    pub fn options(&self) -> &ExporterOptions {
        &self.options
    }
}

impl trace::SpanExporter for ZipkinExporter<SpanData> {
    /// Export spans to Zipkin collector.
    ///
    /// The request completes before this returns; the returned future is
    /// already resolved.
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, trace::ExportResult> {
        let result: trace::ExportResult = self.try_export(batch).map_err(|err| {
            tracing::debug!(
                name: "ZipkinExporter.ExportFailed",
                kind = err.kind(),
                error = %err
            );
            err.into()
        });
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        ZipkinExporter::shutdown(self)
    }

    fn force_flush(&mut self) -> BoxFuture<'static, trace::ExportResult> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Builder for [`ZipkinExporter`].
pub struct ZipkinExporterBuilder<S = SpanData> {
    collector_endpoint: Option<String>,
    resolver: EndpointResolver,
    transport: Option<Box<dyn Transport>>,
    convert: ConvertSpanFn<S>,
}

impl Default for ZipkinExporterBuilder {
    fn default() -> Self {
        ZipkinExporterBuilder {
            collector_endpoint: None,
            resolver: EndpointResolver::new(),
            transport: None,
            convert: Arc::new(convert_span_data),
        }
    }
}

fn convert_span_data(span: SpanData, local_endpoint: &Endpoint) -> Span {
    model::into_zipkin_span(local_endpoint, span)
}

impl<S> fmt::Debug for ZipkinExporterBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipkinExporterBuilder")
            .field("collector_endpoint", &self.collector_endpoint)
            .field("resolver", &self.resolver)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl<S> ZipkinExporterBuilder<S> {
    /// Creates the exporter, resolving its local endpoint.
    ///
    /// The collector endpoint is validated on each export, so an invalid one
    /// does not fail here.
    pub fn build(self) -> Result<ZipkinExporter<S>, Error> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let options = ExporterOptions::new(self.collector_endpoint.unwrap_or_else(env::get_endpoint));
        let local_endpoint = Arc::new(self.resolver.resolve());

        tracing::debug!(
            name: "ZipkinExporter.Built",
            collector_endpoint = options.collector_endpoint(),
            service_name = local_endpoint.service_name().unwrap_or_default()
        );

        Ok(ZipkinExporter {
            options,
            local_endpoint,
            convert: self.convert,
            uploader: uploader::Uploader::new(transport),
        })
    }

    /// Assign the service name under which to group traces.
    ///
    /// Defaults to the host name.
    pub fn with_service_name<T: Into<String>>(mut self, name: T) -> Self {
        self.resolver = self.resolver.with_service_name(name);
        self
    }

    /// Assign the host name used as the service name when none is set.
    ///
    /// Defaults to the host name reported by the operating system.
    pub fn with_host_name<T: Into<String>>(mut self, host_name: T) -> Self {
        self.resolver = self.resolver.with_host_name(host_name);
        self
    }

    /// Assign the address and port of the local service.
    pub fn with_service_address(mut self, addr: SocketAddr) -> Self {
        self.resolver = self.resolver.with_service_address(addr);
        self
    }

    /// Assign how local IP addresses are discovered.
    pub fn with_address_discovery(mut self, discovery: AddressDiscovery) -> Self {
        self.resolver = self.resolver.with_address_discovery(discovery);
        self
    }

    /// Assign the Zipkin collector endpoint
    ///
    /// Defaults to `OTEL_EXPORTER_ZIPKIN_ENDPOINT`, or
    /// `http://127.0.0.1:9411/api/v2/spans` if it is unset.
    pub fn with_collector_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.collector_endpoint = Some(endpoint.into());
        self
    }

    /// Assign client implementation
    ///
    /// Each request runs on its own thread, see [`HttpClientTransport`].
    pub fn with_http_client<T: HttpClient + 'static>(mut self, client: T) -> Self {
        self.transport = Some(Box::new(HttpClientTransport::new(client)));
        self
    }

    /// Assign the transport used to deliver requests.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Assign the function converting span records into Zipkin spans,
    /// changing the span record type accepted by the exporter.
    pub fn with_span_converter<T, F>(self, convert: F) -> ZipkinExporterBuilder<T>
    where
        F: Fn(T, &Endpoint) -> Span + Send + Sync + 'static,
    {
        ZipkinExporterBuilder {
            collector_endpoint: self.collector_endpoint,
            resolver: self.resolver,
            transport: self.transport,
            convert: Arc::new(convert),
        }
    }
}

#[cfg(feature = "reqwest-blocking-client")]
fn default_transport() -> Result<Box<dyn Transport>, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(env::get_timeout())
        .build()
        .map_err(|err| Error::Other(err.to_string()))?;
    Ok(Box::new(HttpClientTransport::new(client)))
}

#[cfg(all(
    not(feature = "reqwest-blocking-client"),
    feature = "reqwest-client",
    feature = "rt-tokio"
))]
fn default_transport() -> Result<Box<dyn Transport>, Error> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoHttpClient)?;
    let client = reqwest::Client::builder()
        .timeout(env::get_timeout())
        .build()
        .map_err(|err| Error::Other(err.to_string()))?;
    Ok(Box::new(transport::TokioTransport::new(client, handle)))
}

#[cfg(not(any(
    feature = "reqwest-blocking-client",
    all(feature = "reqwest-client", feature = "rt-tokio")
)))]
fn default_transport() -> Result<Box<dyn Transport>, Error> {
    Err(Error::NoHttpClient)
}

/// Wrap type for errors from this crate.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No http client implementation found. User should provide one or enable features.
    #[error("http client must be set, users can enable reqwest feature to use http client implementation within crate")]
    NoHttpClient,

    /// The collector endpoint is not a valid URL
    #[error("invalid collector endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        /// The configured endpoint
        endpoint: String,
        /// Why it failed to parse
        #[source]
        source: url::ParseError,
    },

    /// The http request could not be built
    #[error("http request failed with {0}")]
    RequestFailed(#[from] http::Error),

    /// The spans could not be encoded as JSON
    #[error("failed to serialize spans: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport reported an error
    #[error("transport error: {0}")]
    Transport(#[source] HttpError),

    /// The transport dropped the request without reporting an outcome
    #[error("transport completed without a response")]
    NoResponse,

    /// Other errors
    #[error("export error: {0}")]
    Other(String),
}

impl Error {
    /// Broad category of the failure, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoHttpClient | Error::InvalidEndpoint { .. } | Error::RequestFailed(_) => {
                "configuration"
            }
            Error::Serialization(_) => "encoding",
            Error::Transport(_) | Error::NoResponse => "transport",
            Error::Other(_) => "other",
        }
    }
}

impl ExportError for Error {
    fn exporter_name(&self) -> &'static str {
        "zipkin"
    }
}
