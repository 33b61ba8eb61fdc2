//! # Zipkin Span Exporter
//!
//! Delivers finished OpenTelemetry spans to a Zipkin collector over HTTP,
//! encoded as Zipkin v2 JSON. See the [Zipkin Docs](https://zipkin.io/) for
//! details and deployment information.
//!
//! Each export sends the whole batch in one `POST` request and blocks the
//! calling thread until the transport reports an outcome. There is no
//! buffering, retrying or batching in the exporter itself; pair it with a
//! batch span processor when that is needed.
//!
//! ## Quickstart
//!
//! First make sure you have a running version of the zipkin process you want to
//! send data to:
//!
//! ```shell
//! $ docker run -d -p 9411:9411 openzipkin/zipkin
//! ```
//!
//! Then install the exporter in a tracer provider:
//!
//! ```no_run
//! use opentelemetry::{global, trace::Tracer};
//! use opentelemetry_sdk::trace::TracerProvider;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
//!     let exporter = zipkin_exporter::ZipkinExporter::builder()
//!         .with_service_name("trace-demo")
//!         .with_collector_endpoint("http://localhost:9411/api/v2/spans")
//!         .build()?;
//!     let provider = TracerProvider::builder()
//!         .with_simple_exporter(exporter)
//!         .build();
//!     global::set_tracer_provider(provider);
//!
//!     global::tracer("my-component").in_span("doing_work", |_cx| {
//!         // Traced app logic here...
//!     });
//!
//!     global::shutdown_tracer_provider();
//!     Ok(())
//! }
//! ```
//!
//! ## Exporting directly
//!
//! [`ZipkinExporter::export`] can also be called without an SDK pipeline,
//! and returns a plain [`ExportResult`]:
//!
//! ```no_run
//! use zipkin_exporter::{ExportResult, ZipkinExporter};
//!
//! # fn main() -> Result<(), zipkin_exporter::Error> {
//! let exporter = ZipkinExporter::builder().build()?;
//! let spans = Vec::new();
//! if exporter.export(spans) == ExportResult::Failure {
//!     // retry, drop or log as the application sees fit
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! | Setting | Builder method | Environment variable | Default |
//! |---|---|---|---|
//! | Collector URL | [`with_collector_endpoint`] | `OTEL_EXPORTER_ZIPKIN_ENDPOINT` | `http://127.0.0.1:9411/api/v2/spans` |
//! | Request timeout (ms) | | `OTEL_EXPORTER_ZIPKIN_TIMEOUT` | `10000` |
//! | Service name | [`with_service_name`] | | host name |
//! | Local address | [`with_service_address`], [`with_address_discovery`] | | first interface addresses |
//!
//! The timeout applies to the default `reqwest` client; a custom
//! [`Transport`] or [`HttpClient`] enforces its own.
//!
//! [`with_collector_endpoint`]: ZipkinExporterBuilder::with_collector_endpoint
//! [`with_service_name`]: ZipkinExporterBuilder::with_service_name
//! [`with_service_address`]: ZipkinExporterBuilder::with_service_address
//! [`with_address_discovery`]: ZipkinExporterBuilder::with_address_discovery
//! [`Transport`]: transport::Transport
//! [`HttpClient`]: opentelemetry_http::HttpClient
//!
//! ## Crate Feature Flags
//!
//! * `reqwest-blocking-client` (default): default transport built on
//!   `reqwest::blocking::Client`.
//! * `reqwest-client`: enables the async `reqwest::Client` implementation of
//!   `HttpClient`. Used as the default transport when `rt-tokio` is also
//!   enabled and the blocking client is not.
//! * `reqwest-rustls`: use rustls with the reqwest clients.
//! * `interface-discovery` (default): report local interface addresses in the
//!   local endpoint.
//! * `rt-tokio`: [`TokioTransport`], running requests on a Tokio runtime.
//!
//! [`TokioTransport`]: transport::TokioTransport
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod exporter;

pub use exporter::{
    model, transport, AddressDiscovery, ConvertSpanFn, EndpointResolver, Error, ExportResult,
    ExporterOptions, ZipkinExporter, ZipkinExporterBuilder,
};
