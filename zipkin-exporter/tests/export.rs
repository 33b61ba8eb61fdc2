use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use opentelemetry_http::{Bytes, HttpClient, HttpError, Request, Response};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use zipkin_exporter::model::{Endpoint, Span};
use zipkin_exporter::transport::{Completion, Transport};
use zipkin_exporter::{AddressDiscovery, ExportResult, ZipkinExporter, ZipkinExporterBuilder};

const COLLECTOR: &str = "http://collector.local:9411/api/v2/spans";

/// A finished span as an application might record it.
#[derive(Clone, Debug)]
struct SpanRecord {
    trace_id: &'static str,
    span_id: &'static str,
    name: &'static str,
    timestamp: u64,
    duration: u64,
    endpoint: Option<Endpoint>,
}

impl SpanRecord {
    fn named(name: &'static str) -> Self {
        SpanRecord {
            trace_id: "abc123",
            span_id: "def456",
            name,
            timestamp: 1_000_000,
            duration: 1_500,
            endpoint: None,
        }
    }
}

fn to_zipkin(record: SpanRecord, local_endpoint: &Endpoint) -> Span {
    Span::builder()
        .trace_id(record.trace_id)
        .id(record.span_id)
        .name(record.name)
        .timestamp(record.timestamp)
        .duration(record.duration)
        .local_endpoint(record.endpoint.unwrap_or_else(|| local_endpoint.clone()))
        .build()
}

#[derive(Debug, Default)]
struct Recording {
    requests: Mutex<Vec<Request<Vec<u8>>>>,
    status: u16,
}

impl Recording {
    fn with_status(status: u16) -> Self {
        Recording {
            status,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn body(&self, index: usize) -> Value {
        serde_json::from_slice(self.requests.lock().unwrap()[index].body()).unwrap()
    }
}

impl Transport for Recording {
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion) {
        self.requests.lock().unwrap().push(request);
        let status = if self.status == 0 { 200 } else { self.status };
        let response = Response::builder().status(status).body(Bytes::new()).unwrap();
        on_complete(Ok(response));
    }
}

/// Fails every request from another thread after a delay.
#[derive(Debug, Default)]
struct Unreachable {
    completed: Arc<AtomicBool>,
}

impl Transport for Unreachable {
    fn submit(&self, _request: Request<Vec<u8>>, on_complete: Completion) {
        let completed = Arc::clone(&self.completed);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            completed.store(true, Ordering::SeqCst);
            on_complete(Err("connection refused".into()));
        });
    }
}

#[derive(Debug)]
struct StatusClient(u16);

#[async_trait]
impl HttpClient for StatusClient {
    async fn send(&self, _request: Request<Vec<u8>>) -> Result<Response<Bytes>, HttpError> {
        Ok(Response::builder().status(self.0).body(Bytes::new())?)
    }
}

fn builder(endpoint: &str) -> ZipkinExporterBuilder<SpanRecord> {
    ZipkinExporter::builder()
        .with_collector_endpoint(endpoint)
        .with_service_name("frontend")
        .with_address_discovery(AddressDiscovery::Disabled)
        .with_span_converter(to_zipkin)
}

fn exporter(transport: &Arc<Recording>) -> ZipkinExporter<SpanRecord> {
    builder(COLLECTOR)
        .with_transport(Arc::clone(transport))
        .build()
        .unwrap()
}

#[test]
fn exports_batch_as_json_post() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    let result = exporter.export(vec![SpanRecord::named("GET /ping")]);
    assert_eq!(result, ExportResult::Success);
    assert_eq!(transport.calls(), 1);

    {
        let requests = transport.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method(), &http::Method::POST);
        assert_eq!(request.uri(), COLLECTOR);
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    }

    let body = transport.body(0);
    let spans = body.as_array().unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["traceId"], "abc123");
    assert_eq!(spans[0]["id"], "def456");
    assert_eq!(spans[0]["name"], "GET /ping");
    assert_eq!(spans[0]["timestamp"], 1_000_000);
    assert_eq!(spans[0]["duration"], 1_500);
    assert_eq!(spans[0]["localEndpoint"]["serviceName"], "frontend");
}

#[test]
fn empty_batch_is_still_sent() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    assert_eq!(exporter.export(vec![]), ExportResult::Success);
    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.requests.lock().unwrap()[0].body().as_slice(), b"[]");
}

#[test]
fn batch_order_is_preserved() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    let batch = vec![
        SpanRecord::named("first"),
        SpanRecord::named("second"),
        SpanRecord::named("third"),
    ];
    assert!(exporter.export(batch).is_success());

    let names: Vec<String> = transport
        .body(0)
        .as_array()
        .unwrap()
        .iter()
        .map(|span| span["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[test]
fn own_endpoint_wins_over_local_endpoint() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    let mut record = SpanRecord::named("GET /stock");
    record.endpoint = Some(Endpoint::new(
        "inventory".to_string(),
        Some("10.0.0.7:8080".parse().unwrap()),
    ));
    assert!(exporter
        .export(vec![record, SpanRecord::named("GET /cart")])
        .is_success());

    let body = transport.body(0);
    assert_eq!(body[0]["localEndpoint"]["serviceName"], "inventory");
    assert_eq!(body[0]["localEndpoint"]["ipv4"], "10.0.0.7");
    assert_eq!(body[0]["localEndpoint"]["port"], 8080);
    assert_eq!(body[1]["localEndpoint"]["serviceName"], "frontend");
}

#[test]
fn invalid_endpoint_fails_without_sending() {
    let transport = Arc::new(Recording::default());
    let exporter = builder("not a url")
        .with_transport(Arc::clone(&transport))
        .build()
        .unwrap();

    assert_eq!(
        exporter.export(vec![SpanRecord::named("GET /ping")]),
        ExportResult::Failure
    );
    assert_eq!(transport.calls(), 0);
}

#[test]
fn error_status_still_counts_as_success() {
    let transport = Arc::new(Recording::with_status(500));
    let exporter = exporter(&transport);

    assert_eq!(
        exporter.export(vec![SpanRecord::named("GET /ping")]),
        ExportResult::Success
    );
    assert_eq!(transport.calls(), 1);
}

#[test]
fn connection_error_is_failure_after_completion() {
    let transport = Unreachable::default();
    let completed = Arc::clone(&transport.completed);
    let exporter = builder(COLLECTOR).with_transport(transport).build().unwrap();

    let start = Instant::now();
    let result = exporter.export(vec![SpanRecord::named("GET /ping")]);
    assert_eq!(result, ExportResult::Failure);
    assert!(completed.load(Ordering::SeqCst));
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn flush_and_shutdown_do_no_io() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    assert_eq!(exporter.flush(), ExportResult::Success);
    exporter.shutdown();
    exporter.shutdown();
    assert_eq!(transport.calls(), 0);
}

#[test]
fn shutdown_does_not_change_later_exports() {
    let transport = Arc::new(Recording::default());
    let exporter = exporter(&transport);

    exporter.shutdown();
    exporter.shutdown();
    assert_eq!(
        exporter.export(vec![SpanRecord::named("GET /ping")]),
        ExportResult::Success
    );
    assert_eq!(transport.calls(), 1);

    exporter.shutdown();
    assert!(exporter.export(vec![]).is_success());
    assert_eq!(transport.calls(), 2);
}

#[test]
fn flush_succeeds_after_failed_export() {
    let exporter = builder(COLLECTOR)
        .with_transport(Unreachable::default())
        .build()
        .unwrap();

    assert_eq!(
        exporter.export(vec![SpanRecord::named("GET /ping")]),
        ExportResult::Failure
    );
    assert_eq!(exporter.flush(), ExportResult::Success);
}

#[test]
fn http_client_transport_reports_response() {
    let exporter = builder(COLLECTOR)
        .with_http_client(StatusClient(404))
        .build()
        .unwrap();

    assert_eq!(
        exporter.export(vec![SpanRecord::named("GET /ping")]),
        ExportResult::Success
    );
}

#[cfg(feature = "rt-tokio")]
#[test]
fn tokio_transport_completes_on_runtime() {
    use zipkin_exporter::transport::TokioTransport;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let exporter = builder(COLLECTOR)
        .with_transport(TokioTransport::new(
            StatusClient(202),
            runtime.handle().clone(),
        ))
        .build()
        .unwrap();

    assert!(exporter
        .export(vec![SpanRecord::named("GET /ping")])
        .is_success());
}
