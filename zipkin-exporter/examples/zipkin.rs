use opentelemetry::{
    global,
    trace::{Span, TraceError, Tracer},
    KeyValue,
};
use opentelemetry_sdk::trace::TracerProvider;
use std::thread;
use std::time::Duration;
use zipkin_exporter::ZipkinExporter;

fn bar() {
    let tracer = global::tracer("component-bar");
    let mut span = tracer.start("bar");
    span.set_attribute(KeyValue::new("peer.service", "inventory"));
    thread::sleep(Duration::from_millis(6));
    span.end()
}

fn init_traces() -> Result<TracerProvider, TraceError> {
    let exporter = ZipkinExporter::builder()
        .with_service_name("trace-demo")
        .build()?;

    Ok(TracerProvider::builder()
        .with_simple_exporter(exporter)
        .build())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let provider = init_traces()?;
    global::set_tracer_provider(provider);

    let tracer = global::tracer("component-foo");
    tracer.in_span("foo", |_cx| {
        thread::sleep(Duration::from_millis(6));
        bar();
        thread::sleep(Duration::from_millis(6));
    });

    global::shutdown_tracer_provider();
    Ok(())
}
