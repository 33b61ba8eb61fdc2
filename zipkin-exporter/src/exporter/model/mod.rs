//! Zipkin v2 wire model and the conversion from SDK spans.
use opentelemetry::{
    trace::{SpanId, SpanKind, Status},
    KeyValue,
};
use opentelemetry_sdk::export::trace::SpanData;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

pub(crate) mod annotation;
pub(crate) mod endpoint;
pub(crate) mod span;

pub use annotation::Annotation;
pub use endpoint::Endpoint;
pub use span::{Kind, Span};

const INSTRUMENTATION_LIBRARY_NAME: &str = "otel.library.name";
const INSTRUMENTATION_LIBRARY_VERSION: &str = "otel.library.version";
const OTEL_ERROR_DESCRIPTION: &str = "error";
const OTEL_STATUS_CODE: &str = "otel.status_code";
const SPAN_KIND: &str = "span.kind";

const SERVICE_NAME: &str = "service.name";
const NET_HOST_IP: &str = "net.host.ip";
const NET_HOST_PORT: &str = "net.host.port";
const PEER_SERVICE: &str = "peer.service";
const NET_PEER_IP: &str = "net.peer.ip";
const NET_SOCK_PEER_ADDR: &str = "net.sock.peer.addr";
const NET_PEER_PORT: &str = "net.peer.port";

pub(crate) fn to_micros(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_micros() as u64
}

/// Converts `SpanKind` into an `Option<span::Kind>`
fn into_zipkin_span_kind(kind: SpanKind) -> Option<Kind> {
    match kind {
        SpanKind::Client => Some(Kind::Client),
        SpanKind::Server => Some(Kind::Server),
        SpanKind::Producer => Some(Kind::Producer),
        SpanKind::Consumer => Some(Kind::Consumer),
        SpanKind::Internal => None,
    }
}

/// Converts a `SpanData` into a Zipkin [`Span`].
///
/// `local_endpoint` is used unless the span names its own service through a
/// `service.name` attribute.
pub fn into_zipkin_span(local_endpoint: &Endpoint, span_data: SpanData) -> Span {
    let own_endpoint = endpoint_from_attributes(
        &span_data.attributes,
        SERVICE_NAME,
        &[NET_HOST_IP],
        NET_HOST_PORT,
    )
    .filter(|endpoint| endpoint.service_name().is_some());
    let remote_endpoint = endpoint_from_attributes(
        &span_data.attributes,
        PEER_SERVICE,
        &[NET_PEER_IP, NET_SOCK_PEER_ADDR],
        NET_PEER_PORT,
    );

    let mut user_defined_span_kind = false;
    let mut tags = map_from_kvs(
        span_data
            .attributes
            .into_iter()
            .inspect(|kv| {
                if kv.key.as_str() == SPAN_KIND {
                    user_defined_span_kind = true;
                }
            })
            .chain(
                [
                    (
                        INSTRUMENTATION_LIBRARY_NAME,
                        Some(span_data.instrumentation_lib.name),
                    ),
                    (
                        INSTRUMENTATION_LIBRARY_VERSION,
                        span_data.instrumentation_lib.version,
                    ),
                ]
                .into_iter()
                .filter_map(|(key, val)| val.map(|val| KeyValue::new(key, val))),
            )
            .filter(|kv| kv.key.as_str() != OTEL_ERROR_DESCRIPTION),
    );

    match span_data.status {
        Status::Unset => {}
        Status::Ok => {
            tags.insert(OTEL_STATUS_CODE.into(), "OK".into());
        }
        Status::Error {
            description: message,
        } => {
            tags.insert(OTEL_STATUS_CODE.into(), "ERROR".into());
            tags.insert(OTEL_ERROR_DESCRIPTION.into(), message.into_owned());
        }
    };

    let mut span = Span::builder()
        .trace_id(span_data.span_context.trace_id().to_string())
        .id(span_data.span_context.span_id().to_string())
        .name(span_data.name.into_owned())
        .kind(if user_defined_span_kind {
            None
        } else {
            into_zipkin_span_kind(span_data.span_kind)
        })
        .timestamp(to_micros(span_data.start_time))
        .duration(
            span_data
                .end_time
                .duration_since(span_data.start_time)
                .unwrap_or_else(|_| Duration::from_secs(0))
                .as_micros() as u64,
        )
        .local_endpoint(own_endpoint.unwrap_or_else(|| local_endpoint.clone()))
        .remote_endpoint(remote_endpoint)
        .annotations(span_data.events.into_iter().map(Into::into).collect())
        .tags(tags)
        .build();

    if span_data.parent_span_id != SpanId::INVALID {
        span.parent_id = Some(span_data.parent_span_id.to_string());
    }
    span
}

/// Builds an endpoint from span attributes. Returns `None` when none of the
/// named attributes is present with a usable value.
fn endpoint_from_attributes(
    attributes: &[KeyValue],
    service_key: &str,
    ip_keys: &[&str],
    port_key: &str,
) -> Option<Endpoint> {
    let lookup = |key: &str| {
        attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    };

    let service_name = lookup(service_key);
    let ip = ip_keys
        .iter()
        .find_map(|key| lookup(key).and_then(|ip| ip.parse::<IpAddr>().ok()));
    let port = lookup(port_key).and_then(|port| port.parse::<u16>().ok());

    let mut endpoint = Endpoint::default();
    endpoint.service_name = service_name;
    match ip {
        Some(IpAddr::V4(v4)) => endpoint.ipv4 = Some(v4),
        Some(IpAddr::V6(v6)) => endpoint.ipv6 = Some(v6),
        None => {}
    }
    endpoint.port = port;
    Some(endpoint).filter(|endpoint| !endpoint.is_empty())
}

fn map_from_kvs<T>(kvs: T) -> HashMap<String, String>
where
    T: IntoIterator<Item = KeyValue>,
{
    let mut map: HashMap<String, String> = HashMap::new();
    for kv in kvs {
        map.insert(kv.key.into(), kv.value.to_string());
    }
    map
}
