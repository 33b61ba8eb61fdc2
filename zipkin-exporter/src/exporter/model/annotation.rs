use opentelemetry::trace::Event;
use serde::Serialize;
use typed_builder::TypedBuilder;

use super::to_micros;

/// A timestamped event attached to a span.
#[derive(TypedBuilder, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
    #[builder(setter(strip_option, into), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Converts `Event` into an `annotation::Annotation`
impl From<Event> for Annotation {
    fn from(event: Event) -> Annotation {
        Annotation::builder()
            .timestamp(to_micros(event.timestamp))
            .value(event.name.into_owned())
            .build()
    }
}
