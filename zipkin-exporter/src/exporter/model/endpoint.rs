use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use typed_builder::TypedBuilder;

/// The network context of a node in the service graph.
///
/// Serialized in the Zipkin v2 shape, e.g.
/// `{"serviceName":"frontend","ipv4":"10.0.0.7","port":8080}`.
#[derive(TypedBuilder, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[builder(setter(strip_option, into), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) service_name: Option<String>,
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ipv4: Option<Ipv4Addr>,
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ipv6: Option<Ipv6Addr>,
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) port: Option<u16>,
}

impl Endpoint {
    /// Creates an endpoint for `service_name`, taking the address and port
    /// from `socket_addr` when one is given.
    pub fn new(service_name: String, socket_addr: Option<SocketAddr>) -> Self {
        match socket_addr {
            Some(SocketAddr::V4(v4)) => Endpoint::builder()
                .service_name(service_name)
                .ipv4(*v4.ip())
                .port(v4.port())
                .build(),
            Some(SocketAddr::V6(v6)) => Endpoint::builder()
                .service_name(service_name)
                .ipv6(*v6.ip())
                .port(v6.port())
                .build(),
            None => Endpoint::builder().service_name(service_name).build(),
        }
    }

    /// Lowercase label of the service this endpoint belongs to.
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// IPv4 address of the host, if known.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4
    }

    /// IPv6 address of the host, if known.
    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6
    }

    /// Port of the service, if known.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns `true` if no field of the endpoint is set.
    pub fn is_empty(&self) -> bool {
        self.service_name.is_none()
            && self.ipv4.is_none()
            && self.ipv6.is_none()
            && self.port.is_none()
    }
}
