//! Resolution of the local endpoint attached to every exported span.
use crate::exporter::model::Endpoint;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

/// Default service name if neither a service name nor a host name is available.
const DEFAULT_SERVICE_NAME: &str = "OpenTelemetry";

/// Strategy used to discover the IP addresses reported in the local endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressDiscovery {
    /// Report the service name only.
    Disabled,
    /// Enumerate the host's network interfaces.
    ///
    /// Falls back to a name-only endpoint if the interfaces cannot be read or
    /// the crate was built without the `interface-discovery` feature.
    Interfaces,
    /// Pick addresses from a fixed list, in order.
    Static(Vec<String>),
}

impl AddressDiscovery {
    /// The best strategy supported by this build.
    pub fn available() -> Self {
        if cfg!(feature = "interface-discovery") {
            AddressDiscovery::Interfaces
        } else {
            AddressDiscovery::Disabled
        }
    }

    /// Candidate addresses in the order they should be considered, or `None`
    /// if no candidates can be produced.
    fn candidates(&self) -> Option<Vec<String>> {
        match self {
            AddressDiscovery::Disabled => None,
            AddressDiscovery::Interfaces => interface_addresses(),
            AddressDiscovery::Static(addresses) => Some(addresses.clone()),
        }
    }
}

impl Default for AddressDiscovery {
    fn default() -> Self {
        AddressDiscovery::available()
    }
}

#[cfg(feature = "interface-discovery")]
fn interface_addresses() -> Option<Vec<String>> {
    match if_addrs::get_if_addrs() {
        Ok(mut interfaces) => {
            // stable sort keeps interface order within each group
            interfaces.sort_by_key(|interface| interface.is_loopback());
            Some(
                interfaces
                    .into_iter()
                    .map(|interface| interface.ip().to_string())
                    .collect(),
            )
        }
        Err(err) => {
            tracing::debug!(
                name: "EndpointResolver.InterfaceDiscoveryFailed",
                error = %err
            );
            None
        }
    }
}

#[cfg(not(feature = "interface-discovery"))]
fn interface_addresses() -> Option<Vec<String>> {
    None
}

/// Computes the local [`Endpoint`] of an exporter.
///
/// The service name is the configured override, else the host name, else
/// `"OpenTelemetry"`. Addresses come from the configured socket address if
/// any, else from the [`AddressDiscovery`] strategy.
#[derive(Clone, Debug, Default)]
pub struct EndpointResolver {
    service_name: Option<String>,
    host_name: Option<String>,
    service_addr: Option<SocketAddr>,
    discovery: AddressDiscovery,
}

impl EndpointResolver {
    /// Creates a resolver using the process host name and the best available
    /// address discovery.
    pub fn new() -> Self {
        EndpointResolver::default()
    }

    /// Assign the service name, taking precedence over the host name.
    pub fn with_service_name<T: Into<String>>(mut self, name: T) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Assign the host name used when no service name is set.
    ///
    /// Defaults to the host name reported by the operating system.
    pub fn with_host_name<T: Into<String>>(mut self, host_name: T) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    /// Assign an explicit address and port, skipping address discovery.
    pub fn with_service_address(mut self, addr: SocketAddr) -> Self {
        self.service_addr = Some(addr);
        self
    }

    /// Assign the address discovery strategy.
    pub fn with_address_discovery(mut self, discovery: AddressDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Resolves the endpoint. Never fails: missing information results in a
    /// name-only endpoint.
    pub fn resolve(&self) -> Endpoint {
        let service_name = self
            .service_name
            .clone()
            .or_else(|| self.host_name.clone())
            .or_else(system_host_name)
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

        if let Some(addr) = self.service_addr {
            return Endpoint::new(service_name, Some(addr));
        }

        let mut endpoint = Endpoint::new(service_name, None);
        if let Some(candidates) = self.discovery.candidates() {
            endpoint.ipv4 = candidates
                .iter()
                .find_map(|addr| addr.parse::<Ipv4Addr>().ok());
            endpoint.ipv6 = candidates
                .iter()
                .find_map(|addr| addr.parse::<Ipv6Addr>().ok());
        }
        endpoint
    }
}

fn system_host_name() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
}
