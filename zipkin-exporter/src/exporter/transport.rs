//! Asynchronous request transports and the blocking bridge over them.
use crate::exporter::Error;
use futures_channel::oneshot;
use opentelemetry_http::{Bytes, HttpClient, HttpError, Request, Response};
use std::fmt::Debug;
use std::sync::Arc;
use std::thread;

/// Outcome of one request as reported by a [`Transport`].
pub type TransportResult = Result<Response<Bytes>, HttpError>;

/// Callback a [`Transport`] invokes once the request has completed.
pub type Completion = Box<dyn FnOnce(TransportResult) + Send + 'static>;

/// An asynchronous request/response primitive.
///
/// `submit` must return without waiting for the response, and must invoke
/// `on_complete` exactly once, on any thread. Dropping `on_complete` without
/// invoking it is reported by the exporter as a failed export.
///
/// The transport owns every timeout: the exporter waits until `on_complete`
/// runs.
pub trait Transport: Debug + Send + Sync {
    /// Start sending `request`.
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion) {
        (**self).submit(request, on_complete)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion) {
        (**self).submit(request, on_complete)
    }
}

/// Runs each request of an [`HttpClient`] on a dedicated thread.
///
/// Suited to clients that do not need an async runtime, such as
/// `reqwest::blocking::Client`.
#[derive(Debug, Clone)]
pub struct HttpClientTransport {
    client: Arc<dyn HttpClient>,
}

impl HttpClientTransport {
    /// Wraps `client`.
    pub fn new<T: HttpClient + 'static>(client: T) -> Self {
        HttpClientTransport {
            client: Arc::new(client),
        }
    }
}

impl Transport for HttpClientTransport {
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion) {
        let client = Arc::clone(&self.client);
        let spawned = thread::Builder::new()
            .name("zipkin-export".to_string())
            .spawn(move || on_complete(futures_executor::block_on(client.send(request))));
        // on failure the completion is dropped with the closure
        if let Err(err) = spawned {
            tracing::debug!(
                name: "HttpClientTransport.SpawnFailed",
                error = %err
            );
        }
    }
}

/// Runs each request of an [`HttpClient`] as a task on a Tokio runtime.
///
/// The exporter blocks its caller while the task runs, so exports must not
/// be issued from a thread driving the same single-threaded runtime.
#[cfg(feature = "rt-tokio")]
#[derive(Debug, Clone)]
pub struct TokioTransport {
    client: Arc<dyn HttpClient>,
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "rt-tokio")]
impl TokioTransport {
    /// Wraps `client`, spawning requests through `handle`.
    pub fn new<T: HttpClient + 'static>(client: T, handle: tokio::runtime::Handle) -> Self {
        TokioTransport {
            client: Arc::new(client),
            handle,
        }
    }
}

#[cfg(feature = "rt-tokio")]
impl Transport for TokioTransport {
    fn submit(&self, request: Request<Vec<u8>>, on_complete: Completion) {
        let client = Arc::clone(&self.client);
        self.handle.spawn(async move {
            let result = client.send(request).await;
            on_complete(result);
        });
    }
}

/// Submits `request` and parks the calling thread until the transport
/// completes it.
pub(crate) fn send_blocking(
    transport: &dyn Transport,
    request: Request<Vec<u8>>,
) -> Result<Response<Bytes>, Error> {
    let (sender, receiver) = oneshot::channel();
    transport.submit(
        request,
        Box::new(move |result| {
            // the receiver only goes away if the caller panicked
            let _ = sender.send(result);
        }),
    );

    match futures_executor::block_on(receiver) {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(Error::Transport(err)),
        Err(oneshot::Canceled) => Err(Error::NoResponse),
    }
}
