//! daemon-client: Networked half of the Syncrypt desktop client.
//!
//! Talks to the local daemon's REST and streaming APIs and drives the
//! event-dispatched application state from client-core. The GUI layer
//! consumes `AppState` and feeds dialog calls in; everything here is
//! usable headless, which is what the `syncrypt-client` binary does.

pub mod api;
pub mod app;
pub mod http;
pub mod poller;
pub mod stream;

// Re-export key types for convenience
pub use api::DaemonApi;
pub use app::{AppEvent, AppState, Command, Endpoint};
pub use http::{build_url, stream_url, ApiConfig, HttpClient, AUTH_HEADER};
pub use poller::{next_delay, PollConfig, PollSchedule};
pub use stream::{subscribe, StreamEvent, StreamTarget, Subscription};
