//! HTTP adapters used by front ends to reach the server.

mod recorder;
mod session;

pub use recorder::RemoteRecorder;
pub use session::RemoteSessionStore;
