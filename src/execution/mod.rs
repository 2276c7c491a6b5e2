//! Request execution: HTTP transport abstraction and the dispatcher.

pub mod dispatch;
pub mod transport;

pub use dispatch::Dispatcher;
pub use transport::{
    ByteStream, HttpTransport, HttpTransportRequest, HttpTransportResponse, ReqwestTransport,
};
