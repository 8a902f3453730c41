pub(crate) mod client;
pub(crate) mod request;
pub(crate) mod response;

pub use client::ChatClient;
