pub mod adapter;

pub use adapter::{V17Adapter, PROTOCOL_VERSION};
