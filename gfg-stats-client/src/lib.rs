mod proxy;

pub use proxy::{DEFAULT_PROXY_URL, ProxyClient};
