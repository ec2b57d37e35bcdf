use std::net::Ipv4Addr;

const NETDASH_PORT: &str = "NETDASH_PORT";

pub const DEFAULT_PORT: u16 = 5000;

pub fn get_port() -> Option<u16> {
    std::env::var(NETDASH_PORT).ok().and_then(|res| res.parse().ok())
}

const NETDASH_ADDR: &str = "NETDASH_ADDR";

pub const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Option<Ipv4Addr> {
    std::env::var(NETDASH_ADDR).ok().and_then(|res| res.parse().ok())
}

const NETDASH_TOKEN: &str = "NETDASH_TOKEN";

pub fn get_token() -> Option<String> {
    std::env::var(NETDASH_TOKEN).ok().filter(|token| !token.is_empty())
}

/// Round a millisecond measurement to two decimals
pub fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
