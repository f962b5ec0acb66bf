//! Identity of the running process, resolved once and reused for every request.

use std::{
    net::{IpAddr, UdpSocket},
    sync::LazyLock,
};

pub const UNKNOWN: &str = "unknown";

static HOSTNAME: LazyLock<String> = LazyLock::new(|| {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
});

static IP: LazyLock<String> = LazyLock::new(|| {
    outbound_ipv4()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
});

/// Hostname of the machine, or `"unknown"`.
pub fn hostname() -> &'static str {
    &HOSTNAME
}

/// First non-loopback IPv4 address of the interface used for outbound traffic, or `"unknown"`.
pub fn ip() -> &'static str {
    &IP
}

// Connecting a UDP socket sends nothing, it only asks the kernel for a route.
fn outbound_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();

    match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(ip),
        _ => None,
    }
}
