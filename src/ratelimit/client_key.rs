//! Client identity extraction for rate limiting
//!
//! This module turns an inbound request into the opaque key the limiter
//! counts against:
//! - `Remote` uses the socket address
//! - `Forwarded` walks X-Forwarded-For right-to-left, skipping trusted proxies
//! - `Header` uses the value of a named header (API key, session token)
//!
//! Whatever the policy, a request that does not carry the expected data
//! falls back to the socket address.

use axum::http::HeaderMap;
use ipnet::IpNet;
use std::net::IpAddr;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub enum ClientKeyPolicy {
    #[default]
    Remote,
    Forwarded {
        trusted_proxies: Vec<IpNet>,
        num_trusted_proxies: Option<usize>,
    },
    Header {
        name: String,
    },
}

/// Extract the rate limiting key for a request
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `socket_ip` - The socket remote address (fallback)
/// * `policy` - How the transport identifies clients
pub fn extract_client_key(headers: &HeaderMap, socket_ip: IpAddr, policy: &ClientKeyPolicy) -> String {
    match policy {
        ClientKeyPolicy::Remote => socket_ip.to_string(),
        ClientKeyPolicy::Forwarded {
            trusted_proxies,
            num_trusted_proxies,
        } => extract_forwarded_ip(headers, socket_ip, trusted_proxies, *num_trusted_proxies)
            .unwrap_or(socket_ip)
            .to_string(),
        ClientKeyPolicy::Header { name } => headers
            .get(name.as_str())
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("header:{v}"))
            .unwrap_or_else(|| {
                warn!(header = %name, "client key header missing, using socket address");
                socket_ip.to_string()
            }),
    }
}

/// Parse X-Forwarded-For with right-to-left trust validation
///
/// The socket peer is the last hop, so it must itself be trusted before
/// any header content is believed.
fn extract_forwarded_ip(
    headers: &HeaderMap,
    socket_ip: IpAddr,
    trusted_proxies: &[IpNet],
    num_trusted_proxies: Option<usize>,
) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    let ips: Vec<IpAddr> = xff
        .split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .collect();

    if ips.is_empty() {
        return None;
    }

    if let Some(num_trusted) = num_trusted_proxies {
        if ips.len() > num_trusted {
            return Some(ips[ips.len() - num_trusted - 1]);
        }
        // Not enough IPs in chain, return the leftmost (least trusted)
        return ips.first().copied();
    }

    if !trusted_proxies.is_empty() {
        let is_trusted = |ip: &IpAddr| trusted_proxies.iter().any(|net| net.contains(ip));
        if !is_trusted(&socket_ip) {
            return None;
        }
        return ips
            .iter()
            .rev()
            .find(|ip| !is_trusted(ip))
            .or_else(|| ips.first())
            .copied();
    }

    ips.last().copied()
}
