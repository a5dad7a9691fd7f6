//! Up-front environment checks.
//!
//! Productized releases need the internal build infrastructure. The check
//! runs once before any repository is touched so a fleet is never half
//! released from the wrong network.

use crate::error::{Error, Result};
use std::net::ToSocketAddrs;

/// Fails unless `host` resolves.
pub fn ensure_host_reachable(host: &str) -> Result<()> {
    let resolved = (host, 443)
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false);
    if resolved {
        log::debug!("{} resolves, environment check passed", host);
        Ok(())
    } else {
        Err(Error::Environment {
            message: format!(
                "cannot resolve '{}'; releases must run from the internal network (VPN)",
                host
            ),
        })
    }
}

/// Runs [`ensure_host_reachable`] when a host is required.
pub fn check(required_host: Option<&str>) -> Result<()> {
    match required_host {
        Some(host) => ensure_host_reachable(host),
        None => Ok(()),
    }
}
