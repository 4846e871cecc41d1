use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::debug;

/// Short TCP connect attempt against a known endpoint.
///
/// Every resolved address shares one deadline, so a probe never takes longer
/// than `timeout` once name resolution has returned.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn probe(&self) -> bool {
        let addrs = match self.addr.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("probe {}: resolve failed: {}", self.addr, e);
                return false;
            }
        };

        let deadline = Instant::now() + self.timeout;
        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(_) => return true,
                Err(e) => debug!("probe {} ({}): {}", self.addr, addr, e),
            }
        }
        false
    }
}
