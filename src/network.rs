//! Network time acquisition.

use crate::config::ClockConfig;
use crate::error::LinkError;
use crate::sntp;
use crate::timestamp::Timestamp;

/// Provisioning / connectivity manager.
pub trait Connectivity {
    /// Blocks for at most `timeout_secs`; `true` once the network is usable.
    fn establish_connection(&mut self, timeout_secs: u32) -> bool;
}

/// Source of the current time from a remote service. Blocking, control loop only.
pub trait NetworkTime {
    fn fetch(&mut self) -> Option<Timestamp>;
}

/// One UDP request/response exchange.
pub trait UdpLink {
    /// Sends `request` to `host:port` and writes the first reply into `response`,
    /// returning its length.
    fn exchange(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, LinkError>;
}

/// SNTP time service client over a [`UdpLink`].
pub struct SntpClient<L> {
    link: L,
    server: &'static str,
    port: u16,
    utc_offset_secs: i32,
    timeout_ms: u32,
    epoch: Option<i64>,
}

impl<L: UdpLink> SntpClient<L> {
    pub fn new(link: L, config: &ClockConfig) -> Self {
        Self {
            link,
            server: config.ntp_server,
            port: config.ntp_port,
            utc_offset_secs: config.utc_offset_secs,
            timeout_ms: config.response_timeout_ms,
            epoch: None,
        }
    }

    /// Queries the server once. On success the offset-adjusted epoch is
    /// available from [`epoch_time`](Self::epoch_time).
    pub fn update(&mut self) -> bool {
        let request = sntp::request();
        let mut reply = [0u8; sntp::PACKET_LEN];

        let len = match self
            .link
            .exchange(self.server, self.port, &request, &mut reply, self.timeout_ms)
        {
            Ok(len) => len,
            Err(err) => {
                warn!("time server exchange failed: {}", err);
                return false;
            }
        };

        match sntp::parse_reply(&reply[..len]) {
            Ok(utc) => {
                let local = utc + i64::from(self.utc_offset_secs);
                debug!("time server epoch {}", local);
                self.epoch = Some(local);
                true
            }
            Err(err) => {
                warn!("bad time server reply: {}", err);
                false
            }
        }
    }

    /// Local epoch seconds from the last successful update.
    pub fn epoch_time(&self) -> Option<i64> {
        self.epoch
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

impl<L: UdpLink> NetworkTime for SntpClient<L> {
    fn fetch(&mut self) -> Option<Timestamp> {
        if !self.update() {
            return None;
        }
        self.epoch.and_then(Timestamp::from_unix)
    }
}

impl<L: Connectivity> Connectivity for SntpClient<L> {
    fn establish_connection(&mut self, timeout_secs: u32) -> bool {
        self.link.establish_connection(timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::ScriptedLink;

    const UTC: i64 = 1_700_000_000;

    #[test]
    fn fetch_applies_utc_offset() {
        let mut client = SntpClient::new(ScriptedLink::answering(UTC), &ClockConfig::DEFAULT);
        let ts = client.fetch().unwrap();
        assert_eq!(ts.unix(), UTC + 8 * 3600);
        assert_eq!(client.epoch_time(), Some(UTC + 8 * 3600));
    }

    #[test]
    fn request_goes_to_configured_server() {
        let mut client = SntpClient::new(ScriptedLink::answering(UTC), &ClockConfig::DEFAULT);
        assert!(client.update());
        let link = client.link();
        assert_eq!(link.requests.len(), 1);
        assert_eq!(link.requests[0].0, "ntp1.aliyun.com:123");
        assert_eq!(link.requests[0].1[0], 0xE3);
    }

    #[test]
    fn link_failure_yields_nothing() {
        let mut client = SntpClient::new(ScriptedLink::failing(LinkError::Timeout), &ClockConfig::DEFAULT);
        assert!(!client.update());
        assert_eq!(client.fetch(), None);
        assert_eq!(client.epoch_time(), None);
    }

    #[test]
    fn malformed_reply_keeps_previous_epoch() {
        let mut client = SntpClient::new(ScriptedLink::answering(UTC), &ClockConfig::DEFAULT);
        assert!(client.update());
        client.link_mut().reply = Some(std::vec![0u8; 12]);
        assert!(!client.update());
        assert_eq!(client.epoch_time(), Some(UTC + 8 * 3600));
    }

    #[test]
    fn connectivity_is_forwarded_to_the_link() {
        let mut link = ScriptedLink::answering(UTC);
        link.online = false;
        let mut client = SntpClient::new(link, &ClockConfig::DEFAULT);
        assert!(!client.establish_connection(1));
        client.link_mut().online = true;
        assert!(client.establish_connection(1));
    }
}
