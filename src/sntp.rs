//! Minimal SNTP (RFC 4330) client packet handling.

use crate::error::SntpError;

pub const PACKET_LEN: usize = 48;

/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01.
const NTP_UNIX_DELTA: i64 = 2_208_988_800;
/// Length of one NTP era in seconds.
const NTP_ERA: i64 = 1 << 32;

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;
const TRANSMIT_OFFSET: usize = 40;

/// Client request: LI unsynchronized, version 4, client mode.
pub fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = 0b11 << 6 | 4 << 3 | MODE_CLIENT;
    packet[1] = 0; // stratum
    packet[2] = 6; // poll interval
    packet[3] = 0xEC; // precision
    packet
}

/// Server transmit time as Unix seconds (UTC).
pub fn parse_reply(reply: &[u8]) -> Result<i64, SntpError> {
    if reply.len() < PACKET_LEN {
        return Err(SntpError::Truncated);
    }
    let mode = reply[0] & 0b111;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(SntpError::UnexpectedMode(mode));
    }
    if reply[1] == 0 {
        return Err(SntpError::KissOfDeath);
    }

    let mut secs = [0u8; 4];
    secs.copy_from_slice(&reply[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4]);
    let ntp_secs = u32::from_be_bytes(secs);
    if ntp_secs == 0 {
        return Err(SntpError::ZeroTransmit);
    }

    // top bit clear means era 1 (from 2036-02-07 onwards)
    let mut secs = i64::from(ntp_secs);
    if ntp_secs & 0x8000_0000 == 0 {
        secs += NTP_ERA;
    }
    Ok(secs - NTP_UNIX_DELTA)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_with(ntp_secs: u32) -> [u8; PACKET_LEN] {
        let mut reply = [0u8; PACKET_LEN];
        reply[0] = 0b00_100_100;
        reply[1] = 2;
        reply[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4].copy_from_slice(&ntp_secs.to_be_bytes());
        reply
    }

    #[test]
    fn request_header() {
        let packet = request();
        assert_eq!(packet[0], 0xE3);
        assert_eq!(packet[2], 6);
        assert_eq!(packet[3], 0xEC);
        assert!(packet[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn transmit_time_converts_to_unix() {
        let unix = 1_643_308_074i64;
        let reply = reply_with((unix + NTP_UNIX_DELTA) as u32);
        assert_eq!(parse_reply(&reply), Ok(unix));
    }

    #[test]
    fn era_one_rolls_over() {
        // 2036-02-07 06:28:16 UTC is NTP era 1 second 0; one second later
        assert_eq!(parse_reply(&reply_with(1)), Ok(NTP_ERA - NTP_UNIX_DELTA + 1));
    }

    #[test]
    fn short_reply_is_truncated() {
        assert_eq!(parse_reply(&[0x24; 47]), Err(SntpError::Truncated));
    }

    #[test]
    fn client_mode_reply_is_rejected() {
        let mut reply = reply_with(3_852_296_874);
        reply[0] = 0xE3;
        assert_eq!(parse_reply(&reply), Err(SntpError::UnexpectedMode(3)));
    }

    #[test]
    fn stratum_zero_is_kiss_of_death() {
        let mut reply = reply_with(3_852_296_874);
        reply[1] = 0;
        assert_eq!(parse_reply(&reply), Err(SntpError::KissOfDeath));
    }

    #[test]
    fn zero_transmit_is_rejected() {
        assert_eq!(parse_reply(&reply_with(0)), Err(SntpError::ZeroTransmit));
    }
}
