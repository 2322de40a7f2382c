use serde::Serialize;

/// Running counters for one protocol instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames whose transmission completed.
    pub frames_sent: u64,
    /// Verified frames delivered by the receive path.
    pub frames_received: u64,
    /// Every byte fed to the receive path.
    pub bytes_received: u64,
    /// Bytes dropped while waiting for a start delimiter.
    pub noise_bytes: u64,
    /// Frames dropped because the integrity byte did not match.
    pub crc_errors: u64,
    /// Frames dropped for any other receive-path reason.
    pub frame_errors: u64,
    /// Sends rejected by encoding or failed by the transport.
    pub tx_errors: u64,
    /// Partial frames discarded by the idle timeout.
    pub timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_field_names() {
        let stats = LinkStats {
            frames_sent: 2,
            crc_errors: 1,
            ..LinkStats::default()
        };
        let json = serde_json::to_value(stats).unwrap();

        assert_eq!(json["frames_sent"], 2);
        assert_eq!(json["crc_errors"], 1);
        assert_eq!(json["timeouts"], 0);
    }
}
