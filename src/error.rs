use thiserror::Error;

/// Errors returned by [`crate::uplink::encode_uplink`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UplinkEncodeError {
    #[error("payload length {0} exceeds the 12-byte uplink maximum")]
    PayloadTooLong(u8),
    #[error("single-bit uplink requires a zero-length payload")]
    SingleBitMismatch,
}

/// Errors returned by [`crate::uplink::decode_uplink`].
///
/// Device ID and sequence number are written into the caller's
/// [`crate::SessionContext`] as soon as they are parsed, before any of these
/// are returned — a CRC or MAC failure does not discard that part of the
/// result.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UplinkDecodeError {
    #[error("frame nibble length is even; uplink frames always end on an odd nibble")]
    FramelenEven,
    #[error("frame type does not match the packet length implied by its class")]
    FtypeMismatch,
    #[error("CRC-16 mismatch in the decoded packet")]
    CrcInvalid,
    #[error("CBC-MAC mismatch in the decoded packet")]
    MacInvalid,
}
