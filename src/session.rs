//! Shared data types for the uplink/downlink codec.

/// Maximum uplink payload length, in bytes.
pub const UPLINK_MAX_PAYLOAD_LEN: usize = 12;
/// Size of the buffer each uplink replica frame is stored in. A replica's
/// actual content may be shorter, as given by `framelen_nibbles`.
pub const UPLINK_MAX_FRAME_LEN: usize = 24;
/// Fixed length of an encoded downlink frame, in bytes.
pub const DOWNLINK_FRAME_LEN: usize = 15;

/// Nibble stream of the uplink radio preamble, excluded from [`EncodedUplink`].
pub const UPLINK_PREAMBLE_NIBBLES: [u8; 5] = [0xa, 0xa, 0xa, 0xa, 0xa];

/// Byte sequence of the downlink radio preamble, excluded from [`EncodedDownlink`].
pub const DOWNLINK_PREAMBLE: [u8; 13] = [
    0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xb2, 0x27,
];

/// Session state shared by uplink and downlink operations: device identity,
/// the current sequence number, and the network authentication key.
///
/// The caller owns this value and is responsible for advancing
/// `sequence_number` between messages; the codec never persists it across
/// calls. On uplink decode, `device_id` and `sequence_number` are outputs
/// rather than inputs. `key` is read only when MAC checking is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub device_id: u32,
    /// A 12-bit value carried in a 16-bit field.
    pub sequence_number: u16,
    pub key: [u8; 16],
}

/// Plaintext uplink message, as given to [`crate::uplink::encode_uplink`] or
/// produced by [`crate::uplink::decode_uplink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainUplink {
    pub payload: [u8; UPLINK_MAX_PAYLOAD_LEN],
    pub payload_len: u8,
    pub request_downlink: bool,
    /// A single-bit uplink carries one bit of payload inline in the flags
    /// nibble instead of a byte payload; `payload_len` must be 0 when set.
    pub single_bit: bool,
    /// On decode, always true: the reference encoder always produces all
    /// three replica transmissions, regardless of what this flag requests.
    pub generate_replicas: bool,
}

impl PlainUplink {
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len as usize]
    }
}

/// The three redundant transmissions of one uplink message (the initial
/// frame plus two convolutionally-coded replicas), sharing one odd nibble
/// length. Excludes the 5-nibble preamble.
#[derive(Debug, Clone, Copy)]
pub struct EncodedUplink {
    pub frames: [[u8; UPLINK_MAX_FRAME_LEN]; 3],
    pub framelen_nibbles: u8,
}

/// Plaintext downlink message. [`crate::downlink::encode_downlink`] reads
/// only `payload`; the other fields are decode-only outputs describing
/// whether the frame's integrity checks passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlainDownlink {
    pub payload: [u8; 8],
    pub crc_ok: bool,
    pub mac_ok: bool,
    pub fec_corrected: bool,
}

/// 15 bytes of scrambled, BCH-encoded, bit-interleaved downlink frame.
/// Excludes the 13-byte preamble. There is no downlink encode/decode error
/// type: malformed frames simply decode to a [`PlainDownlink`] with failing
/// flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedDownlink(pub [u8; DOWNLINK_FRAME_LEN]);
