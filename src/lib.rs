//! sigfox-codec: Pure, offline codec for the Sigfox low-power wide-area
//! radio link.
//!
//! No async, no I/O — just the uplink and downlink frame transforms: frame
//! construction, AES-CBC-MAC authentication, CRC, BCH(15,11) forward error
//! correction, replica convolutional coding, and LFSR scrambling, plus
//! their inverses on reception. The only external primitive this crate
//! consumes is single-block AES-128 encryption (see [`aes::BlockEncrypt128`]).
#![forbid(unsafe_code)]

pub mod aes;
pub mod bch;
pub mod conv;
pub mod crc;
pub mod downlink;
pub mod error;
pub mod mac;
pub mod nibble;
pub mod scrambler;
pub mod session;
pub mod uplink;

pub use downlink::{decode_downlink, encode_downlink};
pub use error::{UplinkDecodeError, UplinkEncodeError};
pub use session::{
    EncodedDownlink, EncodedUplink, PlainDownlink, PlainUplink, SessionContext,
    DOWNLINK_FRAME_LEN, DOWNLINK_PREAMBLE, UPLINK_MAX_FRAME_LEN, UPLINK_MAX_PAYLOAD_LEN,
    UPLINK_PREAMBLE_NIBBLES,
};
pub use uplink::{decode_uplink, encode_uplink};
