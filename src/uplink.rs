//! Uplink frame encoder/decoder (component H): device-to-base-station
//! messages, transmitted as three redundant frames (the plain transmission
//! plus two replicas protected by rate-1:1 convolutional codes) sharing one
//! frame type and one odd nibble length.

use crate::aes::{Aes128Block, BlockEncrypt128};
use crate::conv;
use crate::crc;
use crate::error::{UplinkDecodeError, UplinkEncodeError};
use crate::mac;
use crate::nibble;
use crate::session::{EncodedUplink, PlainUplink, SessionContext, UPLINK_MAX_FRAME_LEN, UPLINK_MAX_PAYLOAD_LEN};

const FTYPE_LEN_NIBBLES: usize = 3;
const FLAGS_LEN_NIBBLES: usize = 1;
const SN_LEN_NIBBLES: usize = 3;
const DEVID_LEN_NIBBLES: usize = 8;
const CRC_LEN_NIBBLES: usize = 4;
const MAX_PACKET_LEN: usize = 20;

const FLAGS_OFFSET: usize = FTYPE_LEN_NIBBLES;
const SN_OFFSET: usize = FLAGS_OFFSET + FLAGS_LEN_NIBBLES;
const DEVID_OFFSET: usize = SN_OFFSET + SN_LEN_NIBBLES;
const PAYLOAD_OFFSET: usize = DEVID_OFFSET + DEVID_LEN_NIBBLES;

/// Column in [`FRAME_TYPES`]/[`PACKET_LEN_BY_CLASS`] for each payload class:
/// single-bit, 1-byte, 4-byte, 8-byte, 12-byte.
const FRAME_TYPES: [[u16; 5]; 3] = [
    [0x06b, 0x08d, 0x35f, 0x611, 0x94c],
    [0x6e0, 0x0d2, 0x598, 0x6bf, 0x971],
    [0x034, 0x302, 0x5a3, 0x72c, 0x997],
];

const PACKET_LEN_BY_CLASS: [usize; 5] = [8, 9, 12, 16, 20];

fn class_index(payload_len: usize, single_bit: bool) -> usize {
    if single_bit {
        0
    } else if payload_len == 1 {
        1
    } else {
        (payload_len - 1) / 4 + 2
    }
}

/// Encode a plaintext uplink into its three redundant frame transmissions.
/// The reference encoder always emits all three frames; `generate_replicas`
/// on the input is a decode-only field and is ignored here.
pub fn encode_uplink(
    uplink: &PlainUplink,
    session: &SessionContext,
) -> Result<EncodedUplink, UplinkEncodeError> {
    encode_uplink_with(&Aes128Block, uplink, session)
}

pub fn encode_uplink_with(
    cipher: &impl BlockEncrypt128,
    uplink: &PlainUplink,
    session: &SessionContext,
) -> Result<EncodedUplink, UplinkEncodeError> {
    let payload_len = uplink.payload_len as usize;
    if payload_len > UPLINK_MAX_PAYLOAD_LEN {
        return Err(UplinkEncodeError::PayloadTooLong(uplink.payload_len));
    }
    if uplink.single_bit && payload_len != 0 {
        return Err(UplinkEncodeError::SingleBitMismatch);
    }

    let class = class_index(payload_len, uplink.single_bit);

    let mut frames = [[0u8; UPLINK_MAX_FRAME_LEN]; 3];
    for (replica, frame) in frames.iter_mut().enumerate() {
        let ftype = FRAME_TYPES[replica][class];
        nibble::write_uint(frame, 0, FTYPE_LEN_NIBBLES, ftype as u32);
    }

    let mut flags: u8 = 0;
    let maclen = if uplink.single_bit {
        flags |= 0b1000 | if uplink.payload[0] != 0 { 0b0100 } else { 0 };
        mac::MIN_MAC_LEN
    } else if payload_len == 1 {
        mac::MIN_MAC_LEN
    } else {
        let len = mac::mac_len(payload_len, false);
        flags |= ((len - mac::MIN_MAC_LEN) as u8) << 2;
        len
    };
    if uplink.request_downlink {
        flags |= 0b0010;
    }

    let mut packet = [0u8; MAX_PACKET_LEN];
    packet[0] = (flags << 4) | (((session.sequence_number >> 8) & 0x0f) as u8);
    packet[1] = (session.sequence_number & 0xff) as u8;
    packet[2..6].copy_from_slice(&session.device_id.to_le_bytes());
    if !uplink.single_bit {
        packet[6..6 + payload_len].copy_from_slice(&uplink.payload[..payload_len]);
    }

    let mac_offset = 6 + if uplink.single_bit { 0 } else { payload_len };
    let mut mac_bytes = [0u8; mac::MAX_MAC_LEN];
    mac::uplink_mac_with(cipher, &packet[..mac_offset], &session.key, &mut mac_bytes[..maclen]);
    packet[mac_offset..mac_offset + maclen].copy_from_slice(&mac_bytes[..maclen]);

    let packetlen = mac_offset + maclen;
    let crc16 = !crc::crc16_ccitt(&packet[..packetlen]);
    packet[packetlen] = (crc16 >> 8) as u8;
    packet[packetlen + 1] = crc16 as u8;

    let total_nibbles = (packetlen + 2) * 2;
    nibble::copy(&mut frames[0], &packet, 0, FTYPE_LEN_NIBBLES, total_nibbles);

    let framelen_nibbles = FTYPE_LEN_NIBBLES + total_nibbles;
    let length_bits = framelen_nibbles * 4;

    let (first, rest) = frames.split_at_mut(1);
    conv::convcode(&first[0], &mut rest[0], length_bits, FTYPE_LEN_NIBBLES * 4, 0o7);
    conv::convcode(&first[0], &mut rest[1], length_bits, FTYPE_LEN_NIBBLES * 4, 0o5);

    Ok(EncodedUplink {
        frames,
        framelen_nibbles: framelen_nibbles as u8,
    })
}

/// Decode a single uplink frame (initial transmission or either replica)
/// back into its plaintext form. `session.device_id` and
/// `session.sequence_number` are overwritten with the decoded values before
/// any integrity check is performed, so they are populated even when this
/// returns an error for a CRC or MAC failure.
pub fn decode_uplink(
    encoded: &EncodedUplink,
    session: &mut SessionContext,
    check_mac: bool,
) -> Result<PlainUplink, UplinkDecodeError> {
    decode_uplink_with(&Aes128Block, encoded, session, check_mac)
}

pub fn decode_uplink_with(
    cipher: &impl BlockEncrypt128,
    encoded: &EncodedUplink,
    session: &mut SessionContext,
    check_mac: bool,
) -> Result<PlainUplink, UplinkDecodeError> {
    if encoded.framelen_nibbles % 2 == 0 {
        return Err(UplinkDecodeError::FramelenEven);
    }

    let frame = &encoded.frames[0];
    let ftype = nibble::read_uint(frame, 0, FTYPE_LEN_NIBBLES) as u16;

    let mut best = (0usize, 0usize);
    let mut best_distance = u32::MAX;
    for replica in 0..3 {
        for (class, &candidate) in FRAME_TYPES[replica].iter().enumerate() {
            let distance = (candidate ^ ftype).count_ones();
            if distance < best_distance {
                best_distance = distance;
                best = (replica, class);
            }
        }
    }
    let (replica, class) = best;

    let packetlen_bytes = PACKET_LEN_BY_CLASS[class];
    let framelen_nibbles = encoded.framelen_nibbles as usize;
    if framelen_nibbles != FTYPE_LEN_NIBBLES + packetlen_bytes * 2 + CRC_LEN_NIBBLES {
        return Err(UplinkDecodeError::FtypeMismatch);
    }

    let single_bit = class == 0;

    let ceil_framelen_bytes = (framelen_nibbles + 1) / 2;
    let mut frame_plain = [0u8; UPLINK_MAX_FRAME_LEN];
    match replica {
        0 => frame_plain[..ceil_framelen_bytes].copy_from_slice(&frame[..ceil_framelen_bytes]),
        1 => conv::unconvcode(frame, &mut frame_plain, ceil_framelen_bytes * 8, FTYPE_LEN_NIBBLES * 4, 0o7),
        _ => conv::unconvcode(frame, &mut frame_plain, ceil_framelen_bytes * 8, FTYPE_LEN_NIBBLES * 4, 0o5),
    }

    let devid_le = nibble::read_uint(&frame_plain, DEVID_OFFSET, DEVID_LEN_NIBBLES);
    session.device_id = devid_le.swap_bytes();
    session.sequence_number = nibble::read_uint(&frame_plain, SN_OFFSET, SN_LEN_NIBBLES) as u16;

    let flags = nibble::read_uint(&frame_plain, FLAGS_OFFSET, FLAGS_LEN_NIBBLES) as u8;
    let maclen = mac::MIN_MAC_LEN + if single_bit { 0 } else { (flags >> 2) as usize };
    let request_downlink = flags & 0b0010 != 0;
    let payload_len = packetlen_bytes - 6 - maclen;

    let mut payload = [0u8; UPLINK_MAX_PAYLOAD_LEN];
    if single_bit {
        payload[0] = if flags & 0b0100 != 0 { 1 } else { 0 };
    } else {
        nibble::copy(&mut payload, &frame_plain, PAYLOAD_OFFSET, 0, payload_len * 2);
    }

    let mut packet = [0u8; MAX_PACKET_LEN];
    nibble::copy(&mut packet, &frame_plain, FLAGS_OFFSET, 0, packetlen_bytes * 2);

    let crc16 = !crc::crc16_ccitt(&packet[..packetlen_bytes]);
    let crc16_frame = nibble::read_uint(
        &frame_plain,
        FTYPE_LEN_NIBBLES + packetlen_bytes * 2,
        CRC_LEN_NIBBLES,
    ) as u16;
    if crc16 != crc16_frame {
        return Err(UplinkDecodeError::CrcInvalid);
    }

    if check_mac {
        let mac_offset = packetlen_bytes - maclen;
        let mut expected = [0u8; mac::MAX_MAC_LEN];
        mac::uplink_mac_with(cipher, &packet[..mac_offset], &session.key, &mut expected[..maclen]);
        if expected[..maclen] != packet[mac_offset..packetlen_bytes] {
            return Err(UplinkDecodeError::MacInvalid);
        }
    }

    Ok(PlainUplink {
        payload,
        payload_len: payload_len as u8,
        request_downlink,
        single_bit,
        generate_replicas: true,
    })
}
