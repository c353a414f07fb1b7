//! WSJT-X UDP messages
//!
//! WSJT-X sends a stream of status messages to its UDP server port. We only
//! care about `LoggedADIF`, which it sends when the operator logs a QSO. The
//! ADIF payload of that message is decoded into a [`QsoRecord`]; all other
//! messages are ignored.
//!
//! - [NetworkMessage.hpp][1]
//!
//! [1]: https://sourceforge.net/p/wsjt/wsjtx/ci/master/tree/Network/NetworkMessage.hpp

pub mod adif;

use std::str::Utf8Error;

use bytes::{
    Buf,
    BufMut,
};

pub use crate::adif::{
    AdifError,
    AdifRecord,
};

pub const MAGIC: u32 = 0xadbccbda;
pub const SCHEMA: u32 = 2;

/// Client id WSJT-X puts in every message. The ADIF payload offset assumes an
/// id of this length.
pub const CLIENT_ID: &str = "WSJT-X";

/// Start of the ADIF text in a `LoggedADIF` message.
pub const PAYLOAD_OFFSET: usize = 26;

/// WSJT-X messages fit into this.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

#[derive(Debug, thiserror::Error)]
#[error("wsjt-x datagram decode error")]
pub enum Error {
    #[error("datagram truncated: {length} bytes, expected at least {expected}")]
    Truncated { length: usize, expected: usize },
    InvalidEncoding(#[from] Utf8Error),
    Adif(#[from] AdifError),
}

/// WSJT-X message type
///
/// This is the last byte of the big-endian message type word in the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Heartbeat,
    Status,
    Decode,
    Clear,
    Reply,
    QsoLogged,
    Close,
    Replay,
    HaltTx,
    FreeText,
    WsprDecode,
    Location,
    LoggedAdif,
    HighlightCallsign,
    SwitchConfiguration,
    Configure,
    Unknown(u8),
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Heartbeat,
            1 => Self::Status,
            2 => Self::Decode,
            3 => Self::Clear,
            4 => Self::Reply,
            5 => Self::QsoLogged,
            6 => Self::Close,
            7 => Self::Replay,
            8 => Self::HaltTx,
            9 => Self::FreeText,
            10 => Self::WsprDecode,
            11 => Self::Location,
            0x0c => Self::LoggedAdif,
            13 => Self::HighlightCallsign,
            14 => Self::SwitchConfiguration,
            15 => Self::Configure,
            _ => Self::Unknown(byte),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Heartbeat => 0,
            Self::Status => 1,
            Self::Decode => 2,
            Self::Clear => 3,
            Self::Reply => 4,
            Self::QsoLogged => 5,
            Self::Close => 6,
            Self::Replay => 7,
            Self::HaltTx => 8,
            Self::FreeText => 9,
            Self::WsprDecode => 10,
            Self::Location => 11,
            Self::LoggedAdif => 0x0c,
            Self::HighlightCallsign => 13,
            Self::SwitchConfiguration => 14,
            Self::Configure => 15,
            Self::Unknown(byte) => *byte,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub schema: u32,
    pub message_type: MessageType,
}

impl Header {
    pub const LENGTH: usize = 12;

    pub fn decode(datagram: &[u8]) -> Result<Self, Error> {
        if datagram.len() < Self::LENGTH {
            return Err(Error::Truncated {
                length: datagram.len(),
                expected: Self::LENGTH,
            });
        }

        let mut buffer = &datagram[..Self::LENGTH];
        let magic = buffer.get_u32();
        let schema = buffer.get_u32();
        let [.., discriminator] = buffer.get_u32().to_be_bytes();

        Ok(Self {
            magic,
            schema,
            message_type: MessageType::from_byte(discriminator),
        })
    }
}

/// The first record of a `LoggedADIF` message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QsoRecord {
    record: AdifRecord,
}

impl QsoRecord {
    pub fn call(&self) -> Option<&str> {
        self.record.get("call")
    }

    pub fn station_callsign(&self) -> Option<&str> {
        self.record.get("station_callsign")
    }

    pub fn gridsquare(&self) -> Option<&str> {
        self.record.get("gridsquare")
    }

    pub fn my_gridsquare(&self) -> Option<&str> {
        self.record.get("my_gridsquare")
    }

    pub fn mode(&self) -> Option<&str> {
        self.record.get("mode")
    }

    pub fn band(&self) -> Option<&str> {
        self.record.get("band")
    }

    pub fn adif(&self) -> &AdifRecord {
        &self.record
    }
}

impl From<AdifRecord> for QsoRecord {
    fn from(record: AdifRecord) -> Self {
        Self { record }
    }
}

/// Decodes a datagram from WSJT-X.
///
/// Returns `Ok(None)` for anything but a `LoggedADIF` message. Those are
/// mostly heartbeats and status updates, so this is the common case.
pub fn parse(datagram: &[u8]) -> Result<Option<QsoRecord>, Error> {
    let header = Header::decode(datagram)?;

    if header.message_type != MessageType::LoggedAdif {
        tracing::trace!(message_type = ?header.message_type, "ignoring message");
        return Ok(None);
    }

    let payload = datagram
        .get(PAYLOAD_OFFSET..)
        .ok_or_else(|| {
            Error::Truncated {
                length: datagram.len(),
                expected: PAYLOAD_OFFSET,
            }
        })?;
    let adif = std::str::from_utf8(payload)?;
    tracing::debug!(%adif, "logged adif");

    let record = adif::read_first_record(adif)?;
    Ok(Some(record.into()))
}

/// Encodes a `LoggedADIF` message the way WSJT-X sends it.
pub fn encode_logged_adif(record: &AdifRecord) -> Vec<u8> {
    let adif = format!("\n<adif_ver:5>3.1.0\n<programid:6>WSJT-X\n<EOH>\n{record}\n");

    let mut buffer = Vec::with_capacity(PAYLOAD_OFFSET + adif.len());
    buffer.put_u32(MAGIC);
    buffer.put_u32(SCHEMA);
    buffer.put_u32(MessageType::LoggedAdif.as_byte().into());
    put_utf8(&mut buffer, CLIENT_ID);
    put_utf8(&mut buffer, &adif);
    buffer
}

// Qt's QDataStream encoding of a QByteArray
fn put_utf8(buffer: &mut Vec<u8>, s: &str) {
    buffer.put_u32(s.len() as u32);
    buffer.put_slice(s.as_bytes());
}
