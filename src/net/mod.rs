/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Wire message types and the collaborator interfaces (§6, §9) that a node
//! binary wires up. TCP socket plumbing itself is out of scope (§1) — only
//! the prequel header, message bodies and `NetIO`/`TimerHost` traits live
//! here.

pub mod messages;
pub mod tip;
pub mod traits;

pub use messages::*;
pub use tip::{Tip, TipSet};
pub use traits::{Bootstrap, NetIO, TimerHost, Websocket};

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::error::{Error, ProtocolError, Result};

pub const MESSAGE_PREQUEL_SIZE: usize = 8;
pub const LOGOS_VERSION: u8 = 0;
pub const NUM_DELEGATES: usize = 32;
pub const CONSENSUS_BATCH_SIZE: usize = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    PrePrepare = 0,
    Prepare = 1,
    PostPrepare = 2,
    Commit = 3,
    PostCommit = 4,
    KeyAdvert = 5,
    Rejection = 6,
    Heartbeat = 7,
    PostCommittedBlock = 8,
    TxAcceptorMessage = 9,
    Unknown = 0xff,
}

impl MessageType {
    pub fn from_u8(v: u8) -> MessageType {
        use MessageType::*;
        match v {
            0 => PrePrepare,
            1 => Prepare,
            2 => PostPrepare,
            3 => Commit,
            4 => PostCommit,
            5 => KeyAdvert,
            6 => Rejection,
            7 => Heartbeat,
            8 => PostCommittedBlock,
            9 => TxAcceptorMessage,
            _ => Unknown,
        }
    }
}

impl Encodable for MessageType {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        (*self as u8).encode(w)
    }
}

impl Decodable for MessageType {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(MessageType::from_u8(u8::decode(r)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConsensusType {
    Request = 0,
    MicroBlock = 1,
    Epoch = 2,
    Any = 0xff,
}

impl ConsensusType {
    pub fn from_u8(v: u8) -> ConsensusType {
        use ConsensusType::*;
        match v {
            0 => Request,
            1 => MicroBlock,
            2 => Epoch,
            _ => Any,
        }
    }

    /// All consensus types that own a per-instance state machine (excludes
    /// the wildcard `Any` used only for subscription filters).
    pub const ALL: [ConsensusType; 3] =
        [ConsensusType::Request, ConsensusType::MicroBlock, ConsensusType::Epoch];
}

impl Encodable for ConsensusType {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        (*self as u8).encode(w)
    }
}

impl Decodable for ConsensusType {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(ConsensusType::from_u8(u8::decode(r)?))
    }
}

/// The 8-byte wire prequel (§6): `version, type, consensus_type, mpf,
/// payload_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u8,
    pub message_type: MessageType,
    pub consensus_type: ConsensusType,
    /// Multi-purpose field: message-specific auxiliary byte (e.g. the
    /// proposing delegate's id for PrePrepare-family messages).
    pub mpf: u8,
    pub payload_size: u32,
}

impl MessageHeader {
    pub fn new(message_type: MessageType, consensus_type: ConsensusType, mpf: u8, payload_size: u32) -> Self {
        MessageHeader { version: LOGOS_VERSION, message_type, consensus_type, mpf, payload_size }
    }
}

impl Encodable for MessageHeader {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = 0;
        n += self.version.encode(w)?;
        n += self.message_type.encode(w)?;
        n += self.consensus_type.encode(w)?;
        n += self.mpf.encode(w)?;
        n += self.payload_size.encode(w)?;
        Ok(n)
    }
}

impl Decodable for MessageHeader {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let version = u8::decode(r)?;
        let message_type = MessageType::decode(r)?;
        let consensus_type = ConsensusType::decode(r)?;
        let mpf = u8::decode(r)?;
        let payload_size = u32::decode(r)?;
        Ok(MessageHeader { version, message_type, consensus_type, mpf, payload_size })
    }
}

/// Reads a prequel + exactly `payload_size` bytes of payload, failing with
/// [`ProtocolError::BadPayloadSize`] on a short read.
pub fn read_framed<R: Read>(r: &mut R) -> Result<(MessageHeader, Vec<u8>)> {
    let header = MessageHeader::decode(r).map_err(|_| Error::Protocol(ProtocolError::BadHeader))?;
    let mut payload = vec![0u8; header.payload_size as usize];
    r.read_exact(&mut payload).map_err(|_| Error::Protocol(ProtocolError::BadPayloadSize))?;
    Ok((header, payload))
}

pub fn write_framed<W: Write>(w: &mut W, header: &MessageHeader, payload: &[u8]) -> Result<()> {
    header.encode(w).map_err(|e| Error::Transport(e.to_string()))?;
    w.write_all(payload).map_err(|e| Error::Transport(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;

    #[test]
    fn header_roundtrip_and_size() {
        let header = MessageHeader::new(MessageType::PrePrepare, ConsensusType::Request, 3, 128);
        let bytes = header.encode_to_vec();
        assert_eq!(bytes.len(), MESSAGE_PREQUEL_SIZE);
        assert!(roundtrip(&header));
    }

    #[test]
    fn truncated_header_errors() {
        let header = MessageHeader::new(MessageType::Commit, ConsensusType::Epoch, 0, 0);
        let bytes = header.encode_to_vec();
        let mut cursor = io::Cursor::new(&bytes[..bytes.len() - 2]);
        assert!(MessageHeader::decode(&mut cursor).is_err());
    }
}
