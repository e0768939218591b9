use std::net::Ipv4Addr;

use alloy_rlp::Header;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

const TEXT_PREFIX: &str = "enr:";

#[derive(Debug, Error)]
pub enum EnrError {
    #[error("node id does not start with 'enr:'")]
    MissingPrefix,
    #[error("invalid base64url payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid RLP payload: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    #[error("record must be an RLP list")]
    NotAList,
    #[error("record must hold signature, sequence and key/value pairs")]
    OddLength,
    #[error("record {0} must be a byte string")]
    InvalidField(&'static str),
}

struct Field<'a> {
    list: bool,
    payload: &'a [u8],
}

impl<'a> Field<'a> {
    fn bytes(&self) -> Option<&'a [u8]> {
        (!self.list).then_some(self.payload)
    }
}

fn next_field<'a>(buf: &mut &'a [u8]) -> Result<Field<'a>, alloy_rlp::Error> {
    let header = Header::decode(buf)?;
    let remaining: &'a [u8] = *buf;
    let (payload, rest) = remaining
        .split_at_checked(header.payload_length)
        .ok_or(alloy_rlp::Error::InputTooShort)?;
    *buf = rest;
    Ok(Field {
        list: header.list,
        payload,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enr {
    pub signature: Vec<u8>,
    pub seq: u64,
    // List values are kept as `None`; nothing here reads them.
    pairs: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl Enr {
    pub fn decode_txt(encoded: &str) -> Result<Self, EnrError> {
        let payload = encoded
            .trim()
            .strip_prefix(TEXT_PREFIX)
            .ok_or(EnrError::MissingPrefix)?;
        let raw = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Self::decode(&raw)
    }

    pub fn decode(raw: &[u8]) -> Result<Self, EnrError> {
        let mut buf = raw;
        let record = next_field(&mut buf)?;
        if !buf.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength.into());
        }
        if !record.list {
            return Err(EnrError::NotAList);
        }

        let mut payload = record.payload;
        let mut fields = Vec::new();
        while !payload.is_empty() {
            fields.push(next_field(&mut payload)?);
        }
        if fields.len() < 2 || fields.len() % 2 != 0 {
            return Err(EnrError::OddLength);
        }

        let mut fields = fields.into_iter();
        let signature = fields
            .next()
            .and_then(|field| field.bytes())
            .ok_or(EnrError::InvalidField("signature"))?
            .to_vec();
        let seq = fields
            .next()
            .and_then(|field| field.bytes())
            .filter(|bytes| bytes.len() <= 8)
            .map(big_endian)
            .ok_or(EnrError::InvalidField("sequence number"))?;

        let mut pairs = Vec::new();
        while let (Some(key), Some(value)) = (fields.next(), fields.next()) {
            let key = key.bytes().ok_or(EnrError::InvalidField("key"))?;
            pairs.push((key.to_vec(), value.bytes().map(<[u8]>::to_vec)));
        }

        Ok(Self {
            signature,
            seq,
            pairs,
        })
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate.as_slice() == key.as_bytes())
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn ip(&self) -> Option<Ipv4Addr> {
        let octets: [u8; 4] = self.get("ip")?.try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    pub fn udp(&self) -> Option<u16> {
        let raw = self.get("udp")?;
        if raw.is_empty() || raw.len() > 2 {
            return None;
        }
        u16::try_from(big_endian(raw)).ok()
    }

    pub fn client_tag(&self) -> Option<u8> {
        self.get("c")?.first().copied()
    }
}

fn big_endian(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIN_BOOTNODE: &str = "enr:-IS4QBISSFfBzsBrjq61iSIxPMfp5ShBTW6KQUglzH_tj8_SJaehXdlnZI-NAkTGeoclwnTB-pU544BQA44BiDZ2rkMBgmlkgnY0gmlwhKEjVaWJc2VjcDI1NmsxoQOSGugH1jSdiE_fRK1FIBe9oLxaWH8D_7xXSnaOVBe-SYN1ZHCCIyg";
    const FLUFFY_BOOTNODE: &str = "enr:-IS4QGeTMHteRmm-MSYniUd48OZ1M7RMUsIjnSP_TRbo-goQZAdYuqY2PyNJfDJQBz33kv16k7WB3bZnBK-O1DagvJIBgmlkgnY0gmlwhEFsKgOJc2VjcDI1NmsxoQIQXNgOCBNyoXz_7XP4Vm7pIB1Lp35d67BbC4iSlrrcJoN1ZHCCI40";

    fn decode(encoded: &str) -> Enr {
        Enr::decode_txt(encoded).unwrap_or_else(|error| panic!("decode failed: {error}"))
    }

    #[test]
    fn decodes_bootnode_records() {
        let trin = decode(TRIN_BOOTNODE);
        assert_eq!(trin.seq, 1);
        assert_eq!(trin.signature.len(), 64);
        assert_eq!(trin.get("id"), Some(b"v4".as_slice()));
        assert_eq!(trin.ip(), Some(Ipv4Addr::new(161, 35, 85, 165)));
        assert_eq!(trin.udp(), Some(9000));
        assert_eq!(trin.client_tag(), None);

        let fluffy = decode(FLUFFY_BOOTNODE);
        assert_eq!(fluffy.ip(), Some(Ipv4Addr::new(65, 108, 42, 3)));
        assert_eq!(fluffy.udp(), Some(9101));
    }

    #[test]
    fn tolerates_padding_and_whitespace() {
        let padded = format!(" {TRIN_BOOTNODE}== ");
        assert_eq!(decode(&padded), decode(TRIN_BOOTNODE));
    }

    #[test]
    fn rejects_invalid_records() {
        assert!(matches!(
            Enr::decode_txt("-IS4QBISSFfBzsBrjq61"),
            Err(EnrError::MissingPrefix)
        ));
        assert!(matches!(
            Enr::decode_txt("enr:!!!"),
            Err(EnrError::Base64(_))
        ));
        assert!(matches!(
            Enr::decode(&[0x83, b'd', b'o', b'g']),
            Err(EnrError::NotAList)
        ));
        assert!(matches!(
            Enr::decode(&[0xc4, 0x81, 0xaa, 0x01, 0x02]),
            Err(EnrError::OddLength)
        ));
        assert!(matches!(
            Enr::decode(&[0xc2, 0xc0, 0x01]),
            Err(EnrError::InvalidField("signature"))
        ));
        assert!(matches!(
            Enr::decode(&[0xc3, 0x81, 0xaa, 0x80, 0x01]),
            Err(EnrError::Rlp(alloy_rlp::Error::UnexpectedLength))
        ));
        assert!(matches!(
            Enr::decode(&[0xc4, 0x81, 0xaa]),
            Err(EnrError::Rlp(alloy_rlp::Error::InputTooShort))
        ));
        assert!(matches!(Enr::decode(&[]), Err(EnrError::Rlp(_))));
    }

    #[test]
    fn accepts_empty_signature() {
        let record = [0xca, 0x80, 0x01, 0x82, b'i', b'p', 0x84, 127, 0, 0, 1];
        let enr = Enr::decode(&record).unwrap_or_else(|error| panic!("decode failed: {error}"));
        assert!(enr.signature.is_empty());
        assert_eq!(enr.seq, 1);
        assert_eq!(enr.ip(), Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn list_values_are_not_byte_entries() {
        // [sig, seq, "eth", [0x01], "ip", 127.0.0.1]
        let record = [
            0xd0, 0x80, 0x01, 0x83, b'e', b't', b'h', 0xc1, 0x01, 0x82, b'i', b'p', 0x84, 127, 0,
            0, 1,
        ];
        let enr = Enr::decode(&record).unwrap_or_else(|error| panic!("decode failed: {error}"));
        assert_eq!(enr.get("eth"), None);
        assert_eq!(enr.ip(), Some(Ipv4Addr::LOCALHOST));
    }
}
