mod enr;

use std::fmt;
use std::net::Ipv4Addr;

use tracing::debug;

pub use enr::{Enr, EnrError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Trin,
    Ultralight,
    Fluffy,
    Unknown,
}

impl ClientKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trin => "trin",
            Self::Ultralight => "ultralight",
            Self::Fluffy => "fluffy",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientTable {
    entries: Vec<(u8, ClientKind)>,
}

impl ClientTable {
    pub fn new(entries: impl IntoIterator<Item = (u8, ClientKind)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, tag: u8) -> ClientKind {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == tag)
            .map_or(ClientKind::Unknown, |(_, kind)| *kind)
    }
}

impl Default for ClientTable {
    fn default() -> Self {
        Self::new([
            (b't', ClientKind::Trin),
            (b'u', ClientKind::Ultralight),
            (b'f', ClientKind::Fluffy),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerMetadata {
    pub address: Option<Ipv4Addr>,
    pub port: Option<u16>,
    pub client: ClientKind,
}

impl PeerMetadata {
    pub fn endpoint(&self) -> Option<String> {
        match (self.address, self.port) {
            (Some(address), Some(port)) => Some(format!("{address}:{port}")),
            (Some(address), None) => Some(address.to_string()),
            _ => None,
        }
    }
}

pub trait PeerResolver {
    fn resolve(&self, node_id: &str) -> Option<PeerMetadata>;
}

#[derive(Clone, Debug, Default)]
pub struct EnrResolver {
    clients: ClientTable,
}

impl EnrResolver {
    pub fn new(clients: ClientTable) -> Self {
        Self { clients }
    }
}

impl PeerResolver for EnrResolver {
    fn resolve(&self, node_id: &str) -> Option<PeerMetadata> {
        let record = match Enr::decode_txt(node_id) {
            Ok(record) => record,
            Err(error) => {
                debug!(node_id, %error, "node id is not a decodable record");
                return None;
            }
        };

        Some(PeerMetadata {
            address: record.ip(),
            port: record.udp(),
            client: record
                .client_tag()
                .map_or(ClientKind::Unknown, |tag| self.clients.lookup(tag)),
        })
    }
}
