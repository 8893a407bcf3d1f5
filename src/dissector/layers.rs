//! Decoded protocol layers.
//!
//! Every layer the dissector recognizes is one variant of the closed [`Layer`]
//! enum carrying its header fields. Bytes the dissector cannot attribute to a
//! recognized header end up in trailing [`Layer::Unknown`] entries (the
//! undecoded part of the packet, then any link-layer trailer), which never
//! contribute a tag.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Serialize, Serializer};

/// 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthernetFields {
    pub source: MacAddr,
    pub destination: MacAddr,
    pub ether_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv4Fields {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: u8,
    pub ttl: u8,
    /// Header length in bytes, options included.
    pub header_len: usize,
    pub total_len: u16,
    pub identification: u16,
    pub dont_fragment: bool,
    pub more_fragments: bool,
    /// In 8-byte units, as carried on the wire.
    pub fragment_offset: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
    pub ns: bool,
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.fin, "FIN"),
            (self.syn, "SYN"),
            (self.rst, "RST"),
            (self.psh, "PSH"),
            (self.ack, "ACK"),
            (self.urg, "URG"),
            (self.ece, "ECE"),
            (self.cwr, "CWR"),
            (self.ns, "NS"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TcpFields {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    pub flags: TcpFlags,
    pub window_size: u16,
    /// Header length in bytes, options included.
    pub header_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UdpFields {
    pub source_port: u16,
    pub destination_port: u16,
    pub length: u16,
    pub checksum: u16,
}

/// Trailing bytes the dissector did not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownRemainder {
    pub offset: usize,
    pub len: usize,
    /// Why decoding stopped here.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Layer {
    Ethernet(EthernetFields),
    #[serde(rename = "IPv4")]
    Ipv4(Ipv4Fields),
    #[serde(rename = "TCP")]
    Tcp(TcpFields),
    #[serde(rename = "UDP")]
    Udp(UdpFields),
    Unknown(UnknownRemainder),
}

impl Layer {
    /// Kind tag used in summaries, `None` for the undecoded remainder.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Layer::Ethernet(_) => Some("Ethernet"),
            Layer::Ipv4(_) => Some("IPv4"),
            Layer::Tcp(_) => Some("TCP"),
            Layer::Udp(_) => Some("UDP"),
            Layer::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Ethernet(eth) => {
                writeln!(f, "Ethernet")?;
                writeln!(f, "\tSource MAC: {}", eth.source)?;
                writeln!(f, "\tDestination MAC: {}", eth.destination)?;
                writeln!(f, "\tEtherType: {:#06x}", eth.ether_type)
            }
            Layer::Ipv4(ip) => {
                writeln!(f, "IPv4")?;
                writeln!(f, "\tSource: {}", ip.source)?;
                writeln!(f, "\tDestination: {}", ip.destination)?;
                writeln!(f, "\tProtocol: {}", ip.protocol)?;
                writeln!(f, "\tTTL: {}", ip.ttl)?;
                writeln!(f, "\tHeader length: {}", ip.header_len)?;
                writeln!(f, "\tTotal length: {}", ip.total_len)?;
                writeln!(f, "\tIdentification: {:#06x}", ip.identification)?;
                writeln!(
                    f,
                    "\tFlags: DF={} MF={}",
                    ip.dont_fragment as u8, ip.more_fragments as u8
                )?;
                writeln!(f, "\tFragment offset: {}", ip.fragment_offset)
            }
            Layer::Tcp(tcp) => {
                writeln!(f, "TCP")?;
                writeln!(f, "\tSource port: {}", tcp.source_port)?;
                writeln!(f, "\tDestination port: {}", tcp.destination_port)?;
                writeln!(f, "\tSequence: {}", tcp.sequence_number)?;
                writeln!(f, "\tAcknowledgment: {}", tcp.acknowledgment_number)?;
                writeln!(f, "\tFlags: {}", tcp.flags)?;
                writeln!(f, "\tWindow: {}", tcp.window_size)?;
                writeln!(f, "\tHeader length: {}", tcp.header_len)
            }
            Layer::Udp(udp) => {
                writeln!(f, "UDP")?;
                writeln!(f, "\tSource port: {}", udp.source_port)?;
                writeln!(f, "\tDestination port: {}", udp.destination_port)?;
                writeln!(f, "\tLength: {}", udp.length)?;
                writeln!(f, "\tChecksum: {:#06x}", udp.checksum)
            }
            Layer::Unknown(rest) => {
                writeln!(f, "Undecoded")?;
                writeln!(f, "\tOffset: {}", rest.offset)?;
                writeln!(f, "\tBytes: {}", rest.len)?;
                writeln!(f, "\tReason: {}", rest.reason)
            }
        }
    }
}

/// Ordered layers of one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    layers: Vec<Layer>,
}

impl LayerSummary {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Kind tags of the recognized layers, outermost first.
    pub fn tags(&self) -> Vec<&'static str> {
        self.layers.iter().filter_map(Layer::tag).collect()
    }

    /// Tag sequence rendered as `[Ethernet IPv4 TCP]`.
    pub fn capas(&self) -> String {
        format!("[{}]", self.tags().join(" "))
    }
}
