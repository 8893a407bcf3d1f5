use etherparse::{
    EtherType, Ethernet2HeaderSlice, IpNumber, Ipv4HeaderSlice, TcpHeaderSlice, UdpHeaderSlice,
};
use log::trace;

use crate::capture::types::LinkType;

use super::layers::{
    EthernetFields, Ipv4Fields, Layer, LayerSummary, MacAddr, TcpFields, TcpFlags, UdpFields,
    UnknownRemainder,
};

/// Next header the decode chain expects at the current offset.
enum Next {
    Ethernet,
    Ipv4,
    Tcp,
    Udp,
    Stop(String),
}

/// Decodes one frame into its ordered layers.
///
/// Recognition runs in framing order and stops at the first header that is
/// absent or malformed. Whatever bytes remain are reported as a
/// [`Layer::Unknown`]; a malformed header never fails the whole frame.
///
/// Once an IPv4 header is recognized, its total length bounds everything
/// decoded after it. Captured bytes past the end of the IP packet (Ethernet
/// padding, trailers) are reported as a separate `link-layer trailer`
/// remainder and are never read as a transport header.
///
/// Each call owns its decode state, so the function is safe to call from the
/// capture task and from any number of queries at once.
pub fn decode(data: &[u8], link_type: LinkType) -> LayerSummary {
    let mut layers = Vec::with_capacity(4);
    let mut offset = 0usize;
    let mut end = data.len();

    let mut next = match link_type {
        LinkType::Ethernet => Next::Ethernet,
        LinkType::RawIp => Next::Ipv4,
        LinkType::Other(dlt) => Next::Stop(format!("unsupported link type {}", dlt)),
    };

    loop {
        let rest = &data[offset..end];
        next = match next {
            Next::Ethernet => match Ethernet2HeaderSlice::from_slice(rest) {
                Ok(eth) => {
                    offset += eth.slice().len();
                    let ether_type = eth.ether_type();
                    layers.push(Layer::Ethernet(EthernetFields {
                        source: MacAddr(eth.source()),
                        destination: MacAddr(eth.destination()),
                        ether_type: ether_type.0,
                    }));
                    if ether_type == EtherType::IPV4 {
                        Next::Ipv4
                    } else {
                        Next::Stop(format!("EtherType {:#06x}", ether_type.0))
                    }
                }
                Err(e) => Next::Stop(format!("malformed Ethernet header: {}", e)),
            },
            Next::Ipv4 => match Ipv4HeaderSlice::from_slice(rest) {
                Ok(ip) => {
                    let header_len = ip.slice().len();
                    let packet_end = offset + usize::from(ip.total_len());
                    offset += header_len;
                    end = packet_end.clamp(offset, end);
                    let fragment_offset = ip.fragments_offset().value();
                    let protocol = ip.protocol();
                    layers.push(Layer::Ipv4(Ipv4Fields {
                        source: ip.source_addr(),
                        destination: ip.destination_addr(),
                        protocol: protocol.0,
                        ttl: ip.ttl(),
                        header_len,
                        total_len: ip.total_len(),
                        identification: ip.identification(),
                        dont_fragment: ip.dont_fragment(),
                        more_fragments: ip.more_fragments(),
                        fragment_offset,
                    }));
                    if fragment_offset != 0 {
                        Next::Stop("non-first IPv4 fragment".to_string())
                    } else if protocol == IpNumber::TCP {
                        Next::Tcp
                    } else if protocol == IpNumber::UDP {
                        Next::Udp
                    } else {
                        Next::Stop(format!("IP protocol {}", protocol.0))
                    }
                }
                Err(e) => Next::Stop(format!("malformed IPv4 header: {}", e)),
            },
            Next::Tcp => match TcpHeaderSlice::from_slice(rest) {
                Ok(tcp) => {
                    offset += tcp.slice().len();
                    layers.push(Layer::Tcp(TcpFields {
                        source_port: tcp.source_port(),
                        destination_port: tcp.destination_port(),
                        sequence_number: tcp.sequence_number(),
                        acknowledgment_number: tcp.acknowledgment_number(),
                        flags: TcpFlags {
                            fin: tcp.fin(),
                            syn: tcp.syn(),
                            rst: tcp.rst(),
                            psh: tcp.psh(),
                            ack: tcp.ack(),
                            urg: tcp.urg(),
                            ece: tcp.ece(),
                            cwr: tcp.cwr(),
                            ns: tcp.ns(),
                        },
                        window_size: tcp.window_size(),
                        header_len: tcp.slice().len(),
                    }));
                    Next::Stop("application payload".to_string())
                }
                Err(e) => Next::Stop(format!("malformed TCP header: {}", e)),
            },
            Next::Udp => match UdpHeaderSlice::from_slice(rest) {
                Ok(udp) => {
                    offset += udp.slice().len();
                    layers.push(Layer::Udp(UdpFields {
                        source_port: udp.source_port(),
                        destination_port: udp.destination_port(),
                        length: udp.length(),
                        checksum: udp.checksum(),
                    }));
                    Next::Stop("application payload".to_string())
                }
                Err(e) => Next::Stop(format!("malformed UDP header: {}", e)),
            },
            Next::Stop(reason) => {
                if offset < end {
                    trace!("decode stopped at offset {}: {}", offset, reason);
                    layers.push(Layer::Unknown(UnknownRemainder {
                        offset,
                        len: end - offset,
                        reason,
                    }));
                }
                if end < data.len() {
                    layers.push(Layer::Unknown(UnknownRemainder {
                        offset: end,
                        len: data.len() - end,
                        reason: "link-layer trailer".to_string(),
                    }));
                }
                break;
            }
        };
    }

    LayerSummary::new(layers)
}
