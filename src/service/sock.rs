use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net;

use crate::util::constants as setting;

/// Binds a TCP listener with address reuse so a restarted server can take
/// the port back right away.
pub fn new_listener(addr: net::SocketAddr) -> io::Result<net::TcpListener> {
    let domain = if addr.is_ipv4() { Domain::ipv4() } else { Domain::ipv6() };
    let sock = Socket::new(domain, Type::stream(), Some(Protocol::tcp()))?;
    sock.set_reuse_address(true)?;
    sock.bind(&addr.into())?;
    sock.listen(setting::LISTEN_BACKLOG)?;
    Ok(sock.into_tcp_listener())
}
