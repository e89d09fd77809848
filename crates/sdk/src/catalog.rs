//! Daemon Method Catalog
//!
//! Wire name and parameter style of every method the daemon exposes. The
//! daemon decides per method whether it wants a named object or a
//! positional array, so the style is fixed here rather than at call sites.

use std::fmt;

use lightning_rpc_core::{ParamStyle, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    NewAddress,
    GetInfo,
    GetPeers,
    GetChannels,
    Connect,
    Close,
    GetRoute,
    SendPayment,
    GetNodes,
    Invoice,
    Stop,
}

impl Method {
    pub const ALL: [Method; 11] = [
        Method::NewAddress,
        Method::GetInfo,
        Method::GetPeers,
        Method::GetChannels,
        Method::Connect,
        Method::Close,
        Method::GetRoute,
        Method::SendPayment,
        Method::GetNodes,
        Method::Invoice,
        Method::Stop,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Method::NewAddress => "newaddr",
            Method::GetInfo => "getinfo",
            Method::GetPeers => "getpeers",
            Method::GetChannels => "getchannels",
            Method::Connect => "connect",
            Method::Close => "close",
            Method::GetRoute => "getroute",
            Method::SendPayment => "sendpay",
            Method::GetNodes => "getnodes",
            Method::Invoice => "invoice",
            Method::Stop => "stop",
        }
    }

    pub fn style(self) -> ParamStyle {
        match self {
            Method::NewAddress
            | Method::GetInfo
            | Method::GetPeers
            | Method::GetChannels
            | Method::GetNodes => ParamStyle::Named,
            Method::Connect
            | Method::Close
            | Method::GetRoute
            | Method::SendPayment
            | Method::Invoice
            | Method::Stop => ParamStyle::Positional,
        }
    }

    /// Parameters for a call without arguments, in this method's style
    pub fn no_params(self) -> Params {
        match self.style() {
            ParamStyle::Named => Params::empty_named(),
            ParamStyle::Positional => Params::empty_positional(),
        }
    }

    pub fn from_wire(name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.wire_name() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
