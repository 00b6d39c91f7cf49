//! Interface Descriptors
//!
//! Static identity of an RPC interface. A descriptor is produced once by the
//! generated per-interface module and never changes afterwards; the registry
//! keys entries on the (uuid, version) pair, exposed as [`InterfaceId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Interface version as carried in bind PDUs (`major.minor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceVersion {
    pub major: u16,
    pub minor: u16,
}

impl InterfaceVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Packed form used on the wire: major in the low 16 bits.
    pub const fn packed(self) -> u32 {
        ((self.minor as u32) << 16) | self.major as u32
    }

    pub const fn from_packed(value: u32) -> Self {
        Self {
            major: (value & 0xFFFF) as u16,
            minor: (value >> 16) as u16,
        }
    }
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for InterfaceVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        let major = major
            .trim()
            .parse()
            .map_err(|_| format!("Invalid major version in '{s}'"))?;
        let minor = minor
            .trim()
            .parse()
            .map_err(|_| format!("Invalid minor version in '{s}'"))?;
        Ok(Self { major, minor })
    }
}

/// Registry key: an interface is identified by its uuid and version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceId {
    pub uuid: Uuid,
    pub version: InterfaceVersion,
}

impl InterfaceId {
    pub const fn new(uuid: Uuid, version: InterfaceVersion) -> Self {
        Self { uuid, version }
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.uuid, self.version)
    }
}

/// Abstract or transfer syntax identifier used during presentation negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxId {
    pub uuid: Uuid,
    pub version: u32,
}

impl SyntaxId {
    /// NDR 2.0 transfer syntax
    pub const NDR: SyntaxId = SyntaxId {
        uuid: Uuid::from_u128(0x8a885d04_1ceb_11c9_9fe8_08002b104860),
        version: 2,
    };

    /// NDR64 transfer syntax
    pub const NDR64: SyntaxId = SyntaxId {
        uuid: Uuid::from_u128(0x71710533_beba_4937_8319_b5dbef9ccc36),
        version: 1,
    };
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.uuid, self.version)
    }
}

/// Immutable identity of an RPC interface.
///
/// Built with [`InterfaceDescriptor::builder`]. The client and server pipe
/// names default to the interface name, and the transfer syntax list defaults
/// to NDR only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    name: String,
    id: InterfaceId,
    client_pipe: String,
    server_pipe: String,
    transfer_syntaxes: Vec<SyntaxId>,
    #[serde(default)]
    help: Option<String>,
}

impl InterfaceDescriptor {
    pub fn builder(
        name: impl Into<String>,
        uuid: Uuid,
        version: InterfaceVersion,
    ) -> InterfaceDescriptorBuilder {
        InterfaceDescriptorBuilder {
            name: name.into(),
            id: InterfaceId::new(uuid, version),
            client_pipe: None,
            server_pipe: None,
            transfer_syntaxes: Vec::new(),
            help: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.id.uuid
    }

    pub fn version(&self) -> InterfaceVersion {
        self.id.version
    }

    /// Abstract syntax this interface is negotiated under.
    pub fn abstract_syntax(&self) -> SyntaxId {
        SyntaxId {
            uuid: self.id.uuid,
            version: self.id.version.packed(),
        }
    }

    pub fn client_pipe(&self) -> &str {
        &self.client_pipe
    }

    pub fn server_pipe(&self) -> &str {
        &self.server_pipe
    }

    pub fn transfer_syntaxes(&self) -> &[SyntaxId] {
        &self.transfer_syntaxes
    }

    pub fn supports_transfer_syntax(&self, syntax: &SyntaxId) -> bool {
        self.transfer_syntaxes.contains(syntax)
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// True if `pipe` names either endpoint of this interface.
    /// Pipe names compare case-insensitively, as SMB does.
    pub fn answers_on_pipe(&self, pipe: &str) -> bool {
        let pipe = strip_pipe_prefix(pipe);
        self.client_pipe.eq_ignore_ascii_case(pipe) || self.server_pipe.eq_ignore_ascii_case(pipe)
    }
}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Clients may open `\PIPE\name` or `\name`; the registry stores bare names.
fn strip_pipe_prefix(pipe: &str) -> &str {
    let trimmed = pipe.trim_start_matches('\\');
    match trimmed.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("pipe\\") => &trimmed[5..],
        _ => trimmed,
    }
}

/// Builder for [`InterfaceDescriptor`]
#[derive(Debug, Clone)]
pub struct InterfaceDescriptorBuilder {
    name: String,
    id: InterfaceId,
    client_pipe: Option<String>,
    server_pipe: Option<String>,
    transfer_syntaxes: Vec<SyntaxId>,
    help: Option<String>,
}

impl InterfaceDescriptorBuilder {
    /// Set both the client and server pipe name.
    pub fn pipe(self, pipe: impl Into<String>) -> Self {
        let pipe = pipe.into();
        self.pipes(pipe.clone(), pipe)
    }

    pub fn pipes(mut self, client: impl Into<String>, server: impl Into<String>) -> Self {
        self.client_pipe = Some(client.into());
        self.server_pipe = Some(server.into());
        self
    }

    pub fn transfer_syntax(mut self, syntax: SyntaxId) -> Self {
        if !self.transfer_syntaxes.contains(&syntax) {
            self.transfer_syntaxes.push(syntax);
        }
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn build(self) -> InterfaceDescriptor {
        let client_pipe = self
            .client_pipe
            .map_or_else(|| self.name.clone(), |p| strip_pipe_prefix(&p).to_string());
        let server_pipe = self
            .server_pipe
            .map_or_else(|| self.name.clone(), |p| strip_pipe_prefix(&p).to_string());
        let transfer_syntaxes = if self.transfer_syntaxes.is_empty() {
            vec![SyntaxId::NDR]
        } else {
            self.transfer_syntaxes
        };
        InterfaceDescriptor {
            name: self.name,
            id: self.id,
            client_pipe,
            server_pipe,
            transfer_syntaxes,
            help: self.help,
        }
    }
}
