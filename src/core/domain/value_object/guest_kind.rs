use crate::core::domain::error::{ProxmoxError, ValidationError};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// The two guest flavours Proxmox hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    /// A QEMU/KVM virtual machine.
    Qemu,
    /// An LXC container.
    Lxc,
}

impl GuestKind {
    pub const ALL: [GuestKind; 2] = [GuestKind::Qemu, GuestKind::Lxc];

    /// Path segment used by the API (`qemu` or `lxc`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestKind::Qemu => "qemu",
            GuestKind::Lxc => "lxc",
        }
    }
}

impl fmt::Display for GuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuestKind {
    type Err = ProxmoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qemu" | "vm" | "kvm" => Ok(GuestKind::Qemu),
            "lxc" | "ct" | "container" => Ok(GuestKind::Lxc),
            other => Err(ProxmoxError::Validation(ValidationError::Field {
                field: "kind".to_string(),
                message: format!("Unknown guest kind '{}'. Use 'qemu' or 'lxc'", other),
            })),
        }
    }
}
