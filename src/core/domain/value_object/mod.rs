mod guest_kind;
mod proxmox_api_token;
mod proxmox_host;
mod proxmox_port;
mod proxmox_principal;
mod proxmox_uri;
pub(crate) mod serde_helpers;
mod timeframe;

pub use guest_kind::GuestKind;
pub use proxmox_api_token::ProxmoxApiToken;
pub use proxmox_host::ProxmoxHost;
pub use proxmox_port::{DEFAULT_PORT, ProxmoxPort};
pub use proxmox_principal::ProxmoxPrincipal;
pub use proxmox_uri::ProxmoxUrl;
pub use timeframe::Timeframe;

// Re-export validation functions for internal use
pub(crate) use proxmox_api_token::{bare_token_id, validate_token_id, validate_token_secret};
pub(crate) use proxmox_host::validate_host;
pub(crate) use proxmox_port::validate_port;
pub(crate) use proxmox_principal::validate_principal;
