// ABOUTME: Type-safe identifiers and validated value types.
// ABOUTME: IDs, image references, port bindings and bind mount specs.

mod bind_mount;
mod id;
mod image_ref;
mod port_binding;

pub use bind_mount::{DEFAULT_BIND_MODE, normalize_bind};
pub use id::{ContainerId, ExecId, SHORT_ID_LEN, short_id};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use port_binding::{DEFAULT_HOST_IP, ParsePortBindingError, PortBinding, Protocol};
