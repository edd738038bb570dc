//! Transaction management.
//!
//! The linking core never opens or commits a transaction. It only writes
//! through a `&mut` handle the caller supplies.

use serde::{Deserialize, Serialize};

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Transaction trait that all documents must implement.
pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;
    /// Label shown in the host's undo history.
    fn name(&self) -> &str;

    fn is_writable(&self) -> bool {
        self.mode() == TxMode::ReadWrite
    }
}
