//! Admin capability
//!
//! Admin-gated calls take an `&AdminCap`. Each component stores the
//! `AuthorityId` of the cap it was created with and rejects any other.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{PoolError, PoolResult};

/// Identifier of the authority a component trusts
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorityId([u8; 32]);

impl AuthorityId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityId({}..)", hex::encode(&self.0[..4]))
    }
}

/// Capability granting admin rights over the components bound to it.
///
/// Not `Clone`: holding the value is the permission.
pub struct AdminCap {
    authority: AuthorityId,
}

impl AdminCap {
    /// Mint a fresh capability with a random authority id
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            authority: AuthorityId(bytes),
        }
    }

    /// Authority this capability speaks for
    pub fn authority(&self) -> AuthorityId {
        self.authority
    }
}

impl fmt::Debug for AdminCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCap")
            .field("authority", &self.authority)
            .finish()
    }
}

/// Authority check held by each admin-gated component
#[derive(Debug, Clone, Copy)]
pub struct Authority {
    id: AuthorityId,
}

impl Authority {
    /// Bind to the authority of `cap`
    pub fn bind(cap: &AdminCap) -> Self {
        Self { id: cap.authority() }
    }

    /// Verify `cap` speaks for this authority
    pub fn verify(&self, cap: &AdminCap) -> PoolResult<()> {
        if cap.authority() == self.id {
            Ok(())
        } else {
            tracing::warn!("Rejected admin call from foreign capability {:?}", cap.authority());
            Err(PoolError::Unauthorized)
        }
    }

    pub fn id(&self) -> AuthorityId {
        self.id
    }
}
