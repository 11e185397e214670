use std::sync::Mutex;

use crate::models::address::Address;

/// Broadcasters the user declined during this session.
///
/// Consulted by every broadcaster lookup so a declined broadcaster is not
/// offered again. Never persisted.
#[derive(Debug, Default)]
pub struct BroadcasterExclusions {
    excluded: Mutex<Vec<Address>>,
}

impl BroadcasterExclusions {
    pub fn exclude(&self, address: Address) {
        let mut excluded = self.excluded.lock().unwrap_or_else(|e| e.into_inner());
        if !excluded.contains(&address) {
            tracing::debug!("excluding broadcaster {}", address);
            excluded.push(address);
        }
    }

    pub fn clear(&self) {
        self.excluded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.excluded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(address)
    }

    /// the excluded addresses, in exclusion order
    pub fn to_vec(&self) -> Vec<Address> {
        self.excluded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
