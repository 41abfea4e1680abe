//! Credential persistence
//!
//! The credential lives in four consecutive EEPROM bytes, least significant
//! first, next to a one-byte provisioned flag. A fresh device has neither.

use doorlock_hal::eeprom::{ByteStore, StoreError};
use doorlock_protocol::{Credential, CREDENTIAL_SIZE};

use crate::config::CredentialLayout;

/// Credential record on a byte store
pub struct CredentialStore<S> {
    store: S,
    layout: CredentialLayout,
}

impl<S: ByteStore> CredentialStore<S> {
    /// Wrap a byte store with the given layout
    pub fn new(store: S, layout: CredentialLayout) -> Self {
        Self { store, layout }
    }

    /// Check whether a credential has been provisioned
    pub fn is_provisioned(&mut self) -> Result<bool, StoreError> {
        let flag = self.store.read_byte(self.layout.flag_addr)?;
        Ok(flag == self.layout.provisioned)
    }

    /// Read the stored credential
    pub fn load(&mut self) -> Result<Credential, StoreError> {
        let mut raw = [0u8; CREDENTIAL_SIZE];
        self.store.read_into(self.layout.credential_addr, &mut raw)?;
        Ok(Credential::from_bytes(raw))
    }

    /// Persist a credential and check that it reads back unchanged
    pub fn save(&mut self, credential: Credential) -> Result<(), StoreError> {
        self.store
            .write_from(self.layout.credential_addr, &credential.to_bytes())?;
        if self.load()? != credential {
            return Err(StoreError::Verify);
        }
        debug!("credential stored");
        Ok(())
    }

    /// Set the provisioned flag
    pub fn mark_provisioned(&mut self) -> Result<(), StoreError> {
        self.store
            .write_byte(self.layout.flag_addr, self.layout.provisioned)?;
        if !self.is_provisioned()? {
            return Err(StoreError::Verify);
        }
        Ok(())
    }

    /// Persist the first credential and set the provisioned flag
    pub fn provision(&mut self, credential: Credential) -> Result<(), StoreError> {
        self.save(credential)?;
        self.mark_provisioned()
    }

    /// Compare a candidate with the stored credential
    pub fn verify(&mut self, candidate: Credential) -> Result<bool, StoreError> {
        Ok(self.load()? == candidate)
    }

    /// Zero the credential and clear the provisioned flag
    pub fn erase(&mut self) -> Result<(), StoreError> {
        self.store
            .write_from(self.layout.credential_addr, &[0; CREDENTIAL_SIZE])?;
        self.store.write_byte(self.layout.flag_addr, 0)
    }

    /// Release the underlying byte store
    pub fn release(self) -> S {
        self.store
    }
}
