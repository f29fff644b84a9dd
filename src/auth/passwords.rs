use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// Argon2id hashing with a fresh random salt per digest.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        Self::with_cost(19 * 1024, 2) // 19 MiB
    }

    /// Build a hasher with explicit memory (KiB) and iteration costs.
    ///
    /// Digests record their own parameters, so hashes produced under one cost
    /// still verify after the cost changes.
    pub fn with_cost(m_cost_kib: u32, t_cost: u32) -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(m_cost_kib);
        builder.t_cost(t_cost);
        builder.p_cost(1);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// Returns `Ok(false)` only for a wrong password. A digest that cannot be
    /// parsed is reported as [`AuthError::CorruptCredential`].
    pub fn verify_password(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(encoded)
            .map_err(|err| AuthError::CorruptCredential(err.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::CorruptCredential(err.to_string())),
        }
    }
}
