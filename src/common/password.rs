// Colaborador opaco de hashing: `hash(texto) -> digest` y `verify(texto, digest) -> bool`.

use crate::common::error::AppError;

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Genera un digest bcrypt con sal aleatoria. Se ejecuta en un hilo de
    /// bloqueo para no frenar el runtime.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Fallo en la tarea de hashing: {}", e))??;
        Ok(digest)
    }

    pub async fn verify(&self, password: &str, digest: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let digest = digest.to_owned();
        let is_valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
            .await
            .map_err(|e| anyhow::anyhow!("Fallo en la tarea de verificación: {}", e))??;
        Ok(is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_uses_fresh_salt_and_verifies() {
        let hasher = PasswordHasher::new(4);
        let a = hasher.hash("secreto123").await.unwrap();
        let b = hasher.hash("secreto123").await.unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("secreto123", &a).await.unwrap());
        assert!(!hasher.verify("otra-clave", &b).await.unwrap());
    }
}
