// src/services/auth.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::{
        auth::{AuthResponse, Claims, RegistroPayload, UsuarioResumen},
        usuario::Usuario,
    },
    services::usuario_service::UsuarioService,
};

#[derive(Clone)]
pub struct AuthService {
    usuario_service: UsuarioService,
    jwt_secret: String,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(usuario_service: UsuarioService, jwt_secret: String, expiration_hours: i64) -> Self {
        Self {
            usuario_service,
            jwt_secret,
            expiration_hours,
        }
    }

    /// Alta pública: siempre con rol `usuario`.
    pub async fn register(&self, payload: RegistroPayload) -> Result<AuthResponse, AppError> {
        let usuario = self.usuario_service.create(payload.into()).await?;
        self.respuesta(&usuario)
    }

    pub async fn login(&self, correo: &str, password: &str) -> Result<AuthResponse, AppError> {
        let Some(usuario) = self.usuario_service.get_by_correo(correo).await? else {
            tracing::warn!("Login rechazado: correo desconocido");
            return Err(AppError::InvalidCredentials);
        };

        let is_password_valid = self
            .usuario_service
            .hasher()
            .verify(password, &usuario.password)
            .await?;
        if !is_password_valid {
            tracing::warn!("Login rechazado: contraseña incorrecta para el usuario {}", usuario.id);
            return Err(AppError::InvalidCredentials);
        }

        if !usuario.activo {
            tracing::warn!("Login rechazado: usuario {} inactivo", usuario.id);
            return Err(AppError::InactiveUser);
        }

        self.respuesta(&usuario)
    }

    /// Verifica firma y expiración y recarga el usuario: un usuario borrado
    /// o desactivado invalida sus tokens vigentes.
    pub async fn validate_token(&self, token: &str) -> Result<Usuario, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let usuario = match self.usuario_service.find(token_data.claims.sub).await {
            Ok(usuario) => usuario,
            Err(AppError::NotFound(_)) => return Err(AppError::InvalidToken),
            Err(e) => return Err(e),
        };

        if !usuario.activo {
            return Err(AppError::InactiveUser);
        }
        Ok(usuario)
    }

    pub fn create_token(&self, usuario: &Usuario) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.expiration_hours)
            .and_then(|vigencia| now.checked_add_signed(vigencia))
            .ok_or_else(|| {
                anyhow::anyhow!("Vigencia de token fuera de rango: {} horas", self.expiration_hours)
            })?;

        let claims = Claims {
            sub: usuario.id,
            correo: usuario.correo.clone(),
            nombre: usuario.nombre.clone(),
            rol: usuario.rol,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn respuesta(&self, usuario: &Usuario) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            usuario: UsuarioResumen::from(usuario),
            access_token: self.create_token(usuario)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::password::PasswordHasher;
    use crate::db::Repositories;
    use crate::models::usuario::Rol;
    use crate::services::usuario_service::tests::base;
    use chrono::NaiveDate;

    const SECRET: &str = "secreto-de-pruebas";

    async fn setup() -> AuthService {
        let repos = Repositories::in_memory();
        base(&repos).await;
        let usuarios = UsuarioService::new(
            repos.usuarios.clone(),
            repos.direcciones.clone(),
            repos.departamentos.clone(),
            PasswordHasher::new(4),
        );
        AuthService::new(usuarios, SECRET.to_string(), 24)
    }

    fn registro(correo: &str, cedula: &str) -> RegistroPayload {
        RegistroPayload {
            nombre: "Pedro Mero".into(),
            correo: correo.into(),
            password: "clave123".into(),
            numero_cedula: cedula.into(),
            fecha_nacimiento: NaiveDate::from_ymd_opt(1992, 8, 15).unwrap(),
            celular: "0991112233".into(),
            nom_contacto_emerg: None,
            tel_contacto_emerg: None,
            direccion_id: 1,
            departamento_id: 1,
        }
    }

    #[tokio::test]
    async fn register_issues_token_with_usuario_role() {
        let auth = setup().await;
        let respuesta = auth.register(registro("pedro@gad.ec", "1305")).await.unwrap();

        assert_eq!(respuesta.usuario.rol, Rol::Usuario);
        let usuario = auth.validate_token(&respuesta.access_token).await.unwrap();
        assert_eq!(usuario.correo, "pedro@gad.ec");
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let auth = setup().await;
        auth.register(registro("pedro@gad.ec", "1305")).await.unwrap();

        assert!(auth.login("pedro@gad.ec", "clave123").await.is_ok());
        assert!(matches!(
            auth.login("pedro@gad.ec", "otra-clave").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nadie@gad.ec", "clave123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn inactive_user_cannot_login_nor_use_old_token() {
        let auth = setup().await;
        let respuesta = auth.register(registro("pedro@gad.ec", "1305")).await.unwrap();
        auth.usuario_service.deactivate(respuesta.usuario.id).await.unwrap();

        assert!(matches!(
            auth.login("pedro@gad.ec", "clave123").await,
            Err(AppError::InactiveUser)
        ));
        assert!(matches!(
            auth.validate_token(&respuesta.access_token).await,
            Err(AppError::InactiveUser)
        ));
    }

    #[tokio::test]
    async fn rejects_foreign_and_expired_tokens() {
        let auth = setup().await;
        let respuesta = auth.register(registro("pedro@gad.ec", "1305")).await.unwrap();

        let otro = AuthService::new(auth.usuario_service.clone(), "otro-secreto".into(), 24);
        assert!(matches!(
            otro.validate_token(&respuesta.access_token).await,
            Err(AppError::InvalidToken)
        ));

        let caducado = AuthService::new(auth.usuario_service.clone(), SECRET.into(), -2);
        let usuario = auth.validate_token(&respuesta.access_token).await.unwrap();
        let token = caducado.create_token(&usuario).unwrap();
        assert!(matches!(
            auth.validate_token(&token).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn out_of_range_expiration_is_an_error() {
        let auth = setup().await;
        let respuesta = auth.register(registro("pedro@gad.ec", "1305")).await.unwrap();
        let usuario = auth.validate_token(&respuesta.access_token).await.unwrap();

        let desbordado = AuthService::new(auth.usuario_service.clone(), SECRET.into(), i64::MAX);
        assert!(matches!(
            desbordado.create_token(&usuario),
            Err(AppError::InternalServerError(_))
        ));
    }
}
