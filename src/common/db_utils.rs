use crate::common::error::AppError;

// Nombres de las restricciones declaradas en migrations/.
pub const USUARIOS_CORREO_KEY: &str = "usuarios_correo_key";
pub const USUARIOS_CEDULA_KEY: &str = "usuarios_numero_cedula_key";
pub const USUARIOS_DEPARTAMENTO_FKEY: &str = "usuarios_departamento_direccion_fkey";
pub const PERMISOS_TRIPLE_KEY: &str = "permisos_usuario_direccion_departamento_key";
pub const PERMISOS_DEPARTAMENTO_FKEY: &str = "permisos_departamento_direccion_fkey";
pub const DEPARTAMENTOS_DIRECCION_FKEY: &str = "departamentos_direccion_id_fkey";
pub const DEPARTAMENTOS_PADRE_FKEY: &str = "departamentos_padre_direccion_fkey";
pub const DEPARTAMENTOS_PADRE_CHECK: &str = "departamentos_padre_distinto";
pub const PERMISOS_USUARIO_FKEY: &str = "permisos_usuario_id_fkey";

pub const MSG_DEPARTAMENTO_FUERA_DE_DIRECCION: &str =
    "El departamento seleccionado no pertenece a la dirección especificada";
pub const MSG_PERMISO_DUPLICADO: &str =
    "Ya existe un permiso para este usuario en este departamento y dirección";

pub const MSG_DIRECCION_CON_DEPARTAMENTOS: &str =
    "No se puede eliminar una dirección que tiene departamentos asociados";
pub const MSG_DEPARTAMENTO_CON_DEPENDIENTES: &str =
    "No se puede eliminar un departamento que tiene usuarios o subdepartamentos asociados";
pub const MSG_PADRE_PROPIO: &str = "Un departamento no puede ser su propio padre";
pub const MSG_PADRE_OTRA_DIRECCION: &str = "El departamento padre no pertenece a la misma dirección";
pub const MSG_CORREO_DUPLICADO: &str = "Ya existe un usuario con ese correo";
pub const MSG_CEDULA_DUPLICADA: &str = "Ya existe un usuario con esa cédula";

/// Conflicto de unicidad para la restricción `constraint`.
pub(crate) fn unique_conflict(constraint: &str) -> AppError {
    match constraint {
        USUARIOS_CORREO_KEY => AppError::conflict(MSG_CORREO_DUPLICADO),
        USUARIOS_CEDULA_KEY => AppError::conflict(MSG_CEDULA_DUPLICADA),
        PERMISOS_TRIPLE_KEY => AppError::conflict(MSG_PERMISO_DUPLICADO),
        other => AppError::conflict(format!("Registro duplicado ({})", other)),
    }
}

/// Conflicto de integridad referencial para la restricción `constraint`.
pub(crate) fn foreign_key_conflict(constraint: &str) -> AppError {
    match constraint {
        USUARIOS_DEPARTAMENTO_FKEY | PERMISOS_DEPARTAMENTO_FKEY => {
            AppError::conflict(MSG_DEPARTAMENTO_FUERA_DE_DIRECCION)
        }
        DEPARTAMENTOS_PADRE_FKEY => AppError::conflict(MSG_PADRE_OTRA_DIRECCION),
        DEPARTAMENTOS_DIRECCION_FKEY => AppError::conflict(MSG_DIRECCION_CON_DEPARTAMENTOS),
        other => AppError::conflict(format!(
            "El registro está referenciado por otros datos ({})",
            other
        )),
    }
}

/// Traduce una violación de restricción del motor al mismo error que
/// produciría la validación previa del servicio.
///
/// Las comprobaciones de los servicios son lectura-y-luego-escritura; bajo
/// concurrencia la restricción de la base es la que decide, y el cliente
/// debe recibir el mismo 409.
pub(crate) fn map_constraint_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        let constraint = db_err.constraint().unwrap_or_default();

        if db_err.is_unique_violation() {
            return unique_conflict(constraint);
        }

        if db_err.is_foreign_key_violation() {
            return foreign_key_conflict(constraint);
        }

        if db_err.is_check_violation() && constraint == DEPARTAMENTOS_PADRE_CHECK {
            return AppError::InvalidHierarchy(MSG_PADRE_PROPIO.to_string());
        }
    }
    e.into()
}

/// Escrituras sobre `departamentos`: ahí la FK a `direcciones` solo puede
/// fallar porque la dirección no existe (p. ej. borrada en paralelo).
pub(crate) fn map_departamento_write(e: sqlx::Error, direccion_id: i32) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation()
            && db_err.constraint() == Some(DEPARTAMENTOS_DIRECCION_FKEY)
        {
            return AppError::direccion_not_found(direccion_id);
        }
    }
    map_constraint_violation(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{error::Error as StdError, fmt};

    // Error de motor mínimo con clase y restricción controladas.
    #[derive(Debug)]
    struct FakeDbError {
        kind: ErrorKind,
        constraint: &'static str,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violación de {}", self.constraint)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "violación de restricción"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind, constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { kind, constraint }))
    }

    #[test]
    fn departamento_insert_without_direccion_is_not_found() {
        let err = map_departamento_write(
            db_error(ErrorKind::ForeignKeyViolation, DEPARTAMENTOS_DIRECCION_FKEY),
            9,
        );
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Dirección con ID 9 no encontrada"));

        // Las demás restricciones siguen el mapeo general.
        let err = map_departamento_write(
            db_error(ErrorKind::ForeignKeyViolation, DEPARTAMENTOS_PADRE_FKEY),
            9,
        );
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_PADRE_OTRA_DIRECCION));
    }

    #[test]
    fn direccion_delete_blocked_by_departamentos() {
        let err = map_constraint_violation(db_error(
            ErrorKind::ForeignKeyViolation,
            DEPARTAMENTOS_DIRECCION_FKEY,
        ));
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_DIRECCION_CON_DEPARTAMENTOS));
    }

    #[test]
    fn unique_violations_use_the_service_messages() {
        let err = map_constraint_violation(db_error(ErrorKind::UniqueViolation, USUARIOS_CORREO_KEY));
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_CORREO_DUPLICADO));

        let err = map_constraint_violation(db_error(ErrorKind::CheckViolation, DEPARTAMENTOS_PADRE_CHECK));
        assert!(matches!(err, AppError::InvalidHierarchy(_)));
    }

    #[test]
    fn pairing_constraints_share_one_message() {
        for constraint in [USUARIOS_DEPARTAMENTO_FKEY, PERMISOS_DEPARTAMENTO_FKEY] {
            match foreign_key_conflict(constraint) {
                AppError::Conflict(msg) => assert_eq!(msg, MSG_DEPARTAMENTO_FUERA_DE_DIRECCION),
                other => panic!("se esperaba Conflict, llegó {other:?}"),
            }
        }
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_constraint_violation(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
