// src/usuarios/usuario_structs.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Papéis reconhecidos pela API. O papel chega nas rotas dentro do token e
/// decide o que cada usuário pode fazer antes de qualquer lógica de domínio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Manager,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Customer => "Customer",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        };
        f.write_str(name)
    }
}

/// Erro de conversão de um papel armazenado/transportado como texto.
#[derive(Debug, Error)]
#[error("papel desconhecido: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Manager" => Ok(Role::Manager),
            "Admin" => Ok(Role::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// Dados públicos de um usuário, como expostos pela API.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub role: Role,
}

/// Linha crua da tabela 'users'. O hash da senha nunca sai desta camada.
#[derive(FromRow)]
pub struct UserRow {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub password_hash: String,
}

impl UserRow {
    /// Converte a linha em usuário público, validando o papel armazenado.
    pub fn into_user(self) -> Result<User, ParseRoleError> {
        Ok(User {
            role: self.role.parse()?,
            username: self.username,
            name: self.name,
            surname: self.surname,
        })
    }
}

/// Estrutura para receber dados de um novo usuário na requisição de cadastro.
#[derive(Deserialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub password: String, // Senha em texto claro (vira hash antes de salvar)
    pub role: Role,
}

/// Estrutura para receber dados de login do usuário.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Estrutura para o payload do JWT (Claims).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // username
    pub role: String, // papel do usuário no momento do login
    pub exp: i64,     // Expiration Time (timestamp Unix)
}

/// Estrutura para a resposta de sucesso do login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub status: String,
    pub message: String,
    pub user: User,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Customer, Role::Manager, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("Root".parse::<Role>().is_err());
    }
}
