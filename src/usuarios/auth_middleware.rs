// src/usuarios/auth_middleware.rs

use actix_web::{dev::Payload, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::error;

// Importa as Claims e os papéis do módulo de structs de usuário
use super::usuario_structs::{Claims, Role};
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Identidade já autenticada de uma requisição: quem é e com qual papel.
/// As rotas confiam integralmente nesse par; nenhuma camada abaixo
/// reautentica nada.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Verifica se o papel do usuário está entre os permitidos para a rota.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Extrator de autenticação para Actix Web: valida o JWT do cabeçalho
/// Authorization e produz o `AuthenticatedUser` da requisição.
impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Acessa o AppState para obter a chave secreta JWT
        let jwt_secret = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.jwt_secret.clone(),
            None => {
                error!("AppState indisponível no extrator de autenticação.");
                return ready(Err(ErrorUnauthorized("Erro de configuração do servidor.")));
            }
        };

        // O token chega como "Authorization: Bearer <jwt>"
        let header = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        let token = match header {
            Some(value) if value.starts_with("Bearer ") => value.trim_start_matches("Bearer "),
            Some(_) => {
                return ready(Err(ErrorUnauthorized(
                    "Formato de token inválido. Esperado 'Bearer <token>'.",
                )))
            }
            None => return ready(Err(ErrorUnauthorized("Token de autenticação ausente."))),
        };

        // Decodifica e valida o token (assinatura e expiração)
        let token_data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(data) => data,
            Err(e) => {
                let message = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expirado.",
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => "Assinatura do token inválida.",
                    _ => "Token de autenticação inválido.",
                };
                return ready(Err(ErrorUnauthorized(message)));
            }
        };

        // O papel viaja como texto dentro do token; um valor fora da lista
        // conhecida invalida a credencial inteira
        let role = match token_data.claims.role.parse::<Role>() {
            Ok(role) => role,
            Err(_) => return ready(Err(ErrorUnauthorized("Papel inválido no token."))),
        };

        ready(Ok(AuthenticatedUser {
            username: token_data.claims.sub,
            role,
        }))
    }
}
