// src/carrinhos/carrinho_error.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

use crate::shared::shared_structs::GenericResponse;

/// Desfechos de falha das operações de carrinho. Cada variante encerra a
/// operação que a levantou; não há recuperação local nem sucesso parcial.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Produto {0} não existe no catálogo.")]
    ProductNotFound(String),

    #[error("Produto {0} está sem estoque.")]
    EmptyStock(String),

    #[error("Estoque insuficiente do produto {0} para a quantidade no carrinho.")]
    InsufficientStock(String),

    #[error("Nenhum carrinho aberto para este cliente.")]
    CartNotFound,

    #[error("O carrinho está vazio. Adicione itens antes de fechar a compra.")]
    EmptyCart,

    #[error("Produto {0} não está no carrinho.")]
    ProductNotInCart(String),

    /// Falha de E/S do armazenamento, repassada sem tradução de domínio.
    #[error("falha de armazenamento: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ResponseError for CartError {
    fn status_code(&self) -> StatusCode {
        match self {
            CartError::ProductNotFound(_)
            | CartError::CartNotFound
            | CartError::ProductNotInCart(_) => StatusCode::NOT_FOUND,
            CartError::EmptyStock(_) | CartError::InsufficientStock(_) => StatusCode::CONFLICT,
            CartError::EmptyCart => StatusCode::BAD_REQUEST,
            CartError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Detalhes de E/S ficam no log; o cliente recebe uma mensagem genérica
        let message = if let CartError::Storage(e) = self {
            error!("Falha de armazenamento no carrinho: {:?}", e);
            "Erro interno ao processar o carrinho.".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(GenericResponse::error(message))
    }
}

/// Identifica violação de constraint de unicidade do PostgreSQL (23505),
/// usada para resolver corridas de verifica-e-cria sem duplicar linhas.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_failure_kind() {
        assert_eq!(
            CartError::ProductNotFound("M1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(CartError::CartNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CartError::ProductNotInCart("M1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CartError::EmptyStock("M1".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CartError::InsufficientStock("M1".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(CartError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CartError::Storage(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
