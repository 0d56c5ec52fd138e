// src/produtos/produtos_estoque.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::produtos_structs::{Product, ProductRow};

/// Interface de leitura/baixa de estoque consumida pelo motor de carrinho.
///
/// O catálogo completo tem mais operações (cadastro, reposição, consultas por
/// categoria), mas o ciclo de vida do carrinho só depende destas duas.
#[async_trait]
pub trait StockLedger {
    /// Busca um produto pelo modelo (identificador único do catálogo).
    async fn find_by_model(&self, model: &str) -> Result<Option<Product>, sqlx::Error>;

    /// Dá baixa de 'amount' unidades no estoque do modelo informado.
    async fn decrement_quantity(&self, model: &str, amount: i32) -> Result<(), sqlx::Error>;
}

/// Implementação do estoque sobre a tabela 'products' do PostgreSQL.
#[derive(Clone)]
pub struct PgStockLedger {
    pool: Pool<Postgres>,
}

impl PgStockLedger {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgStockLedger { pool }
    }
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn find_by_model(&self, model: &str) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT model, category, selling_price, arrival_date, details, quantity \
             FROM products WHERE model = $1",
        )
        .bind(model)
        .fetch_optional(&self.pool)
        .await?;

        // A conversão valida a categoria; uma linha corrompida vira erro de decodificação
        row.map(|row| Product::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .transpose()
    }

    async fn decrement_quantity(&self, model: &str, amount: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE model = $1")
            .bind(model)
            .bind(amount)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
