// src/carrinhos/carrinho_store.rs

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Postgres, Row};

use super::carrinho_error::CartError;
use super::carrinho_query::group_cart_rows;
use super::carrinho_structs::{Cart, CartId, CartRow};
use crate::produtos::produtos_structs::Product;

/// Armazenamento durável de carrinhos e seus itens de linha.
///
/// Esta camada não valida regras de negócio: existência de produto, estoque e
/// presença de carrinho são responsabilidade do motor. A única exceção é
/// `checkout`, cuja validação precisa acontecer dentro da mesma transação que
/// dá baixa no estoque para não deixar janela de corrida.
#[async_trait]
pub trait CartStore {
    /// Carrinho não pago do cliente, com itens populados e total como
    /// armazenado (nunca recalculado na leitura), ou None se não existir.
    async fn get_unpaid_cart(&self, customer: &str) -> Result<Option<(Cart, CartId)>, CartError>;

    /// Insere um carrinho aberto com total 0 e sem itens. Não verifica se já
    /// existe um: o chamador consulta antes, e o índice único parcial de
    /// 'carts' barra a segunda criação concorrente.
    async fn create_cart(&self, customer: &str) -> Result<(Cart, CartId), CartError>;

    /// Insere um item de linha com quantidade 1, copiando categoria e preço
    /// atuais do produto. Falha se já houver item para o par (carrinho, modelo).
    async fn add_line_item(&self, cart_id: CartId, product: &Product) -> Result<(), CartError>;

    /// Soma 1 à quantidade do item. Nenhuma linha afetada não é erro aqui.
    async fn increment_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError>;

    /// Subtrai 1 da quantidade do item. Nenhuma linha afetada não é erro aqui.
    async fn decrement_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError>;

    /// Remove o item de linha por inteiro.
    async fn remove_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError>;

    /// Soma 'delta' (positivo ou negativo) ao total armazenado do carrinho.
    async fn adjust_total(&self, cart_id: CartId, delta: &BigDecimal) -> Result<(), CartError>;

    /// Zera o total armazenado do carrinho.
    async fn reset_total(&self, cart_id: CartId) -> Result<(), CartError>;

    /// Remove todos os itens do carrinho. O total não é tocado por esta
    /// chamada; quem limpa o carrinho também zera o total.
    async fn clear_line_items(&self, cart_id: CartId) -> Result<(), CartError>;

    /// Marca o carrinho como pago na data informada.
    async fn mark_paid(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError>;

    /// Fecha a compra de forma atômica: revalida o estoque de cada item de
    /// linha contra o catálogo, dá baixa nas quantidades e marca o carrinho
    /// como pago, tudo em uma única transação. Uma falha em qualquer item
    /// desfaz tudo: nenhuma baixa de estoque sobrevive a um fechamento que
    /// não marcou o carrinho como pago.
    async fn checkout(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError>;

    /// Todos os carrinhos pagos do cliente, cada um com seus itens.
    async fn get_paid_carts(&self, customer: &str) -> Result<Vec<Cart>, CartError>;

    /// Todos os carrinhos do sistema, pagos e abertos, de todos os clientes.
    async fn get_all_carts(&self) -> Result<Vec<Cart>, CartError>;

    /// Remove todos os carrinhos e todos os itens, de todos os clientes.
    async fn delete_all(&self) -> Result<(), CartError>;
}

/// Implementação do Cart Store sobre as tabelas 'carts' e 'cart_products'.
#[derive(Clone)]
pub struct PgCartStore {
    pool: Pool<Postgres>,
}

impl PgCartStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgCartStore { pool }
    }
}

// Projeção usada pelas leituras de carrinho com itens.
const CART_JOIN: &str = "SELECT c.id, c.customer, c.paid, c.payment_date, c.total, \
     cp.model, cp.quantity, cp.category, cp.price \
     FROM carts c LEFT JOIN cart_products cp ON cp.cart_id = c.id";

// Itens de linha na forma mínima que o fechamento de compra precisa.
#[derive(FromRow)]
struct CartLine {
    model: String,
    quantity: i32,
}

async fn mark_paid_with<'e, E>(
    executor: E,
    cart_id: CartId,
    payment_date: NaiveDate,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE carts SET paid = TRUE, payment_date = $2 WHERE id = $1")
        .bind(cart_id)
        .bind(payment_date)
        .execute(executor)
        .await?;
    Ok(())
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_unpaid_cart(&self, customer: &str) -> Result<Option<(Cart, CartId)>, CartError> {
        let sql = format!("{CART_JOIN} WHERE c.customer = $1 AND NOT c.paid ORDER BY c.id");
        let rows = sqlx::query_as::<_, CartRow>(&sql)
            .bind(customer)
            .fetch_all(&self.pool)
            .await?;

        // O índice único parcial garante no máximo um carrinho aberto
        let mut carts = group_cart_rows(rows)?;
        Ok(carts.pop().map(|(id, cart)| (cart, id)))
    }

    async fn create_cart(&self, customer: &str) -> Result<(Cart, CartId), CartError> {
        let row = sqlx::query("INSERT INTO carts (customer, paid, total) VALUES ($1, FALSE, 0) RETURNING id")
            .bind(customer)
            .fetch_one(&self.pool)
            .await?;

        let id: CartId = row.try_get("id").map_err(CartError::Storage)?;
        Ok((Cart::empty(customer), id))
    }

    async fn add_line_item(&self, cart_id: CartId, product: &Product) -> Result<(), CartError> {
        sqlx::query(
            "INSERT INTO cart_products (cart_id, model, quantity, category, price) \
             VALUES ($1, $2, 1, $3, $4)",
        )
        .bind(cart_id)
        .bind(&product.model)
        .bind(product.category.to_string())
        .bind(&product.selling_price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
        sqlx::query("UPDATE cart_products SET quantity = quantity + 1 WHERE cart_id = $1 AND model = $2")
            .bind(cart_id)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn decrement_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
        sqlx::query("UPDATE cart_products SET quantity = quantity - 1 WHERE cart_id = $1 AND model = $2")
            .bind(cart_id)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
        sqlx::query("DELETE FROM cart_products WHERE cart_id = $1 AND model = $2")
            .bind(cart_id)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn adjust_total(&self, cart_id: CartId, delta: &BigDecimal) -> Result<(), CartError> {
        sqlx::query("UPDATE carts SET total = total + $2 WHERE id = $1")
            .bind(cart_id)
            .bind(delta)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_total(&self, cart_id: CartId) -> Result<(), CartError> {
        sqlx::query("UPDATE carts SET total = 0 WHERE id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_line_items(&self, cart_id: CartId) -> Result<(), CartError> {
        sqlx::query("DELETE FROM cart_products WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_paid(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError> {
        mark_paid_with(&self.pool, cart_id, payment_date).await?;
        Ok(())
    }

    async fn checkout(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT model, quantity FROM cart_products WHERE cart_id = $1 ORDER BY model",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            // FOR UPDATE tranca a linha do produto até o fim da transação:
            // a quantidade lida é a autoritativa, não a cópia do carrinho
            let product_row = sqlx::query("SELECT quantity FROM products WHERE model = $1 FOR UPDATE")
                .bind(&line.model)
                .fetch_optional(&mut *tx)
                .await?;

            // Um retorno antecipado derruba 'tx', e o drop desfaz a transação
            let available: i32 = match product_row {
                Some(row) => row.try_get("quantity").map_err(CartError::Storage)?,
                None => return Err(CartError::ProductNotFound(line.model.clone())),
            };

            if available == 0 {
                return Err(CartError::EmptyStock(line.model.clone()));
            }
            if available < line.quantity {
                return Err(CartError::InsufficientStock(line.model.clone()));
            }

            sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE model = $1")
                .bind(&line.model)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        mark_paid_with(&mut *tx, cart_id, payment_date).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_paid_carts(&self, customer: &str) -> Result<Vec<Cart>, CartError> {
        let sql = format!("{CART_JOIN} WHERE c.customer = $1 AND c.paid ORDER BY c.id, cp.model");
        let rows = sqlx::query_as::<_, CartRow>(&sql)
            .bind(customer)
            .fetch_all(&self.pool)
            .await?;

        Ok(group_cart_rows(rows)?.into_iter().map(|(_, cart)| cart).collect())
    }

    async fn get_all_carts(&self) -> Result<Vec<Cart>, CartError> {
        let sql = format!("{CART_JOIN} ORDER BY c.id, cp.model");
        let rows = sqlx::query_as::<_, CartRow>(&sql).fetch_all(&self.pool).await?;

        Ok(group_cart_rows(rows)?.into_iter().map(|(_, cart)| cart).collect())
    }

    async fn delete_all(&self) -> Result<(), CartError> {
        // Uma única transação: a limpeza administrativa é tudo-ou-nada
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_products").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM carts").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
