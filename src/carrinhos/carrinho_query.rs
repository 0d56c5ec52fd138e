// src/carrinhos/carrinho_query.rs

use super::carrinho_error::CartError;
use super::carrinho_store::CartStore;
use super::carrinho_structs::{Cart, CartId, CartRow, ProductInCart};
use crate::produtos::produtos_structs::Category;

/// Agrupa as linhas do LEFT JOIN carts × cart_products em um carrinho por
/// identificador. As linhas devem vir ordenadas por id de carrinho; um
/// carrinho sem itens (colunas do item NULL) vira um carrinho com lista vazia.
pub fn group_cart_rows(rows: Vec<CartRow>) -> Result<Vec<(CartId, Cart)>, CartError> {
    let mut carts: Vec<(CartId, Cart)> = Vec::new();

    for row in rows {
        let is_new_cart = carts.last().map(|(id, _)| *id != row.id).unwrap_or(true);
        if is_new_cart {
            carts.push((
                row.id,
                Cart {
                    customer: row.customer,
                    paid: row.paid,
                    payment_date: row.payment_date,
                    total: row.total,
                    products: Vec::new(),
                },
            ));
        }

        if let (Some(model), Some(quantity), Some(category), Some(price)) =
            (row.model, row.quantity, row.category, row.price)
        {
            let category = category
                .parse::<Category>()
                .map_err(|e| CartError::Storage(sqlx::Error::Decode(Box::new(e))))?;

            if let Some((_, cart)) = carts.last_mut() {
                cart.products.push(ProductInCart {
                    model,
                    quantity,
                    category,
                    price,
                });
            }
        }
    }

    Ok(carts)
}

/// Visão de leitura para perfis administrativos: todos os carrinhos de todos
/// os clientes, pagos e abertos, cada um com seus itens.
pub struct CartQueryService<S> {
    store: S,
}

impl<S: CartStore> CartQueryService<S> {
    pub fn new(store: S) -> Self {
        CartQueryService { store }
    }

    pub async fn get_all_carts(&self) -> Result<Vec<Cart>, CartError> {
        self.store.get_all_carts().await
    }
}
