// src/carrinhos/carrinho_structs.rs

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::produtos::produtos_structs::Category;

/// Identificador de armazenamento de um carrinho.
pub type CartId = i32;

/// Item de linha dentro de um carrinho.
///
/// Categoria e preço unitário são cópias congeladas no momento em que o item
/// entrou no carrinho. Mudanças posteriores no catálogo não alteram itens já
/// adicionados; apenas a disponibilidade de estoque é relida do catálogo na
/// hora de fechar a compra.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInCart {
    pub model: String,
    pub quantity: i32,
    pub category: Category,
    pub price: BigDecimal,
}

/// Carrinho de um cliente: o aberto (não pago) em montagem ou um registro
/// imutável de compra já fechada.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub customer: String,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub total: BigDecimal,
    pub products: Vec<ProductInCart>,
}

impl Cart {
    /// Carrinho vazio sintético, usado quando o cliente ainda não tem
    /// carrinho aberto. Não corresponde a nenhuma linha no banco.
    pub fn empty(customer: &str) -> Self {
        Cart {
            customer: customer.to_string(),
            paid: false,
            payment_date: None,
            total: BigDecimal::from(0),
            products: Vec::new(),
        }
    }
}

/// Linha do LEFT JOIN entre 'carts' e 'cart_products'. As colunas do item são
/// NULL quando o carrinho não tem itens.
#[derive(Debug, FromRow)]
pub struct CartRow {
    pub id: CartId,
    pub customer: String,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub total: BigDecimal,
    pub model: Option<String>,
    pub quantity: Option<i32>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
}

/// Corpo de POST /carts.
#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub model: String,
}
