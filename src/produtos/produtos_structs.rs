// src/produtos/produtos_structs.rs

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Categorias fixas do catálogo de eletrônicos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Smartphone,
    Laptop,
    Appliance,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Smartphone => "Smartphone",
            Category::Laptop => "Laptop",
            Category::Appliance => "Appliance",
        };
        f.write_str(name)
    }
}

/// Erro de conversão de uma categoria armazenada como texto.
#[derive(Debug, Error)]
#[error("categoria desconhecida: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Smartphone" => Ok(Category::Smartphone),
            "Laptop" => Ok(Category::Laptop),
            "Appliance" => Ok(Category::Appliance),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Produto como registrado no catálogo. A quantidade é a fonte autoritativa
/// de disponibilidade de estoque; o preço de venda é o preço vigente (itens
/// já em carrinho carregam uma cópia própria).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub model: String,
    pub category: Category,
    pub selling_price: BigDecimal,
    pub arrival_date: Option<NaiveDate>,
    pub details: Option<String>,
    pub quantity: i32,
}

/// Linha crua da tabela 'products'. Convertida em `Product` imediatamente na
/// borda do armazenamento; nenhuma linha sem tipo passa dessa camada.
#[derive(FromRow)]
pub struct ProductRow {
    pub model: String,
    pub category: String,
    pub selling_price: BigDecimal,
    pub arrival_date: Option<NaiveDate>,
    pub details: Option<String>,
    pub quantity: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = ParseCategoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            model: row.model,
            category: row.category.parse()?,
            selling_price: row.selling_price,
            arrival_date: row.arrival_date,
            details: row.details,
            quantity: row.quantity,
        })
    }
}

/// Estrutura para receber dados do novo produto na requisição POST
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub model: String,
    pub category: Category,
    pub selling_price: BigDecimal,
    pub arrival_date: Option<NaiveDate>,
    pub details: Option<String>,
    pub quantity: i32,
}

/// Corpo das requisições de reposição e de venda direta de estoque.
#[derive(Deserialize)]
pub struct QuantityChange {
    pub quantity: i32,
}
