// src/avaliacoes/avaliacao_structs.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Avaliação de um produto feita por um cliente. Cada cliente avalia um
/// modelo no máximo uma vez.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub model: String,
    pub user: String,
    pub score: i32,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

/// Linha crua da tabela 'reviews'.
#[derive(FromRow)]
pub struct ReviewRow {
    pub model: String,
    pub username: String,
    pub score: i32,
    pub review_date: NaiveDate,
    pub comment: Option<String>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            model: row.model,
            user: row.username,
            score: row.score,
            date: row.review_date,
            comment: row.comment,
        }
    }
}

/// Corpo da requisição de nova avaliação.
#[derive(Deserialize)]
pub struct NewReview {
    pub score: i32,
    pub comment: Option<String>,
}
