// src/avaliacoes/avaliacao_router.rs

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Local;
use sqlx::query_as;
use tracing::error;

// Importa as structs do módulo de avaliações
use super::avaliacao_structs::{NewReview, Review, ReviewRow};
// Importa o extrator de identidade e os papéis do módulo de usuários
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::usuarios::usuario_structs::Role;
// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

// Verifica se o modelo existe no catálogo; responde 404/500 por conta própria.
async fn ensure_product_exists(
    data: &web::Data<AppState>,
    model: &str,
) -> Result<(), HttpResponse> {
    let found = sqlx::query("SELECT model FROM products WHERE model = $1")
        .bind(model)
        .fetch_optional(&data.db_pool)
        .await;

    match found {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(HttpResponse::NotFound().json(GenericResponse::error(format!(
            "Produto {} não existe no catálogo.",
            model
        )))),
        Err(e) => {
            error!("Erro ao verificar produto {}: {:?}", model, e);
            Err(HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro ao verificar produto.")))
        }
    }
}

/// Rota para um cliente avaliar um produto. Um cliente avalia cada modelo no
/// máximo uma vez; a nota vai de 1 a 5 e a data é a de hoje.
#[post("/reviews/{model}")]
pub async fn add_review(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    review: web::Json<NewReview>,
) -> HttpResponse {
    if !user.has_role(&[Role::Customer]) {
        return HttpResponse::Unauthorized().json(GenericResponse::error("Operação restrita a clientes."));
    }
    if !(1..=5).contains(&review.score) {
        return HttpResponse::UnprocessableEntity()
            .json(GenericResponse::error("A nota deve estar entre 1 e 5."));
    }

    let model = path.into_inner();
    if let Err(response) = ensure_product_exists(&data, &model).await {
        return response;
    }

    // 1. Cada cliente avalia um modelo uma única vez
    let existing = sqlx::query("SELECT model FROM reviews WHERE model = $1 AND username = $2")
        .bind(&model)
        .bind(&user.username)
        .fetch_optional(&data.db_pool)
        .await;

    match existing {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(GenericResponse::error(format!(
                "Você já avaliou o produto {}.",
                model
            )));
        }
        Err(e) => {
            error!("Erro ao verificar avaliação existente: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro ao verificar avaliação."));
        }
        _ => {}
    }

    // 2. Insere a avaliação datada de hoje
    let result = sqlx::query(
        "INSERT INTO reviews (model, username, score, review_date, comment) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&model)
    .bind(&user.username)
    .bind(review.score)
    .bind(Local::now().date_naive())
    .bind(&review.comment)
    .execute(&data.db_pool)
    .await;

    match result {
        Ok(_) => HttpResponse::Ok()
            .json(GenericResponse::ok(format!("Avaliação do produto {} registrada.", model))),
        Err(e) => {
            error!("Erro ao inserir avaliação: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao inserir avaliação."))
        }
    }
}

/// Rota com todas as avaliações de um produto.
#[get("/reviews/{model}")]
pub async fn get_product_reviews(
    data: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let model = path.into_inner();
    if let Err(response) = ensure_product_exists(&data, &model).await {
        return response;
    }

    let rows = query_as::<_, ReviewRow>(
        "SELECT model, username, score, review_date, comment FROM reviews \
         WHERE model = $1 ORDER BY review_date, username",
    )
    .bind(&model)
    .fetch_all(&data.db_pool)
    .await;

    match rows {
        Ok(rows) => {
            let reviews: Vec<Review> = rows.into_iter().map(Review::from).collect();
            HttpResponse::Ok().json(reviews)
        }
        Err(e) => {
            error!("Erro ao buscar avaliações de {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao buscar avaliações."))
        }
    }
}

/// Rota para o cliente apagar a própria avaliação de um produto.
#[delete("/reviews/{model}")]
pub async fn delete_own_review(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    if !user.has_role(&[Role::Customer]) {
        return HttpResponse::Unauthorized().json(GenericResponse::error("Operação restrita a clientes."));
    }

    let model = path.into_inner();
    if let Err(response) = ensure_product_exists(&data, &model).await {
        return response;
    }

    let result = sqlx::query("DELETE FROM reviews WHERE model = $1 AND username = $2")
        .bind(&model)
        .bind(&user.username)
        .execute(&data.db_pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => HttpResponse::NotFound().json(
            GenericResponse::error(format!("Você não tem avaliação do produto {}.", model)),
        ),
        Ok(_) => HttpResponse::Ok()
            .json(GenericResponse::ok(format!("Avaliação do produto {} removida.", model))),
        Err(e) => {
            error!("Erro ao remover avaliação de {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao remover avaliação."))
        }
    }
}

/// Rota administrativa que apaga todas as avaliações de um produto
/// (Manager/Admin).
#[delete("/reviews/{model}/all")]
pub async fn delete_product_reviews(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }

    let model = path.into_inner();
    if let Err(response) = ensure_product_exists(&data, &model).await {
        return response;
    }

    let result = sqlx::query("DELETE FROM reviews WHERE model = $1")
        .bind(&model)
        .execute(&data.db_pool)
        .await;

    match result {
        Ok(_) => HttpResponse::Ok()
            .json(GenericResponse::ok(format!("Avaliações do produto {} removidas.", model))),
        Err(e) => {
            error!("Erro ao remover avaliações de {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao remover avaliações."))
        }
    }
}

/// Rota administrativa que apaga todas as avaliações do sistema
/// (Manager/Admin).
#[delete("/reviews")]
pub async fn delete_all_reviews(data: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }

    let result = sqlx::query("DELETE FROM reviews").execute(&data.db_pool).await;

    match result {
        Ok(_) => HttpResponse::Ok().json(GenericResponse::ok("Todas as avaliações foram removidas.")),
        Err(e) => {
            error!("Erro ao remover todas as avaliações: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao remover avaliações."))
        }
    }
}
