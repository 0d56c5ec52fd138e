// src/carrinhos/carrinho_router.rs

use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Local;

use super::carrinho_engine::CartEngine;
use super::carrinho_error::CartError;
use super::carrinho_query::CartQueryService;
use super::carrinho_store::PgCartStore;
use super::carrinho_structs::AddToCartRequest;

use crate::produtos::produtos_estoque::PgStockLedger;
use crate::shared::shared_structs::GenericResponse;
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::usuarios::usuario_structs::Role;
use crate::AppState;

// O motor não guarda estado próprio; montar um por requisição só clona o
// pool de conexões.
fn engine(data: &web::Data<AppState>) -> CartEngine<PgCartStore, PgStockLedger> {
    CartEngine::new(
        PgCartStore::new(data.db_pool.clone()),
        PgStockLedger::new(data.db_pool.clone()),
    )
}

fn customer_only() -> HttpResponse {
    HttpResponse::Unauthorized().json(GenericResponse::error("Operação restrita a clientes."))
}

fn staff_only() -> HttpResponse {
    HttpResponse::Unauthorized()
        .json(GenericResponse::error("Operação restrita a gerentes e administradores."))
}

/// Rota que devolve o carrinho aberto do cliente. Sem carrinho aberto, a
/// resposta é um carrinho vazio; nenhuma linha é criada por uma leitura.
#[get("/carts")]
pub async fn get_current_cart(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    let cart = engine(&data).get_cart(&user.username).await?;
    Ok(HttpResponse::Ok().json(cart))
}

/// Rota para adicionar uma unidade de um produto ao carrinho do cliente.
#[post("/carts")]
pub async fn add_to_cart(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    engine(&data).add_to_cart(&user.username, &request.model).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Produto {} adicionado ao carrinho.",
        request.model
    ))))
}

/// Rota que fecha a compra do carrinho aberto, datada de hoje.
#[patch("/carts")]
pub async fn checkout_cart(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    let today = Local::now().date_naive();
    engine(&data).checkout_cart(&user.username, today).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Compra fechada com sucesso!")))
}

/// Rota com o histórico de compras do cliente (somente carrinhos pagos).
#[get("/carts/history")]
pub async fn get_cart_history(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    let carts = engine(&data).get_customer_carts(&user.username).await?;
    Ok(HttpResponse::Ok().json(carts))
}

/// Rota para remover uma unidade de um produto do carrinho aberto.
#[delete("/carts/products/{model}")]
pub async fn remove_product_from_cart(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    let model = path.into_inner();
    engine(&data).remove_product_from_cart(&user.username, &model).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Produto {} removido do carrinho.",
        model
    ))))
}

/// Rota que esvazia o carrinho aberto do cliente.
#[delete("/carts/current")]
pub async fn clear_cart(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Customer]) {
        return Ok(customer_only());
    }

    engine(&data).clear_cart(&user.username).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Carrinho esvaziado.")))
}

/// Rota administrativa com todos os carrinhos de todos os clientes, pagos e
/// abertos (Manager/Admin).
#[get("/carts/all")]
pub async fn get_all_carts(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return Ok(staff_only());
    }

    let query = CartQueryService::new(PgCartStore::new(data.db_pool.clone()));
    let carts = query.get_all_carts().await?;
    Ok(HttpResponse::Ok().json(carts))
}

/// Rota administrativa que apaga todos os carrinhos e itens (Manager/Admin).
#[delete("/carts")]
pub async fn delete_all_carts(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CartError> {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return Ok(staff_only());
    }

    engine(&data).delete_all_carts().await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok("Todos os carrinhos foram removidos.")))
}
