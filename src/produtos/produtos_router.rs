// src/produtos/produtos_router.rs

use actix_web::{get, patch, post, web, HttpResponse, Responder};
use tracing::error;

// Importa as structs definidas no módulo `produtos_structs` dentro da mesma pasta `produtos`
use super::produtos_estoque::{PgStockLedger, StockLedger};
use super::produtos_structs::{NewProduct, Product, ProductRow, QuantityChange};

// Importa o extrator de identidade e os papéis do módulo de usuários
use crate::usuarios::auth_middleware::AuthenticatedUser;
use crate::usuarios::usuario_structs::Role;

// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Rota para registrar um novo produto no catálogo.
///
/// Restrita a Manager/Admin. O modelo é o identificador único: registrar um
/// modelo já existente responde 409.
#[post("/products")]
pub async fn register_product(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    item: web::Json<NewProduct>,
) -> HttpResponse {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }

    // Guardas triviais; a validação de requisição propriamente dita acontece antes daqui
    if item.selling_price <= bigdecimal::BigDecimal::from(0) || item.quantity < 0 {
        return HttpResponse::UnprocessableEntity()
            .json(GenericResponse::error("Preço deve ser positivo e quantidade não pode ser negativa."));
    }

    let result = sqlx::query(
        "INSERT INTO products (model, category, selling_price, arrival_date, details, quantity) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&item.model)
    .bind(item.category.to_string())
    .bind(&item.selling_price)
    .bind(item.arrival_date)
    .bind(&item.details)
    .bind(item.quantity)
    .execute(&data.db_pool)
    .await;

    match result {
        Ok(_) => HttpResponse::Ok().json(GenericResponse::ok(format!(
            "Produto {} registrado com sucesso!",
            item.model
        ))),
        Err(e) => {
            // Chave primária duplicada indica modelo já registrado
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some("23505") {
                    return HttpResponse::Conflict().json(GenericResponse::error(format!(
                        "Produto {} já está registrado.",
                        item.model
                    )));
                }
            }
            error!("Erro ao inserir produto: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao inserir produto."))
        }
    }
}

/// Rota para buscar todos os produtos do catálogo (Manager/Admin).
#[get("/products")]
pub async fn list_products(data: web::Data<AppState>, user: AuthenticatedUser) -> impl Responder {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }

    fetch_products(&data, "SELECT model, category, selling_price, arrival_date, details, quantity \
         FROM products ORDER BY model")
        .await
}

/// Rota para buscar os produtos com estoque disponível (qualquer usuário autenticado).
#[get("/products/available")]
pub async fn list_available_products(data: web::Data<AppState>, _user: AuthenticatedUser) -> impl Responder {
    fetch_products(&data, "SELECT model, category, selling_price, arrival_date, details, quantity \
         FROM products WHERE quantity > 0 ORDER BY model")
        .await
}

// Consulta compartilhada pelas duas listagens acima.
async fn fetch_products(data: &web::Data<AppState>, sql: &str) -> HttpResponse {
    let rows = sqlx::query_as::<_, ProductRow>(sql).fetch_all(&data.db_pool).await;

    match rows {
        Ok(rows) => {
            let products: Result<Vec<Product>, _> = rows.into_iter().map(Product::try_from).collect();
            match products {
                Ok(products) => HttpResponse::Ok().json(products),
                Err(e) => {
                    error!("Categoria inválida no banco: {:?}", e);
                    HttpResponse::InternalServerError()
                        .json(GenericResponse::error("Erro ao processar produtos."))
                }
            }
        }
        Err(e) => {
            error!("Erro ao buscar produtos: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao buscar produtos."))
        }
    }
}

/// Rota para buscar um produto pelo modelo.
#[get("/products/{model}")]
pub async fn get_product_by_model(
    data: web::Data<AppState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let model = path.into_inner();
    let ledger = PgStockLedger::new(data.db_pool.clone());

    match ledger.find_by_model(&model).await {
        Ok(Some(product)) => HttpResponse::Ok().json(product),
        Ok(None) => HttpResponse::NotFound().json(GenericResponse::error(format!(
            "Produto {} não existe no catálogo.",
            model
        ))),
        Err(e) => {
            error!("Erro ao buscar produto {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao buscar produto."))
        }
    }
}

/// Rota para repor o estoque de um produto (Manager/Admin).
///
/// A quantidade informada é somada ao estoque atual.
#[patch("/products/{model}")]
pub async fn restock_product(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    change: web::Json<QuantityChange>,
) -> HttpResponse {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }
    if change.quantity <= 0 {
        return HttpResponse::UnprocessableEntity()
            .json(GenericResponse::error("A quantidade de reposição deve ser positiva."));
    }

    let model = path.into_inner();
    let result = sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE model = $1")
        .bind(&model)
        .bind(change.quantity)
        .execute(&data.db_pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => HttpResponse::NotFound()
            .json(GenericResponse::error(format!("Produto {} não existe no catálogo.", model))),
        Ok(_) => HttpResponse::Ok()
            .json(GenericResponse::ok(format!("Estoque do produto {} atualizado.", model))),
        Err(e) => {
            error!("Erro ao repor estoque de {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao atualizar estoque."))
        }
    }
}

/// Rota para registrar uma venda direta de balcão (Manager/Admin), dando baixa
/// no estoque sem passar por carrinho.
#[patch("/products/{model}/sell")]
pub async fn sell_product(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    change: web::Json<QuantityChange>,
) -> HttpResponse {
    if !user.has_role(&[Role::Manager, Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a gerentes e administradores."));
    }
    if change.quantity <= 0 {
        return HttpResponse::UnprocessableEntity()
            .json(GenericResponse::error("A quantidade vendida deve ser positiva."));
    }

    let model = path.into_inner();
    let ledger = PgStockLedger::new(data.db_pool.clone());

    // Verifica existência e disponibilidade antes da baixa
    let product = match ledger.find_by_model(&model).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return HttpResponse::NotFound().json(GenericResponse::error(format!(
                "Produto {} não existe no catálogo.",
                model
            )));
        }
        Err(e) => {
            error!("Erro ao buscar produto {} para venda: {:?}", model, e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro ao buscar produto."));
        }
    };

    if product.quantity < change.quantity {
        return HttpResponse::Conflict().json(GenericResponse::error(format!(
            "Estoque insuficiente do produto {}. Disponível: {}, solicitado: {}",
            model, product.quantity, change.quantity
        )));
    }

    match ledger.decrement_quantity(&model, change.quantity).await {
        Ok(()) => HttpResponse::Ok().json(GenericResponse::ok(format!(
            "Venda registrada; estoque do produto {} atualizado.",
            model
        ))),
        Err(e) => {
            error!("Erro ao dar baixa no estoque de {}: {:?}", model, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao atualizar estoque."))
        }
    }
}
