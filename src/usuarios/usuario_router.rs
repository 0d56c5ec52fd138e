// src/usuarios/usuario_router.rs

use actix_web::{delete, get, post, web, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::query_as;
use tracing::error;

// Importa as structs do módulo de usuários
use super::auth_middleware::AuthenticatedUser;
use super::usuario_structs::{AuthResponse, Claims, LoginRequest, NewUser, Role, User, UserRow};
// Importa GenericResponse do módulo shared_structs
use crate::shared::shared_structs::GenericResponse;
// Importa o AppState do módulo raiz (main.rs)
use crate::AppState;

/// Rota para cadastrar um novo usuário.
#[post("/users")]
pub async fn register_user(
    data: web::Data<AppState>,
    new_user: web::Json<NewUser>,
) -> HttpResponse {
    // 1. Verificar se o username já está em uso
    let existing = query_as::<_, UserRow>(
        "SELECT username, name, surname, role, password_hash FROM users WHERE username = $1",
    )
    .bind(&new_user.username)
    .fetch_optional(&data.db_pool)
    .await;

    match existing {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(GenericResponse::error(format!(
                "Username {} já está em uso.",
                new_user.username
            )));
        }
        Err(e) => {
            error!("Erro ao verificar username existente: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao verificar username."));
        }
        _ => {} // Username livre, pode prosseguir
    }

    // 2. Hash da senha
    let hashed_password = match hash(&new_user.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Erro ao fazer hash da senha: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao processar senha."));
        }
    };

    // 3. Inserir o novo usuário no banco de dados
    let result = sqlx::query(
        "INSERT INTO users (username, name, surname, role, password_hash) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&new_user.username)
    .bind(&new_user.name)
    .bind(&new_user.surname)
    .bind(new_user.role.to_string())
    .bind(&hashed_password)
    .execute(&data.db_pool)
    .await;

    match result {
        Ok(_) => HttpResponse::Ok().json(GenericResponse::ok(format!(
            "Usuário {} cadastrado com sucesso!",
            new_user.username
        ))),
        Err(e) => {
            error!("Erro ao inserir usuário: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao inserir usuário."))
        }
    }
}

/// Rota para login de usuário. Emite um JWT com username e papel.
#[post("/sessions")]
pub async fn login_user(
    data: web::Data<AppState>,
    login_request: web::Json<LoginRequest>,
) -> HttpResponse {
    // 1. Buscar o usuário pelo username
    let user_result = query_as::<_, UserRow>(
        "SELECT username, name, surname, role, password_hash FROM users WHERE username = $1",
    )
    .bind(&login_request.username)
    .fetch_optional(&data.db_pool)
    .await;

    let row = match user_result {
        Ok(Some(row)) => row,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(GenericResponse::error("Credenciais inválidas."));
        }
        Err(e) => {
            error!("Erro ao buscar usuário para login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao processar login."));
        }
    };

    // 2. Verificar a senha
    let password_matches = match verify(&login_request.password, &row.password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            error!("Erro ao verificar senha: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao verificar senha."));
        }
    };

    if !password_matches {
        return HttpResponse::Unauthorized().json(GenericResponse::error("Credenciais inválidas."));
    }

    let user = match row.into_user() {
        Ok(user) => user,
        Err(e) => {
            error!("Papel inválido armazenado: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao processar login."));
        }
    };

    // 3. Gerar o token JWT com validade de 24 horas
    let claims = Claims {
        sub: user.username.clone(),
        role: user.role.to_string(),
        exp: (Utc::now() + Duration::hours(24)).timestamp(),
    };

    let token = match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(data.jwt_secret.as_ref()),
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("Erro ao gerar JWT: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro interno ao gerar token."));
        }
    };

    // 4. Retornar resposta de sucesso
    HttpResponse::Ok().json(AuthResponse {
        status: "success".to_string(),
        message: "Login bem-sucedido!".to_string(),
        user,
        token,
    })
}

/// Rota que devolve a identidade da sessão corrente.
#[get("/sessions/current")]
pub async fn current_session(data: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    match fetch_user(&data, &user.username).await {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => HttpResponse::NotFound()
            .json(GenericResponse::error("Usuário da sessão não existe mais.")),
        Err(response) => response,
    }
}

/// Rota para listar todos os usuários (Admin).
#[get("/users")]
pub async fn list_users(data: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    if !user.has_role(&[Role::Admin]) {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Operação restrita a administradores."));
    }

    let rows = query_as::<_, UserRow>(
        "SELECT username, name, surname, role, password_hash FROM users ORDER BY username",
    )
    .fetch_all(&data.db_pool)
    .await;

    match rows {
        Ok(rows) => {
            let users: Result<Vec<User>, _> = rows.into_iter().map(UserRow::into_user).collect();
            match users {
                Ok(users) => HttpResponse::Ok().json(users),
                Err(e) => {
                    error!("Papel inválido armazenado: {:?}", e);
                    HttpResponse::InternalServerError()
                        .json(GenericResponse::error("Erro ao processar usuários."))
                }
            }
        }
        Err(e) => {
            error!("Erro ao listar usuários: {:?}", e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao listar usuários."))
        }
    }
}

/// Rota para buscar um usuário pelo username (Admin ou o próprio usuário).
#[get("/users/{username}")]
pub async fn get_user_by_username(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let username = path.into_inner();
    if !user.has_role(&[Role::Admin]) && user.username != username {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Você só pode consultar o próprio cadastro."));
    }

    match fetch_user(&data, &username).await {
        Ok(Some(found)) => HttpResponse::Ok().json(found),
        Ok(None) => HttpResponse::NotFound()
            .json(GenericResponse::error(format!("Usuário {} não encontrado.", username))),
        Err(response) => response,
    }
}

/// Rota para remover um usuário (Admin remove não-administradores; qualquer
/// usuário pode remover a si mesmo).
#[delete("/users/{username}")]
pub async fn delete_user(
    data: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let username = path.into_inner();

    let target = match fetch_user(&data, &username).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(GenericResponse::error(format!("Usuário {} não encontrado.", username)));
        }
        Err(response) => return response,
    };

    let removing_self = user.username == username;
    let admin_removing_non_admin = user.role == Role::Admin && target.role != Role::Admin;
    if !removing_self && !admin_removing_non_admin {
        return HttpResponse::Unauthorized()
            .json(GenericResponse::error("Sem permissão para remover este usuário."));
    }

    let result = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(&username)
        .execute(&data.db_pool)
        .await;

    match result {
        Ok(_) => HttpResponse::Ok()
            .json(GenericResponse::ok(format!("Usuário {} removido.", username))),
        Err(e) => {
            error!("Erro ao remover usuário {}: {:?}", username, e);
            HttpResponse::InternalServerError().json(GenericResponse::error("Erro ao remover usuário."))
        }
    }
}

// Busca um usuário público; erros de banco já viram resposta HTTP aqui.
async fn fetch_user(data: &web::Data<AppState>, username: &str) -> Result<Option<User>, HttpResponse> {
    let row = query_as::<_, UserRow>(
        "SELECT username, name, surname, role, password_hash FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&data.db_pool)
    .await;

    match row {
        Ok(Some(row)) => match row.into_user() {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                error!("Papel inválido armazenado para {}: {:?}", username, e);
                Err(HttpResponse::InternalServerError()
                    .json(GenericResponse::error("Erro ao processar usuário.")))
            }
        },
        Ok(None) => Ok(None),
        Err(e) => {
            error!("Erro ao buscar usuário {}: {:?}", username, e);
            Err(HttpResponse::InternalServerError()
                .json(GenericResponse::error("Erro ao buscar usuário.")))
        }
    }
}
