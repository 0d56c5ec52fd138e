// src/carrinhos/mod.rs

// Declara o submódulo que contém as definições das structs de carrinho
pub mod carrinho_structs;
// Erros de domínio do ciclo de vida do carrinho
pub mod carrinho_error;
// Armazenamento durável de carrinhos e itens (Cart Store)
pub mod carrinho_store;
// Orquestração das operações de carrinho (Cart Engine)
pub mod carrinho_engine;
// Visão administrativa de leitura sobre todos os carrinhos
pub mod carrinho_query;
// Declara o submódulo que contém as funções de rota relacionadas a carrinhos
pub mod carrinho_router;
