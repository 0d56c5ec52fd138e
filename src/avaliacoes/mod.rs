// src/avaliacoes/mod.rs

// Declara o submódulo que contém as definições das structs de avaliações
pub mod avaliacao_structs;
// Declara o submódulo que contém as funções de rota relacionadas a avaliações
pub mod avaliacao_router;
