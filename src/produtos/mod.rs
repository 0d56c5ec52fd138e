// src/produtos/mod.rs

// Declara o submódulo que contém as definições das structs de produtos
pub mod produtos_structs;
// Declara o submódulo com a interface de estoque (Stock Ledger)
pub mod produtos_estoque;
// Declara o submódulo que contém as funções de rota relacionadas a produtos
pub mod produtos_router;
