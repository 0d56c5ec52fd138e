// src/shared/mod.rs

// Declara o submódulo com as estruturas compartilhadas entre os domínios
pub mod shared_structs;
