// src/carrinhos/carrinho_engine.rs

use chrono::NaiveDate;

use super::carrinho_error::{is_unique_violation, CartError};
use super::carrinho_store::CartStore;
use super::carrinho_structs::{Cart, CartId};
use crate::produtos::produtos_estoque::StockLedger;

/// Motor do ciclo de vida do carrinho: compõe o armazenamento de carrinhos e
/// o estoque do catálogo, aplicando as regras de negócio de cada operação.
///
/// Nenhum estado de carrinho fica em memória entre chamadas: toda operação
/// reconsulta o armazenamento, então duas requisições concorrentes nunca
/// enxergam um carrinho em cache defasado.
pub struct CartEngine<S, L> {
    store: S,
    ledger: L,
}

impl<S: CartStore, L: StockLedger> CartEngine<S, L> {
    pub fn new(store: S, ledger: L) -> Self {
        CartEngine { store, ledger }
    }

    /// Adiciona uma unidade do modelo ao carrinho aberto do cliente, criando
    /// o carrinho se não existir. O item novo congela categoria e preço
    /// vigentes do catálogo; um item existente só tem a quantidade somada.
    pub async fn add_to_cart(&self, customer: &str, model: &str) -> Result<(), CartError> {
        // 1. O produto precisa existir e ter estoque no momento da adição
        let product = self
            .ledger
            .find_by_model(model)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(model.to_string()))?;

        if product.quantity == 0 {
            return Err(CartError::EmptyStock(model.to_string()));
        }

        // 2. Carrinho aberto do cliente, criado na primeira adição
        let (cart, cart_id) = self.current_cart_or_create(customer).await?;

        // 3. Soma na linha existente ou insere uma linha nova com os
        // valores congelados do produto
        let snapshot_price = cart
            .products
            .iter()
            .find(|item| item.model == model)
            .map(|item| item.price.clone());

        if snapshot_price.is_some() {
            self.store.increment_line_item(cart_id, model).await?;
        } else {
            match self.store.add_line_item(cart_id, &product).await {
                Ok(()) => {}
                // Corrida: outra requisição inseriu a mesma linha entre a
                // leitura do carrinho e o INSERT; soma na linha dela
                Err(CartError::Storage(e)) if is_unique_violation(&e) => {
                    self.store.increment_line_item(cart_id, model).await?;
                }
                Err(e) => return Err(e),
            }
        }

        // 4. O total acompanha cada mutação; nunca é recalculado na leitura.
        // Ao somar em linha existente o acréscimo usa o preço congelado da
        // linha, para o total continuar igual à soma dos itens mesmo que o
        // preço de catálogo tenha mudado desde a primeira adição
        let unit_price = snapshot_price.unwrap_or_else(|| product.selling_price.clone());
        self.store.adjust_total(cart_id, &unit_price).await
    }

    /// Carrinho aberto do cliente, ou um carrinho vazio sintético se não
    /// houver. Nunca cria carrinho como efeito colateral.
    pub async fn get_cart(&self, customer: &str) -> Result<Cart, CartError> {
        Ok(match self.store.get_unpaid_cart(customer).await? {
            Some((cart, _)) => cart,
            None => Cart::empty(customer),
        })
    }

    /// Fecha a compra do carrinho aberto. O estoque é revalidado contra o
    /// catálogo no fechamento, não na adição: entre uma coisa e outra o
    /// produto pode ter sido vendido para outros clientes. A data de
    /// pagamento vem do chamador.
    pub async fn checkout_cart(&self, customer: &str, today: NaiveDate) -> Result<(), CartError> {
        let (cart, cart_id) = self
            .store
            .get_unpaid_cart(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if cart.products.is_empty() {
            return Err(CartError::EmptyCart);
        }

        self.store.checkout(cart_id, today).await
    }

    /// Histórico de compras: somente os carrinhos pagos do cliente. O
    /// carrinho aberto atual fica de fora.
    pub async fn get_customer_carts(&self, customer: &str) -> Result<Vec<Cart>, CartError> {
        self.store.get_paid_carts(customer).await
    }

    /// Remove uma unidade do modelo do carrinho aberto. Com quantidade 1 a
    /// linha sai por inteiro; o desconto no total usa o preço congelado no
    /// carrinho, não o preço atual do catálogo.
    pub async fn remove_product_from_cart(&self, customer: &str, model: &str) -> Result<(), CartError> {
        if self.ledger.find_by_model(model).await?.is_none() {
            return Err(CartError::ProductNotFound(model.to_string()));
        }

        let (cart, cart_id) = self
            .store
            .get_unpaid_cart(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let item = cart
            .products
            .iter()
            .find(|item| item.model == model)
            .ok_or_else(|| CartError::ProductNotInCart(model.to_string()))?;

        if item.quantity > 1 {
            self.store.decrement_line_item(cart_id, model).await?;
        } else {
            self.store.remove_line_item(cart_id, model).await?;
        }

        let delta = -item.price.clone();
        self.store.adjust_total(cart_id, &delta).await
    }

    /// Esvazia o carrinho aberto: remove todos os itens e zera o total. O
    /// carrinho continua existindo e é reaproveitado pela próxima adição.
    pub async fn clear_cart(&self, customer: &str) -> Result<(), CartError> {
        let (_, cart_id) = self
            .store
            .get_unpaid_cart(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;

        self.store.clear_line_items(cart_id).await?;
        self.store.reset_total(cart_id).await
    }

    /// Limpeza administrativa: apaga todos os carrinhos de todos os clientes.
    pub async fn delete_all_carts(&self) -> Result<(), CartError> {
        self.store.delete_all().await
    }

    // Busca o carrinho aberto; se não houver, cria um. Se outra requisição
    // criar primeiro e o INSERT cair no índice único, rebusca o dela.
    async fn current_cart_or_create(&self, customer: &str) -> Result<(Cart, CartId), CartError> {
        if let Some(found) = self.store.get_unpaid_cart(customer).await? {
            return Ok(found);
        }

        match self.store.create_cart(customer).await {
            Ok(created) => Ok(created),
            Err(CartError::Storage(e)) if is_unique_violation(&e) => self
                .store
                .get_unpaid_cart(customer)
                .await?
                .ok_or(CartError::Storage(e)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    use super::*;
    use crate::carrinhos::carrinho_structs::ProductInCart;
    use crate::produtos::produtos_structs::{Category, Product};

    // ------------------------------------------------------------------
    // Dublês em memória: um único "banco" compartilhado que implementa o
    // Cart Store e o estoque, com a mesma semântica das tabelas reais.
    // ------------------------------------------------------------------

    struct StoredCart {
        id: CartId,
        customer: String,
        paid: bool,
        payment_date: Option<NaiveDate>,
        total: BigDecimal,
        items: Vec<ProductInCart>,
    }

    impl StoredCart {
        fn to_cart(&self) -> Cart {
            Cart {
                customer: self.customer.clone(),
                paid: self.paid,
                payment_date: self.payment_date,
                total: self.total.clone(),
                products: self.items.clone(),
            }
        }
    }

    #[derive(Default)]
    struct State {
        products: HashMap<String, Product>,
        carts: Vec<StoredCart>,
        next_id: CartId,
    }

    #[derive(Clone, Default)]
    struct MemDb(Arc<Mutex<State>>);

    impl MemDb {
        fn with_products(products: Vec<Product>) -> Self {
            let db = MemDb::default();
            {
                let mut state = db.0.lock().unwrap();
                for product in products {
                    state.products.insert(product.model.clone(), product);
                }
            }
            db
        }

        fn product_quantity(&self, model: &str) -> i32 {
            self.0.lock().unwrap().products[model].quantity
        }

        fn set_product_quantity(&self, model: &str, quantity: i32) {
            self.0.lock().unwrap().products.get_mut(model).unwrap().quantity = quantity;
        }

        fn set_product_price(&self, model: &str, price: i64) {
            self.0.lock().unwrap().products.get_mut(model).unwrap().selling_price =
                BigDecimal::from(price);
        }

        fn cart_count(&self) -> usize {
            self.0.lock().unwrap().carts.len()
        }

        fn unpaid_count(&self, customer: &str) -> usize {
            self.0
                .lock()
                .unwrap()
                .carts
                .iter()
                .filter(|c| c.customer == customer && !c.paid)
                .count()
        }
    }

    #[async_trait]
    impl crate::produtos::produtos_estoque::StockLedger for MemDb {
        async fn find_by_model(&self, model: &str) -> Result<Option<Product>, sqlx::Error> {
            Ok(self.0.lock().unwrap().products.get(model).cloned())
        }

        async fn decrement_quantity(&self, model: &str, amount: i32) -> Result<(), sqlx::Error> {
            if let Some(product) = self.0.lock().unwrap().products.get_mut(model) {
                product.quantity -= amount;
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CartStore for MemDb {
        async fn get_unpaid_cart(&self, customer: &str) -> Result<Option<(Cart, CartId)>, CartError> {
            let state = self.0.lock().unwrap();
            Ok(state
                .carts
                .iter()
                .find(|c| c.customer == customer && !c.paid)
                .map(|c| (c.to_cart(), c.id)))
        }

        async fn create_cart(&self, customer: &str) -> Result<(Cart, CartId), CartError> {
            let mut state = self.0.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.carts.push(StoredCart {
                id,
                customer: customer.to_string(),
                paid: false,
                payment_date: None,
                total: BigDecimal::from(0),
                items: Vec::new(),
            });
            Ok((Cart::empty(customer), id))
        }

        async fn add_line_item(&self, cart_id: CartId, product: &Product) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            let cart = state.carts.iter_mut().find(|c| c.id == cart_id).unwrap();
            cart.items.push(ProductInCart {
                model: product.model.clone(),
                quantity: 1,
                category: product.category,
                price: product.selling_price.clone(),
            });
            Ok(())
        }

        async fn increment_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                if let Some(item) = cart.items.iter_mut().find(|i| i.model == model) {
                    item.quantity += 1;
                }
            }
            Ok(())
        }

        async fn decrement_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                if let Some(item) = cart.items.iter_mut().find(|i| i.model == model) {
                    item.quantity -= 1;
                }
            }
            Ok(())
        }

        async fn remove_line_item(&self, cart_id: CartId, model: &str) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                cart.items.retain(|i| i.model != model);
            }
            Ok(())
        }

        async fn adjust_total(&self, cart_id: CartId, delta: &BigDecimal) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                cart.total = &cart.total + delta;
            }
            Ok(())
        }

        async fn reset_total(&self, cart_id: CartId) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                cart.total = BigDecimal::from(0);
            }
            Ok(())
        }

        async fn clear_line_items(&self, cart_id: CartId) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                cart.items.clear();
            }
            Ok(())
        }

        async fn mark_paid(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();
            if let Some(cart) = state.carts.iter_mut().find(|c| c.id == cart_id) {
                cart.paid = true;
                cart.payment_date = Some(payment_date);
            }
            Ok(())
        }

        async fn checkout(&self, cart_id: CartId, payment_date: NaiveDate) -> Result<(), CartError> {
            let mut state = self.0.lock().unwrap();

            let items = state
                .carts
                .iter()
                .find(|c| c.id == cart_id)
                .map(|c| c.items.clone())
                .unwrap_or_default();

            // Valida tudo antes de tocar em qualquer coisa: uma falha não
            // deixa baixa parcial de estoque, como na transação real
            for item in &items {
                let available = state
                    .products
                    .get(&item.model)
                    .ok_or_else(|| CartError::ProductNotFound(item.model.clone()))?
                    .quantity;
                if available == 0 {
                    return Err(CartError::EmptyStock(item.model.clone()));
                }
                if available < item.quantity {
                    return Err(CartError::InsufficientStock(item.model.clone()));
                }
            }

            for item in &items {
                state.products.get_mut(&item.model).unwrap().quantity -= item.quantity;
            }

            let cart = state.carts.iter_mut().find(|c| c.id == cart_id).unwrap();
            cart.paid = true;
            cart.payment_date = Some(payment_date);
            Ok(())
        }

        async fn get_paid_carts(&self, customer: &str) -> Result<Vec<Cart>, CartError> {
            let state = self.0.lock().unwrap();
            Ok(state
                .carts
                .iter()
                .filter(|c| c.customer == customer && c.paid)
                .map(StoredCart::to_cart)
                .collect())
        }

        async fn get_all_carts(&self) -> Result<Vec<Cart>, CartError> {
            let state = self.0.lock().unwrap();
            Ok(state.carts.iter().map(StoredCart::to_cart).collect())
        }

        async fn delete_all(&self) -> Result<(), CartError> {
            self.0.lock().unwrap().carts.clear();
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn product(model: &str, price: i64, quantity: i32) -> Product {
        Product {
            model: model.to_string(),
            category: Category::Smartphone,
            selling_price: BigDecimal::from(price),
            arrival_date: None,
            details: None,
            quantity,
        }
    }

    fn engine(db: &MemDb) -> CartEngine<MemDb, MemDb> {
        CartEngine::new(db.clone(), db.clone())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn assert_total_consistent(cart: &Cart) {
        let computed = cart.products.iter().fold(BigDecimal::from(0), |acc, item| {
            acc + BigDecimal::from(item.quantity) * &item.price
        });
        assert_eq!(cart.total, computed, "total difere da soma dos itens");
    }

    // ------------------------------------------------------------------
    // Cenários
    // ------------------------------------------------------------------

    #[actix_web::test]
    async fn adding_same_model_twice_accumulates_quantity() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.add_to_cart("ana", "M1").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.products[0].quantity, 2);
        assert_eq!(cart.total, BigDecimal::from(200));
        assert_total_consistent(&cart);
    }

    #[actix_web::test]
    async fn add_with_empty_stock_fails_and_creates_no_cart() {
        let db = MemDb::with_products(vec![product("M2", 80, 0)]);
        let engine = engine(&db);

        let err = engine.add_to_cart("ana", "M2").await.unwrap_err();
        assert!(matches!(err, CartError::EmptyStock(model) if model == "M2"));
        assert_eq!(db.cart_count(), 0);
    }

    #[actix_web::test]
    async fn add_unknown_model_fails() {
        let db = MemDb::with_products(vec![]);
        let engine = engine(&db);

        let err = engine.add_to_cart("ana", "M9").await.unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(model) if model == "M9"));
        assert_eq!(db.cart_count(), 0);
    }

    #[actix_web::test]
    async fn checkout_with_insufficient_stock_changes_nothing() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.add_to_cart("ana", "M1").await.unwrap();

        // O estoque caiu para 1 entre a adição e o fechamento
        db.set_product_quantity("M1", 1);

        let err = engine.checkout_cart("ana", today()).await.unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock(model) if model == "M1"));

        let cart = engine.get_cart("ana").await.unwrap();
        assert!(!cart.paid);
        assert_eq!(cart.products[0].quantity, 2);
        assert_eq!(db.product_quantity("M1"), 1);
    }

    #[actix_web::test]
    async fn checkout_failure_on_second_item_rolls_back_first() {
        let db = MemDb::with_products(vec![product("A1", 50, 10), product("Z9", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "A1").await.unwrap();
        engine.add_to_cart("ana", "Z9").await.unwrap();
        db.set_product_quantity("Z9", 0);

        let err = engine.checkout_cart("ana", today()).await.unwrap_err();
        assert!(matches!(err, CartError::EmptyStock(model) if model == "Z9"));

        // Nenhuma baixa parcial: o primeiro item também ficou intacto
        assert_eq!(db.product_quantity("A1"), 10);
        assert!(!engine.get_cart("ana").await.unwrap().paid);
    }

    #[actix_web::test]
    async fn checkout_marks_cart_paid_and_consumes_stock() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.checkout_cart("ana", today()).await.unwrap();

        assert_eq!(db.product_quantity("M1"), 9);

        let history = engine.get_customer_carts("ana").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].paid);
        assert_eq!(history[0].payment_date, Some(today()));
        assert_eq!(history[0].products.len(), 1);
    }

    #[actix_web::test]
    async fn removing_last_unit_deletes_the_line_item() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.remove_product_from_cart("ana", "M1").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert!(cart.products.is_empty());
        assert_eq!(cart.total, BigDecimal::from(0));
    }

    #[actix_web::test]
    async fn removing_one_of_many_units_decrements_quantity() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.remove_product_from_cart("ana", "M1").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products[0].quantity, 1);
        assert_eq!(cart.total, BigDecimal::from(100));
        assert_total_consistent(&cart);
    }

    #[actix_web::test]
    async fn clear_cart_empties_items_and_resets_total() {
        let db = MemDb::with_products(vec![product("M1", 100, 10), product("M2", 50, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.add_to_cart("ana", "M2").await.unwrap();
        engine.clear_cart("ana").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert!(cart.products.is_empty());
        assert_eq!(cart.total, BigDecimal::from(0));
    }

    #[actix_web::test]
    async fn get_cart_never_creates_and_is_idempotent() {
        let db = MemDb::with_products(vec![]);
        let engine = engine(&db);

        let first = engine.get_cart("ana").await.unwrap();
        let second = engine.get_cart("ana").await.unwrap();

        assert_eq!(db.cart_count(), 0);
        assert_eq!(first.customer, second.customer);
        assert!(!first.paid && first.products.is_empty());
        assert_eq!(first.total, BigDecimal::from(0));
        assert_eq!(first.total, second.total);
    }

    #[actix_web::test]
    async fn add_then_get_round_trips_a_single_snapshotted_line() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.products[0].model, "M1");
        assert_eq!(cart.products[0].quantity, 1);
        assert_eq!(cart.products[0].price, BigDecimal::from(100));
        assert_eq!(cart.products[0].category, Category::Smartphone);
    }

    #[actix_web::test]
    async fn catalog_price_change_never_touches_cart_snapshot() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        db.set_product_price("M1", 250);

        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products[0].price, BigDecimal::from(100));

        // A remoção também desconta o preço congelado, não o novo
        engine.remove_product_from_cart("ana", "M1").await.unwrap();
        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.total, BigDecimal::from(0));
    }

    #[actix_web::test]
    async fn adding_more_units_after_price_change_uses_snapshot_price() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        db.set_product_price("M1", 250);
        engine.add_to_cart("ana", "M1").await.unwrap();

        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products[0].quantity, 2);
        assert_eq!(cart.total, BigDecimal::from(200));
        assert_total_consistent(&cart);
    }

    #[actix_web::test]
    async fn at_most_one_unpaid_cart_per_customer() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        assert_eq!(db.unpaid_count("ana"), 1);

        engine.checkout_cart("ana", today()).await.unwrap();
        assert_eq!(db.unpaid_count("ana"), 0);

        // Um novo ciclo começa com um carrinho novo, ainda único
        engine.add_to_cart("ana", "M1").await.unwrap();
        assert_eq!(db.unpaid_count("ana"), 1);
        assert_eq!(db.cart_count(), 2);
    }

    #[actix_web::test]
    async fn emptied_cart_is_reused_not_recreated() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.clear_cart("ana").await.unwrap();
        engine.add_to_cart("ana", "M1").await.unwrap();

        // Esvaziar não apaga a linha do carrinho; a adição seguinte reaproveita
        assert_eq!(db.cart_count(), 1);
        let cart = engine.get_cart("ana").await.unwrap();
        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.total, BigDecimal::from(100));
    }

    #[actix_web::test]
    async fn history_excludes_the_open_cart() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.checkout_cart("ana", today()).await.unwrap();
        engine.add_to_cart("ana", "M1").await.unwrap();

        let history = engine.get_customer_carts("ana").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.iter().all(|cart| cart.paid));
    }

    #[actix_web::test]
    async fn remove_reports_each_missing_piece() {
        let db = MemDb::with_products(vec![product("M1", 100, 10), product("M2", 50, 10)]);
        let engine = engine(&db);

        // Modelo inexistente no catálogo
        let err = engine.remove_product_from_cart("ana", "M9").await.unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(_)));

        // Cliente sem carrinho aberto
        let err = engine.remove_product_from_cart("ana", "M1").await.unwrap_err();
        assert!(matches!(err, CartError::CartNotFound));

        // Carrinho existe mas não tem o modelo
        engine.add_to_cart("ana", "M1").await.unwrap();
        let err = engine.remove_product_from_cart("ana", "M2").await.unwrap_err();
        assert!(matches!(err, CartError::ProductNotInCart(model) if model == "M2"));
    }

    #[actix_web::test]
    async fn checkout_requires_an_existing_nonempty_cart() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        let err = engine.checkout_cart("ana", today()).await.unwrap_err();
        assert!(matches!(err, CartError::CartNotFound));

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.clear_cart("ana").await.unwrap();

        let err = engine.checkout_cart("ana", today()).await.unwrap_err();
        assert!(matches!(err, CartError::EmptyCart));
    }

    #[actix_web::test]
    async fn checkout_detects_stock_emptied_after_add() {
        let db = MemDb::with_products(vec![product("M1", 100, 1)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        db.set_product_quantity("M1", 0);

        let err = engine.checkout_cart("ana", today()).await.unwrap_err();
        assert!(matches!(err, CartError::EmptyStock(_)));
    }

    #[actix_web::test]
    async fn clear_cart_without_open_cart_fails() {
        let db = MemDb::with_products(vec![]);
        let engine = engine(&db);

        let err = engine.clear_cart("ana").await.unwrap_err();
        assert!(matches!(err, CartError::CartNotFound));
    }

    #[actix_web::test]
    async fn totals_stay_consistent_through_every_mutation() {
        let db = MemDb::with_products(vec![product("M1", 100, 10), product("M2", 30, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        assert_total_consistent(&engine.get_cart("ana").await.unwrap());

        engine.add_to_cart("ana", "M2").await.unwrap();
        assert_total_consistent(&engine.get_cart("ana").await.unwrap());

        engine.add_to_cart("ana", "M2").await.unwrap();
        assert_total_consistent(&engine.get_cart("ana").await.unwrap());

        engine.remove_product_from_cart("ana", "M1").await.unwrap();
        let cart = engine.get_cart("ana").await.unwrap();
        assert_total_consistent(&cart);
        assert_eq!(cart.total, BigDecimal::from(60));
    }

    #[actix_web::test]
    async fn delete_all_purges_every_cart() {
        let db = MemDb::with_products(vec![product("M1", 100, 10)]);
        let engine = engine(&db);

        engine.add_to_cart("ana", "M1").await.unwrap();
        engine.checkout_cart("ana", today()).await.unwrap();
        engine.add_to_cart("bia", "M1").await.unwrap();

        engine.delete_all_carts().await.unwrap();
        assert_eq!(db.cart_count(), 0);
        assert!(engine.get_customer_carts("ana").await.unwrap().is_empty());
    }
}
