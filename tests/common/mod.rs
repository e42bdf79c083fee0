// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use chrono::Utc;
use payflow::application::accounts::AccountService;
use payflow::application::engine::TransferEngine;
use payflow::domain::account::{AccountId, Balance, NewAccount};
use payflow::domain::ports::AccountStore;
use payflow::infrastructure::in_memory::InMemoryStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub async fn seed_account(store: &InMemoryStore, account_id: &str, balance: Decimal) -> AccountId {
    let account_id: AccountId = account_id.parse().unwrap();
    store
        .create(NewAccount {
            account_id: account_id.clone(),
            username: format!("user-{account_id}"),
            email: format!("{account_id}@example.com"),
            password_hash: "x".to_owned(),
            balance: Balance::new(balance).unwrap(),
            date_joined: Utc::now(),
        })
        .await
        .unwrap();
    account_id
}

pub fn engine_on(store: InMemoryStore) -> TransferEngine {
    TransferEngine::new(Box::new(store))
}

pub fn services_on(store: InMemoryStore) -> (TransferEngine, AccountService) {
    (
        TransferEngine::new(Box::new(store.clone())),
        AccountService::new(Box::new(store), Balance::new(dec!(1000.00)).unwrap()),
    )
}
