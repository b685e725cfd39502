//! Paper execution gateway: acknowledges every order locally without
//! touching an exchange. The recorded order log doubles as an audit trail
//! in tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use common::{OrderGateway, OrderSide, Result};

/// One simulated fill.
#[derive(Debug, Clone)]
pub struct PaperOrder {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct PaperGateway {
    orders: RwLock<Vec<PaperOrder>>,
    leverages: RwLock<Vec<(String, u32)>>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders(&self) -> Vec<PaperOrder> {
        self.orders.read().await.clone()
    }

    pub async fn last_leverage(&self, symbol: &str) -> Option<u32> {
        self.leverages
            .read()
            .await
            .iter()
            .rev()
            .find(|(s, _)| s == symbol)
            .map(|(_, l)| *l)
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        info!(%symbol, leverage, "paper leverage set");
        self.leverages
            .write()
            .await
            .push((symbol.to_string(), leverage));
        Ok(())
    }

    async fn market_order(&self, symbol: &str, side: OrderSide, amount: f64) -> Result<String> {
        let order = PaperOrder {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            side,
            amount,
            placed_at: Utc::now(),
        };
        info!(%symbol, %side, amount, id = %order.id, "paper order filled");
        let id = order.id.clone();
        self.orders.write().await.push(order);
        Ok(id)
    }
}
