//! # Hold Store
//!
//! Suspended orders parked by a cashier. Parking happens in
//! [`OrderEngine::hold`]; this module lists, reads back and discards them.
//!
//! ```text
//!   hold(cart) ──► Suspended ──┬── resume_hold ──► cart back on the register
//!   (stock reserved)           │                   (read only)
//!                              │
//!                              ├── checkout(resume_from) ──► row deleted,
//!                              │                             new order
//!                              └── discard_hold ──► row deleted,
//!                                                   stock stays reserved
//! ```

use kasir_core::{CoreError, DomainEvent, HeldItem, HoldSummary, ResumedHold, HOLD_LIST_LIMIT};
use tracing::{info, warn};

use crate::checkout::OrderEngine;
use crate::error::EngineResult;

impl OrderEngine {
    /// The cashier's holds, newest first, at most [`HOLD_LIST_LIMIT`].
    pub async fn list_holds(&self, cashier_id: &str) -> EngineResult<Vec<HoldSummary>> {
        Ok(self.db.orders().list_holds(cashier_id, HOLD_LIST_LIMIT).await?)
    }

    /// Reads a hold back as the cart it was parked with.
    ///
    /// Prices are those recorded at hold time. The hold itself is left in
    /// place until a checkout names it in `resume_from`.
    ///
    /// ## Errors
    /// * `NotFound` - no suspended order with this id for this cashier
    pub async fn resume_hold(&self, order_id: &str, cashier_id: &str) -> EngineResult<ResumedHold> {
        let hold = self
            .db
            .orders()
            .find_hold(order_id, cashier_id)
            .await?
            .ok_or_else(|| CoreError::HoldNotFound(order_id.to_string()))?;

        let items = self
            .db
            .orders()
            .get_lines(&hold.id)
            .await?
            .into_iter()
            .map(|line| HeldItem {
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();

        Ok(ResumedHold {
            order_id: hold.id,
            note: hold.note,
            items,
        })
    }

    /// Deletes a hold and its lines.
    ///
    /// The reserved stock is not put back.
    ///
    /// ## Errors
    /// * `NotFound` - no suspended order with this id for this cashier
    pub async fn discard_hold(&self, order_id: &str, cashier_id: &str) -> EngineResult<()> {
        if !self.db.orders().delete_hold(order_id, cashier_id).await? {
            warn!(order_id = %order_id, cashier_id = %cashier_id, "Discard of missing hold");
            return Err(CoreError::HoldNotFound(order_id.to_string()).into());
        }

        info!(order_id = %order_id, "Hold discarded");
        self.events.emit(&DomainEvent::HoldDiscarded {
            order_id: order_id.to_string(),
            user_id: cashier_id.to_string(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kasir_core::{CartLine, OrderStatus, StoreSettings};

    use crate::checkout::{CheckoutRequest, HoldRequest, Tender};
    use crate::error::{EngineError, ErrorKind};
    use crate::test_support::*;

    fn hold_of(items: Vec<CartLine>, note: Option<&str>) -> HoldRequest {
        HoldRequest {
            items,
            note: note.map(str::to_string),
            resume_from: None,
        }
    }

    #[tokio::test]
    async fn test_hold_round_trip_reserves_once() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let a = product(&db, "A", 4_000, 10).await;
        let b = product(&db, "B", 2_500, 10).await;
        let (engine, _) = engine(&db, FakeGateway::ok());
        let settings = StoreSettings::default();

        let held = engine
            .hold(
                &settings,
                &cashier,
                hold_of(vec![CartLine::new(&a.id, 3), CartLine::new(&b.id, 1)], Some(" meja 4 ")),
            )
            .await
            .unwrap();
        assert_eq!(held.status, OrderStatus::Suspended);
        assert_eq!(held.total, 14_500);
        assert_eq!(stock(&db, &a.id).await, 7);
        assert_eq!(stock(&db, &b.id).await, 9);

        let resumed = engine.resume_hold(&held.order_id, &cashier).await.unwrap();
        assert_eq!(resumed.note.as_deref(), Some("meja 4"));
        let mut items: Vec<_> = resumed
            .items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity, i.price))
            .collect();
        items.sort();
        let mut expected = vec![(a.id.clone(), 3, 4_000), (b.id.clone(), 1, 2_500)];
        expected.sort();
        assert_eq!(items, expected);

        // Checking out the same cart takes nothing more from stock.
        let receipt = engine
            .checkout(
                &settings,
                &cashier,
                CheckoutRequest {
                    items: resumed
                        .items
                        .iter()
                        .map(|i| CartLine::new(&i.product_id, i.quantity))
                        .collect(),
                    tender: Tender::Cash { tendered: 20_000 },
                    note: resumed.note.clone(),
                    resume_from: Some(held.order_id.clone()),
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.status, OrderStatus::Paid);
        assert_eq!(receipt.change_amount, 5_500);
        assert_eq!(stock(&db, &a.id).await, 7);
        assert_eq!(stock(&db, &b.id).await, 9);
        assert!(engine.list_holds(&cashier).await.unwrap().is_empty());

        let detail = engine.get_order(&receipt.order_id).await.unwrap();
        assert_eq!(detail.order.suspended_from_id.as_deref(), Some(held.order_id.as_str()));
    }

    #[tokio::test]
    async fn test_resume_reserves_only_the_difference() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let a = product(&db, "A", 1_000, 5).await;
        let b = product(&db, "B", 1_000, 5).await;
        let c = product(&db, "C", 1_000, 5).await;
        let (engine, _) = engine(&db, FakeGateway::ok());
        let settings = StoreSettings::default();

        let held = engine
            .hold(
                &settings,
                &cashier,
                hold_of(vec![CartLine::new(&a.id, 2), CartLine::new(&b.id, 4)], None),
            )
            .await
            .unwrap();
        assert_eq!(stock(&db, &a.id).await, 3);
        assert_eq!(stock(&db, &b.id).await, 1);

        // A grows by 5 (more than the 3 on the shelf alone), B drops out, C is new.
        engine
            .checkout(
                &settings,
                &cashier,
                CheckoutRequest {
                    items: vec![CartLine::new(&a.id, 5), CartLine::new(&c.id, 1)],
                    tender: Tender::Cash { tendered: 6_000 },
                    note: None,
                    resume_from: Some(held.order_id.clone()),
                },
            )
            .await
            .unwrap();

        assert_eq!(stock(&db, &a.id).await, 0);
        assert_eq!(stock(&db, &b.id).await, 5);
        assert_eq!(stock(&db, &c.id).await, 4);
    }

    #[tokio::test]
    async fn test_hold_resumes_into_one_order_only() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let a = product(&db, "A", 1_000, 5).await;
        let (engine, _) = engine(&db, FakeGateway::ok());
        let settings = StoreSettings::default();

        let held = engine
            .hold(&settings, &cashier, hold_of(vec![CartLine::new(&a.id, 2)], None))
            .await
            .unwrap();

        let resume = |tendered| CheckoutRequest {
            items: vec![CartLine::new(&a.id, 2)],
            tender: Tender::Cash { tendered },
            note: None,
            resume_from: Some(held.order_id.clone()),
        };

        engine.checkout(&settings, &cashier, resume(2_000)).await.unwrap();
        let err = engine.checkout(&settings, &cashier, resume(2_000)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(stock(&db, &a.id).await, 3);
    }

    #[tokio::test]
    async fn test_holds_are_private_to_their_cashier() {
        let db = database().await;
        let sari = cashier(&db).await;
        let budi = cashier(&db).await;
        let a = product(&db, "A", 1_000, 5).await;
        let (engine, _) = engine(&db, FakeGateway::ok());

        let held = engine
            .hold(&StoreSettings::default(), &sari, hold_of(vec![CartLine::new(&a.id, 1)], None))
            .await
            .unwrap();

        assert!(engine.list_holds(&budi).await.unwrap().is_empty());
        assert!(matches!(
            engine.resume_hold(&held.order_id, &budi).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(engine.discard_hold(&held.order_id, &budi).await.is_err());
        assert_eq!(engine.list_holds(&sari).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_holds_newest_first() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let a = product(&db, "A", 1_000, 50).await;
        let (engine, _) = engine(&db, FakeGateway::ok());
        let settings = StoreSettings::default();

        let mut ids = Vec::new();
        for qty in 1..=3 {
            let held = engine
                .hold(&settings, &cashier, hold_of(vec![CartLine::new(&a.id, qty)], None))
                .await
                .unwrap();
            ids.push(held.order_id);
        }

        let holds = engine.list_holds(&cashier).await.unwrap();
        let listed: Vec<_> = holds.iter().map(|h| h.order_id.clone()).collect();
        ids.reverse();
        assert_eq!(listed, ids);
        assert_eq!(holds[0].total, 3_000);
    }

    #[tokio::test]
    async fn test_discard_keeps_stock_reserved() {
        let db = database().await;
        let cashier = cashier(&db).await;
        let a = product(&db, "A", 1_000, 5).await;
        let gateway = FakeGateway::ok();
        let (engine, sink) = engine(&db, gateway);
        let engine = Arc::new(engine);

        let held = engine
            .hold(&StoreSettings::default(), &cashier, hold_of(vec![CartLine::new(&a.id, 2)], None))
            .await
            .unwrap();

        engine.discard_hold(&held.order_id, &cashier).await.unwrap();

        assert_eq!(stock(&db, &a.id).await, 3);
        assert!(engine.get_order(&held.order_id).await.is_err());
        assert!(db.orders().get_lines(&held.order_id).await.unwrap().is_empty());
        assert_eq!(sink.names().last(), Some(&"hold_discarded"));

        let again = engine.discard_hold(&held.order_id, &cashier).await.unwrap_err();
        assert_eq!(again.kind(), ErrorKind::NotFound);
    }
}
