//! # Shift Ledger
//!
//! Opens and closes a cashier's cash drawer and reconciles it against paid
//! orders. It only reads orders, never writes them.
//!
//! ```text
//!   start_shift ──► open shift ──────────────────────────► end_shift
//!   opening_cash        │ current_shift (X-report)          closing_cash
//!                       │ running totals, no close          totals over
//!                       ▼                                   [started_at, ended_at)
//!                 paid orders of this cashier,
//!                 split by payment method
//! ```

use std::sync::Arc;

use chrono::Utc;
use kasir_core::validation::{normalize_note, validate_amount};
use kasir_core::{CoreError, DomainEvent, EventSink, Shift, ShiftSummary};
use kasir_db::{new_id, Database, ShiftRepository};
use tracing::info;

use crate::error::{EngineError, EngineResult};

/// Cash drawer sessions.
#[derive(Clone)]
pub struct ShiftLedger {
    db: Database,
    events: Arc<dyn EventSink>,
}

impl ShiftLedger {
    pub fn new(db: Database, events: Arc<dyn EventSink>) -> Self {
        ShiftLedger { db, events }
    }

    /// Opens a shift.
    ///
    /// ## Errors
    /// * `Validation` - negative opening cash, note too long, unknown cashier
    /// * `Conflict` - `ShiftAlreadyOpen`
    pub async fn start_shift(
        &self,
        cashier_id: &str,
        opening_cash: i64,
        notes: Option<&str>,
    ) -> EngineResult<Shift> {
        validate_amount(opening_cash, "opening_cash")?;
        let notes = normalize_note(notes, "notes")?;

        let shift = Shift {
            id: new_id(),
            user_id: cashier_id.to_string(),
            opening_cash,
            closing_cash: None,
            notes,
            started_at: Utc::now(),
            ended_at: None,
        };

        self.db.shifts().open(&shift).await.map_err(|e| {
            if e.is_unique_on("shifts.user_id") {
                EngineError::from(CoreError::ShiftAlreadyOpen {
                    user_id: cashier_id.to_string(),
                })
            } else {
                EngineError::owned_by(cashier_id)(e)
            }
        })?;

        info!(shift_id = %shift.id, cashier_id = %cashier_id, opening_cash, "Shift opened");
        self.events.emit(&DomainEvent::ShiftOpened {
            shift_id: shift.id.clone(),
            user_id: shift.user_id.clone(),
            opening_cash,
        });

        Ok(shift)
    }

    /// Closes the open shift and reconciles the drawer.
    ///
    /// ## Errors
    /// * `Validation` - negative closing cash, note too long
    /// * `Conflict` - `NoOpenShift`
    pub async fn end_shift(
        &self,
        cashier_id: &str,
        closing_cash: i64,
        notes: Option<&str>,
    ) -> EngineResult<ShiftSummary> {
        validate_amount(closing_cash, "closing_cash")?;
        let notes = normalize_note(notes, "notes")?;

        let ended_at = Utc::now();
        let mut tx = self.db.begin().await?;

        let shift = ShiftRepository::close(&mut tx, cashier_id, closing_cash, notes.as_deref(), ended_at)
            .await?
            .ok_or_else(|| CoreError::NoOpenShift {
                user_id: cashier_id.to_string(),
            })?;
        let totals = ShiftRepository::totals_in(&mut tx, cashier_id, shift.started_at, ended_at).await?;

        tx.commit().await?;

        let summary = ShiftSummary::compute(shift, totals);
        let variance = summary.variance.unwrap_or_default();

        info!(
            shift_id = %summary.shift.id,
            cashier_id = %cashier_id,
            expected_cash = summary.expected_cash,
            variance,
            "Shift closed"
        );
        self.events.emit(&DomainEvent::ShiftClosed {
            shift_id: summary.shift.id.clone(),
            user_id: summary.shift.user_id.clone(),
            expected_cash: summary.expected_cash,
            variance,
        });

        Ok(summary)
    }

    /// The open shift with running totals, without closing it.
    pub async fn current_shift(&self, cashier_id: &str) -> EngineResult<ShiftSummary> {
        let shift = self
            .db
            .shifts()
            .find_open(cashier_id)
            .await?
            .ok_or_else(|| CoreError::NoOpenShift {
                user_id: cashier_id.to_string(),
            })?;

        let totals = self
            .db
            .shifts()
            .totals(cashier_id, shift.started_at, Utc::now())
            .await?;

        Ok(ShiftSummary::compute(shift, totals))
    }
}
