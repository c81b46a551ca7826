//! # Appointment lifecycle rules
//!
//! Pure decision logic for moving a work order along its status edges:
//!
//! ```text
//! pending ──▶ in-progress ──▶ completed
//!    │             │
//!    └─────────────┴──────▶ canceled
//! ```
//!
//! [`plan_transition`] validates a request against the service's current
//! status and returns the full set of effects to persist. It never touches
//! the store; the caller re-reads state, plans, and commits the plan as one
//! unit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{RepairError, RepairResult};
use crate::models::appointment::check_amount;
use crate::models::service::ServiceStatus;
use crate::models::technician::TechnicianStatus;

/// What a technician asks for when updating a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target: ServiceStatus,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    /// Set by callers that may retry after a store failure.
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}

impl TransitionRequest {
    pub fn start() -> Self {
        Self::to(ServiceStatus::InProgress)
    }

    pub fn complete(price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::to(ServiceStatus::Completed)
        }
    }

    pub fn cancel() -> Self {
        Self::to(ServiceStatus::Canceled)
    }

    pub fn to(target: ServiceStatus) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_key(mut self, key: Uuid) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// The effects of one legal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub from: ServiceStatus,
    pub to: ServiceStatus,
    /// Final billed amount, only when completing.
    pub price: Option<Decimal>,
    pub technician_note: Option<String>,
    /// `None` means the technician's availability is left alone.
    pub technician_status: Option<TechnicianStatus>,
    /// Note text for the `zero_price_note` notification, when one is due.
    pub zero_price_note: Option<String>,
}

/// Validates `request` and then the edge `current → request.target`.
///
/// Input problems (missing price, missing note on a free job, bad target)
/// are reported as `Validation` before the edge is checked, the same order
/// a form request is validated before the controller runs.
pub fn plan_transition(
    current: ServiceStatus,
    request: &TransitionRequest,
) -> RepairResult<TransitionPlan> {
    let target = request.target;
    if target == ServiceStatus::Pending {
        return Err(RepairError::Validation(
            "status must be one of in-progress, completed, canceled".to_string(),
        ));
    }

    let note = request
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string);

    let price = if target == ServiceStatus::Completed {
        let price = request.price.ok_or_else(|| {
            RepairError::Validation("price is required to complete a service".to_string())
        })?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(RepairError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        check_amount("price", price)?;
        if price.is_zero() && note.is_none() {
            return Err(RepairError::Validation(
                "a note is required when completing a service with a price of 0".to_string(),
            ));
        }
        Some(price)
    } else {
        None
    };

    if !current.can_transition_to(target) {
        return Err(RepairError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    let technician_status = match target {
        ServiceStatus::InProgress => Some(TechnicianStatus::Unavailable),
        ServiceStatus::Completed => Some(TechnicianStatus::Available),
        // Cancelling never touches availability, even mid-progress.
        ServiceStatus::Canceled | ServiceStatus::Pending => None,
    };

    let zero_price_note = match price {
        Some(price) if price.is_zero() => note.clone(),
        _ => None,
    };

    Ok(TransitionPlan {
        from: current,
        to: target,
        price,
        technician_note: note,
        technician_status,
        zero_price_note,
    })
}
