//! Order aggregate and its lifecycle rules
//!
//! An order is a cart of selected months with observed weather indicators.
//! Its status only ever moves forward:
//! draft -> submitted -> finished | rejected, with draft and submitted
//! orders also deletable. Terminal states never change again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Submitted,
    Finished,
    Rejected,
    Deleted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Submitted => "submitted",
            OrderStatus::Finished => "finished",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(OrderStatus::Draft),
            "submitted" => Some(OrderStatus::Submitted),
            "finished" => Some(OrderStatus::Finished),
            "rejected" => Some(OrderStatus::Rejected),
            "deleted" => Some(OrderStatus::Deleted),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Finished | OrderStatus::Rejected | OrderStatus::Deleted
        )
    }

    /// Indicator rows may only be created, edited or removed in these states
    pub fn allows_item_edits(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Submitted)
    }

    /// Whether the lifecycle permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Draft, OrderStatus::Submitted)
                | (OrderStatus::Submitted, OrderStatus::Finished)
                | (OrderStatus::Submitted, OrderStatus::Rejected)
                | (OrderStatus::Draft, OrderStatus::Deleted)
                | (OrderStatus::Submitted, OrderStatus::Deleted)
        )
    }

    /// Validate a transition, naming both states on failure
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state-machine move
#[derive(Debug, Error, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Orchard location an order reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Valley,
    Hillside,
    Riverside,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Valley => "valley",
            Location::Hillside => "hillside",
            Location::Riverside => "riverside",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "valley" => Some(Location::Valley),
            "hillside" => Some(Location::Hillside),
            "riverside" => Some(Location::Riverside),
            _ => None,
        }
    }
}

/// Role of the person responsible for the observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Person {
    Agronomist,
    Foreman,
    Surveyor,
}

impl Person {
    pub fn as_str(&self) -> &'static str {
        match self {
            Person::Agronomist => "agronomist",
            Person::Foreman => "foreman",
            Person::Surveyor => "surveyor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "agronomist" => Some(Person::Agronomist),
            "foreman" => Some(Person::Foreman),
            "surveyor" => Some(Person::Surveyor),
            _ => None,
        }
    }
}

/// Order aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i32,
    pub status: OrderStatus,
    pub created_by: Uuid,
    /// Moderator who actioned the submitted order; set once on finish/reject
    pub moderator: Option<Uuid>,
    pub location: Option<Location>,
    pub person: Option<Person>,
    /// Computed yield estimate; set exactly once when the order finishes
    pub result_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Observed weather for one month within an order; unique per (order, month)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub order_id: i32,
    pub month_id: i32,
    pub avg_temp: Decimal,
    pub sum_precipitation: Decimal,
    pub comment: Option<String>,
}
