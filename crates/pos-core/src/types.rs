use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PosError;

// ---------------------------------------------------------------------------
// BusinessType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Pharmacy,
    Restaurant,
    Rental,
    Retail,
}

impl BusinessType {
    pub fn all() -> &'static [BusinessType] {
        &[
            BusinessType::Pharmacy,
            BusinessType::Restaurant,
            BusinessType::Rental,
            BusinessType::Retail,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Pharmacy => "pharmacy",
            BusinessType::Restaurant => "restaurant",
            BusinessType::Rental => "rental",
            BusinessType::Retail => "retail",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusinessType {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharmacy" => Ok(BusinessType::Pharmacy),
            "restaurant" => Ok(BusinessType::Restaurant),
            "rental" => Ok(BusinessType::Rental),
            "retail" => Ok(BusinessType::Retail),
            _ => Err(PosError::InvalidBusinessType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    Kitchen,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::Cashier, Role::Kitchen]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Kitchen => "kitchen",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "cashier" => Ok(Role::Cashier),
            "kitchen" => Ok(Role::Kitchen),
            _ => Err(PosError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a single kitchen line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Ordered,
    Assigned,
    BeingPrepared,
    Ready,
    PickedUp,
    Served,
    Completed,
    Cancelled,
}

impl ItemStatus {
    pub fn all() -> &'static [ItemStatus] {
        &[
            ItemStatus::Ordered,
            ItemStatus::Assigned,
            ItemStatus::BeingPrepared,
            ItemStatus::Ready,
            ItemStatus::PickedUp,
            ItemStatus::Served,
            ItemStatus::Completed,
            ItemStatus::Cancelled,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Ordered => "ordered",
            ItemStatus::Assigned => "assigned",
            ItemStatus::BeingPrepared => "being_prepared",
            ItemStatus::Ready => "ready",
            ItemStatus::PickedUp => "picked_up",
            ItemStatus::Served => "served",
            ItemStatus::Completed => "completed",
            ItemStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn allowed_targets(self) -> &'static [ItemStatus] {
        use ItemStatus::*;
        match self {
            Ordered => &[Assigned, BeingPrepared, Cancelled],
            Assigned => &[BeingPrepared, Cancelled],
            BeingPrepared => &[Ready, Cancelled],
            Ready => &[PickedUp, Served, Cancelled],
            PickedUp => &[Served, Completed],
            Served => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: ItemStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Cancelled)
    }

    /// Assigned to a cook or on the line.
    pub fn is_in_progress(self) -> bool {
        matches!(self, ItemStatus::Assigned | ItemStatus::BeingPrepared)
    }

    /// At or past `ready`, excluding cancellation.
    pub fn is_ready_or_later(self) -> bool {
        matches!(
            self,
            ItemStatus::Ready | ItemStatus::PickedUp | ItemStatus::Served | ItemStatus::Completed
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordered" => Ok(ItemStatus::Ordered),
            "assigned" => Ok(ItemStatus::Assigned),
            "being_prepared" | "being-prepared" => Ok(ItemStatus::BeingPrepared),
            "ready" => Ok(ItemStatus::Ready),
            "picked_up" | "picked-up" => Ok(ItemStatus::PickedUp),
            "served" => Ok(ItemStatus::Served),
            "completed" => Ok(ItemStatus::Completed),
            "cancelled" => Ok(ItemStatus::Cancelled),
            _ => Err(PosError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Active,
    BeingPrepared,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::BeingPrepared => "being_prepared",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Active, BeingPrepared)
                | (Active, Completed)
                | (Active, Cancelled)
                | (BeingPrepared, Completed)
                | (BeingPrepared, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeout,
    Delivery,
    DriveThru,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::DineIn => "dine_in",
            OrderType::Takeout => "takeout",
            OrderType::Delivery => "delivery",
            OrderType::DriveThru => "drive_thru",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderType {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine_in" | "dine-in" => Ok(OrderType::DineIn),
            "takeout" => Ok(OrderType::Takeout),
            "delivery" => Ok(OrderType::Delivery),
            "drive_thru" | "drive-thru" => Ok(OrderType::DriveThru),
            _ => Err(PosError::InvalidOrderType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
