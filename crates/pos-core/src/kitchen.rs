//! Kitchen order board.
//!
//! A `KitchenBoard` owns every order ticket and is the only thing that
//! changes order or item status. Item moves follow
//! [`ItemStatus::allowed_targets`]; after each move the order status is
//! re-derived from its items. Mutations return the changed order together
//! with the [`KitchenEvent`]s describing what happened, so callers can push
//! them to terminals.
//!
//! The board persists as pretty JSON written atomically. Closed orders are
//! kept for a retention window and then pruned.

use crate::error::{PosError, Result};
use crate::io::atomic_write;
use crate::types::{ItemStatus, OrderStatus, OrderType};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Largest urgency threshold accepted, either direction, in minutes.
pub const MAX_URGENT_MINUTES: i64 = 7 * 24 * 60;

/// Parse an urgency threshold, rejecting values outside
/// `-MAX_URGENT_MINUTES..=MAX_URGENT_MINUTES`.
pub fn urgent_threshold(minutes: i64) -> Result<Duration> {
    if !(-MAX_URGENT_MINUTES..=MAX_URGENT_MINUTES).contains(&minutes) {
        return Err(PosError::Validation(format!(
            "minutes must be within {MAX_URGENT_MINUTES} either way (got {minutes})"
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| PosError::Validation(format!("minutes {minutes} is out of range")))
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub status: ItemStatus,
    /// Expected preparation time in minutes.
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_cook: Option<String>,
    #[serde(default)]
    pub assigned_station: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ready_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub picked_up_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub served_time: Option<DateTime<Utc>>,
}

impl Item {
    /// Record the first arrival at a timed status. Later arrivals keep the
    /// original stamp.
    fn stamp(&mut self, now: DateTime<Utc>) {
        let slot = match self.status {
            ItemStatus::BeingPrepared => &mut self.start_time,
            ItemStatus::Ready => &mut self.ready_time,
            ItemStatus::PickedUp => &mut self.picked_up_time,
            ItemStatus::Served => &mut self.served_time,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(now);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub current: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    pub items: Vec<Item>,
    pub order_time: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub drive_thru_lane: Option<u32>,
    #[serde(default)]
    pub course_progress: Option<CourseProgress>,
}

impl Order {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    fn ensure_open(&self, to: &str) -> Result<()> {
        if self.status.is_terminal() {
            return Err(PosError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
                reason: format!("order {} is closed", self.id),
            });
        }
        Ok(())
    }

    fn item_index(&self, item_id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| PosError::ItemNotFound(item_id.to_string()))
    }

    /// Move one item along the transition table and stamp it.
    fn move_item(
        &mut self,
        idx: usize,
        to: ItemStatus,
        now: DateTime<Utc>,
        events: &mut Vec<KitchenEvent>,
    ) -> Result<()> {
        let item = &mut self.items[idx];
        let from = item.status;
        if !from.can_transition_to(to) {
            return Err(PosError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
                reason: format!("item {} cannot move from {from} to {to}", item.name),
            });
        }
        item.status = to;
        item.stamp(now);
        self.record_item_change(idx, from, events);
        Ok(())
    }

    fn record_item_change(&self, idx: usize, from: ItemStatus, events: &mut Vec<KitchenEvent>) {
        let item = &self.items[idx];
        events.push(KitchenEvent::ItemStatusChanged {
            order_id: self.id.clone(),
            item_id: item.id.clone(),
            from,
            to: item.status,
        });
        if item.status == ItemStatus::Ready {
            events.push(KitchenEvent::ItemReady {
                order_id: self.id.clone(),
                item_id: item.id.clone(),
                name: item.name.clone(),
                table_number: self.table_number.clone(),
            });
        }
    }

    /// Re-derive the order status from its items.
    fn settle(&mut self, events: &mut Vec<KitchenEvent>) {
        if self.status.is_terminal() {
            return;
        }
        let all_cancelled = self.items.iter().all(|i| i.status == ItemStatus::Cancelled);
        let all_terminal = self.items.iter().all(|i| i.status.is_terminal());
        let any_completed = self.items.iter().any(|i| i.status == ItemStatus::Completed);
        let any_started = self.items.iter().any(|i| {
            i.status == ItemStatus::BeingPrepared || i.status.is_ready_or_later()
        });

        if all_cancelled {
            self.status = OrderStatus::Cancelled;
            events.push(KitchenEvent::OrderCancelled {
                order_id: self.id.clone(),
            });
        } else if all_terminal && any_completed {
            self.status = OrderStatus::Completed;
            events.push(KitchenEvent::OrderCompleted {
                order_id: self.id.clone(),
            });
        } else if any_started && self.status == OrderStatus::Active {
            self.status = OrderStatus::BeingPrepared;
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    pub items: Vec<NewItem>,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub drive_thru_lane: Option<u32>,
    /// Number of courses; omitted for single-course orders.
    #[serde(default)]
    pub courses: Option<u32>,
}

impl NewOrder {
    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(PosError::Validation("order has no items".to_string()));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(PosError::Validation("item name must not be empty".to_string()));
            }
            if item.quantity == 0 {
                return Err(PosError::Validation(format!(
                    "item '{}' has zero quantity",
                    item.name
                )));
            }
        }
        match (self.order_type, self.drive_thru_lane) {
            (OrderType::DriveThru, None) => Err(PosError::Validation(
                "drive_thru orders need a drive_thru_lane".to_string(),
            )),
            (t, Some(_)) if t != OrderType::DriveThru => Err(PosError::Validation(format!(
                "drive_thru_lane is only valid for drive_thru orders, not {t}"
            ))),
            _ => match self.courses {
                Some(0) => Err(PosError::Validation("courses must be at least 1".to_string())),
                _ => Ok(()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something terminals should hear about. Serializes as `{type, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum KitchenEvent {
    OrderCreated(Order),
    ItemStatusChanged {
        order_id: String,
        item_id: String,
        from: ItemStatus,
        to: ItemStatus,
    },
    ItemReady {
        order_id: String,
        item_id: String,
        name: String,
        table_number: Option<String>,
    },
    ItemAssigned {
        order_id: String,
        item_id: String,
        cook: String,
        station: Option<String>,
    },
    CourseAdvanced {
        order_id: String,
        current: u32,
        total: u32,
    },
    OrderCompleted {
        order_id: String,
    },
    OrderCancelled {
        order_id: String,
    },
}

impl KitchenEvent {
    pub fn name(&self) -> &'static str {
        match self {
            KitchenEvent::OrderCreated(_) => "order_created",
            KitchenEvent::ItemStatusChanged { .. } => "item_status_changed",
            KitchenEvent::ItemReady { .. } => "item_ready",
            KitchenEvent::ItemAssigned { .. } => "item_assigned",
            KitchenEvent::CourseAdvanced { .. } => "course_advanced",
            KitchenEvent::OrderCompleted { .. } => "order_completed",
            KitchenEvent::OrderCancelled { .. } => "order_cancelled",
        }
    }
}

/// Result of a board mutation: the order as it now stands plus what changed.
#[derive(Debug, Clone, Serialize)]
pub struct Mutation {
    pub order: Order,
    pub events: Vec<KitchenEvent>,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub order_id: String,
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
    pub table_number: Option<String>,
    pub order_time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// KitchenBoard
// ---------------------------------------------------------------------------

/// What a single mutation can touch: orders appended past `len`, and the
/// one order it targets.
#[derive(Debug)]
pub struct Checkpoint {
    len: usize,
    order: Option<Order>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KitchenBoard {
    #[serde(default)]
    orders: Vec<Order>,
}

impl KitchenBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted board; a missing file is an empty board.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = std::fs::read(path)?;
        let board: KitchenBoard = serde_json::from_slice(&data)?;
        debug!(orders = board.orders.len(), path = %path.display(), "kitchen board loaded");
        Ok(board)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write(path, &self.to_json()?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Remember enough to undo one mutation of `order_id` (or an append).
    pub fn checkpoint(&self, order_id: Option<&str>) -> Checkpoint {
        Checkpoint {
            len: self.orders.len(),
            order: order_id.and_then(|id| self.orders.iter().find(|o| o.id == id).cloned()),
        }
    }

    /// Undo everything done since `checkpoint` was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.orders.truncate(checkpoint.len);
        if let Some(order) = checkpoint.order {
            if let Some(slot) = self.orders.iter_mut().find(|o| o.id == order.id) {
                *slot = order;
            }
        }
    }

    /// Drop completed and cancelled orders placed before `cutoff`.
    /// Returns how many were removed.
    pub fn prune_closed(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.orders.len();
        self.orders.retain(|o| o.is_open() || o.order_time >= cutoff);
        let pruned = before - self.orders.len();
        if pruned > 0 {
            debug!(pruned, "closed kitchen orders pruned");
        }
        pruned
    }

    /// All orders, oldest first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_open())
    }

    pub fn get_order(&self, order_id: &str) -> Result<&Order> {
        self.orders
            .iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PosError::OrderNotFound(order_id.to_string()))
    }

    fn order_mut(&mut self, order_id: &str) -> Result<&mut Order> {
        self.orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PosError::OrderNotFound(order_id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn add_order(&mut self, new: NewOrder, now: DateTime<Utc>) -> Result<Mutation> {
        new.validate()?;
        let items = new
            .items
            .into_iter()
            .map(|i| Item {
                id: crate::db::new_id(),
                name: i.name.trim().to_string(),
                quantity: i.quantity,
                status: ItemStatus::Ordered,
                prep_time: i.prep_time,
                notes: i.notes,
                assigned_cook: None,
                assigned_station: None,
                start_time: None,
                ready_time: None,
                picked_up_time: None,
                served_time: None,
            })
            .collect();
        let order = Order {
            id: crate::db::new_id(),
            table_number: new.table_number,
            server: new.server,
            items,
            order_time: now,
            status: OrderStatus::Active,
            order_type: new.order_type,
            drive_thru_lane: new.drive_thru_lane,
            course_progress: new.courses.map(|total| CourseProgress { current: 1, total }),
        };
        self.orders.push(order.clone());
        Ok(Mutation {
            events: vec![KitchenEvent::OrderCreated(order.clone())],
            order,
        })
    }

    pub fn update_item_status(
        &mut self,
        order_id: &str,
        item_id: &str,
        to: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<Mutation> {
        let order = self.order_mut(order_id)?;
        order.ensure_open(to.as_str())?;
        let idx = order.item_index(item_id)?;
        let mut events = Vec::new();
        order.move_item(idx, to, now, &mut events)?;
        order.settle(&mut events);
        Ok(Mutation {
            order: order.clone(),
            events,
        })
    }

    /// Assign an `ordered` item, or reassign an `assigned` one.
    pub fn assign_item_to_cook(
        &mut self,
        order_id: &str,
        item_id: &str,
        cook: &str,
        station: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Mutation> {
        let cook = cook.trim();
        if cook.is_empty() {
            return Err(PosError::Validation("cook must not be empty".to_string()));
        }
        let order = self.order_mut(order_id)?;
        order.ensure_open(ItemStatus::Assigned.as_str())?;
        let idx = order.item_index(item_id)?;
        let mut events = Vec::new();
        match order.items[idx].status {
            ItemStatus::Ordered => order.move_item(idx, ItemStatus::Assigned, now, &mut events)?,
            ItemStatus::Assigned => {}
            other => {
                return Err(PosError::InvalidTransition {
                    from: other.to_string(),
                    to: ItemStatus::Assigned.to_string(),
                    reason: "item is past assignment".to_string(),
                })
            }
        }
        let item = &mut order.items[idx];
        item.assigned_cook = Some(cook.to_string());
        if let Some(station) = station.map(str::trim).filter(|s| !s.is_empty()) {
            item.assigned_station = Some(station.to_string());
        }
        events.push(KitchenEvent::ItemAssigned {
            order_id: order.id.clone(),
            item_id: item.id.clone(),
            cook: cook.to_string(),
            station: item.assigned_station.clone(),
        });
        Ok(Mutation {
            order: order.clone(),
            events,
        })
    }

    pub fn start_preparing_item(
        &mut self,
        order_id: &str,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Mutation> {
        self.update_item_status(order_id, item_id, ItemStatus::BeingPrepared, now)
    }

    /// Move an `active` order to `being_prepared`. Already preparing is a no-op.
    pub fn mark_order_being_prepared(&mut self, order_id: &str) -> Result<Mutation> {
        let order = self.order_mut(order_id)?;
        order.ensure_open(OrderStatus::BeingPrepared.as_str())?;
        order.status = OrderStatus::BeingPrepared;
        Ok(Mutation {
            order: order.clone(),
            events: Vec::new(),
        })
    }

    /// Close the ticket. Every item that is not cancelled must be ready or
    /// later; those items are marked completed.
    pub fn mark_order_complete(&mut self, order_id: &str, now: DateTime<Utc>) -> Result<Mutation> {
        let order = self.order_mut(order_id)?;
        order.ensure_open(OrderStatus::Completed.as_str())?;
        if let Some(pending) = order
            .items
            .iter()
            .find(|i| i.status != ItemStatus::Cancelled && !i.status.is_ready_or_later())
        {
            return Err(PosError::InvalidTransition {
                from: pending.status.to_string(),
                to: ItemStatus::Completed.to_string(),
                reason: format!("item {} is not ready", pending.name),
            });
        }

        let mut events = Vec::new();
        for idx in 0..order.items.len() {
            let from = order.items[idx].status;
            if from == ItemStatus::Cancelled || from == ItemStatus::Completed {
                continue;
            }
            order.items[idx].status = ItemStatus::Completed;
            order.record_item_change(idx, from, &mut events);
        }
        order.status = OrderStatus::Completed;
        events.push(KitchenEvent::OrderCompleted {
            order_id: order.id.clone(),
        });
        debug!(order = %order.id, at = %now, "order completed");
        Ok(Mutation {
            order: order.clone(),
            events,
        })
    }

    /// Cancel the order and every item that can still be cancelled.
    pub fn cancel_order(&mut self, order_id: &str, now: DateTime<Utc>) -> Result<Mutation> {
        let order = self.order_mut(order_id)?;
        order.ensure_open(OrderStatus::Cancelled.as_str())?;
        let mut events = Vec::new();
        for idx in 0..order.items.len() {
            if order.items[idx].status.can_transition_to(ItemStatus::Cancelled) {
                order.move_item(idx, ItemStatus::Cancelled, now, &mut events)?;
            }
        }
        order.status = OrderStatus::Cancelled;
        events.push(KitchenEvent::OrderCancelled {
            order_id: order.id.clone(),
        });
        Ok(Mutation {
            order: order.clone(),
            events,
        })
    }

    pub fn advance_course(&mut self, order_id: &str) -> Result<Mutation> {
        let order = self.order_mut(order_id)?;
        order.ensure_open("next course")?;
        let progress = order
            .course_progress
            .as_mut()
            .ok_or_else(|| PosError::Validation(format!("order {order_id} has no courses")))?;
        if progress.current >= progress.total {
            return Err(PosError::Validation(format!(
                "order {order_id} is already on its final course"
            )));
        }
        progress.current += 1;
        let event = KitchenEvent::CourseAdvanced {
            order_id: order.id.clone(),
            current: progress.current,
            total: progress.total,
        };
        Ok(Mutation {
            order: order.clone(),
            events: vec![event],
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Open orders placed more than `threshold` before `now`, oldest first.
    pub fn urgent_orders(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<&Order> {
        let mut urgent: Vec<&Order> = self
            .open_orders()
            .filter(|o| now - o.order_time > threshold)
            .collect();
        urgent.sort_by_key(|o| o.order_time);
        urgent
    }

    /// Items assigned or on the line, per cook.
    pub fn cook_workload(&self) -> BTreeMap<String, usize> {
        self.workload(|i| i.assigned_cook.as_deref())
    }

    /// Items assigned or on the line, per station.
    pub fn station_workload(&self) -> BTreeMap<String, usize> {
        self.workload(|i| i.assigned_station.as_deref())
    }

    fn workload<F>(&self, key: F) -> BTreeMap<String, usize>
    where
        F: Fn(&Item) -> Option<&str>,
    {
        let mut counts = BTreeMap::new();
        for item in self.open_orders().flat_map(|o| o.items.iter()) {
            if !item.status.is_in_progress() {
                continue;
            }
            if let Some(k) = key(item) {
                *counts.entry(k.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Unassigned items, oldest order first, then by position in the order.
    pub fn next_to_assign(&self) -> Vec<QueueEntry> {
        let mut open: Vec<&Order> = self.open_orders().collect();
        open.sort_by_key(|o| o.order_time);
        open.into_iter()
            .flat_map(|o| {
                o.items
                    .iter()
                    .filter(|i| i.status == ItemStatus::Ordered)
                    .map(move |i| QueueEntry {
                        order_id: o.id.clone(),
                        item_id: i.id.clone(),
                        name: i.name.clone(),
                        quantity: i.quantity,
                        table_number: o.table_number.clone(),
                        order_time: o.order_time,
                    })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
