//! Built-in per-vertical configuration.
//!
//! Each business type selects the product form fields the UI renders, a
//! theme, the default product categories, the optional UI components that
//! are switched on, and the ordered workflow chain the inventory routes run.

use crate::types::BusinessType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// UI description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Currency,
    Date,
    Select,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &str, label: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    pub fields: Vec<FieldSpec>,
    pub theme: Theme,
    pub categories: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

impl UiConfig {
    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Configuration bundle for one vertical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub ui: UiConfig,
    pub workflows: Vec<String>,
}

// ---------------------------------------------------------------------------
// Built-in registry
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn builtin(business_type: BusinessType) -> BusinessConfig {
    use FieldKind::*;
    match business_type {
        BusinessType::Pharmacy => BusinessConfig {
            ui: UiConfig {
                fields: vec![
                    FieldSpec::new("name", "Product name", Text, true),
                    FieldSpec::new("sku", "SKU", Text, true),
                    FieldSpec::new("price", "Price", Currency, true),
                    FieldSpec::new("dosage", "Dosage", Text, false),
                    FieldSpec::new("batch_number", "Batch number", Text, true),
                    FieldSpec::new("expiry_date", "Expiry date", Date, true),
                    FieldSpec::new("requires_prescription", "Prescription only", Toggle, false),
                    FieldSpec::new("controlled_substance", "Controlled substance", Toggle, false),
                ],
                theme: Theme {
                    primary: "#0f766e".to_string(),
                    accent: "#14b8a6".to_string(),
                },
                categories: strings(&[
                    "Prescription",
                    "OTC",
                    "Supplements",
                    "Personal Care",
                    "Medical Devices",
                ]),
                components: strings(&["prescription_queue", "batch_tracker", "expiry_board"]),
            },
            workflows: strings(&[
                "expiry_alerts",
                "deduct_stock_by_batch",
                "controlled_substance_logs",
                "prescription_validation",
            ]),
        },
        BusinessType::Restaurant => BusinessConfig {
            ui: UiConfig {
                fields: vec![
                    FieldSpec::new("name", "Dish name", Text, true),
                    FieldSpec::new("price", "Price", Currency, true),
                    FieldSpec::new("category", "Menu section", Select, true),
                    FieldSpec::new("prep_time", "Prep time (min)", Number, false),
                    FieldSpec::new("station", "Kitchen station", Select, false),
                    FieldSpec::new("allergens", "Allergens", Text, false),
                ],
                theme: Theme {
                    primary: "#b91c1c".to_string(),
                    accent: "#f97316".to_string(),
                },
                categories: strings(&["Appetizers", "Mains", "Sides", "Desserts", "Beverages"]),
                components: strings(&["kitchen_display", "table_map", "course_tracker"]),
            },
            workflows: strings(&["recipe_deduction", "kitchen_ticket_routing", "waste_tracking"]),
        },
        BusinessType::Rental => BusinessConfig {
            ui: UiConfig {
                fields: vec![
                    FieldSpec::new("name", "Item name", Text, true),
                    FieldSpec::new("sku", "Asset tag", Text, true),
                    FieldSpec::new("daily_rate", "Daily rate", Currency, true),
                    FieldSpec::new("deposit", "Deposit", Currency, true),
                    FieldSpec::new("serial_number", "Serial number", Text, false),
                    FieldSpec::new("condition", "Condition", Select, false),
                ],
                theme: Theme {
                    primary: "#1d4ed8".to_string(),
                    accent: "#60a5fa".to_string(),
                },
                categories: strings(&["Equipment", "Vehicles", "Tools", "Party Supplies"]),
                components: strings(&["rental_calendar", "deposit_ledger"]),
            },
            workflows: strings(&["availability_check", "deposit_hold", "return_inspection"]),
        },
        BusinessType::Retail => BusinessConfig {
            ui: UiConfig {
                fields: vec![
                    FieldSpec::new("name", "Product name", Text, true),
                    FieldSpec::new("sku", "SKU", Text, true),
                    FieldSpec::new("barcode", "Barcode", Text, false),
                    FieldSpec::new("price", "Price", Currency, true),
                    FieldSpec::new("stock", "Stock", Number, true),
                    FieldSpec::new("size", "Size", Select, false),
                    FieldSpec::new("color", "Color", Text, false),
                ],
                theme: Theme {
                    primary: "#7c3aed".to_string(),
                    accent: "#a78bfa".to_string(),
                },
                categories: strings(&["Apparel", "Electronics", "Home", "Accessories"]),
                components: strings(&["barcode_scanner", "loyalty_panel"]),
            },
            workflows: strings(&["barcode_lookup", "deduct_stock", "low_stock_alerts"]),
        },
    }
}

/// Every built-in vertical keyed by business type.
pub fn builtin_all() -> BTreeMap<BusinessType, BusinessConfig> {
    BusinessType::all()
        .iter()
        .map(|&bt| (bt, builtin(bt)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
