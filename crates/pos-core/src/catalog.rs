//! Products and customers.

use crate::db::{new_id, now_rfc3339, parse_text};
use crate::error::{PosError, Result};
use crate::paths;
use crate::types::BusinessType;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str = "id, sku, name, category, price_cents, stock, reorder_level, \
                               business_type, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub reorder_level: i64,
    pub business_type: BusinessType,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= self.reorder_level.max(threshold)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub reorder_level: i64,
    #[serde(default)]
    pub business_type: Option<BusinessType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let business_type: String = row.get(7)?;
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        price_cents: row.get(4)?,
        stock: row.get(5)?,
        reorder_level: row.get(6)?,
        business_type: parse_text(7, &business_type)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PosError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(PosError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Create a product. `fallback_type` applies when the payload names none.
pub fn create_product(
    conn: &Connection,
    new: &NewProduct,
    fallback_type: BusinessType,
) -> Result<Product> {
    paths::validate_sku(&new.sku)?;
    require_name(&new.name)?;
    require_non_negative("price_cents", new.price_cents)?;
    require_non_negative("stock", new.stock)?;
    require_non_negative("reorder_level", new.reorder_level)?;

    let taken: Option<String> = conn
        .query_row("SELECT id FROM products WHERE sku = ?1", params![new.sku], |r| r.get(0))
        .optional()?;
    if taken.is_some() {
        return Err(PosError::ProductExists(new.sku.clone()));
    }

    let now = now_rfc3339();
    let product = Product {
        id: new_id(),
        sku: new.sku.clone(),
        name: new.name.trim().to_string(),
        category: new.category.clone(),
        price_cents: new.price_cents,
        stock: new.stock,
        reorder_level: new.reorder_level,
        business_type: new.business_type.unwrap_or(fallback_type),
        created_at: now.clone(),
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO products (id, sku, name, category, price_cents, stock, reorder_level, business_type, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            product.id,
            product.sku,
            product.name,
            product.category,
            product.price_cents,
            product.stock,
            product.reorder_level,
            product.business_type.as_str(),
            product.created_at,
            product.updated_at,
        ],
    )?;
    Ok(product)
}

pub fn list_products(conn: &Connection, business_type: Option<BusinessType>) -> Result<Vec<Product>> {
    let products = match business_type {
        Some(bt) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE business_type = ?1 ORDER BY name"
            ))?;
            let rows = stmt
                .query_map(params![bt.as_str()], product_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"))?;
            let rows = stmt
                .query_map([], product_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    Ok(products)
}

pub fn get_product(conn: &Connection, id: &str) -> Result<Product> {
    conn.query_row(
        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
        params![id],
        product_from_row,
    )
    .optional()?
    .ok_or_else(|| PosError::ProductNotFound(id.to_string()))
}

pub fn update_product(conn: &Connection, id: &str, update: &ProductUpdate) -> Result<Product> {
    let mut product = get_product(conn, id)?;
    if let Some(name) = &update.name {
        require_name(name)?;
        product.name = name.trim().to_string();
    }
    if let Some(category) = &update.category {
        product.category = Some(category.clone()).filter(|c| !c.trim().is_empty());
    }
    if let Some(price) = update.price_cents {
        require_non_negative("price_cents", price)?;
        product.price_cents = price;
    }
    if let Some(level) = update.reorder_level {
        require_non_negative("reorder_level", level)?;
        product.reorder_level = level;
    }
    product.updated_at = now_rfc3339();

    conn.execute(
        "UPDATE products SET name = ?1, category = ?2, price_cents = ?3, reorder_level = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            product.name,
            product.category,
            product.price_cents,
            product.reorder_level,
            product.updated_at,
            product.id,
        ],
    )?;
    Ok(product)
}

pub fn delete_product(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PosError::ProductNotFound(id.to_string()));
    }
    Ok(())
}

pub fn count_products(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?)
}

/// Sum of `price_cents * stock` over all products.
pub fn inventory_value_cents(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(price_cents * stock), 0) FROM products",
        [],
        |r| r.get(0),
    )?)
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, loyalty_points, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loyalty_points: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub loyalty_points: Option<i64>,
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        loyalty_points: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn check_email(email: &Option<String>) -> Result<()> {
    if let Some(e) = email {
        if !e.is_empty() && !e.contains('@') {
            return Err(PosError::Validation(format!("invalid email '{e}'")));
        }
    }
    Ok(())
}

pub fn create_customer(conn: &Connection, new: &NewCustomer) -> Result<Customer> {
    require_name(&new.name)?;
    check_email(&new.email)?;
    let customer = Customer {
        id: new_id(),
        name: new.name.trim().to_string(),
        email: new.email.clone().filter(|e| !e.is_empty()),
        phone: new.phone.clone().filter(|p| !p.is_empty()),
        loyalty_points: 0,
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO customers (id, name, email, phone, loyalty_points, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            customer.id,
            customer.name,
            customer.email,
            customer.phone,
            customer.loyalty_points,
            customer.created_at,
        ],
    )?;
    Ok(customer)
}

/// List customers, optionally filtered by a case-insensitive substring of
/// name, email or phone.
pub fn list_customers(conn: &Connection, search: Option<&str>) -> Result<Vec<Customer>> {
    let pattern = format!("%{}%", search.unwrap_or("").trim().to_lowercase());
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers
         WHERE lower(name) LIKE ?1 OR lower(COALESCE(email, '')) LIKE ?1 OR COALESCE(phone, '') LIKE ?1
         ORDER BY name"
    ))?;
    let customers = stmt
        .query_map(params![pattern], customer_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(customers)
}

pub fn get_customer(conn: &Connection, id: &str) -> Result<Customer> {
    conn.query_row(
        &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
        params![id],
        customer_from_row,
    )
    .optional()?
    .ok_or_else(|| PosError::CustomerNotFound(id.to_string()))
}

pub fn update_customer(conn: &Connection, id: &str, update: &CustomerUpdate) -> Result<Customer> {
    let mut customer = get_customer(conn, id)?;
    if let Some(name) = &update.name {
        require_name(name)?;
        customer.name = name.trim().to_string();
    }
    if update.email.is_some() {
        check_email(&update.email)?;
        customer.email = update.email.clone().filter(|e| !e.is_empty());
    }
    if update.phone.is_some() {
        customer.phone = update.phone.clone().filter(|p| !p.is_empty());
    }
    if let Some(points) = update.loyalty_points {
        require_non_negative("loyalty_points", points)?;
        customer.loyalty_points = points;
    }
    conn.execute(
        "UPDATE customers SET name = ?1, email = ?2, phone = ?3, loyalty_points = ?4 WHERE id = ?5",
        params![
            customer.name,
            customer.email,
            customer.phone,
            customer.loyalty_points,
            customer.id,
        ],
    )?;
    Ok(customer)
}

pub fn count_customers(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM customers", [], |r| r.get(0))?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn amoxicillin() -> NewProduct {
        NewProduct {
            sku: "AMOX-500".to_string(),
            name: "Amoxicillin 500mg".to_string(),
            category: Some("Prescription".to_string()),
            price_cents: 1250,
            stock: 40,
            reorder_level: 10,
            business_type: None,
        }
    }

    #[test]
    fn product_crud_roundtrip() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();

        let created = create_product(&conn, &amoxicillin(), BusinessType::Pharmacy).unwrap();
        assert_eq!(created.business_type, BusinessType::Pharmacy);
        assert_eq!(get_product(&conn, &created.id).unwrap(), created);

        let updated = update_product(
            &conn,
            &created.id,
            &ProductUpdate {
                price_cents: Some(1400),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.price_cents, 1400);
        assert_eq!(updated.name, created.name);
        assert_eq!(get_product(&conn, &created.id).unwrap().price_cents, 1400);

        delete_product(&conn, &created.id).unwrap();
        assert!(matches!(
            get_product(&conn, &created.id),
            Err(PosError::ProductNotFound(_))
        ));
    }

    #[test]
    fn duplicate_sku_rejected() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        create_product(&conn, &amoxicillin(), BusinessType::Pharmacy).unwrap();
        assert!(matches!(
            create_product(&conn, &amoxicillin(), BusinessType::Pharmacy),
            Err(PosError::ProductExists(_))
        ));
    }

    #[test]
    fn negative_price_rejected() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let mut p = amoxicillin();
        p.price_cents = -1;
        assert!(matches!(
            create_product(&conn, &p, BusinessType::Pharmacy),
            Err(PosError::Validation(_))
        ));
    }

    #[test]
    fn list_filters_by_business_type_and_values_stock() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        create_product(&conn, &amoxicillin(), BusinessType::Pharmacy).unwrap();
        let mut shirt = amoxicillin();
        shirt.sku = "TEE-M".to_string();
        shirt.name = "T-shirt".to_string();
        shirt.price_cents = 1000;
        shirt.stock = 3;
        shirt.business_type = Some(BusinessType::Retail);
        create_product(&conn, &shirt, BusinessType::Pharmacy).unwrap();

        assert_eq!(list_products(&conn, None).unwrap().len(), 2);
        let retail = list_products(&conn, Some(BusinessType::Retail)).unwrap();
        assert_eq!(retail.len(), 1);
        assert_eq!(retail[0].sku, "TEE-M");
        assert_eq!(inventory_value_cents(&conn).unwrap(), 1250 * 40 + 1000 * 3);
        assert_eq!(count_products(&conn).unwrap(), 2);
    }

    #[test]
    fn low_stock_uses_larger_of_reorder_level_and_threshold() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let p = create_product(&conn, &amoxicillin(), BusinessType::Pharmacy).unwrap();
        assert!(!p.is_low_stock(5));
        assert!(p.is_low_stock(40));
    }

    #[test]
    fn customer_create_search_update() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let c = create_customer(
            &conn,
            &NewCustomer {
                name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: None,
            },
        )
        .unwrap();
        create_customer(
            &conn,
            &NewCustomer {
                name: "Grace Hopper".to_string(),
                email: None,
                phone: Some("555-0100".to_string()),
            },
        )
        .unwrap();

        assert_eq!(list_customers(&conn, None).unwrap().len(), 2);
        let found = list_customers(&conn, Some("ADA")).unwrap();
        assert_eq!(found, vec![c.clone()]);
        assert_eq!(list_customers(&conn, Some("0100")).unwrap().len(), 1);

        let updated = update_customer(
            &conn,
            &c.id,
            &CustomerUpdate {
                loyalty_points: Some(120),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.loyalty_points, 120);
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));
        assert_eq!(count_customers(&conn).unwrap(), 2);
    }

    #[test]
    fn customer_bad_email_rejected() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.conn().unwrap();
        let err = create_customer(
            &conn,
            &NewCustomer {
                name: "X".to_string(),
                email: Some("not-an-email".to_string()),
                phone: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));
    }
}
