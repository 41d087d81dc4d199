use chrono::NaiveDate;
use serde::Serialize;

pub const PRODUCT_HEADER: [&str; 6] = [
    "product_id",
    "product_name",
    "category",
    "unit_cost",
    "weight_kg",
    "dimensions_cm",
];

pub const WAREHOUSE_HEADER: [&str; 5] = [
    "warehouse_id",
    "warehouse_name",
    "location",
    "capacity_units",
    "manager_name",
];

pub const MOVEMENT_HEADER: [&str; 6] = [
    "movement_id",
    "product_id",
    "warehouse_id",
    "movement_date",
    "quantity",
    "movement_type",
];

pub const ORDER_HEADER: [&str; 6] = [
    "order_id",
    "product_id",
    "warehouse_id",
    "order_date",
    "quantity",
    "sales_channel",
];

pub const CATEGORIES: [&str; 5] = ["Electronics", "Sports", "Home & Kitchen", "Books", "Toys"];
pub const PRODUCT_TIERS: [&str; 4] = ["Pro", "Max", "Lite", "Standard"];
pub const MOVEMENT_TYPES: [&str; 3] = ["replenishment", "outbound", "adjustment"];
pub const SALES_CHANNELS: [&str; 3] = ["online", "retail", "wholesale"];

pub const WAREHOUSE_COUNT: u32 = 20;

pub fn product_id(n: usize) -> String {
    format!("PRD{:05}", n)
}

pub fn warehouse_id(n: u32) -> String {
    format!("WH{:03}", n)
}

pub fn movement_id(n: usize) -> String {
    format!("MV{:07}", n)
}

pub fn order_id(n: usize) -> String {
    format!("ORD{:07}", n)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub product_id: String,
    pub product_name: String,
    pub category: &'static str,
    pub unit_cost: f64,
    pub weight_kg: f64,
    pub dimensions_cm: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseRow {
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub location: String,
    pub capacity_units: u32,
    pub manager_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementRow {
    pub movement_id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub movement_date: NaiveDate,
    /// Negative for stock leaving the warehouse.
    pub quantity: i32,
    pub movement_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRow {
    pub order_id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub order_date: NaiveDate,
    pub quantity: u32,
    pub sales_channel: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(product_id(7), "PRD00007");
        assert_eq!(warehouse_id(20), "WH020");
        assert_eq!(movement_id(42), "MV0000042");
        assert_eq!(order_id(9999), "ORD0009999");
    }
}
