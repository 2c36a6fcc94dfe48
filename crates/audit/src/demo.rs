//! Deterministic demo store fleet.
//!
//! Seeded generator producing a spread of store records that exercises
//! every built-in rule: a few stores badly behind target, some about to
//! sell out, some with negative stock, some with sleeping SKUs, and a
//! healthy majority.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use baseops_core::{Fields, Value};

const REGIONS: [&str; 5] = ["East", "South", "North", "Southwest", "Central"];
const CITIES: [[&str; 5]; 5] = [
    ["Shanghai", "Hangzhou", "Nanjing", "Suzhou", "Ningbo"],
    ["Guangzhou", "Shenzhen", "Dongguan", "Foshan", "Zhuhai"],
    ["Beijing", "Tianjin", "Shijiazhuang", "Jinan", "Qingdao"],
    ["Chengdu", "Chongqing", "Kunming", "Guiyang", "Nanning"],
    ["Wuhan", "Changsha", "Zhengzhou", "Hefei", "Nanchang"],
];

/// Generate `count` demo stores using the bundled default column labels.
///
/// The generator is seeded, so repeated calls produce identical fleets —
/// demo reports and tests are reproducible.
pub fn demo_stores(count: usize) -> Vec<Fields> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut stores = Vec::with_capacity(count);

    for i in 0..count {
        let region = REGIONS[i % 5];
        let city = CITIES[i % 5][i / 10 % 5];
        let store_name = format!("{} {:02}", city, i + 1);

        let target = rng.gen_range(8_000..50_000) as f64;
        let actual = match i {
            // Badly behind target.
            0..=4 => (target * rng.gen_range(0.25..0.55)).round(),
            // Overachievers with near-empty shelves.
            5..=9 => (target * rng.gen_range(0.90..1.20)).round(),
            // Dark stores: no sales at all.
            10..=12 => 0.0,
            13..=15 => (target * rng.gen_range(0.60..0.90)).round(),
            _ => (target * rng.gen_range(0.65..1.15)).round(),
        };

        let initial_stock = rng.gen_range(200..800) as f64;
        let sold = match i {
            5..=9 => (initial_stock * rng.gen_range(0.88..0.97)).round(),
            16..=24 => (initial_stock * rng.gen_range(0.05..0.18)).round(),
            _ => (initial_stock * rng.gen_range(0.30..0.75)).round(),
        };

        let current_stock = if (13..16).contains(&i) {
            // Bookkeeping gone wrong.
            -(rng.gen_range(5..50) as f64)
        } else {
            initial_stock - sold
        };

        let total_sku = rng.gen_range(80..200) as f64;
        let active_sku = if (30..35).contains(&i) {
            (total_sku * rng.gen_range(0.30..0.55)).round()
        } else {
            (total_sku * rng.gen_range(0.62..0.92)).round()
        };

        let avg_inventory_value = current_stock.max(0.0) * rng.gen_range(80..300) as f64;
        let daily_cogs = (actual * 0.6 / 7.0).max(1.0);

        let fields: Fields = [
            ("Store Name", Value::String(store_name)),
            ("Region", Value::String(region.to_string())),
            ("City", Value::String(city.to_string())),
            ("Target Sales", Value::Number(target)),
            ("Actual Sales", Value::Number(actual)),
            ("Initial Stock", Value::Number(initial_stock)),
            ("Sold Quantity", Value::Number(sold)),
            ("Current Stock", Value::Number(current_stock)),
            ("Days On Shelf", Value::Number(rng.gen_range(7..30) as f64)),
            ("Total SKUs", Value::Number(total_sku)),
            ("Active SKUs", Value::Number(active_sku)),
            ("Avg Inventory Value", Value::Number(avg_inventory_value)),
            ("Daily COGS", Value::Number(daily_cogs)),
            ("Status", Value::String("open".to_string())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        stores.push(fields);
    }

    stores
}

// ── Tests ───────────────────────────────────────────────────────────
