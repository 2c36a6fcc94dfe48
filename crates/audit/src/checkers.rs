//! Built-in rule checkers.
//!
//! Each checker is a pure function of (store fields, audit context, rule
//! config) returning at most one [`Trigger`]. A checker that cannot read a
//! field it needs returns `None` — partial data skips the rule for that
//! store, it never aborts the audit.

use baseops_core::Fields;

use crate::engine::AuditContext;
use crate::schema::{AuditConfig, RuleConfig};

/// The measurable facts behind a fired rule.
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Headline metric, e.g. `sell-through 95%`.
    pub metric: String,
    /// Supporting detail for the report body.
    pub detail: String,
    /// Suggested operator action.
    pub suggestion: String,
    /// The numeric values that tripped the rule.
    pub values: Vec<(String, f64)>,
}

/// Signature of a rule checker.
pub type RuleChecker =
    fn(&Fields, &AuditContext, &RuleConfig, &AuditConfig) -> Option<Trigger>;

/// Registry of built-in checkers, keyed by rule id.
pub const CHECKERS: &[(&str, RuleChecker)] = &[
    ("sell_through_high", check_sell_through_high),
    ("sell_through_low", check_sell_through_low),
    ("target_achievement_low", check_target_achievement_low),
    ("negative_inventory", check_negative_inventory),
    ("zero_sales", check_zero_sales),
    ("inventory_turnover_slow", check_inventory_turnover_slow),
    ("low_sell_rate", check_low_sell_rate),
];

/// Look up a checker by rule id.
pub fn checker(rule_id: &str) -> Option<RuleChecker> {
    CHECKERS
        .iter()
        .find(|(id, _)| *id == rule_id)
        .map(|(_, f)| *f)
}

// ── Sell-through ────────────────────────────────────────────────────

fn check_sell_through_high(
    store: &Fields,
    ctx: &AuditContext,
    rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let total_stock = cfg.num_field(store, "total_stock")?;
    let sold = cfg.num_field(store, "sold")?;
    if total_stock <= 0.0 {
        return None;
    }
    let sell_through = sold / total_stock;

    // Prefer an explicit days-remaining column; otherwise derive it from
    // remaining stock and the average daily run rate.
    let days_remaining = match cfg.num_field(store, "days_remaining") {
        Some(days) => days,
        None => {
            let current = cfg
                .num_field(store, "current_stock")
                .unwrap_or(total_stock - sold);
            let daily_avg = ctx.daily_avg_sold.unwrap_or(sold);
            if daily_avg > 0.0 {
                current / daily_avg
            } else {
                f64::INFINITY
            }
        }
    };

    if sell_through >= rule.threshold("sell_through_min", 0.85)
        && days_remaining <= rule.threshold("days_left_max", 3.0)
    {
        return Some(Trigger {
            metric: format!("sell-through {:.0}%", sell_through * 100.0),
            detail: format!(
                "projected to sell out in {:.1} days",
                days_remaining
            ),
            suggestion: "restock now or transfer from a slow-moving store".to_string(),
            values: vec![
                ("sell_through".to_string(), sell_through),
                ("days_remaining".to_string(), days_remaining),
            ],
        });
    }
    None
}

fn check_sell_through_low(
    store: &Fields,
    _ctx: &AuditContext,
    rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let total_stock = cfg.num_field(store, "total_stock")?;
    let sold = cfg.num_field(store, "sold")?;
    let days_on_shelf = cfg.num_field(store, "days_on_shelf")?;
    if total_stock <= 0.0 {
        return None;
    }
    let sell_through = sold / total_stock;

    if sell_through < rule.threshold("sell_through_max", 0.20)
        && days_on_shelf >= rule.threshold("days_on_shelf_min", 14.0)
    {
        return Some(Trigger {
            metric: format!(
                "sell-through {:.0}% after {:.0} days on shelf",
                sell_through * 100.0,
                days_on_shelf
            ),
            detail: format!("sold {:.0} of {:.0} initial units", sold, total_stock),
            suggestion: "slow mover — mark down or transfer to a faster store".to_string(),
            values: vec![
                ("sell_through".to_string(), sell_through),
                ("days_on_shelf".to_string(), days_on_shelf),
            ],
        });
    }
    None
}

// ── Sales targets ───────────────────────────────────────────────────

fn check_target_achievement_low(
    store: &Fields,
    _ctx: &AuditContext,
    rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let actual = cfg.num_field(store, "actual_sales")?;
    let target = cfg.num_field(store, "target_sales")?;
    if target <= 0.0 {
        return None;
    }
    let achievement = actual / target;

    if achievement < rule.threshold("achievement_min", 0.60) {
        let gap = target - actual;
        return Some(Trigger {
            metric: format!("achievement {:.0}%", achievement * 100.0),
            detail: format!(
                "actual {:.0} against target {:.0}, gap {:.0}",
                actual, target, gap
            ),
            suggestion:
                "severely behind — check footfall, conversion, and basket size".to_string(),
            values: vec![
                ("achievement".to_string(), achievement),
                ("gap".to_string(), gap),
            ],
        });
    }
    None
}

// ── Inventory integrity ─────────────────────────────────────────────

fn check_negative_inventory(
    store: &Fields,
    _ctx: &AuditContext,
    _rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    // Any tracked inventory field going negative is a data error.
    for key in ["current_stock", "total_stock"] {
        if let Some(stock) = cfg.num_field(store, key) {
            if stock < 0.0 {
                return Some(Trigger {
                    metric: format!("{} {:.0}", cfg.field_label(key), stock),
                    detail: "system stock level is negative".to_string(),
                    suggestion: "run a stock count and audit in/out bookings".to_string(),
                    values: vec![(key.to_string(), stock)],
                });
            }
        }
    }
    None
}

fn check_zero_sales(
    store: &Fields,
    _ctx: &AuditContext,
    _rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let sales = cfg
        .num_field(store, "actual_sales")
        .or_else(|| cfg.num_field(store, "sold"))?;
    let stock = cfg.num_field(store, "current_stock")?;

    // Only stores that are actually open can be expected to sell. When
    // the status column is absent the store counts as open.
    if let Some(status) = cfg.text_field(store, "status") {
        if !status.eq_ignore_ascii_case("open") {
            return None;
        }
    }

    if sales == 0.0 && stock > 0.0 {
        return Some(Trigger {
            metric: "zero sales today".to_string(),
            detail: format!("{:.0} units in stock, no sales recorded", stock),
            suggestion: "confirm the store is trading and the POS uploads data".to_string(),
            values: vec![
                ("sales".to_string(), sales),
                ("current_stock".to_string(), stock),
            ],
        });
    }
    None
}

// ── Working capital ─────────────────────────────────────────────────

fn check_inventory_turnover_slow(
    store: &Fields,
    _ctx: &AuditContext,
    rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let avg_inventory = cfg.num_field(store, "avg_inventory_value")?;
    let daily_cogs = cfg.num_field(store, "daily_cogs")?;
    if avg_inventory <= 0.0 || daily_cogs <= 0.0 {
        return None;
    }
    let turnover_days = avg_inventory / daily_cogs;
    let limit = rule.threshold("turnover_days_max", 45.0);

    if turnover_days > limit {
        return Some(Trigger {
            metric: format!("turnover {:.0} days", turnover_days),
            detail: format!(
                "avg inventory {:.0}, daily cost of goods {:.0}",
                avg_inventory, daily_cogs
            ),
            suggestion: format!(
                "over the {:.0}-day limit — clear slow movers to free capital",
                limit
            ),
            values: vec![("turnover_days".to_string(), turnover_days)],
        });
    }
    None
}

fn check_low_sell_rate(
    store: &Fields,
    _ctx: &AuditContext,
    rule: &RuleConfig,
    cfg: &AuditConfig,
) -> Option<Trigger> {
    let active_sku = cfg.num_field(store, "active_sku")?;
    let total_sku = cfg.num_field(store, "total_sku")?;
    if total_sku <= 0.0 {
        return None;
    }
    let sell_rate = active_sku / total_sku;

    if sell_rate < rule.threshold("sell_rate_min", 0.60) {
        let sleeping = total_sku - active_sku;
        return Some(Trigger {
            metric: format!("sell rate {:.0}%", sell_rate * 100.0),
            detail: format!(
                "{:.0} of {:.0} SKUs without sales",
                sleeping, total_sku
            ),
            suggestion: "review assortment and shelf placement".to_string(),
            values: vec![
                ("sell_rate".to_string(), sell_rate),
                ("sleeping_sku".to_string(), sleeping),
            ],
        });
    }
    None
}

// ── Tests ───────────────────────────────────────────────────────────
