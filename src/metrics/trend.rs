use chrono::DateTime;

use crate::config::SECS_PER_DAY;
use crate::types::{Order, SalesTrendPoint};

/// Daily order totals over the trailing `window_days` ending at
/// `end_epoch`, oldest first. Point `i` covers the half-open day window
/// ending `window_days - 1 - i` days before `end_epoch`, so the series as
/// a whole covers exactly `[end_epoch - window_days*86400, end_epoch)`.
/// Days with no orders yield `amount = 0.0`, never a gap.
pub fn compute_sales_trend(
    orders: &[Order],
    end_epoch: i64,
    window_days: u32,
) -> Vec<SalesTrendPoint> {
    let mut points = Vec::with_capacity(window_days as usize);
    for i in (0..i64::from(window_days)).rev() {
        let day_end = end_epoch - i * SECS_PER_DAY;
        let day_start = day_end - SECS_PER_DAY;
        let amount = orders
            .iter()
            .filter(|o| o.created_at >= day_start && o.created_at < day_end)
            .map(|o| o.amount)
            .sum();
        points.push(SalesTrendPoint {
            label: day_label(day_end),
            amount,
        });
    }
    points
}

/// Short month + day, e.g. "Aug 29".
fn day_label(epoch: i64) -> String {
    match DateTime::from_timestamp(epoch, 0) {
        Some(dt) => format!("{} {}", dt.format("%b"), dt.format("%-d")),
        None => epoch.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-08-29T00:00:00Z
    const END: i64 = 1_724_889_600;

    fn order(amount: f64, created_at: i64) -> Order {
        Order { amount, created_at }
    }

    #[test]
    fn always_returns_window_days_points() {
        assert_eq!(compute_sales_trend(&[], END, 30).len(), 30);
        assert_eq!(compute_sales_trend(&[], END, 7).len(), 7);
    }

    #[test]
    fn empty_days_are_zero_not_absent() {
        let trend = compute_sales_trend(&[order(5.0, END - 3600)], END, 30);
        assert_eq!(trend.len(), 30);
        assert_eq!(trend[29].amount, 5.0);
        assert!(trend[..29].iter().all(|p| p.amount == 0.0));
    }

    #[test]
    fn window_sum_equals_in_window_order_sum() {
        let orders = [
            order(10.0, END - 1),                      // newest day
            order(20.0, END - 15 * SECS_PER_DAY),      // mid-window
            order(30.0, END - 30 * SECS_PER_DAY),      // oldest in-window second
            order(99.0, END - 30 * SECS_PER_DAY - 1),  // just outside
            order(77.0, END),                          // at end, excluded
        ];
        let trend = compute_sales_trend(&orders, END, 30);
        let total: f64 = trend.iter().map(|p| p.amount).sum();
        assert!((total - 60.0).abs() < 1e-9, "total={total}");
    }

    #[test]
    fn points_are_oldest_first() {
        let orders = [
            order(1.0, END - 29 * SECS_PER_DAY - 3600), // oldest day
            order(2.0, END - 3600),                     // newest day
        ];
        let trend = compute_sales_trend(&orders, END, 30);
        assert_eq!(trend[0].amount, 1.0);
        assert_eq!(trend[29].amount, 2.0);
    }

    #[test]
    fn day_boundary_is_half_open() {
        // Exactly on a day boundary: belongs to the window that starts there.
        let boundary = END - 10 * SECS_PER_DAY;
        let trend = compute_sales_trend(&[order(4.0, boundary)], END, 30);
        // boundary is day_start of the point with day_end = END - 9 days,
        // which sits at index 29 - 9 = 20.
        assert_eq!(trend[20].amount, 4.0);
        assert_eq!(trend[19].amount, 0.0);
    }

    #[test]
    fn labels_are_short_month_and_day() {
        let trend = compute_sales_trend(&[], END, 30);
        assert_eq!(trend[29].label, "Aug 29");
        assert_eq!(trend[0].label, "Jul 31");
    }
}
