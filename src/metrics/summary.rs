use crate::types::{CategoryDistributionEntry, Order, Product, Summary};

/// Reduce one fetch's products and orders into the dashboard headline
/// numbers. Pure; a zeroed summary only ever means the inputs were
/// genuinely empty.
pub fn compute_summary(products: &[Product], orders: &[Order]) -> Summary {
    // Strict `>` keeps the earliest product on sales-count ties.
    let best_seller = products
        .iter()
        .reduce(|best, p| if p.sales_count > best.sales_count { p } else { best })
        .cloned();

    Summary {
        total_products: products.len(),
        total_sales: orders.iter().map(|o| o.amount).sum(),
        best_seller,
        out_of_stock: products.iter().filter(|p| p.stock == 0).count(),
    }
}

/// One entry per distinct category, counted, in order of first appearance.
/// The rendering layer relies on that ordering being stable across repeated
/// calls with identical input order, so no sorting. Uncategorized products
/// are skipped.
pub fn compute_category_distribution(products: &[Product]) -> Vec<CategoryDistributionEntry> {
    let mut entries: Vec<CategoryDistributionEntry> = Vec::new();
    for product in products {
        let Some(category) = product.category.as_deref() else {
            continue;
        };
        match entries.iter_mut().find(|e| e.category == category) {
            Some(entry) => entry.count += 1,
            None => entries.push(CategoryDistributionEntry {
                category: category.to_string(),
                count: 1,
            }),
        }
    }
    entries
}
