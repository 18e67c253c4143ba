mod summary;
mod trend;

pub use summary::{compute_category_distribution, compute_summary};
pub use trend::compute_sales_trend;
