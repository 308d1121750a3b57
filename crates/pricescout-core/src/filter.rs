use rust_decimal::Decimal;

use crate::{FilteredProduct, Product};

/// Annotate products against an optional budget.
///
/// Nothing is removed here. With no budget every product is within budget and
/// has no savings. With a budget, a product whose price is unknown is not
/// within budget (it cannot be verified) but is still returned, and a product
/// priced exactly at the budget is within budget with zero savings.
#[must_use]
pub fn apply_budget(products: Vec<Product>, max_price: Option<Decimal>) -> Vec<FilteredProduct> {
    products
        .into_iter()
        .map(|product| {
            let (within_budget, savings) = match (max_price, product.price_value) {
                (Some(max), Some(price)) => {
                    let within = price <= max;
                    (within, within.then(|| max - price))
                }
                (Some(_), None) => (false, None),
                (None, _) => (true, None),
            };
            FilteredProduct {
                product,
                within_budget,
                savings,
            }
        })
        .collect()
}
