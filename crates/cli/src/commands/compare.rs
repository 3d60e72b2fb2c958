use whispercart_core::comparison::compare_locally;
use whispercart_core::domain::product::ProductListing;

use crate::commands::CommandResult;

pub fn run(raw_products: &str) -> CommandResult {
    let products: Vec<ProductListing> = match serde_json::from_str(raw_products) {
        Ok(products) => products,
        Err(error) => {
            return CommandResult::failure(
                "compare",
                "invalid_input",
                format!("products must be a JSON array of listings: {error}"),
                2,
            );
        }
    };

    match compare_locally(&products) {
        Ok(comparison) => {
            CommandResult::with_data("compare", "comparison built with local rules", &comparison)
        }
        Err(error) => CommandResult::failure("compare", "invalid_input", error.to_string(), 2),
    }
}
