use std::collections::BTreeMap;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::{ApiError, HttpError};
use crate::schema::ShoppingListRow;

/// Sums amounts per (ingredient name, measurement unit), ordered by name.
/// The cart query already groups this way; callers handing over raw recipe
/// parts get the same list.
pub fn aggregate_rows(rows: &[ShoppingListRow]) -> Vec<ShoppingListRow> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name.to_owned(), row.measurement_unit.to_owned()))
            .or_insert(0) += row.total_amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListRow {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Renders the aggregated shopping list as a single-column PDF document.
/// One line per (ingredient, unit) pair, with page breaks when a column
/// fills up.
pub fn render_shopping_list(rows: &[ShoppingListRow]) -> Result<Vec<u8>, ApiError> {
    let rows = aggregate_rows(rows);
    let (doc, page, layer) = PdfDocument::new("Shopping list", Mm(210.0), Mm(297.0), "Layer 1");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| HttpError::InternalServerError.new(&format!("{e}")))?;
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| HttpError::InternalServerError.new(&format!("{e}")))?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text("Shopping list", 18.0, Mm(20.0), Mm(270.0), &title_font);

    let mut y = 254.0;

    if rows.is_empty() {
        current.use_text("The shopping cart is empty", 12.0, Mm(20.0), Mm(y), &font);
    }

    for row in &rows {
        if y < 20.0 {
            let (next_page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = 270.0;
        }

        current.use_text(format_row(row), 12.0, Mm(20.0), Mm(y), &font);
        y -= 8.0;
    }

    doc.save_to_bytes()
        .map_err(|e| HttpError::InternalServerError.new(&format!("{e}")))
}

fn format_row(row: &ShoppingListRow) -> String {
    format!(
        "{} ({}): {}",
        row.name, row.measurement_unit, row.total_amount
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: amount,
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let rows = vec![row("flour", "g", 500), row("milk", "ml", 350)];
        let bytes = render_shopping_list(&rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_cart_still_renders() {
        let bytes = render_shopping_list(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_lists_span_pages() {
        let rows: Vec<ShoppingListRow> = (0..120)
            .map(|n| row(&format!("ingredient-{n}"), "g", n))
            .collect();
        let bytes = render_shopping_list(&rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn row_format_carries_unit_and_total() {
        assert_eq!(format_row(&row("flour", "g", 500)), "flour (g): 500");
    }

    #[test]
    fn amounts_sum_per_name_and_unit() {
        let merged = aggregate_rows(&[
            row("flour", "g", 300),
            row("milk", "ml", 200),
            row("flour", "g", 200),
            row("flour", "kg", 1),
        ]);

        assert_eq!(
            merged,
            vec![
                row("flour", "g", 500),
                row("flour", "kg", 1),
                row("milk", "ml", 200),
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let merged = aggregate_rows(&[row("sugar", "g", 100), row("sugar", "tbsp", 2)]);
        assert_eq!(merged.len(), 2);
    }
}
