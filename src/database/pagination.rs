use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<(String, i64)>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }
        let page_count = (total_rows + page_size - 1) / page_size;
        let last_offset = (page_count - 1).max(0) * page_size;

        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);

        let current_page = current_offset / page_size;
        let page_list = (0..page_count)
            .map(|n| {
                let page = if n == current_page {
                    String::from("...")
                } else {
                    format!("{}", n + 1)
                };

                (page, n * page_size)
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![(String::from("1"), 0)],
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_collapse_to_no_rows() {
        let page = PageContext::<i32>::from_rows(vec![], 0, 6, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_list, vec![(String::from("1"), 0)]);
    }

    #[test]
    fn offsets_stay_in_bounds() {
        let rows: Vec<i32> = (0..6).collect();
        let page = PageContext::from_rows(rows, 14, 6, 12);
        // 14 rows / 6 per page -> pages at offsets 0, 6, 12
        assert_eq!(page.next_offset, 12);
        assert_eq!(page.prev_offset, 6);
        assert_eq!(page.page_list.len(), 3);
    }

    #[test]
    fn current_page_is_masked_in_page_list() {
        let rows: Vec<i32> = (0..6).collect();
        let page = PageContext::from_rows(rows, 14, 6, 6);
        assert_eq!(page.page_list[1].0, "...");
        assert_eq!(page.page_list[0].0, "1");
        assert_eq!(page.page_list[2].0, "3");
    }
}
