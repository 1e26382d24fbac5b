use crate::types::Tabular;

const MAX_CELL_WIDTH: usize = 20;

fn truncate(cell: String) -> String {
    if cell.chars().count() > MAX_CELL_WIDTH {
        let head: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        cell
    }
}

/// Renders the first `limit` rows as a bordered, right-aligned text table,
/// noting when rows were left out.
pub fn render<T: Tabular>(rows: &[T], limit: usize) -> String {
    let header: Vec<String> = T::HEADER.iter().map(|h| h.to_string()).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .take(limit)
        .map(|r| r.cells().into_iter().map(truncate).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count().max(3)).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&"-".repeat(*w));
            line.push('+');
        }
        line
    };
    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (cell, w) in cells.iter().zip(&widths) {
            line.push_str(&format!("{cell:>w$}|", w = *w));
        }
        line
    };

    let mut out = Vec::with_capacity(body.len() + 5);
    out.push(border.clone());
    out.push(render_row(&header));
    out.push(border.clone());
    for row in &body {
        out.push(render_row(row));
    }
    out.push(border);
    if rows.len() > limit {
        let noun = if limit == 1 { "row" } else { "rows" };
        out.push(format!("only showing top {limit} {noun}"));
    }
    out.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FavoriteGenre, NightListener};

    #[test]
    fn test_render_table() {
        let rows = vec![FavoriteGenre {
            user_id: "user_1".into(),
            genre: "Rock".into(),
            genre_listen_count: 12,
        }];
        let expected = "\
+-------+-----+------------------+
|user_id|genre|genre_listen_count|
+-------+-----+------------------+
| user_1| Rock|                12|
+-------+-----+------------------+
";
        assert_eq!(render(&rows, 10), expected);
    }

    #[test]
    fn test_render_notes_omitted_rows() {
        let rows: Vec<NightListener> = (0..3)
            .map(|i| NightListener {
                user_id: format!("u{i}"),
            })
            .collect();
        let out = render(&rows, 2);
        assert!(out.contains("|     u1|"));
        assert!(!out.contains("u2"));
        assert!(out.ends_with("only showing top 2 rows\n"));
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let rows = vec![NightListener {
            user_id: "a".repeat(30),
        }];
        let out = render(&rows, 10);
        assert!(out.contains(&format!("{}...", "a".repeat(17))));
    }
}
