use tracing::debug;

use super::types::{ColumnInfo, ColumnKind};

/// For each column, scan every row:
///  - Ignore missing cells
///  - Remember the narrowest kind that fits all non-missing samples
///    (integer ⊂ float ⊂ text)
///  - A column with no samples is `Empty`
pub fn derive_column_info(headers: &[String], rows: &[Vec<Option<String>>]) -> Vec<ColumnInfo> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut non_missing = 0;
            let mut kind = ColumnKind::Empty;

            for cell in rows.iter().filter_map(|r| r.get(idx).and_then(|c| c.as_deref())) {
                non_missing += 1;
                if kind == ColumnKind::Text {
                    continue;
                }
                kind = widen(kind, infer_kind(cell));
            }

            debug!(column = %name, non_missing, ?kind, "derived column info");
            ColumnInfo {
                name: name.clone(),
                non_missing,
                kind,
            }
        })
        .collect()
}

fn infer_kind(raw: &str) -> ColumnKind {
    let v = raw.trim();
    if v.parse::<i64>().is_ok() {
        ColumnKind::Integer
    } else if v.parse::<f64>().is_ok() {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    }
}

fn widen(current: ColumnKind, next: ColumnKind) -> ColumnKind {
    use ColumnKind::*;
    match (current, next) {
        (Empty, k) | (k, Empty) => k,
        (Text, _) | (_, Text) => Text,
        (Float, _) | (_, Float) => Float,
        (Integer, Integer) => Integer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(v: &[&str]) -> Vec<Option<String>> {
        v.iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn test_derive_column_info() {
        let headers: Vec<String> = ["idade", "peso", "sintomas", "vazio"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            cells(&["45", "70.5", "Febre", ""]),
            cells(&["", "80", "Tosse", ""]),
            cells(&["12", "", "", ""]),
        ];
        let info = derive_column_info(&headers, &rows);

        assert_eq!(info[0].kind, ColumnKind::Integer);
        assert_eq!(info[0].non_missing, 2);
        assert_eq!(info[1].kind, ColumnKind::Float);
        assert_eq!(info[2].kind, ColumnKind::Text);
        assert_eq!(info[2].non_missing, 2);
        assert_eq!(info[3].kind, ColumnKind::Empty);
        assert_eq!(info[3].non_missing, 0);
    }

    #[test]
    fn test_text_wins_over_numbers() {
        let headers = vec!["idade".to_string()];
        let rows = vec![cells(&["45"]), cells(&["abc"]), cells(&["3.5"])];
        assert_eq!(derive_column_info(&headers, &rows)[0].kind, ColumnKind::Text);
    }
}
