//! Compilation of [`Predicate`] trees into `SQLite` WHERE clauses
//!
//! The generated clause refers to the files table through the alias `f`
//! (`FROM files f WHERE <clause>`). Every literal travels as a bound
//! parameter; nothing from the predicate is spliced into the SQL text.

use rusqlite::types::Value;

use super::predicate::Predicate;

const TAG_JOIN: &str = "SELECT 1 FROM file_tags ft \
     JOIN tags t ON ft.tag_id = t.id \
     JOIN categories c ON c.id = t.category_id \
     WHERE ft.file_id = f.id";

/// A WHERE clause with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<Value>,
}

/// Compile a predicate into a WHERE clause over `files f`
#[must_use]
pub fn compile(predicate: &Predicate) -> SqlFilter {
    let mut params = Vec::new();
    let clause = compile_into(predicate, &mut params);
    SqlFilter { clause, params }
}

fn compile_into(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Always => "1".to_string(),
        Predicate::And(parts) if parts.is_empty() => "1".to_string(),
        Predicate::Or(parts) if parts.is_empty() => "0".to_string(),
        Predicate::And(parts) => join(parts, " AND ", params),
        Predicate::Or(parts) => join(parts, " OR ", params),
        Predicate::Not(inner) => format!("NOT ({})", compile_into(inner, params)),
        Predicate::HasTag { values, .. } if values.is_empty() => "0".to_string(),
        Predicate::HasTag { category, values } => {
            params.push(Value::Text(category.clone()));
            params.extend(values.iter().cloned().map(Value::Text));
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("EXISTS ({TAG_JOIN} AND c.name = ? AND t.value IN ({placeholders}))")
        }
        Predicate::InCategory { category } => {
            params.push(Value::Text(category.clone()));
            format!("EXISTS ({TAG_JOIN} AND c.name = ?)")
        }
        Predicate::Tagged => {
            "EXISTS (SELECT 1 FROM file_tags ft WHERE ft.file_id = f.id)".to_string()
        }
    }
}

fn join(parts: &[Predicate], separator: &str, params: &mut Vec<Value>) -> String {
    let compiled: Vec<String> = parts
        .iter()
        .map(|p| format!("({})", compile_into(p, params)))
        .collect();
    compiled.join(separator)
}
