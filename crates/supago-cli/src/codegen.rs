//! Rust struct generation from a table schema.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use supago_core::{ColumnSchema, TableSchemaResult};

/// Default directory for generated models.
pub const DEFAULT_OUT_DIR: &str = "src/domain";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Map a PostgreSQL `data_type` to the Rust type of a generated field.
pub fn rust_type(data_type: &str, nullable: bool) -> String {
    let base = match data_type.to_ascii_lowercase().as_str() {
        "uuid" | "text" | "varchar" | "character varying" | "char" | "character" | "citext" => {
            "String"
        }
        "int2" | "int4" | "integer" | "smallint" => "i32",
        "int8" | "bigint" => "i64",
        "bool" | "boolean" => "bool",
        "timestamptz" | "timestamp with time zone" => "chrono::DateTime<chrono::Utc>",
        "timestamp" | "timestamp without time zone" => "chrono::NaiveDateTime",
        "date" => "chrono::NaiveDate",
        "numeric" | "decimal" | "float4" | "float8" | "real" | "double precision" => "f64",
        _ => "serde_json::Value",
    };

    if nullable {
        format!("Option<{}>", base)
    } else {
        base.to_string()
    }
}

/// `blog_posts` -> `BlogPosts`. Any non-alphanumeric character separates words.
pub fn to_pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            capitalize_next = true;
        } else if capitalize_next {
            out.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'T');
    }
    out
}

/// Field identifier for a column name: `createdAt` -> `created_at`,
/// `type` -> `r#type`.
pub fn field_ident(column: &str) -> String {
    let mut out = String::with_capacity(column.len() + 4);
    let mut prev_lower = false;
    for c in column.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if NON_RAW_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    } else if RUST_KEYWORDS.contains(&out.as_str()) {
        out.insert_str(0, "r#");
    }
    out
}

fn render_field(out: &mut String, column: &ColumnSchema) {
    let ident = field_ident(&column.column_name);
    let plain = ident.trim_start_matches("r#");
    if plain != column.column_name {
        out.push_str(&format!("    #[serde(rename = {:?})]\n", column.column_name));
    }
    out.push_str(&format!(
        "    pub {}: {},\n",
        ident,
        rust_type(&column.data_type, column.is_nullable)
    ));
}

/// Source text of a serde-derived struct for `schema`.
pub fn render_struct(schema: &TableSchemaResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// Generated by `supago pull {}`.\n\n",
        schema.table_name
    ));
    out.push_str("use serde::{Deserialize, Serialize};\n\n");
    out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    out.push_str(&format!("pub struct {} {{\n", to_pascal_case(&schema.table_name)));
    for column in &schema.columns {
        render_field(&mut out, column);
    }
    out.push_str("}\n");
    out
}

/// Write `<out_dir>/<table>.rs`, creating the directory if needed.
pub fn write_struct(schema: &TableSchemaResult, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let path = out_dir.join(format!("{}.rs", schema.table_name.to_lowercase()));
    fs::write(&path, render_struct(schema))
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn blogs() -> TableSchemaResult {
        TableSchemaResult::new(
            "blogs",
            vec![
                ColumnSchema::new("id", "uuid", false, "gen_random_uuid()"),
                ColumnSchema::new("title", "text", false, ""),
                ColumnSchema::new("published_at", "timestamp with time zone", true, ""),
                ColumnSchema::new("type", "USER-DEFINED", false, ""),
            ],
        )
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(rust_type("uuid", false), "String");
        assert_eq!(rust_type("character varying", true), "Option<String>");
        assert_eq!(rust_type("integer", false), "i32");
        assert_eq!(rust_type("bigint", true), "Option<i64>");
        assert_eq!(rust_type("boolean", false), "bool");
        assert_eq!(rust_type("timestamptz", false), "chrono::DateTime<chrono::Utc>");
        assert_eq!(rust_type("timestamp without time zone", false), "chrono::NaiveDateTime");
        assert_eq!(rust_type("date", false), "chrono::NaiveDate");
        assert_eq!(rust_type("numeric", false), "f64");
        assert_eq!(rust_type("jsonb", false), "serde_json::Value");
        assert_eq!(rust_type("tsvector", true), "Option<serde_json::Value>");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_pascal_case("blogs"), "Blogs");
        assert_eq!(to_pascal_case("blog_posts"), "BlogPosts");
        assert_eq!(to_pascal_case("2fa-codes"), "T2faCodes");

        assert_eq!(field_ident("title"), "title");
        assert_eq!(field_ident("createdAt"), "created_at");
        assert_eq!(field_ident("Full Name"), "full_name");
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("self"), "self_");
        assert_eq!(field_ident("1st"), "_1st");
    }

    #[test]
    fn test_render_struct() {
        let src = render_struct(&blogs());

        assert!(src.contains("pub struct Blogs {"));
        assert!(src.contains("    pub id: String,\n"));
        assert!(src.contains("    pub title: String,\n"));
        assert!(src.contains("    pub published_at: Option<chrono::DateTime<chrono::Utc>>,\n"));
        assert!(src.contains("    pub r#type: serde_json::Value,\n"));
        assert!(!src.contains("rename = \"type\""));
    }

    #[test]
    fn test_renamed_columns_keep_wire_name() {
        let schema = TableSchemaResult::new(
            "users",
            vec![ColumnSchema::new("createdAt", "date", false, "")],
        );
        let src = render_struct(&schema);

        assert!(src.contains("    #[serde(rename = \"createdAt\")]\n    pub created_at: chrono::NaiveDate,\n"));
    }

    #[test]
    fn test_write_struct_creates_directory() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("src").join("domain");

        let path = write_struct(&blogs(), &out_dir).unwrap();

        assert_eq!(path, out_dir.join("blogs.rs"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_struct(&blogs()));
    }
}
