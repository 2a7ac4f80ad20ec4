//! SQL text sent to the Management API and to `exec_sql`.
//!
//! Table and function names are interpolated into statement text, so every
//! interpolation goes through [`quote_literal`] or [`quote_ident`].

/// Generic SQL executor, callable over RPC by the service role.
pub const EXEC_SQL_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION exec_sql(query text)
RETURNS void
LANGUAGE plpgsql
SECURITY DEFINER
AS $$
BEGIN
  EXECUTE query;
END;
$$;

GRANT EXECUTE ON FUNCTION exec_sql(text) TO service_role;
"#;

/// Schema introspection function returning a `TableSchemaResult` as JSON.
pub const GET_TABLE_SCHEMA_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION get_table_schema(p_table_name text)
RETURNS json
LANGUAGE plpgsql
AS $$
DECLARE
    result json;
BEGIN
    SELECT json_build_object(
        'table_name', p_table_name,
        'columns', (
            SELECT json_agg(
                json_build_object(
                    'column_name', column_name,
                    'data_type', data_type,
                    'is_nullable', (is_nullable = 'YES')::boolean,
                    'column_default', COALESCE(column_default, '')
                )
                ORDER BY ordinal_position
            )
            FROM information_schema.columns
            WHERE table_schema = 'public'
              AND table_name = p_table_name
        )
    ) INTO result;

    RETURN result;
END;
$$;

GRANT EXECUTE ON FUNCTION get_table_schema(text) TO anon, authenticated;
"#;

/// Every function name in the `public` namespace, one row per overload.
pub const LIST_PUBLIC_FUNCTIONS: &str = r#"
SELECT p.proname AS function_name
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
WHERE n.nspname = 'public'
"#;

/// Columns exposed by a `<table>_schema` view.
pub const SCHEMA_VIEW_COLUMNS: &str = "column_name,data_type,is_nullable,column_default";

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote an identifier for PostgreSQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the per-table introspection view.
pub fn schema_view_name(table: &str) -> String {
    format!("{}_schema", table)
}

/// `[{"exists": bool}]` for a function in `public`.
pub fn function_exists_query(function: &str) -> String {
    format!(
        "SELECT COUNT(*) > 0 AS exists \
         FROM pg_catalog.pg_proc p \
         JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace \
         WHERE p.proname = {} \
         AND n.nspname = 'public'",
        quote_literal(function)
    )
}

/// View exposing `table`'s columns in ordinal order, readable by the API roles.
pub fn create_schema_view(table: &str) -> String {
    let view = quote_ident(&schema_view_name(table));
    format!(
        "CREATE OR REPLACE VIEW public.{view} AS
SELECT
    column_name,
    data_type,
    (is_nullable = 'YES')::boolean AS is_nullable,
    COALESCE(column_default, '') AS column_default
FROM information_schema.columns
WHERE table_schema = 'public'
  AND table_name = {table}
ORDER BY ordinal_position;

GRANT SELECT ON public.{view} TO anon, authenticated;
",
        view = view,
        table = quote_literal(table),
    )
}

pub fn drop_schema_view(table: &str) -> String {
    format!(
        "DROP VIEW IF EXISTS public.{} CASCADE;",
        quote_ident(&schema_view_name(table))
    )
}
