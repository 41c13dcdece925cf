use crate::domain::model::HIGH_INCOME_THRESHOLD;

pub const DEFAULT_TABLE: &str = "bank_mart.kpi_performance_geral";
pub const TOP_N: usize = 5;

pub const NAME_COLUMN: &str = "nome_completo";
pub const BALANCE_COLUMN: &str = "saldo_liquido";
pub const SEGMENT_COLUMN: &str = "segmento_cliente";

/// Builds the top-N ranking query. Every row is ranked; there is no balance floor.
pub fn build_ranking_query(table: &str) -> String {
    let table = if table.trim().is_empty() {
        DEFAULT_TABLE
    } else {
        table
    };

    format!(
        "SELECT \
            {name}, \
            (total_investido - total_divida_ativa) AS {balance}, \
            CASE \
                WHEN total_investido > {threshold} THEN 'Alta Renda' \
                ELSE 'Varejo' \
            END AS {segment} \
         FROM `{table}` \
         ORDER BY {balance} DESC \
         LIMIT {limit}",
        name = NAME_COLUMN,
        balance = BALANCE_COLUMN,
        segment = SEGMENT_COLUMN,
        threshold = HIGH_INCOME_THRESHOLD,
        table = quote_identifier(table),
        limit = TOP_N,
    )
}

// keeps the identifier inside its backtick quotes
fn quote_identifier(table: &str) -> String {
    table.replace('\\', "\\\\").replace('`', "\\`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_selects_ranked_columns() {
        let sql = build_ranking_query("bank_mart.kpi_performance_geral");
        assert!(sql.contains("FROM `bank_mart.kpi_performance_geral`"));
        assert!(sql.contains("(total_investido - total_divida_ativa) AS saldo_liquido"));
        assert!(sql.contains("WHEN total_investido > 50000 THEN 'Alta Renda'"));
        assert!(sql.contains("ELSE 'Varejo'"));
        assert!(sql.contains("ORDER BY saldo_liquido DESC"));
        assert!(sql.ends_with("LIMIT 5"));
    }

    #[test]
    fn test_query_never_filters_by_balance() {
        for table in ["bank_mart.kpi_performance_geral", "proj.ds.t", "x", "a`b", "WHERE"] {
            let sql = build_ranking_query(table);
            let upper = sql.to_uppercase();
            let outside_table = upper.replace(&format!("`{}`", quote_identifier(table).to_uppercase()), "");
            assert!(!outside_table.contains("WHERE"), "unexpected filter in {}", sql);
            assert!(!outside_table.contains("HAVING"));
        }
    }

    #[test]
    fn test_blank_table_falls_back_to_default() {
        assert_eq!(build_ranking_query("  "), build_ranking_query(DEFAULT_TABLE));
    }

    #[test]
    fn test_backticks_are_escaped() {
        let sql = build_ranking_query("evil` ; DROP TABLE x; --");
        assert!(sql.contains("FROM `evil\\` ; DROP TABLE x; --`"));
    }
}
