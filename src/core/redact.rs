use crate::domain::model::{CustomerRecord, ReportRow};

/// Whether identity fields leave the process in full or abbreviated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedactionPolicy {
    #[default]
    Masked,
    AllowPii,
}

impl RedactionPolicy {
    pub fn from_allow_pii(allow_pii: bool) -> Self {
        if allow_pii {
            RedactionPolicy::AllowPii
        } else {
            RedactionPolicy::Masked
        }
    }

    pub fn display_name(&self, full_name: Option<&str>) -> String {
        match self {
            RedactionPolicy::AllowPii => full_name.unwrap_or_default().to_string(),
            RedactionPolicy::Masked => mask_name(full_name),
        }
    }
}

/// `"Maria Silva Santos"` becomes `"Maria S."`; single names are kept as-is.
///
/// A name with no tokens at all (empty or blank) is returned unchanged.
pub fn mask_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };

    let mut tokens = name.split(is_name_separator).filter(|t| !t.is_empty());
    let Some(first) = tokens.next() else {
        return name.to_string();
    };

    match tokens.next().and_then(|second| second.chars().next()) {
        Some(initial) => format!("{} {}.", first, initial),
        None => first.to_string(),
    }
}

// ASCII whitespace including vertical tab; U+00A0 and other Unicode spaces stay inside a token
fn is_name_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Applies the policy to each record, keeping the warehouse order.
pub fn to_report_rows(records: &[CustomerRecord], policy: RedactionPolicy) -> Vec<ReportRow> {
    records
        .iter()
        .map(|record| ReportRow {
            display_name: policy.display_name(record.full_name.as_deref()),
            net_balance: record.net_balance,
            segment: record.segment,
        })
        .collect()
}
