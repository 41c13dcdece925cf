use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// Invested amount above which a customer is `HighIncome` (strictly greater).
pub const HIGH_INCOME_THRESHOLD: i64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    HighIncome,
    Retail,
}

impl Segment {
    pub fn classify(invested: Decimal) -> Self {
        if invested > Decimal::from(HIGH_INCOME_THRESHOLD) {
            Segment::HighIncome
        } else {
            Segment::Retail
        }
    }

    /// Label emitted by the ranking query and shown in the report.
    pub fn label(&self) -> &'static str {
        match self {
            Segment::HighIncome => "Alta Renda",
            Segment::Retail => "Varejo",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Alta Renda" | "HighIncome" => Some(Segment::HighIncome),
            "Varejo" | "Retail" => Some(Segment::Retail),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Invested amount minus outstanding debt, kept exact (NUMERIC cells are decimal text).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NetBalance(pub Decimal);

impl fmt::Display for NetBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub full_name: Option<String>,
    pub net_balance: NetBalance,
    pub segment: Segment,
}

impl CustomerRecord {
    /// Recomputes balance and segment locally, the same way the ranking query does.
    pub fn from_account(
        full_name: Option<String>,
        invested: Decimal,
        outstanding_debt: Decimal,
    ) -> Self {
        Self {
            full_name,
            net_balance: NetBalance(invested - outstanding_debt),
            segment: Segment::classify(invested),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "nome")]
    pub display_name: String,
    #[serde(rename = "saldo")]
    pub net_balance: NetBalance,
    #[serde(rename = "categoria")]
    pub segment: Segment,
}
