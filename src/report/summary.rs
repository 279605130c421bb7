use super::aggregate::AggregatedRecord;

pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKey {
    Address,
    Owner,
    MarketValue,
    YearBuilt,
    LandArea,
}

impl SummaryKey {
    pub const ALL: [SummaryKey; 5] = [
        SummaryKey::Address,
        SummaryKey::Owner,
        SummaryKey::MarketValue,
        SummaryKey::YearBuilt,
        SummaryKey::LandArea,
    ];

    /// Canonical field the key is read from.
    pub fn field(self) -> &'static str {
        match self {
            SummaryKey::Address => "Address Line 1",
            SummaryKey::Owner => "Owner Name(s)",
            SummaryKey::MarketValue => "Current Market Value",
            SummaryKey::YearBuilt => "Year of Construction",
            SummaryKey::LandArea => "Land Area(Acre)",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SummaryKey::Address => "Property Address",
            SummaryKey::Owner => "Owner",
            SummaryKey::MarketValue => "Market Value",
            SummaryKey::YearBuilt => "Year Built",
            SummaryKey::LandArea => "Land Area",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub address: String,
    pub owner: String,
    pub market_value: String,
    pub year_built: String,
    pub land_area: String,
}

impl Summary {
    /// First matching entry per key, `N/A` when the record lacks the field.
    pub fn extract(record: &AggregatedRecord) -> Self {
        let lookup = |key: SummaryKey| {
            record
                .first_value(key.field())
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        Summary {
            address: lookup(SummaryKey::Address),
            owner: lookup(SummaryKey::Owner),
            market_value: lookup(SummaryKey::MarketValue),
            year_built: lookup(SummaryKey::YearBuilt),
            land_area: lookup(SummaryKey::LandArea),
        }
    }

    /// Show the address the user searched for instead of the site address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn get(&self, key: SummaryKey) -> &str {
        match key {
            SummaryKey::Address => &self.address,
            SummaryKey::Owner => &self.owner,
            SummaryKey::MarketValue => &self.market_value,
            SummaryKey::YearBuilt => &self.year_built,
            SummaryKey::LandArea => &self.land_area,
        }
    }

    pub fn entries(&self) -> [(SummaryKey, &str); 5] {
        SummaryKey::ALL.map(|k| (k, self.get(k)))
    }
}

// ── Tests ──
