//! Header resolution for report tables.
//!
//! Column names and positions change between report types and schema
//! versions, so each semantic role is located by normalized substring match
//! instead of by fixed position. A role that cannot be located resolves to
//! `None` and readers fall back to an empty value.

use std::collections::HashMap;

/// Semantic column of a sales or subscription report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Units,
    CustomerPrice,
    DeveloperProceeds,
    ProductType,
    CountryCode,
    ProceedsCurrency,
    CustomerCurrency,
    Subscription,
    Period,
    Title,
    Sku,
    AppleIdentifier,
    ParentIdentifier,
    Device,
    Version,
    BeginDate,
    OrderType,
    PromoCode,
    Category,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 19] = [
        ColumnRole::Units,
        ColumnRole::CustomerPrice,
        ColumnRole::DeveloperProceeds,
        ColumnRole::ProductType,
        ColumnRole::CountryCode,
        ColumnRole::ProceedsCurrency,
        ColumnRole::CustomerCurrency,
        ColumnRole::Subscription,
        ColumnRole::Period,
        ColumnRole::Title,
        ColumnRole::Sku,
        ColumnRole::AppleIdentifier,
        ColumnRole::ParentIdentifier,
        ColumnRole::Device,
        ColumnRole::Version,
        ColumnRole::BeginDate,
        ColumnRole::OrderType,
        ColumnRole::PromoCode,
        ColumnRole::Category,
    ];

    /// Normalized header fragments, most specific first.
    fn patterns(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Units => &["units", "quantity"],
            ColumnRole::CustomerPrice => &["customerprice"],
            ColumnRole::DeveloperProceeds => &["developerproceeds", "proceeds"],
            ColumnRole::ProductType => &["producttypeidentifier", "producttype"],
            ColumnRole::CountryCode => &["countrycode", "country"],
            ColumnRole::ProceedsCurrency => &["currencyofproceeds", "proceedscurrency"],
            ColumnRole::CustomerCurrency => &["customercurrency"],
            ColumnRole::Subscription => &["subscription"],
            ColumnRole::Period => &["subscriptionduration", "period", "duration"],
            ColumnRole::Title => &["title", "appname"],
            ColumnRole::Sku => &["sku"],
            ColumnRole::AppleIdentifier => &["appleidentifier", "appleid"],
            ColumnRole::ParentIdentifier => &["parentidentifier"],
            ColumnRole::Device => &["device"],
            ColumnRole::Version => &["version"],
            ColumnRole::BeginDate => &["begindate", "eventdate", "date"],
            ColumnRole::OrderType => &["ordertype"],
            ColumnRole::PromoCode => &["promocode", "promotionalofferid"],
            ColumnRole::Category => &["category"],
        }
    }

    /// Fragments that disqualify an otherwise matching header.
    fn exclusions(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::DeveloperProceeds => &["currency", "reason"],
            ColumnRole::Period => &["consecutive", "offer", "optin"],
            _ => &[],
        }
    }

    fn matches(&self, normalized_cell: &str, pattern: &str) -> bool {
        normalized_cell.contains(pattern)
            && !self
                .exclusions()
                .iter()
                .any(|excluded| normalized_cell.contains(excluded))
    }
}

/// Lowercases and removes every whitespace character.
pub fn normalize_header(cell: &str) -> String {
    cell.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Role → zero-based column position for one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndexMap {
    positions: HashMap<ColumnRole, usize>,
}

impl ColumnIndexMap {
    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        self.positions.get(&role).copied()
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.positions.contains_key(&role)
    }

    /// Trimmed value of `role` in `fields`, or `""` when the role is
    /// unresolved or the row is shorter than the header.
    pub fn value<'a>(&self, role: ColumnRole, fields: &'a [String]) -> &'a str {
        self.index(role)
            .and_then(|i| fields.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    pub fn unresolved(&self) -> Vec<ColumnRole> {
        ColumnRole::ALL
            .iter()
            .copied()
            .filter(|role| !self.contains(*role))
            .collect()
    }
}

/// Builds the [`ColumnIndexMap`] for a header row.
pub fn resolve(header_fields: &[String]) -> ColumnIndexMap {
    let normalized: Vec<String> = header_fields.iter().map(|h| normalize_header(h)).collect();
    let mut positions = HashMap::new();

    for role in ColumnRole::ALL {
        let found = role
            .patterns()
            .iter()
            .find_map(|pattern| normalized.iter().position(|cell| role.matches(cell, pattern)));
        if let Some(index) = found {
            positions.insert(role, index);
        }
    }

    ColumnIndexMap { positions }
}
