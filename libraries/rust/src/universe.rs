use crate::errors::Error;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_UNIVERSE: &str = "popular";

const POPULAR: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "GOOGL", "GOOG", "AMZN", "META", "TSLA", "NFLX", "AMD", "CRM", "INTC",
    "ORCL", "ADBE", "CSCO", "AVGO", "JPM", "BAC", "WFC", "GS", "MS", "C", "AXP", "BLK", "JNJ",
    "PFE", "UNH", "ABBV", "MRK", "TMO", "ABT", "DHR", "KO", "PEP", "WMT", "HD", "MCD", "DIS",
    "NKE", "SBUX", "XOM", "CVX", "COP", "EOG", "SLB", "MPC", "VLO", "PSX",
];

const SP500_TOP50: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "GOOG", "META", "TSLA", "BRK-B", "LLY", "AVGO",
    "JPM", "WMT", "V", "UNH", "XOM", "MA", "PG", "JNJ", "HD", "CVX", "ABBV", "NFLX", "BAC", "KO",
    "CRM", "COST", "ASML", "MRK", "AMD", "PEP", "TMO", "LIN", "ACN", "CSCO", "ABT", "ADBE", "DHR",
    "TXN", "MCD", "VZ", "NEE", "ORCL", "WFC", "PM", "COP", "NVS", "BMY", "DIS", "INTC",
];

const CRYPTO_MINERS: &[&str] = &[
    "MSTR", "COIN", "MARA", "RIOT", "CLSK", "BITF", "HUT", "BTBT", "CAN", "ARGO", "EBON", "SOS",
    "ANY", "EBANG", "NCTY", "PHUN", "SDIG", "WULF", "IREN", "CORZ", "CIFR", "BTC", "GREE", "SPRT",
];

const BIOTECH: &[&str] = &[
    "GILD", "AMGN", "BIIB", "REGN", "VRTX", "ILMN", "MRNA", "BNTX", "SGEN", "ALNY", "BMRN", "TECH",
    "SRPT", "RARE", "BLUE", "FOLD", "ARWR", "EDIT", "CRSP", "NTLA", "BEAM", "PRME", "VCYT", "PACB",
];

const ENERGY_OIL: &[&str] = &[
    "XOM", "CVX", "COP", "EOG", "SLB", "HAL", "BKR", "OXY", "KMI", "WMB", "MPC", "VLO", "PSX",
    "HES", "DVN", "FANG", "APA", "EQT", "CNX", "RRC", "CLR", "MRO", "OVV", "SM",
];

const TECH_PURE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "GOOGL", "META", "TSLA", "CRM", "ORCL", "ADBE", "NOW", "INTU", "AMD",
    "QCOM", "INTC", "TXN", "LRCX", "KLAC", "AMAT", "MU", "NXPI", "MRVL", "ADI", "SNPS", "CDNS",
];

const BUILTIN_UNIVERSES: &[(&str, &[&str])] = &[
    ("popular", POPULAR),
    ("sp500_top50", SP500_TOP50),
    ("crypto_miners", CRYPTO_MINERS),
    ("biotech", BIOTECH),
    ("energy_oil", ENERGY_OIL),
    ("tech_pure", TECH_PURE),
];

/// Read-only table of named ticker universes, loaded once at start-up.
///
/// Lookups never fail: anything the table does not know resolves to the
/// `popular` universe, which every registry is guaranteed to hold.
#[derive(Debug, Clone)]
pub struct UniverseRegistry {
    universes: HashMap<String, Vec<String>>,
}

impl UniverseRegistry {
    pub fn builtin() -> Self {
        let universes = BUILTIN_UNIVERSES
            .iter()
            .map(|(name, tickers)| {
                (
                    name.to_string(),
                    tickers.iter().map(|ticker| ticker.to_string()).collect(),
                )
            })
            .collect();

        UniverseRegistry { universes }
    }

    pub fn from_table(table: BTreeMap<String, Vec<String>>) -> Result<Self, Error> {
        let mut universes = HashMap::with_capacity(table.len());

        for (name, tickers) in table {
            let mut seen = HashSet::new();

            let tickers: Vec<String> = tickers
                .iter()
                .map(|ticker| ticker.trim().to_uppercase())
                .filter(|ticker| !ticker.is_empty())
                .filter(|ticker| seen.insert(ticker.clone()))
                .collect();

            if tickers.is_empty() {
                return Err(Error::ConfigurationError(format!(
                    "Universe {} has no tickers",
                    name
                )));
            }

            universes.insert(name, tickers);
        }

        if !universes.contains_key(DEFAULT_UNIVERSE) {
            return Err(Error::ConfigurationError(format!(
                "Universe table must define {}",
                DEFAULT_UNIVERSE
            )));
        }

        Ok(UniverseRegistry { universes })
    }

    pub fn from_json(content: &str) -> Result<Self, Error> {
        let table: BTreeMap<String, Vec<String>> = serde_json::from_str(content)?;

        Self::from_table(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        info!("Loading universes from {}", path.display());

        let content = fs::read_to_string(path)?;

        Self::from_json(&content)
    }

    /// Ticker list for `name`, or the `popular` list when `name` is unknown.
    pub fn resolve(&self, name: &str) -> &[String] {
        self.universes
            .get(name)
            .or_else(|| self.universes.get(DEFAULT_UNIVERSE))
            .map(|tickers| tickers.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.universes.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.universes.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_universes() {
        let registry = UniverseRegistry::builtin();

        assert_eq!(
            registry.names(),
            vec![
                "biotech",
                "crypto_miners",
                "energy_oil",
                "popular",
                "sp500_top50",
                "tech_pure",
            ]
        );

        for name in registry.names() {
            let tickers = registry.resolve(&name);
            let unique: HashSet<&String> = tickers.iter().collect();

            assert!(tickers.len() >= 20 && tickers.len() <= 50, "{}", name);
            assert_eq!(unique.len(), tickers.len(), "{}", name);
            assert!(tickers.iter().all(|t| *t == t.to_uppercase()), "{}", name);
        }

        assert_eq!(registry.resolve("popular").len(), 48);
        assert_eq!(registry.resolve("sp500_top50").len(), 50);
        assert_eq!(registry.resolve("sp500_top50")[8], "BRK-B");
        assert_eq!(registry.resolve("tech_pure")[0], "AAPL");
    }

    #[test]
    fn test_unknown_universe_falls_back_to_popular() {
        let registry = UniverseRegistry::builtin();
        let popular = registry.resolve("popular").to_vec();

        for name in ["", "unknown", "POPULAR", "sp500"] {
            assert!(!registry.contains(name));
            assert_eq!(registry.resolve(name), popular.as_slice());
            assert_eq!(registry.resolve(name), registry.resolve(name));
        }
    }

    #[test]
    fn test_from_json_normalizes_tickers() {
        let registry = UniverseRegistry::from_json(
            r#"{"popular": ["aapl", " MSFT ", "AAPL", ""], "small": ["XYZ"]}"#,
        )
        .unwrap();

        assert_eq!(registry.resolve("popular"), ["AAPL", "MSFT"]);
        assert_eq!(registry.resolve("small"), ["XYZ"]);
        assert_eq!(registry.resolve("missing"), ["AAPL", "MSFT"]);
    }

    #[test]
    fn test_from_json_requires_popular() {
        let result = UniverseRegistry::from_json(r#"{"small": ["XYZ"]}"#);

        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_from_json_rejects_empty_universe() {
        let result = UniverseRegistry::from_json(r#"{"popular": ["AAPL"], "empty": [" "]}"#);

        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let result = UniverseRegistry::from_json(r#"["AAPL"]"#);

        assert!(matches!(result, Err(Error::SerdeError(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("universes-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{"popular": ["KO", "PEP"]}"#).unwrap();

        let registry = UniverseRegistry::from_file(&path).unwrap();

        assert_eq!(registry.resolve("anything"), ["KO", "PEP"]);

        fs::remove_file(&path).unwrap();

        let result = UniverseRegistry::from_file(&path);

        assert!(matches!(result, Err(Error::IOError(_))));
    }
}
