use serde::Deserialize;

/// One row of the `/coins/markets` response
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MarketsItem {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub price_change_percentage_1h_in_currency: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
    pub ath: Option<f64>,
    pub ath_change_percentage: Option<f64>,
    pub atl: Option<f64>,
    pub atl_change_percentage: Option<f64>,
    pub sparkline_in_7d: Option<SparklineIn7d>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SparklineIn7d {
    #[serde(default)]
    pub price: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
pub struct SearchCoin {
    pub id: String,
}

/// UI-ready view of a single asset
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,

    pub price: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,

    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,

    pub supply_circulating: Option<f64>,
    /// None when the total supply is unknown
    pub supply_total: Option<f64>,
    /// None for uncapped assets
    pub supply_max: Option<f64>,

    pub ath: Option<f64>,
    pub ath_change_pct: Option<f64>,
    pub atl: Option<f64>,
    pub atl_change_pct: Option<f64>,

    /// Trailing 7 days of prices, oldest first; missing samples are NaN so
    /// the rest keep their place in time
    pub sparkline_7d: Vec<f64>,

    pub rank: Option<u32>,
    pub change_1h_pct: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub change_7d_pct: Option<f64>,
}

impl MarketRecord {
    pub fn badge(&self) -> Option<String> {
        self.rank.map(|rank| format!("Rank #{}", rank))
    }

    /// Short summary of the recent changes, e.g. `24h +2.10% | 7d -3.40%`
    pub fn notes(&self) -> String {
        [("24h", self.change_24h_pct), ("7d", self.change_7d_pct)]
            .iter()
            .filter_map(|(label, pct)| pct.map(|p| format!("{} {:+.2}%", label, p)))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl From<MarketsItem> for MarketRecord {
    fn from(item: MarketsItem) -> Self {
        let sparkline_7d = item
            .sparkline_in_7d
            .map(|s| s.price.into_iter().map(|p| p.unwrap_or(f64::NAN)).collect())
            .unwrap_or_default();

        MarketRecord {
            id: item.id,
            name: item.name,
            symbol: item.symbol.to_uppercase(),
            image: item.image.filter(|url| !url.is_empty()),
            price: item.current_price,
            high_24h: item.high_24h,
            low_24h: item.low_24h,
            market_cap: item.market_cap,
            volume_24h: item.total_volume,
            supply_circulating: item.circulating_supply,
            supply_total: item.total_supply,
            supply_max: item.max_supply,
            ath: item.ath,
            ath_change_pct: item.ath_change_percentage,
            atl: item.atl,
            atl_change_pct: item.atl_change_percentage,
            sparkline_7d,
            rank: item.market_cap_rank.filter(|rank| *rank > 0),
            change_1h_pct: item.price_change_percentage_1h_in_currency,
            change_24h_pct: item.price_change_percentage_24h,
            change_7d_pct: item.price_change_percentage_7d_in_currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITCOIN_ROW: &str = r#"{
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        "current_price": 64123.45,
        "market_cap": 1263000000000,
        "market_cap_rank": 1,
        "total_volume": 28500000000,
        "high_24h": 65010.0,
        "low_24h": 63200.5,
        "circulating_supply": 19700000.0,
        "total_supply": 21000000.0,
        "max_supply": 21000000.0,
        "price_change_percentage_24h": 2.1,
        "price_change_percentage_1h_in_currency": -0.12,
        "price_change_percentage_7d_in_currency": -3.4,
        "ath": 73738.0,
        "ath_change_percentage": -13.04,
        "atl": 67.81,
        "atl_change_percentage": 94460.1,
        "sparkline_in_7d": { "price": [63000.1, 63500.2, null, 64123.45] }
    }"#;

    #[test]
    fn test_normalizes_markets_row() {
        let item: MarketsItem = serde_json::from_str(BITCOIN_ROW).unwrap();
        let record = MarketRecord::from(item);

        assert_eq!(record.id, "bitcoin");
        assert_eq!(record.symbol, "BTC");
        assert_eq!(record.price, Some(64123.45));
        assert_eq!(record.volume_24h, Some(28_500_000_000.0));
        assert_eq!(record.supply_max, Some(21_000_000.0));
        assert_eq!(record.change_1h_pct, Some(-0.12));
        assert_eq!(record.sparkline_7d.len(), 4);
        assert_eq!(record.sparkline_7d[..2], [63000.1, 63500.2]);
        assert!(record.sparkline_7d[2].is_nan());
        assert_eq!(record.sparkline_7d[3], 64123.45);
        assert_eq!(record.badge().as_deref(), Some("Rank #1"));
        assert_eq!(record.notes(), "24h +2.10% | 7d -3.40%");
    }

    #[test]
    fn test_tolerates_nulls_and_missing_fields() {
        let raw = r#"{
            "id": "fresh-token",
            "symbol": "fresh",
            "name": "Fresh Token",
            "image": "",
            "current_price": 0.00000456,
            "market_cap_rank": null,
            "total_supply": null,
            "max_supply": null,
            "price_change_percentage_24h": null
        }"#;
        let record = MarketRecord::from(serde_json::from_str::<MarketsItem>(raw).unwrap());

        assert_eq!(record.price, Some(0.00000456));
        assert_eq!(record.image, None);
        assert_eq!(record.supply_total, None);
        assert_eq!(record.supply_max, None);
        assert_eq!(record.ath, None);
        assert!(record.sparkline_7d.is_empty());
        assert_eq!(record.badge(), None);
        assert_eq!(record.notes(), "");
    }

    #[test]
    fn test_rank_zero_is_absent() {
        let item = MarketsItem {
            id: "x".into(),
            market_cap_rank: Some(0),
            ..MarketsItem::default()
        };
        assert_eq!(MarketRecord::from(item).rank, None);
    }

    #[test]
    fn test_notes_skip_missing_changes() {
        let record = MarketRecord {
            change_7d_pct: Some(12.0),
            ..MarketRecord::default()
        };
        assert_eq!(record.notes(), "7d +12.00%");
    }

    #[test]
    fn test_search_response_ids() {
        let raw = r#"{"coins":[{"id":"pepe","name":"Pepe"},{"id":"pepecoin"}],"exchanges":[]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let ids: Vec<&str> = parsed.coins.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["pepe", "pepecoin"]);
    }
}
