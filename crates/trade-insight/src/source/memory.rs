//! In-Memory Record Source
//!
//! For testing and demo purposes. Ships a small, fixed social network so the
//! CLI has something to recommend against without any data files.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::RecordSource;
use crate::error::{InsightError, Result};
use crate::model::{HoldingRecord, ProfitLossRecord, SocialEdge, TradeAction, TradeRecord, User};
use crate::snapshot::{Snapshot, SnapshotRecords};

/// Serves a copy of the records it was built with
pub struct InMemorySource {
    name: String,
    records: SnapshotRecords,
}

impl InMemorySource {
    pub fn new(records: SnapshotRecords) -> Self {
        Self {
            name: "memory".to_string(),
            records,
        }
    }

    /// Demo network centred on `BillSun`
    ///
    /// Every peer BillSun follows has been buying SOL this week, most of them
    /// are dumping DOGE, and LINK is split.
    pub fn demo() -> Result<Self> {
        let as_of = Utc
            .with_ymd_and_hms(2025, 2, 14, 12, 0, 0)
            .single()
            .ok_or_else(|| InsightError::Source("invalid demo timestamp".into()))?;

        let users = [
            ("BillSun", "@billsun"),
            ("DavidDev", "@daviddev"),
            ("AliceChain", "@alicechain"),
            ("CryptoKate", "@cryptokate"),
            ("EthanDeFi", "@ethandefi"),
            ("MiaNFT", "@mianft"),
            ("OscarOTC", "@oscarotc"),
        ]
        .into_iter()
        .map(|(id, handle)| User::new(id, handle))
        .collect();

        let holdings = vec![
            HoldingRecord::new("BillSun", "ETH", dec!(1.0), dec!(3450)),
            HoldingRecord::new("BillSun", "DOGE", dec!(1000), dec!(380)),
            HoldingRecord::new("BillSun", "LINK", dec!(10), dec!(245)),
            HoldingRecord::new("BillSun", "lucky money", dec!(500), dec!(12.50)),
            HoldingRecord::new("BillSun", "Fuji AVAX", dec!(2), Decimal::ZERO),
            HoldingRecord::new("DavidDev", "SOL", dec!(40), dec!(7800)),
            HoldingRecord::new("DavidDev", "ETH", dec!(3.5), dec!(12075)),
            HoldingRecord::new("AliceChain", "SOL", dec!(25), dec!(4875)),
            HoldingRecord::new("AliceChain", "BTC", dec!(0.2), dec!(19500)),
            HoldingRecord::new("CryptoKate", "ETH", dec!(2), dec!(6900)),
            HoldingRecord::new("CryptoKate", "LINK", dec!(120), dec!(2940)),
            HoldingRecord::new("EthanDeFi", "SOL", dec!(12), dec!(2340)),
            HoldingRecord::new("MiaNFT", "SOL", dec!(8), dec!(1560)),
            HoldingRecord::new("MiaNFT", "PEPE", dec!(50000000), dec!(610)),
            HoldingRecord::new("OscarOTC", "USDC", dec!(2500), dec!(2500)),
        ];

        let at = |days_ago: i64, hour: i64| as_of - Duration::days(days_ago) - Duration::hours(hour);
        let trade = |user: &str, symbol: &str, action, value: Decimal, ts: DateTime<Utc>| {
            TradeRecord::new(user, symbol, action, dec!(1), value, ts)
        };
        use TradeAction::{Buy, Sell};

        let trades = vec![
            trade("BillSun", "DOGE", Buy, dec!(380), at(30, 2)),
            trade("BillSun", "LINK", Buy, dec!(245), at(15, 5)),
            trade("BillSun", "ETH", Buy, dec!(3450), at(10, 1)),
            trade("DavidDev", "SOL", Buy, dec!(1950), at(1, 3)),
            trade("DavidDev", "ETH", Buy, dec!(3450), at(2, 0)),
            trade("DavidDev", "DOGE", Sell, dec!(760), at(1, 6)),
            trade("AliceChain", "SOL", Buy, dec!(975), at(3, 2)),
            trade("AliceChain", "ETH", Buy, dec!(1725), at(4, 1)),
            trade("AliceChain", "DOGE", Sell, dec!(190), at(2, 4)),
            trade("CryptoKate", "SOL", Buy, dec!(585), at(2, 7)),
            trade("CryptoKate", "ETH", Buy, dec!(3450), at(1, 1)),
            trade("CryptoKate", "DOGE", Sell, dec!(420), at(5, 0)),
            trade("CryptoKate", "LINK", Buy, dec!(490), at(3, 3)),
            trade("EthanDeFi", "SOL", Buy, dec!(390), at(6, 2)),
            trade("EthanDeFi", "LINK", Sell, dec!(245), at(2, 2)),
            trade("MiaNFT", "SOL", Buy, dec!(195), at(1, 8)),
            trade("MiaNFT", "DOGE", Sell, dec!(95), at(3, 1)),
            trade("MiaNFT", "PEPE", Buy, dec!(610), at(20, 0)),
            trade("OscarOTC", "USDC", Buy, dec!(2500), at(8, 0)),
        ];

        let profit_loss = vec![
            ProfitLossRecord::new("BillSun", dec!(420.75), dec!(180.20)),
            ProfitLossRecord::new("DavidDev", dec!(5120), dec!(880)),
            ProfitLossRecord::new("AliceChain", dec!(3890.50), dec!(-120)),
            ProfitLossRecord::new("CryptoKate", dec!(2210), dec!(940)),
            ProfitLossRecord::new("EthanDeFi", dec!(1500), dec!(310)),
            ProfitLossRecord::new("MiaNFT", dec!(640), dec!(-85.40)),
            ProfitLossRecord::new("OscarOTC", dec!(-300), dec!(25)),
        ];

        let edges = vec![
            SocialEdge::new("BillSun", "DavidDev", 3.0),
            SocialEdge::new("BillSun", "AliceChain", 2.0),
            SocialEdge::new("BillSun", "CryptoKate", 1.5),
            SocialEdge::new("BillSun", "EthanDeFi", 1.0),
            SocialEdge::new("BillSun", "MiaNFT", 0.5),
            SocialEdge::new("DavidDev", "AliceChain", 1.0),
            SocialEdge::new("CryptoKate", "DavidDev", 2.0),
            SocialEdge::new("MiaNFT", "CryptoKate", 1.0),
            SocialEdge::new("AliceChain", "BillSun", 1.0),
            SocialEdge::new("OscarOTC", "BillSun", 1.0),
        ];

        Ok(Self {
            name: "demo".to_string(),
            records: SnapshotRecords {
                as_of,
                users,
                holdings,
                trades,
                profit_loss,
                edges,
            },
        })
    }

    pub fn records(&self) -> &SnapshotRecords {
        &self.records
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn load(&self) -> Result<Snapshot> {
        Snapshot::from_records(self.records.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
