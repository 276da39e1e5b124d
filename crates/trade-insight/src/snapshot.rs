//! Record Snapshots
//!
//! A [`Snapshot`] is one consistent, immutable view of every loaded record,
//! indexed by user. Re-ingestion never edits a snapshot: it builds a new one
//! and swaps it into the [`SnapshotStore`] wholesale.

use std::collections::{BTreeMap, btree_map::Entry};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{InsightError, Result};
use crate::model::{HoldingRecord, ProfitLossRecord, SocialEdge, TradeRecord, User, UserId};

/// Flat record collections as a loader produces them
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotRecords {
    /// Time the records were captured; anchors every lookback window
    pub as_of: DateTime<Utc>,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub holdings: Vec<HoldingRecord>,

    #[serde(default)]
    pub trades: Vec<TradeRecord>,

    #[serde(default)]
    pub profit_loss: Vec<ProfitLossRecord>,

    #[serde(default)]
    pub edges: Vec<SocialEdge>,
}

/// Validated, user-indexed records
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecords", into = "SnapshotRecords")]
pub struct Snapshot {
    as_of: DateTime<Utc>,
    users: BTreeMap<UserId, User>,
    holdings: BTreeMap<UserId, Vec<HoldingRecord>>,
    trades: BTreeMap<UserId, Vec<TradeRecord>>,
    profit_loss: BTreeMap<UserId, ProfitLossRecord>,
    edges: Vec<SocialEdge>,
    outbound: BTreeMap<UserId, Vec<SocialEdge>>,
    inbound: BTreeMap<UserId, Vec<SocialEdge>>,
}

impl Snapshot {
    pub fn from_records(records: SnapshotRecords) -> Result<Self> {
        let mut users = BTreeMap::new();
        for user in records.users {
            match users.entry(user.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(InsightError::InvalidRecord(format!(
                        "user {} appears more than once",
                        user.id
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(user);
                }
            }
        }

        let mut holdings: BTreeMap<UserId, Vec<HoldingRecord>> = BTreeMap::new();
        for holding in records.holdings {
            if holding.quantity < Decimal::ZERO || holding.value < Decimal::ZERO {
                return Err(InsightError::InvalidRecord(format!(
                    "holding {} of {} has a negative quantity or value",
                    holding.symbol, holding.user
                )));
            }
            holdings.entry(holding.user.clone()).or_default().push(holding);
        }

        let mut trades: BTreeMap<UserId, Vec<TradeRecord>> = BTreeMap::new();
        for trade in records.trades {
            if trade.quantity < Decimal::ZERO || trade.value < Decimal::ZERO {
                return Err(InsightError::InvalidRecord(format!(
                    "{} trade of {} by {} has a negative quantity or value",
                    trade.action, trade.symbol, trade.user
                )));
            }
            trades.entry(trade.user.clone()).or_default().push(trade);
        }
        for log in trades.values_mut() {
            log.sort_by_key(|t| t.timestamp);
        }

        let mut profit_loss = BTreeMap::new();
        for pnl in records.profit_loss {
            match profit_loss.entry(pnl.user.clone()) {
                Entry::Occupied(_) => {
                    return Err(InsightError::InvalidRecord(format!(
                        "more than one profit/loss record for {}",
                        pnl.user
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(pnl);
                }
            }
        }

        let mut outbound: BTreeMap<UserId, Vec<SocialEdge>> = BTreeMap::new();
        let mut inbound: BTreeMap<UserId, Vec<SocialEdge>> = BTreeMap::new();
        for edge in &records.edges {
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(InsightError::InvalidRecord(format!(
                    "edge {} -> {} has invalid weight {}",
                    edge.source, edge.target, edge.weight
                )));
            }
            outbound.entry(edge.source.clone()).or_default().push(edge.clone());
            inbound.entry(edge.target.clone()).or_default().push(edge.clone());
        }

        Ok(Self {
            as_of: records.as_of,
            users,
            holdings,
            trades,
            profit_loss,
            edges: records.edges,
            outbound,
            inbound,
        })
    }

    pub const fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn holdings_for(&self, id: &UserId) -> &[HoldingRecord] {
        self.holdings.get(id).map_or(&[][..], Vec::as_slice)
    }

    /// Trades of one user, oldest first
    pub fn trades_for(&self, id: &UserId) -> &[TradeRecord] {
        self.trades.get(id).map_or(&[][..], Vec::as_slice)
    }

    pub const fn trades_by_user(&self) -> &BTreeMap<UserId, Vec<TradeRecord>> {
        &self.trades
    }

    pub fn profit_loss_for(&self, id: &UserId) -> Option<&ProfitLossRecord> {
        self.profit_loss.get(id)
    }

    pub fn edges(&self) -> &[SocialEdge] {
        &self.edges
    }

    /// Edges pointing at `id`
    pub fn inbound_edges(&self, id: &UserId) -> &[SocialEdge] {
        self.inbound.get(id).map_or(&[][..], Vec::as_slice)
    }

    /// Edges leaving `id`
    pub fn outbound_edges(&self, id: &UserId) -> &[SocialEdge] {
        self.outbound.get(id).map_or(&[][..], Vec::as_slice)
    }
}

impl TryFrom<SnapshotRecords> for Snapshot {
    type Error = InsightError;

    fn try_from(records: SnapshotRecords) -> Result<Self> {
        Self::from_records(records)
    }
}

impl From<Snapshot> for SnapshotRecords {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            as_of: snapshot.as_of,
            users: snapshot.users.into_values().collect(),
            holdings: snapshot.holdings.into_values().flatten().collect(),
            trades: snapshot.trades.into_values().flatten().collect(),
            profit_loss: snapshot.profit_loss.into_values().collect(),
            edges: snapshot.edges,
        }
    }
}

/// Version of the first snapshot a store holds
pub const INITIAL_VERSION: u64 = 1;

/// A snapshot together with the version it was installed under
#[derive(Clone, Debug)]
pub struct SnapshotHandle {
    pub version: u64,
    pub snapshot: Arc<Snapshot>,
}

/// Holds the current snapshot; replacement swaps the whole `Arc`
pub struct SnapshotStore {
    current: RwLock<SnapshotHandle>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(SnapshotHandle {
                version: INITIAL_VERSION,
                snapshot: Arc::new(snapshot),
            }),
        }
    }

    /// Cheap clone of the current snapshot; stays valid after a replace
    pub async fn current(&self) -> SnapshotHandle {
        self.current.read().await.clone()
    }

    pub async fn version(&self) -> u64 {
        self.current.read().await.version
    }

    /// Install a new snapshot and return its version
    pub async fn replace(&self, snapshot: Snapshot) -> u64 {
        let mut current = self.current.write().await;
        current.version += 1;
        current.snapshot = Arc::new(snapshot);
        tracing::info!(version = current.version, as_of = %current.snapshot.as_of(), "snapshot replaced");
        current.version
    }
}
