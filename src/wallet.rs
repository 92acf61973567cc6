use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::error::BlinkError;
use crate::history::{self, BlinkHistoryRecord, HistoryStats, HistoryStore};
use crate::link::GeneratedLink;

/// Injected wallet. Accounts are ordered; the first one is the active account.
pub trait WalletProvider {
    /// Accounts already authorized, without prompting.
    fn accounts(&self) -> impl Future<Output = Result<Vec<String>, BlinkError>> + Send;

    /// Asks the user to authorize accounts.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<String>, BlinkError>> + Send;

    /// Account-change notifications. An empty list means the wallet disconnected.
    fn subscribe(&self) -> broadcast::Receiver<Vec<String>>;
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Dashboard state for whichever account the wallet currently exposes.
pub struct DashboardSession<W, S> {
    wallet: W,
    store: S,
    address: Option<String>,
    records: Vec<BlinkHistoryRecord>,
}

impl<W: WalletProvider, S: HistoryStore> DashboardSession<W, S> {
    pub fn new(wallet: W, store: S) -> Self {
        Self {
            wallet,
            store,
            address: None,
            records: Vec::new(),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn display_address(&self) -> Option<String> {
        self.address.as_deref().map(short_address)
    }

    pub fn records(&self) -> &[BlinkHistoryRecord] {
        &self.records
    }

    pub fn stats(&self, now: DateTime<Utc>) -> HistoryStats {
        HistoryStats::compute(&self.records, now)
    }

    /// Picks up an already-authorized account, if any.
    pub async fn connect(&mut self) -> Result<Option<&str>, BlinkError> {
        let accounts = self.wallet.accounts().await?;
        self.apply_accounts(accounts).await?;
        Ok(self.address())
    }

    /// Prompts the wallet for access, then behaves like [`connect`](Self::connect).
    pub async fn request_access(&mut self) -> Result<Option<&str>, BlinkError> {
        let accounts = self.wallet.request_accounts().await?;
        self.apply_accounts(accounts).await?;
        Ok(self.address())
    }

    pub async fn apply_accounts(&mut self, accounts: Vec<String>) -> Result<(), BlinkError> {
        let Some(first) = accounts.into_iter().next() else {
            tracing::info!("wallet disconnected");
            self.address = None;
            self.records.clear();
            return Ok(());
        };

        // Unreadable history shows as empty rather than failing the switch.
        self.records = match self.store.load(&first).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(address = %first, "loading history: {e}");
                Vec::new()
            }
        };
        self.address = Some(first);
        Ok(())
    }

    /// Waits for the next account change and applies it.
    /// Returns `false` once the wallet's channel is closed.
    pub async fn next_change(
        &mut self,
        rx: &mut broadcast::Receiver<Vec<String>>,
    ) -> Result<bool, BlinkError> {
        loop {
            match rx.recv().await {
                Ok(accounts) => {
                    self.apply_accounts(accounts).await?;
                    return Ok(true);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "account events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(false),
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.wallet.subscribe()
    }

    /// Saves a freshly generated link under the active account.
    pub async fn record(
        &mut self,
        platform: &str,
        link: &GeneratedLink,
        at: DateTime<Utc>,
    ) -> Result<(), BlinkError> {
        let Some(address) = self.address.clone() else {
            return Err(BlinkError::missing("wallet address"));
        };
        let rec = BlinkHistoryRecord::new(platform, link, at);
        self.records = history::append(&self.store, &address, rec).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use std::sync::Mutex;

    const ALICE: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
    const BOB: &str = "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF";

    struct FakeWallet {
        authorized: Mutex<Vec<String>>,
        grant: Vec<String>,
        events: broadcast::Sender<Vec<String>>,
    }

    impl FakeWallet {
        fn new(authorized: &[&str]) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                authorized: Mutex::new(authorized.iter().map(|s| s.to_string()).collect()),
                grant: vec![ALICE.to_string()],
                events,
            }
        }
    }

    impl WalletProvider for FakeWallet {
        async fn accounts(&self) -> Result<Vec<String>, BlinkError> {
            Ok(self.authorized.lock().unwrap().clone())
        }

        async fn request_accounts(&self) -> Result<Vec<String>, BlinkError> {
            let mut a = self.authorized.lock().unwrap();
            *a = self.grant.clone();
            Ok(a.clone())
        }

        fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
            self.events.subscribe()
        }
    }

    fn link(n: u32) -> GeneratedLink {
        GeneratedLink {
            display_url: format!("https://relay.test/dapp/nav1?url=x&t={n}"),
            actual_url: format!("https://relay.test/dapp/nav1?url=x&t={n}"),
        }
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        assert_eq!(short_address(ALICE), "0x71C7...976F");
        assert_eq!(short_address("0x1234"), "0x1234");
    }

    #[tokio::test]
    async fn connect_without_accounts_stays_empty() {
        let mut s = DashboardSession::new(FakeWallet::new(&[]), MemoryHistoryStore::new());
        assert_eq!(s.connect().await.unwrap(), None);
        assert!(s.display_address().is_none());
    }

    #[tokio::test]
    async fn request_access_connects_granted_account() {
        let mut s = DashboardSession::new(FakeWallet::new(&[]), MemoryHistoryStore::new());
        assert_eq!(s.request_access().await.unwrap(), Some(ALICE));
    }

    #[tokio::test]
    async fn records_are_loaded_for_connected_account() {
        let store = MemoryHistoryStore::new();
        let now = Utc::now();
        history::append(&store, ALICE, BlinkHistoryRecord::new("muses", &link(1), now))
            .await
            .unwrap();

        let mut s = DashboardSession::new(FakeWallet::new(&[ALICE]), store);
        s.connect().await.unwrap();
        assert_eq!(s.records().len(), 1);
        assert_eq!(s.stats(now).muses_blinks, 1);
    }

    #[tokio::test]
    async fn account_change_switches_history() {
        let wallet = FakeWallet::new(&[ALICE]);
        let events = wallet.events.clone();
        let mut s = DashboardSession::new(wallet, MemoryHistoryStore::new());
        s.connect().await.unwrap();
        s.record("guardian", &link(1), Utc::now()).await.unwrap();
        assert_eq!(s.records().len(), 1);

        let mut rx = s.subscribe();
        events.send(vec![BOB.to_string()]).unwrap();
        assert!(s.next_change(&mut rx).await.unwrap());
        assert_eq!(s.address(), Some(BOB));
        assert!(s.records().is_empty());

        events.send(vec![ALICE.to_string()]).unwrap();
        s.next_change(&mut rx).await.unwrap();
        assert_eq!(s.records().len(), 1);
    }

    #[tokio::test]
    async fn disconnect_clears_state() {
        let wallet = FakeWallet::new(&[ALICE]);
        let events = wallet.events.clone();
        let mut s = DashboardSession::new(wallet, MemoryHistoryStore::new());
        s.connect().await.unwrap();
        s.record("muses", &link(1), Utc::now()).await.unwrap();

        let mut rx = s.subscribe();
        events.send(Vec::new()).unwrap();
        s.next_change(&mut rx).await.unwrap();
        assert!(s.address().is_none());
        assert!(s.records().is_empty());
        assert_eq!(s.stats(Utc::now()).total_blinks, 0);
    }

    #[tokio::test]
    async fn closed_channel_ends_watch() {
        let mut s = DashboardSession::new(FakeWallet::new(&[ALICE]), MemoryHistoryStore::new());
        let (tx, mut rx) = broadcast::channel::<Vec<String>>(1);
        drop(tx);
        assert!(!s.next_change(&mut rx).await.unwrap());
    }

    #[tokio::test]
    async fn record_requires_connected_account() {
        let mut s = DashboardSession::new(FakeWallet::new(&[]), MemoryHistoryStore::new());
        let err = s.record("muses", &link(1), Utc::now()).await.unwrap_err();
        assert!(matches!(err, BlinkError::MissingParameter(_)));
    }
}
