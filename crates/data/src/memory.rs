use anyhow::Result;
use async_trait::async_trait;
use signal_engine_core::{Signal, SignalStore};
use tokio::sync::RwLock;

/// Process-local signal history.
#[derive(Debug, Default)]
pub struct InMemorySignalStore {
    signals: RwLock<Vec<Signal>>,
}

impl InMemorySignalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.signals.read().await.is_empty()
    }

    /// Every stored signal in append order.
    pub async fn all(&self) -> Vec<Signal> {
        self.signals.read().await.clone()
    }
}

#[async_trait]
impl SignalStore for InMemorySignalStore {
    async fn append(&self, signal: &Signal) -> Result<()> {
        self.signals.write().await.push(signal.clone());
        Ok(())
    }

    async fn latest(&self, n: usize) -> Result<Vec<Signal>> {
        let signals = self.signals.read().await;
        let start = signals.len().saturating_sub(n);
        Ok(signals[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_engine_core::{SignalLevel, SignalType};

    fn signal(time: i64) -> Signal {
        Signal::new(SignalType::Buy, SignalLevel::Low, 1.0, time)
    }

    #[tokio::test]
    async fn latest_returns_tail_oldest_first() {
        let store = InMemorySignalStore::new();
        for t in 1..=5 {
            store.append(&signal(t)).await.unwrap();
        }
        let times: Vec<i64> = store.latest(3).await.unwrap().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![3, 4, 5]);
        assert_eq!(store.latest(50).await.unwrap().len(), 5);
        assert!(store.latest(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store() {
        let store = InMemorySignalStore::new();
        assert!(store.is_empty().await);
        assert!(store.latest(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_is_at_least_once() {
        let store = InMemorySignalStore::new();
        store.append(&signal(7)).await.unwrap();
        store.append(&signal(7)).await.unwrap();
        assert_eq!(store.len().await, 2);
    }
}
