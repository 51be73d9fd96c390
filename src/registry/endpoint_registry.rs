//! Shared endpoint state
//!
//! The registry holds the single current verdict per endpoint plus a
//! bounded alert log. Verdicts are replaced atomically per key, so
//! concurrent passes for different endpoints never block each other and
//! readers never observe a half-written verdict. The alert log is a
//! single shared sequence guarded by a mutex around append and evict.

use crate::events::{Alert, Verdict};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};

/// Consistent point-in-time view of the registry
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Current verdict per endpoint id
    pub verdicts: HashMap<String, Verdict>,
    /// Most recent alerts, oldest first
    pub alerts: Vec<Alert>,
}

/// Current verdicts and a bounded alert log, shared across passes
pub struct EndpointRegistry {
    verdicts: RwLock<HashMap<String, Verdict>>,
    alerts: Mutex<VecDeque<Alert>>,
    alert_capacity: usize,
}

impl EndpointRegistry {
    /// Create a registry retaining at most `alert_capacity` alerts
    pub fn new(alert_capacity: usize) -> Self {
        Self {
            verdicts: RwLock::new(HashMap::new()),
            alerts: Mutex::new(VecDeque::with_capacity(alert_capacity)),
            alert_capacity,
        }
    }

    /// Replace the endpoint's current verdict, last writer wins
    pub fn upsert(&self, verdict: Verdict) {
        self.verdicts
            .write()
            .unwrap()
            .insert(verdict.endpoint_id.clone(), verdict);
    }

    /// Current verdict for one endpoint, if any pass has completed
    pub fn verdict(&self, endpoint_id: &str) -> Option<Verdict> {
        self.verdicts.read().unwrap().get(endpoint_id).cloned()
    }

    /// Append an alert, evicting the oldest when over capacity
    pub fn append_alert(&self, alert: Alert) {
        let mut alerts = self.alerts.lock().unwrap();
        if alerts.len() >= self.alert_capacity {
            alerts.pop_front();
        }
        alerts.push_back(alert);
    }

    /// Number of alerts currently retained
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    /// Point-in-time copy of all verdicts and retained alerts
    pub fn snapshot(&self) -> RegistrySnapshot {
        let verdicts = self.verdicts.read().unwrap().clone();
        let alerts = self.alerts.lock().unwrap().iter().cloned().collect();
        RegistrySnapshot { verdicts, alerts }
    }
}
