//! In-memory daemon for handler tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::daemon::TorrentDaemon;
use super::sort::SortSpec;
use super::types::{AddedTorrent, Torrent};
use crate::error::{Error, Result};

/// Records every call and answers from scripted state.
#[derive(Default)]
pub(crate) struct FakeDaemon {
    pub torrents: BTreeMap<i64, Torrent>,
    /// Ids whose action call fails with an RPC error.
    pub rpc_failures: HashSet<i64>,
    /// Ids whose action succeeds but which are gone by the lookup.
    pub vanishing: HashSet<i64>,
    pub bulk_fails: bool,
    pub add_results: HashMap<String, std::result::Result<AddedTorrent, String>>,
    pub version: String,
    pub sort: SortSpec,
    calls: Mutex<Vec<String>>,
}

impl FakeDaemon {
    pub fn with_torrents(names: &[(i64, &str)]) -> Self {
        let mut fake = Self {
            version: "4.0.5".to_string(),
            ..Self::default()
        };
        for (id, name) in names {
            fake.torrents.insert(
                *id,
                Torrent {
                    id: *id,
                    name: name.to_string(),
                    ..Torrent::default()
                },
            );
        }
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn action(&self, name: &str, id: i64) -> Result<String> {
        self.record(format!("{} {}", name, id));
        if self.rpc_failures.contains(&id) {
            return Err(Error::Rpc(format!("{} failed for {}", name, id)));
        }
        Ok("success".to_string())
    }

    fn bulk(&self, name: &str) -> Result<()> {
        self.record(format!("{} all", name));
        if self.bulk_fails {
            return Err(Error::Rpc("some torrents failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TorrentDaemon for FakeDaemon {
    async fn stop_all(&self) -> Result<()> {
        self.bulk("stop")
    }

    async fn start_all(&self) -> Result<()> {
        self.bulk("start")
    }

    async fn verify_all(&self) -> Result<()> {
        self.bulk("verify")
    }

    async fn stop_torrent(&self, id: i64) -> Result<String> {
        self.action("stop", id)
    }

    async fn start_torrent(&self, id: i64) -> Result<String> {
        self.action("start", id)
    }

    async fn verify_torrent(&self, id: i64) -> Result<String> {
        self.action("verify", id)
    }

    async fn delete_torrent(&self, id: i64, delete_data: bool) -> Result<String> {
        self.record(format!("delete {} data={}", id, delete_data));
        if self.rpc_failures.contains(&id) {
            return Err(Error::Rpc(format!("delete failed for {}", id)));
        }
        self.torrents
            .get(&id)
            .map(|t| t.name.clone())
            .ok_or_else(|| Error::NotFound(format!("no torrent with an ID of {}", id)))
    }

    async fn get_torrent(&self, id: i64) -> Result<Torrent> {
        self.record(format!("get {}", id));
        if self.vanishing.contains(&id) {
            return Err(Error::NotFound(format!("no torrent with an ID of {}", id)));
        }
        self.torrents
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no torrent with an ID of {}", id)))
    }

    async fn add_by_url(&self, url: &str) -> Result<AddedTorrent> {
        self.record(format!("add {}", url));
        match self.add_results.get(url) {
            Some(Ok(added)) => Ok(added.clone()),
            Some(Err(e)) => Err(Error::Rpc(e.clone())),
            None => Ok(AddedTorrent::default()),
        }
    }

    async fn version(&self) -> Result<String> {
        self.record("version".to_string());
        Ok(self.version.clone())
    }

    async fn list_torrents(&self) -> Result<Vec<Torrent>> {
        self.record("list".to_string());
        let mut torrents: Vec<Torrent> = self.torrents.values().cloned().collect();
        self.sort.apply(&mut torrents);
        Ok(torrents)
    }

    fn set_sort(&mut self, spec: SortSpec) {
        self.record(format!("sort {} rev={}", spec.field, spec.reversed));
        self.sort = spec;
    }
}
