//! In-memory bag store
//!
//! Thread-safe, backed by `RwLock<HashMap>`. Reads go through
//! `read_tiddlers`/`read_tiddler`, which enforce the bag's read policy.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use privateer_domain::Usersign;
use shared::BagConfig;

use crate::error::{BagError, Result};
use crate::model::{Bag, Policy, PolicyOp, Tiddler};

#[derive(Debug)]
struct StoredBag {
    bag: Bag,
    tiddlers: BTreeMap<String, Tiddler>,
}

#[derive(Debug, Default)]
pub struct BagStore {
    bags: RwLock<HashMap<String, StoredBag>>,
}

fn lock_error() -> BagError {
    BagError::Storage("bag store lock poisoned".to_string())
}

impl BagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured bags and their tiddlers
    pub fn from_config(bags: &[BagConfig]) -> Result<Self> {
        let store = Self::new();
        for config in bags {
            store.put_bag(Bag::new(config.name.clone(), Policy::from(&config.policy)))?;
            for tiddler in &config.tiddlers {
                store.put_tiddler(Tiddler::from_config(&config.name, tiddler))?;
            }
        }
        Ok(store)
    }

    /// Create a bag, or replace the policy of an existing one
    pub fn put_bag(&self, bag: Bag) -> Result<()> {
        let mut bags = self.bags.write().map_err(|_| lock_error())?;
        match bags.get_mut(&bag.name) {
            Some(stored) => stored.bag = bag,
            None => {
                tracing::debug!(bag = %bag.name, "bag created");
                bags.insert(
                    bag.name.clone(),
                    StoredBag {
                        bag,
                        tiddlers: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Store a tiddler in its (existing) bag
    pub fn put_tiddler(&self, tiddler: Tiddler) -> Result<()> {
        let mut bags = self.bags.write().map_err(|_| lock_error())?;
        let stored = bags
            .get_mut(&tiddler.bag)
            .ok_or_else(|| BagError::NoSuchBag(tiddler.bag.clone()))?;
        stored.tiddlers.insert(tiddler.title.clone(), tiddler);
        Ok(())
    }

    pub fn bag(&self, name: &str) -> Result<Bag> {
        let bags = self.bags.read().map_err(|_| lock_error())?;
        bags.get(name)
            .map(|stored| stored.bag.clone())
            .ok_or_else(|| BagError::NoSuchBag(name.to_string()))
    }

    /// All tiddlers in `bag`, ordered by title, if `usersign` may read it
    pub fn read_tiddlers(&self, bag: &str, usersign: &Usersign) -> Result<Vec<Tiddler>> {
        let bags = self.bags.read().map_err(|_| lock_error())?;
        let stored = bags
            .get(bag)
            .ok_or_else(|| BagError::NoSuchBag(bag.to_string()))?;
        check_read(&stored.bag, usersign)?;
        Ok(stored.tiddlers.values().cloned().collect())
    }

    pub fn read_tiddler(&self, bag: &str, title: &str, usersign: &Usersign) -> Result<Tiddler> {
        let bags = self.bags.read().map_err(|_| lock_error())?;
        let stored = bags
            .get(bag)
            .ok_or_else(|| BagError::NoSuchBag(bag.to_string()))?;
        check_read(&stored.bag, usersign)?;
        stored
            .tiddlers
            .get(title)
            .cloned()
            .ok_or_else(|| BagError::NoSuchTiddler(title.to_string()))
    }
}

fn check_read(bag: &Bag, usersign: &Usersign) -> Result<()> {
    if bag.policy.allows(PolicyOp::Read, usersign) {
        return Ok(());
    }
    tracing::debug!(bag = %bag.name, user = %usersign, "read denied");
    if usersign.is_guest() {
        Err(BagError::Unauthorized)
    } else {
        Err(BagError::Forbidden)
    }
}
