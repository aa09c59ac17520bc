//! Reusable-instance pool grouped by category tag
//!
//! Every instance ever created stays owned by the category that created it and is
//! never freed while the pool lives; pools only grow. A category's queue holds every
//! instance "in rotation": `acquire` takes the oldest inactive one, re-enqueues it at
//! the tail and activates it. When every instance in the category is active, one new
//! instance is cloned from the category's prototype. Recycling is driven by the caller
//! through [`ObjectPool::release`], which only clears the active flag.
//!
//! The pool is confined to the simulation thread; a multi-threaded host must own it
//! behind a single lock.

use std::collections::{HashMap, VecDeque};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Hook run on an instance each time it is handed out
pub trait PooledObject: Clone {
    /// Reset per-spawn state (called after activation and repositioning)
    fn on_spawn(&mut self) {}
}

/// Stable handle to a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolved category key (stable for the pool's lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryId(usize);

/// World placement of an instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// A pooled instance plus its bookkeeping
#[derive(Debug, Clone)]
pub struct Pooled<T> {
    pub id: InstanceId,
    pub category: CategoryId,
    pub active: bool,
    pub transform: Transform,
    pub item: T,
}

#[derive(Debug, Clone)]
struct Category<T> {
    tag: String,
    prototype: T,
    seed_size: usize,
    queue: VecDeque<InstanceId>,
}

/// Category-keyed pool of reusable instances
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    categories: Vec<Category<T>>,
    by_tag: HashMap<String, CategoryId>,
    instances: Vec<Pooled<T>>,
    initialized: bool,
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            by_tag: HashMap::new(),
            instances: Vec::new(),
            initialized: false,
        }
    }
}

impl<T: PooledObject> ObjectPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every category with `seed_size` inactive instances.
    ///
    /// Only the first call has an effect; later calls are ignored with a warning.
    /// A duplicated tag keeps its first definition.
    pub fn initialize(&mut self, categories: impl IntoIterator<Item = (String, T, usize)>) {
        if self.initialized {
            log::warn!("Object pool already initialized; ignoring re-initialization");
            return;
        }
        self.initialized = true;

        for (tag, prototype, seed_size) in categories {
            if self.by_tag.contains_key(&tag) {
                log::warn!("Pool category {tag} defined twice; keeping the first definition");
                continue;
            }
            let category = CategoryId(self.categories.len());
            self.by_tag.insert(tag.clone(), category);
            self.categories.push(Category {
                tag,
                prototype,
                seed_size,
                queue: VecDeque::with_capacity(seed_size),
            });
            for _ in 0..seed_size {
                let id = self.create_instance(category);
                self.categories[category.0].queue.push_back(id);
            }
        }

        log::info!(
            "Object pool initialized: {} categories, {} instances",
            self.categories.len(),
            self.instances.len()
        );
    }

    /// Resolve a tag once, for callers that acquire repeatedly
    pub fn category(&self, tag: &str) -> Option<CategoryId> {
        self.by_tag.get(tag).copied()
    }

    /// Hand out an instance of `tag` placed at `position`/`rotation`.
    ///
    /// Returns `None` (with a warning) when the tag is unknown.
    pub fn acquire(&mut self, tag: &str, position: Vec3, rotation: Quat) -> Option<InstanceId> {
        let Some(category) = self.category(tag) else {
            log::warn!("Pool with tag {tag} doesn't exist");
            return None;
        };
        Some(self.acquire_in(category, position, rotation))
    }

    /// [`acquire`](Self::acquire) with a pre-resolved category
    pub fn acquire_in(
        &mut self,
        category: CategoryId,
        position: Vec3,
        rotation: Quat,
    ) -> InstanceId {
        let queue = &self.categories[category.0].queue;
        let reusable = queue
            .iter()
            .position(|id| !self.instances[id.index()].active);

        let reused = reusable.and_then(|pos| self.categories[category.0].queue.remove(pos));

        let id = match reused {
            Some(id) => id,
            None => {
                let id = self.create_instance(category);
                log::debug!(
                    "Pool {} grew to {} instances",
                    self.categories[category.0].tag,
                    self.categories[category.0].queue.len() + 1
                );
                id
            }
        };
        self.categories[category.0].queue.push_back(id);

        let instance = &mut self.instances[id.index()];
        instance.active = true;
        instance.transform = Transform { position, rotation };
        instance.item.on_spawn();
        id
    }

    /// Mark an instance inactive so it can be handed out again.
    ///
    /// Unknown tags and instances owned by another category are ignored with a warning.
    pub fn release(&mut self, tag: &str, id: InstanceId) {
        let Some(category) = self.category(tag) else {
            log::warn!("Pool with tag {tag} doesn't exist");
            return;
        };
        self.release_in(category, id);
    }

    /// [`release`](Self::release) with a pre-resolved category
    pub fn release_in(&mut self, category: CategoryId, id: InstanceId) {
        match self.instances.get_mut(id.index()) {
            Some(instance) if instance.category == category => instance.active = false,
            Some(_) => log::warn!(
                "Instance {id:?} does not belong to pool {}",
                self.categories[category.0].tag
            ),
            None => log::warn!("Unknown pooled instance {id:?}"),
        }
    }

    fn create_instance(&mut self, category: CategoryId) -> InstanceId {
        let id = InstanceId(self.instances.len() as u32);
        let item = self.categories[category.0].prototype.clone();
        self.instances.push(Pooled {
            id,
            category,
            active: false,
            transform: Transform::default(),
            item,
        });
        id
    }
}

impl<T> ObjectPool<T> {
    pub fn get(&self, id: InstanceId) -> Option<&Pooled<T>> {
        self.instances.get(id.index())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Pooled<T>> {
        self.instances.get_mut(id.index())
    }

    pub fn tag(&self, category: CategoryId) -> &str {
        &self.categories[category.0].tag
    }

    /// Number of distinct instances in rotation for `tag` (0 if unknown)
    pub fn category_len(&self, tag: &str) -> usize {
        self.by_tag
            .get(tag)
            .map(|c| self.categories[c.0].queue.len())
            .unwrap_or(0)
    }

    /// Size the category was seeded with
    pub fn seed_size(&self, tag: &str) -> Option<usize> {
        self.by_tag.get(tag).map(|c| self.categories[c.0].seed_size)
    }

    /// Instance ids of `tag` in rotation order (oldest first)
    pub fn rotation(&self, tag: &str) -> Vec<InstanceId> {
        self.by_tag
            .get(tag)
            .map(|c| self.categories[c.0].queue.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn total_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.active).count()
    }

    /// Active instances in id order
    pub fn iter_active(&self) -> impl Iterator<Item = &Pooled<T>> {
        self.instances.iter().filter(|i| i.active)
    }

    /// Active instances in id order, mutably
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Pooled<T>> {
        self.instances.iter_mut().filter(|i| i.active)
    }

    /// Deactivate every instance (categories and instances are kept)
    pub fn release_all(&mut self) {
        for instance in &mut self.instances {
            instance.active = false;
        }
    }
}
