//=========================================================================
// Children Container
//=========================================================================
//
// Ordered set of owned game objects with two secondary indices:
//
//   entries  [e0, e1, e2, ...]        insertion order (iteration, dispatch)
//   by_kind  Kind -> {ObjectId}       concrete type + declared kinds
//   by_tag   Tag  -> {ObjectId}       tags given at add time
//
// Every add writes all three structures and every remove purges all
// three, so `get(kind)`/`get(tag)` always agree with iteration.
//
// During dispatch the engine may temporarily detach a child (its slot
// stays in place, empty). Detached children are invisible to every
// query until they are reattached.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet};
use std::fmt;

//=== Internal Dependencies ===============================================

use super::{GameObject, Kind, ObjectId, Tag};
use crate::core::errors::ObjectError;

//=== Entry ===============================================================

struct Entry {
    id: ObjectId,
    object: Option<Box<dyn GameObject>>,
    kinds: Vec<Kind>,
    tags: Vec<Tag>,
}

//=== Children ============================================================

/// Owned, indexed children of a game object.
#[derive(Default)]
pub struct Children {
    entries: Vec<Entry>,
    index: HashMap<ObjectId, usize>,
    by_kind: HashMap<Kind, HashSet<ObjectId>>,
    by_tag: HashMap<Tag, HashSet<ObjectId>>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Insertion --------------------------------------------------------

    /// Adds `child` without tags.
    pub fn add<O: GameObject>(&mut self, child: O) -> ObjectId {
        self.add_boxed(Box::new(child), Vec::new())
    }

    /// Adds `child` under every tag in `tags`.
    ///
    /// ```
    /// use aetheric_2d::prelude::*;
    /// use aetheric_2d::core::objects::Children;
    ///
    /// let mut children = Children::new();
    /// let id = children.add_tagged(Node::new(), ["enemy", "boss"]);
    /// assert_eq!(children.get(None, Some(&Tag::new("boss"))).unwrap().count(), 1);
    /// assert!(children.contains(id));
    /// ```
    pub fn add_tagged<O, I>(&mut self, child: O, tags: I) -> ObjectId
    where
        O: GameObject,
        I: IntoIterator,
        I::Item: Into<Tag>,
    {
        let tags = tags.into_iter().map(Into::into).collect();
        self.add_boxed(Box::new(child), tags)
    }

    pub fn add_boxed(&mut self, child: Box<dyn GameObject>, tags: Vec<Tag>) -> ObjectId {
        let id = ObjectId::next();
        self.insert(id, child, tags);
        id
    }

    /// Inserts under a pre-allocated id.
    pub(crate) fn insert(&mut self, id: ObjectId, child: Box<dyn GameObject>, tags: Vec<Tag>) {
        let mut kinds = vec![Kind::of_object(&*child), Kind::GAME_OBJECT];
        for kind in child.kinds() {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        for kind in &kinds {
            self.by_kind.entry(*kind).or_default().insert(id);
        }
        for tag in &tags {
            self.by_tag.entry(tag.clone()).or_default().insert(id);
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(Entry {
            id,
            object: Some(child),
            kinds,
            tags,
        });
    }

    //--- Removal ----------------------------------------------------------

    /// Removes a direct child and returns it.
    pub fn remove(&mut self, id: ObjectId) -> Result<Box<dyn GameObject>, ObjectError> {
        let position = match self.index.get(&id) {
            Some(&position) if self.entries[position].object.is_some() => position,
            _ => return Err(ObjectError::NotPresent(id)),
        };

        let entry = self.entries.remove(position);
        self.index.remove(&id);
        for (offset, later) in self.entries[position..].iter().enumerate() {
            self.index.insert(later.id, position + offset);
        }

        for kind in &entry.kinds {
            purge(&mut self.by_kind, kind, id);
        }
        for tag in &entry.tags {
            purge(&mut self.by_tag, tag, id);
        }

        entry.object.ok_or(ObjectError::NotPresent(id))
    }

    /// Removes `id` from this container or from any nested container.
    pub fn remove_recursive(&mut self, id: ObjectId) -> Option<Box<dyn GameObject>> {
        if self.contains(id) {
            return self.remove(id).ok();
        }
        self.iter_mut()
            .filter_map(|child| child.children_mut())
            .find_map(|nested| nested.remove_recursive(id))
    }

    //--- Queries ----------------------------------------------------------

    /// Objects matching both selectors, in insertion order.
    ///
    /// At least one of `kind` or `tag` is required.
    pub fn get(
        &self,
        kind: Option<Kind>,
        tag: Option<&Tag>,
    ) -> Result<impl Iterator<Item = &dyn GameObject> + '_, ObjectError> {
        let ids = self.select(kind, tag)?;
        Ok(ids.into_iter().filter_map(move |id| self.get_by_id(id)))
    }

    /// Ids of the objects matching both selectors, in insertion order.
    pub fn select(&self, kind: Option<Kind>, tag: Option<&Tag>) -> Result<Vec<ObjectId>, ObjectError> {
        let kind_bucket = kind.map(|kind| self.by_kind.get(&kind));
        let tag_bucket = tag.map(|tag| self.by_tag.get(tag));

        let ids: Vec<ObjectId> = match (kind_bucket, tag_bucket) {
            (None, None) => return Err(ObjectError::NoSelector),
            (Some(None), _) | (_, Some(None)) => Vec::new(),
            (Some(Some(bucket)), None) | (None, Some(Some(bucket))) => {
                bucket.iter().copied().collect()
            }
            (Some(Some(kinds)), Some(Some(tags))) => {
                let (small, large) = if kinds.len() <= tags.len() {
                    (kinds, tags)
                } else {
                    (tags, kinds)
                };
                small.iter().filter(|id| large.contains(*id)).copied().collect()
            }
        };

        let mut positions: Vec<usize> = ids
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .filter(|&position| self.entries[position].object.is_some())
            .collect();
        positions.sort_unstable();

        Ok(positions.into_iter().map(|position| self.entries[position].id).collect())
    }

    /// Direct children whose concrete type is `T`.
    pub fn get_kind<T: GameObject>(&self) -> impl Iterator<Item = &T> + '_ {
        self.select(Some(Kind::of::<T>()), None)
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |id| self.get_by_id(id)?.as_any().downcast_ref::<T>())
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<&dyn GameObject> {
        let position = *self.index.get(&id)?;
        self.entries[position].object.as_deref()
    }

    pub fn get_by_id_mut(&mut self, id: ObjectId) -> Option<&mut (dyn GameObject + 'static)> {
        let position = *self.index.get(&id)?;
        self.entries[position].object.as_deref_mut()
    }

    /// Typed access to a direct child.
    pub fn get_as<T: GameObject>(&self, id: ObjectId) -> Option<&T> {
        self.get_by_id(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_as_mut<T: GameObject>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.get_by_id_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Earliest-added child carrying `tag`.
    pub fn first_tagged(&self, tag: &Tag) -> Option<ObjectId> {
        self.select(None, Some(tag)).ok()?.into_iter().next()
    }

    /// Tags `id` was added with.
    pub fn tags_of(&self, id: ObjectId) -> Option<&[Tag]> {
        let position = *self.index.get(&id)?;
        Some(&self.entries[position].tags)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get_by_id(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.object.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all direct children, in insertion order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries
            .iter()
            .filter(|entry| entry.object.is_some())
            .map(|entry| entry.id)
            .collect()
    }

    //--- Iteration --------------------------------------------------------

    /// Direct children in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            entries: self.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn GameObject + 'static)> + '_ {
        self.entries.iter_mut().filter_map(|entry| entry.object.as_deref_mut())
    }

    pub fn iter_with_ids(&self) -> impl Iterator<Item = (ObjectId, &dyn GameObject)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.object.as_deref().map(|object| (entry.id, object)))
    }

    pub(crate) fn iter_mut_with_ids(
        &mut self,
    ) -> impl Iterator<Item = (ObjectId, &mut (dyn GameObject + 'static))> + '_ {
        self.entries.iter_mut().filter_map(|entry| {
            let id = entry.id;
            entry.object.as_deref_mut().map(|object| (id, object))
        })
    }

    /// Every descendant, depth-first pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.iter().rev().collect(),
        }
    }

    //--- Detaching --------------------------------------------------------

    /// Takes a child out of its slot, leaving the slot and indices intact.
    pub(crate) fn detach(&mut self, id: ObjectId) -> Option<Box<dyn GameObject>> {
        let position = *self.index.get(&id)?;
        self.entries[position].object.take()
    }

    /// Puts a detached child back. Returns it if its slot is gone.
    pub(crate) fn reattach(
        &mut self,
        id: ObjectId,
        object: Box<dyn GameObject>,
    ) -> Option<Box<dyn GameObject>> {
        match self.index.get(&id) {
            Some(&position) if self.entries[position].object.is_none() => {
                self.entries[position].object = Some(object);
                None
            }
            _ => Some(object),
        }
    }
}

fn purge<K: std::hash::Hash + Eq>(buckets: &mut HashMap<K, HashSet<ObjectId>>, key: &K, id: ObjectId) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter_with_ids().map(|(id, object)| (id, object.type_name())))
            .finish()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a dyn GameObject;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//=== Iter ================================================================

/// Iterator over direct children in insertion order.
pub struct Iter<'a> {
    entries: std::slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a dyn GameObject;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            if let Some(object) = entry.object.as_deref() {
                return Some(object);
            }
        }
        None
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.entries.next_back() {
            if let Some(object) = entry.object.as_deref() {
                return Some(object);
            }
        }
        None
    }
}

//=== Walk ================================================================

/// Depth-first pre-order traversal without recursion.
pub struct Walk<'a> {
    stack: Vec<&'a dyn GameObject>,
}

/// Walks `root` and all of its descendants, `root` first.
pub fn walk(root: &dyn GameObject) -> Walk<'_> {
    Walk { stack: vec![root] }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a dyn GameObject;

    fn next(&mut self) -> Option<Self::Item> {
        let object = self.stack.pop()?;
        if let Some(children) = object.children() {
            self.stack.extend(children.iter().rev());
        }
        Some(object)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
