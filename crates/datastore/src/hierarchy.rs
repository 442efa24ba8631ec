//! Hierarchy store: arena tree of groups plus a flat path index.
//!
//! Groups and units live in two `Slab` arenas and refer to each other by key.
//! Parent links are plain keys, never owning handles. The flat index maps
//! every full path to its unit key; every public mutation keeps index and
//! tree in exact correspondence.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{DataPath, TelemetryError};
use regex::Regex;
use slab::Slab;
use tracing::trace;

use crate::unit::{DataUnit, UnitVariant};

type GroupKey = usize;
type UnitKey = usize;

#[derive(Debug, Clone)]
struct Group {
    name: String,
    /// None for top-level groups
    parent: Option<GroupKey>,
    children: BTreeMap<String, GroupKey>,
    units: BTreeMap<String, UnitKey>,
}

impl Group {
    fn new(name: &str, parent: Option<GroupKey>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.units.is_empty()
    }
}

#[derive(Debug, Clone)]
struct UnitSlot {
    unit: DataUnit,
    parent: GroupKey,
    path: DataPath,
}

/// Tree of named groups holding data units.
#[derive(Clone, Default)]
pub struct HierarchyStore {
    groups: Slab<Group>,
    top: BTreeMap<String, GroupKey>,
    units: Slab<UnitSlot>,
    index: BTreeMap<DataPath, UnitKey>,
}

impl fmt::Debug for HierarchyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchyStore")
            .field("groups", &self.groups.len())
            .field("units", &self.units.len())
            .finish()
    }
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of groups, all levels
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Insert `unit` at `path`, creating intermediate groups.
    ///
    /// An existing unit at the same path is replaced and returned. The unit's
    /// name is set to the path's basename.
    pub fn register(&mut self, path: DataPath, mut unit: DataUnit) -> Option<DataUnit> {
        unit.meta_mut().name = path.basename().to_string();

        if let Some(&key) = self.index.get(path.as_str()) {
            trace!(path = %path, "replacing unit");
            return Some(std::mem::replace(&mut self.units[key].unit, unit));
        }

        let parent = self.ensure_groups(&path);
        let name = path.basename().to_string();
        let key = self.units.insert(UnitSlot {
            unit,
            parent,
            path: path.clone(),
        });
        self.groups[parent].units.insert(name, key);
        self.index.insert(path, key);
        None
    }

    /// Remove the unit at `path`, pruning groups left empty.
    pub fn unregister(&mut self, path: &str) -> Option<DataUnit> {
        let key = self.index.remove(path)?;
        let slot = self.units.remove(key);
        self.groups[slot.parent].units.remove(slot.path.basename());
        self.prune_from(slot.parent);
        Some(slot.unit)
    }

    pub fn get(&self, path: &str) -> Option<&DataUnit> {
        self.index.get(path).map(|&key| &self.units[key].unit)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut DataUnit> {
        let key = *self.index.get(path)?;
        Some(&mut self.units[key].unit)
    }

    /// Exact lookup, or regex search over all paths when `is_pattern`.
    ///
    /// Pattern search returns the first match in sorted-path order. Absent
    /// units are `Ok(None)`; only an invalid pattern is an error.
    pub fn find(
        &self,
        query: &str,
        is_pattern: bool,
    ) -> Result<Option<(&DataPath, &DataUnit)>, TelemetryError> {
        if !is_pattern {
            return Ok(self
                .index
                .get_key_value(query)
                .map(|(path, &key)| (path, &self.units[key].unit)));
        }
        let re = Regex::new(query)
            .map_err(|e| TelemetryError::invalid_pattern(query, e.to_string()))?;
        Ok(self.find_matching(&re, |_| true))
    }

    /// First unit in sorted-path order whose path matches `re` and passes `filter`.
    pub fn find_matching<F>(&self, re: &Regex, filter: F) -> Option<(&DataPath, &DataUnit)>
    where
        F: Fn(&DataUnit) -> bool,
    {
        self.index
            .iter()
            .map(|(path, &key)| (path, &self.units[key].unit))
            .find(|(path, unit)| re.is_match(path.as_str()) && filter(*unit))
    }

    /// Concrete view of the unit at `path`, if it has representation `V`.
    pub fn typed<V: UnitVariant>(&self, path: &str) -> Option<&V> {
        self.get(path).and_then(V::from_unit)
    }

    pub fn typed_mut<V: UnitVariant>(&mut self, path: &str) -> Option<&mut V> {
        self.get_mut(path).and_then(V::from_unit_mut)
    }

    /// Unit at `path` as `V`, created empty (raw) on first use.
    ///
    /// Fails with `TypeMismatch` when a unit of another representation
    /// already occupies the path.
    pub fn get_or_create<V: UnitVariant>(
        &mut self,
        path: &DataPath,
        units: &str,
    ) -> Result<&mut V, TelemetryError> {
        let key = match self.index.get(path.as_str()) {
            Some(&key) => key,
            None => {
                self.register(path.clone(), V::empty(path.basename(), units).into_unit());
                self.index[path.as_str()]
            }
        };
        let unit = &mut self.units[key].unit;
        let found = unit.kind();
        V::from_unit_mut(unit).ok_or_else(|| {
            TelemetryError::type_mismatch(path.as_str(), V::KIND.as_str(), found.as_str())
        })
    }

    /// All units in sorted-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&DataPath, &DataUnit)> {
        self.index
            .iter()
            .map(|(path, &key)| (path, &self.units[key].unit))
    }

    /// Mutable access to every unit, arena order.
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut DataUnit> {
        self.units.iter_mut().map(|(_, slot)| &mut slot.unit)
    }

    /// Snapshot of all paths, sorted.
    pub fn paths(&self) -> Vec<DataPath> {
        self.index.keys().cloned().collect()
    }

    /// Top-level groups, sorted by name.
    pub fn top_groups(&self) -> impl Iterator<Item = GroupView<'_>> {
        self.top.values().map(move |&key| GroupView { store: self, key })
    }

    /// Group at a slash-delimited group path.
    pub fn group(&self, path: &str) -> Option<GroupView<'_>> {
        let mut segments = path.split('/').map(str::trim);
        let mut key = *self.top.get(segments.next()?)?;
        for segment in segments {
            key = *self.groups[key].children.get(segment)?;
        }
        Some(GroupView { store: self, key })
    }

    /// Group that owns the unit at `path`.
    pub fn parent_of(&self, path: &str) -> Option<GroupView<'_>> {
        let key = *self.index.get(path)?;
        Some(GroupView {
            store: self,
            key: self.units[key].parent,
        })
    }

    /// Verify tree and index agree; returns a description of the first problem.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut reached = 0usize;
        let mut stack: Vec<(GroupKey, String)> = self
            .top
            .iter()
            .map(|(name, &key)| (key, name.clone()))
            .collect();

        while let Some((key, prefix)) = stack.pop() {
            let group = self
                .groups
                .get(key)
                .ok_or_else(|| format!("dangling group key under '{prefix}'"))?;
            if group.is_empty() {
                return Err(format!("empty group '{prefix}' still attached"));
            }
            for (name, &unit_key) in &group.units {
                let path = format!("{prefix}/{name}");
                let slot = self
                    .units
                    .get(unit_key)
                    .ok_or_else(|| format!("dangling unit key at '{path}'"))?;
                if slot.parent != key {
                    return Err(format!("unit '{path}' has a wrong parent link"));
                }
                if self.index.get(path.as_str()) != Some(&unit_key) {
                    return Err(format!("unit '{path}' is missing from the index"));
                }
                reached += 1;
            }
            for (name, &child) in &group.children {
                if self.groups.get(child).and_then(|g| g.parent) != Some(key) {
                    return Err(format!("group '{prefix}/{name}' has a wrong parent link"));
                }
                stack.push((child, format!("{prefix}/{name}")));
            }
        }

        if reached != self.index.len() || reached != self.units.len() {
            return Err(format!(
                "tree reaches {reached} units, index holds {}, arena holds {}",
                self.index.len(),
                self.units.len()
            ));
        }
        Ok(())
    }

    fn ensure_groups(&mut self, path: &DataPath) -> GroupKey {
        let mut segments = path.segments();
        // DataPath guarantees at least two segments
        let first = segments.next().unwrap_or_default();
        let mut current = match self.top.get(first) {
            Some(&key) => key,
            None => {
                let key = self.groups.insert(Group::new(first, None));
                self.top.insert(first.to_string(), key);
                key
            }
        };

        let group_segments: Vec<&str> = segments.collect();
        let Some((_, inner)) = group_segments.split_last() else {
            return current;
        };
        for segment in inner {
            current = match self.groups[current].children.get(*segment) {
                Some(&key) => key,
                None => {
                    let key = self.groups.insert(Group::new(segment, Some(current)));
                    self.groups[current].children.insert(segment.to_string(), key);
                    key
                }
            };
        }
        current
    }

    fn prune_from(&mut self, mut key: GroupKey) {
        while self.groups[key].is_empty() {
            let group = self.groups.remove(key);
            match group.parent {
                Some(parent) => {
                    self.groups[parent].children.remove(&group.name);
                    key = parent;
                }
                None => {
                    self.top.remove(&group.name);
                    trace!(group = %group.name, "pruned top-level group");
                    return;
                }
            }
        }
    }
}

/// Read-only view of one group.
#[derive(Clone, Copy)]
pub struct GroupView<'a> {
    store: &'a HierarchyStore,
    key: GroupKey,
}

impl<'a> GroupView<'a> {
    pub fn name(&self) -> &'a str {
        &self.store.groups[self.key].name
    }

    /// Full slash-delimited path of this group.
    pub fn path(&self) -> String {
        let mut names = vec![self.name()];
        let mut current = self.store.groups[self.key].parent;
        while let Some(key) = current {
            names.push(&self.store.groups[key].name);
            current = self.store.groups[key].parent;
        }
        names.reverse();
        names.join("/")
    }

    pub fn parent(&self) -> Option<GroupView<'a>> {
        self.store.groups[self.key].parent.map(|key| GroupView {
            store: self.store,
            key,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupView<'a>> + 'a {
        let store = self.store;
        store.groups[self.key]
            .children
            .values()
            .map(move |&key| GroupView { store, key })
    }

    pub fn units(&self) -> impl Iterator<Item = (&'a str, &'a DataUnit)> + 'a {
        let store = self.store;
        store.groups[self.key]
            .units
            .iter()
            .map(move |(name, &key)| (name.as_str(), &store.units[key].unit))
    }
}

impl fmt::Debug for GroupView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupView").field("path", &self.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Event, Parameter, Timeseries};

    fn path(raw: &str) -> DataPath {
        DataPath::parse(raw).unwrap()
    }

    fn series(name: &str) -> DataUnit {
        let mut ts = Timeseries::<f32>::new(name, "");
        ts.add_elem(1.0, 0.0);
        ts.into_unit()
    }

    #[test]
    fn test_register_creates_groups() {
        let mut store = HierarchyStore::new();
        store.register(path("airstate/angles/roll"), series("roll"));
        store.register(path("airstate/lat"), series("lat"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.group_count(), 2);
        let angles = store.group("airstate/angles").unwrap();
        assert_eq!(angles.path(), "airstate/angles");
        assert_eq!(angles.parent().unwrap().name(), "airstate");
        let names: Vec<&str> = angles.units().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["roll"]);
        assert_eq!(store.parent_of("airstate/lat").unwrap().name(), "airstate");
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_register_overwrites() {
        let mut store = HierarchyStore::new();
        store.register(path("power/power"), series("power"));
        let old = store.register(path("power/power"), Timeseries::<f32>::new("x", "W").into_unit());
        assert_eq!(old.map(|u| u.len()), Some(1));
        assert_eq!(store.len(), 1);
        let unit = store.get("power/power").unwrap();
        assert!(unit.is_empty());
        assert_eq!(unit.name(), "power");
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_unregister_prunes_empty_chain() {
        let mut store = HierarchyStore::new();
        store.register(path("a/b/c/x"), series("x"));
        store.register(path("a/y"), series("y"));

        assert!(store.unregister("a/b/c/x").is_some());
        assert!(store.group("a/b").is_none());
        assert!(store.group("a").is_some());
        store.check_consistency().unwrap();

        store.unregister("a/y");
        assert!(store.group("a").is_none());
        assert_eq!(store.top_groups().count(), 0);
        assert_eq!(store.group_count(), 0);
        assert!(store.unregister("a/y").is_none());
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_find_exact_and_pattern() {
        let mut store = HierarchyStore::new();
        store.register(path("onboard log/NKF1/PN"), series("PN"));
        store.register(path("onboard log/NKF1/PNX"), series("PNX"));
        store.register(path("onboard log/AHR2/Roll"), series("Roll"));

        let (found, _) = store.find("onboard log/NKF1/PN", false).unwrap().unwrap();
        assert_eq!(found, "onboard log/NKF1/PN");
        assert!(store.find("onboard log/NKF1", false).unwrap().is_none());

        let (found, _) = store.find(r"\bPN\b", true).unwrap().unwrap();
        assert_eq!(found, "onboard log/NKF1/PN");
        let (found, _) = store.find(r"\b[rR]oll\b", true).unwrap().unwrap();
        assert_eq!(found, "onboard log/AHR2/Roll");
        assert!(store.find(r"\bVD\b", true).unwrap().is_none());
        assert!(store.find("(", true).is_err());
    }

    #[test]
    fn test_get_or_create_and_mismatch() {
        let mut store = HierarchyStore::new();
        let p = path("flightbook/number flights");
        store
            .get_or_create::<Parameter<u32>>(&p, "")
            .unwrap()
            .set(3);
        assert_eq!(
            store.typed::<Parameter<u32>>("flightbook/number flights").unwrap().value(),
            Some(&3)
        );
        let err = store.get_or_create::<Event<String>>(&p, "").unwrap_err();
        assert!(matches!(err, TelemetryError::TypeMismatch { .. }));
        assert!(store.typed::<Parameter<f64>>("flightbook/number flights").is_none());
    }

    #[test]
    fn test_iteration_sorted() {
        let mut store = HierarchyStore::new();
        store.register(path("radio/rssi"), series("rssi"));
        store.register(path("GPS/lat"), series("lat"));
        store.register(path("airstate/lat"), series("lat"));
        let paths: Vec<String> = store.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["GPS/lat", "airstate/lat", "radio/rssi"]);
        assert_eq!(store.paths().len(), 3);
    }

    #[test]
    fn test_consistency_under_churn() {
        let mut store = HierarchyStore::new();
        let names = ["a/x", "a/b/y", "a/b/c/z", "d/w", "d/e/v"];
        for round in 0..3 {
            for (i, name) in names.iter().enumerate() {
                if (i + round) % 2 == 0 {
                    store.register(path(name), series("u"));
                } else {
                    store.unregister(name);
                }
                store.check_consistency().unwrap();
            }
        }
        let clone = store.clone();
        clone.check_consistency().unwrap();
        assert_eq!(clone.len(), store.len());
    }
}
