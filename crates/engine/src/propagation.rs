//! Run-scoped table of the latest published value per name.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use stepwire_types::{CellKind, DataCell, LogicalTime, StepId, Value, ValueMap};

/// A published output plus the table version at which it landed.
#[derive(Debug, Clone)]
struct PublishedCell {
    cell: DataCell,
    published_at: LogicalTime,
}

#[derive(Debug, Default)]
struct TableState {
    cells: IndexMap<String, PublishedCell>,
    version: LogicalTime,
}

/// Inputs resolved for one step, taken under a single read lock.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Published cells re-labelled as `Input`, in requested-name order.
    pub cells: Vec<DataCell>,
    /// Table version the snapshot reflects.
    pub version: LogicalTime,
}

impl Resolution {
    pub fn values(&self) -> ValueMap {
        self.cells
            .iter()
            .map(|cell| (cell.name().to_string(), cell.value().clone()))
            .collect()
    }
}

/// A publish that replaced a value written by a step the publisher never observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConflict {
    pub name: String,
    pub previous_step: StepId,
}

/// Outcome of one publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Table version after the publish.
    pub version: LogicalTime,
    /// Names that overrode a concurrent publish. The new value is in the table regardless.
    pub conflicts: Vec<PublishConflict>,
}

/// Latest published value per name for one workflow run.
///
/// `publish` applies all of a step's outputs under one write lock, so concurrent `resolve` calls
/// observe either none or all of them.
#[derive(Debug, Default)]
pub struct PropagationTable {
    inner: RwLock<TableState>,
}

impl PropagationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `names`. Names nothing has published are left out.
    pub fn resolve<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Resolution {
        let state = self.read();
        let cells = names
            .into_iter()
            .filter_map(|name| state.cells.get(name))
            .map(|published| published.cell.relabel(CellKind::Input))
            .collect();
        Resolution {
            cells,
            version: state.version,
        }
    }

    /// Merges a committed step's outputs.
    ///
    /// `observed_version` is the table version the step resolved its inputs against. Replacing a
    /// value another step published after that version is reported as a conflict; the newer
    /// publish still wins.
    pub fn publish(&self, step_id: &StepId, outputs: impl IntoIterator<Item = DataCell>, observed_version: LogicalTime) -> PublishReport {
        let mut state = self.write();
        state.version += 1;
        let version = state.version;

        let mut conflicts = Vec::new();
        for cell in outputs {
            let name = cell.name().to_string();
            if let Some(existing) = state.cells.get(&name)
                && existing.cell.origin_step() != step_id
                && existing.published_at > observed_version
            {
                conflicts.push(PublishConflict {
                    name: name.clone(),
                    previous_step: existing.cell.origin_step().clone(),
                });
            }
            state.cells.insert(
                name,
                PublishedCell {
                    cell,
                    published_at: version,
                },
            );
        }

        PublishReport { version, conflicts }
    }

    /// Current table version; `0` until the first publish.
    pub fn version(&self) -> LogicalTime {
        self.read().version
    }

    /// Every published name in first-publish order.
    pub fn published_names(&self) -> Vec<String> {
        self.read().cells.keys().cloned().collect()
    }

    pub fn published_value(&self, name: &str) -> Option<Value> {
        self.read().cells.get(name).map(|published| published.cell.value().clone())
    }

    /// Published cell for `name` with its original provenance.
    pub fn published_cell(&self, name: &str) -> Option<DataCell> {
        self.read().cells.get(name).map(|published| published.cell.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(name: &str, value: impl Into<Value>, step: &str) -> DataCell {
        DataCell::new(name, value.into(), StepId::from(step), CellKind::Output, 1)
    }

    #[test]
    fn resolve_skips_unpublished_names() {
        let table = PropagationTable::new();
        table.publish(&StepId::from("produce"), [output("my_data", "abc", "produce")], 0);

        let resolution = table.resolve(["my_data", "missing"]);
        assert_eq!(resolution.version, 1);
        assert_eq!(resolution.values().get("my_data"), Some(&Value::from("abc")));
        assert!(!resolution.values().contains_key("missing"));
        assert_eq!(resolution.cells[0].kind(), CellKind::Input);
        assert_eq!(resolution.cells[0].origin_step().as_str(), "produce");
    }

    #[test]
    fn sequential_republish_is_not_a_conflict() {
        let table = PropagationTable::new();
        table.publish(&StepId::from("a"), [output("x", 1, "a")], 0);
        let observed = table.version();
        let report = table.publish(&StepId::from("b"), [output("x", 2, "b")], observed);

        assert!(report.conflicts.is_empty());
        assert_eq!(table.published_value("x"), Some(Value::Int(2)));
    }

    #[test]
    fn unobserved_publish_is_reported_and_overridden() {
        let table = PropagationTable::new();
        // Both steps resolved against version 0.
        table.publish(&StepId::from("a"), [output("x", 1, "a")], 0);
        let report = table.publish(&StepId::from("b"), [output("x", 2, "b")], 0);

        assert_eq!(
            report.conflicts,
            vec![PublishConflict {
                name: "x".into(),
                previous_step: StepId::from("a"),
            }]
        );
        assert_eq!(table.published_value("x"), Some(Value::Int(2)));
        assert_eq!(table.published_cell("x").unwrap().origin_step().as_str(), "b");
    }

    #[test]
    fn publish_bumps_version_once_per_step() {
        let table = PropagationTable::new();
        let report = table.publish(&StepId::from("a"), [output("x", 1, "a"), output("y", 2, "a")], 0);
        assert_eq!(report.version, 1);
        assert_eq!(table.published_names(), vec!["x", "y"]);
    }
}
