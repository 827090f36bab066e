//! Columnar event input
//!
//! Events are read column by column. Only the columns declared by the
//! active analysis steps are ever requested, so a tree without e.g.
//! track jets can still be processed up to step 3.
use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace};
use oxyroot::{Branch, ReaderTree, RootFile};

use crate::error::{Error, Result};
use crate::step::{ColumnKind, ColumnSpec, Step, StepSelection};

/// Named columns with one entry per event
pub trait ColumnSource {
    fn f32_column(&self, name: &str) -> Result<Vec<f32>>;

    fn u32_column(&self, name: &str) -> Result<Vec<u32>>;

    /// A column holding a variable-length array per event
    fn f32_vec_column(&self, name: &str) -> Result<Vec<Vec<f32>>>;

    fn column(&self, spec: &ColumnSpec) -> Result<Column> {
        let name = &spec.name;
        let column = match spec.kind {
            ColumnKind::F32 => Column::F32(self.f32_column(name)?),
            ColumnKind::U32 => Column::U32(self.u32_column(name)?),
            ColumnKind::F32Vec => Column::F32Vec(self.f32_vec_column(name)?),
        };
        Ok(column)
    }
}

/// A TTree in a ROOT file
pub struct RootTree {
    tree: ReaderTree,
}

impl RootTree {
    pub fn open(path: impl AsRef<Path>, tree_name: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening tree {tree_name} in {path:?}");
        let mut file = RootFile::open(path).map_err(|err| {
            map_root_error(&format!("Failed to open the input file {path:?}"), err)
        })?;
        let tree = file.get_tree(tree_name).map_err(|err| {
            map_root_error(
                &format!("Failed to retrieve the input tree {tree_name}"),
                err,
            )
        })?;
        Ok(Self { tree })
    }

    fn branch(&self, name: &str) -> Result<&Branch> {
        trace!("Reading branch {name}");
        self.tree
            .branches()
            .find(|b| b.name() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }
}

impl ColumnSource for RootTree {
    fn f32_column(&self, name: &str) -> Result<Vec<f32>> {
        let values = self
            .branch(name)?
            .as_iter::<f32>()
            .map_err(|err| read_error(name, err))?
            .collect();
        Ok(values)
    }

    fn u32_column(&self, name: &str) -> Result<Vec<u32>> {
        let values = self
            .branch(name)?
            .as_iter::<u32>()
            .map_err(|err| read_error(name, err))?
            .collect();
        Ok(values)
    }

    fn f32_vec_column(&self, name: &str) -> Result<Vec<Vec<f32>>> {
        let values = self
            .branch(name)?
            .as_iter::<Vec<f32>>()
            .map_err(|err| read_error(name, err))?
            .collect();
        Ok(values)
    }
}

// the oxyroot error type is not exported
fn map_root_error<E: std::fmt::Display>(context: &str, err: E) -> Error {
    Error::Root(format!("{context}: {err}"))
}

fn read_error<E: std::fmt::Display>(name: &str, err: E) -> Error {
    map_root_error(&format!("Failed to read branch {name}"), err)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    F32(Vec<f32>),
    U32(Vec<u32>),
    F32Vec(Vec<Vec<f32>>),
}

impl Column {
    /// Number of events
    pub fn len(&self) -> usize {
        match self {
            Column::F32(v) => v.len(),
            Column::U32(v) => v.len(),
            Column::F32Vec(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn type_error(name: &str, kind: &str) -> Error {
    Error::Root(format!("Column {name} is not of type {kind}"))
}

/// Columns held in memory
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryColumns {
    columns: HashMap<String, Column>,
}

impl MemoryColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.columns.insert(name.into(), column);
    }

    pub fn with(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert(name, column);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    fn get(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }
}

impl ColumnSource for MemoryColumns {
    fn f32_column(&self, name: &str) -> Result<Vec<f32>> {
        match self.get(name)? {
            Column::F32(v) => Ok(v.clone()),
            _ => Err(type_error(name, "float")),
        }
    }

    fn u32_column(&self, name: &str) -> Result<Vec<u32>> {
        match self.get(name)? {
            Column::U32(v) => Ok(v.clone()),
            _ => Err(type_error(name, "unsigned int")),
        }
    }

    fn f32_vec_column(&self, name: &str) -> Result<Vec<Vec<f32>>> {
        match self.get(name)? {
            Column::F32Vec(v) => Ok(v.clone()),
            _ => Err(type_error(name, "vector<float>")),
        }
    }
}

/// The columns declared by the active steps of an analysis
///
/// Columns are handed out once with the `take_*` methods. A column
/// that no active step declares is `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnTable {
    n_events: usize,
    columns: HashMap<String, Column>,
}

impl ColumnTable {
    pub fn read<S: ColumnSource + ?Sized>(
        source: &S,
        steps: &[Step],
        selection: StepSelection,
    ) -> Result<Self> {
        let mut n_events = None;
        let mut columns = HashMap::new();
        for step in selection.active(steps) {
            debug!("Step {}: reading input for {}", step.index, step.name);
            for spec in &step.columns {
                let column = source.column(spec)?;
                check_len(&spec.name, column.len(), &mut n_events)?;
                columns.insert(spec.name.clone(), column);
            }
        }
        Ok(Self {
            n_events: n_events.unwrap_or_default(),
            columns,
        })
    }

    pub fn n_events(&self) -> usize {
        self.n_events
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn take_f32(&mut self, name: &str) -> Result<Option<Vec<f32>>> {
        match self.columns.remove(name) {
            None => Ok(None),
            Some(Column::F32(v)) => Ok(Some(v)),
            Some(_) => Err(type_error(name, "float")),
        }
    }

    pub fn take_u32(&mut self, name: &str) -> Result<Option<Vec<u32>>> {
        match self.columns.remove(name) {
            None => Ok(None),
            Some(Column::U32(v)) => Ok(Some(v)),
            Some(_) => Err(type_error(name, "unsigned int")),
        }
    }

    pub fn take_f32_vec(&mut self, name: &str) -> Result<Option<Vec<Vec<f32>>>> {
        match self.columns.remove(name) {
            None => Ok(None),
            Some(Column::F32Vec(v)) => Ok(Some(v)),
            Some(_) => Err(type_error(name, "vector<float>")),
        }
    }
}

/// A column that the first step always declares
pub(crate) fn required<T>(name: &str, column: Option<T>) -> Result<T> {
    column.ok_or_else(|| Error::MissingColumn(name.to_owned()))
}

/// Check that all columns have one entry per event
pub(crate) fn check_len(
    name: &str,
    len: usize,
    n_events: &mut Option<usize>,
) -> Result<()> {
    match n_events {
        Some(n) if *n != len => Err(Error::ColumnLength {
            column: name.to_owned(),
            event: len.min(*n),
        }),
        Some(_) => Ok(()),
        None => {
            *n_events = Some(len);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_is_named() {
        let cols = MemoryColumns::new().with("mu_average", Column::F32(vec![1.]));
        assert_eq!(cols.f32_column("mu_average").unwrap(), [1.]);
        match cols.f32_column("NPV") {
            Err(Error::MissingColumn(name)) => assert_eq!(name, "NPV"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn wrong_type() {
        let cols = MemoryColumns::new().with("NPV", Column::U32(vec![3]));
        assert!(cols.f32_column("NPV").is_err());
        assert_eq!(cols.u32_column("NPV").unwrap(), [3]);
    }

    fn source() -> MemoryColumns {
        MemoryColumns::new()
            .with("mu_average", Column::F32(vec![1., 2.]))
            .with("NPV", Column::U32(vec![3, 4]))
            .with("Jets_pt", Column::F32Vec(vec![vec![1.], vec![]]))
    }

    fn steps() -> Vec<Step> {
        vec![
            Step::new(1, "pileup", [ColumnSpec::f32("mu_average"), ColumnSpec::u32("NPV")]),
            Step::new(2, "jets", [ColumnSpec::f32_vec("Jets_pt")]),
            Step::new(3, "tracks", [ColumnSpec::f32_vec("Tracks_pt")]),
        ]
    }

    #[test]
    fn table_reads_active_steps_only() {
        let one = StepSelection::new(1).unwrap();
        let mut table = ColumnTable::read(&source(), &steps(), one).unwrap();
        assert_eq!(table.n_events(), 2);
        assert!(!table.contains("Jets_pt"));
        assert_eq!(table.take_u32("NPV").unwrap(), Some(vec![3, 4]));
        // taken columns are gone
        assert_eq!(table.take_u32("NPV").unwrap(), None);
        assert_eq!(table.take_f32_vec("Jets_pt").unwrap(), None);

        let two = StepSelection::new(2).unwrap();
        let mut table = ColumnTable::read(&source(), &steps(), two).unwrap();
        assert_eq!(table.take_f32_vec("Jets_pt").unwrap().unwrap().len(), 2);
        assert!(table.take_f32("NPV").is_err());

        match ColumnTable::read(&source(), &steps(), StepSelection::ALL) {
            Err(Error::MissingColumn(name)) => assert_eq!(name, "Tracks_pt"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn table_checks_lengths() {
        let src = source().with("NPV", Column::U32(vec![3]));
        let one = StepSelection::new(1).unwrap();
        assert!(matches!(
            ColumnTable::read(&src, &steps(), one),
            Err(Error::ColumnLength { .. })
        ));
    }

    #[test]
    fn lengths() {
        let mut n = None;
        check_len("a", 3, &mut n).unwrap();
        check_len("b", 3, &mut n).unwrap();
        assert!(matches!(
            check_len("c", 2, &mut n),
            Err(Error::ColumnLength { .. })
        ));
    }
}
