//! Ordinal binding state shared by every expression configured against one row shape.
//!
//! A [`VarBindingContext`] is created once per row shape (typically once per
//! processing stage) and passed by `&mut` into every pipeline call for that
//! shape. It remembers which ordinals were referenced across all of those
//! calls; the flags only ever go from unreferenced to referenced.
//!
//! Column types and display names come from a [`VarResolver`]. [`RowShape`]
//! is the stock implementation; tests and embedders can plug in their own.

use crate::access::DataType;
use crate::expression::{ExpressionError, ExpressionResult, IndexedVar};
use log::trace;

/// Source of per-slot type and display name, addressed by 0-based slot
pub trait VarResolver {
    fn resolved_type(&self, slot: usize) -> DataType;
    fn display_name(&self, slot: usize) -> String;
}

impl<R: VarResolver + ?Sized> VarResolver for &R {
    fn resolved_type(&self, slot: usize) -> DataType {
        (**self).resolved_type(slot)
    }

    fn display_name(&self, slot: usize) -> String {
        (**self).display_name(slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnShape {
    pub data_type: DataType,
    pub name: String,
}

/// Column types and names of the rows an expression will be evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowShape {
    columns: Vec<ColumnShape>,
}

impl RowShape {
    /// Shape with default names `var0`, `var1`, ...
    pub fn new(types: Vec<DataType>) -> Self {
        Self::with_names(types, Vec::new())
    }

    /// Shape with explicit names; missing names fall back to the defaults
    pub fn with_names(types: Vec<DataType>, names: Vec<String>) -> Self {
        let mut names = names.into_iter();
        let columns = types
            .into_iter()
            .enumerate()
            .map(|(slot, data_type)| ColumnShape {
                data_type,
                name: names.next().unwrap_or_else(|| format!("var{}", slot)),
            })
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, slot: usize) -> Option<&ColumnShape> {
        self.columns.get(slot)
    }

    pub fn types(&self) -> Vec<DataType> {
        self.columns.iter().map(|c| c.data_type.clone()).collect()
    }
}

impl VarResolver for RowShape {
    fn resolved_type(&self, slot: usize) -> DataType {
        self.column(slot)
            .map_or(DataType::Unknown, |c| c.data_type.clone())
    }

    fn display_name(&self, slot: usize) -> String {
        self.column(slot)
            .map_or_else(|| format!("@{}", slot + 1), |c| c.name.clone())
    }
}

/// Ordinal slots of one row shape plus their `referenced` flags
#[derive(Debug, Clone)]
pub struct VarBindingContext<R = RowShape> {
    resolver: R,
    referenced: Vec<bool>,
}

impl<R: VarResolver> VarBindingContext<R> {
    /// Context with `capacity` slots, none referenced yet
    pub fn new(resolver: R, capacity: usize) -> Self {
        Self {
            resolver,
            referenced: vec![false; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.referenced.len()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Whether any expression bound so far referenced `slot`
    pub fn is_referenced(&self, slot: usize) -> bool {
        self.referenced.get(slot).copied().unwrap_or(false)
    }

    /// Referenced slots in ascending order
    pub fn referenced_slots(&self) -> Vec<usize> {
        self.referenced
            .iter()
            .enumerate()
            .filter_map(|(slot, &used)| used.then_some(slot))
            .collect()
    }

    /// Bind the 1-based `ordinal` to slot `ordinal - 1` and mark it referenced
    pub fn bind_ordinal(&mut self, ordinal: u64) -> ExpressionResult<IndexedVar> {
        if ordinal < 1 {
            return Err(ExpressionError::InvalidOrdinal { ordinal });
        }

        let slot = usize::try_from(ordinal - 1)
            .ok()
            .filter(|&slot| slot < self.capacity())
            .ok_or(ExpressionError::OrdinalOutOfRange {
                ordinal,
                capacity: self.capacity(),
            })?;

        if !self.referenced[slot] {
            trace!("slot {} referenced for the first time", slot);
            self.referenced[slot] = true;
        }

        Ok(IndexedVar::new(
            slot,
            self.resolver.display_name(slot),
            self.resolver.resolved_type(slot),
        ))
    }
}

impl VarBindingContext<RowShape> {
    /// One slot per column of `shape`
    pub fn for_row_shape(shape: RowShape) -> Self {
        let capacity = shape.len();
        Self::new(shape, capacity)
    }

    /// Context with no slots, for expressions that never reference a row
    pub fn empty() -> Self {
        Self::for_row_shape(RowShape::default())
    }
}
