//! The schematic: grid cells plus the dense component registry.
//!
//! The schematic owns topology only. Voltages, currents and histories live in
//! solver-side arenas indexed by the same component slots.

use crate::error::{GraphError, GraphResult};
use gv_components::ComponentKind;
use gv_core::{CompId, GridLocation, TermRef, TermSide, GRID_AXIS_MAX};

/// Maximum number of terminals a single grid cell can hold.
pub const CELL_TERMINAL_MAX: usize = 5;

/// A component placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedComponent {
    pub id: CompId,
    pub kind: ComponentKind,
    /// Terminal locations: `ends[0]` is terminal 0 (side A).
    pub ends: [GridLocation; 2],
}

impl PlacedComponent {
    /// Location of the given terminal.
    pub fn end(&self, side: TermSide) -> GridLocation {
        self.ends[side.index()]
    }
}

#[derive(Debug, Clone, Default)]
struct Cell {
    terminals: Vec<TermRef>,
    grounded: bool,
}

/// Grid plus component registry. Component slots are stable: deleting clears
/// the slot rather than compacting, so external references by id stay valid.
#[derive(Debug, Clone)]
pub struct Schematic {
    cols: u8,
    rows: u8,
    cells: Vec<Cell>,
    comps: Vec<Option<PlacedComponent>>,
    ground: Option<GridLocation>,
}

impl Default for Schematic {
    fn default() -> Self {
        Self::new()
    }
}

impl Schematic {
    /// Full-size 52x52 schematic.
    pub fn new() -> Self {
        Self::with_size(GRID_AXIS_MAX, GRID_AXIS_MAX)
    }

    pub fn with_size(cols: u8, rows: u8) -> Self {
        let cols = cols.min(GRID_AXIS_MAX);
        let rows = rows.min(GRID_AXIS_MAX);
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); cols as usize * rows as usize],
            comps: Vec::new(),
            ground: None,
        }
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Place a component between two grid locations, returning its id.
    ///
    /// Reuses the first cleared slot if one exists, otherwise appends.
    pub fn add(
        &mut self,
        kind: ComponentKind,
        a: GridLocation,
        b: GridLocation,
    ) -> GraphResult<CompId> {
        for loc in [a, b] {
            self.check_bounds(loc)?;
            if self.cell(loc).terminals.len() >= CELL_TERMINAL_MAX {
                return Err(GraphError::CellFull { loc });
            }
        }

        let slot = self.comps.iter().position(Option::is_none);
        let id = match slot {
            Some(i) => CompId::from_index(i as u32),
            None => CompId::from_index(self.comps.len() as u32),
        };

        let placed = PlacedComponent {
            id,
            kind,
            ends: [a, b],
        };
        match slot {
            Some(i) => self.comps[i] = Some(placed),
            None => self.comps.push(Some(placed)),
        }

        self.cell_mut(a)
            .terminals
            .push(TermRef::new(id, TermSide::A));
        self.cell_mut(b)
            .terminals
            .push(TermRef::new(id, TermSide::B));
        Ok(id)
    }

    /// Remove a component, clearing its slot.
    pub fn remove(&mut self, id: CompId) -> GraphResult<()> {
        let slot = id.index() as usize;
        let placed = self
            .comps
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or(GraphError::NoSuchComponent { comp: id })?;

        for side in [TermSide::A, TermSide::B] {
            let loc = placed.end(side);
            let term = TermRef::new(id, side);
            self.cell_mut(loc).terminals.retain(|t| *t != term);
        }
        Ok(())
    }

    pub fn component(&self, id: CompId) -> Option<&PlacedComponent> {
        self.comps.get(id.index() as usize).and_then(Option::as_ref)
    }

    /// Number of registry slots, cleared ones included.
    pub fn slot_count(&self) -> usize {
        self.comps.len()
    }

    /// Iterate over live components.
    pub fn components(&self) -> impl Iterator<Item = &PlacedComponent> {
        self.comps.iter().filter_map(Option::as_ref)
    }

    /// Terminals registered at a location.
    pub fn terminals_at(&self, loc: GridLocation) -> &[TermRef] {
        &self.cell(loc).terminals
    }

    pub fn ground(&self) -> Option<GridLocation> {
        self.ground
    }

    /// Set or clear the configured ground location. Call [`Self::mark_ground`]
    /// afterwards (and after every add/remove) to refresh the flood fill.
    pub fn set_ground(&mut self, loc: Option<GridLocation>) -> GraphResult<()> {
        if let Some(loc) = loc {
            self.check_bounds(loc)?;
        }
        self.ground = loc;
        Ok(())
    }

    pub fn is_grounded(&self, loc: GridLocation) -> bool {
        self.cell(loc).grounded
    }

    /// Flood-fill ground marks from the configured ground location through
    /// connector components. Clears all previous marks first; with no ground
    /// configured the grid simply ends up unmarked.
    pub fn mark_ground(&mut self) {
        for cell in &mut self.cells {
            cell.grounded = false;
        }
        let Some(seed) = self.ground else {
            return;
        };

        // Worklist with visited-by-location; connector cycles terminate
        // because a marked cell is never revisited.
        let mut work = vec![seed];
        while let Some(loc) = work.pop() {
            if self.cell(loc).grounded {
                continue;
            }
            self.cell_mut(loc).grounded = true;

            for i in 0..self.cell(loc).terminals.len() {
                let term = self.cell(loc).terminals[i];
                let placed = self
                    .component(term.comp)
                    .expect("cell lists a terminal of a cleared slot");
                if placed.kind.is_connector() {
                    let other = placed.end(term.side.other());
                    if !self.cell(other).grounded {
                        work.push(other);
                    }
                }
            }
        }
    }

    /// Sub-sized schematics address a smaller cell array than the full
    /// location space, so locations must be checked before indexing.
    fn check_bounds(&self, loc: GridLocation) -> GraphResult<()> {
        if loc.col() >= self.cols || loc.row() >= self.rows {
            return Err(GraphError::OutOfGrid { loc });
        }
        Ok(())
    }

    fn cell(&self, loc: GridLocation) -> &Cell {
        &self.cells[loc.cell_index(self.cols)]
    }

    fn cell_mut(&mut self, loc: GridLocation) -> &mut Cell {
        &mut self.cells[loc.cell_index(self.cols)]
    }
}
