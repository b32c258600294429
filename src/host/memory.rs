//! host::memory
//!
//! In-memory mesh editor for the CLI and for deterministic testing.
//!
//! # Design
//!
//! `MemoryMesh` implements [`MeshEditor`] over plain vectors. It behaves like
//! a small edit-mode host:
//!
//! - Working layers live only while a session is open; opening or closing a
//!   session drops them, the persisted attributes survive
//! - User-style selection ([`MemoryMesh::select`]) flushes between element
//!   kinds and records selection history; the raw trait setters do not
//! - Native delete removes the selected vertices together with every edge and
//!   face using them, and keeps working layers and point attributes
//!   index-aligned with the surviving vertices
//! - Every session service and native operator call is recorded so tests can
//!   assert on what the engine asked the host to do
//!
//! Failures can be injected per operation with [`FailOn`].
//!
//! # Example
//!
//! ```
//! use meshlock::core::types::ElemKind;
//! use meshlock::host::{HostOp, MemoryMesh, MeshEditor};
//!
//! let mut mesh = MemoryMesh::grid(1, 1);
//! mesh.select(ElemKind::Vert, &[0], false).unwrap();
//! mesh.delete_verts().unwrap();
//!
//! assert_eq!(mesh.len(ElemKind::Vert), 3);
//! assert_eq!(mesh.len(ElemKind::Face), 0);
//! assert!(matches!(mesh.operations()[0], HostOp::DeleteVerts { removed: 1 }));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::traits::{HostError, MeshEditor, Position};
use crate::core::types::{ElemFlags, ElemKind, ObjectId, SelectMode};

/// A stored vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertData {
    /// Object-space position
    pub co: Position,
    /// Visibility and selection
    #[serde(flatten)]
    pub flags: ElemFlags,
}

/// A stored edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Endpoint vertex indices
    pub verts: [usize; 2],
    /// Visibility and selection
    #[serde(flatten)]
    pub flags: ElemFlags,
}

/// A stored face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceData {
    /// Vertex indices in winding order
    pub verts: Vec<usize>,
    /// Visibility and selection
    #[serde(flatten)]
    pub flags: ElemFlags,
}

/// Durable mesh data: geometry, flags and persisted point attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub verts: Vec<VertData>,
    pub edges: Vec<EdgeData>,
    pub faces: Vec<FaceData>,
    /// Integer point attributes, index-aligned to `verts`
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<i32>>,
}

impl MeshData {
    /// Build a flat grid of `cols` x `rows` quads on the XY plane.
    ///
    /// Vertices are numbered row by row, `(cols + 1) * (rows + 1)` in total.
    pub fn grid(cols: usize, rows: usize) -> Self {
        let mut data = MeshData::default();
        let stride = cols + 1;

        for y in 0..=rows {
            for x in 0..=cols {
                data.verts.push(VertData {
                    co: [x as f32, y as f32, 0.0],
                    flags: ElemFlags::VISIBLE,
                });
            }
        }

        let mut edge_index: HashMap<(usize, usize), usize> = HashMap::new();
        let mut add_edge = |data: &mut MeshData, a: usize, b: usize| {
            let key = (a.min(b), a.max(b));
            if !edge_index.contains_key(&key) {
                edge_index.insert(key, data.edges.len());
                data.edges.push(EdgeData {
                    verts: [a, b],
                    flags: ElemFlags::VISIBLE,
                });
            }
        };

        for y in 0..=rows {
            for x in 0..cols {
                let a = y * stride + x;
                add_edge(&mut data, a, a + 1);
            }
        }
        for y in 0..rows {
            for x in 0..=cols {
                let a = y * stride + x;
                add_edge(&mut data, a, a + stride);
            }
        }
        for y in 0..rows {
            for x in 0..cols {
                let a = y * stride + x;
                data.faces.push(FaceData {
                    verts: vec![a, a + 1, a + 1 + stride, a + stride],
                    flags: ElemFlags::VISIBLE,
                });
            }
        }

        data
    }

    /// Check that every edge and face references an existing vertex.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.verts.len();
        for (i, e) in self.edges.iter().enumerate() {
            if e.verts.iter().any(|v| *v >= n) {
                return Err(format!("edge {} references a missing vertex", i));
            }
            if e.verts[0] == e.verts[1] {
                return Err(format!("edge {} is degenerate", i));
            }
        }
        for (i, f) in self.faces.iter().enumerate() {
            if f.verts.len() < 3 {
                return Err(format!("face {} has fewer than 3 vertices", i));
            }
            if f.verts.iter().any(|v| *v >= n) {
                return Err(format!("face {} references a missing vertex", i));
            }
        }
        Ok(())
    }
}

/// Operation to fail on (for testing error paths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Incidence queries for this vertex report a stale reference.
    StaleIncidence(usize),
    /// Native delete-by-vertex fails.
    DeleteVerts,
    /// Native delete menu fails.
    DeleteMenu,
    /// Native move fails.
    Translate,
}

/// Recorded host call for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    ClearHistory,
    Update { destructive: bool },
    WriteAttribute { name: String, len: usize },
    DeleteVerts { removed: usize },
    DeleteMenu,
    Translate { moved: usize },
}

/// In-memory mesh editor.
#[derive(Debug, Clone)]
pub struct MemoryMesh {
    id: ObjectId,
    is_mesh: bool,
    editing: bool,
    mode: SelectMode,
    data: MeshData,
    /// Working layers, present only while a session is open.
    layers: BTreeMap<String, Vec<i32>>,
    history: Vec<(ElemKind, usize)>,
    translate_offset: Position,
    fail_on: Option<FailOn>,
    operations: Vec<HostOp>,
}

impl MemoryMesh {
    /// Wrap mesh data in an open edit session.
    pub fn new(data: MeshData) -> Self {
        Self {
            id: ObjectId::new(),
            is_mesh: true,
            editing: true,
            mode: SelectMode::Vertex,
            data,
            layers: BTreeMap::new(),
            history: Vec::new(),
            translate_offset: [0.0, 0.0, 0.0],
            fail_on: None,
            operations: Vec::new(),
        }
    }

    /// A grid mesh in an open edit session. See [`MeshData::grid`].
    pub fn grid(cols: usize, rows: usize) -> Self {
        Self::new(MeshData::grid(cols, rows))
    }

    /// A mesh of `count` loose vertices along the X axis.
    pub fn points(count: usize) -> Self {
        let verts = (0..count)
            .map(|i| VertData {
                co: [i as f32, 0.0, 0.0],
                flags: ElemFlags::VISIBLE,
            })
            .collect();
        Self::new(MeshData {
            verts,
            ..MeshData::default()
        })
    }

    /// Use a specific object id.
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    /// Use a specific selection mode.
    pub fn with_mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    /// Offset applied by the native move.
    pub fn with_translate_offset(mut self, offset: Position) -> Self {
        self.translate_offset = offset;
        self
    }

    /// Change the offset applied by the native move.
    pub fn set_translate_offset(&mut self, offset: Position) {
        self.translate_offset = offset;
    }

    /// Configure an operation to fail.
    pub fn fail_on(&mut self, fail: FailOn) {
        self.fail_on = Some(fail);
    }

    /// Clear any configured failure.
    pub fn clear_fail(&mut self) {
        self.fail_on = None;
    }

    /// Change the host-wide selection mode.
    pub fn set_select_mode(&mut self, mode: SelectMode) {
        self.mode = mode;
    }

    /// Mark the object as mesh or non-mesh.
    pub fn set_is_mesh(&mut self, is_mesh: bool) {
        self.is_mesh = is_mesh;
    }

    /// Open a fresh edit session. Working layers start empty.
    pub fn open_session(&mut self) {
        self.editing = true;
        self.layers.clear();
        self.history.clear();
    }

    /// Close the edit session, dropping working layers.
    pub fn close_session(&mut self) {
        self.editing = false;
        self.layers.clear();
        self.history.clear();
    }

    /// Borrow the durable data.
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Mutable access to the durable data, for simulating external edits.
    pub fn data_mut(&mut self) -> &mut MeshData {
        &mut self.data
    }

    /// Consume the mesh, returning its durable data.
    pub fn into_data(self) -> MeshData {
        self.data
    }

    /// Borrow a working layer.
    pub fn layer(&self, name: &str) -> Option<&[i32]> {
        self.layers.get(name).map(Vec::as_slice)
    }

    /// Mutable access to a working layer, for simulating external edits.
    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Vec<i32>> {
        self.layers.get_mut(name)
    }

    /// All working layers by name.
    pub fn layers(&self) -> &BTreeMap<String, Vec<i32>> {
        &self.layers
    }

    /// Reinstate a working layer kept from an earlier call in the same
    /// session. The layer is padded or cut to the vertex count.
    pub fn restore_layer(&mut self, name: &str, mut values: Vec<i32>) {
        if !self.editing {
            return;
        }
        values.resize(self.data.verts.len(), 0);
        self.layers.insert(name.to_string(), values);
    }

    /// Recorded host calls, oldest first.
    pub fn operations(&self) -> &[HostOp] {
        &self.operations
    }

    /// Forget recorded host calls.
    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }

    /// Selection history, oldest first.
    pub fn history(&self) -> &[(ElemKind, usize)] {
        &self.history
    }

    /// Indices of elements of a kind that are selected and visible.
    pub fn selected(&self, kind: ElemKind) -> Vec<usize> {
        self.flag_slice(kind)
            .enumerate()
            .filter(|(_, f)| f.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of hidden elements of a kind.
    pub fn hidden(&self, kind: ElemKind) -> Vec<usize> {
        self.flag_slice(kind)
            .enumerate()
            .filter(|(_, f)| f.hidden)
            .map(|(i, _)| i)
            .collect()
    }

    // -------------------------------------------------------------------------
    // User-style selection
    // -------------------------------------------------------------------------

    /// Select elements the way a user click would.
    ///
    /// Hidden elements cannot be selected and are skipped. Selection is
    /// flushed: picking an edge or face selects its vertices, and edges/faces
    /// whose vertices are all selected become selected.
    ///
    /// # Errors
    ///
    /// Returns `HostError::StaleReference` for an out-of-range index; nothing
    /// is changed in that case.
    pub fn select(
        &mut self,
        kind: ElemKind,
        indices: &[usize],
        extend: bool,
    ) -> Result<(), HostError> {
        let count = self.len(kind);
        if let Some(bad) = indices.iter().find(|i| **i >= count) {
            return Err(HostError::stale(kind, *bad));
        }

        if !extend {
            self.deselect_all();
        }

        for &index in indices {
            if self.flags(kind, index)?.hidden {
                continue;
            }
            self.set_selected(kind, index, true)?;
            self.history.push((kind, index));
            match kind {
                ElemKind::Vert => {}
                ElemKind::Edge => {
                    for v in self.data.edges[index].verts {
                        if !self.data.verts[v].flags.hidden {
                            self.data.verts[v].flags.selected = true;
                        }
                    }
                }
                ElemKind::Face => {
                    for v in self.data.faces[index].verts.clone() {
                        if !self.data.verts[v].flags.hidden {
                            self.data.verts[v].flags.selected = true;
                        }
                    }
                }
            }
        }

        self.flush_selection();
        Ok(())
    }

    /// Select every visible element.
    pub fn select_all(&mut self) {
        for v in &mut self.data.verts {
            v.flags.selected = !v.flags.hidden;
        }
        for e in &mut self.data.edges {
            e.flags.selected = !e.flags.hidden;
        }
        for f in &mut self.data.faces {
            f.flags.selected = !f.flags.hidden;
        }
    }

    /// Deselect everything and forget history.
    pub fn deselect_all(&mut self) {
        for v in &mut self.data.verts {
            v.flags.selected = false;
        }
        for e in &mut self.data.edges {
            e.flags.selected = false;
        }
        for f in &mut self.data.faces {
            f.flags.selected = false;
        }
        self.history.clear();
    }

    /// Propagate vertex selection up to edges and faces.
    fn flush_selection(&mut self) {
        let verts = &self.data.verts;
        let picked = |v: &usize| verts[*v].flags.selected && !verts[*v].flags.hidden;
        for e in &mut self.data.edges {
            if !e.flags.hidden && e.verts.iter().all(picked) {
                e.flags.selected = true;
            }
        }
        for f in &mut self.data.faces {
            if !f.flags.hidden && f.verts.iter().all(picked) {
                f.flags.selected = true;
            }
        }
    }

    fn flag_slice(&self, kind: ElemKind) -> Box<dyn Iterator<Item = &ElemFlags> + '_> {
        match kind {
            ElemKind::Vert => Box::new(self.data.verts.iter().map(|v| &v.flags)),
            ElemKind::Edge => Box::new(self.data.edges.iter().map(|e| &e.flags)),
            ElemKind::Face => Box::new(self.data.faces.iter().map(|f| &f.flags)),
        }
    }

    fn flags_mut(&mut self, kind: ElemKind, index: usize) -> Result<&mut ElemFlags, HostError> {
        let flags = match kind {
            ElemKind::Vert => self.data.verts.get_mut(index).map(|v| &mut v.flags),
            ElemKind::Edge => self.data.edges.get_mut(index).map(|e| &mut e.flags),
            ElemKind::Face => self.data.faces.get_mut(index).map(|f| &mut f.flags),
        };
        flags.ok_or(HostError::stale(kind, index))
    }

    fn check_incidence(&self, vert: usize) -> Result<(), HostError> {
        if vert >= self.data.verts.len() || self.fail_on == Some(FailOn::StaleIncidence(vert)) {
            return Err(HostError::stale(ElemKind::Vert, vert));
        }
        Ok(())
    }

    fn check_operator(&self, fail: FailOn, operator: &str) -> Result<(), HostError> {
        if self.fail_on.as_ref() == Some(&fail) {
            return Err(HostError::Operator {
                operator: operator.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    /// Remove the selected visible vertices and everything using them.
    fn remove_selected_verts(&mut self) -> usize {
        let doomed: BTreeSet<usize> = self.selected(ElemKind::Vert).into_iter().collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut remap = vec![None; self.data.verts.len()];
        let mut next = 0;
        for (old, slot) in remap.iter_mut().enumerate() {
            if !doomed.contains(&old) {
                *slot = Some(next);
                next += 1;
            }
        }

        let keep = |i: &usize| !doomed.contains(i);
        let survivors: Vec<usize> = (0..self.data.verts.len()).filter(keep).collect();

        self.data.verts = survivors
            .iter()
            .map(|i| self.data.verts[*i].clone())
            .collect();

        self.data.edges.retain(|e| e.verts.iter().all(keep));
        for e in &mut self.data.edges {
            for v in &mut e.verts {
                *v = remap[*v].unwrap_or(*v);
            }
        }

        self.data.faces.retain(|f| f.verts.iter().all(keep));
        for f in &mut self.data.faces {
            for v in &mut f.verts {
                *v = remap[*v].unwrap_or(*v);
            }
        }

        let compact = |values: &Vec<i32>| -> Vec<i32> {
            survivors
                .iter()
                .filter_map(|i| values.get(*i).copied())
                .collect()
        };
        for values in self.layers.values_mut() {
            *values = compact(values);
        }
        for values in self.data.attributes.values_mut() {
            *values = compact(values);
        }

        self.history.clear();
        doomed.len()
    }

    /// Vertices covered by the current selection in the current mode.
    fn selection_verts(&self) -> BTreeSet<usize> {
        let mut verts = BTreeSet::new();
        match self.mode {
            SelectMode::Vertex => verts.extend(self.selected(ElemKind::Vert)),
            SelectMode::Edge => {
                for e in self.selected(ElemKind::Edge) {
                    verts.extend(self.data.edges[e].verts);
                }
            }
            SelectMode::Face => {
                for f in self.selected(ElemKind::Face) {
                    verts.extend(self.data.faces[f].verts.iter().copied());
                }
            }
        }
        verts.retain(|v| !self.data.verts[*v].flags.hidden);
        verts
    }
}

impl MeshEditor for MemoryMesh {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn is_mesh(&self) -> bool {
        self.is_mesh
    }

    fn is_editing(&self) -> bool {
        self.editing
    }

    fn select_mode(&self) -> SelectMode {
        self.mode
    }

    fn len(&self, kind: ElemKind) -> usize {
        match kind {
            ElemKind::Vert => self.data.verts.len(),
            ElemKind::Edge => self.data.edges.len(),
            ElemKind::Face => self.data.faces.len(),
        }
    }

    fn flags(&self, kind: ElemKind, index: usize) -> Result<ElemFlags, HostError> {
        let flags = match kind {
            ElemKind::Vert => self.data.verts.get(index).map(|v| v.flags),
            ElemKind::Edge => self.data.edges.get(index).map(|e| e.flags),
            ElemKind::Face => self.data.faces.get(index).map(|f| f.flags),
        };
        flags.ok_or(HostError::stale(kind, index))
    }

    fn set_hidden(&mut self, kind: ElemKind, index: usize, hidden: bool) -> Result<(), HostError> {
        self.flags_mut(kind, index)?.hidden = hidden;
        Ok(())
    }

    fn set_selected(
        &mut self,
        kind: ElemKind,
        index: usize,
        selected: bool,
    ) -> Result<(), HostError> {
        self.flags_mut(kind, index)?.selected = selected;
        Ok(())
    }

    fn position(&self, vert: usize) -> Result<Position, HostError> {
        self.data
            .verts
            .get(vert)
            .map(|v| v.co)
            .ok_or(HostError::stale(ElemKind::Vert, vert))
    }

    fn edge_verts(&self, edge: usize) -> Result<[usize; 2], HostError> {
        self.data
            .edges
            .get(edge)
            .map(|e| e.verts)
            .ok_or(HostError::stale(ElemKind::Edge, edge))
    }

    fn face_verts(&self, face: usize) -> Result<Vec<usize>, HostError> {
        self.data
            .faces
            .get(face)
            .map(|f| f.verts.clone())
            .ok_or(HostError::stale(ElemKind::Face, face))
    }

    fn vert_edges(&self, vert: usize) -> Result<Vec<usize>, HostError> {
        self.check_incidence(vert)?;
        Ok(self
            .data
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.verts.contains(&vert))
            .map(|(i, _)| i)
            .collect())
    }

    fn vert_faces(&self, vert: usize) -> Result<Vec<usize>, HostError> {
        self.check_incidence(vert)?;
        Ok(self
            .data
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.verts.contains(&vert))
            .map(|(i, _)| i)
            .collect())
    }

    fn has_vert_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    fn ensure_vert_layer(&mut self, name: &str) {
        let count = self.data.verts.len();
        let layer = self.layers.entry(name.to_string()).or_default();
        layer.resize(count, 0);
    }

    fn vert_layer_value(&self, name: &str, vert: usize) -> Option<i32> {
        self.layers.get(name).and_then(|l| l.get(vert)).copied()
    }

    fn set_vert_layer_value(
        &mut self,
        name: &str,
        vert: usize,
        value: i32,
    ) -> Result<(), HostError> {
        let layer = self
            .layers
            .get_mut(name)
            .ok_or_else(|| HostError::MissingLayer(name.to_string()))?;
        let slot = layer
            .get_mut(vert)
            .ok_or(HostError::stale(ElemKind::Vert, vert))?;
        *slot = value;
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Vec<i32>> {
        self.data.attributes.get(name).cloned()
    }

    fn write_attribute(&mut self, name: &str, values: Vec<i32>) -> Result<(), HostError> {
        self.operations.push(HostOp::WriteAttribute {
            name: name.to_string(),
            len: values.len(),
        });
        self.data.attributes.insert(name.to_string(), values);
        Ok(())
    }

    fn clear_select_history(&mut self) {
        self.history.clear();
        self.operations.push(HostOp::ClearHistory);
    }

    fn update(&mut self, destructive: bool) {
        self.operations.push(HostOp::Update { destructive });
    }

    fn delete_verts(&mut self) -> Result<(), HostError> {
        self.check_operator(FailOn::DeleteVerts, "mesh.delete")?;
        let removed = self.remove_selected_verts();
        self.operations.push(HostOp::DeleteVerts { removed });
        Ok(())
    }

    fn delete_menu(&mut self) -> Result<(), HostError> {
        self.check_operator(FailOn::DeleteMenu, "wm.call_menu")?;
        self.operations.push(HostOp::DeleteMenu);
        // The headless menu always picks "Vertices".
        let removed = self.remove_selected_verts();
        self.operations.push(HostOp::DeleteVerts { removed });
        Ok(())
    }

    fn translate(&mut self) -> Result<(), HostError> {
        self.check_operator(FailOn::Translate, "transform.translate")?;
        let moved = self.selection_verts();
        let offset = self.translate_offset;
        for v in &moved {
            let co = &mut self.data.verts[*v].co;
            for axis in 0..3 {
                co[axis] += offset[axis];
            }
        }
        self.operations.push(HostOp::Translate { moved: moved.len() });
        Ok(())
    }
}
