//! # Writer
//!
//! Accumulates the output bytes and remembers where every object starts,
//! so the cross-reference table can be emitted once all objects are out.
//! Every `write` call ends its line with `\n`.
//!
//! Objects must be handed over in final order. [`renumber`] turns a
//! write-ordered plan with arbitrary allocated ids into one numbered
//! `1..=n`, which keeps xref line `i` pointing at object `i`.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use super::object::{IndirectObject, ObjectId};
use crate::error::{FolioError, Result};

pub const EOL: &[u8] = b"\n";

#[derive(Debug, Default)]
pub struct Writer {
    buffer: Vec<u8>,
    /// Written objects and their byte offsets, in write order.
    offsets: Vec<(ObjectId, usize)>,
    written: HashSet<ObjectId>,
    referenced: BTreeSet<ObjectId>,
    xref_offset: Option<usize>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte position.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append one line.
    pub fn write(&mut self, line: impl AsRef<[u8]>) {
        self.buffer.extend_from_slice(line.as_ref());
        self.buffer.extend_from_slice(EOL);
    }

    /// Emit `N 0 obj`, the dictionary, the optional stream and `endobj`,
    /// recording the object's offset. Each object may be written once.
    pub fn write_object(&mut self, object: &IndirectObject) -> Result<()> {
        if !self.written.insert(object.id) {
            return Err(FolioError::DuplicateObject(object.id.number()));
        }
        let dict = object.output_dict();
        self.referenced.extend(dict.references());
        self.offsets.push((object.id, self.buffer.len()));

        self.write(format!("{} 0 obj", object.id.number()));
        self.write(dict.to_pdf());
        if let Some(stream) = &object.stream {
            self.write("stream");
            self.write(stream.data());
            self.write("endstream");
        }
        self.write("endobj");
        debug!(
            "wrote object {} ({} bytes so far)",
            object.id.number(),
            self.buffer.len()
        );
        Ok(())
    }

    /// Written objects with their offsets, in write order.
    pub fn offsets(&self) -> &[(ObjectId, usize)] {
        &self.offsets
    }

    pub fn object_count(&self) -> usize {
        self.offsets.len()
    }

    /// Offset of the `xref` keyword, once the table has been written.
    pub fn xref_offset(&self) -> Option<usize> {
        self.xref_offset
    }

    pub(crate) fn mark_xref(&mut self) {
        self.xref_offset = Some(self.buffer.len());
    }

    /// Fails on the first object referenced but never written.
    pub fn check_references(&self) -> Result<()> {
        match self.referenced.iter().find(|id| !self.written.contains(id)) {
            Some(id) => Err(FolioError::DanglingReference(id.number())),
            None => Ok(()),
        }
    }

    pub(crate) fn note_reference(&mut self, id: ObjectId) {
        self.referenced.insert(id);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Renumber `objects` to `1..=n` in slice order and rewrite every
/// reference. Returns the old → new id map so callers can translate ids
/// held outside the objects (trailer `/Root`, `/Info`).
///
/// An id appearing twice is a [`FolioError::DuplicateObject`]; a reference
/// to an id not in the slice is a [`FolioError::DanglingReference`].
pub fn renumber(objects: &mut [IndirectObject]) -> Result<HashMap<ObjectId, ObjectId>> {
    let mut map = HashMap::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        let new_id = ObjectId(index as u32 + 1);
        if map.insert(object.id, new_id).is_some() {
            return Err(FolioError::DuplicateObject(object.id.number()));
        }
    }
    let mut lookup = |id: ObjectId| {
        map.get(&id)
            .copied()
            .ok_or(FolioError::DanglingReference(id.number()))
    };
    for object in objects.iter_mut() {
        object.id = lookup(object.id)?;
        object.dict.map_refs(&mut lookup)?;
    }
    Ok(map)
}
