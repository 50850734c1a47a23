//! Per-page resource registry.

use indexmap::IndexSet;

use super::object::{Dictionary, IndirectObject, ObjectId, Value};

/// Fonts and images a page's content stream uses. Each resource appears
/// once however many elements draw with it; entries keep first-use order.
#[derive(Debug, Clone)]
pub struct Resources {
    pub id: ObjectId,
    fonts: IndexSet<ObjectId>,
    images: IndexSet<ObjectId>,
}

impl Resources {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            fonts: IndexSet::new(),
            images: IndexSet::new(),
        }
    }

    pub fn add_font(&mut self, font: ObjectId) {
        self.fonts.insert(font);
    }

    pub fn add_image(&mut self, image: ObjectId) {
        self.images.insert(image);
    }

    pub fn fonts(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.fonts.iter().copied()
    }

    pub fn images(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.images.iter().copied()
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
        self.images.clear();
    }

    pub fn to_object(&self) -> IndirectObject {
        let mut dict = Dictionary::new();
        dict.set(
            "ProcSet",
            Value::Array(
                ["PDF", "Text", "ImageB", "ImageC", "ImageI"]
                    .into_iter()
                    .map(Value::name)
                    .collect(),
            ),
        );
        dict.set_opt("Font", sub_dictionary(&self.fonts));
        dict.set_opt("XObject", sub_dictionary(&self.images));
        IndirectObject::new(self.id, dict)
    }
}

/// `<< /R4 4 0 R ... >>`, or nothing when the set is empty.
fn sub_dictionary(ids: &IndexSet<ObjectId>) -> Option<Dictionary> {
    if ids.is_empty() {
        return None;
    }
    let mut dict = Dictionary::new();
    for id in ids {
        dict.set(&id.resource_name(), *id);
    }
    Some(dict)
}
