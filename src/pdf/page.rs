//! A single page: its `/Page` dictionary, content stream and resources.

use serde::{Deserialize, Serialize};

use super::blocks::Contents;
use super::object::{Dictionary, IdAllocator, IndirectObject, ObjectId, Value};
use super::resources::Resources;

/// A rectangle in default user space, `[llx lly urx ury]`.
pub type PageBox = [f64; 4];

/// Geometry of a page. Boxes other than the media box are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Clockwise display rotation, a multiple of 90.
    pub rotate: i32,
    pub crop_box: Option<PageBox>,
    pub bleed_box: Option<PageBox>,
    pub trim_box: Option<PageBox>,
    pub art_box: Option<PageBox>,
    pub user_unit: f64,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        Self::new(595.28, 841.89)
    }
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rotate: 0,
            crop_box: None,
            bleed_box: None,
            trim_box: None,
            art_box: None,
            user_unit: 1.0,
        }
    }

    pub fn rotated(mut self, degrees: i32) -> Self {
        self.rotate = degrees;
        self
    }
}

/// The three objects a page contributes, allocated together when the page
/// is added to a document.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: ObjectId,
    pub geometry: PageGeometry,
    pub resources: Resources,
    pub contents: Contents,
}

impl Page {
    pub fn new(ids: &mut IdAllocator, geometry: PageGeometry) -> Self {
        let resources = Resources::new(ids.next_id());
        let contents = Contents { id: ids.next_id() };
        Self {
            id: ids.next_id(),
            geometry,
            resources,
            contents,
        }
    }

    fn dictionary(&self, parent: ObjectId) -> Dictionary {
        let g = &self.geometry;
        let mut dict = Dictionary::typed("Page");
        dict.set("Parent", parent)
            .set("Resources", self.resources.id)
            .set("Contents", self.contents.id)
            .set("Rotate", g.rotate)
            .set("MediaBox", Value::numbers([0.0, 0.0, g.width, g.height]))
            .set_opt("CropBox", g.crop_box.map(Value::numbers))
            .set_opt("BleedBox", g.bleed_box.map(Value::numbers))
            .set_opt("TrimBox", g.trim_box.map(Value::numbers))
            .set_opt("ArtBox", g.art_box.map(Value::numbers));
        if g.user_unit != 1.0 {
            dict.set("UserUnit", g.user_unit);
        }
        dict
    }

    /// Resources, then Contents, then the Page itself.
    pub fn objects(&self, parent: ObjectId, operators: &[u8], compress: bool) -> Vec<IndirectObject> {
        vec![
            self.resources.to_object(),
            self.contents.to_object(operators, compress),
            IndirectObject::new(self.id, self.dictionary(parent)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_write_order_and_links() {
        let mut ids = IdAllocator::new();
        let parent = ids.next_id();
        let page = Page::new(&mut ids, PageGeometry::new(612.0, 792.0));
        let objects = page.objects(parent, b"", false);

        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].id, page.resources.id);
        assert_eq!(objects[1].id, page.contents.id);
        assert_eq!(objects[2].id, page.id);

        let dict = objects[2].dict.to_pdf();
        assert_eq!(
            dict,
            format!(
                "<< /Type /Page /Parent {} 0 R /Resources {} 0 R /Contents {} 0 R /Rotate 0 /MediaBox [0 0 612 792] >>",
                parent.number(),
                page.resources.id.number(),
                page.contents.id.number()
            )
        );
    }

    #[test]
    fn test_optional_boxes_and_user_unit() {
        let mut ids = IdAllocator::new();
        let mut geometry = PageGeometry::new(100.0, 200.0).rotated(90);
        geometry.crop_box = Some([5.0, 5.0, 95.0, 195.0]);
        geometry.trim_box = Some([10.0, 10.0, 90.0, 190.0]);
        geometry.user_unit = 2.0;
        let page = Page::new(&mut ids, geometry);
        let dict = page.dictionary(ObjectId(99)).to_pdf();

        assert!(dict.contains("/Rotate 90"));
        assert!(dict.contains("/CropBox [5 5 95 195]"));
        assert!(dict.contains("/TrimBox [10 10 90 190]"));
        assert!(!dict.contains("/BleedBox"));
        assert!(!dict.contains("/ArtBox"));
        assert!(dict.contains("/UserUnit 2"));
    }

    #[test]
    fn test_contents_carry_prologue() {
        let mut ids = IdAllocator::new();
        let page = Page::new(&mut ids, PageGeometry::default());
        let objects = page.objects(ObjectId(1), b"q\nQ\n", false);
        let stream = objects[1].stream.as_ref().unwrap();
        assert_eq!(stream.data(), b"1 w\n0 G\nq\nQ\n");
    }
}
