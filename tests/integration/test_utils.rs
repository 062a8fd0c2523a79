//! Helpers for writing DICOM slice folders.

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dicom_viewports::texture::{TextureError, TextureUploader};
use dicom_viewports::Volume;

/// A single 16-bit monochrome slice to be written to disk.
pub struct SliceSpec {
    pub instance_number: Option<i32>,
    pub width: u16,
    pub height: u16,
    pub samples: Vec<u16>,
    pub signed: bool,
}

impl SliceSpec {
    /// A slice where every sample has the same value.
    pub fn flat(instance_number: i32, width: u16, height: u16, value: u16) -> Self {
        Self {
            instance_number: Some(instance_number),
            width,
            height,
            samples: vec![value; width as usize * height as usize],
            signed: false,
        }
    }

    pub fn with_samples(instance_number: i32, width: u16, height: u16, samples: Vec<u16>) -> Self {
        assert_eq!(samples.len(), width as usize * height as usize);
        Self {
            instance_number: Some(instance_number),
            width,
            height,
            samples,
            signed: false,
        }
    }

    /// Mark the samples as two's complement (PixelRepresentation 1).
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn without_instance_number(mut self) -> Self {
        self.instance_number = None;
        self
    }
}

static NEXT_UID: AtomicUsize = AtomicUsize::new(1);

fn next_uid() -> String {
    format!(
        "1.2.826.0.1.3680043.2.1143.{}",
        NEXT_UID.fetch_add(1, Ordering::SeqCst)
    )
}

fn base_object(sop_instance_uid: &str) -> InMemDicomObject {
    InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::CT_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid),
        ),
    ])
}

fn write_object(obj: InMemDicomObject, path: &Path, sop_instance_uid: &str) {
    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .expect("should build file meta");
    file.write_to_file(path).expect("should write DICOM file");
}

/// Write `spec` as `dir/name` and return its path.
pub fn write_slice(dir: &Path, name: &str, spec: &SliceSpec) -> PathBuf {
    let path = dir.join(name);
    let uid = next_uid();

    let mut obj = base_object(&uid);
    if let Some(number) = spec.instance_number {
        obj.put(DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(number.to_string()),
        ));
    }
    obj.put(DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(spec.height)));
    obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(spec.width)));
    obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(u16::from(spec.signed)),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(spec.samples.iter().copied().collect()),
    ));

    write_object(obj, &path, &uid);
    path
}

/// A valid DICOM file carrying an Instance Number but no pixel data.
pub fn write_header_only(dir: &Path, name: &str, instance_number: i32) -> PathBuf {
    let path = dir.join(name);
    let uid = next_uid();
    let mut obj = base_object(&uid);
    obj.put(DataElement::new(
        tags::INSTANCE_NUMBER,
        VR::IS,
        PrimitiveValue::from(instance_number.to_string()),
    ));
    write_object(obj, &path, &uid);
    path
}

/// Write bytes that are not DICOM at all.
pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"this is not a DICOM file").expect("should write file");
    path
}

/// Stand-in texture that reports when it is released.
#[derive(Debug)]
pub struct FakeTexture {
    pub id: usize,
    pub depth: usize,
    released: Rc<RefCell<Vec<usize>>>,
}

impl Drop for FakeTexture {
    fn drop(&mut self) {
        self.released.borrow_mut().push(self.id);
    }
}

/// Hands out numbered [`FakeTexture`]s, starting at 1.
#[derive(Default)]
pub struct FakeUploader {
    next_id: RefCell<usize>,
    pub released: Rc<RefCell<Vec<usize>>>,
}

impl FakeUploader {
    pub fn released(&self) -> Vec<usize> {
        self.released.borrow().clone()
    }

    pub fn uploads(&self) -> usize {
        *self.next_id.borrow()
    }
}

impl TextureUploader for FakeUploader {
    type Texture = FakeTexture;

    fn upload(&self, volume: Volume) -> Result<FakeTexture, TextureError> {
        if volume.is_empty() {
            return Err(TextureError::Empty);
        }
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        Ok(FakeTexture {
            id: *next_id,
            depth: volume.depth(),
            released: self.released.clone(),
        })
    }
}
