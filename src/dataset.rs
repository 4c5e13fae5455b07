//! Dataset directory layout and persistence of images and label files.
//!
//! ```text
//! <root>/images/<index>.png
//! <root>/labels/<index>.txt
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use bevy::prelude::*;
use image::ColorType;
use image::ImageFormat;

use crate::error::CaptureError;
use crate::frame::Frame;
use crate::label::NormalizedLabel;

pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";
pub const IMAGE_EXTENSION: &str = "png";
pub const LABEL_EXTENSION: &str = "txt";

/// Persists captured frames under an index.
pub trait ImageStore {
    fn write_image(&mut self, index: u64, frame: &Frame) -> Result<PathBuf, CaptureError>;
}

/// Persists the label lines of one image, replacing any previous content for the index.
pub trait LabelStore {
    fn write_labels(
        &mut self,
        index: u64,
        labels: &[NormalizedLabel],
    ) -> Result<PathBuf, CaptureError>;
}

/// `images/` and `labels/` directories under a dataset root.
#[derive(Resource, Debug, Clone)]
pub struct DatasetDirectory {
    images: PathBuf,
    labels: PathBuf,
}

impl DatasetDirectory {
    /// Uses `root`, creating both subdirectories when absent.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let root = root.as_ref();
        let images = root.join(IMAGES_DIR);
        let labels = root.join(LABELS_DIR);

        for dir in [&images, &labels] {
            fs::create_dir_all(dir).map_err(|source| CaptureError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self { images, labels })
    }

    pub fn image_path(&self, index: u64) -> PathBuf {
        self.images.join(format!("{index}.{IMAGE_EXTENSION}"))
    }

    pub fn label_path(&self, index: u64) -> PathBuf {
        self.labels.join(format!("{index}.{LABEL_EXTENSION}"))
    }
}

impl ImageStore for DatasetDirectory {
    fn write_image(&mut self, index: u64, frame: &Frame) -> Result<PathBuf, CaptureError> {
        let path = self.image_path(index);
        image::save_buffer_with_format(
            &path,
            frame.pixels(),
            frame.width(),
            frame.height(),
            ColorType::Rgb8,
            ImageFormat::Png,
        )
        .map_err(|source| CaptureError::WriteImage {
            path: path.clone(),
            source,
        })?;

        info!("Saved image at: {}", path.display());
        Ok(path)
    }
}

impl LabelStore for DatasetDirectory {
    fn write_labels(
        &mut self,
        index: u64,
        labels: &[NormalizedLabel],
    ) -> Result<PathBuf, CaptureError> {
        let path = self.label_path(index);
        let contents: String = labels.iter().map(|label| format!("{label}\n")).collect();

        // `File::create` truncates content left by an earlier run
        fs::File::create(&path)
            .and_then(|mut file| file.write_all(contents.as_bytes()))
            .map_err(|source| CaptureError::WriteLabels {
                path: path.clone(),
                source,
            })?;

        info!("Saved labeling data at: {}", path.display());
        Ok(path)
    }
}
