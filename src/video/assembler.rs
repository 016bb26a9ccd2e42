use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops, RgbImage};
use tracing::{debug, info, warn};

use crate::error::{EncodingError, InputError, Result};

/// The stitched strip of stamped images the pan moves across
#[derive(Debug, Clone)]
pub struct Panorama {
    /// Pixel data, shared read-only with the pan clip
    pub image: Arc<RgbImage>,

    /// Where the panorama was written
    pub path: PathBuf,

    /// Number of source images
    pub image_count: usize,

    /// `image_count × per_image_seconds`
    pub suggested_duration: f64,
}

impl Panorama {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Concatenates stamped images left-to-right into one wide canvas
pub struct PanoramaAssembler {
    output_path: PathBuf,
    per_image_seconds: f64,
}

impl PanoramaAssembler {
    pub fn new<P: Into<PathBuf>>(output_path: P, per_image_seconds: f64) -> Self {
        Self {
            output_path: output_path.into(),
            per_image_seconds,
        }
    }

    /// Load every image in `dir`, stitch them and persist the result
    pub fn assemble_directory<P: AsRef<Path>>(&self, dir: P) -> Result<Panorama> {
        let paths = Self::collect_images(dir.as_ref())?;
        self.assemble(&paths)
    }

    /// Stitch the given images in order and persist the result
    pub fn assemble(&self, paths: &[PathBuf]) -> Result<Panorama> {
        if paths.is_empty() {
            return Err(InputError::NoImages {
                path: self.output_path.display().to_string(),
            }.into());
        }

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let image = image::open(path).map_err(|e| InputError::ImageLoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let image = image.to_rgb8();
            debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
            images.push(image);
        }

        let panorama = Self::stitch(&images);
        info!("Stitched {} images into {}x{} panorama",
              images.len(), panorama.width(), panorama.height());

        self.save(&panorama)?;

        Ok(Panorama {
            image: Arc::new(panorama),
            path: self.output_path.clone(),
            image_count: images.len(),
            suggested_duration: images.len() as f64 * self.per_image_seconds,
        })
    }

    /// Place images side by side; shorter images leave black below them
    pub fn stitch(images: &[RgbImage]) -> RgbImage {
        let total_width: u32 = images.iter().map(|img| img.width()).sum();
        let max_height = images.iter().map(|img| img.height()).max().unwrap_or(0);

        let mut canvas = RgbImage::new(total_width, max_height);
        let mut x_offset: i64 = 0;
        for img in images {
            imageops::replace(&mut canvas, img, x_offset, 0);
            x_offset += img.width() as i64;
        }
        canvas
    }

    fn save(&self, panorama: &RgbImage) -> Result<()> {
        let save_failed = |reason: String| EncodingError::PanoramaSaveFailed {
            path: self.output_path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
            }
        }

        panorama
            .save(&self.output_path)
            .map_err(|e| save_failed(e.to_string()))?;

        debug!("Panorama written to {}", self.output_path.display());
        Ok(())
    }

    /// List raster images in `dir`, naturally sorted by file name
    pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(InputError::DirectoryNotFound {
                path: dir.display().to_string(),
            }.into());
        }

        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || is_hidden_file(&path) {
                continue;
            }
            if is_image_file(&path) {
                images.push(path);
            } else {
                warn!("Skipping non-image file {}", path.display());
            }
        }

        if images.is_empty() {
            return Err(InputError::NoImages {
                path: dir.display().to_string(),
            }.into());
        }

        images.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        Ok(images)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

pub(crate) fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "tiff" | "webp"
        )
    )
}

/// Compare strings so that embedded numbers order by value ("2" < "10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let l_trimmed = l_num.trim_start_matches('0');
                let r_trimmed = r_num.trim_start_matches('0');

                let ordering = l_trimmed
                    .len()
                    .cmp(&r_trimmed.len())
                    .then_with(|| l_trimmed.cmp(r_trimmed));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
